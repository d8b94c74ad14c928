//! Common utilities for tests
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use flat_fs::{BlockDevice, DeviceError, FileSystem, Geometry};

/// 内存中的后备存储，可以让写操作失败以模拟 I/O 故障
#[derive(Debug, Default)]
pub struct RamDisk {
    data: Mutex<Vec<u8>>,
    fail_writes: AtomicBool,
}

impl RamDisk {
    pub fn new() -> Arc<Self> {
        Arc::default()
    }

    pub fn with_bytes(bytes: Vec<u8>) -> Arc<Self> {
        Arc::new(Self {
            data: Mutex::new(bytes),
            fail_writes: AtomicBool::new(false),
        })
    }

    pub fn snapshot(&self) -> Vec<u8> {
        self.data.lock().unwrap().clone()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl BlockDevice for RamDisk {
    fn len(&self) -> Result<u64, DeviceError> {
        Ok(self.data.lock().unwrap().len() as u64)
    }

    fn set_len(&self, len: u64) -> Result<(), DeviceError> {
        self.data.lock().unwrap().resize(len as usize, 0);
        Ok(())
    }

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<(), DeviceError> {
        let data = self.data.lock().unwrap();
        let start = offset as usize;
        let src = data
            .get(start..start + buf.len())
            .ok_or(DeviceError::UnexpectedEof)?;
        buf.copy_from_slice(src);
        Ok(())
    }

    fn write_at(&self, offset: u64, buf: &[u8]) -> Result<(), DeviceError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DeviceError::Io);
        }
        let mut data = self.data.lock().unwrap();
        let start = offset as usize;
        let dest = data
            .get_mut(start..start + buf.len())
            .ok_or(DeviceError::UnexpectedEof)?;
        dest.copy_from_slice(buf);
        Ok(())
    }

    fn sync(&self) -> Result<(), DeviceError> {
        Ok(())
    }
}

/// 在新的内存盘上挂载默认几何参数的文件系统
pub fn mount() -> (Arc<RamDisk>, FileSystem) {
    mount_with(Geometry::default())
}

pub fn mount_with(geometry: Geometry) -> (Arc<RamDisk>, FileSystem) {
    let disk = RamDisk::new();
    let fs = FileSystem::open(disk.clone(), geometry).unwrap();
    (disk, fs)
}
