use std::fs::File;
use std::io::{self, ErrorKind, Read, Seek, SeekFrom, Write};
use std::sync::{Mutex, MutexGuard, PoisonError};

use block_dev::{BlockDevice, DeviceError};
use log::error;

/// 以宿主机上的普通文件作为后备存储
#[derive(Debug)]
pub struct BlockFile(Mutex<File>);

impl BlockFile {
    pub fn new(fd: File) -> Self {
        Self(Mutex::new(fd))
    }

    fn file(&self) -> MutexGuard<'_, File> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn device_error(op: &str, err: io::Error) -> DeviceError {
    match err.kind() {
        ErrorKind::UnexpectedEof => DeviceError::UnexpectedEof,
        _ => {
            error!("{op} failed: {err}");
            DeviceError::Io
        }
    }
}

impl BlockDevice for BlockFile {
    fn len(&self) -> Result<u64, DeviceError> {
        self.file()
            .metadata()
            .map(|meta| meta.len())
            .map_err(|err| device_error("stat", err))
    }

    fn set_len(&self, len: u64) -> Result<(), DeviceError> {
        self.file()
            .set_len(len)
            .map_err(|err| device_error("resize", err))
    }

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<(), DeviceError> {
        let mut file = self.file();
        file.seek(SeekFrom::Start(offset))
            .and_then(|_| file.read_exact(buf))
            .map_err(|err| device_error("read", err))
    }

    fn write_at(&self, offset: u64, buf: &[u8]) -> Result<(), DeviceError> {
        let mut file = self.file();
        file.seek(SeekFrom::Start(offset))
            .and_then(|_| file.write_all(buf))
            .map_err(|err| device_error("write", err))
    }

    fn sync(&self) -> Result<(), DeviceError> {
        self.file()
            .sync_data()
            .map_err(|err| device_error("sync", err))
    }
}
