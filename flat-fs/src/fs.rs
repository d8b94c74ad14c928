//! # 文件系统管理器层
//!
//! 对外提供 create / write / read / delete / list，并确立并发纪律：
//!
//! - **结构锁**：`RwLock<Metadata>`，保护位图与 inode 表，以及紧随其后的元数据落盘。
//!   查找与列举取读锁，分配、释放、插入、移除取写锁，临界区尽量短。
//! - **文件锁**：每个 inode 各带一把读写锁。同一文件的 write / delete 互斥，
//!   read 之间共享；不同文件之间互不阻塞。
//!
//! 加锁顺序恒为 文件锁 -> 结构锁，持有结构锁时绝不再去拿文件锁。

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use core::mem;

use block_dev::{BlockDevice, DeviceError};
use log::{debug, info, warn};
use crate::codec;
use crate::layout::{Inode, Metadata};
use crate::sync::{write_lock, RwLock};
use crate::{Error, Geometry, Result, MAX_FILE_SIZE, MAX_NAME_LEN};

type FileLock = Arc<RwLock<()>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    /// 文件大小(字节)
    pub size: usize,
    /// 占用块数
    pub blocks: usize,
}

pub struct FileSystem {
    device: Arc<dyn BlockDevice>,
    geometry: Geometry,
    meta: RwLock<Metadata>,
}

impl FileSystem {
    /// 挂载后备存储。
    ///
    /// 容量不足时扩容并格式化；容量与几何参数不符、或元数据损坏时重新初始化；
    /// 两种情况都会先把空的元数据落盘。
    pub fn open(device: Arc<dyn BlockDevice>, geometry: Geometry) -> Result<Self> {
        let disk_size = geometry.disk_size();
        let len = device.len()?;

        let meta = if len < disk_size {
            info!("disk missing or too small ({len} < {disk_size} bytes), formatting");
            format_device(&*device, &geometry)?
        } else if len > disk_size {
            warn!("disk size {len} does not match geometry ({disk_size} bytes), reinitializing");
            format_device(&*device, &geometry)?
        } else {
            match load_metadata(&*device, &geometry) {
                Ok(meta) => {
                    info!(
                        "filesystem loaded: {} file(s), {} free block(s)",
                        meta.inodes.iter().count(),
                        meta.bitmap.free_count()
                    );
                    meta
                }
                Err(Error::CorruptMetadata) => {
                    warn!("corrupted or incomplete metadata, reinitializing");
                    format_device(&*device, &geometry)?
                }
                Err(err) => return Err(err),
            }
        };

        Ok(Self {
            device,
            geometry,
            meta: RwLock::new(meta),
        })
    }

    /// 无条件格式化后备存储
    pub fn format(device: Arc<dyn BlockDevice>, geometry: Geometry) -> Result<Self> {
        let meta = format_device(&*device, &geometry)?;
        Ok(Self {
            device,
            geometry,
            meta: RwLock::new(meta),
        })
    }

    #[inline]
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn free_blocks(&self) -> usize {
        self.meta.read().bitmap.free_count()
    }

    /// 创建空文件，并为其分配一个锚定块
    pub fn create(&self, name: &str) -> Result<()> {
        validate_name(name)?;

        let mut guard = write_lock(&self.meta);
        let meta = &mut *guard;

        if meta.inodes.lookup(name).is_ok() {
            return Err(Error::AlreadyExists);
        }
        if meta.inodes.is_full() {
            return Err(Error::TableFull);
        }

        let blocks = meta.bitmap.alloc(1)?;
        let slot = match meta.inodes.insert(Inode::new(name, blocks.clone())) {
            Ok(slot) => slot,
            Err(err) => {
                meta.bitmap.dealloc(&blocks);
                return Err(err);
            }
        };

        if let Err(err) = self.persist(meta) {
            meta.inodes.remove(slot);
            meta.bitmap.dealloc(&blocks);
            return Err(err);
        }

        debug!("created {name:?} in slot {slot}, anchor block {blocks:?}");
        Ok(())
    }

    /// 用`content`整体替换文件内容。
    ///
    /// 先分配新块并写入数据，提交成功后才释放旧块；
    /// 任何一步失败，文件都保持原来的内容。
    pub fn write(&self, name: &str, content: &[u8]) -> Result<()> {
        if content.len() > MAX_FILE_SIZE {
            return Err(Error::FileTooLarge);
        }

        let (slot, lock) = self.locate(name)?;
        let _file = write_lock(&lock);

        let needed = self.geometry.count_blocks(content.len()).max(1);
        let blocks = {
            let mut meta = write_lock(&self.meta);
            revalidate(&meta, slot, &lock)?;
            meta.bitmap.alloc(needed)?
        };

        // 新块只属于本次写入，传输期间不必持有结构锁
        if let Err(err) = self.write_blocks(&blocks, content) {
            write_lock(&self.meta).bitmap.dealloc(&blocks);
            return Err(err);
        }

        let mut guard = write_lock(&self.meta);
        let meta = &mut *guard;

        // 持有文件写锁期间槽位不会被移除
        let Some(inode) = meta.inodes.get_mut(slot) else {
            meta.bitmap.dealloc(&blocks);
            return Err(Error::NotFound);
        };
        let old_blocks = mem::replace(&mut inode.blocks, blocks);
        let old_size = mem::replace(&mut inode.size, content.len() as u16);
        meta.bitmap.dealloc(&old_blocks);

        if let Err(err) = self.persist(meta) {
            meta.bitmap.reserve(&old_blocks);
            if let Some(inode) = meta.inodes.get_mut(slot) {
                let new_blocks = mem::replace(&mut inode.blocks, old_blocks);
                inode.size = old_size;
                meta.bitmap.dealloc(&new_blocks);
            }
            return Err(err);
        }

        debug!(
            "wrote {} byte(s) to {name:?}, blocks {:?} -> {:?}",
            content.len(),
            old_blocks,
            meta.inodes.get(slot).map(|inode| &inode.blocks)
        );
        Ok(())
    }

    /// 读出文件的全部内容，空文件返回空的`Vec`
    pub fn read(&self, name: &str) -> Result<Vec<u8>> {
        let (slot, lock) = self.locate(name)?;
        let _file = lock.read();

        let (size, blocks) = {
            let meta = self.meta.read();
            let inode = revalidate(&meta, slot, &lock)?;
            (inode.size as usize, inode.blocks.clone())
        };

        self.read_blocks(&blocks, size)
    }

    /// 删除文件并释放它的全部块
    pub fn delete(&self, name: &str) -> Result<()> {
        let (slot, lock) = self.locate(name)?;
        let _file = write_lock(&lock);

        let mut guard = write_lock(&self.meta);
        let meta = &mut *guard;

        revalidate(meta, slot, &lock)?;
        let Some(inode) = meta.inodes.remove(slot) else {
            return Err(Error::NotFound);
        };
        meta.bitmap.dealloc(&inode.blocks);

        if let Err(err) = self.persist(meta) {
            meta.bitmap.reserve(&inode.blocks);
            meta.inodes.restore(slot, inode);
            return Err(err);
        }

        debug!("deleted {name:?}, released blocks {:?}", inode.blocks);
        Ok(())
    }

    /// 当前全部文件名的快照，按槽位顺序
    pub fn list(&self) -> Vec<String> {
        self.meta.read().inodes.names()
    }

    pub fn stat(&self, name: &str) -> Result<FileStat> {
        let (slot, lock) = self.locate(name)?;
        let _file = lock.read();

        let meta = self.meta.read();
        let inode = revalidate(&meta, slot, &lock)?;
        Ok(FileStat {
            size: inode.size as usize,
            blocks: inode.blocks.len(),
        })
    }
}

impl FileSystem {
    /// 按名字找到文件的槽位与文件锁，返回时已放开结构锁
    fn locate(&self, name: &str) -> Result<(usize, FileLock)> {
        let meta = self.meta.read();
        let slot = meta.inodes.lookup(name)?;
        let lock = meta
            .inodes
            .get(slot)
            .map(|inode| inode.lock().clone())
            .ok_or(Error::NotFound)?;
        Ok((slot, lock))
    }

    fn persist(&self, meta: &Metadata) -> Result<()> {
        save_metadata(&*self.device, &self.geometry, meta)
    }

    fn write_blocks(&self, blocks: &[u16], content: &[u8]) -> Result<()> {
        for (&block, chunk) in blocks.iter().zip(content.chunks(self.geometry.block_size)) {
            self.device
                .write_at(self.geometry.block_offset(block), chunk)?;
        }
        Ok(())
    }

    fn read_blocks(&self, blocks: &[u16], size: usize) -> Result<Vec<u8>> {
        let mut data = vec![0; size];
        for (&block, chunk) in blocks.iter().zip(data.chunks_mut(self.geometry.block_size)) {
            self.device
                .read_at(self.geometry.block_offset(block), chunk)?;
        }
        Ok(data)
    }
}

/// 拿到文件锁之后，确认槽位里仍是同一个文件(而非删除后同名重建的文件)
fn revalidate<'a>(meta: &'a Metadata, slot: usize, lock: &FileLock) -> Result<&'a Inode> {
    meta.inodes
        .get(slot)
        .filter(|inode| Arc::ptr_eq(inode.lock(), lock))
        .ok_or(Error::NotFound)
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > MAX_NAME_LEN || name.contains('\0') {
        return Err(Error::InvalidName);
    }
    Ok(())
}

fn format_device(device: &dyn BlockDevice, geometry: &Geometry) -> Result<Metadata> {
    device.set_len(geometry.disk_size())?;
    let meta = Metadata::new(geometry);
    save_metadata(device, geometry, &meta)?;
    info!(
        "formatted {} bytes: {} inode slot(s), {} block(s) of {} bytes",
        geometry.disk_size(),
        geometry.max_files,
        geometry.max_blocks,
        geometry.block_size
    );
    Ok(meta)
}

fn load_metadata(device: &dyn BlockDevice, geometry: &Geometry) -> Result<Metadata> {
    let mut buf = vec![0; geometry.metadata_size()];
    match device.read_at(0, &mut buf) {
        Ok(()) => {}
        Err(DeviceError::UnexpectedEof) => return Err(Error::CorruptMetadata),
        Err(err) => return Err(err.into()),
    }
    codec::decode(&buf, geometry)
}

fn save_metadata(device: &dyn BlockDevice, geometry: &Geometry, meta: &Metadata) -> Result<()> {
    device.write_at(0, &codec::encode(meta, geometry))?;
    device.sync()?;
    Ok(())
}
