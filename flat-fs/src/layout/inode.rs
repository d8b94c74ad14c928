//! inode 表：定长的槽位数组，按名字线性查找。
//! 槽位编号对外没有意义，只在一次操作内部用来回到同一个文件。

use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::sync::RwLock;
use crate::{Error, Result, NO_BLOCK};

/// 一个文件的元信息
#[derive(Debug)]
pub struct Inode {
    name: String,
    /// 文件大小(字节)
    pub size: u16,
    /// 按顺序排列的数据块编号
    pub blocks: Vec<u16>,
    /// 文件级读写锁，不落盘。
    /// 同名文件被删除再创建后是另一把锁，以此区分新旧文件。
    lock: Arc<RwLock<()>>,
}

impl Inode {
    #[inline]
    pub fn new(name: &str, blocks: Vec<u16>) -> Self {
        Self::with_size(name, 0, blocks)
    }

    pub fn with_size(name: &str, size: u16, blocks: Vec<u16>) -> Self {
        Self {
            name: name.to_string(),
            size,
            blocks,
            lock: Arc::new(RwLock::new(())),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 盘上记录的首块编号
    #[inline]
    pub fn first_block(&self) -> i16 {
        self.blocks.first().map_or(NO_BLOCK, |&block| block as i16)
    }

    #[inline]
    pub(crate) fn lock(&self) -> &Arc<RwLock<()>> {
        &self.lock
    }
}

#[derive(Debug)]
pub struct InodeTable {
    slots: Vec<Option<Inode>>,
}

impl InodeTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| None).collect(),
        }
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    #[inline]
    pub fn slots(&self) -> &[Option<Inode>] {
        &self.slots
    }

    /// 根据文件名获取槽位
    pub fn lookup(&self, name: &str) -> Result<usize> {
        self.slots
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|inode| inode.name == name))
            .ok_or(Error::NotFound)
    }

    #[inline]
    pub fn get(&self, slot: usize) -> Option<&Inode> {
        self.slots.get(slot)?.as_ref()
    }

    #[inline]
    pub fn get_mut(&mut self, slot: usize) -> Option<&mut Inode> {
        self.slots.get_mut(slot)?.as_mut()
    }

    /// 放入第一个空槽位，返回槽位编号
    pub fn insert(&mut self, inode: Inode) -> Result<usize> {
        let slot = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(Error::TableFull)?;
        self.slots[slot] = Some(inode);
        Ok(slot)
    }

    /// 放回指定槽位，用于加载与回滚
    pub fn restore(&mut self, slot: usize, inode: Inode) {
        debug_assert!(self.slots[slot].is_none());
        self.slots[slot] = Some(inode);
    }

    /// 清空槽位；块的释放由调用者负责
    #[inline]
    pub fn remove(&mut self, slot: usize) -> Option<Inode> {
        self.slots.get_mut(slot)?.take()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Inode)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, inode)| Some((slot, inode.as_ref()?)))
    }

    /// 按槽位顺序列出全部文件名
    pub fn names(&self) -> Vec<String> {
        self.iter().map(|(_, inode)| inode.name.clone()).collect()
    }
}
