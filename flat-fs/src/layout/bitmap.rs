use alloc::vec;
use alloc::vec::Vec;

use log::warn;

use crate::{Error, Result};

/// 空闲块位图，`true` 表示空闲
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    free: Vec<bool>,
}

impl Bitmap {
    /// 全部空闲的位图
    #[inline]
    pub fn new(blocks: usize) -> Self {
        Self {
            free: vec![true; blocks],
        }
    }

    #[inline]
    pub fn from_flags(free: Vec<bool>) -> Self {
        Self { free }
    }

    /// 位图所指示区域的总块数
    #[inline]
    pub fn capacity(&self) -> usize {
        self.free.len()
    }

    #[inline]
    pub fn is_free(&self, block: u16) -> bool {
        self.free.get(block as usize).copied().unwrap_or(false)
    }

    pub fn free_count(&self) -> usize {
        self.free.iter().filter(|&&free| free).count()
    }

    /// 按编号升序分配`count`个空闲块，返回它们的编号。
    /// 空闲块不足时不留下任何副作用。
    pub fn alloc(&mut self, count: usize) -> Result<Vec<u16>> {
        let mut reserved = Vec::with_capacity(count);

        for (block, free) in self.free.iter_mut().enumerate() {
            if reserved.len() == count {
                break;
            }
            if *free {
                *free = false;
                reserved.push(block as u16);
            }
        }

        if reserved.len() < count {
            self.dealloc(&reserved);
            return Err(Error::InsufficientSpace);
        }

        Ok(reserved)
    }

    /// 把指定的块重新标记为占用，用于回滚
    pub fn reserve(&mut self, blocks: &[u16]) {
        for &block in blocks {
            let free = &mut self.free[block as usize];
            debug_assert!(*free, "block {block} reserved twice");
            *free = false;
        }
    }

    pub fn dealloc(&mut self, blocks: &[u16]) {
        for &block in blocks {
            let free = &mut self.free[block as usize];
            // 编号一定得有对应的占用位
            if *free {
                warn!("block {block} released while already free");
            }
            *free = true;
        }
    }
}
