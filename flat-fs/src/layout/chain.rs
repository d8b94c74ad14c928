//! 块链表：`next[i]` 是拥有块 `i` 的文件里紧随其后的块，
//! [`NO_BLOCK`] 表示链尾，空闲块的表项同样是 [`NO_BLOCK`]。
//!
//! 盘上的 inode 记录只有首块编号，顺着链表才能找回完整、有序的块列表，
//! 块在数据区中可以任意分散。

use alloc::vec;
use alloc::vec::Vec;

use crate::layout::InodeTable;
use crate::{Error, Result, NO_BLOCK};

#[derive(Debug, PartialEq, Eq)]
pub(crate) struct BlockChain {
    next: Vec<i16>,
}

impl BlockChain {
    #[inline]
    pub fn from_entries(next: Vec<i16>) -> Self {
        Self { next }
    }

    /// 按各文件的块列表串起链表
    pub fn build(inodes: &InodeTable, blocks: usize) -> Self {
        let mut next = vec![NO_BLOCK; blocks];
        for (_, inode) in inodes.iter() {
            for pair in inode.blocks.windows(2) {
                next[pair[0] as usize] = pair[1] as i16;
            }
        }
        Self { next }
    }

    #[inline]
    pub fn entries(&self) -> &[i16] {
        &self.next
    }

    /// 从`first`沿链走到链尾，返回途经的块。
    /// `owned`记录已被某条链认领的块；越界、成环、两条链共用一块均视为元数据损坏。
    pub fn walk(&self, first: i16, owned: &mut [bool]) -> Result<Vec<u16>> {
        let mut blocks = Vec::new();
        let mut current = first;

        while current != NO_BLOCK {
            let index = usize::try_from(current).map_err(|_| Error::CorruptMetadata)?;
            let claimed = owned.get_mut(index).ok_or(Error::CorruptMetadata)?;
            if *claimed {
                return Err(Error::CorruptMetadata);
            }
            *claimed = true;

            blocks.push(index as u16);
            current = self.next[index];
        }

        Ok(blocks)
    }
}
