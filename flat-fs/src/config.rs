//! # 几何参数
//!
//! 盘上布局：
//! 空闲块位图 | inode 表 | 块链表 | 数据块区域
//!
//! 前三者合称元数据区，其大小只由 `max_blocks` 与 `max_files` 决定，
//! 初始化后不再变化。几何参数本身不落盘，启动时由调用者给出。

use crate::error::{Error, Result};
use crate::{CHAIN_ENTRY_SIZE, INODE_RECORD_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    /// inode 表的槽位数
    pub max_files: usize,
    /// 数据块总数
    pub max_blocks: usize,
    /// 每个数据块的字节数
    pub block_size: usize,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            max_files: 5,
            max_blocks: 10,
            block_size: 128,
        }
    }
}

impl Geometry {
    pub fn new(max_files: usize, max_blocks: usize, block_size: usize) -> Result<Self> {
        // 块编号在盘上是 2 字节有符号数
        if max_files == 0
            || max_blocks == 0
            || max_blocks > i16::MAX as usize
            || block_size == 0
        {
            return Err(Error::InvalidGeometry);
        }

        // 元数据区与数据区合起来必须能用 usize 表示
        let metadata_size = max_files
            .checked_mul(INODE_RECORD_SIZE)
            .and_then(|inodes| inodes.checked_add(max_blocks * (1 + CHAIN_ENTRY_SIZE)));
        let data_size = max_blocks.checked_mul(block_size);
        if metadata_size
            .zip(data_size)
            .and_then(|(metadata, data)| metadata.checked_add(data))
            .is_none()
        {
            return Err(Error::InvalidGeometry);
        }

        Ok(Self {
            max_files,
            max_blocks,
            block_size,
        })
    }

    /// 位图区域的字节数
    #[inline]
    pub fn bitmap_size(&self) -> usize {
        self.max_blocks
    }

    /// inode 表的字节数
    #[inline]
    pub fn inode_table_size(&self) -> usize {
        self.max_files * INODE_RECORD_SIZE
    }

    /// 块链表的字节数
    #[inline]
    pub fn chain_size(&self) -> usize {
        self.max_blocks * CHAIN_ENTRY_SIZE
    }

    /// 元数据区的字节数
    #[inline]
    pub fn metadata_size(&self) -> usize {
        self.bitmap_size() + self.inode_table_size() + self.chain_size()
    }

    /// 数据块在后备存储中的字节偏移
    #[inline]
    pub fn block_offset(&self, block: u16) -> u64 {
        self.metadata_size() as u64 + block as u64 * self.block_size as u64
    }

    /// 后备存储应有的总字节数
    #[inline]
    pub fn disk_size(&self) -> u64 {
        self.metadata_size() as u64 + (self.max_blocks * self.block_size) as u64
    }

    /// 计算容纳指定数据量需要多少个数据块
    #[inline]
    pub fn count_blocks(&self, size: usize) -> usize {
        size.div_ceil(self.block_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout() {
        let geometry = Geometry::default();
        assert_eq!(10 + 5 * 17 + 10 * 2, geometry.metadata_size());
        assert_eq!(115, geometry.block_offset(0));
        assert_eq!(115 + 3 * 128, geometry.block_offset(3));
        assert_eq!(115 + 10 * 128, geometry.disk_size());
    }

    #[test]
    fn rejects_unrepresentable_geometry() {
        assert_eq!(Err(Error::InvalidGeometry), Geometry::new(0, 10, 128));
        assert_eq!(Err(Error::InvalidGeometry), Geometry::new(5, 0, 128));
        assert_eq!(Err(Error::InvalidGeometry), Geometry::new(5, 40_000, 128));
        assert_eq!(Err(Error::InvalidGeometry), Geometry::new(5, 10, 0));
        assert!(Geometry::new(1, i16::MAX as usize, 1).is_ok());
    }

    #[test]
    fn rejects_overflowing_sizes() {
        assert_eq!(
            Err(Error::InvalidGeometry),
            Geometry::new(5, 10, usize::MAX / 4)
        );
        assert_eq!(
            Err(Error::InvalidGeometry),
            Geometry::new(usize::MAX / 8, 10, 128)
        );
        assert_eq!(
            Err(Error::InvalidGeometry),
            Geometry::new(5, 2, usize::MAX / 2 - 10)
        );
        let geometry = Geometry::new(5, 2, usize::MAX / 4).unwrap();
        assert_eq!(
            (2 + 5 * 17 + 2 * 2 + 2 * (usize::MAX / 4)) as u64,
            geometry.disk_size()
        );
    }

    #[test]
    fn block_count_rounds_up() {
        let geometry = Geometry::default();
        assert_eq!(0, geometry.count_blocks(0));
        assert_eq!(1, geometry.count_blocks(127));
        assert_eq!(1, geometry.count_blocks(128));
        assert_eq!(2, geometry.count_blocks(129));
    }
}
