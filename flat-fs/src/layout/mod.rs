//! # 磁盘数据结构层
//!
//! 内存中的元数据：空闲块位图 + inode 表。
//! 块链表不常驻内存，落盘时由各文件的块列表现场生成，加载时用来还原块列表。

mod bitmap;
pub use bitmap::Bitmap;

mod inode;
pub use inode::{Inode, InodeTable};

/// 块链表，只在编解码时出现
mod chain;
pub(crate) use chain::BlockChain;

use alloc::vec;
use alloc::vec::Vec;

use crate::Geometry;

/// 结构锁所保护的全部共享状态
#[derive(Debug)]
pub struct Metadata {
    pub bitmap: Bitmap,
    pub inodes: InodeTable,
}

impl Metadata {
    /// 全部块空闲，没有任何文件
    pub fn new(geometry: &Geometry) -> Self {
        Self {
            bitmap: Bitmap::new(geometry.max_blocks),
            inodes: InodeTable::new(geometry.max_files),
        }
    }

    /// 统计每个块是否归某个文件所有
    pub fn owned_blocks(&self) -> Vec<bool> {
        let mut owned = vec![false; self.bitmap.capacity()];
        for (_, inode) in self.inodes.iter() {
            for &block in &inode.blocks {
                owned[block as usize] = true;
            }
        }
        owned
    }
}
