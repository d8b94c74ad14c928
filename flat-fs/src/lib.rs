#![cfg_attr(not(test), no_std)]

extern crate alloc;

/* flat-fs 的整体架构，自上而下 */

// 文件系统管理器层：创建、读写、删除、列举，以及并发控制
mod fs;

// 元数据编解码层：位图与 inode 表在元数据区上的定长二进制布局
mod codec;

// 磁盘数据结构层：位图、inode 表、块链表
mod layout;

// 几何参数：文件数、块数、块大小，以及由它们推出的各区域偏移
mod config;

mod error;

// 读写锁的别名与写者优先的加锁方式
mod sync;

pub use block_dev::{BlockDevice, DeviceError};

pub use self::{
    config::Geometry,
    error::{Error, Result},
    fs::{FileStat, FileSystem},
    layout::{Bitmap, Inode, InodeTable, Metadata},
};

/// 文件名最多可用的字节数
pub const MAX_NAME_LEN: usize = 11;
/// 盘上文件名字段的宽度：11 个可用字节 + 结尾的 0
pub const NAME_FIELD_LEN: usize = MAX_NAME_LEN + 1;
/// 单个文件的最大字节数，受盘上 2 字节大小字段限制
pub const MAX_FILE_SIZE: usize = u16::MAX as usize;
/// 盘上一条 inode 记录的宽度：存在标志 | 文件名 | 大小 | 首块
pub const INODE_RECORD_SIZE: usize = 1 + NAME_FIELD_LEN + 2 + 2;
/// 块链表中一项的宽度
pub const CHAIN_ENTRY_SIZE: usize = 2;
/// "没有块"的哨兵值，用于空文件的首块以及链尾
pub const NO_BLOCK: i16 = -1;
