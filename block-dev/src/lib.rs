//! # 后备存储接口层
//!
//! 后备存储是一段**定长**、可随机读写的字节容器，通常就是宿主机上的一个文件；
//! [`BlockDevice`] 就是对它的抽象，实现了此特质的类型称为**存储驱动**。
//!
//! 与扇区设备不同，这里按字节偏移寻址：元数据区紧跟着数据块区，
//! 两者的边界不必对齐到任何扇区大小。

#![no_std]

use core::any::Any;
use core::fmt;

/// 存储驱动特质
pub trait BlockDevice: Send + Sync + Any {
    /// 当前容量(字节)
    fn len(&self) -> Result<u64, DeviceError>;

    /// 调整容量，新增部分以零填充
    fn set_len(&self, len: u64) -> Result<(), DeviceError>;

    /// 从`offset`处读满`buf`，读不满即报错
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<(), DeviceError>;

    /// 把`buf`完整写到`offset`处
    fn write_at(&self, offset: u64, buf: &[u8]) -> Result<(), DeviceError>;

    /// 把已写入的数据落到持久介质上
    fn sync(&self) -> Result<(), DeviceError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceError {
    /// 访问越过了容器末尾
    UnexpectedEof,
    /// 其余底层读写错误
    Io,
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEof => f.write_str("unexpected end of backing store"),
            Self::Io => f.write_str("backing store read/write error"),
        }
    }
}

impl core::error::Error for DeviceError {}
