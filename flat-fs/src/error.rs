use block_dev::DeviceError;
use derive_more::Display;

/// 文件系统的全部错误。
///
/// `Display` 的文本即边界层 `ERROR: ` 之后的内容。
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[display(fmt = "Filename must be 1 to 11 bytes long.")]
    InvalidName,
    #[display(fmt = "File already exists.")]
    AlreadyExists,
    #[display(fmt = "File does not exist.")]
    NotFound,
    #[display(fmt = "Maximum number of files reached.")]
    TableFull,
    #[display(fmt = "Not enough free blocks.")]
    InsufficientSpace,
    #[display(fmt = "File content exceeds the maximum file size.")]
    FileTooLarge,
    /// 只在加载元数据时产生，由 [`FileSystem::open`](crate::FileSystem::open) 自愈
    #[display(fmt = "Filesystem metadata is corrupted.")]
    CorruptMetadata,
    #[display(fmt = "Invalid filesystem geometry.")]
    InvalidGeometry,
    #[display(fmt = "Disk I/O failure: {}", _0)]
    Io(DeviceError),
}

impl From<DeviceError> for Error {
    fn from(err: DeviceError) -> Self {
        Self::Io(err)
    }
}

impl core::error::Error for Error {}

pub type Result<T> = core::result::Result<T, Error>;
