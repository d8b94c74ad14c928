//! flat-fs 的网络边界：把宿主机文件当作后备存储，
//! 通过逐行文本协议把文件系统暴露给远程客户端。

mod block_file;
pub mod command;
mod server;

pub use self::{
    block_file::BlockFile,
    command::{Command, Reply},
    server::{handle_client, serve, Server, GREETING, MAX_LINE_LEN},
};
