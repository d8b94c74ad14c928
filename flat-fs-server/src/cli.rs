use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(version, about = "Serve a flat in-file filesystem over a line-based TCP protocol")]
pub struct Cli {
    /// Address to listen on
    #[arg(long, env = "FLATFS_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, short, env = "FLATFS_PORT", default_value_t = 12345)]
    pub port: u16,

    /// Backing disk image, created when missing
    #[arg(long, short, env = "FLATFS_DISK", default_value = "filesystem.dat")]
    pub disk: PathBuf,

    /// Number of inode slots
    #[arg(long, env = "FLATFS_MAX_FILES", default_value_t = 5)]
    pub max_files: usize,

    /// Number of data blocks
    #[arg(long, env = "FLATFS_MAX_BLOCKS", default_value_t = 10)]
    pub max_blocks: usize,

    /// Bytes per data block
    #[arg(long, env = "FLATFS_BLOCK_SIZE", default_value_t = 128)]
    pub block_size: usize,

    /// Seconds a client may stay idle before being dropped, 0 disables
    #[arg(long, env = "FLATFS_IDLE_TIMEOUT", default_value_t = 300)]
    pub idle_timeout: u64,
}
