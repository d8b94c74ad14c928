mod cli;

use std::fs::OpenOptions;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use block_dev::BlockDevice;
use clap::Parser;
use flat_fs::{FileSystem, Geometry};
use flat_fs_server::{BlockFile, Server};
use log::info;

use self::cli::Cli;

fn main() -> io::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let geometry =
        Geometry::new(cli.max_files, cli.max_blocks, cli.block_size).map_err(io::Error::other)?;

    let fd = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&cli.disk)?;
    let block_dev: Arc<dyn BlockDevice> = Arc::new(BlockFile::new(fd));
    info!("disk={:?} geometry={geometry:?}", cli.disk);

    let fs = Arc::new(FileSystem::open(block_dev, geometry).map_err(io::Error::other)?);
    let idle_timeout = (cli.idle_timeout > 0).then(|| Duration::from_secs(cli.idle_timeout));

    let server = Server::bind((cli.host.as_str(), cli.port), fs)?.idle_timeout(idle_timeout);
    info!("listening on {}", server.local_addr()?);
    server.run()
}
