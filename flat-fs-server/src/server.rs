use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use flat_fs::FileSystem;
use log::{debug, error, info, warn};

use crate::command::{self, Reply};

pub const GREETING: &str = "Connected to FileServer. Type commands:";

/// 单行请求的最大字节数，足够容纳一条写满文件的 `WRITE`
pub const MAX_LINE_LEN: usize = 70 * 1024;

pub struct Server {
    listener: TcpListener,
    fs: Arc<FileSystem>,
    idle_timeout: Option<Duration>,
}

impl Server {
    pub fn bind(addr: impl ToSocketAddrs, fs: Arc<FileSystem>) -> io::Result<Self> {
        Ok(Self {
            listener: TcpListener::bind(addr)?,
            fs,
            idle_timeout: None,
        })
    }

    /// 连接空闲超过`timeout`即断开，`None`表示不限
    pub fn idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// 接受连接，每个客户端一个线程。只在监听套接字本身失效时返回
    pub fn run(&self) -> io::Result<()> {
        for stream in self.listener.incoming() {
            let stream = match stream {
                Ok(stream) => stream,
                Err(err) => {
                    warn!("failed to accept connection: {err}");
                    continue;
                }
            };

            let peer = match stream.peer_addr() {
                Ok(peer) => peer.to_string(),
                Err(_) => "unknown".to_owned(),
            };
            let fs = Arc::clone(&self.fs);
            let idle_timeout = self.idle_timeout;

            let spawned = thread::Builder::new()
                .name(format!("client-{peer}"))
                .spawn(move || {
                    info!("client {peer} connected");
                    match handle_client(stream, &fs, idle_timeout) {
                        Ok(()) => info!("client {peer} disconnected"),
                        Err(err) if is_timeout(&err) => info!("client {peer} timed out"),
                        Err(err) => warn!("client {peer} dropped: {err}"),
                    }
                });
            if let Err(err) = spawned {
                error!("failed to spawn client thread: {err}");
            }
        }
        Ok(())
    }
}

/// 服务一个 TCP 连接直到客户端退出或传输出错
pub fn handle_client(
    stream: TcpStream,
    fs: &FileSystem,
    idle_timeout: Option<Duration>,
) -> io::Result<()> {
    stream.set_read_timeout(idle_timeout)?;
    let reader = BufReader::new(stream.try_clone()?);
    let mut writer = BufWriter::new(stream);
    serve(reader, &mut writer, fs)
}

/// 行协议的主循环，与具体传输无关。
///
/// 非法的 UTF-8 字节替换成 U+FFFD 之后照常处理；
/// 超过 [`MAX_LINE_LEN`] 的行整行丢弃，回一条错误。
pub fn serve(
    mut reader: impl BufRead,
    writer: &mut impl Write,
    fs: &FileSystem,
) -> io::Result<()> {
    writeln!(writer, "{GREETING}")?;
    writer.flush()?;

    let mut buf = Vec::new();
    loop {
        buf.clear();
        let read = reader
            .by_ref()
            .take(MAX_LINE_LEN as u64 + 1)
            .read_until(b'\n', &mut buf)?;
        if read == 0 {
            break;
        }

        let reply = match buf.strip_suffix(b"\n") {
            None if buf.len() > MAX_LINE_LEN => {
                warn!("discarding request line longer than {MAX_LINE_LEN} bytes");
                reader.skip_until(b'\n')?;
                Reply::error("Line too long.")
            }
            line => {
                let line = String::from_utf8_lossy(line.unwrap_or(&buf));
                debug!("request: {line:?}");
                match command::dispatch(fs, &line) {
                    Some(reply) => reply,
                    None => continue,
                }
            }
        };

        writeln!(writer, "{}", reply.line)?;
        writer.flush()?;
        if reply.close {
            break;
        }
    }
    Ok(())
}

fn is_timeout(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}
