//! 协议命令的解析与分派。
//!
//! 每行一条命令，动词不区分大小写，至多按空格切成三段：
//! `WRITE <name> <content...>` 的内容部分可以包含空格。

use std::borrow::Cow;
use std::fmt;

use flat_fs::FileSystem;
use log::debug;

#[derive(Debug, PartialEq, Eq)]
pub enum Command<'a> {
    Create(&'a str),
    Write(&'a str, &'a str),
    Read(&'a str),
    Delete(&'a str),
    List,
    Quit,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ParseError {
    /// 缺少参数，附带用法
    Usage(&'static str),
    /// 不认识的动词(已转为大写)
    Unknown(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Usage(usage) => write!(f, "Usage: {usage}"),
            Self::Unknown(verb) => write!(f, "Unknown command '{verb}'"),
        }
    }
}

impl<'a> Command<'a> {
    /// 解析一行请求，空行返回`None`
    pub fn parse(line: &'a str) -> Option<Result<Self, ParseError>> {
        let line = line.strip_suffix('\r').unwrap_or(line).trim_start();
        if line.trim_end().is_empty() {
            return None;
        }

        let mut parts = line.splitn(3, ' ');
        let verb = parts.next().unwrap_or_default().to_ascii_uppercase();
        let name = parts.next();
        let content = parts.next();

        let command = match (verb.as_str(), name, content) {
            ("CREATE", Some(name), _) => Ok(Self::Create(name)),
            ("CREATE", None, _) => Err(ParseError::Usage("CREATE <filename>")),
            ("WRITE", Some(name), Some(content)) => Ok(Self::Write(name, content)),
            ("WRITE", _, None) => Err(ParseError::Usage("WRITE <filename> <content>")),
            ("READ", Some(name), _) => Ok(Self::Read(name)),
            ("READ", None, _) => Err(ParseError::Usage("READ <filename>")),
            ("DELETE", Some(name), _) => Ok(Self::Delete(name)),
            ("DELETE", None, _) => Err(ParseError::Usage("DELETE <filename>")),
            ("LIST", ..) => Ok(Self::List),
            ("QUIT", ..) => Ok(Self::Quit),
            _ => Err(ParseError::Unknown(verb)),
        };
        Some(command)
    }
}

/// 回给客户端的一行文本，以及之后是否关闭连接
#[derive(Debug, PartialEq, Eq)]
pub struct Reply {
    pub line: String,
    pub close: bool,
}

impl Reply {
    fn ok(line: String) -> Self {
        Self { line, close: false }
    }

    pub(crate) fn error(err: impl fmt::Display) -> Self {
        Self::ok(format!("ERROR: {err}"))
    }
}

/// 执行一条命令；文件系统的错误都转成`ERROR:`回复，不会中断连接
pub fn execute(fs: &FileSystem, command: Command<'_>) -> Reply {
    let result = match command {
        Command::Create(name) => fs
            .create(name)
            .map(|()| format!("SUCCESS: File '{name}' created.")),
        Command::Write(name, content) => fs
            .write(name, content.as_bytes())
            .map(|()| format!("SUCCESS: File '{name}' written.")),
        Command::Read(name) => fs.read(name).map(|data| {
            let text = if data.is_empty() {
                Cow::Borrowed("(empty file)")
            } else {
                String::from_utf8_lossy(&data)
            };
            format!("SUCCESS: File '{name}' contents: {text}")
        }),
        Command::Delete(name) => fs
            .delete(name)
            .map(|()| format!("SUCCESS: File '{name}' deleted.")),
        Command::List => {
            let names = fs.list();
            if names.is_empty() {
                Ok("FILES: (empty)".to_owned())
            } else {
                Ok(format!("FILES: {}", names.join(", ")))
            }
        }
        Command::Quit => {
            return Reply {
                line: "Goodbye!".to_owned(),
                close: true,
            };
        }
    };

    match result {
        Ok(line) => Reply::ok(line),
        Err(err) => {
            debug!("request failed: {err}");
            Reply::error(err)
        }
    }
}

/// 解析并执行一行请求，空行没有回复
pub fn dispatch(fs: &FileSystem, line: &str) -> Option<Reply> {
    let reply = match Command::parse(line)? {
        Ok(command) => execute(fs, command),
        Err(err) => Reply::error(err),
    };
    Some(reply)
}
