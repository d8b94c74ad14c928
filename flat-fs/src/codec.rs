//! # 元数据编解码层
//!
//! 元数据区的定长二进制布局(整数一律大端)：
//!
//! | 区域     | 每项宽度 | 项数         | 内容                               |
//! |----------|----------|--------------|------------------------------------|
//! | 位图     | 1        | `max_blocks` | `1` 空闲，`0` 占用                 |
//! | inode 表 | 17       | `max_files`  | 存在标志、文件名、大小`u16`、首块`i16` |
//! | 块链表   | 2        | `max_blocks` | 后继块`i16`，`-1` 为链尾           |
//!
//! 文件名字段 12 字节，最多 11 个可用字节，其余以 0 填充。

use alloc::vec;
use alloc::vec::Vec;
use core::str;

use log::warn;

use crate::layout::{Bitmap, BlockChain, Inode, InodeTable, Metadata};
use crate::{Error, Geometry, Result, INODE_RECORD_SIZE, MAX_NAME_LEN, NAME_FIELD_LEN};

/// 把元数据编码成元数据区的完整内容。
///
/// 盘上位图由块的归属推出：已分配但尚未挂到任何文件上的块按空闲记录。
pub fn encode(meta: &Metadata, geometry: &Geometry) -> Vec<u8> {
    let mut buf = Vec::with_capacity(geometry.metadata_size());

    buf.extend(meta.owned_blocks().iter().map(|&owned| u8::from(!owned)));

    for slot in meta.inodes.slots() {
        let Some(inode) = slot else {
            buf.extend_from_slice(&[0; INODE_RECORD_SIZE]);
            continue;
        };

        let mut name = [0u8; NAME_FIELD_LEN];
        let bytes = inode.name().as_bytes();
        let len = bytes.len().min(MAX_NAME_LEN);
        name[..len].copy_from_slice(&bytes[..len]);

        buf.push(1);
        buf.extend_from_slice(&name);
        buf.extend_from_slice(&inode.size.to_be_bytes());
        buf.extend_from_slice(&inode.first_block().to_be_bytes());
    }

    let chain = BlockChain::build(&meta.inodes, geometry.max_blocks);
    for next in chain.entries() {
        buf.extend_from_slice(&next.to_be_bytes());
    }

    debug_assert_eq!(geometry.metadata_size(), buf.len());
    buf
}

/// 从元数据区的内容还原元数据，并校验各项不变式
pub fn decode(buf: &[u8], geometry: &Geometry) -> Result<Metadata> {
    let mut reader = Reader::new(buf);

    let free = (0..geometry.max_blocks)
        .map(|_| reader.bool())
        .collect::<Result<Vec<_>>>()?;

    let mut records = Vec::with_capacity(geometry.max_files);
    for _ in 0..geometry.max_files {
        if !reader.bool()? {
            reader.skip(INODE_RECORD_SIZE - 1)?;
            records.push(None);
            continue;
        }

        let field = reader.bytes(NAME_FIELD_LEN)?;
        let len = field
            .iter()
            .position(|&c| c == 0)
            .unwrap_or(NAME_FIELD_LEN)
            .min(MAX_NAME_LEN);
        let name = str::from_utf8(&field[..len]).map_err(|_| Error::CorruptMetadata)?;
        if name.is_empty() {
            return Err(Error::CorruptMetadata);
        }

        let size = reader.u16()?;
        let first = reader.i16()?;
        records.push(Some((name, size, first)));
    }

    let chain = BlockChain::from_entries(
        (0..geometry.max_blocks)
            .map(|_| reader.i16())
            .collect::<Result<Vec<_>>>()?,
    );

    let mut owned = vec![false; geometry.max_blocks];
    let mut inodes = InodeTable::new(geometry.max_files);
    for (slot, record) in records.into_iter().enumerate() {
        let Some((name, size, first)) = record else {
            continue;
        };

        if inodes.lookup(name).is_ok() {
            return Err(Error::CorruptMetadata);
        }

        let blocks = chain.walk(first, &mut owned)?;
        // 文件的块必须在位图中登记为占用，且足以容纳其大小
        if blocks.iter().any(|&block| free[block as usize])
            || blocks.len() * geometry.block_size < size as usize
        {
            return Err(Error::CorruptMetadata);
        }

        inodes.restore(slot, Inode::with_size(name, size, blocks));
    }

    let mut bitmap = Bitmap::from_flags(free);
    let orphans: Vec<u16> = (0..geometry.max_blocks as u16)
        .filter(|&block| !bitmap.is_free(block) && !owned[block as usize])
        .collect();
    if !orphans.is_empty() {
        warn!("reclaiming {} orphan block(s): {orphans:?}", orphans.len());
        bitmap.dealloc(&orphans);
    }

    Ok(Metadata { bitmap, inodes })
}

/// 顺序读取定长字段，读到末尾之外即视为元数据损坏
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self.pos + len;
        let bytes = self.buf.get(self.pos..end).ok_or(Error::CorruptMetadata)?;
        self.pos = end;
        Ok(bytes)
    }

    fn skip(&mut self, len: usize) -> Result<()> {
        self.bytes(len).map(|_| ())
    }

    fn bool(&mut self) -> Result<bool> {
        match self.bytes(1)? {
            [0] => Ok(false),
            [1] => Ok(true),
            _ => Err(Error::CorruptMetadata),
        }
    }

    fn u16(&mut self) -> Result<u16> {
        let mut raw = [0; 2];
        raw.copy_from_slice(self.bytes(2)?);
        Ok(u16::from_be_bytes(raw))
    }

    fn i16(&mut self) -> Result<i16> {
        self.u16().map(|raw| raw as i16)
    }
}
