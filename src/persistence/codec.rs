//! Little-endian word codec shared by the store files

use std::io::{self, Read, Write};

use crate::error::{Result, StoreError};
use crate::types::WORD_SIZE;

pub(crate) fn write_u64<W: Write>(writer: &mut W, value: u64, context: &str) -> Result<()> {
    writer
        .write_all(&value.to_le_bytes())
        .map_err(|e| StoreError::write(context, e))
}

pub(crate) fn write_bytes<W: Write>(writer: &mut W, bytes: &[u8], context: &str) -> Result<()> {
    writer
        .write_all(bytes)
        .map_err(|e| StoreError::write(context, e))
}

/// Read one word; a short read is an error
pub(crate) fn read_u64<R: Read>(reader: &mut R, context: &str) -> Result<u64> {
    let mut buf = [0u8; WORD_SIZE as usize];
    reader
        .read_exact(&mut buf)
        .map_err(|e| StoreError::read(context, e))?;
    Ok(u64::from_le_bytes(buf))
}

/// Read one word, returning `None` on a clean end of input
///
/// Input ending part-way through the word is an error.
pub(crate) fn try_read_u64<R: Read>(reader: &mut R, context: &str) -> Result<Option<u64>> {
    let mut buf = [0u8; WORD_SIZE as usize];
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(StoreError::read(context, e)),
        }
    }

    match filled {
        0 => Ok(None),
        n if n == buf.len() => Ok(Some(u64::from_le_bytes(buf))),
        n => Err(StoreError::read(
            context,
            io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("truncated word: {} of {} bytes", n, WORD_SIZE),
            ),
        )),
    }
}

/// Read exactly `len` bytes without trusting `len` for the allocation
pub(crate) fn read_bytes<R: Read>(reader: &mut R, len: u64, context: &str) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader
        .by_ref()
        .take(len)
        .read_to_end(&mut buf)
        .map_err(|e| StoreError::read(context, e))?;
    if buf.len() as u64 != len {
        return Err(StoreError::read(
            context,
            io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("expected {} bytes, found {}", len, buf.len()),
            ),
        ));
    }
    Ok(buf)
}
