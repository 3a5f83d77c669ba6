use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Result, StoreError};
use crate::persistence::codec::{read_bytes, read_u64};
use crate::types::{ContentOffset, WORD_SIZE};

/// Append-only log of string contents.
///
/// Record format:
/// - u64 payload length (little endian)
/// - raw payload bytes
///
/// A record's offset is its permanent key. Records are never rewritten,
/// and the end of the file is always the next append position.
#[derive(Debug)]
pub struct ContentLog {
    path: PathBuf,
    next_offset: ContentOffset,
}

impl ContentLog {
    /// Open the log, creating an empty file when missing
    pub fn open(path: PathBuf) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| StoreError::write(format!("open {}", path.display()), e))?;
        let next_offset = file
            .metadata()
            .map_err(|e| StoreError::read(format!("stat {}", path.display()), e))?
            .len();

        debug!(path = %path.display(), next_offset, "opened content log");
        Ok(Self { path, next_offset })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Offset the next appended record will receive
    pub fn next_offset(&self) -> ContentOffset {
        self.next_offset
    }

    /// Append a payload and return its offset.
    pub fn append(&mut self, payload: &[u8]) -> Result<ContentOffset> {
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|e| StoreError::write(format!("open {}", self.path.display()), e))?;

        // append mode writes at the physical end, past any partial record
        let offset = file
            .metadata()
            .map_err(|e| StoreError::read(format!("stat {}", self.path.display()), e))?
            .len();
        if offset != self.next_offset {
            warn!(
                expected = self.next_offset,
                offset, "content log end moved, appending at physical end"
            );
        }

        let written = file
            .write_all(&(payload.len() as u64).to_le_bytes())
            .map_err(|e| StoreError::write("string size", e))
            .and_then(|_| {
                file.write_all(payload)
                    .map_err(|e| StoreError::write("string", e))
            });

        match written {
            Ok(()) => {
                self.next_offset = offset + WORD_SIZE + payload.len() as u64;
                Ok(offset)
            }
            Err(err) => {
                // a partial record stays in the log; resume after it
                if let Ok(meta) = file.metadata() {
                    self.next_offset = meta.len();
                }
                warn!(offset, error = %err, "content append failed");
                Err(err)
            }
        }
    }

    /// Adopt the physical end of the log as the append position.
    pub(crate) fn refresh(&mut self) -> Result<ContentOffset> {
        self.next_offset = std::fs::metadata(&self.path)
            .map_err(|e| StoreError::read(format!("stat {}", self.path.display()), e))?
            .len();
        Ok(self.next_offset)
    }

    /// Open a reader scoped to one operation.
    pub fn reader(&self) -> Result<LogReader> {
        LogReader::open(&self.path)
    }

    /// Read the payload stored at `offset`
    pub fn read(&self, offset: ContentOffset) -> Result<Vec<u8>> {
        self.reader()?.read(offset)
    }

    pub fn read_string(&self, offset: ContentOffset) -> Result<String> {
        self.reader()?.read_string(offset)
    }
}

/// Read handle over the content log; the file closes on drop.
pub struct LogReader {
    file: BufReader<File>,
    len: u64,
}

impl LogReader {
    fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .map_err(|e| StoreError::read(format!("open {}", path.display()), e))?;
        let len = file
            .metadata()
            .map_err(|e| StoreError::read(format!("stat {}", path.display()), e))?
            .len();
        Ok(Self {
            file: BufReader::new(file),
            len,
        })
    }

    /// Read the record header at `offset` and return the payload size
    pub fn record_size(&mut self, offset: ContentOffset) -> Result<u64> {
        self.file
            .seek(SeekFrom::Start(offset))
            .map_err(|e| StoreError::read(format!("seek to {}", offset), e))?;
        let size = read_u64(&mut self.file, "string size")?;

        let end = offset
            .checked_add(WORD_SIZE)
            .and_then(|start| start.checked_add(size));
        match end {
            Some(end) if end <= self.len => Ok(size),
            _ => Err(StoreError::read(
                format!("record at {}", offset),
                io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("size {} runs past log end {}", size, self.len),
                ),
            )),
        }
    }

    /// Read the record at `offset` if `accept` approves its payload size
    pub fn read_if<F>(&mut self, offset: ContentOffset, accept: F) -> Result<Option<Vec<u8>>>
    where
        F: FnOnce(u64) -> bool,
    {
        let size = self.record_size(offset)?;
        if !accept(size) {
            return Ok(None);
        }
        read_bytes(&mut self.file, size, "string").map(Some)
    }

    pub fn read(&mut self, offset: ContentOffset) -> Result<Vec<u8>> {
        let size = self.record_size(offset)?;
        read_bytes(&mut self.file, size, "string")
    }

    pub fn read_string(&mut self, offset: ContentOffset) -> Result<String> {
        let bytes = self.read(offset)?;
        decode(offset, bytes)
    }
}

pub(crate) fn decode(offset: ContentOffset, bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes)
        .map_err(|_| StoreError::Corrupt(format!("record at {} is not valid UTF-8", offset)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_log(dir: &TempDir) -> ContentLog {
        ContentLog::open(dir.path().join("strings.scdb")).unwrap()
    }

    #[test]
    fn test_append_and_read() {
        let tmp = TempDir::new().unwrap();
        let mut log = open_log(&tmp);
        assert_eq!(log.next_offset(), 0);

        let first = log.append(b"hello world").unwrap();
        let second = log.append(b"").unwrap();
        let third = log.append(b"hello there").unwrap();

        assert_eq!(first, 0);
        assert_eq!(second, 8 + 11);
        assert_eq!(third, second + 8);
        assert_eq!(log.next_offset(), third + 8 + 11);

        assert_eq!(log.read(first).unwrap(), b"hello world");
        assert_eq!(log.read(second).unwrap(), b"");
        assert_eq!(log.read_string(third).unwrap(), "hello there");
    }

    #[test]
    fn test_reopen_resumes_at_end() {
        let tmp = TempDir::new().unwrap();
        let end = {
            let mut log = open_log(&tmp);
            log.append(b"persisted").unwrap();
            log.next_offset()
        };

        let mut log = open_log(&tmp);
        assert_eq!(log.next_offset(), end);
        let offset = log.append(b"more").unwrap();
        assert_eq!(offset, end);
        assert_eq!(log.read(0).unwrap(), b"persisted");
    }

    #[test]
    fn test_record_layout_on_disk() {
        let tmp = TempDir::new().unwrap();
        let mut log = open_log(&tmp);
        log.append(b"abc").unwrap();

        let raw = std::fs::read(log.path()).unwrap();
        assert_eq!(raw, vec![3, 0, 0, 0, 0, 0, 0, 0, b'a', b'b', b'c']);
    }

    #[test]
    fn test_truncated_record_is_read_error() {
        let tmp = TempDir::new().unwrap();
        let mut log = open_log(&tmp);
        log.append(b"hello world").unwrap();

        let file = OpenOptions::new().write(true).open(log.path()).unwrap();
        file.set_len(12).unwrap();

        assert!(log.read(0).unwrap_err().is_read_error());
        assert!(log.read(9).unwrap_err().is_read_error());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_failed_append_is_write_error() {
        let mut log = ContentLog::open(PathBuf::from("/dev/full")).unwrap();

        let err = log.append(b"no space left").unwrap_err();
        assert!(err.is_write_error(), "unexpected error: {:?}", err);
        assert_eq!(log.next_offset(), 0);
    }

    #[test]
    fn test_append_after_partial_record_does_not_overlap() {
        let tmp = TempDir::new().unwrap();
        let mut log = open_log(&tmp);
        let first = log.append(b"complete").unwrap();
        let end = log.next_offset();

        // a size word cut short, as left by an interrupted append
        let mut file = OpenOptions::new().append(true).open(log.path()).unwrap();
        file.write_all(&[5, 0, 0]).unwrap();
        drop(file);

        let second = log.append(b"after").unwrap();
        assert_eq!(second, end + 3);
        assert_eq!(log.next_offset(), second + 8 + 5);
        assert_eq!(log.read(first).unwrap(), b"complete");
        assert_eq!(log.read(second).unwrap(), b"after");
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let tmp = TempDir::new().unwrap();
        let log = open_log(&tmp);
        std::fs::remove_file(log.path()).unwrap();

        assert!(log.read(0).unwrap_err().is_read_error());
    }

    #[test]
    fn test_read_if_skips_rejected_sizes() {
        let tmp = TempDir::new().unwrap();
        let mut log = open_log(&tmp);
        let offset = log.append(b"hello").unwrap();

        let mut reader = log.reader().unwrap();
        assert_eq!(reader.read_if(offset, |size| size == 3).unwrap(), None);
        assert_eq!(
            reader.read_if(offset, |size| size == 5).unwrap(),
            Some(b"hello".to_vec())
        );
    }

    #[test]
    fn test_invalid_utf8_is_corrupt() {
        let tmp = TempDir::new().unwrap();
        let mut log = open_log(&tmp);
        let offset = log.append(&[0xff, 0xfe]).unwrap();

        let err = log.read_string(offset).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
    }
}
