//! Positioned I/O and durability barriers on the ledger file.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

use super::codec::{decode_counter, encode_counter, COUNTER_SIZE};

/// How a durability barrier is forced to stable storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncMode {
    /// Flush file contents only (`fdatasync`). File length changes are
    /// still persisted, which is all the ledger relies on.
    #[default]
    Data,
    /// Flush file contents and all metadata (`fsync`).
    Full,
}

/// Handle to an open ledger file.
///
/// All I/O is positioned, so a shared reference is enough to read or
/// write and no cursor state is shared between callers.
#[derive(Debug)]
pub struct LedgerFile {
    file: File,
}

impl LedgerFile {
    /// Creates a new ledger file. Fails with `AlreadyExists` if one is present.
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)?;

        Ok(Self { file })
    }

    /// Opens an existing ledger file for reading and writing.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;

        Ok(Self { file })
    }

    /// Current length of the file on disk.
    pub fn file_len(&self) -> io::Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    pub fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<()> {
        read_exact_at(&self.file, buf, offset)
    }

    /// Writes `data` at `offset`, extending the file if needed.
    pub fn write_at(&self, data: &[u8], offset: u64) -> io::Result<()> {
        write_all_at(&self.file, data, offset)
    }

    pub fn read_counter(&self) -> io::Result<u64> {
        let mut buf = [0u8; COUNTER_SIZE];
        self.read_at(&mut buf, 0)?;
        Ok(decode_counter(&buf))
    }

    pub fn write_counter(&self, counter: u64) -> io::Result<()> {
        self.write_at(&encode_counter(counter), 0)
    }

    /// Blocks until every previous write has reached stable storage.
    pub fn sync(&self, mode: SyncMode) -> io::Result<()> {
        match mode {
            SyncMode::Data => self.file.sync_data(),
            SyncMode::Full => self.file.sync_all(),
        }
    }
}

impl From<File> for LedgerFile {
    fn from(file: File) -> Self {
        Self { file }
    }
}

#[cfg(unix)]
fn read_exact_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<()> {
    use std::os::unix::fs::FileExt;
    file.read_exact_at(buf, offset)
}

#[cfg(unix)]
fn write_all_at(file: &File, data: &[u8], offset: u64) -> io::Result<()> {
    use std::os::unix::fs::FileExt;
    file.write_all_at(data, offset)
}

#[cfg(windows)]
fn read_exact_at(file: &File, mut buf: &mut [u8], mut offset: u64) -> io::Result<()> {
    use std::os::windows::fs::FileExt;
    while !buf.is_empty() {
        match file.seek_read(buf, offset) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "failed to fill whole buffer",
                ))
            }
            Ok(n) => {
                buf = &mut buf[n..];
                offset += n as u64;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

#[cfg(windows)]
fn write_all_at(file: &File, mut data: &[u8], mut offset: u64) -> io::Result<()> {
    use std::os::windows::fs::FileExt;
    while !data.is_empty() {
        match file.seek_write(data, offset) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "failed to write whole buffer",
                ))
            }
            Ok(n) => {
                data = &data[n..];
                offset += n as u64;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
