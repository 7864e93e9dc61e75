//! Bounded, scoped reads against a container.
//!
//! # Scope
//! [`read_bounded`] opens the file, seeks, reads at most `length` bytes and
//! drops the handle before returning.  The handle is owned by the function
//! body, so it is released on every exit path: success, short read and
//! error alike.  Nothing is cached between calls and the file is never
//! opened for writing.
//!
//! # Sources
//! The decode chain talks to storage only through [`BoundedRead`].  Two
//! sources ship with the crate:
//!
//! | Source | Backing |
//! |--------|---------|
//! | [`ContainerHandle`](crate::container::ContainerHandle) | a path, reopened per read |
//! | [`MemorySource`] | a borrowed byte slice |
//!
//! Both apply the same bounds rule: a read either returns exactly `length`
//! bytes or fails with [`IoError::ShortRead`].

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use thiserror::Error;

// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum IoError {
    #[error("File not found: {}", .path.display())]
    NotFound { path: PathBuf },
    /// Fewer than `requested` bytes exist at `offset`.
    #[error("Short read at offset {offset}: requested {requested} bytes, {available} available")]
    ShortRead {
        offset:    u64,
        requested: usize,
        available: usize,
    },
    #[error("Cannot read {}: {source}", .path.display())]
    Unreadable {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },
}

impl IoError {
    fn from_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => IoError::NotFound { path: path.to_owned() },
            _ => IoError::Unreadable { path: path.to_owned(), source: err },
        }
    }
}

// ── BoundedRead ──────────────────────────────────────────────────────────────

/// A read-only source of container bytes.
///
/// Implementations must return exactly `length` bytes starting at `offset`,
/// or fail.  A partial buffer is never a valid result.
pub trait BoundedRead {
    fn read_at(&self, length: usize, offset: u64) -> Result<Vec<u8>, IoError>;
}

/// Read exactly `length` bytes at `offset` from the file at `path`.
pub fn read_bounded<P: AsRef<Path>>(path: P, length: usize, offset: u64) -> Result<Vec<u8>, IoError> {
    let path = path.as_ref();
    let mut file = File::open(path).map_err(|e| IoError::from_io(path, e))?;
    file.seek(SeekFrom::Start(offset))
        .map_err(|e| IoError::from_io(path, e))?;

    // Never reserve more than the file can supply past `offset`.
    let remaining = file
        .metadata()
        .map_err(|e| IoError::from_io(path, e))?
        .len()
        .saturating_sub(offset);
    let capacity = usize::try_from(remaining).unwrap_or(usize::MAX).min(length);

    let mut buf = Vec::with_capacity(capacity);
    file.by_ref()
        .take(length as u64)
        .read_to_end(&mut buf)
        .map_err(|e| IoError::from_io(path, e))?;

    if buf.len() < length {
        return Err(IoError::ShortRead {
            offset,
            requested: length,
            available: buf.len(),
        });
    }
    Ok(buf)
}

// ── MemorySource ─────────────────────────────────────────────────────────────

/// In-memory container bytes, e.g. a header already fetched by the caller.
#[derive(Debug, Clone, Copy)]
pub struct MemorySource<'a> {
    bytes: &'a [u8],
}

impl<'a> MemorySource<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }
}

impl<'a> From<&'a [u8]> for MemorySource<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Self::new(bytes)
    }
}

impl BoundedRead for MemorySource<'_> {
    fn read_at(&self, length: usize, offset: u64) -> Result<Vec<u8>, IoError> {
        let start = usize::try_from(offset)
            .unwrap_or(usize::MAX)
            .min(self.bytes.len());
        let available = self.bytes.len() - start;
        if available < length {
            return Err(IoError::ShortRead {
                offset,
                requested: length,
                available,
            });
        }
        Ok(self.bytes[start..start + length].to_vec())
    }
}
