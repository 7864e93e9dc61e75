//! Error types for the decode chain.
//!
//! [`FormatError`] means the bytes were read but do not describe a
//! recognised PFF container.  [`IoError`] means the bytes could not be read.
//! [`PffError`] wraps either one together with the [`Stage`] that failed, so
//! callers can tell "not this format" apart from "I/O problem" and still
//! print a message that names the failing step.

use std::fmt;
use thiserror::Error;

use crate::reader::IoError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("Invalid signature: expected \"!BDN\", found {}", hex::encode(.found))]
    BadSignature { found: [u8; 4] },
    #[error("Unknown content kind code: {}", hex::encode(.0))]
    UnknownContentKind([u8; 2]),
    #[error("Unknown format variant: {0}")]
    UnknownFormatVariant(u16),
    #[error("Unknown encryption kind: 0x{0:02X}")]
    UnknownEncryptionKind(u8),
    /// A caller-supplied buffer does not have the length its type requires.
    #[error("{field} must be {expected} bytes, got {found}")]
    WrongLength {
        field:    &'static str,
        expected: usize,
        found:    usize,
    },
    #[error("{field} CRC mismatch: stored 0x{stored:08X}, computed 0x{computed:08X}")]
    CrcMismatch {
        field:    &'static str,
        stored:   u32,
        computed: u32,
    },
}

// ── Stage ────────────────────────────────────────────────────────────────────

/// One step of the decode chain, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    ReadHeader,
    ValidateSignature,
    ResolveContentKind,
    ResolveFormatVariant,
    ReadHeaderBlock,
    VerifyCrc,
    ResolveEncryptionKind,
}

impl Stage {
    pub const ALL: [Stage; 7] = [
        Stage::ReadHeader,
        Stage::ValidateSignature,
        Stage::ResolveContentKind,
        Stage::ResolveFormatVariant,
        Stage::ReadHeaderBlock,
        Stage::VerifyCrc,
        Stage::ResolveEncryptionKind,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Stage::ReadHeader            => "reading file header",
            Stage::ValidateSignature     => "validating signature",
            Stage::ResolveContentKind    => "resolving content kind",
            Stage::ResolveFormatVariant  => "resolving format variant",
            Stage::ReadHeaderBlock       => "reading header block",
            Stage::VerifyCrc             => "verifying header CRC",
            Stage::ResolveEncryptionKind => "resolving encryption kind",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── PffError ─────────────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum PffError {
    #[error("{stage}: {source}")]
    Io {
        stage:  Stage,
        #[source]
        source: IoError,
    },
    #[error("{stage}: {source}")]
    Format {
        stage:  Stage,
        #[source]
        source: FormatError,
    },
}

impl PffError {
    pub fn io(stage: Stage, source: IoError) -> Self {
        PffError::Io { stage, source }
    }

    pub fn format(stage: Stage, source: FormatError) -> Self {
        PffError::Format { stage, source }
    }

    /// The stage that failed.
    pub fn stage(&self) -> Stage {
        match self {
            PffError::Io { stage, .. } | PffError::Format { stage, .. } => *stage,
        }
    }

    pub fn as_io(&self) -> Option<&IoError> {
        match self {
            PffError::Io { source, .. } => Some(source),
            PffError::Format { .. } => None,
        }
    }

    pub fn as_format(&self) -> Option<&FormatError> {
        match self {
            PffError::Format { source, .. } => Some(source),
            PffError::Io { .. } => None,
        }
    }
}

pub type PffResult<T> = Result<T, PffError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_are_ordered() {
        let mut sorted = Stage::ALL;
        sorted.sort();
        assert_eq!(sorted, Stage::ALL);
        assert_eq!(Stage::ALL.last(), Some(&Stage::ResolveEncryptionKind));
    }

    #[test]
    fn message_names_stage() {
        let err = PffError::format(Stage::ValidateSignature, FormatError::BadSignature { found: *b"XXXX" });
        assert_eq!(
            err.to_string(),
            "validating signature: Invalid signature: expected \"!BDN\", found 58585858"
        );
        assert_eq!(err.stage(), Stage::ValidateSignature);
        assert!(err.as_io().is_none());
    }

    #[test]
    fn io_error_is_distinguishable() {
        let err = PffError::io(
            Stage::ReadHeaderBlock,
            IoError::ShortRead { offset: 0, requested: 540, available: 24 },
        );
        assert!(matches!(err.as_io(), Some(IoError::ShortRead { requested: 540, .. })));
        assert!(err.as_format().is_none());
    }
}
