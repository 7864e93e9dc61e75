//! The format-specific header block and the fields resolved from it.
//!
//! The block is always read from offset 0, so it repeats the 24-byte
//! common header.  Its length, and every offset used below, come from the
//! variant's [`Layout`](crate::variant::Layout).
//!
//! | Field | Narrow | Wide |
//! |-------|--------|------|
//! | block length | 488 | 540 |
//! | `bCryptMethod` | 461 | 513 |
//! | b-tree root | 196 (u32) | 240 (u64) |
//!
//! All integers are little-endian.

use byteorder::{ByteOrder, LittleEndian};
use serde::Serialize;
use std::fmt;

use crate::crc::{self, CrcCheck, CrcReport};
use crate::error::FormatError;
use crate::reader::{BoundedRead, IoError};
use crate::variant::{FieldWidth, FormatVariant};

// ── HeaderBlock ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderBlock {
    variant: FormatVariant,
    bytes:   Vec<u8>,
}

impl HeaderBlock {
    /// Wrap bytes the caller already holds.  The length must match the
    /// variant's block length exactly.
    pub fn from_bytes(bytes: Vec<u8>, variant: FormatVariant) -> Result<Self, FormatError> {
        let expected = variant.layout().block_len;
        if bytes.len() != expected {
            return Err(FormatError::WrongLength {
                field:    "header block",
                expected,
                found:    bytes.len(),
            });
        }
        Ok(Self { variant, bytes })
    }

    pub fn variant(&self) -> FormatVariant {
        self.variant
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    fn u32_at(&self, offset: usize) -> u32 {
        LittleEndian::read_u32(&self.bytes[offset..offset + 4])
    }

    pub fn crc_report(&self) -> CrcReport {
        let partial = CrcCheck {
            stored:   self.u32_at(crc::PARTIAL_CRC_OFFSET),
            computed: crc::compute(
                &self.bytes[crc::PARTIAL_CRC_START..crc::PARTIAL_CRC_START + crc::PARTIAL_CRC_LEN],
            ),
        };
        let full = self.variant.layout().full_crc_offset.map(|offset| CrcCheck {
            stored:   self.u32_at(offset),
            computed: crc::compute(
                &self.bytes[crc::FULL_CRC_START..crc::FULL_CRC_START + crc::FULL_CRC_LEN],
            ),
        });
        CrcReport { partial, full }
    }
}

/// Read the header block for `variant` from offset 0.
///
/// Errors from the source are returned unchanged.
pub fn decode_header_block<S>(source: &S, variant: FormatVariant) -> Result<HeaderBlock, IoError>
where
    S: BoundedRead + ?Sized,
{
    let length = variant.layout().block_len;
    let bytes = source.read_at(length, 0)?;
    if bytes.len() != length {
        return Err(IoError::ShortRead {
            offset:    0,
            requested: length,
            available: bytes.len(),
        });
    }
    Ok(HeaderBlock { variant, bytes })
}

// ── Encryption kind ──────────────────────────────────────────────────────────

/// `bCryptMethod`: how data blocks in the container are obfuscated.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EncryptionKind {
    /// `NDB_CRYPT_NONE`
    None    = 0x00,
    /// `NDB_CRYPT_PERMUTE`: compressible encryption.
    Permute = 0x01,
    /// `NDB_CRYPT_CYCLIC`
    Cyclic  = 0x02,
}

pub const ENCRYPTION_KINDS: [(u8, EncryptionKind); 3] = [
    (0x00, EncryptionKind::None),
    (0x01, EncryptionKind::Permute),
    (0x02, EncryptionKind::Cyclic),
];

impl TryFrom<u8> for EncryptionKind {
    type Error = FormatError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        ENCRYPTION_KINDS
            .iter()
            .find(|(code, _)| *code == value)
            .map(|(_, kind)| *kind)
            .ok_or(FormatError::UnknownEncryptionKind(value))
    }
}

impl EncryptionKind {
    pub fn name(self) -> &'static str {
        match self {
            EncryptionKind::None    => "none",
            EncryptionKind::Permute => "permute",
            EncryptionKind::Cyclic  => "cyclic",
        }
    }
}

pub fn resolve_encryption_kind(block: &HeaderBlock) -> Result<EncryptionKind, FormatError> {
    let offset = block.variant.layout().encryption_offset;
    EncryptionKind::try_from(block.bytes[offset])
}

// ── Root offset ──────────────────────────────────────────────────────────────

/// Byte offset of the b-tree root inside the container.
///
/// Narrow containers store it as a u32, wide ones as a u64; both widen to
/// u64 here.  Zero is passed through as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct RootOffset(u64);

impl RootOffset {
    pub fn new(offset: u64) -> Self {
        Self(offset)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RootOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Read the b-tree root field.  The block length was checked when the
/// block was built, so this cannot fail.
pub fn resolve_root_offset(block: &HeaderBlock) -> RootOffset {
    let layout = block.variant.layout();
    let field = &block.bytes[layout.root_range()];
    let value = match layout.root_width {
        FieldWidth::U32 => u64::from(LittleEndian::read_u32(field)),
        FieldWidth::U64 => LittleEndian::read_u64(field),
    };
    RootOffset(value)
}
