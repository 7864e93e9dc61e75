//! The 24-byte file header shared by every PFF variant.
//!
//! ```text
//! offset  size  field
//!      0     4  dwMagic          "!BDN"
//!      4     4  dwCRCPartial
//!      8     2  wMagicClient     content kind: "SM" | "SO" | "AB"
//!     10     2  wVer             format variant code, little-endian
//!     12     2  wVerClient
//!     14     1  bPlatformCreate
//!     15     1  bPlatformAccess
//!     16     8  reserved
//! ```
//!
//! The signature must be checked before any other field is interpreted.

use byteorder::{ByteOrder, LittleEndian};
use serde::Serialize;

use crate::error::FormatError;

pub const HEADER_SIZE: usize = 24;
pub const MAGIC: &[u8; 4] = b"!BDN";

pub const CONTENT_KIND_OFFSET: usize = 8;
pub const VARIANT_CODE_OFFSET: usize = 10;

// ── HeaderBytes ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderBytes([u8; HEADER_SIZE]);

impl HeaderBytes {
    pub fn new(bytes: [u8; HEADER_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; HEADER_SIZE] {
        &self.0
    }

    pub fn magic(&self) -> [u8; 4] {
        [self.0[0], self.0[1], self.0[2], self.0[3]]
    }

    pub fn content_code(&self) -> [u8; 2] {
        [self.0[CONTENT_KIND_OFFSET], self.0[CONTENT_KIND_OFFSET + 1]]
    }

    pub fn variant_code(&self) -> u16 {
        LittleEndian::read_u16(&self.0[VARIANT_CODE_OFFSET..VARIANT_CODE_OFFSET + 2])
    }
}

impl TryFrom<&[u8]> for HeaderBytes {
    type Error = FormatError;

    fn try_from(bytes: &[u8]) -> Result<Self, FormatError> {
        <[u8; HEADER_SIZE]>::try_from(bytes)
            .map(Self)
            .map_err(|_| FormatError::WrongLength {
                field:    "file header",
                expected: HEADER_SIZE,
                found:    bytes.len(),
            })
    }
}

// ── Signature ────────────────────────────────────────────────────────────────

/// True iff bytes 0..4 are `!BDN`.  No other byte is looked at.
pub fn validate_signature(header: &HeaderBytes) -> bool {
    header.0[..4] == MAGIC[..]
}

pub fn check_signature(header: &HeaderBytes) -> Result<(), FormatError> {
    if validate_signature(header) {
        Ok(())
    } else {
        Err(FormatError::BadSignature { found: header.magic() })
    }
}

// ── Content kind ─────────────────────────────────────────────────────────────

/// What the container stores, from `wMagicClient`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    PersonalStore,
    OfflineStore,
    AddressBook,
}

/// Every recognised `wMagicClient` code.  Anything else is unknown.
pub const CONTENT_KINDS: [([u8; 2], ContentKind); 3] = [
    (*b"SM", ContentKind::PersonalStore),
    (*b"SO", ContentKind::OfflineStore),
    (*b"AB", ContentKind::AddressBook),
];

impl ContentKind {
    pub fn from_code(code: [u8; 2]) -> Option<Self> {
        CONTENT_KINDS
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, kind)| *kind)
    }

    pub fn code(self) -> [u8; 2] {
        match self {
            ContentKind::PersonalStore => *b"SM",
            ContentKind::OfflineStore  => *b"SO",
            ContentKind::AddressBook   => *b"AB",
        }
    }

    /// Conventional file extension, upper case.
    pub fn short_name(self) -> &'static str {
        match self {
            ContentKind::PersonalStore => "PST",
            ContentKind::OfflineStore  => "OST",
            ContentKind::AddressBook   => "PAB",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ContentKind::PersonalStore => "Personal Storage Table (PST)",
            ContentKind::OfflineStore  => "Offline Storage Table (OST)",
            ContentKind::AddressBook   => "Public Address Book (PAB)",
        }
    }
}

pub fn resolve_content_kind(header: &HeaderBytes) -> Result<ContentKind, FormatError> {
    let code = header.content_code();
    ContentKind::from_code(code).ok_or(FormatError::UnknownContentKind(code))
}
