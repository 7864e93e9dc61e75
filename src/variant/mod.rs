//! Format variants and their frozen field layouts.
//!
//! # Variant codes
//! `wVer` (offset 10, little-endian u16) selects one of three physical
//! layouts.  Several codes map to the same layout: they are revisions of
//! one generation, not distinct formats.
//!
//! | Code | Variant |
//! |------|---------|
//! | 14, 15 | [`FormatVariant::AnsiNarrow`] |
//! | 21, 23 | [`FormatVariant::UnicodeWide`] |
//! | 36 | [`FormatVariant::UnicodeWide4K`] |
//!
//! # Layouts
//! Every field offset past the common header is a pure function of the
//! variant and lives in one [`Layout`] record.  Nothing here is inferred
//! from block length; adding a generation means adding a table row.

use serde::Serialize;

use crate::error::FormatError;
use crate::header::HeaderBytes;

// ── Field width ──────────────────────────────────────────────────────────────

/// Width of an integer field in the header block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldWidth {
    U32,
    U64,
}

impl FieldWidth {
    #[inline]
    pub fn bytes(self) -> usize {
        match self {
            FieldWidth::U32 => 4,
            FieldWidth::U64 => 8,
        }
    }
}

// ── Layout ───────────────────────────────────────────────────────────────────

/// Static per-variant description of the header block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    /// Bytes read from offset 0 to obtain the header block.
    pub block_len:         usize,
    /// Offset of `bCryptMethod`.
    pub encryption_offset: usize,
    /// Offset of the b-tree root field.
    pub root_offset:       usize,
    pub root_width:        FieldWidth,
    /// Offset of `dwCRCFull`, when the variant has one.
    pub full_crc_offset:   Option<usize>,
}

impl Layout {
    pub fn root_range(&self) -> std::ops::Range<usize> {
        self.root_offset..self.root_offset + self.root_width.bytes()
    }
}

pub const ANSI_LAYOUT: Layout = Layout {
    block_len:         488,
    encryption_offset: 461,
    root_offset:       196,
    root_width:        FieldWidth::U32,
    full_crc_offset:   None,
};

pub const UNICODE_LAYOUT: Layout = Layout {
    block_len:         540,
    encryption_offset: 513,
    root_offset:       240,
    root_width:        FieldWidth::U64,
    full_crc_offset:   Some(524),
};

// ── FormatVariant ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatVariant {
    /// Legacy 32-bit (ANSI) layout.
    AnsiNarrow,
    /// 64-bit (Unicode) layout.
    UnicodeWide,
    /// 64-bit layout with 4096-byte pages.
    #[serde(rename = "unicode_wide_4k")]
    UnicodeWide4K,
}

/// Every recognised `wVer` code.  Anything else is unknown.
pub const VARIANT_CODES: [(u16, FormatVariant); 5] = [
    (14, FormatVariant::AnsiNarrow),
    (15, FormatVariant::AnsiNarrow),
    (21, FormatVariant::UnicodeWide),
    (23, FormatVariant::UnicodeWide),
    (36, FormatVariant::UnicodeWide4K),
];

impl FormatVariant {
    pub const ALL: [FormatVariant; 3] = [
        FormatVariant::AnsiNarrow,
        FormatVariant::UnicodeWide,
        FormatVariant::UnicodeWide4K,
    ];

    pub fn from_code(code: u16) -> Option<Self> {
        VARIANT_CODES
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, variant)| *variant)
    }

    /// All `wVer` codes that resolve to this variant.
    pub fn codes(self) -> impl Iterator<Item = u16> {
        VARIANT_CODES
            .into_iter()
            .filter(move |(_, v)| *v == self)
            .map(|(code, _)| code)
    }

    // The 4K variant shares the plain wide layout for every field read here.
    #[inline]
    pub fn layout(self) -> &'static Layout {
        match self {
            FormatVariant::AnsiNarrow    => &ANSI_LAYOUT,
            FormatVariant::UnicodeWide   => &UNICODE_LAYOUT,
            FormatVariant::UnicodeWide4K => &UNICODE_LAYOUT,
        }
    }

    pub fn is_wide(self) -> bool {
        !matches!(self, FormatVariant::AnsiNarrow)
    }

    pub fn name(self) -> &'static str {
        match self {
            FormatVariant::AnsiNarrow    => "32-bit (ANSI)",
            FormatVariant::UnicodeWide   => "64-bit (Unicode)",
            FormatVariant::UnicodeWide4K => "64-bit with 4K pages (Unicode)",
        }
    }
}

pub fn resolve_format_variant(header: &HeaderBytes) -> Result<FormatVariant, FormatError> {
    let code = header.variant_code();
    FormatVariant::from_code(code).ok_or(FormatError::UnknownFormatVariant(code))
}
