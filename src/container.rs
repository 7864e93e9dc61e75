//! High-level decode API: the primary embedding surface.
//!
//! ```no_run
//! use pff_header::container::ContainerHandle;
//!
//! let header = ContainerHandle::new("mailbox.pst").decode()?;
//! println!("{} / {}", header.content_kind.name(), header.variant.name());
//!
//! let handoff = header.btree_handoff();
//! println!("b-tree root at {} ({} B pages)", handoff.root_offset, handoff.page.size);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Chain
//!
//! ```text
//! Start → HeaderRead → SignatureChecked → ContentKindResolved
//!       → FormatVariantResolved → HeaderBlockRead [→ CrcChecked]
//!       → EncryptionKindResolved → RootOffsetResolved → Done
//! ```
//!
//! Each step runs once, in order, and consumes the previous step's output.
//! The first failure ends the chain with a [`PffError`] naming its
//! [`Stage`]; no partial header is ever returned.  The CRC step only runs
//! when [`DecodeOptions::crc`] asks for it.

use log::{debug, trace, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::block::{decode_header_block, resolve_encryption_kind, resolve_root_offset, EncryptionKind, RootOffset};
use crate::crc::CrcReport;
use crate::error::{FormatError, PffError, PffResult, Stage};
use crate::header::{check_signature, resolve_content_kind, ContentKind, HeaderBytes, HEADER_SIZE};
use crate::reader::{read_bounded, BoundedRead, IoError};
use crate::variant::{resolve_format_variant, FormatVariant};

// ── DecodeOptions ─────────────────────────────────────────────────────────────

/// What to do with the header CRCs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CrcPolicy {
    /// Do not compute them.
    Skip,
    /// Compute them, log mismatches, never fail.
    #[default]
    Report,
    /// Fail the chain on any mismatch.
    Enforce,
}

impl CrcPolicy {
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "skip"    => Some(CrcPolicy::Skip),
            "report"  => Some(CrcPolicy::Report),
            "enforce" => Some(CrcPolicy::Enforce),
            _         => None,
        }
    }
}

/// Configuration for [`ContainerHandle::decode_with`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeOptions {
    pub crc: CrcPolicy,
}

// ── Results ──────────────────────────────────────────────────────────────────

/// Everything the chain resolves from one container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerHeader {
    pub content_kind: ContentKind,
    /// Raw `wVer` value; several codes share a variant.
    pub format_code:  u16,
    pub variant:      FormatVariant,
    pub encryption:   EncryptionKind,
    pub root_offset:  RootOffset,
    /// `None` when the CRC step was skipped.
    pub crc:          Option<CrcReport>,
}

impl ContainerHeader {
    pub fn btree_handoff(&self) -> BTreeHandoff {
        BTreeHandoff {
            root_offset: self.root_offset,
            variant:     self.variant,
            page:        PageGeometry::LEGACY,
        }
    }
}

/// Physical page size and the usable payload inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageGeometry {
    pub size:    u32,
    pub payload: u32,
}

impl PageGeometry {
    /// 512-byte pages with a 496-byte payload, as the b-tree walker expects.
    pub const LEGACY: PageGeometry = PageGeometry { size: 512, payload: 496 };

    pub fn trailer(&self) -> u32 {
        self.size - self.payload
    }
}

/// What the b-tree walker needs to start: where the root page is and how
/// pages are laid out.  The variant decides how a page's interior is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BTreeHandoff {
    pub root_offset: RootOffset,
    pub variant:     FormatVariant,
    pub page:        PageGeometry,
}

// ── ContainerHandle ──────────────────────────────────────────────────────────

/// A container identified by path.  Holds no open file; every read opens
/// and closes its own handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerHandle {
    path: PathBuf,
}

impl ContainerHandle {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self { path: path.as_ref().to_owned() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn decode(&self) -> PffResult<ContainerHeader> {
        self.decode_with(DecodeOptions::default())
    }

    pub fn decode_with(&self, options: DecodeOptions) -> PffResult<ContainerHeader> {
        debug!("decoding {}", self.path.display());
        decode_source(self, options)
    }
}

impl BoundedRead for ContainerHandle {
    fn read_at(&self, length: usize, offset: u64) -> Result<Vec<u8>, IoError> {
        read_bounded(&self.path, length, offset)
    }
}

// ── Chain ────────────────────────────────────────────────────────────────────

/// Run the full decode chain against any source.
pub fn decode_source<S>(source: &S, options: DecodeOptions) -> PffResult<ContainerHeader>
where
    S: BoundedRead + ?Sized,
{
    trace!("requesting {HEADER_SIZE} bytes at offset 0");
    let raw = source
        .read_at(HEADER_SIZE, 0)
        .map_err(|e| PffError::io(Stage::ReadHeader, e))?;
    let header = HeaderBytes::try_from(raw.as_slice())
        .map_err(|e| PffError::format(Stage::ReadHeader, e))?;
    debug!("header read");

    check_signature(&header).map_err(|e| PffError::format(Stage::ValidateSignature, e))?;
    debug!("signature checked");

    let content_kind = resolve_content_kind(&header)
        .map_err(|e| PffError::format(Stage::ResolveContentKind, e))?;
    debug!("content kind: {}", content_kind.name());

    let format_code = header.variant_code();
    let variant = resolve_format_variant(&header)
        .map_err(|e| PffError::format(Stage::ResolveFormatVariant, e))?;
    debug!("format variant: {} (code {format_code})", variant.name());

    trace!("requesting {} bytes at offset 0", variant.layout().block_len);
    let block = decode_header_block(source, variant)
        .map_err(|e| PffError::io(Stage::ReadHeaderBlock, e))?;
    debug!("header block read ({} bytes)", block.len());

    let crc = match options.crc {
        CrcPolicy::Skip => None,
        policy => {
            let report = block.crc_report();
            if let Some((field, check)) = report.first_mismatch() {
                if policy == CrcPolicy::Enforce {
                    return Err(PffError::format(
                        Stage::VerifyCrc,
                        FormatError::CrcMismatch {
                            field,
                            stored:   check.stored,
                            computed: check.computed,
                        },
                    ));
                }
                warn!(
                    "{field} mismatch: stored {:#010x}, computed {:#010x}",
                    check.stored, check.computed
                );
            } else {
                debug!("header CRC verified");
            }
            Some(report)
        }
    };

    let encryption = resolve_encryption_kind(&block)
        .map_err(|e| PffError::format(Stage::ResolveEncryptionKind, e))?;
    debug!("encryption kind: {}", encryption.name());

    let root_offset = resolve_root_offset(&block);
    debug!("b-tree root offset: {root_offset}");

    Ok(ContainerHeader {
        content_kind,
        format_code,
        variant,
        encryption,
        root_offset,
        crc,
    })
}
