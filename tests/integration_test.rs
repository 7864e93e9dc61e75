use pff_header::container::{ContainerHandle, CrcPolicy, DecodeOptions};
use pff_header::variant::FieldWidth;
use pff_header::{crc, ContentKind, EncryptionKind, FormatError, FormatVariant, IoError, RootOffset, Stage};
use std::io::Write;
use tempfile::NamedTempFile;

/// Build a header block with the given content code, `wVer`, encryption
/// byte and root offset, sized and laid out for the variant `code` selects.
fn container(content: &[u8; 2], code: u16, crypt: u8, root: u64) -> Vec<u8> {
    let variant = FormatVariant::from_code(code).expect("test uses a known code");
    let layout = variant.layout();
    let mut buf = vec![0u8; layout.block_len];
    buf[..4].copy_from_slice(b"!BDN");
    buf[8..10].copy_from_slice(content);
    buf[10..12].copy_from_slice(&code.to_le_bytes());
    buf[layout.encryption_offset] = crypt;
    match layout.root_width {
        FieldWidth::U32 => buf[layout.root_range()].copy_from_slice(&(root as u32).to_le_bytes()),
        FieldWidth::U64 => buf[layout.root_range()].copy_from_slice(&root.to_le_bytes()),
    }
    buf
}

fn stamp_crcs(buf: &mut [u8]) {
    let partial = crc::compute(&buf[8..8 + 471]);
    buf[4..8].copy_from_slice(&partial.to_le_bytes());
    if buf.len() >= 528 {
        let full = crc::compute(&buf[8..8 + 516]);
        buf[524..528].copy_from_slice(&full.to_le_bytes());
    }
}

fn write_temp(data: &[u8]) -> NamedTempFile {
    let mut f = NamedTempFile::new().unwrap();
    f.write_all(data).unwrap();
    f.flush().unwrap();
    f
}

#[test]
fn test_unicode_pst_roundtrip() {
    let file = write_temp(&container(b"SM", 21, 1, 0x1000));
    let header = ContainerHandle::new(file.path()).decode().unwrap();

    assert_eq!(header.content_kind, ContentKind::PersonalStore);
    assert_eq!(header.variant, FormatVariant::UnicodeWide);
    assert_eq!(header.encryption, EncryptionKind::Permute);
    assert_eq!(header.root_offset, RootOffset::new(0x1000));
}

#[test]
fn test_ansi_ost() {
    let file = write_temp(&container(b"SO", 14, 0, 0x4400));
    let header = ContainerHandle::new(file.path()).decode().unwrap();

    assert_eq!(header.content_kind, ContentKind::OfflineStore);
    assert_eq!(header.variant, FormatVariant::AnsiNarrow);
    assert_eq!(header.format_code, 14);
    assert_eq!(header.encryption, EncryptionKind::None);
    assert_eq!(header.root_offset.get(), 0x4400);
}

#[test]
fn test_4k_address_book() {
    let file = write_temp(&container(b"AB", 36, 2, u64::MAX - 1));
    let header = ContainerHandle::new(file.path()).decode().unwrap();

    assert_eq!(header.content_kind, ContentKind::AddressBook);
    assert_eq!(header.variant, FormatVariant::UnicodeWide4K);
    assert_eq!(header.encryption, EncryptionKind::Cyclic);
    assert_eq!(header.root_offset.get(), u64::MAX - 1);
}

#[test]
fn test_store_kinds_never_collapse() {
    let pst = write_temp(&container(b"SM", 23, 1, 0));
    let ost = write_temp(&container(b"SO", 23, 1, 0));
    let a = ContainerHandle::new(pst.path()).decode().unwrap();
    let b = ContainerHandle::new(ost.path()).decode().unwrap();
    assert_ne!(a.content_kind, b.content_kind);
}

#[test]
fn test_zero_root_offset_is_valid() {
    let file = write_temp(&container(b"SM", 15, 1, 0));
    let header = ContainerHandle::new(file.path()).decode().unwrap();
    assert_eq!(header.root_offset.get(), 0);
}

#[test]
fn test_trailing_data_is_ignored() {
    let mut data = container(b"SM", 23, 1, 0x2000);
    data.extend(std::iter::repeat(0xAA).take(4096));
    let file = write_temp(&data);
    let header = ContainerHandle::new(file.path()).decode().unwrap();
    assert_eq!(header.root_offset.get(), 0x2000);
}

#[test]
fn test_unknown_encryption_byte_fails() {
    let file = write_temp(&container(b"SM", 21, 9, 0x1000));
    let err = ContainerHandle::new(file.path()).decode().unwrap_err();

    assert_eq!(err.stage(), Stage::ResolveEncryptionKind);
    assert_eq!(err.as_format(), Some(&FormatError::UnknownEncryptionKind(9)));
}

#[test]
fn test_bad_signature_fails_first() {
    let mut data = container(b"SM", 21, 1, 0x1000);
    data[..4].copy_from_slice(b"XXXX");
    let file = write_temp(&data[..24]);
    let err = ContainerHandle::new(file.path()).decode().unwrap_err();

    assert_eq!(err.stage(), Stage::ValidateSignature);
    assert_eq!(err.as_format(), Some(&FormatError::BadSignature { found: *b"XXXX" }));
}

#[test]
fn test_unknown_content_kind() {
    let mut data = container(b"SM", 21, 1, 0);
    data[8..10].copy_from_slice(b"ZZ");
    let file = write_temp(&data);
    let err = ContainerHandle::new(file.path()).decode().unwrap_err();
    assert_eq!(err.stage(), Stage::ResolveContentKind);
    assert_eq!(err.as_format(), Some(&FormatError::UnknownContentKind(*b"ZZ")));
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = ContainerHandle::new(dir.path().join("absent.pst")).decode().unwrap_err();

    assert_eq!(err.stage(), Stage::ReadHeader);
    assert!(matches!(err.as_io(), Some(IoError::NotFound { .. })));
}

#[test]
fn test_header_shorter_than_24_bytes() {
    let file = write_temp(b"!BDN\0\0\0\0SM");
    let err = ContainerHandle::new(file.path()).decode().unwrap_err();

    assert_eq!(err.stage(), Stage::ReadHeader);
    assert!(matches!(
        err.as_io(),
        Some(IoError::ShortRead { requested: 24, available: 10, .. })
    ));
}

#[test]
fn test_truncated_header_block() {
    let data = container(b"SM", 23, 1, 0x1000);
    let file = write_temp(&data[..500]);
    let err = ContainerHandle::new(file.path()).decode().unwrap_err();

    assert_eq!(err.stage(), Stage::ReadHeaderBlock);
    assert!(matches!(
        err.as_io(),
        Some(IoError::ShortRead { requested: 540, available: 500, .. })
    ));
}

#[test]
fn test_enforced_crc_accepts_stamped_header() {
    let mut data = container(b"SM", 23, 1, 0x1000);
    stamp_crcs(&mut data);
    let file = write_temp(&data);
    let opts = DecodeOptions { crc: CrcPolicy::Enforce };
    let header = ContainerHandle::new(file.path()).decode_with(opts).unwrap();

    let report = header.crc.unwrap();
    assert!(report.is_valid());
    assert!(report.full.is_some());
}

#[test]
fn test_enforced_crc_rejects_tampered_header() {
    let mut data = container(b"SM", 14, 1, 0x1000);
    stamp_crcs(&mut data);
    data[196] ^= 0x01;
    let file = write_temp(&data);
    let opts = DecodeOptions { crc: CrcPolicy::Enforce };
    let err = ContainerHandle::new(file.path()).decode_with(opts).unwrap_err();

    assert_eq!(err.stage(), Stage::VerifyCrc);
    assert!(matches!(
        err.as_format(),
        Some(FormatError::CrcMismatch { field: "dwCRCPartial", .. })
    ));
}

#[test]
fn test_repeated_and_concurrent_decodes() {
    let file = write_temp(&container(b"SM", 21, 1, 0x1000));
    let handle = ContainerHandle::new(file.path());
    let first = handle.decode().unwrap();

    let results: Vec<_> = std::thread::scope(|s| {
        let workers: Vec<_> = (0..4)
            .map(|_| s.spawn(|| handle.decode().unwrap()))
            .collect();
        workers.into_iter().map(|w| w.join().unwrap()).collect()
    });
    for header in results {
        assert_eq!(header, first);
    }
}

#[test]
fn test_header_serializes_to_json() {
    let mut data = container(b"SO", 36, 1, 0x1000);
    stamp_crcs(&mut data);
    let file = write_temp(&data);
    let header = ContainerHandle::new(file.path()).decode().unwrap();

    let value: serde_json::Value = serde_json::to_value(&header).unwrap();
    assert_eq!(value["content_kind"], "offline_store");
    assert_eq!(value["variant"], "unicode_wide_4k");
    assert_eq!(value["format_code"], 36);
    assert_eq!(value["encryption"], "permute");
    assert_eq!(value["root_offset"], 4096);
    assert_eq!(value["crc"]["partial"]["stored"], value["crc"]["partial"]["computed"]);
}
