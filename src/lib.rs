pub mod reader;
pub mod error;
pub mod header;
pub mod variant;
pub mod block;
pub mod crc;
pub mod container;

pub use reader::{BoundedRead, IoError, MemorySource, read_bounded};
pub use error::{FormatError, PffError, PffResult, Stage};
pub use header::{ContentKind, HeaderBytes, MAGIC};
pub use variant::{FormatVariant, Layout};
pub use block::{EncryptionKind, HeaderBlock, RootOffset};
pub use container::{BTreeHandoff, ContainerHandle, ContainerHeader, CrcPolicy, DecodeOptions, decode_source};
