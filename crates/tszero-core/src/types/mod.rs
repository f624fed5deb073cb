//! Format-agnostic archive vocabulary.

pub mod archive_format;
pub mod entry_kind;

pub use archive_format::ArchiveFormat;
pub use entry_kind::EntryKind;
