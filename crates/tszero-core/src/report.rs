//! Transcoding operation reporting.

use std::time::Duration;

use crate::types::ArchiveFormat;
use crate::types::EntryKind;

/// Report of one transcoding invocation.
///
/// The report describes the work done; it never influences the output bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeReport {
    /// Container format that was transcoded.
    pub format: ArchiveFormat,

    /// Number of entries written to the output.
    pub entries: usize,

    /// Entries written without content (directories, links, devices, FIFOs).
    pub header_only_entries: usize,

    /// Total entry content copied, in bytes.
    pub content_bytes: u64,

    /// Size of the output container, in bytes.
    pub container_bytes: u64,

    /// Wall-clock duration of the invocation.
    pub duration: Duration,
}

impl TranscodeReport {
    /// Creates an empty report for `format`.
    #[must_use]
    pub const fn new(format: ArchiveFormat) -> Self {
        Self {
            format,
            entries: 0,
            header_only_entries: 0,
            content_bytes: 0,
            container_bytes: 0,
            duration: Duration::ZERO,
        }
    }

    /// Records one written entry of `kind` with `content_len` content bytes.
    pub fn record_entry(&mut self, kind: EntryKind, content_len: u64) {
        self.entries += 1;
        if kind.carries_content() {
            self.content_bytes += content_len;
        } else {
            self.header_only_entries += 1;
        }
    }

    /// Returns the number of entries that carried content.
    #[must_use]
    pub const fn content_entries(&self) -> usize {
        self.entries - self.header_only_entries
    }
}
