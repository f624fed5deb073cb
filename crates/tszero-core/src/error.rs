//! Error types for archive transcoding operations.

use thiserror::Error;
use zip::result::ZipError;

/// Result type alias using `TranscodeError`.
pub type Result<T> = std::result::Result<T, TranscodeError>;

/// Errors that can occur while transcoding an archive.
///
/// Every variant is fatal to the invocation that produced it. Clean
/// end-of-stream is never reported as an error.
#[derive(Error, Debug)]
pub enum TranscodeError {
    /// I/O operation failed outside any specific archive step.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The next tar header could not be read or decoded.
    #[error("failed to read next tar header: {0}")]
    ReadHeader(#[source] std::io::Error),

    /// A header field of the entry could not be decoded.
    #[error("invalid header for '{name}': {source}")]
    InvalidHeader {
        /// Entry name as found in the input.
        name: String,
        /// Underlying decoding error.
        #[source]
        source: std::io::Error,
    },

    /// Writing a normalized header to the output failed.
    #[error("failed to write header for '{name}': {source}")]
    WriteHeader {
        /// Entry name.
        name: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Copying entry content from input to output failed.
    #[error("failed to copy content of '{name}': {source}")]
    CopyContent {
        /// Entry name.
        name: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Entry content ended before its declared size.
    #[error("entry '{name}' is truncated: expected {expected} bytes, found {actual}")]
    TruncatedEntry {
        /// Entry name.
        name: String,
        /// Size declared by the header.
        expected: u64,
        /// Bytes actually available.
        actual: u64,
    },

    /// The input could not be opened as a zip container.
    #[error("failed to open zip archive: {0}")]
    OpenZip(#[source] ZipError),

    /// A single zip entry could not be opened for reading.
    #[error("failed to open zip entry #{index}: {source}")]
    OpenZipEntry {
        /// Position of the entry in the central directory.
        index: usize,
        /// Underlying zip error.
        #[source]
        source: ZipError,
    },

    /// The output entry could not be created.
    #[error("failed to create zip entry '{name}': {source}")]
    CreateZipEntry {
        /// Entry name.
        name: String,
        /// Underlying zip error.
        #[source]
        source: ZipError,
    },

    /// A zip symlink target is not valid UTF-8.
    #[error("symlink target of '{name}' is not valid UTF-8")]
    InvalidLinkTarget {
        /// Entry name.
        name: String,
    },

    /// Writing the tar trailer or flushing the output failed.
    #[error("failed to finalize tar archive: {0}")]
    FinalizeTar(#[source] std::io::Error),

    /// Writing the zip central directory failed.
    #[error("failed to finalize zip archive: {0}")]
    FinalizeZip(#[source] ZipError),

    /// Configuration is not usable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl TranscodeError {
    /// Returns `true` if this error means the input container is malformed.
    ///
    /// # Examples
    ///
    /// ```
    /// use tszero_core::TranscodeError;
    ///
    /// let err = TranscodeError::TruncatedEntry {
    ///     name: "a.txt".to_string(),
    ///     expected: 10,
    ///     actual: 4,
    /// };
    /// assert!(err.is_malformed_input());
    ///
    /// let err = TranscodeError::InvalidConfig("buffer size".to_string());
    /// assert!(!err.is_malformed_input());
    /// ```
    #[must_use]
    pub const fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            Self::ReadHeader(_)
                | Self::InvalidHeader { .. }
                | Self::TruncatedEntry { .. }
                | Self::OpenZip(_)
                | Self::OpenZipEntry { .. }
                | Self::InvalidLinkTarget { .. }
        )
    }

    /// Returns the name of the entry this error concerns, if any.
    #[must_use]
    pub fn entry_name(&self) -> Option<&str> {
        match self {
            Self::InvalidHeader { name, .. }
            | Self::WriteHeader { name, .. }
            | Self::CopyContent { name, .. }
            | Self::TruncatedEntry { name, .. }
            | Self::CreateZipEntry { name, .. }
            | Self::InvalidLinkTarget { name } => Some(name),
            _ => None,
        }
    }
}
