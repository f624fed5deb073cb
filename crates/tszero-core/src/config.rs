//! Transcoding configuration.

use crate::Result;
use crate::TranscodeError;

/// Default chunk size for content copying (8 KiB).
pub const DEFAULT_BUFFER_SIZE: usize = 8 * 1024;

/// Per-invocation transcoding configuration.
///
/// Constructed once by the caller and passed by reference into the
/// transcoders. Nothing here affects the bytes written to the output: the
/// buffer size only changes I/O granularity and `verbose` only enables
/// progress logging.
///
/// # Examples
///
/// ```
/// use tszero_core::TranscodeConfig;
///
/// let config = TranscodeConfig::default();
/// assert_eq!(config.buffer_size, 8192);
///
/// let custom = TranscodeConfig::default()
///     .with_buffer_size(64 * 1024)
///     .with_verbose(true);
/// assert!(custom.verbose);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeConfig {
    /// Chunk size used by the content copier, in bytes.
    pub buffer_size: usize,

    /// Emit per-entry progress detail through the `log` facade.
    pub verbose: bool,
}

impl Default for TranscodeConfig {
    /// Default values:
    /// - `buffer_size`: 8192 bytes
    /// - `verbose`: false
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            verbose: false,
        }
    }
}

impl TranscodeConfig {
    /// Sets the copy buffer size.
    #[must_use]
    pub const fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// Enables or disables progress logging.
    #[must_use]
    pub const fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `TranscodeError::InvalidConfig` if the buffer size is zero.
    pub fn validate(&self) -> Result<()> {
        if self.buffer_size == 0 {
            return Err(TranscodeError::InvalidConfig(
                "buffer size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
