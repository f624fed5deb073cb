//! Error conversion utilities for CLI.
//!
//! Converts tszero-core's typed errors (thiserror) into user-facing
//! contextual errors (anyhow) naming the input and, where it helps, a hint.

use anyhow::anyhow;
use std::any::Any;
use tszero_core::ArchiveFormat;
use tszero_core::TranscodeError;

/// Converts `TranscodeError` to a user-facing anyhow error with context.
///
/// `source` names the input ("standard input" or a path).
pub fn convert_transcode_error(
    err: TranscodeError,
    source: &str,
    format: ArchiveFormat,
) -> anyhow::Error {
    match err {
        TranscodeError::TruncatedEntry {
            name,
            expected,
            actual,
        } => anyhow!(
            "Truncated {format} archive '{source}': entry '{name}' declares {expected} bytes \
             but only {actual} are present\n\
             HINT: The archive was probably cut short during download or copy."
        ),
        TranscodeError::OpenZip(zip_err) => anyhow!(
            "Cannot read '{source}' as a zip archive: {zip_err}\n\
             HINT: Check that --format matches the input."
        ),
        TranscodeError::ReadHeader(io_err) => anyhow!(
            "Malformed {format} archive '{source}': {io_err}\n\
             HINT: Check that --format matches the input and that the archive is complete."
        ),
        TranscodeError::InvalidConfig(reason) => anyhow!("Invalid configuration: {reason}"),
        err => {
            let context = match err.entry_name() {
                Some(entry) => {
                    format!("Error transcoding entry '{entry}' of {format} archive '{source}'")
                }
                None => format!("Error transcoding {format} archive '{source}'"),
            };
            anyhow::Error::from(err).context(context)
        }
    }
}

/// Converts a panic payload caught at the process boundary into an error.
pub fn convert_panic(payload: &(dyn Any + Send)) -> anyhow::Error {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    anyhow!("Internal error: {message}")
}
