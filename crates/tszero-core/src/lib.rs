//! Timestamp-normalizing archive transcoder for reproducible builds.
//!
//! `tszero-core` rewrites tar and zip containers so that every entry keeps
//! its name, order, metadata and content while every timestamp is replaced
//! by a fixed sentinel. Two archives built from the same inputs at
//! different times then become byte-identical after transcoding.
//!
//! Tar input is streamed and the output is always a GNU tar stream. Zip
//! input needs random access; see [`transcode`] for stream input.
//!
//! # Examples
//!
//! ```no_run
//! use tszero_core::ArchiveFormat;
//! use tszero_core::TranscodeConfig;
//! use tszero_core::transcode;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = TranscodeConfig::default();
//! let report = transcode(
//!     ArchiveFormat::Tar,
//!     std::io::stdin().lock(),
//!     std::io::stdout().lock(),
//!     &config,
//! )?;
//! eprintln!("normalized {} entries", report.entries);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod api;
pub mod config;
pub mod copy;
pub mod error;
pub mod formats;
pub mod io;
pub mod normalize;
pub mod report;
pub mod types;

#[doc(hidden)]
pub mod test_utils;

pub use api::transcode;
pub use api::transcode_file;
pub use api::transcode_path;
pub use config::TranscodeConfig;
pub use error::Result;
pub use error::TranscodeError;
pub use formats::transcode_tar;
pub use formats::transcode_zip;
pub use formats::transcode_zip_path;
pub use formats::transcode_zip_to_stream;
pub use report::TranscodeReport;

pub use types::ArchiveFormat;
pub use types::EntryKind;
