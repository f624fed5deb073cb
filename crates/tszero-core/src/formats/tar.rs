//! Tar transcoder.
//!
//! Reads a tar stream entry by entry and writes a GNU tar stream in which
//! every timestamp is the sentinel. Both sides are forward-only, so input
//! can come from a pipe and output can go to one.

use std::io::Read;
use std::io::Write;
use std::io::{self};
use std::time::Instant;

use log::debug;
use log::info;

use crate::Result;
use crate::TranscodeConfig;
use crate::TranscodeError;
use crate::copy::CopyBuffer;
use crate::copy::copy_with_buffer;
use crate::formats::gnu_writer::GnuTarWriter;
use crate::normalize::normalize_tar_header;
use crate::normalize::parse_pax_records;
use crate::normalize::strip_global_pax_records;
use crate::normalize::strip_pax_records;
use crate::report::TranscodeReport;
use crate::types::ArchiveFormat;
use crate::types::EntryKind;

/// Transcodes a tar stream into a timestamp-normalized GNU tar stream.
///
/// Entries are written in input order. Content-bearing entries are copied
/// through one buffer of `config.buffer_size` bytes; header-only entries
/// (directories, links, devices, FIFOs) are written without content. The
/// output always ends with the end-of-archive trailer and is flushed.
///
/// Global PAX headers (`g`) are written back in place with their time keys
/// removed; the remaining records, such as the commit id `git archive`
/// stores, are kept.
///
/// An input with no entries produces an output that holds only the trailer.
///
/// # Errors
///
/// Returns an error if:
/// - The configuration is invalid
/// - A header cannot be read or decoded
/// - Entry content ends before its declared size
/// - Reading the input or writing the output fails
///
/// # Examples
///
/// ```
/// use tszero_core::TranscodeConfig;
/// use tszero_core::formats::tar::transcode_tar;
/// use tszero_core::test_utils::TarTestBuilder;
///
/// let input = TarTestBuilder::new()
///     .add_file_with_mtime("a.txt", b"alpha", 1_700_000_000)
///     .build();
///
/// let mut output = Vec::new();
/// let report = transcode_tar(input.as_slice(), &mut output, &TranscodeConfig::default())?;
/// assert_eq!(report.entries, 1);
/// assert_eq!(report.content_bytes, 5);
/// # Ok::<(), tszero_core::TranscodeError>(())
/// ```
pub fn transcode_tar<R: Read, W: Write>(
    input: R,
    output: W,
    config: &TranscodeConfig,
) -> Result<TranscodeReport> {
    config.validate()?;
    let start = Instant::now();

    let mut report = TranscodeReport::new(ArchiveFormat::Tar);
    let mut buffer = CopyBuffer::with_size(config.buffer_size);
    let mut writer = GnuTarWriter::new(output);
    let mut archive = tar::Archive::new(input);

    let entries = archive.entries().map_err(TranscodeError::ReadHeader)?;
    for entry in entries {
        let mut entry = entry.map_err(TranscodeError::ReadHeader)?;
        transcode_entry(&mut entry, &mut writer, &mut buffer, config, &mut report)?;
    }

    let (_, container_bytes) = writer.finish().map_err(TranscodeError::FinalizeTar)?;
    report.container_bytes = container_bytes;
    report.duration = start.elapsed();

    if config.verbose {
        info!(
            "wrote {} tar entries ({} content bytes, {} container bytes)",
            report.entries, report.content_bytes, report.container_bytes
        );
    }

    Ok(report)
}

fn transcode_entry<R: Read, W: Write>(
    entry: &mut tar::Entry<'_, R>,
    writer: &mut GnuTarWriter<W>,
    buffer: &mut CopyBuffer,
    config: &TranscodeConfig,
    report: &mut TranscodeReport,
) -> Result<()> {
    let path = entry.path_bytes().into_owned();
    let name = String::from_utf8_lossy(&path).into_owned();
    let link_name = entry.link_name_bytes().map(std::borrow::Cow::into_owned);
    let kind = EntryKind::from_tar(entry.header().entry_type());
    let size = entry.size();

    if config.verbose {
        info!("processing {kind} entry {name}");
    }

    if entry.header().entry_type().is_pax_global_extensions() {
        return transcode_global_header(entry, &path, &name, writer, buffer, report);
    }

    let pax_records = forwarded_pax_records(entry, &name)?;
    let header = normalize_tar_header(entry.header(), size);

    writer
        .write_header(header, &path, link_name.as_deref(), &pax_records)
        .map_err(|source| TranscodeError::WriteHeader {
            name: name.clone(),
            source,
        })?;

    if !kind.carries_content() {
        report.record_entry(kind, 0);
        return Ok(());
    }

    let copied = writer
        .write_content(entry, buffer)
        .map_err(|source| TranscodeError::CopyContent {
            name: name.clone(),
            source,
        })?;
    if copied != size {
        return Err(TranscodeError::TruncatedEntry {
            name,
            expected: size,
            actual: copied,
        });
    }
    writer
        .end_content(copied)
        .map_err(|source| TranscodeError::CopyContent {
            name: name.clone(),
            source,
        })?;

    if config.verbose {
        info!("copied {copied} bytes for {name}");
    }
    report.record_entry(kind, copied);
    Ok(())
}

/// Re-emits a global PAX header without its time records.
///
/// The record block is the entry's content, so it is read here instead of
/// through `pax_extensions`, which would leave nothing for the size check.
fn transcode_global_header<R: Read, W: Write>(
    entry: &mut tar::Entry<'_, R>,
    path: &[u8],
    name: &str,
    writer: &mut GnuTarWriter<W>,
    buffer: &mut CopyBuffer,
    report: &mut TranscodeReport,
) -> Result<()> {
    let size = entry.size();
    let mut data = Vec::new();
    let copied =
        copy_with_buffer(entry, &mut data, buffer).map_err(|source| TranscodeError::CopyContent {
            name: name.to_string(),
            source,
        })?;
    if copied != size {
        return Err(TranscodeError::TruncatedEntry {
            name: name.to_string(),
            expected: size,
            actual: copied,
        });
    }

    let records = parse_pax_records(&data).map_err(|source| TranscodeError::InvalidHeader {
        name: name.to_string(),
        source,
    })?;
    let total = records.len();
    let forwarded = strip_global_pax_records(records);
    if forwarded.len() != total {
        debug!("dropped {} global PAX records from {name}", total - forwarded.len());
    }

    let written = writer
        .write_global_header(path, &forwarded)
        .map_err(|source| TranscodeError::WriteHeader {
            name: name.to_string(),
            source,
        })?;
    report.record_entry(EntryKind::from_tar(tar::EntryType::XGlobalHeader), written);
    Ok(())
}

/// Collects the entry's PAX records that survive normalization.
fn forwarded_pax_records<R: Read>(
    entry: &mut tar::Entry<'_, R>,
    name: &str,
) -> Result<Vec<(String, Vec<u8>)>> {
    let invalid = |source: io::Error| TranscodeError::InvalidHeader {
        name: name.to_string(),
        source,
    };

    let Some(extensions) = entry.pax_extensions().map_err(invalid)? else {
        return Ok(Vec::new());
    };

    let mut records = Vec::new();
    for extension in extensions {
        let extension = extension.map_err(invalid)?;
        let key = extension
            .key()
            .map_err(|e| invalid(io::Error::new(io::ErrorKind::InvalidData, e)))?;
        records.push((key, extension.value_bytes()));
    }

    let total = records.len();
    let forwarded = strip_pax_records(records);
    if forwarded.len() != total {
        debug!("dropped {} PAX records from {name}", total - forwarded.len());
    }
    Ok(forwarded)
}
