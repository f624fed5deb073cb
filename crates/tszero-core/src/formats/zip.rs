//! Zip transcoder.
//!
//! The zip container keeps its index at the end, so input must be seekable.
//! Entries are visited in central-directory order and written to a fresh
//! container whose only time information is the sentinel.

use std::fs::File;
use std::io::Cursor;
use std::io::Read;
use std::io::Seek;
use std::io::Write;
use std::path::Path;
use std::time::Instant;

use log::debug;
use log::info;
use zip::CompressionMethod;
use zip::ZipArchive;
use zip::ZipWriter;

use crate::Result;
use crate::TranscodeConfig;
use crate::TranscodeError;
use crate::copy::CopyBuffer;
use crate::copy::copy_with_buffer;
use crate::normalize::forwarded_zip_extra_fields;
use crate::normalize::normalize_zip_options;
use crate::report::TranscodeReport;
use crate::types::ArchiveFormat;
use crate::types::EntryKind;

/// Transcodes a zip container into a timestamp-normalized zip container.
///
/// Every entry of `input` is recreated in `output` with the same name,
/// kind, compression method, unix permissions and content. Modification
/// times are the DOS floor (1980-01-01 00:00:00) with an extended timestamp
/// field of zero. Source extra fields are carried over except the ones that
/// hold times (NTFS, extended timestamp, Info-ZIP Unix) and the zip64 and AES
/// fields, which the writer derives itself. The archive comment is kept.
///
/// # Errors
///
/// Returns an error if:
/// - The configuration is invalid
/// - `input` is not a readable zip container
/// - An entry cannot be opened, read, or recreated
/// - Writing the central directory fails
///
/// # Examples
///
/// ```
/// use std::io::Cursor;
/// use tszero_core::TranscodeConfig;
/// use tszero_core::formats::zip::transcode_zip;
/// use tszero_core::test_utils::ZipTestBuilder;
///
/// let input = ZipTestBuilder::new().add_file("a.txt", b"alpha").build();
///
/// let mut output = Cursor::new(Vec::new());
/// let report = transcode_zip(Cursor::new(input), &mut output, &TranscodeConfig::default())?;
/// assert_eq!(report.entries, 1);
/// # Ok::<(), tszero_core::TranscodeError>(())
/// ```
pub fn transcode_zip<R: Read + Seek, W: Write + Seek>(
    input: R,
    output: W,
    config: &TranscodeConfig,
) -> Result<TranscodeReport> {
    transcode_zip_inner(input, output, config).map(|(_, report)| report)
}

/// Transcodes the zip file at `path` into `output`.
///
/// # Errors
///
/// Returns `TranscodeError::Io` if the file cannot be opened, otherwise the
/// errors of [`transcode_zip`].
pub fn transcode_zip_path<P: AsRef<Path>, W: Write + Seek>(
    path: P,
    output: W,
    config: &TranscodeConfig,
) -> Result<TranscodeReport> {
    let file = File::open(path.as_ref())?;
    transcode_zip(file, output, config)
}

/// Transcodes a zip container into a forward-only output stream.
///
/// The zip writer seeks back to patch local headers, so the container is
/// assembled in memory and then written to `output` in one pass.
///
/// # Errors
///
/// Returns the errors of [`transcode_zip`], or `TranscodeError::Io` if
/// writing to `output` fails.
pub fn transcode_zip_to_stream<R: Read + Seek, W: Write>(
    input: R,
    mut output: W,
    config: &TranscodeConfig,
) -> Result<TranscodeReport> {
    let (assembled, report) = transcode_zip_inner(input, Cursor::new(Vec::new()), config)?;
    output.write_all(assembled.get_ref())?;
    output.flush()?;
    Ok(report)
}

fn transcode_zip_inner<R: Read + Seek, W: Write + Seek>(
    input: R,
    mut output: W,
    config: &TranscodeConfig,
) -> Result<(W, TranscodeReport)> {
    config.validate()?;
    let start = Instant::now();

    let mut archive = ZipArchive::new(input).map_err(TranscodeError::OpenZip)?;
    let start_position = output.stream_position()?;
    let mut writer = ZipWriter::new(output);
    writer.set_raw_comment(archive.comment().into());

    let mut report = TranscodeReport::new(ArchiveFormat::Zip);
    let mut buffer = CopyBuffer::with_size(config.buffer_size);

    for index in 0..archive.len() {
        let mut file = archive
            .by_index(index)
            .map_err(|source| TranscodeError::OpenZipEntry { index, source })?;
        let extra = file.extra_data().unwrap_or_default();
        let extra_fields = forwarded_zip_extra_fields(extra);
        let dropped_extra = extra.len() != forwarded_extra_len(&extra_fields);
        let entry = SourceEntry {
            name: file.name().to_string(),
            kind: EntryKind::from_zip(file.is_dir(), file.is_symlink()),
            compression: file.compression(),
            unix_mode: file.unix_mode(),
            size: file.size(),
            extra_fields,
            dropped_extra,
        };
        transcode_entry(&entry, &mut file, &mut writer, &mut buffer, config, &mut report)?;
    }

    let mut output = writer.finish().map_err(TranscodeError::FinalizeZip)?;
    output.flush()?;
    report.container_bytes = output.stream_position()? - start_position;
    report.duration = start.elapsed();

    if config.verbose {
        info!(
            "wrote {} zip entries ({} content bytes, {} container bytes)",
            report.entries, report.content_bytes, report.container_bytes
        );
    }

    Ok((output, report))
}

/// Metadata of one input entry, captured before its content is read.
struct SourceEntry {
    name: String,
    kind: EntryKind,
    compression: CompressionMethod,
    unix_mode: Option<u32>,
    size: u64,
    extra_fields: Vec<(u16, Box<[u8]>)>,
    dropped_extra: bool,
}

/// Encoded length of `fields`, each with its four-byte id and length prefix.
fn forwarded_extra_len(fields: &[(u16, Box<[u8]>)]) -> usize {
    fields.iter().map(|(_, payload)| payload.len() + 4).sum()
}

fn transcode_entry<R: Read + ?Sized, W: Write + Seek>(
    entry: &SourceEntry,
    content: &mut R,
    writer: &mut ZipWriter<W>,
    buffer: &mut CopyBuffer,
    config: &TranscodeConfig,
    report: &mut TranscodeReport,
) -> Result<()> {
    let name = &entry.name;
    let kind = entry.kind;
    let expected = entry.size;

    if config.verbose {
        info!("processing {kind} entry {name}");
    }
    if entry.dropped_extra {
        debug!("dropping time extra fields of {name}");
    }

    let create_error = |source| TranscodeError::CreateZipEntry {
        name: name.clone(),
        source,
    };
    let copy_error = |source| TranscodeError::CopyContent {
        name: name.clone(),
        source,
    };

    let options =
        normalize_zip_options(entry.compression, entry.unix_mode, expected, &entry.extra_fields)
            .map_err(create_error)?;

    match kind {
        EntryKind::Directory => {
            writer
                .add_directory(name.as_str(), options)
                .map_err(create_error)?;
            report.record_entry(kind, 0);
        }
        EntryKind::Symlink => {
            let mut target = Vec::new();
            copy_with_buffer(content, &mut target, buffer).map_err(copy_error)?;
            let target = String::from_utf8(target).map_err(|_| {
                TranscodeError::InvalidLinkTarget { name: name.clone() }
            })?;
            writer
                .add_symlink(name.as_str(), target, options)
                .map_err(create_error)?;
            report.record_entry(kind, 0);
        }
        _ => {
            writer
                .start_file(name.as_str(), options)
                .map_err(create_error)?;
            let copied = copy_with_buffer(content, writer, buffer).map_err(copy_error)?;
            if copied != expected {
                return Err(TranscodeError::TruncatedEntry {
                    name: name.clone(),
                    expected,
                    actual: copied,
                });
            }
            if config.verbose {
                info!("copied {copied} bytes for {name}");
            }
            report.record_entry(kind, copied);
        }
    }

    Ok(())
}
