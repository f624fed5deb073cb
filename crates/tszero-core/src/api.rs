//! High-level public API: format dispatch over the two transcoders.

use std::fs::File;
use std::io::BufReader;
use std::io::BufWriter;
use std::io::Cursor;
use std::io::Read;
use std::io::Write;
use std::path::Path;

use crate::Result;
use crate::TranscodeConfig;
use crate::copy::CopyBuffer;
use crate::copy::copy_with_buffer;
use crate::formats::transcode_tar;
use crate::formats::transcode_zip;
use crate::formats::transcode_zip_to_stream;
use crate::report::TranscodeReport;
use crate::types::ArchiveFormat;

/// Transcodes an archive read from a forward-only stream.
///
/// Tar input is streamed entry by entry. Zip input needs random access, so
/// it is first spooled into memory and then transcoded from there.
///
/// # Arguments
///
/// * `format` - Container format of `input`; the output has the same format
/// * `input` - Source of the container bytes (e.g. stdin)
/// * `output` - Destination of the normalized container (e.g. stdout)
/// * `config` - Buffer size and verbosity
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the input is not a
/// well-formed container of `format`, or any read or write fails.
///
/// # Examples
///
/// ```
/// use tszero_core::ArchiveFormat;
/// use tszero_core::TranscodeConfig;
/// use tszero_core::test_utils::TarTestBuilder;
/// use tszero_core::transcode;
///
/// let input = TarTestBuilder::new().add_file("a.txt", b"alpha").build();
/// let mut output = Vec::new();
///
/// let report = transcode(
///     ArchiveFormat::Tar,
///     input.as_slice(),
///     &mut output,
///     &TranscodeConfig::default(),
/// )?;
/// assert_eq!(report.entries, 1);
/// # Ok::<(), tszero_core::TranscodeError>(())
/// ```
pub fn transcode<R: Read, W: Write>(
    format: ArchiveFormat,
    mut input: R,
    output: W,
    config: &TranscodeConfig,
) -> Result<TranscodeReport> {
    match format {
        ArchiveFormat::Tar => transcode_tar(input, output, config),
        ArchiveFormat::Zip => {
            config.validate()?;
            let mut spooled = Vec::new();
            let mut buffer = CopyBuffer::with_size(config.buffer_size);
            copy_with_buffer(&mut input, &mut spooled, &mut buffer)?;
            transcode_zip_to_stream(Cursor::new(spooled), output, config)
        }
    }
}

/// Transcodes the archive file at `input_path` into a forward-only stream.
///
/// # Errors
///
/// Returns `TranscodeError::Io` if the file cannot be opened, otherwise the
/// errors of [`transcode`].
pub fn transcode_path<P: AsRef<Path>, W: Write>(
    format: ArchiveFormat,
    input_path: P,
    output: W,
    config: &TranscodeConfig,
) -> Result<TranscodeReport> {
    let file = File::open(input_path.as_ref())?;
    match format {
        ArchiveFormat::Tar => transcode_tar(BufReader::new(file), output, config),
        ArchiveFormat::Zip => transcode_zip_to_stream(file, output, config),
    }
}

/// Transcodes the archive file at `input_path` into a new file at
/// `output_path`.
///
/// The output file is created or truncated. Zip output is written in place
/// without intermediate buffering of the whole container.
///
/// # Errors
///
/// Returns `TranscodeError::Io` if either file cannot be opened, otherwise
/// the errors of [`transcode`].
///
/// # Examples
///
/// ```no_run
/// use tszero_core::ArchiveFormat;
/// use tszero_core::TranscodeConfig;
/// use tszero_core::transcode_file;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let report = transcode_file(
///     ArchiveFormat::Zip,
///     "dist/app.zip",
///     "dist/app-normalized.zip",
///     &TranscodeConfig::default(),
/// )?;
/// println!("{} entries", report.entries);
/// # Ok(())
/// # }
/// ```
pub fn transcode_file<P: AsRef<Path>, Q: AsRef<Path>>(
    format: ArchiveFormat,
    input_path: P,
    output_path: Q,
    config: &TranscodeConfig,
) -> Result<TranscodeReport> {
    let input = File::open(input_path.as_ref())?;
    let output = BufWriter::new(File::create(output_path.as_ref())?);
    match format {
        ArchiveFormat::Tar => transcode_tar(BufReader::new(input), output, config),
        ArchiveFormat::Zip => transcode_zip(input, output, config),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::TranscodeError;
    use crate::test_utils::TarTestBuilder;
    use crate::test_utils::ZipTestBuilder;
    use tempfile::TempDir;

    #[test]
    fn test_transcode_zip_from_stream() {
        let input = ZipTestBuilder::new().add_file("a.txt", b"alpha").build();
        let mut output = Vec::new();
        let report = transcode(
            ArchiveFormat::Zip,
            input.as_slice(),
            &mut output,
            &TranscodeConfig::default(),
        )
        .unwrap();
        assert_eq!(report.format, ArchiveFormat::Zip);
        assert_eq!(report.entries, 1);
        assert_eq!(report.container_bytes, output.len() as u64);
    }

    #[test]
    fn test_stream_and_path_outputs_agree() {
        let temp = TempDir::new().unwrap();
        let input_path = temp.path().join("in.zip");
        let output_path = temp.path().join("out.zip");
        let input = ZipTestBuilder::new()
            .add_directory("d/")
            .add_file("d/a.txt", b"alpha")
            .build();
        std::fs::write(&input_path, &input).unwrap();

        let config = TranscodeConfig::default();
        transcode_file(ArchiveFormat::Zip, &input_path, &output_path, &config).unwrap();

        let mut streamed = Vec::new();
        transcode_path(ArchiveFormat::Zip, &input_path, &mut streamed, &config).unwrap();

        assert_eq!(std::fs::read(&output_path).unwrap(), streamed);
    }

    #[test]
    fn test_transcode_file_tar() {
        let temp = TempDir::new().unwrap();
        let input_path = temp.path().join("in.tar");
        let output_path = temp.path().join("out.tar");
        std::fs::write(
            &input_path,
            TarTestBuilder::new()
                .add_file_with_mtime("a", b"1", 1_234_567_890)
                .build(),
        )
        .unwrap();

        let report = transcode_file(
            ArchiveFormat::Tar,
            &input_path,
            &output_path,
            &TranscodeConfig::default(),
        )
        .unwrap();
        assert_eq!(report.entries, 1);
        assert_eq!(std::fs::metadata(&output_path).unwrap().len(), 512 * 4);
    }

    #[test]
    fn test_missing_input_is_io_error() {
        let temp = TempDir::new().unwrap();
        let err = transcode_path(
            ArchiveFormat::Tar,
            temp.path().join("missing.tar"),
            Vec::new(),
            &TranscodeConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, TranscodeError::Io(_)));
    }
}
