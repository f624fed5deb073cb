//! tszero CLI - Command-line utility that zeroes timestamps in tar and zip
//! archives for reproducible builds.

mod cli;
mod error;

use std::fs::File;
use std::io::BufWriter;
use std::io::Write;
use std::io::{self};
use std::panic;
use std::panic::AssertUnwindSafe;

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;
use log::debug;
use log::info;
use log::warn;
use tszero_core::ArchiveFormat;
use tszero_core::TranscodeError;
use tszero_core::TranscodeReport;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    init_logging(cli.verbose);

    // Panics are reported as ordinary errors below.
    panic::set_hook(Box::new(|info| debug!("panic: {info}")));
    let report = panic::catch_unwind(AssertUnwindSafe(|| run(&cli)))
        .map_err(|payload| error::convert_panic(payload.as_ref()))??;

    info!(
        "normalized {} entries ({} with content, {} header-only, {} content bytes) in {:?}",
        report.entries,
        report.content_entries(),
        report.header_only_entries,
        report.content_bytes,
        report.duration
    );
    Ok(())
}

/// Logs go to stderr; stdout may carry the archive.
fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    };

    let mut builder = env_logger::builder();
    builder.format_target(false);
    if std::env::var_os("RUST_LOG").is_none() {
        builder
            .filter_level(LevelFilter::Warn)
            .filter_module("tszero_core", level)
            .filter_module("tszero", level);
    }
    builder.init();
}

fn run(cli: &cli::Cli) -> Result<TranscodeReport> {
    let config = cli.config();
    let format = ArchiveFormat::from(cli.format);
    let input = cli.input_path();
    let source = input.map_or_else(
        || "standard input".to_string(),
        |path| path.display().to_string(),
    );

    let result = match (input, cli.output.as_deref()) {
        (Some(input), Some(output)) => {
            tszero_core::transcode_file(format, input, output, &config)
        }
        (Some(input), None) => with_output(io::stdout().lock(), |out| {
            tszero_core::transcode_path(format, input, out, &config)
        }),
        (None, Some(output)) => File::create(output)
            .map_err(TranscodeError::from)
            .and_then(|file| {
                with_output(file, |out| {
                    tszero_core::transcode(format, io::stdin().lock(), out, &config)
                })
            }),
        (None, None) => with_output(io::stdout().lock(), |out| {
            tszero_core::transcode(format, io::stdin().lock(), out, &config)
        }),
    };

    result.map_err(|err| error::convert_transcode_error(err, &source, format))
}

/// Runs `transcode` against a buffered `output`.
///
/// The transcoders flush on success. After a failure the buffer is flushed
/// once more on a best-effort basis; a flush error is logged and never
/// replaces the first error.
fn with_output<W, F>(output: W, transcode: F) -> tszero_core::Result<TranscodeReport>
where
    W: Write,
    F: FnOnce(&mut BufWriter<W>) -> tszero_core::Result<TranscodeReport>,
{
    let mut output = BufWriter::new(output);
    let result = transcode(&mut output);
    if result.is_err()
        && let Err(flush_err) = output.flush()
    {
        warn!("failed to flush output after error: {flush_err}");
    }
    result
}
