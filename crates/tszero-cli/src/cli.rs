//! CLI argument parsing using clap.

use clap::Parser;
use clap::ValueEnum;
use std::path::Path;
use std::path::PathBuf;
use tszero_core::ArchiveFormat;
use tszero_core::TranscodeConfig;
use tszero_core::config::DEFAULT_BUFFER_SIZE;

#[derive(Parser)]
#[command(name = "tszero")]
#[command(author, version, about, long_about = None)]
#[command(
    after_help = "The normalized archive is written to standard output unless --output is given."
)]
pub struct Cli {
    /// Archive format of the input; the output has the same format
    #[arg(short, long, value_enum)]
    pub format: FormatArg,

    /// Path to the input archive ("-" or absent reads standard input)
    #[arg(value_name = "ARCHIVE")]
    pub archive: Option<PathBuf>,

    /// Write the normalized archive to this file instead of standard output
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Copy buffer size in bytes (accepts K and M suffixes)
    #[arg(
        short,
        long,
        value_name = "BYTES",
        default_value_t = DEFAULT_BUFFER_SIZE,
        value_parser = parse_buffer_size
    )]
    pub buffer_size: usize,

    /// Log each entry as it is processed
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Builds the core configuration from the parsed flags.
    pub const fn config(&self) -> TranscodeConfig {
        TranscodeConfig {
            buffer_size: self.buffer_size,
            verbose: self.verbose,
        }
    }

    /// Input path, or `None` for standard input.
    pub fn input_path(&self) -> Option<&Path> {
        self.archive
            .as_deref()
            .filter(|path| path.as_os_str() != "-")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    /// POSIX/GNU tar; output is GNU tar
    Tar,
    /// PKWARE zip
    Zip,
}

impl From<FormatArg> for ArchiveFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Tar => Self::Tar,
            FormatArg::Zip => Self::Zip,
        }
    }
}

/// Parse buffer size with optional suffix (K, M)
#[allow(clippy::option_if_let_else)]
fn parse_buffer_size(s: &str) -> Result<usize, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty buffer size".to_string());
    }

    let (num_str, multiplier) = if let Some(stripped) = s.strip_suffix('M') {
        (stripped, 1024_usize.pow(2))
    } else if let Some(stripped) = s.strip_suffix('K') {
        (stripped, 1024)
    } else {
        (s, 1)
    };

    let size = num_str
        .parse::<usize>()
        .map_err(|_| format!("invalid buffer size: {s}"))
        .and_then(|n| {
            n.checked_mul(multiplier)
                .ok_or_else(|| format!("buffer size overflow: {s}"))
        })?;

    if size == 0 {
        return Err("buffer size must be greater than zero".to_string());
    }
    Ok(size)
}
