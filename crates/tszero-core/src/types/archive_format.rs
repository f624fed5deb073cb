//! Supported container formats.

use std::fmt;

/// Container format handed to the transcoder by the caller.
///
/// There is no auto-detection: the caller always names the format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveFormat {
    /// Tar archive (uncompressed).
    Tar,
    /// ZIP archive.
    Zip,
}

impl ArchiveFormat {
    /// Returns the lowercase format name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Tar => "tar",
            Self::Zip => "zip",
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(ArchiveFormat::Tar.to_string(), "tar");
        assert_eq!(format!("{}", ArchiveFormat::Zip), "zip");
    }
}
