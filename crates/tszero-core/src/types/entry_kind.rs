//! Format-agnostic archive entry kinds.

use std::fmt;

/// Kind of an entry in an archive container.
///
/// Only some kinds carry content. Directories, links, devices and FIFOs are
/// header-only: the transcoders never read or write content for them, even
/// when the input declares a non-zero size.
///
/// # Examples
///
/// ```
/// use tszero_core::types::EntryKind;
///
/// assert!(EntryKind::Regular.carries_content());
/// assert!(!EntryKind::Directory.carries_content());
/// assert_eq!(EntryKind::from_tar(tar::EntryType::Symlink), EntryKind::Symlink);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// Regular file.
    Regular,
    /// Directory.
    Directory,
    /// Symbolic link.
    Symlink,
    /// Hard link to an earlier entry.
    Hardlink,
    /// Character device.
    CharDevice,
    /// Block device.
    BlockDevice,
    /// Named pipe.
    Fifo,
    /// Any other tar type flag (contiguous files, global headers, vendor
    /// extensions). Treated as content-bearing.
    Other(u8),
}

impl EntryKind {
    /// Classifies a tar entry type.
    ///
    /// GNU sparse entries are reported as regular files: the reader expands
    /// them, so their content is the reconstructed file.
    #[must_use]
    pub fn from_tar(entry_type: tar::EntryType) -> Self {
        match entry_type.as_byte() {
            b'0' | b'\0' | b'S' => Self::Regular,
            b'1' => Self::Hardlink,
            b'2' => Self::Symlink,
            b'3' => Self::CharDevice,
            b'4' => Self::BlockDevice,
            b'5' => Self::Directory,
            b'6' => Self::Fifo,
            other => Self::Other(other),
        }
    }

    /// Classifies a zip entry from its directory and symlink flags.
    #[must_use]
    pub const fn from_zip(is_dir: bool, is_symlink: bool) -> Self {
        if is_dir {
            Self::Directory
        } else if is_symlink {
            Self::Symlink
        } else {
            Self::Regular
        }
    }

    /// Returns `true` if entries of this kind have a content stream.
    #[must_use]
    pub const fn carries_content(self) -> bool {
        !matches!(
            self,
            Self::Directory
                | Self::Symlink
                | Self::Hardlink
                | Self::CharDevice
                | Self::BlockDevice
                | Self::Fifo
        )
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Regular => f.write_str("file"),
            Self::Directory => f.write_str("directory"),
            Self::Symlink => f.write_str("symlink"),
            Self::Hardlink => f.write_str("hardlink"),
            Self::CharDevice => f.write_str("character device"),
            Self::BlockDevice => f.write_str("block device"),
            Self::Fifo => f.write_str("fifo"),
            Self::Other(flag) => write!(f, "type {:?}", char::from(*flag)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_only_kinds() {
        for kind in [
            EntryKind::Directory,
            EntryKind::Symlink,
            EntryKind::Hardlink,
            EntryKind::CharDevice,
            EntryKind::BlockDevice,
            EntryKind::Fifo,
        ] {
            assert!(!kind.carries_content(), "{kind} must be header-only");
        }
    }

    #[test]
    fn test_content_kinds() {
        assert!(EntryKind::Regular.carries_content());
        assert!(EntryKind::Other(b'7').carries_content());
        assert!(EntryKind::Other(b'g').carries_content());
    }

    #[test]
    fn test_from_tar() {
        assert_eq!(EntryKind::from_tar(tar::EntryType::Regular), EntryKind::Regular);
        assert_eq!(EntryKind::from_tar(tar::EntryType::new(b'\0')), EntryKind::Regular);
        assert_eq!(EntryKind::from_tar(tar::EntryType::GNUSparse), EntryKind::Regular);
        assert_eq!(EntryKind::from_tar(tar::EntryType::Link), EntryKind::Hardlink);
        assert_eq!(EntryKind::from_tar(tar::EntryType::Char), EntryKind::CharDevice);
        assert_eq!(EntryKind::from_tar(tar::EntryType::Block), EntryKind::BlockDevice);
        assert_eq!(EntryKind::from_tar(tar::EntryType::Directory), EntryKind::Directory);
        assert_eq!(EntryKind::from_tar(tar::EntryType::Fifo), EntryKind::Fifo);
        assert_eq!(
            EntryKind::from_tar(tar::EntryType::Continuous),
            EntryKind::Other(b'7')
        );
    }

    #[test]
    fn test_from_zip() {
        assert_eq!(EntryKind::from_zip(true, false), EntryKind::Directory);
        assert_eq!(EntryKind::from_zip(false, true), EntryKind::Symlink);
        assert_eq!(EntryKind::from_zip(false, false), EntryKind::Regular);
    }

    #[test]
    fn test_display() {
        assert_eq!(EntryKind::Fifo.to_string(), "fifo");
        assert_eq!(EntryKind::Other(b'7').to_string(), "type '7'");
    }
}
