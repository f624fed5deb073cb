//! Test utilities for building in-memory input archives.
//!
//! The builders here produce archives the way ordinary tools do, including
//! real timestamps, so tests can check that transcoding removes them.
//!
//! # Panics
//!
//! All functions in this module may panic on I/O errors since they are
//! designed for test use only where panics are acceptable.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::io::Cursor;
use std::io::Write;

use zip::DateTime;
use zip::write::FullFileOptions;
use zip::write::SimpleFileOptions;

use crate::formats::gnu_writer::encode_pax_record;

/// Modification time given to entries that do not set one explicitly.
pub const DEFAULT_TEST_MTIME: u64 = 1_700_000_000;

/// Builder for tar test archives with various entry types and timestamps.
///
/// # Examples
///
/// ```
/// use tszero_core::test_utils::TarTestBuilder;
///
/// let tar_data = TarTestBuilder::new()
///     .add_file("file.txt", b"content")
///     .add_directory("dir/")
///     .add_symlink("link", "file.txt")
///     .build();
/// ```
pub struct TarTestBuilder {
    builder: tar::Builder<Vec<u8>>,
}

impl TarTestBuilder {
    /// Creates a new tar test builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            builder: tar::Builder::new(Vec::new()),
        }
    }

    /// Appends an entry with a caller-prepared header.
    ///
    /// The header size is set from `data`.
    #[must_use]
    pub fn add_entry(mut self, mut header: tar::Header, path: &str, data: &[u8]) -> Self {
        header.set_size(data.len() as u64);
        self.builder.append_data(&mut header, path, data).unwrap();
        self
    }

    /// Adds a regular file with the default test mtime.
    #[must_use]
    pub fn add_file(self, path: &str, data: &[u8]) -> Self {
        self.add_file_with_mtime(path, data, DEFAULT_TEST_MTIME)
    }

    /// Adds a regular file with the given mtime.
    #[must_use]
    pub fn add_file_with_mtime(self, path: &str, data: &[u8], mtime: u64) -> Self {
        let header = gnu_header(tar::EntryType::Regular, 0o644, mtime);
        self.add_entry(header, path, data)
    }

    /// Adds a regular file whose GNU header also carries access and change
    /// times.
    #[must_use]
    pub fn add_file_with_times(
        self,
        path: &str,
        data: &[u8],
        mtime: u64,
        atime: u64,
        ctime: u64,
    ) -> Self {
        let mut header = gnu_header(tar::EntryType::Regular, 0o644, mtime);
        let gnu = header.as_gnu_mut().unwrap();
        gnu.set_atime(atime);
        gnu.set_ctime(ctime);
        self.add_entry(header, path, data)
    }

    /// Adds a regular file in a ustar header with owner names.
    #[must_use]
    pub fn add_ustar_file(self, path: &str, data: &[u8], uname: &str, gname: &str) -> Self {
        let mut header = tar::Header::new_ustar();
        header.set_entry_type(tar::EntryType::Regular);
        header.set_mode(0o640);
        header.set_uid(1000);
        header.set_gid(100);
        header.set_mtime(DEFAULT_TEST_MTIME);
        header.set_username(uname).unwrap();
        header.set_groupname(gname).unwrap();
        self.add_entry(header, path, data)
    }

    /// Adds a regular file preceded by a PAX extended header holding
    /// `records`.
    #[must_use]
    pub fn add_file_with_pax(mut self, path: &str, data: &[u8], records: &[(&str, &[u8])]) -> Self {
        let mut pax_data = Vec::new();
        for (key, value) in records {
            encode_pax_record(&mut pax_data, key, value);
        }
        let pax_header = gnu_header(tar::EntryType::XHeader, 0o644, DEFAULT_TEST_MTIME);
        self = self.add_entry(pax_header, &format!("PaxHeaders/{path}"), &pax_data);
        self.add_file(path, data)
    }

    /// Adds a global PAX header named `pax_global_header`, the way
    /// `git archive` writes one ahead of the tree.
    #[must_use]
    pub fn add_global_pax(self, records: &[(&str, &[u8])], mtime: u64) -> Self {
        let mut pax_data = Vec::new();
        for (key, value) in records {
            encode_pax_record(&mut pax_data, key, value);
        }
        let mut header = tar::Header::new_ustar();
        header.set_entry_type(tar::EntryType::XGlobalHeader);
        header.set_mode(0o666);
        header.set_mtime(mtime);
        self.add_entry(header, "pax_global_header", &pax_data)
    }

    /// Adds a directory.
    #[must_use]
    pub fn add_directory(self, path: &str) -> Self {
        self.add_directory_with_data(path, &[])
    }

    /// Adds a directory whose header declares `data` as content.
    ///
    /// Well-behaved tools never write this; it exercises the rule that
    /// header-only kinds are written without content.
    #[must_use]
    pub fn add_directory_with_data(self, path: &str, data: &[u8]) -> Self {
        let header = gnu_header(tar::EntryType::Directory, 0o755, DEFAULT_TEST_MTIME);
        self.add_entry(header, path, data)
    }

    /// Adds a symlink.
    #[must_use]
    pub fn add_symlink(self, path: &str, target: &str) -> Self {
        self.add_link(tar::EntryType::Symlink, path, target)
    }

    /// Adds a hardlink.
    #[must_use]
    pub fn add_hardlink(self, path: &str, target: &str) -> Self {
        self.add_link(tar::EntryType::Link, path, target)
    }

    /// Adds a character or block device node.
    #[must_use]
    pub fn add_device(self, path: &str, kind: tar::EntryType, major: u32, minor: u32) -> Self {
        let mut header = gnu_header(kind, 0o600, DEFAULT_TEST_MTIME);
        header.set_device_major(major).unwrap();
        header.set_device_minor(minor).unwrap();
        self.add_entry(header, path, &[])
    }

    /// Adds a named pipe.
    #[must_use]
    pub fn add_fifo(self, path: &str) -> Self {
        let header = gnu_header(tar::EntryType::Fifo, 0o644, DEFAULT_TEST_MTIME);
        self.add_entry(header, path, &[])
    }

    /// Builds and returns the tar archive data.
    #[must_use]
    pub fn build(self) -> Vec<u8> {
        self.builder.into_inner().unwrap()
    }

    fn add_link(mut self, kind: tar::EntryType, path: &str, target: &str) -> Self {
        let mut header = gnu_header(kind, 0o777, DEFAULT_TEST_MTIME);
        header.set_size(0);
        self.builder.append_link(&mut header, path, target).unwrap();
        self
    }
}

impl Default for TarTestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn gnu_header(kind: tar::EntryType, mode: u32, mtime: u64) -> tar::Header {
    let mut header = tar::Header::new_gnu();
    header.set_entry_type(kind);
    header.set_mode(mode);
    header.set_uid(0);
    header.set_gid(0);
    header.set_mtime(mtime);
    header
}

/// Builder for zip test archives.
///
/// Entries carry a non-sentinel modification time unless set otherwise.
///
/// # Examples
///
/// ```
/// use tszero_core::test_utils::ZipTestBuilder;
///
/// let zip_data = ZipTestBuilder::new()
///     .add_file("file.txt", b"content")
///     .add_directory("dir/")
///     .build();
/// ```
pub struct ZipTestBuilder {
    zip: zip::ZipWriter<Cursor<Vec<u8>>>,
    modified: DateTime,
}

impl ZipTestBuilder {
    /// Creates a new zip test builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            zip: zip::ZipWriter::new(Cursor::new(Vec::new())),
            modified: DateTime::from_date_and_time(2023, 11, 14, 22, 13, 20).unwrap(),
        }
    }

    /// Sets the modification time of entries added afterwards.
    #[must_use]
    pub fn modified(mut self, year: u16, month: u8, day: u8, hour: u8, minute: u8) -> Self {
        self.modified = DateTime::from_date_and_time(year, month, day, hour, minute, 0).unwrap();
        self
    }

    /// Adds a stored regular file.
    #[must_use]
    pub fn add_file(self, path: &str, data: &[u8]) -> Self {
        self.add_file_with(path, data, zip::CompressionMethod::Stored, 0o644)
    }

    /// Adds a regular file with the given compression method and mode.
    #[must_use]
    pub fn add_file_with(
        mut self,
        path: &str,
        data: &[u8],
        compression: zip::CompressionMethod,
        mode: u32,
    ) -> Self {
        let options = self.options().compression_method(compression).unix_permissions(mode);
        self.zip.start_file(path, options).unwrap();
        self.zip.write_all(data).unwrap();
        self
    }

    /// Adds a stored file whose headers carry one extra field.
    #[must_use]
    pub fn add_file_with_extra(mut self, path: &str, data: &[u8], id: u16, payload: &[u8]) -> Self {
        let mut options = FullFileOptions::default()
            .last_modified_time(self.modified)
            .compression_method(zip::CompressionMethod::Stored);
        options.add_extra_data(id, payload, false).unwrap();
        self.zip.start_file(path, options).unwrap();
        self.zip.write_all(data).unwrap();
        self
    }

    /// Adds a directory.
    #[must_use]
    pub fn add_directory(mut self, path: &str) -> Self {
        let options = self.options().unix_permissions(0o755);
        self.zip.add_directory(path, options).unwrap();
        self
    }

    /// Adds a symlink.
    #[must_use]
    pub fn add_symlink(mut self, path: &str, target: &str) -> Self {
        let options = self.options();
        self.zip.add_symlink(path, target, options).unwrap();
        self
    }

    /// Sets the archive comment.
    #[must_use]
    pub fn comment(mut self, comment: &str) -> Self {
        self.zip.set_comment(comment);
        self
    }

    /// Builds and returns the zip archive data.
    #[must_use]
    pub fn build(self) -> Vec<u8> {
        self.zip.finish().unwrap().into_inner()
    }

    fn options(&self) -> SimpleFileOptions {
        SimpleFileOptions::default().last_modified_time(self.modified)
    }
}

impl Default for ZipTestBuilder {
    fn default() -> Self {
        Self::new()
    }
}
