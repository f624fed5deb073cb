//! Header normalization.
//!
//! Every timestamp field of an entry header is replaced by a fixed sentinel
//! and every other field is carried over unchanged. The functions here are
//! pure: they build in-memory header values and perform no I/O.
//!
//! - Tar: modification, access and change times are all zero. Output
//!   headers are always GNU headers, whatever the input variant was.
//! - Zip: the on-disk format cannot express "no time", so entries carry the
//!   Unix epoch (1970-01-01T00:00:00 UTC) in an extended-timestamp extra
//!   field. The MS-DOS date/time field cannot reach 1970 and is pinned to
//!   its lowest value, 1980-01-01T00:00:00.

use std::io::{self};

use zip::CompressionMethod;
use zip::DateTime;
use zip::result::ZipResult;
use zip::write::FullFileOptions;

use crate::types::EntryKind;

/// Sentinel written to every tar time field.
pub const TAR_SENTINEL_TIME: u64 = 0;

/// Sentinel written to the zip extended-timestamp field (Unix seconds).
pub const ZIP_SENTINEL_UNIX_TIME: u32 = 0;

/// Header ID of the zip extended-timestamp extra field ("UT").
pub const EXTENDED_TIMESTAMP_ID: u16 = 0x5455;

/// Zip extra field IDs never forwarded to the output.
///
/// Time-bearing fields (NTFS, extended timestamp, Info-ZIP Unix type 1) plus
/// the ZIP64 and AES fields the writer manages itself.
pub const DROPPED_ZIP_EXTRA_IDS: [u16; 5] =
    [0x000a, EXTENDED_TIMESTAMP_ID, 0x5855, 0x0001, 0x9901];

/// PAX record keys holding timestamps.
///
/// `LIBARCHIVE.creationtime` is written by bsdtar.
pub const PAX_TIME_KEYS: [&str; 4] = ["mtime", "atime", "ctime", "LIBARCHIVE.creationtime"];

/// PAX record keys re-encoded natively by the GNU writer.
const PAX_NATIVE_KEYS: [&str; 3] = ["path", "linkpath", "size"];

/// Builds the normalized GNU header for a tar entry.
///
/// Entry type, mode, ownership, user/group names and device numbers are
/// copied byte-for-byte from `src` (device fields of old-style headers
/// become zero). All time fields are zero. The size is `size` for
/// content-bearing kinds and zero for header-only kinds, whose content is
/// never written. Path and link name are left empty; the writer fills them
/// in so long values can be spilled into GNU long-name records.
///
/// GNU sparse entries become regular files holding the expanded content.
///
/// # Examples
///
/// ```
/// use tszero_core::normalize::normalize_tar_header;
///
/// let mut src = tar::Header::new_ustar();
/// src.set_mtime(1_700_000_000);
/// src.set_mode(0o644);
///
/// let out = normalize_tar_header(&src, 0);
/// assert_eq!(out.mtime()?, 0);
/// assert_eq!(out.mode()?, 0o644);
/// assert!(out.as_gnu().is_some());
/// # Ok::<(), std::io::Error>(())
/// ```
#[must_use]
pub fn normalize_tar_header(src: &tar::Header, size: u64) -> tar::Header {
    let entry_type = src.entry_type();
    let kind = EntryKind::from_tar(entry_type);

    let mut header = tar::Header::new_gnu();
    header.set_entry_type(if entry_type.is_gnu_sparse() {
        tar::EntryType::Regular
    } else {
        entry_type
    });
    header.set_size(if kind.carries_content() { size } else { 0 });
    header.set_mtime(TAR_SENTINEL_TIME);

    // Numeric fields are copied raw: archivers leave some of them empty,
    // and an empty field does not decode as a number.
    let old = src.as_old();
    let (dev_major, dev_minor) = match (src.as_ustar(), src.as_gnu()) {
        (Some(ustar), _) => (ustar.dev_major, ustar.dev_minor),
        (None, Some(gnu)) => (gnu.dev_major, gnu.dev_minor),
        (None, None) => ([0; 8], [0; 8]),
    };

    // new_gnu leaves atime and ctime as all-zero fields.
    if let Some(gnu) = header.as_gnu_mut() {
        gnu.mode = old.mode;
        gnu.uid = old.uid;
        gnu.gid = old.gid;
        copy_field(&mut gnu.uname, src.username_bytes().unwrap_or_default());
        copy_field(&mut gnu.gname, src.groupname_bytes().unwrap_or_default());
        gnu.dev_major = dev_major;
        gnu.dev_minor = dev_minor;
    }

    header
}

/// Filters PAX records down to the ones forwarded to the output.
///
/// Time records are dropped, as are the records the GNU header already
/// expresses (path, link path, size). Everything else (extended attributes,
/// large ids, comments, vendor keys) passes through in input order.
///
/// # Examples
///
/// ```
/// use tszero_core::normalize::strip_pax_records;
///
/// let records = vec![
///     ("mtime", &b"1700000000.5"[..]),
///     ("SCHILY.xattr.user.tag", &b"v"[..]),
///     ("path", &b"long/name"[..]),
/// ];
/// let kept = strip_pax_records(records);
/// assert_eq!(kept, vec![("SCHILY.xattr.user.tag".to_string(), b"v".to_vec())]);
/// ```
pub fn strip_pax_records<'a, I>(records: I) -> Vec<(String, Vec<u8>)>
where
    I: IntoIterator<Item = (&'a str, &'a [u8])>,
{
    records
        .into_iter()
        .filter(|(key, _)| !PAX_TIME_KEYS.contains(key) && !PAX_NATIVE_KEYS.contains(key))
        .map(|(key, value)| (key.to_string(), value.to_vec()))
        .collect()
}

/// Filters the records of a global PAX header (`g` entry).
///
/// Only time records are dropped; global headers carry no per-entry path or
/// size, so every other key passes through in input order.
pub fn strip_global_pax_records<'a, I>(records: I) -> Vec<(String, Vec<u8>)>
where
    I: IntoIterator<Item = (&'a str, &'a [u8])>,
{
    records
        .into_iter()
        .filter(|(key, _)| !PAX_TIME_KEYS.contains(key))
        .map(|(key, value)| (key.to_string(), value.to_vec()))
        .collect()
}

/// Splits a PAX extended header block into `(key, value)` records.
///
/// Each record has the form `"<len> <key>=<value>\n"`, where `<len>` counts
/// the whole record.
///
/// # Errors
///
/// Returns `InvalidData` if a record is malformed or its key is not UTF-8.
///
/// # Examples
///
/// ```
/// use tszero_core::normalize::parse_pax_records;
///
/// let records = parse_pax_records(b"17 mtime=1700000\n13 comment=a\n")?;
/// assert_eq!(records, vec![("mtime", &b"1700000"[..]), ("comment", &b"a"[..])]);
/// # Ok::<(), std::io::Error>(())
/// ```
pub fn parse_pax_records(mut data: &[u8]) -> io::Result<Vec<(&str, &[u8])>> {
    let invalid = |msg: &str| io::Error::new(io::ErrorKind::InvalidData, msg.to_string());

    let mut records = Vec::new();
    // Trailing NUL padding is tolerated.
    while data.first().is_some_and(|&b| b != 0) {
        let space = data
            .iter()
            .position(|&b| b == b' ')
            .ok_or_else(|| invalid("PAX record without length"))?;
        let len = std::str::from_utf8(&data[..space])
            .ok()
            .and_then(|digits| digits.parse::<usize>().ok())
            .filter(|&len| len > space + 1 && len <= data.len())
            .ok_or_else(|| invalid("invalid PAX record length"))?;

        let (record, rest) = data.split_at(len);
        let body = record[space + 1..]
            .strip_suffix(b"\n")
            .ok_or_else(|| invalid("PAX record not newline-terminated"))?;
        let eq = body
            .iter()
            .position(|&b| b == b'=')
            .ok_or_else(|| invalid("PAX record without '='"))?;
        let key = std::str::from_utf8(&body[..eq]).map_err(|_| invalid("PAX key is not UTF-8"))?;
        records.push((key, &body[eq + 1..]));
        data = rest;
    }
    Ok(records)
}

/// Splits a zip extra-data block into fields, keeping the ones forwarded to
/// the output.
///
/// Fields listed in [`DROPPED_ZIP_EXTRA_IDS`] are removed. Everything else
/// (Unix uid/gid, Unicode path and comment, vendor fields) is kept in input
/// order. A truncated trailing field is discarded.
///
/// # Examples
///
/// ```
/// use tszero_core::normalize::forwarded_zip_extra_fields;
///
/// let extra = [
///     0x55, 0x54, 5, 0, 1, 0x10, 0x20, 0x30, 0x40, // UT, dropped
///     0x75, 0x78, 3, 0, 1, 0, 0,                   // ux, kept
/// ];
/// let kept = forwarded_zip_extra_fields(&extra);
/// assert_eq!(kept.len(), 1);
/// assert_eq!(kept[0].0, 0x7875);
/// assert_eq!(&*kept[0].1, &[1, 0, 0]);
/// ```
#[must_use]
pub fn forwarded_zip_extra_fields(mut extra: &[u8]) -> Vec<(u16, Box<[u8]>)> {
    let mut fields = Vec::new();
    while extra.len() >= 4 {
        let id = u16::from_le_bytes([extra[0], extra[1]]);
        let len = usize::from(u16::from_le_bytes([extra[2], extra[3]]));
        let Some(payload) = extra.get(4..4 + len) else {
            break;
        };
        if !DROPPED_ZIP_EXTRA_IDS.contains(&id) {
            fields.push((id, payload.into()));
        }
        extra = &extra[4 + len..];
    }
    fields
}

/// Returns the MS-DOS date/time written to every zip entry.
#[must_use]
pub fn zip_sentinel_datetime() -> DateTime {
    DateTime::default()
}

/// Returns the extended-timestamp payload carrying the epoch sentinel.
///
/// Layout: one flags byte (bit 0: modification time present) followed by
/// the modification time as little-endian Unix seconds.
#[must_use]
pub fn extended_timestamp_payload() -> Box<[u8]> {
    let mut payload = Vec::with_capacity(5);
    payload.push(0x01);
    payload.extend_from_slice(&ZIP_SENTINEL_UNIX_TIME.to_le_bytes());
    payload.into_boxed_slice()
}

/// Builds normalized write options for a zip entry.
///
/// The compression method and unix permissions of the source entry are
/// kept. The epoch extended timestamp comes first, followed by
/// `extra_fields` (already filtered by [`forwarded_zip_extra_fields`]).
///
/// # Errors
///
/// Returns an error if the zip writer rejects an extra field.
pub fn normalize_zip_options(
    compression: CompressionMethod,
    unix_mode: Option<u32>,
    uncompressed_size: u64,
    extra_fields: &[(u16, Box<[u8]>)],
) -> ZipResult<FullFileOptions<'static>> {
    let mut options = FullFileOptions::default()
        .compression_method(compression)
        .last_modified_time(zip_sentinel_datetime())
        .large_file(uncompressed_size >= u64::from(u32::MAX));

    if let Some(mode) = unix_mode {
        options = options.unix_permissions(mode & 0o7777);
    }

    options.add_extra_data(EXTENDED_TIMESTAMP_ID, extended_timestamp_payload(), false)?;
    for (id, payload) in extra_fields {
        options.add_extra_data(*id, payload.clone(), false)?;
    }
    Ok(options)
}

/// Copies `src` into a fixed-width, NUL-padded header field.
fn copy_field(dst: &mut [u8], src: &[u8]) {
    let len = src.len().min(dst.len());
    dst[..len].copy_from_slice(&src[..len]);
    dst[len..].fill(0);
}
