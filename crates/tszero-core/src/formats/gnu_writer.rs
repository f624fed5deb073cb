//! Forward-only GNU tar container writer.
//!
//! Headers are encoded with [`tar::Header`]; framing (long-name records,
//! PAX records, block padding, the end-of-archive trailer) is written here
//! so entry content can stream through the shared copy buffer.

use std::io::Read;
use std::io::Write;
use std::io::{self};

use crate::copy::CopyBuffer;
use crate::copy::copy_with_buffer;
use crate::io::CountingWriter;

/// Size of a tar block in bytes.
pub const BLOCK_SIZE: u64 = 512;

/// Name used by GNU tar for long-name, long-link and PAX records.
const LONG_LINK_NAME: &[u8] = b"././@LongLink";
const PAX_HEADER_NAME: &[u8] = b"././@PaxHeader";

/// Capacity of the GNU `name` and `linkname` fields.
const NAME_FIELD_LEN: usize = 100;

static ZERO_BLOCK: [u8; BLOCK_SIZE as usize] = [0; BLOCK_SIZE as usize];

/// Writes a GNU tar container to a forward-only stream.
///
/// Each entry is written as: optional PAX record, optional long-name and
/// long-link records, the entry header, then content followed by padding
/// to the next block boundary. [`GnuTarWriter::finish`] writes the two
/// zero blocks that end the archive.
///
/// # Examples
///
/// ```
/// use tszero_core::copy::CopyBuffer;
/// use tszero_core::formats::gnu_writer::GnuTarWriter;
///
/// let mut writer = GnuTarWriter::new(Vec::new());
/// let mut header = tar::Header::new_gnu();
/// header.set_size(5);
/// header.set_mode(0o644);
///
/// writer.write_header(header, b"hello.txt", None, &[])?;
/// let copied = writer.write_content(&mut &b"hello"[..], &mut CopyBuffer::new())?;
/// writer.end_content(copied)?;
///
/// let (bytes, total) = writer.finish()?;
/// assert_eq!(total, 512 * 4);
/// assert_eq!(bytes.len(), 512 * 4);
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct GnuTarWriter<W: Write> {
    inner: CountingWriter<W>,
}

impl<W: Write> GnuTarWriter<W> {
    /// Creates a writer emitting to `inner`.
    #[must_use]
    pub fn new(inner: W) -> Self {
        Self {
            inner: CountingWriter::new(inner),
        }
    }

    /// Writes the header of one entry together with its extension records.
    ///
    /// `pax_records` are emitted as a PAX extended header when non-empty.
    /// Paths and link names longer than the GNU fields are emitted as GNU
    /// long-name / long-link records and truncated in the main header.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the underlying stream fails.
    pub fn write_header(
        &mut self,
        mut header: tar::Header,
        path: &[u8],
        link_name: Option<&[u8]>,
        pax_records: &[(String, Vec<u8>)],
    ) -> io::Result<()> {
        if !pax_records.is_empty() {
            self.write_pax_records(pax_records)?;
        }
        if path.len() > NAME_FIELD_LEN {
            self.write_long_record(tar::EntryType::GNULongName, path)?;
        }
        if let Some(link) = link_name
            && link.len() > NAME_FIELD_LEN
        {
            self.write_long_record(tar::EntryType::GNULongLink, link)?;
        }

        if let Some(gnu) = header.as_gnu_mut() {
            fill_name_field(&mut gnu.name, path);
            fill_name_field(&mut gnu.linkname, link_name.unwrap_or_default());
        }
        header.set_cksum();
        self.inner.write_all(header.as_bytes())
    }

    /// Streams entry content into the archive through `buffer`.
    ///
    /// Returns the number of bytes copied. No padding is written; call
    /// [`GnuTarWriter::end_content`] once the content is complete.
    ///
    /// # Errors
    ///
    /// Returns an error if reading `reader` or writing the stream fails.
    pub fn write_content<R: Read + ?Sized>(
        &mut self,
        reader: &mut R,
        buffer: &mut CopyBuffer,
    ) -> io::Result<u64> {
        copy_with_buffer(reader, &mut self.inner, buffer)
    }

    /// Pads `content_len` bytes of content to the next block boundary.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the underlying stream fails.
    pub fn end_content(&mut self, content_len: u64) -> io::Result<()> {
        let remainder = content_len % BLOCK_SIZE;
        if remainder != 0 {
            let padding = (BLOCK_SIZE - remainder) as usize;
            self.inner.write_all(&ZERO_BLOCK[..padding])?;
        }
        Ok(())
    }

    /// Writes a global PAX header (`g` entry) named `path` holding
    /// `records`, including its content and padding.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the underlying stream fails.
    pub fn write_global_header(
        &mut self,
        path: &[u8],
        records: &[(String, Vec<u8>)],
    ) -> io::Result<u64> {
        if path.len() > NAME_FIELD_LEN {
            self.write_long_record(tar::EntryType::GNULongName, path)?;
        }
        let data = encode_pax_records(records);
        let mut header = extension_header(tar::EntryType::XGlobalHeader, data.len() as u64);
        if let Some(gnu) = header.as_gnu_mut() {
            fill_name_field(&mut gnu.name, path);
        }
        header.set_cksum();
        self.inner.write_all(header.as_bytes())?;
        self.inner.write_all(&data)?;
        self.end_content(data.len() as u64)?;
        Ok(data.len() as u64)
    }

    /// Writes the end-of-archive trailer, flushes, and returns the inner
    /// writer together with the total container size.
    ///
    /// # Errors
    ///
    /// Returns an error if writing or flushing fails.
    pub fn finish(mut self) -> io::Result<(W, u64)> {
        self.inner.write_all(&ZERO_BLOCK)?;
        self.inner.write_all(&ZERO_BLOCK)?;
        self.inner.flush()?;
        let total = self.inner.total_bytes();
        Ok((self.inner.into_inner(), total))
    }

    fn write_long_record(&mut self, kind: tar::EntryType, value: &[u8]) -> io::Result<()> {
        let mut header = extension_header(kind, value.len() as u64 + 1);
        if let Some(gnu) = header.as_gnu_mut() {
            fill_name_field(&mut gnu.name, LONG_LINK_NAME);
        }
        header.set_cksum();
        self.inner.write_all(header.as_bytes())?;
        self.inner.write_all(value)?;
        self.inner.write_all(&[0])?;
        self.end_content(value.len() as u64 + 1)
    }

    fn write_pax_records(&mut self, records: &[(String, Vec<u8>)]) -> io::Result<()> {
        let data = encode_pax_records(records);
        let mut header = extension_header(tar::EntryType::XHeader, data.len() as u64);
        if let Some(gnu) = header.as_gnu_mut() {
            fill_name_field(&mut gnu.name, PAX_HEADER_NAME);
        }
        header.set_cksum();
        self.inner.write_all(header.as_bytes())?;
        self.inner.write_all(&data)?;
        self.end_content(data.len() as u64)
    }
}

/// Header for a GNU or PAX extension record. Carries no timestamps.
fn extension_header(kind: tar::EntryType, size: u64) -> tar::Header {
    let mut header = tar::Header::new_gnu();
    header.set_entry_type(kind);
    header.set_mode(0o644);
    header.set_uid(0);
    header.set_gid(0);
    header.set_mtime(0);
    header.set_size(size);
    header
}

fn encode_pax_records(records: &[(String, Vec<u8>)]) -> Vec<u8> {
    let mut data = Vec::new();
    for (key, value) in records {
        encode_pax_record(&mut data, key, value);
    }
    data
}

/// Appends one `"<len> <key>=<value>\n"` record, where `<len>` counts the
/// whole record including its own digits.
pub(crate) fn encode_pax_record(dst: &mut Vec<u8>, key: &str, value: &[u8]) {
    let rest_len = 3 + key.len() + value.len();
    let mut len_len = 1;
    let mut max_len = 10;
    while rest_len + len_len >= max_len {
        len_len += 1;
        max_len *= 10;
    }
    let len = rest_len + len_len;

    dst.extend_from_slice(len.to_string().as_bytes());
    dst.push(b' ');
    dst.extend_from_slice(key.as_bytes());
    dst.push(b'=');
    dst.extend_from_slice(value);
    dst.push(b'\n');
}

/// Writes as much of `value` as fits and NUL-fills the rest.
fn fill_name_field(field: &mut [u8], value: &[u8]) {
    let len = value.len().min(field.len());
    field[..len].copy_from_slice(&value[..len]);
    field[len..].fill(0);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn regular_header(size: u64) -> tar::Header {
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Regular);
        header.set_size(size);
        header.set_mode(0o644);
        header.set_uid(0);
        header.set_gid(0);
        header
    }

    fn write_file(writer: &mut GnuTarWriter<Vec<u8>>, path: &[u8], data: &[u8]) {
        writer
            .write_header(regular_header(data.len() as u64), path, None, &[])
            .unwrap();
        let copied = writer
            .write_content(&mut Cursor::new(data), &mut CopyBuffer::with_size(16))
            .unwrap();
        writer.end_content(copied).unwrap();
    }

    #[test]
    fn test_empty_archive_is_trailer_only() {
        let writer = GnuTarWriter::new(Vec::new());
        let (bytes, total) = writer.finish().unwrap();
        assert_eq!(total, 1024);
        assert_eq!(bytes, vec![0u8; 1024]);
    }

    #[test]
    fn test_written_archive_is_readable() {
        let mut writer = GnuTarWriter::new(Vec::new());
        write_file(&mut writer, b"a.txt", b"alpha");
        write_file(&mut writer, b"dir/b.bin", &[7u8; 700]);
        let (bytes, _) = writer.finish().unwrap();

        let mut archive = tar::Archive::new(Cursor::new(bytes));
        let mut names = Vec::new();
        for entry in archive.entries().unwrap() {
            let mut entry = entry.unwrap();
            let mut content = Vec::new();
            entry.read_to_end(&mut content).unwrap();
            names.push((entry.path().unwrap().display().to_string(), content.len()));
        }
        assert_eq!(
            names,
            vec![("a.txt".to_string(), 5), ("dir/b.bin".to_string(), 700)]
        );
    }

    #[test]
    fn test_content_is_block_aligned() {
        let mut writer = GnuTarWriter::new(Vec::new());
        write_file(&mut writer, b"one", b"x");
        write_file(&mut writer, b"two", &[1u8; 512]);
        let (bytes, total) = writer.finish().unwrap();
        assert_eq!(total, 1024 + 1024 + 1024);
        assert_eq!(bytes[1024 + 156], b'0');
    }

    #[test]
    fn test_global_header_is_readable() {
        let records = vec![("comment".to_string(), b"9f2c".to_vec())];
        let mut writer = GnuTarWriter::new(Vec::new());
        let written = writer
            .write_global_header(b"pax_global_header", &records)
            .unwrap();
        write_file(&mut writer, b"a.txt", b"alpha");
        let (bytes, _) = writer.finish().unwrap();

        assert_eq!(written, 16);
        assert_eq!(bytes[156], b'g');
        assert_eq!(&bytes[512..512 + 16], b"16 comment=9f2c\n");

        let mut archive = tar::Archive::new(Cursor::new(bytes));
        let names: Vec<String> = archive
            .entries()
            .unwrap()
            .map(|e| String::from_utf8_lossy(&e.unwrap().path_bytes()).into_owned())
            .collect();
        assert_eq!(names, vec!["pax_global_header", "a.txt"]);
    }

    #[test]
    fn test_long_path_uses_gnu_long_name() {
        let long_path = format!("{}/file.txt", "d".repeat(150));
        let mut writer = GnuTarWriter::new(Vec::new());
        write_file(&mut writer, long_path.as_bytes(), b"data");
        let (bytes, _) = writer.finish().unwrap();

        assert_eq!(&bytes[..LONG_LINK_NAME.len()], LONG_LINK_NAME);
        assert_eq!(bytes[156], b'L');

        let mut archive = tar::Archive::new(Cursor::new(bytes));
        let entry = archive.entries().unwrap().next().unwrap().unwrap();
        assert_eq!(entry.path_bytes().as_ref(), long_path.as_bytes());
    }

    #[test]
    fn test_exact_field_length_path_needs_no_extension() {
        let path = "p".repeat(NAME_FIELD_LEN);
        let mut writer = GnuTarWriter::new(Vec::new());
        write_file(&mut writer, path.as_bytes(), b"");
        let (bytes, _) = writer.finish().unwrap();
        assert_eq!(bytes.len(), 512 + 1024);

        let mut archive = tar::Archive::new(Cursor::new(bytes));
        let entry = archive.entries().unwrap().next().unwrap().unwrap();
        assert_eq!(entry.path_bytes().as_ref(), path.as_bytes());
    }

    #[test]
    fn test_long_link_target() {
        let target = "t/".repeat(80);
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Symlink);
        header.set_mode(0o777);
        header.set_size(0);

        let mut writer = GnuTarWriter::new(Vec::new());
        writer
            .write_header(header, b"link", Some(target.as_bytes()), &[])
            .unwrap();
        let (bytes, _) = writer.finish().unwrap();

        let mut archive = tar::Archive::new(Cursor::new(bytes));
        let entry = archive.entries().unwrap().next().unwrap().unwrap();
        assert_eq!(
            entry.link_name_bytes().unwrap().as_ref(),
            target.as_bytes()
        );
    }

    #[test]
    fn test_pax_records_are_readable() {
        let records = vec![("SCHILY.xattr.user.k".to_string(), b"value".to_vec())];
        let mut writer = GnuTarWriter::new(Vec::new());
        writer
            .write_header(regular_header(0), b"f", None, &records)
            .unwrap();
        let (bytes, _) = writer.finish().unwrap();

        let mut archive = tar::Archive::new(Cursor::new(bytes));
        let mut entry = archive.entries().unwrap().next().unwrap().unwrap();
        let pax = entry.pax_extensions().unwrap().unwrap();
        let found: Vec<(String, Vec<u8>)> = pax
            .map(|ext| {
                let ext = ext.unwrap();
                (ext.key().unwrap().to_string(), ext.value_bytes().to_vec())
            })
            .collect();
        assert_eq!(found, records);
    }

    #[test]
    fn test_encode_pax_record_length() {
        let mut data = Vec::new();
        encode_pax_record(&mut data, "a", b"b");
        assert_eq!(data, b"6 a=b\n");

        // 3 + 1 + 4 = 8 bytes of payload; a one-digit length makes 9.
        let mut data = Vec::new();
        encode_pax_record(&mut data, "k", b"1234");
        assert_eq!(data, b"9 k=1234\n");

        // Payload of 9 bytes pushes the length to two digits.
        let mut data = Vec::new();
        encode_pax_record(&mut data, "k", b"12345");
        assert_eq!(data, b"11 k=12345\n");
    }
}
