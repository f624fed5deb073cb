//! Streaming content copier shared by the tar and zip transcoders.
//!
//! Content moves from an entry reader to an entry writer through one
//! reusable, fixed-size buffer. The loop ends on clean exhaustion (a read
//! returning zero bytes); every other read or write failure is returned to
//! the caller, which treats it as fatal.

use std::io::Read;
use std::io::Write;
use std::io::{self};

use crate::config::DEFAULT_BUFFER_SIZE;

/// Reusable buffer for content copying.
///
/// One buffer is allocated per transcode invocation and shared by every
/// entry of the archive.
///
/// # Examples
///
/// ```
/// use tszero_core::copy::{CopyBuffer, copy_with_buffer};
///
/// let mut buffer = CopyBuffer::with_size(4096);
/// let mut input: &[u8] = b"entry content";
/// let mut output = Vec::new();
///
/// let copied = copy_with_buffer(&mut input, &mut output, &mut buffer)?;
/// assert_eq!(copied, 13);
/// # Ok::<(), std::io::Error>(())
/// ```
#[derive(Debug)]
pub struct CopyBuffer {
    buf: Vec<u8>,
}

impl CopyBuffer {
    /// Creates a buffer of the default size (8 KiB).
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_size(DEFAULT_BUFFER_SIZE)
    }

    /// Creates a buffer of `size` bytes.
    ///
    /// A zero size is raised to one byte so the copy loop always makes
    /// progress; configurations are validated before reaching this point.
    #[inline]
    #[must_use]
    pub fn with_size(size: usize) -> Self {
        Self {
            buf: vec![0u8; size.max(1)],
        }
    }

    /// Returns the buffer size in bytes.
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.buf.len()
    }
}

impl Default for CopyBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Copies data from reader to writer using the provided reusable buffer.
///
/// Reads one chunk at a time and writes it in full before reading the next.
/// Bytes returned by the final non-empty read are always written before the
/// loop observes exhaustion. Interrupted reads are retried.
///
/// Returns the total number of bytes copied.
///
/// # Errors
///
/// Returns an error if:
/// - Reading from the source fails
/// - Writing to the destination fails
/// - The running total would overflow `u64`
#[inline]
pub fn copy_with_buffer<R: Read + ?Sized, W: Write + ?Sized>(
    reader: &mut R,
    writer: &mut W,
    buffer: &mut CopyBuffer,
) -> io::Result<u64> {
    let mut total: u64 = 0;

    loop {
        let bytes_read = match reader.read(&mut buffer.buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };

        writer.write_all(&buffer.buf[..bytes_read])?;

        total = total
            .checked_add(bytes_read as u64)
            .ok_or_else(|| io::Error::other("content length overflows u64"))?;
    }

    Ok(total)
}
