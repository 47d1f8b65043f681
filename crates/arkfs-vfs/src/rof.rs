//! The read seam for entry payloads.

use std::io;

/// A source of entry payload bytes that can only ever be read.
///
/// Implemented by the drivers; the filesystem layer consumes it without
/// caring where the bytes come from.
pub trait ReadOnlyFile {
    /// Read up to `buf.len()` bytes into `buf`, returning the number of
    /// bytes read. Returns 0 once the end of the file has been reached.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Fill `buf` completely, looping over short reads.
    ///
    /// Fails with [`io::ErrorKind::UnexpectedEof`] if the file ends before
    /// the buffer is full.
    fn read_fully(&mut self, buf: &mut [u8]) -> io::Result<()> {
        let mut total = 0;
        while total < buf.len() {
            match self.read(&mut buf[total..])? {
                0 => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "file ended before the buffer was filled",
                    ))
                }
                read => total += read,
            }
        }
        Ok(())
    }
}
