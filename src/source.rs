use std::fmt;
use std::fs;
use std::io;

use csvzero_core::{ReadStatus, Source};

/// The byte source behind an [`Iter`](crate::Iter).
///
/// This is a closed set: the tokenizer and scan buffer are written once
/// against `fill`, whichever variant is in use.
pub(crate) enum Input<'a> {
    /// A file opened by the iterator. Closed when the iterator is dropped.
    File(fs::File),
    /// A reader owned by someone else.
    Reader(&'a mut dyn io::Read),
    /// The whole input is already in the scan buffer.
    Bytes,
    /// A caller supplied pull function.
    Custom(Box<dyn Source + 'a>),
}

impl<'a> Input<'a> {
    /// Returns true when the scan buffer is the caller's data itself, and
    /// therefore must never be compacted.
    pub(crate) fn is_resident(&self) -> bool {
        match *self {
            Input::Bytes => true,
            _ => false,
        }
    }

    /// Pull bytes into `buf`, which is never empty, returning how many were
    /// written and whether the source is now exhausted.
    pub(crate) fn fill(
        &mut self,
        buf: &mut [u8],
    ) -> io::Result<(usize, bool)> {
        match *self {
            Input::File(ref mut f) => read_io(f, buf),
            Input::Reader(ref mut rdr) => read_io(&mut **rdr, buf),
            Input::Bytes => Ok((0, true)),
            Input::Custom(ref mut src) => {
                let res = src.pull(buf).sanitize(buf.len());
                match res.status {
                    ReadStatus::Ok => Ok((res.bytes_read, false)),
                    ReadStatus::Eof => Ok((res.bytes_read, true)),
                    ReadStatus::Error => Err(io::Error::new(
                        io::ErrorKind::Other,
                        "custom byte source reported a read error",
                    )),
                }
            }
        }
    }
}

fn read_io<R: io::Read + ?Sized>(
    rdr: &mut R,
    buf: &mut [u8],
) -> io::Result<(usize, bool)> {
    loop {
        match rdr.read(buf) {
            Ok(n) => return Ok((n, n == 0)),
            Err(ref err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err),
        }
    }
}

impl<'a> fmt::Debug for Input<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Input::File(ref file) => {
                f.debug_tuple("File").field(file).finish()
            }
            Input::Reader(_) => write!(f, "Reader(..)"),
            Input::Bytes => write!(f, "Bytes"),
            Input::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}
