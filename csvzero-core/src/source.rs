/// The status reported by a single pull from a [`Source`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReadStatus {
    /// Bytes were written to the caller's buffer.
    Ok,
    /// The source has no more bytes. Some bytes may still have been written
    /// by the same pull.
    Eof,
    /// The source failed. The tokenizing engine does not retry.
    Error,
}

/// The outcome of one [`Source::pull`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ReadResult {
    /// The number of bytes written to the front of the buffer.
    pub bytes_read: usize,
    /// Whether the source can produce more.
    pub status: ReadStatus,
}

impl ReadResult {
    /// A successful pull of `n` bytes.
    pub fn ok(n: usize) -> ReadResult {
        ReadResult { bytes_read: n, status: ReadStatus::Ok }
    }

    /// End of input, with `n` final bytes written by this pull.
    pub fn eof(n: usize) -> ReadResult {
        ReadResult { bytes_read: n, status: ReadStatus::Eof }
    }

    /// A failed pull.
    pub fn error() -> ReadResult {
        ReadResult { bytes_read: 0, status: ReadStatus::Error }
    }

    /// Normalize this result against a buffer of `cap` bytes.
    ///
    /// A byte count larger than the buffer is clamped to it, and a successful
    /// pull of zero bytes is treated as end of input, since a source that
    /// keeps reporting it would otherwise never terminate.
    pub fn sanitize(self, cap: usize) -> ReadResult {
        let bytes_read = core::cmp::min(self.bytes_read, cap);
        let status = match self.status {
            ReadStatus::Ok if bytes_read == 0 => ReadStatus::Eof,
            status => status,
        };
        ReadResult { bytes_read, status }
    }
}

/// A pull based source of CSV bytes.
///
/// Implementations fill a prefix of `buf` and report how much they wrote.
/// The engine calls `pull` only when it needs more bytes to finish a field,
/// and always with a non-empty `buf`.
///
/// Closures of the shape `FnMut(&mut [u8]) -> ReadResult` are sources, which
/// lets a caller keep ownership of whatever state backs the source:
///
/// ```
/// use csvzero_core::{ReadResult, Source};
///
/// let mut chunks = vec![&b"a,"[..], &b"b\n"[..]].into_iter();
/// let mut src = |buf: &mut [u8]| match chunks.next() {
///     None => ReadResult::eof(0),
///     Some(chunk) => {
///         buf[..chunk.len()].copy_from_slice(chunk);
///         ReadResult::ok(chunk.len())
///     }
/// };
/// let mut buf = [0; 8];
/// assert_eq!(src.pull(&mut buf), ReadResult::ok(2));
/// ```
pub trait Source {
    /// Write up to `buf.len()` bytes into `buf`.
    fn pull(&mut self, buf: &mut [u8]) -> ReadResult;
}

impl<F> Source for F
where
    F: FnMut(&mut [u8]) -> ReadResult,
{
    fn pull(&mut self, buf: &mut [u8]) -> ReadResult {
        self(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::{ReadResult, ReadStatus, Source};

    #[test]
    fn sanitize_zero_ok_is_eof() {
        let res = ReadResult::ok(0).sanitize(10);
        assert_eq!(res.status, ReadStatus::Eof);
        assert_eq!(res.bytes_read, 0);
    }

    #[test]
    fn sanitize_clamps() {
        assert_eq!(ReadResult::ok(50).sanitize(10), ReadResult::ok(10));
        assert_eq!(ReadResult::eof(50).sanitize(3), ReadResult::eof(3));
    }

    #[test]
    fn sanitize_keeps_errors() {
        assert_eq!(ReadResult::error().sanitize(10), ReadResult::error());
    }

    #[test]
    fn borrowed_source() {
        let mut calls = 0;
        let mut src = |buf: &mut [u8]| {
            calls += 1;
            buf[0] = b'x';
            ReadResult::ok(1)
        };
        {
            let mut borrowed = &mut src;
            let mut buf = [0; 4];
            assert_eq!(borrowed.pull(&mut buf), ReadResult::ok(1));
            assert_eq!(buf[0], b'x');
        }
        assert_eq!(src.pull(&mut [0; 1]), ReadResult::ok(1));
        drop(src);
        assert_eq!(calls, 2);
    }
}
