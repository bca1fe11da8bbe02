use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use csvzero_core::{ReadFieldResult, Source, Tokenizer};
use log::{debug, trace};

use crate::error::{Error, ErrorKind, Result};
use crate::field::Field;
use crate::source::Input;

/// A streaming, zero-copy CSV field iterator.
///
/// An `Iter` scans CSV data one field at a time out of a fixed size buffer
/// that the caller provides. Fields are handed out as [`Field`] views into
/// that buffer, so parsing never allocates or copies field contents. The
/// price is that the buffer must be large enough to hold the longest field
/// (together with its quotes and terminator), and that a field must be
/// dropped before the next one is read.
///
/// The delimiter is always `,`, the quote is always `"` and quotes inside
/// quoted fields are escaped by doubling them. Rows end with `\n` or `\r\n`.
/// Row and column numbering is left to the caller, using
/// [`Field::last_column`].
///
/// # Example
///
/// ```
/// let mut data = b"a,b,\"c,d\"\ne,\"f\"\"g\",h".to_vec();
/// let mut it = csvzero::Iter::from_bytes(&mut data);
///
/// let mut rows = vec![vec![]];
/// while let Some(mut field) = it.next_field()? {
///     let last = field.last_column();
///     rows.last_mut().unwrap().push(field.unescape().to_vec());
///     if last {
///         rows.push(vec![]);
///     }
/// }
/// rows.pop();
/// assert_eq!(rows, vec![
///     vec![b"a".to_vec(), b"b".to_vec(), b"c,d".to_vec()],
///     vec![b"e".to_vec(), b"f\"g".to_vec(), b"h".to_vec()],
/// ]);
/// # Ok::<(), csvzero::Error>(())
/// ```
pub struct Iter<'a> {
    /// The scan buffer. In bytes mode, this is the caller's data.
    buf: &'a mut [u8],
    /// The start of the field being scanned. Everything before it has been
    /// handed out already.
    pos: usize,
    /// The end of the bytes read into `buf`.
    end: usize,
    /// Set once the source says it has nothing more to give.
    eof: bool,
    input: Input<'a>,
    tok: Tokenizer,
    /// The first error reported. Every error is terminal.
    failed: Option<ErrorKind>,
    /// A read error hit while constructing, reported by the first call to
    /// `next_field`.
    pending: Option<io::Error>,
}

impl<'a> Iter<'a> {
    /// Open the file at `path` and scan it using `buf`.
    ///
    /// The file is owned by the iterator and closed when it is dropped.
    ///
    /// # Errors
    ///
    /// This returns `Error::Oom` if `buf` is empty and `Error::Open` if the
    /// file could not be opened.
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        buf: &'a mut [u8],
    ) -> Result<Iter<'a>> {
        if buf.is_empty() {
            return Err(Error::Oom);
        }
        let path = path.as_ref();
        let file = fs::File::open(path).map_err(|err| {
            debug!("failed to open {}: {}", path.display(), err);
            Error::Open(err)
        })?;
        debug!("scanning {} with a {} byte buffer", path.display(), buf.len());
        Iter::new(Input::File(file), buf)
    }

    /// Scan the data produced by `rdr`, using `buf`.
    ///
    /// The reader is only borrowed. It is never closed by the iterator and
    /// is left positioned wherever the last pull left it.
    ///
    /// # Errors
    ///
    /// This returns `Error::Oom` if `buf` is empty.
    pub fn from_reader(
        rdr: &'a mut dyn io::Read,
        buf: &'a mut [u8],
    ) -> Result<Iter<'a>> {
        Iter::new(Input::Reader(rdr), buf)
    }

    /// Scan `data` in place.
    ///
    /// No separate scan buffer is used. Fields point directly into `data`,
    /// and unescaping a field rewrites `data`.
    pub fn from_bytes(data: &'a mut [u8]) -> Iter<'a> {
        let end = data.len();
        Iter {
            buf: data,
            pos: 0,
            end,
            eof: false,
            input: Input::Bytes,
            tok: Tokenizer::new(),
            failed: None,
            pending: None,
        }
    }

    /// Scan the data produced by a custom [`Source`], using `buf`.
    ///
    /// Whatever the source reports is trusted. The only correction made is
    /// that a successful pull of zero bytes is taken as the end of input.
    ///
    /// # Errors
    ///
    /// This returns `Error::Oom` if `buf` is empty.
    pub fn from_source<S: Source + 'a>(
        src: S,
        buf: &'a mut [u8],
    ) -> Result<Iter<'a>> {
        Iter::new(Input::Custom(Box::new(src)), buf)
    }

    fn new(input: Input<'a>, buf: &'a mut [u8]) -> Result<Iter<'a>> {
        if buf.is_empty() {
            return Err(Error::Oom);
        }
        let mut it = Iter {
            buf,
            pos: 0,
            end: 0,
            eof: false,
            input,
            tok: Tokenizer::new(),
            failed: None,
            pending: None,
        };
        if let Err(err) = it.fill() {
            debug!("initial fill failed: {}", err);
            it.pending = Some(err);
        }
        Ok(it)
    }

    /// Read the next field.
    ///
    /// This returns `Ok(None)` once all of the data has been read, and keeps
    /// returning it on later calls.
    ///
    /// # Errors
    ///
    /// `Error::FieldTooLong` if a field does not fit in the scan buffer,
    /// `Error::InvalidQuotes` if a quoted field is malformed and
    /// `Error::Read` if the source fails. No error is recoverable: once one
    /// is returned, every later call returns an error of the same kind.
    pub fn next_field(&mut self) -> Result<Option<Field<'_>>> {
        if let Some(kind) = self.failed {
            return Err(Error::repeat(kind, self.buf.len()));
        }
        if let Some(err) = self.pending.take() {
            return Err(self.fail(Error::Read(err)));
        }
        loop {
            let input = &self.buf[self.pos..self.end];
            match self.tok.read_field(input, self.eof) {
                ReadFieldResult::InputEmpty => {
                    if let Err(err) = self.refill() {
                        return Err(self.fail(err));
                    }
                }
                ReadFieldResult::Field {
                    start,
                    end,
                    consumed,
                    last_column,
                    needs_unescape,
                } => {
                    let at = self.pos;
                    self.pos += consumed;
                    let data = &mut self.buf[at + start..at + end];
                    let field = Field::new(data, last_column, needs_unescape);
                    return Ok(Some(field));
                }
                ReadFieldResult::InvalidQuotes => {
                    return Err(self.fail(Error::InvalidQuotes));
                }
                ReadFieldResult::End => return Ok(None),
            }
        }
    }

    /// Returns true once the end of the data has been reached or an error
    /// has been reported.
    pub fn is_done(&self) -> bool {
        self.failed.is_some() || self.tok.is_done()
    }

    /// The capacity of the scan buffer. In bytes mode, this is the length
    /// of the data.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    fn fail(&mut self, err: Error) -> Error {
        debug!("field scan failed: {}", err);
        self.failed = Some(err.kind());
        err
    }

    /// Make room for more data and pull from the source.
    ///
    /// This is only called when the tokenizer needs more bytes and the
    /// source has not reported EOF yet.
    fn refill(&mut self) -> Result<()> {
        if self.input.is_resident() {
            // The caller's data is never moved. It is all there is.
            self.eof = true;
            return Ok(());
        }
        if self.pos > 0 {
            trace!("compacting {} unconsumed bytes", self.end - self.pos);
            self.buf.copy_within(self.pos..self.end, 0);
            self.end -= self.pos;
            self.pos = 0;
        }
        if self.end == self.buf.len() {
            return Err(Error::FieldTooLong { capacity: self.buf.len() });
        }
        self.fill().map_err(Error::Read)
    }

    fn fill(&mut self) -> io::Result<()> {
        let (n, eof) = self.input.fill(&mut self.buf[self.end..])?;
        trace!("pulled {} bytes (eof: {})", n, eof);
        self.end += n;
        self.eof = eof;
        Ok(())
    }
}

impl<'a> fmt::Debug for Iter<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Iter")
            .field("capacity", &self.buf.len())
            .field("pos", &self.pos)
            .field("end", &self.end)
            .field("eof", &self.eof)
            .field("input", &self.input)
            .field("tok", &self.tok)
            .field("failed", &self.failed)
            .finish()
    }
}
