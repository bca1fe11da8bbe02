use std::error;
use std::fmt;
use std::io;
use std::result;

/// A type alias for `Result<T, csvzero::Error>`.
pub type Result<T> = result::Result<T, Error>;

/// An error that can occur when constructing an iterator or reading fields.
///
/// Reaching the end of the data is not an error. It is reported as
/// `Ok(None)` by [`Iter::next_field`](crate::Iter::next_field).
///
/// Every error returned by `next_field` is terminal: the iterator keeps
/// reporting an error of the same kind and never resumes scanning.
#[derive(Debug)]
pub enum Error {
    /// No memory was available to scan into, i.e., the scan buffer given to
    /// a constructor was empty.
    Oom,
    /// The named file could not be opened.
    Open(io::Error),
    /// A single field, including its terminator, does not fit in the scan
    /// buffer even after compaction.
    FieldTooLong {
        /// The capacity of the scan buffer.
        capacity: usize,
    },
    /// A quoted field was followed by something other than a comma, a row
    /// terminator or the end of input, or was never closed.
    InvalidQuotes,
    /// The byte source reported a hard failure.
    Read(io::Error),
}

/// The kind of an [`Error`], without any payload.
///
/// The discriminants match the status codes of the C interface.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorKind {
    /// See [`Error::Oom`].
    Oom = 1,
    /// See [`Error::FieldTooLong`].
    FieldTooLong = 2,
    /// See [`Error::InvalidQuotes`].
    InvalidQuotes = 4,
    /// See [`Error::Read`].
    ReadFailed = 5,
    /// See [`Error::Open`].
    OpenError = 6,
}

impl Error {
    /// Return the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match *self {
            Error::Oom => ErrorKind::Oom,
            Error::Open(_) => ErrorKind::OpenError,
            Error::FieldTooLong { .. } => ErrorKind::FieldTooLong,
            Error::InvalidQuotes => ErrorKind::InvalidQuotes,
            Error::Read(_) => ErrorKind::ReadFailed,
        }
    }

    /// Returns true if this error came from the byte source.
    pub fn is_io_error(&self) -> bool {
        match *self {
            Error::Open(_) | Error::Read(_) => true,
            _ => false,
        }
    }

    /// Rebuild an error of the given kind for an iterator that has already
    /// failed. The original I/O error, if any, was handed to the caller the
    /// first time around.
    pub(crate) fn repeat(kind: ErrorKind, capacity: usize) -> Error {
        match kind {
            ErrorKind::Oom => Error::Oom,
            ErrorKind::FieldTooLong => Error::FieldTooLong { capacity },
            ErrorKind::InvalidQuotes => Error::InvalidQuotes,
            ErrorKind::ReadFailed => Error::Read(io::Error::new(
                io::ErrorKind::Other,
                "byte source failed on an earlier read",
            )),
            ErrorKind::OpenError => Error::Open(io::Error::new(
                io::ErrorKind::Other,
                "file could not be opened",
            )),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::Open(ref err) | Error::Read(ref err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Oom => {
                write!(f, "CSV error: no scan buffer memory available")
            }
            Error::Open(ref err) => {
                write!(f, "CSV error: failed to open file: {}", err)
            }
            Error::FieldTooLong { capacity } => write!(
                f,
                "CSV parse error: field does not fit in a scan buffer \
                 of {} bytes",
                capacity
            ),
            Error::InvalidQuotes => {
                write!(f, "CSV parse error: malformed quoted field")
            }
            Error::Read(ref err) => {
                write!(f, "CSV error: failed to read input: {}", err)
            }
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match *self {
            ErrorKind::Oom => "out of memory",
            ErrorKind::FieldTooLong => "field too long",
            ErrorKind::InvalidQuotes => "invalid quotes",
            ErrorKind::ReadFailed => "read failed",
            ErrorKind::OpenError => "open error",
        };
        f.write_str(name)
    }
}
