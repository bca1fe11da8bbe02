/*!
The `csvz_*` C interface.

This module exports the functions declared by `include/csvzero.h`. The crate
is built as a `cdylib` and a `staticlib` as well as an `rlib`, so with the
`capi` feature enabled, C programs can link against it directly.

Each iterator is a boxed [`Iter`] behind an opaque pointer. Errors from the
constructors are reported by returning NULL and recording a code that
[`csvz_err`] reads back. The record is kept per thread. [`csvz_iter_next`]
returns its status directly and records failures the same way.

All buffers handed in by the caller are borrowed for as long as the
iterator lives. Nothing here checks that, so every function taking a
pointer is `unsafe`.
*/

#![allow(non_camel_case_types)]

use std::cell::Cell;
use std::ffi::CStr;
use std::path::Path;
use std::ptr;
use std::slice;

use libc::{c_char, c_int, c_void, FILE};
use log::debug;

use crate::error::ErrorKind;
use crate::iter::Iter;
use crate::{unescape_in_place, ReadResult, ReadStatus, Result, Source};

/// Status codes returned by the C interface.
#[repr(C)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum csvz_error {
    /// The operation succeeded.
    CSVZ_OK = 0,
    /// The scan buffer is missing or empty.
    CSVZ_ERR_OOM = 1,
    /// A field does not fit in the scan buffer.
    CSVZ_ERR_FIELD_TOO_LONG = 2,
    /// There are no more fields.
    CSVZ_ERR_EOF = 3,
    /// A quoted field is malformed.
    CSVZ_ERR_INVALID_QUOTES = 4,
    /// The byte source failed.
    CSVZ_ERR_READ_FAILED = 5,
    /// The file could not be opened.
    CSVZ_ERR_OPEN_ERROR = 6,
}

impl From<ErrorKind> for csvz_error {
    fn from(kind: ErrorKind) -> csvz_error {
        match kind {
            ErrorKind::Oom => csvz_error::CSVZ_ERR_OOM,
            ErrorKind::FieldTooLong => csvz_error::CSVZ_ERR_FIELD_TOO_LONG,
            ErrorKind::InvalidQuotes => csvz_error::CSVZ_ERR_INVALID_QUOTES,
            ErrorKind::ReadFailed => csvz_error::CSVZ_ERR_READ_FAILED,
            ErrorKind::OpenError => csvz_error::CSVZ_ERR_OPEN_ERROR,
        }
    }
}

/// A field handed to C. `data` is not NUL terminated and is only valid
/// until the next call on the same iterator.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct csvz_field {
    /// The first byte of the field.
    pub data: *mut c_char,
    /// The length of the field in bytes.
    pub len: usize,
    /// 1 if the field ends its row.
    pub last_column: c_int,
    /// 1 if the field contains doubled quotes.
    pub needs_unescape: c_int,
}

/// The status half of a callback's answer.
#[repr(C)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum csvz_read_status {
    /// Bytes were read and more may follow.
    CSVZ_READ_STATUS_OK = 0,
    /// The input is exhausted.
    CSVZ_READ_STATUS_EOF = 1,
    /// The read failed.
    CSVZ_READ_STATUS_ERROR = 2,
}

/// What a read callback returns.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct csvz_read_result {
    /// The number of bytes written to the buffer.
    pub bytes_read: usize,
    /// The status of the read.
    pub status: csvz_read_status,
}

/// A read callback: `(context, buffer, len)`.
pub type csvz_read_fn =
    extern "C" fn(*mut c_void, *mut c_char, usize) -> csvz_read_result;

/// An opaque iterator handle.
pub struct csvz_iterator {
    it: Iter<'static>,
}

thread_local! {
    static LAST_ERROR: Cell<csvz_error> = Cell::new(csvz_error::CSVZ_OK);
}

fn set_err(code: csvz_error) -> csvz_error {
    LAST_ERROR.with(|last| last.set(code));
    code
}

/// Reads from a `FILE*` that the caller keeps open.
struct CFile(*mut FILE);

impl Source for CFile {
    fn pull(&mut self, buf: &mut [u8]) -> ReadResult {
        let n = unsafe {
            let out = buf.as_mut_ptr() as *mut c_void;
            libc::fread(out, 1, buf.len(), self.0)
        };
        if n > 0 {
            ReadResult::ok(n)
        } else if unsafe { libc::feof(self.0) } != 0 {
            ReadResult::eof(0)
        } else {
            ReadResult::error()
        }
    }
}

struct Callback {
    context: *mut c_void,
    read: csvz_read_fn,
}

impl Source for Callback {
    fn pull(&mut self, buf: &mut [u8]) -> ReadResult {
        let out = buf.as_mut_ptr() as *mut c_char;
        let res = (self.read)(self.context, out, buf.len());
        let status = match res.status {
            csvz_read_status::CSVZ_READ_STATUS_OK => ReadStatus::Ok,
            csvz_read_status::CSVZ_READ_STATUS_EOF => ReadStatus::Eof,
            csvz_read_status::CSVZ_READ_STATUS_ERROR => ReadStatus::Error,
        };
        ReadResult { bytes_read: res.bytes_read, status }
    }
}

/// Borrow `len` bytes at `data` for the life of an iterator.
unsafe fn borrow_bytes(
    data: *mut c_char,
    len: usize,
) -> Option<&'static mut [u8]> {
    if data.is_null() {
        None
    } else {
        Some(slice::from_raw_parts_mut(data as *mut u8, len))
    }
}

fn into_handle(res: Result<Iter<'static>>) -> *mut csvz_iterator {
    match res {
        Ok(it) => Box::into_raw(Box::new(csvz_iterator { it })),
        Err(err) => {
            debug!("failed to create iterator: {}", err);
            set_err(err.kind().into());
            ptr::null_mut()
        }
    }
}

#[cfg(unix)]
fn c_path(name: &CStr) -> Option<&Path> {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    Some(Path::new(OsStr::from_bytes(name.to_bytes())))
}

#[cfg(not(unix))]
fn c_path(name: &CStr) -> Option<&Path> {
    name.to_str().ok().map(Path::new)
}

/// Open `filename` and scan it with the `len` bytes at `buffer`. The file
/// is closed by [`csvz_iter_free`].
///
/// Returns NULL on failure, with `CSVZ_ERR_OOM` or `CSVZ_ERR_OPEN_ERROR`
/// recorded.
///
/// # Safety
///
/// `filename` must be NULL or a NUL terminated string. `buffer` must be
/// NULL or valid for `len` bytes until the iterator is freed.
#[no_mangle]
pub unsafe extern "C" fn csvz_iter_from_file(
    filename: *const c_char,
    buffer: *mut c_char,
    len: usize,
) -> *mut csvz_iterator {
    let buf = match borrow_bytes(buffer, len) {
        Some(buf) if !buf.is_empty() => buf,
        _ => {
            set_err(csvz_error::CSVZ_ERR_OOM);
            return ptr::null_mut();
        }
    };
    if filename.is_null() {
        set_err(csvz_error::CSVZ_ERR_OPEN_ERROR);
        return ptr::null_mut();
    }
    let path = match c_path(CStr::from_ptr(filename)) {
        Some(path) => path,
        None => {
            set_err(csvz_error::CSVZ_ERR_OPEN_ERROR);
            return ptr::null_mut();
        }
    };
    into_handle(Iter::from_path(path, buf))
}

/// Scan an open `FILE*` with the `len` bytes at `buffer`. The handle is
/// not closed by [`csvz_iter_free`].
///
/// Returns NULL on failure. A NULL handle records `CSVZ_ERR_OPEN_ERROR`.
///
/// # Safety
///
/// `fd` must be NULL or an open stream, and `buffer` NULL or valid for
/// `len` bytes, until the iterator is freed.
#[no_mangle]
pub unsafe extern "C" fn csvz_iter_from_fd(
    fd: *mut FILE,
    buffer: *mut c_char,
    len: usize,
) -> *mut csvz_iterator {
    let buf = match borrow_bytes(buffer, len) {
        Some(buf) => buf,
        None => {
            set_err(csvz_error::CSVZ_ERR_OOM);
            return ptr::null_mut();
        }
    };
    if fd.is_null() {
        set_err(csvz_error::CSVZ_ERR_OPEN_ERROR);
        return ptr::null_mut();
    }
    into_handle(Iter::from_source(CFile(fd), buf))
}

/// Scan the `len` bytes at `data` in place.
///
/// Returns NULL with `CSVZ_ERR_OOM` recorded if `data` is NULL and `len`
/// is not zero. NULL with a zero length is an empty document.
///
/// # Safety
///
/// `data` must be NULL or valid for `len` bytes until the iterator is
/// freed. Unescaping fields rewrites it.
#[no_mangle]
pub unsafe extern "C" fn csvz_iter_from_bytes(
    data: *mut c_char,
    len: usize,
) -> *mut csvz_iterator {
    match borrow_bytes(data, len) {
        Some(data) => into_handle(Ok(Iter::from_bytes(data))),
        None if len == 0 => into_handle(Ok(Iter::from_bytes(&mut []))),
        None => {
            set_err(csvz_error::CSVZ_ERR_OOM);
            ptr::null_mut()
        }
    }
}

/// Scan the bytes produced by `read`, called with `context`, using the
/// `len` bytes at `buffer`.
///
/// Returns NULL on failure. A NULL callback records `CSVZ_ERR_OPEN_ERROR`.
///
/// # Safety
///
/// `buffer` must be NULL or valid for `len` bytes until the iterator is
/// freed. `read` must write at most the length it is given.
#[no_mangle]
pub unsafe extern "C" fn csvz_iter_from_callback(
    context: *mut c_void,
    read: Option<csvz_read_fn>,
    buffer: *mut c_char,
    len: usize,
) -> *mut csvz_iterator {
    let buf = match borrow_bytes(buffer, len) {
        Some(buf) => buf,
        None => {
            set_err(csvz_error::CSVZ_ERR_OOM);
            return ptr::null_mut();
        }
    };
    let read = match read {
        Some(read) => read,
        None => {
            set_err(csvz_error::CSVZ_ERR_OPEN_ERROR);
            return ptr::null_mut();
        }
    };
    into_handle(Iter::from_source(Callback { context, read }, buf))
}

/// Free an iterator, closing its file if it opened one. NULL is ignored.
///
/// # Safety
///
/// `iter` must be NULL or a live pointer returned by a `csvz_iter_from_*`
/// function.
#[no_mangle]
pub unsafe extern "C" fn csvz_iter_free(iter: *mut csvz_iterator) {
    if !iter.is_null() {
        drop(Box::from_raw(iter));
    }
}

/// Collapse doubled quotes in the `len` bytes at `data` and return the new
/// length.
///
/// # Safety
///
/// `data` must be NULL or valid for `len` bytes.
#[no_mangle]
pub unsafe extern "C" fn csvz_unescape_in_place(
    data: *mut c_char,
    len: usize,
) -> usize {
    match borrow_bytes(data, len) {
        Some(bytes) => unescape_in_place(bytes),
        None => 0,
    }
}

/// Read the next field into `*field`.
///
/// Returns `CSVZ_OK` with `*field` filled in, `CSVZ_ERR_EOF` once the data
/// is exhausted, or an error code. A NULL `iter` or `field` gives
/// `CSVZ_ERR_READ_FAILED`.
///
/// # Safety
///
/// `iter` must be NULL or live, and `field` NULL or writable.
#[no_mangle]
pub unsafe extern "C" fn csvz_iter_next(
    iter: *mut csvz_iterator,
    field: *mut csvz_field,
) -> csvz_error {
    let iter = match iter.as_mut() {
        Some(iter) => iter,
        None => return set_err(csvz_error::CSVZ_ERR_READ_FAILED),
    };
    let out = match field.as_mut() {
        Some(out) => out,
        None => return set_err(csvz_error::CSVZ_ERR_READ_FAILED),
    };
    match iter.it.next_field() {
        Ok(Some(f)) => {
            let last_column = f.last_column() as c_int;
            let needs_unescape = f.needs_unescape() as c_int;
            let data = f.into_bytes();
            *out = csvz_field {
                data: data.as_mut_ptr() as *mut c_char,
                len: data.len(),
                last_column,
                needs_unescape,
            };
            csvz_error::CSVZ_OK
        }
        Ok(None) => csvz_error::CSVZ_ERR_EOF,
        Err(err) => set_err(err.kind().into()),
    }
}

/// The code recorded by the last failing call on this thread.
#[no_mangle]
pub extern "C" fn csvz_err() -> csvz_error {
    LAST_ERROR.with(|last| last.get())
}
