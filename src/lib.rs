/*!
The `csvzero` crate provides a streaming, zero-copy CSV tokenizer.

An [`Iter`] reads CSV data one field at a time. Field contents are never
copied or allocated: each [`Field`] is a view into a scan buffer that the
caller provides (or, when parsing in-memory data, into the data itself).
This makes it possible to scan CSV data of any size in constant memory,
provided the buffer can hold the longest field.

Four kinds of input are supported:

* a file opened by path ([`Iter::from_path`]), owned by the iterator,
* any borrowed [`std::io::Read`] ([`Iter::from_reader`]),
* bytes already in memory ([`Iter::from_bytes`]), scanned in place,
* any [`Source`], including closures ([`Iter::from_source`]).

The format is fixed: fields are separated by `,`, rows end with `\n` or
`\r\n`, fields may be wrapped in `"` and quotes inside quoted fields are
doubled. A lone `\r` is ordinary data. Unescaping doubled quotes is left to
the caller, via [`Field::unescape`] or [`unescape_in_place`], since only
fields flagged with [`Field::needs_unescape`] need it.

# Example

```no_run
use csvzero::Iter;

# fn main() -> Result<(), csvzero::Error> {
let mut buf = [0; 4096];
let mut it = Iter::from_path("data.csv", &mut buf)?;
let (mut row, mut col) = (0, 0);
while let Some(mut field) = it.next_field()? {
    let last = field.last_column();
    println!("field[{}][{}] = {:?}", row, col, field.unescape());
    if last {
        row += 1;
        col = 0;
    } else {
        col += 1;
    }
}
# Ok(())
# }
```

# Errors

Constructors only fail when the scan buffer is empty or a named file cannot
be opened. [`Iter::next_field`] fails when a field does not fit in the scan
buffer, when quotes are malformed, or when the source fails. Every such
error is terminal for the iterator. Running out of data is not an error:
`next_field` returns `Ok(None)`.

# C interface

With the `capi` feature enabled, the [`capi`] module exports the `csvz_*`
functions declared by `csvzero.h`.
*/

#![deny(missing_docs)]

pub use csvzero_core::{unescape_in_place, ReadResult, ReadStatus, Source};

pub use crate::error::{Error, ErrorKind, Result};
pub use crate::field::Field;
pub use crate::iter::Iter;

#[cfg(feature = "capi")]
pub mod capi;
mod error;
mod field;
mod iter;
mod source;
