/*!
`csvzero-core` provides the allocation free pieces of a zero-copy CSV
tokenizer: a resumable field scanner, the pull contract that byte sources
implement, and an in-place unescaper for doubled quotes.

This crate never copies field data. The [`Tokenizer`] is handed a window of
bytes that always begins at the first byte of the field being scanned, and
it reports the field as a range into that window. Whoever owns the window
(typically the `csvzero` crate's scan buffer) is responsible for keeping the
unconsumed bytes in place, compacting them, and refilling from a
[`Source`].

# Example

```
use csvzero_core::{ReadFieldResult, Tokenizer};

let data = b"a,\"b\"\"c\"\n";
let mut tok = Tokenizer::new();
let mut fields = vec![];
let mut input = &data[..];
loop {
    match tok.read_field(input, true) {
        ReadFieldResult::Field {
            start, end, consumed, needs_unescape, ..
        } => {
            fields.push((&input[start..end], needs_unescape));
            input = &input[consumed..];
        }
        ReadFieldResult::End => break,
        res => panic!("unexpected result: {:?}", res),
    }
}
assert_eq!(fields, vec![(&b"a"[..], false), (&b"b\"\"c"[..], true)]);
```
*/

#![deny(missing_docs)]
#![cfg_attr(not(any(feature = "std", test)), no_std)]

pub use crate::source::{ReadResult, ReadStatus, Source};
pub use crate::tokenizer::{ReadFieldResult, Tokenizer};
pub use crate::unescape::unescape_in_place;

mod source;
mod tokenizer;
mod unescape;
