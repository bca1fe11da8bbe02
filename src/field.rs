use std::fmt;
use std::mem;
use std::ops;

use bstr::BStr;
use csvzero_core::unescape_in_place;

/// A single CSV field, borrowed from the iterator that produced it.
///
/// A `Field` is a view into the iterator's scan buffer (or, for
/// [`Iter::from_bytes`](crate::Iter::from_bytes), into the caller's data).
/// Nothing is copied. Since it holds the iterator's mutable borrow, it must
/// be dropped before the next field can be read.
///
/// Quoted fields are given without their surrounding quotes, but doubled
/// quotes inside them are left as is. Call [`Field::unescape`] when
/// [`Field::needs_unescape`] is true to collapse them.
pub struct Field<'a> {
    data: &'a mut [u8],
    last_column: bool,
    needs_unescape: bool,
}

impl<'a> Field<'a> {
    pub(crate) fn new(
        data: &'a mut [u8],
        last_column: bool,
        needs_unescape: bool,
    ) -> Field<'a> {
        Field { data, last_column, needs_unescape }
    }

    /// The raw bytes of this field.
    pub fn as_bytes(&self) -> &[u8] {
        self.data
    }

    /// The length of this field in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if this field has no bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns true if this field ends its row, either because a row
    /// terminator follows it or because the input ends after it.
    pub fn last_column(&self) -> bool {
        self.last_column
    }

    /// Returns true if this field was quoted and contains at least one
    /// doubled quote.
    pub fn needs_unescape(&self) -> bool {
        self.needs_unescape
    }

    /// Collapse doubled quotes in place and return the resulting bytes.
    ///
    /// This rewrites the underlying buffer and shrinks the view. Calling it
    /// on a field without doubled quotes changes nothing, and calling it
    /// more than once is harmless for any field that was honestly flagged.
    pub fn unescape(&mut self) -> &[u8] {
        if self.needs_unescape {
            let data = mem::take(&mut self.data);
            let len = unescape_in_place(data);
            self.data = &mut data[..len];
            self.needs_unescape = false;
        }
        self.data
    }

    /// Give up the view, keeping the mutable borrow of the bytes.
    pub fn into_bytes(self) -> &'a mut [u8] {
        self.data
    }
}

impl<'a> ops::Deref for Field<'a> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.data
    }
}

impl<'a> PartialEq<[u8]> for Field<'a> {
    fn eq(&self, other: &[u8]) -> bool {
        self.as_bytes() == other
    }
}

impl<'a, 'b> PartialEq<&'b [u8]> for Field<'a> {
    fn eq(&self, other: &&'b [u8]) -> bool {
        self.as_bytes() == *other
    }
}

impl<'a> fmt::Debug for Field<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Field")
            .field("data", &BStr::new(self.as_bytes()))
            .field("last_column", &self.last_column)
            .field("needs_unescape", &self.needs_unescape)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::Field;

    #[test]
    fn unescape_shrinks_view() {
        let mut raw = *b"f\"\"g";
        let mut field = Field::new(&mut raw, false, true);
        assert_eq!(field.len(), 4);
        assert_eq!(field.unescape(), b"f\"g");
        assert_eq!(field.len(), 3);
        assert!(!field.needs_unescape());
        // A second call is a no-op.
        assert_eq!(field.unescape(), b"f\"g");
    }

    #[test]
    fn unescape_without_flag_is_identity() {
        let mut raw = *b"a\"\"b";
        let mut field = Field::new(&mut raw, true, false);
        assert_eq!(field.unescape(), b"a\"\"b");
        assert!(field.last_column());
    }

    #[test]
    fn debug_is_readable() {
        let mut raw = *b"x,y";
        let field = Field::new(&mut raw, true, false);
        let got = format!("{:?}", field);
        assert!(got.contains("\"x,y\""), "{}", got);
        assert!(got.contains("last_column: true"), "{}", got);
    }

    #[test]
    fn compares_with_bytes() {
        let mut raw = *b"abc";
        let field = Field::new(&mut raw, false, false);
        assert_eq!(field, &b"abc"[..]);
        assert!(!field.is_empty());
        assert_eq!(&field[1..], b"bc");
        assert_eq!(field.into_bytes(), b"abc");
    }
}
