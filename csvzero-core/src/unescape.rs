use memchr::memchr;

/// Collapse every doubled quote (`""`) in `data` into a single quote, in
/// place, and return the new length of the field.
///
/// The bytes past the returned length are left in an unspecified state.
/// When `data` contains no doubled quotes, nothing is written and
/// `data.len()` is returned, so it is always safe to call this on a field
/// even if it was not flagged as needing it.
///
/// ```
/// use csvzero_core::unescape_in_place;
///
/// let mut field = *b"f\"\"g";
/// let n = unescape_in_place(&mut field);
/// assert_eq!(&field[..n], b"f\"g");
/// ```
pub fn unescape_in_place(data: &mut [u8]) -> usize {
    // Nothing moves until the first doubled quote, so find it cheaply.
    let first = match find_doubled(data, 0) {
        None => return data.len(),
        Some(i) => i,
    };
    let (mut read, mut write) = (first + 2, first + 1);
    while read < data.len() {
        let b = data[read];
        data[write] = b;
        write += 1;
        read += 1;
        if b == b'"' && data.get(read) == Some(&b'"') {
            read += 1;
        }
    }
    write
}

fn find_doubled(data: &[u8], mut at: usize) -> Option<usize> {
    while let Some(i) = memchr(b'"', &data[at..]) {
        let i = at + i;
        if data.get(i + 1) == Some(&b'"') {
            return Some(i);
        }
        at = i + 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use quickcheck::{quickcheck, TestResult};

    use super::unescape_in_place;

    fn unescape(s: &str) -> String {
        let mut bytes = s.as_bytes().to_vec();
        let n = unescape_in_place(&mut bytes);
        bytes.truncate(n);
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn collapses_pairs() {
        assert_eq!(unescape("a\"\"b"), "a\"b");
        assert_eq!(unescape("\"\""), "\"");
        assert_eq!(unescape("\"\"\"\""), "\"\"");
        assert_eq!(unescape("\"\"a\"\"b\"\""), "\"a\"b\"");
    }

    #[test]
    fn odd_quote_runs() {
        assert_eq!(unescape("a\"\"\"b"), "a\"\"b");
        assert_eq!(unescape("a\"b\"\"c"), "a\"b\"c");
    }

    #[test]
    fn untouched_without_pairs() {
        assert_eq!(unescape(""), "");
        assert_eq!(unescape("abc"), "abc");
        assert_eq!(unescape("a\"b\"c"), "a\"b\"c");
        assert_eq!(unescape("\""), "\"");
    }

    #[test]
    fn no_pairs_is_identity() {
        fn prop(data: Vec<u8>) -> TestResult {
            if data.windows(2).any(|w| w == b"\"\"") {
                return TestResult::discard();
            }
            let mut got = data.clone();
            let n = unescape_in_place(&mut got);
            TestResult::from_bool(n == data.len() && got == data)
        }
        quickcheck(prop as fn(Vec<u8>) -> TestResult);
    }

    // Doubling every quote and unescaping gets back the original.
    #[test]
    fn undoes_doubling() {
        fn prop(data: Vec<u8>) -> bool {
            let mut escaped = vec![];
            for &b in &data {
                escaped.push(b);
                if b == b'"' {
                    escaped.push(b'"');
                }
            }
            let n = unescape_in_place(&mut escaped);
            escaped[..n] == data[..]
        }
        quickcheck(prop as fn(Vec<u8>) -> bool);
    }
}
