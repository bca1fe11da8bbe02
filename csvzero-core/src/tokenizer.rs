use memchr::{memchr, memchr2};

/// The result of scanning for at most one field.
///
/// All offsets are relative to the start of the `input` given to
/// [`Tokenizer::read_field`], which is always the first byte of the field
/// being scanned.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReadFieldResult {
    /// The input was exhausted before the end of the field was found.
    ///
    /// The caller should call `read_field` again with the same bytes
    /// followed by more data (or with `eof` set). The tokenizer remembers
    /// how far it got and does not rescan.
    InputEmpty,
    /// The end of a field was found.
    Field {
        /// Where the field's contents start. This is `1` for quoted fields.
        start: usize,
        /// Where the field's contents end (exclusive).
        end: usize,
        /// The number of input bytes belonging to this field, including
        /// quotes and the delimiter or row terminator that ended it.
        consumed: usize,
        /// Whether a row terminator or the end of input follows the field.
        last_column: bool,
        /// Whether the field contents contain doubled quotes.
        needs_unescape: bool,
    },
    /// A closing quote was followed by something other than a delimiter, a
    /// row terminator or the end of input, or a quoted field was never
    /// closed.
    InvalidQuotes,
    /// All CSV data has been read.
    End,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum State {
    StartField,
    Unquoted,
    Quoted,
    /// Just saw a quote inside a quoted field. The next byte decides whether
    /// it was an escape or the closing quote.
    QuotedSeenQuote,
    Done,
}

/// A resumable, single-field-at-a-time CSV scanner.
///
/// The delimiter is always `,` and the quote is always `"`. Rows end at `\n`
/// or `\r\n`; a `\r` that is not followed by `\n` is ordinary data.
///
/// The tokenizer never copies or rewrites input. Doubled quotes are left in
/// place and flagged via `needs_unescape`, see [`unescape_in_place`].
///
/// [`unescape_in_place`]: crate::unescape_in_place
#[derive(Clone, Debug)]
pub struct Tokenizer {
    state: State,
    /// How many bytes of the current field have been examined.
    pos: usize,
    needs_unescape: bool,
    /// Whether nothing has been produced since the last row terminator.
    row_start: bool,
}

impl Default for Tokenizer {
    fn default() -> Tokenizer {
        Tokenizer {
            state: State::StartField,
            pos: 0,
            needs_unescape: false,
            row_start: true,
        }
    }
}

impl Tokenizer {
    /// Create a tokenizer positioned at the start of a CSV document.
    pub fn new() -> Tokenizer {
        Tokenizer::default()
    }

    /// Reset the tokenizer such that it behaves as if it had never been
    /// used.
    pub fn reset(&mut self) {
        *self = Tokenizer::default();
    }

    /// Returns true once the end of input has been reported or the input
    /// was found to be malformed.
    pub fn is_done(&self) -> bool {
        self.state == State::Done
    }

    /// Scan for the next field in `input`.
    ///
    /// `input` must start at the first byte of the field, and when resuming
    /// after `InputEmpty`, must begin with the same bytes given previously.
    /// `eof` says whether `input` holds everything that remains of the data.
    ///
    /// # Termination
    ///
    /// At end of input, a row that has not started yet produces `End`. A
    /// trailing delimiter produces one final empty field first. Once `End`
    /// or `InvalidQuotes` has been returned, every later call returns `End`.
    pub fn read_field(&mut self, input: &[u8], eof: bool) -> ReadFieldResult {
        loop {
            match self.state {
                State::Done => return ReadFieldResult::End,
                State::StartField => {
                    if input.is_empty() {
                        if !eof {
                            return ReadFieldResult::InputEmpty;
                        }
                        if self.row_start {
                            self.state = State::Done;
                            return ReadFieldResult::End;
                        }
                        let res = self.field(0, 0, 0, true);
                        self.state = State::Done;
                        return res;
                    }
                    if input[0] == b'"' {
                        self.state = State::Quoted;
                        self.pos = 1;
                    } else {
                        self.state = State::Unquoted;
                        self.pos = 0;
                    }
                }
                State::Unquoted => {
                    let at = match memchr2(b',', b'\n', &input[self.pos..]) {
                        Some(i) => self.pos + i,
                        None if eof => {
                            let len = input.len();
                            let res = self.field(0, len, len, true);
                            self.state = State::Done;
                            return res;
                        }
                        None => {
                            self.pos = input.len();
                            return ReadFieldResult::InputEmpty;
                        }
                    };
                    if input[at] == b',' {
                        return self.field(0, at, at + 1, false);
                    }
                    let end = if at > 0 && input[at - 1] == b'\r' {
                        at - 1
                    } else {
                        at
                    };
                    return self.field(0, end, at + 1, true);
                }
                State::Quoted => match memchr(b'"', &input[self.pos..]) {
                    Some(i) => {
                        self.pos += i + 1;
                        self.state = State::QuotedSeenQuote;
                    }
                    None if eof => return self.invalid(),
                    None => {
                        self.pos = input.len();
                        return ReadFieldResult::InputEmpty;
                    }
                },
                State::QuotedSeenQuote => {
                    // `pos` is just past the quote, so the contents end one
                    // byte before it.
                    let (pos, end) = (self.pos, self.pos - 1);
                    if pos >= input.len() {
                        if !eof {
                            return ReadFieldResult::InputEmpty;
                        }
                        let res = self.field(1, end, pos, true);
                        self.state = State::Done;
                        return res;
                    }
                    match input[pos] {
                        b'"' => {
                            self.needs_unescape = true;
                            self.pos += 1;
                            self.state = State::Quoted;
                        }
                        b',' => return self.field(1, end, pos + 1, false),
                        b'\n' => return self.field(1, end, pos + 1, true),
                        b'\r' => match input.get(pos + 1) {
                            Some(&b'\n') => {
                                return self.field(1, end, pos + 2, true);
                            }
                            None if !eof => return ReadFieldResult::InputEmpty,
                            _ => return self.invalid(),
                        },
                        _ => return self.invalid(),
                    }
                }
            }
        }
    }

    fn field(
        &mut self,
        start: usize,
        end: usize,
        consumed: usize,
        last_column: bool,
    ) -> ReadFieldResult {
        let needs_unescape = self.needs_unescape;
        self.state = State::StartField;
        self.pos = 0;
        self.needs_unescape = false;
        self.row_start = last_column;
        ReadFieldResult::Field {
            start,
            end,
            consumed,
            last_column,
            needs_unescape,
        }
    }

    fn invalid(&mut self) -> ReadFieldResult {
        self.state = State::Done;
        ReadFieldResult::InvalidQuotes
    }
}
