use std::{
    env,
    ffi::OsString,
    fs::File,
    io::{self, Read},
    process,
};

use bstr::BStr;
use csvzero::{ErrorKind, Iter, ReadResult};
use eyre::{eyre, Result};

/// Pulls from a file, counting reads and keeping the last OS error.
struct Context {
    file: File,
    read_count: usize,
    error: Option<io::Error>,
}

impl Context {
    fn read(&mut self, buf: &mut [u8]) -> ReadResult {
        self.read_count += 1;
        match self.file.read(buf) {
            Ok(0) => ReadResult::eof(0),
            Ok(n) => ReadResult::ok(n),
            Err(err) => {
                self.error = Some(err);
                ReadResult::error()
            }
        }
    }
}

fn run() -> Result<()> {
    let file_path = get_first_arg()?;
    let mut ctx =
        Context { file: File::open(file_path)?, read_count: 0, error: None };
    let mut buf = [0; 64];
    let mut it = Iter::from_source(|out: &mut [u8]| ctx.read(out), &mut buf)?;

    let (mut row, mut col) = (0, 0);
    let err = loop {
        let mut field = match it.next_field() {
            Ok(Some(field)) => field,
            Ok(None) => break None,
            Err(err) => break Some(err),
        };
        let last = field.last_column();
        let data = BStr::new(field.unescape());
        println!("field[{}][{}] = |{}|", row, col, data);
        if last {
            row += 1;
            col = 0;
        } else {
            col += 1;
        }
    };
    drop(it);
    if let Some(err) = err {
        match err.kind() {
            ErrorKind::FieldTooLong => {
                println!("> field too long at row={}, col={}", row, col)
            }
            ErrorKind::InvalidQuotes => {
                println!("invalid quotes at row={}, col={}", row, col)
            }
            kind => println!(
                "err {} encountered at row={}, col={}",
                kind as i32, row, col
            ),
        }
    }
    if let Some(err) = ctx.error {
        println!("last read error: {}", err);
    }
    println!("reads: {}", ctx.read_count);
    Ok(())
}

/// Returns the first positional argument sent to this process. If there are no
/// positional arguments, then this returns an error.
fn get_first_arg() -> Result<OsString> {
    match env::args_os().nth(1) {
        None => Err(eyre!("missing filename")),
        Some(file_path) => Ok(file_path),
    }
}

fn main() {
    if let Err(err) = run() {
        println!("{:?}", err);
        process::exit(1);
    }
}
