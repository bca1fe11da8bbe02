use std::{env, ffi::OsString, fs::File, process};

use bstr::BStr;
use csvzero::{ErrorKind, Iter};
use eyre::{eyre, Result};

fn run() -> Result<()> {
    let file_path = get_first_arg()?;
    let mut file = File::open(file_path)?;
    let mut buf = [0; 64];
    let mut it = Iter::from_reader(&mut file, &mut buf)?;

    let (mut row, mut col) = (0, 0);
    let err = loop {
        let mut field = match it.next_field() {
            Ok(Some(field)) => field,
            Ok(None) => return Ok(()),
            Err(err) => break err,
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
