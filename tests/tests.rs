use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::{self, Command};

use csvzero::{ErrorKind, Iter, ReadResult};
use quickcheck::{QuickCheck, TestResult};
use tempfile::NamedTempFile;

static DOC: &'static str = "a,b,\"c,d\"\ne,\"f\"\"g\",h";

type Fields = Vec<(Vec<u8>, bool, bool)>;

/// Drain `it` into (bytes, last_column, needs_unescape) triples, along with
/// the error that stopped it, if any.
fn fields(it: &mut Iter) -> (Fields, Option<ErrorKind>) {
    let mut got = vec![];
    loop {
        match it.next_field() {
            Ok(Some(field)) => got.push((
                field.as_bytes().to_vec(),
                field.last_column(),
                field.needs_unescape(),
            )),
            Ok(None) => return (got, None),
            Err(err) => return (got, Some(err.kind())),
        }
    }
}

/// Group unescaped fields into rows.
fn rows(it: &mut Iter) -> Vec<Vec<Vec<u8>>> {
    let mut rows = vec![];
    let mut row = vec![];
    while let Some(mut field) = it.next_field().unwrap() {
        let last = field.last_column();
        row.push(field.unescape().to_vec());
        if last {
            rows.push(std::mem::replace(&mut row, vec![]));
        }
    }
    assert!(row.is_empty());
    rows
}

/// Write `data` to a fresh temporary file, removed when dropped.
fn temp_csv(data: &[u8]) -> NamedTempFile {
    let mut tmp = NamedTempFile::new().unwrap();
    tmp.write_all(data).unwrap();
    tmp.flush().unwrap();
    tmp
}

#[test]
fn document_from_every_source() {
    let want: Fields = vec![
        (b"a".to_vec(), false, false),
        (b"b".to_vec(), false, false),
        (b"c,d".to_vec(), true, false),
        (b"e".to_vec(), false, false),
        (b"f\"\"g".to_vec(), false, true),
        (b"h".to_vec(), true, false),
    ];

    let mut data = DOC.as_bytes().to_vec();
    let mut it = Iter::from_bytes(&mut data);
    assert_eq!(fields(&mut it), (want.clone(), None));

    let tmp = temp_csv(DOC.as_bytes());
    let mut buf = [0; 64];
    let mut it = Iter::from_path(tmp.path(), &mut buf).unwrap();
    assert_eq!(fields(&mut it), (want.clone(), None));

    let mut file = fs::File::open(tmp.path()).unwrap();
    let mut buf = [0; 64];
    let mut it = Iter::from_reader(&mut file, &mut buf).unwrap();
    assert_eq!(fields(&mut it), (want.clone(), None));

    let mut rest = DOC.as_bytes();
    let src = |out: &mut [u8]| {
        if rest.is_empty() {
            return ReadResult::eof(0);
        }
        out[0] = rest[0];
        rest = &rest[1..];
        ReadResult::ok(1)
    };
    let mut buf = [0; 64];
    let mut it = Iter::from_source(src, &mut buf).unwrap();
    assert_eq!(fields(&mut it), (want, None));
}

#[test]
fn file_and_memory_agree_on_large_input() {
    let mut doc = Vec::new();
    for i in 0..5_000 {
        doc.extend_from_slice(
            format!("{},\"x\"\"{}\",,\"multi\nline\"\r\n", i, i).as_bytes(),
        );
    }
    let tmp = temp_csv(&doc);

    let mut buf = vec![0; 100];
    let mut it = Iter::from_path(tmp.path(), &mut buf).unwrap();
    let from_file = fields(&mut it);

    let mut data = doc.clone();
    let mut it = Iter::from_bytes(&mut data);
    let from_memory = fields(&mut it);

    assert_eq!(from_file.1, None);
    assert_eq!(from_file.0.len(), 4 * 5_000);
    assert_eq!(from_file, from_memory);
}

#[test]
fn reader_is_left_open() {
    let mut rdr = io::Cursor::new(b"a,b\nc,d\n".to_vec());
    {
        let mut buf = [0; 16];
        let mut it = Iter::from_reader(&mut rdr, &mut buf).unwrap();
        assert_eq!(
            rows(&mut it),
            vec![
                vec![b"a".to_vec(), b"b".to_vec()],
                vec![b"c".to_vec(), b"d".to_vec()],
            ]
        );
    }
    assert_eq!(rdr.position(), 8);
}

#[test]
fn blank_lines_and_lone_carriage_returns() {
    let mut data = b"a\n\nb\rc,d\r\n".to_vec();
    let mut it = Iter::from_bytes(&mut data);
    assert_eq!(
        rows(&mut it),
        vec![
            vec![b"a".to_vec()],
            vec![b"".to_vec()],
            vec![b"b\rc".to_vec(), b"d".to_vec()],
        ]
    );
}

#[test]
fn errors_are_sticky() {
    let mut data = b"ok,\"bad\"x,more\n".to_vec();
    let mut it = Iter::from_bytes(&mut data);
    let (got, err) = fields(&mut it);
    assert_eq!(got, vec![(b"ok".to_vec(), false, false)]);
    assert_eq!(err, Some(ErrorKind::InvalidQuotes));
    for _ in 0..3 {
        let err = it.next_field().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidQuotes);
    }
    assert!(it.is_done());

    let mut long = vec![b'z'; 300];
    long.push(b'\n');
    let tmp = temp_csv(&long);
    let mut buf = [0; 64];
    let mut it = Iter::from_path(tmp.path(), &mut buf).unwrap();
    assert_eq!(fields(&mut it), (vec![], Some(ErrorKind::FieldTooLong)));
    assert_eq!(it.next_field().unwrap_err().kind(), ErrorKind::FieldTooLong);
}

#[test]
fn unterminated_quote_is_invalid() {
    let mut data = b"a,\"never closed".to_vec();
    let mut it = Iter::from_bytes(&mut data);
    let (got, err) = fields(&mut it);
    assert_eq!(got.len(), 1);
    assert_eq!(err, Some(ErrorKind::InvalidQuotes));
}

/// Feeding the same bytes through a source that splits them arbitrarily
/// must give the same fields (and the same error, if any) as scanning them
/// in place.
#[test]
fn chunking_does_not_change_fields() {
    fn prop(raw: Vec<u8>, splits: Vec<usize>) -> TestResult {
        // Keep the bytes that make CSV interesting.
        let alphabet = b"ab,\"\r\n";
        let doc: Vec<u8> = raw
            .iter()
            .map(|&b| alphabet[b as usize % alphabet.len()])
            .collect();

        let mut data = doc.clone();
        let mut it = Iter::from_bytes(&mut data);
        let want = fields(&mut it);

        let mut rest = &doc[..];
        let mut splits = splits.into_iter();
        let src = |out: &mut [u8]| {
            if rest.is_empty() {
                return ReadResult::eof(0);
            }
            let size = 1 + splits.next().unwrap_or(0) % rest.len();
            let n = std::cmp::min(size, out.len());
            out[..n].copy_from_slice(&rest[..n]);
            rest = &rest[n..];
            ReadResult::ok(n)
        };
        let mut buf = vec![0; doc.len() + 1];
        let mut it = Iter::from_source(src, &mut buf).unwrap();
        let got = fields(&mut it);
        if got != want {
            return TestResult::error(format!(
                "{:?}: {:?} != {:?}",
                String::from_utf8_lossy(&doc),
                got,
                want
            ));
        }
        TestResult::passed()
    }
    QuickCheck::new()
        .tests(1_000)
        .quickcheck(prop as fn(Vec<u8>, Vec<usize>) -> TestResult);
}

/// Quoting and doubling quotes, then parsing and unescaping, gives back the
/// original rows.
#[test]
fn quoted_rows_read_back() {
    fn prop(table: Vec<Vec<String>>) -> TestResult {
        if table.iter().any(|row| row.is_empty()) {
            return TestResult::discard();
        }
        let mut doc = Vec::new();
        for row in &table {
            for (i, field) in row.iter().enumerate() {
                if i > 0 {
                    doc.push(b',');
                }
                if field.contains(|c: char| {
                    c == ',' || c == '"' || c == '\r' || c == '\n'
                }) {
                    doc.push(b'"');
                    let escaped = field.replace('"', "\"\"");
                    doc.extend_from_slice(escaped.as_bytes());
                    doc.push(b'"');
                } else {
                    doc.extend_from_slice(field.as_bytes());
                }
            }
            doc.push(b'\n');
        }
        let want: Vec<Vec<Vec<u8>>> = table
            .iter()
            .map(|row| row.iter().map(|f| f.as_bytes().to_vec()).collect())
            .collect();

        let mut buf = vec![0; doc.len() + 1];
        let mut rdr = &doc[..];
        let mut it = Iter::from_reader(&mut rdr, &mut buf).unwrap();
        TestResult::from_bool(rows(&mut it) == want)
    }
    QuickCheck::new()
        .tests(500)
        .quickcheck(prop as fn(Vec<Vec<String>>) -> TestResult);
}

#[test]
fn demo_file_descriptor() {
    let tmp = temp_csv(DOC.as_bytes());
    let mut cmd = cmd_for_example("file_descriptor");
    cmd.arg(tmp.path());
    let out = cmd_output(&mut cmd);
    let lines: Vec<&str> = out.stdout().lines().collect();
    assert_eq!(
        lines,
        vec![
            "field[0][0] = |a|",
            "field[0][1] = |b|",
            "field[0][2] = |c,d|",
            "field[1][0] = |e|",
            "field[1][1] = |f\"g|",
            "field[1][2] = |h|",
        ]
    );
}

#[test]
fn demo_file_descriptor_invalid_quotes() {
    let tmp = temp_csv(b"x,\"ab\"c\n");
    let mut cmd = cmd_for_example("file_descriptor");
    cmd.arg(tmp.path());
    let out = cmd_output(&mut cmd);
    assert!(out
        .stdout()
        .contains("invalid quotes at row=0, col=1"));
}

#[test]
fn demo_file_descriptor_missing_file() {
    let mut cmd = cmd_for_example("file_descriptor");
    cmd.arg("does/not/exist.csv");
    let out = cmd_output(&mut cmd);
    assert!(!out.stdout_failed().is_empty());
}

#[test]
fn demo_callbacks() {
    let tmp = temp_csv(DOC.as_bytes());
    let mut cmd = cmd_for_example("callbacks");
    cmd.arg(tmp.path());
    let out = cmd_output(&mut cmd);
    let stdout = out.stdout();
    assert!(stdout.contains("field[1][1] = |f\"g|"));
    assert!(stdout.contains("field[1][2] = |h|"));
    assert!(stdout.lines().any(|line| line.starts_with("reads: ")));
}

#[test]
fn demo_callbacks_field_too_long() {
    let mut data = b"short,".to_vec();
    data.extend(std::iter::repeat(b'q').take(100));
    data.push(b'\n');
    let tmp = temp_csv(&data);
    let mut cmd = cmd_for_example("callbacks");
    cmd.arg(tmp.path());
    let out = cmd_output(&mut cmd);
    let stdout = out.stdout();
    assert!(stdout.contains("field[0][0] = |short|"));
    assert!(stdout.contains("> field too long at row=0, col=1"));
}

/// Return the target/debug directory path.
fn debug_dir() -> PathBuf {
    env::current_exe()
        .expect("test binary path")
        .parent()
        .expect("test binary directory")
        .parent()
        .expect("example binary directory")
        .to_path_buf()
}

fn example_bin_dir() -> PathBuf {
    debug_dir().join("examples")
}

/// Return the repo root directory path.
fn repo_dir() -> PathBuf {
    debug_dir()
        .parent()
        .expect("target directory")
        .parent()
        .expect("repo directory")
        .to_path_buf()
}

/// Run a demo binary from the repo root.
fn cmd_for_example(name: &str) -> Command {
    let mut cmd = Command::new(example_bin_dir().join(name));
    cmd.current_dir(repo_dir());
    cmd
}

fn cmd_output(cmd: &mut Command) -> Output {
    cmd.stdout(process::Stdio::piped());
    cmd.stderr(process::Stdio::piped());
    let child = cmd.spawn().expect("command spawns successfully");
    Output::new(cmd, child)
}

struct Output {
    stdout: String,
    stderr: String,
    command: String,
    status: process::ExitStatus,
}

impl Output {
    fn new(cmd: &mut Command, child: process::Child) -> Output {
        let out = child.wait_with_output().expect("command runs successfully");
        let stdout =
            String::from_utf8(out.stdout).expect("valid utf-8 (stdout)");
        let stderr =
            String::from_utf8(out.stderr).expect("valid utf-8 (stderr)");
        Output {
            stdout,
            stderr,
            command: format!("{:?}", cmd),
            status: out.status,
        }
    }

    fn stdout(&self) -> &str {
        if !self.status.success() {
            panic!(
                "\n\n==== {:?} ====\n\
                 command failed but expected success!\
                 \n\ncwd: {}\
                 \n\nstatus: {}\
                 \n\nstdout: {}\
                 \n\nstderr: {}\
                 \n\n=====\n",
                self.command,
                repo_dir().display(),
                self.status,
                self.stdout,
                self.stderr
            );
        }
        &self.stdout
    }

    fn stdout_failed(&self) -> &str {
        if self.status.success() {
            panic!(
                "\n\n==== {:?} ====\n\
                 command succeeded but expected failure!\
                 \n\ncwd: {}\
                 \n\nstatus: {}\
                 \n\nstdout: {}\
                 \n\nstderr: {}\
                 \n\n=====\n",
                self.command,
                repo_dir().display(),
                self.status,
                self.stdout,
                self.stderr
            );
        }
        &self.stdout
    }
}
