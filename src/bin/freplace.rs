use std::borrow::Cow;
use std::collections::HashSet;
use std::ffi::OsString;
use std::io::{self, BufWriter, Write};
#[cfg(unix)]
use std::mem::ManuallyDrop;
#[cfg(unix)]
use std::os::unix::io::FromRawFd;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::Context;
use clap::{ArgAction, Parser};
use rayon::prelude::*;

use freplace_rs::common::io::{FileData, read_file, read_stdin, write_file_atomic};
use freplace_rs::common::io_error_msg;
use freplace_rs::replace::{Replacer, unescape};

/// 2-3x faster than glibc malloc for the many small trie node allocations.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(
    name = "freplace",
    version,
    about = "Replace several byte strings at once, in a single pass",
    override_usage = "freplace [OPTION]... -p OLD NEW [-p OLD NEW]... [FILE]..."
)]
struct Cli {
    /// Replace OLD with NEW; earlier pairs win when several match at one position
    #[arg(
        short = 'p',
        long = "pair",
        value_names = ["OLD", "NEW"],
        num_args = 2,
        action = ArgAction::Append,
        allow_hyphen_values = true,
        required = true
    )]
    pairs: Vec<OsString>,

    /// Interpret backslash escapes (\n, \t, \NNN, \xHH, ...) in OLD and NEW
    #[arg(short = 'e', long = "escapes")]
    escapes: bool,

    /// Rewrite each FILE in place instead of printing to standard output
    #[arg(short = 'i', long = "in-place")]
    in_place: bool,

    /// Input files; with none, or when FILE is -, read standard input
    files: Vec<String>,
}

fn build_replacer(cli: &Cli) -> anyhow::Result<Replacer> {
    let oldnew: Vec<Vec<u8>> = cli
        .pairs
        .iter()
        .map(|arg| {
            let bytes = arg.as_encoded_bytes();
            if cli.escapes {
                unescape(bytes)
            } else {
                bytes.to_vec()
            }
        })
        .collect();
    Replacer::try_new(&oldnew).context("invalid replacement pairs")
}

/// Enlarge pipe buffers on Linux for higher throughput.
#[cfg(target_os = "linux")]
fn enlarge_pipes() {
    for &fd in &[0i32, 1] {
        for &size in &[8 * 1024 * 1024i32, 1024 * 1024, 256 * 1024] {
            if unsafe { libc::fcntl(fd, libc::F_SETPIPE_SZ, size) } > 0 {
                break;
            }
        }
    }
}

fn load(filename: &str) -> io::Result<FileData> {
    if filename == "-" {
        read_stdin().map(FileData::Owned)
    } else {
        read_file(Path::new(filename))
    }
}

fn display_name(filename: &str) -> &str {
    if filename == "-" { "standard input" } else { filename }
}

/// Transform one file and write it back. Returns whether it changed.
/// The new content replaces the file by rename, so a failed write leaves
/// the original intact.
fn rewrite_file(replacer: &Replacer, filename: &str) -> io::Result<bool> {
    let path = Path::new(filename);
    let data = read_file(path)?;
    match replacer.replace_bytes(&data) {
        Cow::Borrowed(_) => Ok(false),
        Cow::Owned(out) => write_file_atomic(path, &out).map(|_| true),
    }
}

/// Drop repeated in-place targets, keeping first occurrences in order.
/// Two spellings of one file count as the same target.
fn unique_targets(files: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    files
        .into_iter()
        .filter(|f| {
            let key = std::fs::canonicalize(f).unwrap_or_else(|_| PathBuf::from(f));
            seen.insert(key)
        })
        .collect()
}

/// Rewrite all files in parallel; the replacer is shared read-only.
/// Returns false if any file failed.
fn run_in_place(replacer: &Replacer, files: &[String]) -> bool {
    let results: Vec<(&String, io::Result<bool>)> = files
        .par_iter()
        .map(|f| (f, rewrite_file(replacer, f)))
        .collect();

    let mut ok = true;
    for (filename, result) in results {
        if let Err(e) = result {
            eprintln!("freplace: {}: {}", filename, io_error_msg(&e));
            ok = false;
        }
    }
    ok
}

/// Stream every input through the replacer to `out`.
/// Unreadable inputs are reported and skipped; write errors abort.
fn run_to_stdout(
    replacer: &Replacer,
    files: &[String],
    out: &mut impl Write,
) -> anyhow::Result<bool> {
    let mut ok = true;
    for filename in files {
        let data = match load(filename) {
            Ok(d) => d,
            Err(e) => {
                eprintln!("freplace: {}: {}", display_name(filename), io_error_msg(&e));
                ok = false;
                continue;
            }
        };
        replacer.write_to(&mut *out, &data).context("write error")?;
    }
    out.flush().context("write error")?;
    Ok(ok)
}

fn run(cli: &Cli) -> anyhow::Result<bool> {
    let replacer = build_replacer(cli)?;

    let files: Vec<String> = if cli.files.is_empty() {
        vec!["-".to_string()]
    } else {
        cli.files.clone()
    };

    let (in_place, streamed): (Vec<String>, Vec<String>) = if cli.in_place {
        files.into_iter().partition(|f| f != "-")
    } else {
        (Vec::new(), files)
    };

    let mut ok = run_in_place(&replacer, &unique_targets(in_place));
    if streamed.is_empty() {
        return Ok(ok);
    }

    #[cfg(unix)]
    let stdout_raw = unsafe { ManuallyDrop::new(std::fs::File::from_raw_fd(1)) };
    #[cfg(unix)]
    let mut out = BufWriter::with_capacity(256 * 1024, &*stdout_raw);
    #[cfg(not(unix))]
    let stdout = io::stdout();
    #[cfg(not(unix))]
    let mut out = BufWriter::with_capacity(256 * 1024, stdout.lock());

    ok &= run_to_stdout(&replacer, &streamed, &mut out)?;
    Ok(ok)
}

/// Render an error chain GNU-style: "context: reason", without os error codes.
fn describe(e: &anyhow::Error) -> String {
    match e.root_cause().downcast_ref::<io::Error>() {
        Some(io_err) => format!("{}: {}", e, io_error_msg(io_err)),
        None => format!("{:#}", e),
    }
}

fn is_broken_pipe(e: &anyhow::Error) -> bool {
    e.root_cause()
        .downcast_ref::<io::Error>()
        .is_some_and(|io_err| io_err.kind() == io::ErrorKind::BrokenPipe)
}

fn main() {
    freplace_rs::common::reset_sigpipe();

    #[cfg(target_os = "linux")]
    enlarge_pipes();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) if is_broken_pipe(&e) => process::exit(0),
        Err(e) => {
            eprintln!("freplace: {}", describe(&e));
            process::exit(1);
        }
    }
}
