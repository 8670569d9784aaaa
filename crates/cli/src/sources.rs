//! Log file discovery.
//!
//! A run takes either a single log file or a directory; directory entries are
//! processed in natural order so `part2` precedes `part10`.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use contracts::MessageSource;

use crate::error::{CliError, Result};

/// Resolve `path` into the ordered list of log files to read
pub fn collect_sources(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        return Err(CliError::source_not_found(path));
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(path)? {
        let entry_path = entry?.path();
        if entry_path.is_file() && ingestion::is_supported(&entry_path) {
            files.push(entry_path);
        }
    }
    if files.is_empty() {
        return Err(CliError::no_sources(path));
    }

    files.sort_by(|a, b| natural_cmp(&a.to_string_lossy(), &b.to_string_lossy()));
    Ok(files)
}

/// Open every file as a message source, in order
pub fn open_sources(files: &[PathBuf]) -> Result<Vec<Box<dyn MessageSource>>> {
    files
        .iter()
        .map(|file| {
            ingestion::open_source(file).map_err(|e| CliError::open_source(file, e.to_string()))
        })
        .collect()
}

/// Compare strings treating digit runs as numbers
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut a = a.chars().peekable();
    let mut b = b.chars().peekable();

    loop {
        match (a.peek().copied(), b.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let left = take_digits(&mut a);
                let right = take_digits(&mut b);
                let ord = compare_digit_runs(&left, &right);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(x), Some(y)) => {
                if x != y {
                    return x.cmp(&y);
                }
                a.next();
                b.next();
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.next_if(char::is_ascii_digit) {
        run.push(c);
    }
    run
}

fn compare_digit_runs(a: &str, b: &str) -> Ordering {
    let a_trimmed = a.trim_start_matches('0');
    let b_trimmed = b.trim_start_matches('0');
    a_trimmed
        .len()
        .cmp(&b_trimmed.len())
        .then_with(|| a_trimmed.cmp(b_trimmed))
        .then_with(|| a.len().cmp(&b.len()))
}
