//! Trace file I/O: one request identifier per line, base-10 or base-16, no
//! blank lines. Mirrors `process_trace.cc`'s line-by-line `std::stoull`
//! parsing and `dump_traces.cc`'s one-address-per-line writer.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};

/// The numeral base a trace file's request identifiers are written in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Radix {
    /// Base-10 (`INT` in the CLI surface).
    Decimal,
    /// Base-16 (`HEX` in the CLI surface).
    Hex,
}

impl Radix {
    /// Parse the CLI's `INT`/`HEX` spelling.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "INT" => Some(Self::Decimal),
            "HEX" => Some(Self::Hex),
            _ => None,
        }
    }

    const fn base(self) -> u32 {
        match self {
            Self::Decimal => 10,
            Self::Hex => 16,
        }
    }
}

/// Read a trace file: one request identifier per line in the given `radix`.
/// Blank lines are rejected.
///
/// # Errors
/// Returns an error if the file can't be opened, a line is empty, or a line
/// doesn't parse as a `u64` in the requested radix.
pub fn read_trace(path: &Path, radix: Radix) -> Result<Vec<u64>> {
    let file = File::open(path).with_context(|| format!("opening trace file {}", path.display()))?;
    let reader = BufReader::new(file);

    let mut trace = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("reading line {} of {}", lineno + 1, path.display()))?;
        if line.is_empty() {
            bail!("blank line {} in trace file {}", lineno + 1, path.display());
        }
        let addr = u64::from_str_radix(line.trim(), radix.base())
            .with_context(|| format!("parsing line {} of {} as base-{}", lineno + 1, path.display(), radix.base()))?;
        trace.push(addr);
    }
    Ok(trace)
}

/// Write a trace file: one request identifier per line, base-10, matching
/// `dump_traces.cc`'s `out << id << std::endl` loop.
///
/// # Errors
/// Propagates any I/O error creating or writing the file.
pub fn write_trace(path: &Path, trace: &[u64]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating trace file {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    for &addr in trace {
        writeln!(writer, "{addr}")?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn radix_parses_the_two_documented_spellings() {
        assert_eq!(Radix::parse("INT"), Some(Radix::Decimal));
        assert_eq!(Radix::parse("HEX"), Some(Radix::Hex));
        assert_eq!(Radix::parse("OCTAL"), None);
    }

    #[test]
    fn round_trips_a_decimal_trace_through_a_tempfile() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("iaf-trace-test-{}.trace", std::process::id()));
        write_trace(&path, &[1, 2, 3, 42]).unwrap();
        let read = read_trace(&path, Radix::Decimal).unwrap();
        assert_eq!(read, vec![1, 2, 3, 42]);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn reads_hex_trace_lines() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("iaf-trace-test-hex-{}.trace", std::process::id()));
        let mut f = File::create(&path).unwrap();
        writeln!(f, "ff").unwrap();
        writeln!(f, "10").unwrap();
        drop(f);

        let read = read_trace(&path, Radix::Hex).unwrap();
        assert_eq!(read, vec![255, 16]);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn rejects_blank_lines() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("iaf-trace-test-blank-{}.trace", std::process::id()));
        let mut f = File::create(&path).unwrap();
        writeln!(f, "1").unwrap();
        writeln!(f).unwrap();
        drop(f);

        assert!(read_trace(&path, Radix::Decimal).is_err());
        let _ = std::fs::remove_file(&path);
    }
}
