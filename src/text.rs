//! Plain-text table format shared with the generator and checker programs.
//!
//! Input: one row per line, whitespace-separated integers. Lines holding a
//! single token are row-count headers and are skipped.
//!
//! Output: the order on the first line, then one line per row of 0-based
//! values separated by single spaces.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::Quasigroup;
use crate::error::{QuasigroupError, Result};

/// Numbering of the elements in a text table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexOrigin {
    /// Elements are written as `1..=n`.
    #[default]
    OneBased,
    /// Elements are written as `0..n`.
    ZeroBased,
}

impl IndexOrigin {
    fn offset(self) -> i64 {
        match self {
            IndexOrigin::OneBased => 1,
            IndexOrigin::ZeroBased => 0,
        }
    }
}

impl Quasigroup {
    /// Parses a table from text.
    pub fn parse(source: &str, origin: IndexOrigin) -> Result<Self> {
        Self::read_from(source.as_bytes(), origin)
    }

    /// Parses a table from a file written by a generator program.
    pub fn from_file(path: impl AsRef<Path>, origin: IndexOrigin) -> Result<Self> {
        let file = File::open(path)?;
        Self::read_from(BufReader::new(file), origin)
    }

    /// Parses a table line by line from `reader`.
    ///
    /// Fails with [`QuasigroupError::MalformedInput`] on a non-integer token,
    /// on a row whose length differs from the first row, or when no rows
    /// are present. The parsed grid must then pass [`Quasigroup::validate`].
    pub fn read_from<R: BufRead>(reader: R, origin: IndexOrigin) -> Result<Self> {
        let offset = origin.offset();
        let mut rows: Vec<Vec<i64>> = Vec::new();
        let mut lines: Vec<usize> = Vec::new();
        let mut width = None;

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let lineno = idx + 1;
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() <= 1 {
                continue;
            }

            let row = tokens
                .iter()
                .map(|tok| {
                    tok.parse::<i64>()
                        .ok()
                        .and_then(|v| v.checked_sub(offset))
                        .ok_or_else(|| QuasigroupError::MalformedInput {
                            line: lineno,
                            reason: format!("invalid value: {}", tok),
                        })
                })
                .collect::<Result<Vec<_>>>()?;

            match width {
                None => width = Some(row.len()),
                Some(w) if w != row.len() => {
                    return Err(QuasigroupError::MalformedInput {
                        line: lineno,
                        reason: format!("row has {} values, expected {}", row.len(), w),
                    });
                }
                Some(_) => {}
            }
            rows.push(row);
            lines.push(lineno);
        }

        Self::from_numbered_rows(&rows, |r| lines[r])
    }

    /// Writes the table in the checker's input format.
    pub fn export<W: Write>(&self, mut writer: W) -> Result<()> {
        writeln!(writer, "{}", self.order())?;
        for r in 0..self.order() {
            let line = self
                .row(r)
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(" ");
            writeln!(writer, "{}", line)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Writes the table to `path`, replacing any existing file.
    pub fn export_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path)?;
        self.export(BufWriter::new(file))
    }
}
