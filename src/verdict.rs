//! Verdicts read back from the external checker programs.

use std::fmt;

use crate::error::{QuasigroupError, Result};

/// Final line printed by the subgroup checker when no proper subgroup exists.
pub const NO_SUBGROUPS: &str = "Easy: No subgroups";

/// Line of the affinity report (0-based) that mentions affinity.
const AFFINITY_LINE: usize = 4;
/// Line of the affinity report (0-based) that mentions simplicity.
const SIMPLICITY_LINE: usize = 8;

/// Outcome of the subgroup checker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubgroupVerdict {
    NoSubgroups,
    /// Any other final line, kept verbatim for diagnostics.
    Other(String),
}

impl SubgroupVerdict {
    /// Reads the verdict from the last non-empty line of the checker's
    /// standard output.
    pub fn from_output(stdout: &str) -> Self {
        let last = stdout
            .lines()
            .map(str::trim_end)
            .rfind(|line| !line.is_empty())
            .unwrap_or("");
        if last == NO_SUBGROUPS {
            SubgroupVerdict::NoSubgroups
        } else {
            SubgroupVerdict::Other(last.to_string())
        }
    }

    /// Whether the trial should go on to the affinity check.
    pub fn proceed(&self) -> bool {
        matches!(self, SubgroupVerdict::NoSubgroups)
    }
}

/// Properties read from the affinity checker's report file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AffinityReport {
    pub not_affine: bool,
    pub one_simple: bool,
}

impl AffinityReport {
    /// Parses the fixed-layout report.
    ///
    /// Line 5 says "not affin..." for a non-affine quasigroup and line 9
    /// says "simple" for a 1-simple one.
    pub fn parse(text: &str) -> Result<Self> {
        let lines: Vec<&str> = text.lines().collect();
        if lines.len() <= SIMPLICITY_LINE {
            return Err(QuasigroupError::MalformedInput {
                line: lines.len(),
                reason: format!(
                    "affinity report has {} lines, expected at least {}",
                    lines.len(),
                    SIMPLICITY_LINE + 1
                ),
            });
        }
        Ok(Self {
            not_affine: lines[AFFINITY_LINE].contains("not affin"),
            one_simple: lines[SIMPLICITY_LINE].contains("simple"),
        })
    }
}

/// One completed trial, shaped like a row of the `experiments` table.
#[derive(Debug, Clone, PartialEq)]
pub struct Trial {
    pub generator: String,
    /// Seconds spent deriving the simple form.
    pub exec_time: f64,
    pub order: usize,
    pub not_affine: bool,
    pub one_simple: bool,
}

impl Trial {
    /// Builds the record an experiment driver stores after a trial whose
    /// subgroup verdict allowed the affinity check.
    pub fn new(
        generator: impl Into<String>,
        exec_time: f64,
        order: usize,
        report: AffinityReport,
    ) -> Self {
        Self {
            generator: generator.into(),
            exec_time,
            order,
            not_affine: report.not_affine,
            one_simple: report.one_simple,
        }
    }
}

impl fmt::Display for Trial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} order={} time={:.6}s not_affine={} one_simple={}",
            self.generator, self.order, self.exec_time, self.not_affine, self.one_simple
        )
    }
}
