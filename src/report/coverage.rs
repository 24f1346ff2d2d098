#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use serde::{Deserialize, Serialize};

use crate::{error::EvalError, parsers::parser};

/// Column of `LINE_MISSED` in a JaCoCo CSV report.
const LINE_MISSED_COLUMN: usize = 7;
/// Column of `LINE_COVERED` in a JaCoCo CSV report.
const LINE_COVERED_COLUMN: usize = 8;

/// Line counters of one JaCoCo row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineCounts {
    /// Lines never executed.
    pub missed:  u64,
    /// Lines executed at least once.
    pub covered: u64,
}

impl LineCounts {
    /// Picks `LINE_MISSED` and `LINE_COVERED` out of the cells of one row.
    pub fn from_cells(cells: &[&str]) -> Result<Self, &'static str> {
        let number = |idx: usize| -> Result<u64, &'static str> {
            cells
                .get(idx)
                .ok_or("at least 9 columns")?
                .trim()
                .parse::<u64>()
                .map_err(|_| "numeric line counters")
        };
        Ok(Self {
            missed:  number(LINE_MISSED_COLUMN)?,
            covered: number(LINE_COVERED_COLUMN)?,
        })
    }
}

/// Line coverage of one build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageResult {
    /// Lines never executed.
    pub lines_missed:          u64,
    /// Lines executed at least once.
    pub lines_covered:         u64,
    /// `floor(covered / (covered + missed) * 100)`, 0 when there are no lines.
    pub percent_line_coverage: u8,
}

impl CoverageResult {
    /// Computes the percentage from summed counters.
    pub fn from_counts(counts: LineCounts) -> Self {
        let total = counts.missed + counts.covered;
        let percent = if total == 0 {
            0
        } else {
            (counts.covered * 100 / total) as u8
        };
        Self {
            lines_missed:          counts.missed,
            lines_covered:         counts.covered,
            percent_line_coverage: percent,
        }
    }
}

/// Parses a JaCoCo CSV report: the header is skipped and the line counters of
/// every class row are summed.
pub fn parse_jacoco_csv(text: &str) -> Result<CoverageResult, EvalError> {
    let mut lines = text.lines().filter(|line| !line.trim().is_empty());
    let header = lines
        .next()
        .ok_or_else(|| EvalError::malformed_coverage("empty report"))?;
    if !header.contains("LINE_MISSED") {
        return Err(EvalError::malformed_coverage("missing JaCoCo header"));
    }

    let mut total = LineCounts::default();
    for (idx, line) in lines.enumerate() {
        let counts = parser::jacoco_row(line).map_err(|e| {
            EvalError::malformed_coverage(format!("row {} is not a JaCoCo row ({e})", idx + 1))
        })?;
        total.missed += counts.missed;
        total.covered += counts.covered;
    }

    Ok(CoverageResult::from_counts(total))
}

/// Coverage of a build: the first supplied report wins, absent when none was
/// supplied.
pub fn extract<S: AsRef<str>>(reports: &[S]) -> Result<Option<CoverageResult>, EvalError> {
    reports
        .first()
        .map(|report| parse_jacoco_csv(report.as_ref()))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "GROUP,PACKAGE,CLASS,INSTRUCTION_MISSED,INSTRUCTION_COVERED,\
                          BRANCH_MISSED,BRANCH_COVERED,LINE_MISSED,LINE_COVERED,\
                          COMPLEXITY_MISSED,COMPLEXITY_COVERED,METHOD_MISSED,METHOD_COVERED";

    #[test]
    fn sums_rows_and_floors() {
        let csv = format!(
            "{HEADER}\nsample,org.x,Main,10,50,2,4,1,5,2,6,1,3\nsample,org.x,Util,0,20,0,0,0,1,0,2,0,2\n"
        );
        let coverage = parse_jacoco_csv(&csv).expect("valid csv");
        assert_eq!(coverage.lines_missed, 1);
        assert_eq!(coverage.lines_covered, 6);
        // 6 / 7 = 85.71..
        assert_eq!(coverage.percent_line_coverage, 85);
    }

    #[test]
    fn no_lines_means_zero_percent() {
        let coverage = parse_jacoco_csv(HEADER).expect("header only");
        assert_eq!(coverage.percent_line_coverage, 0);
    }

    #[test]
    fn short_rows_are_malformed() {
        let csv = format!("{HEADER}\nsample,org.x,Main,10");
        assert!(matches!(parse_jacoco_csv(&csv), Err(EvalError::MalformedCoverage { .. })));
    }

    #[test]
    fn only_the_first_report_counts() {
        let full = format!("{HEADER}\ns,p,A,0,0,0,0,0,4,0,0,0,0");
        let none = format!("{HEADER}\ns,p,A,0,0,0,0,4,0,0,0,0,0");
        let coverage = extract(&[full, none]).unwrap().unwrap();
        assert_eq!(coverage.percent_line_coverage, 100);
        assert!(extract::<String>(&[]).unwrap().is_none());
    }
}
