//! Coverage report parsing and threshold checks.
//!
//! Coverage tools are driven through shell commands and only their text
//! report is interpreted. The text convention lives behind
//! [`CoverageReportParser`] so a different tool only needs a different parser.

/// First token of the summary row in the text report.
pub const TOTAL_MARKER: &str = "TOTAL";

/// Aggregate coverage extracted from a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverageSummary {
    /// Line coverage, 0-100.
    pub line_percent: u32,
}

/// Extracts a [`CoverageSummary`] from a coverage tool's text output.
pub trait CoverageReportParser {
    /// Returns None when the report carries no recognisable summary.
    fn parse(&self, report: &str) -> Option<CoverageSummary>;
}

/// Parser for gcovr-style reports ending in a row like `TOTAL 120 115 95%`.
///
/// The first line whose first whitespace-separated token is `TOTAL` is the
/// summary row; its first token ending in `%` is the line percentage.
/// Fractional percentages are truncated (`87.9%` reads as 87).
#[derive(Debug, Clone, Copy, Default)]
pub struct TotalLineParser;

impl CoverageReportParser for TotalLineParser {
    fn parse(&self, report: &str) -> Option<CoverageSummary> {
        let line = report
            .lines()
            .find(|line| line.split_whitespace().next() == Some(TOTAL_MARKER))?;

        let token = line.split_whitespace().find(|token| token.ends_with('%'))?;
        let number = token.strip_suffix('%')?;

        let line_percent = match number.parse::<u32>() {
            Ok(value) => value,
            Err(_) => {
                let value = number.parse::<f64>().ok()?;
                if !(0.0..=100.0).contains(&value) {
                    return None;
                }
                value.trunc() as u32
            }
        };

        Some(CoverageSummary { line_percent })
    }
}

/// Parse with the default [`TotalLineParser`].
pub fn parse(report: &str) -> Option<CoverageSummary> {
    TotalLineParser.parse(report)
}

/// True iff the summary meets the minimum line coverage.
pub fn check_threshold(summary: &CoverageSummary, min_line_percent: u32) -> bool {
    summary.line_percent >= min_line_percent
}

#[cfg(test)]
mod tests {
    use super::*;

    const GCOVR_REPORT: &str = "\
------------------------------------------------------------------------------
                           GCC Code Coverage Report
Directory: ..
------------------------------------------------------------------------------
File                                       Lines    Exec  Cover   Missing
------------------------------------------------------------------------------
src/calc.cpp                                  40      38    95%   12,19
src/parser.cpp                                80      77    96%   4,8,15
------------------------------------------------------------------------------
TOTAL                                        120     115    95%
------------------------------------------------------------------------------
";

    #[test]
    fn test_parse_total_line() {
        let summary = parse("TOTAL 120 115 95%").unwrap();
        assert_eq!(summary.line_percent, 95);
    }

    #[test]
    fn test_parse_full_gcovr_report_ignores_per_file_rows() {
        let summary = parse(GCOVR_REPORT).unwrap();
        assert_eq!(summary, CoverageSummary { line_percent: 95 });
    }

    #[test]
    fn test_no_total_line_is_none() {
        assert_eq!(parse("src/calc.cpp 40 38 95%\n"), None);
        assert_eq!(parse(""), None);
    }

    #[test]
    fn test_total_must_be_first_token() {
        assert_eq!(parse("GRAND TOTAL 10 10 100%"), None);
        assert_eq!(parse("TOTALS 10 10 100%"), None);
    }

    #[test]
    fn test_total_without_percentage_is_none() {
        assert_eq!(parse("TOTAL 120 115\n"), None);
    }

    #[test]
    fn test_first_percentage_token_wins() {
        let summary = parse("TOTAL 120 115 95% 80%").unwrap();
        assert_eq!(summary.line_percent, 95);
    }

    #[test]
    fn test_fractional_percentage_is_truncated() {
        let summary = parse("TOTAL 120 115 87.9%").unwrap();
        assert_eq!(summary.line_percent, 87);
    }

    #[test]
    fn test_garbage_percentage_is_none() {
        assert_eq!(parse("TOTAL 1 1 abc%"), None);
        assert_eq!(parse("TOTAL 1 1 %"), None);
    }

    #[test]
    fn test_check_threshold_boundaries() {
        assert!(check_threshold(&CoverageSummary { line_percent: 95 }, 95));
        assert!(!check_threshold(&CoverageSummary { line_percent: 94 }, 95));
        assert!(check_threshold(&CoverageSummary { line_percent: 0 }, 0));
        assert!(check_threshold(&CoverageSummary { line_percent: 100 }, 100));
    }
}
