//! Run configuration: where grades live inside a team's workbook and how
//! large each ranking view is.

use std::fmt;
use std::str::FromStr;

use anyhow::{Result, bail};

/// File every team folder is expected to contain.
pub const DOCUMENT_NAME: &str = "NotationHackathon.xlsx";

/// Sheet name (compared case-insensitively) that ends grade-sheet scanning.
pub const MARKER_SHEET: &str = "oral";

/// Cell holding the user's domain label on a grade sheet.
pub const DOMAIN_CELL: &str = "B12";

/// Cell holding the user's total grade on a grade sheet.
pub const GRADE_CELL: &str = "C19";

pub const TOP_N: usize = 10;
pub const TOP_TEAMS: usize = 12;
pub const DOMAIN_TOP_K: usize = 3;

pub const DEFAULT_OUTPUT: &str = "summary_report.xlsx";
pub const DEFAULT_CONCURRENCY: usize = 4;

/// A zero-based (row, column) cell position parsed from A1 notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellAddress {
    pub row: u32,
    pub col: u32,
}

impl CellAddress {
    /// Parses an A1-style reference such as `B12` or `aa3`.
    pub fn parse(input: &str) -> Result<Self> {
        let s = input.trim();
        let split = s
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(s.len());
        let (letters, digits) = s.split_at(split);

        if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
            bail!("invalid cell address '{input}': expected column letters");
        }
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            bail!("invalid cell address '{input}': expected a row number");
        }

        let mut col: u32 = 0;
        for c in letters.chars() {
            let v = c.to_ascii_uppercase() as u32 - 'A' as u32 + 1;
            col = match col.checked_mul(26).and_then(|n| n.checked_add(v)) {
                Some(n) => n,
                None => bail!("invalid cell address '{input}': column out of range"),
            };
        }

        let row: u32 = digits.parse()?;
        if row == 0 {
            bail!("invalid cell address '{input}': rows start at 1");
        }

        Ok(Self {
            row: row - 1,
            col: col - 1,
        })
    }
}

impl FromStr for CellAddress {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut letters = Vec::new();
        let mut n = self.col + 1;
        while n > 0 {
            let rem = (n - 1) % 26;
            letters.push((b'A' + rem as u8) as char);
            n = (n - 1) / 26;
        }
        let col: String = letters.into_iter().rev().collect();
        write!(f, "{}{}", col, self.row + 1)
    }
}

/// Settings for one extraction run.
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    pub document_name: String,
    pub marker_sheet: String,
    pub domain_cell: CellAddress,
    pub grade_cell: CellAddress,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            document_name: DOCUMENT_NAME.to_string(),
            marker_sheet: MARKER_SHEET.to_string(),
            domain_cell: CellAddress { row: 11, col: 1 },
            grade_cell: CellAddress { row: 18, col: 2 },
        }
    }
}

impl ExtractConfig {
    /// True when `sheet_name` is the marker that ends grade-sheet scanning.
    pub fn is_marker(&self, sheet_name: &str) -> bool {
        sheet_name.to_lowercase() == self.marker_sheet.to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_default_cells() {
        let domain = CellAddress::parse(DOMAIN_CELL).unwrap();
        let grade = CellAddress::parse(GRADE_CELL).unwrap();
        let config = ExtractConfig::default();

        assert_eq!(domain, config.domain_cell);
        assert_eq!(grade, config.grade_cell);
    }

    #[test]
    fn test_parse_multi_letter_column() {
        assert_eq!(
            CellAddress::parse("aa3").unwrap(),
            CellAddress { row: 2, col: 26 }
        );
        assert_eq!(CellAddress::parse("AB10").unwrap().to_string(), "AB10");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(CellAddress::parse("").is_err());
        assert!(CellAddress::parse("12").is_err());
        assert!(CellAddress::parse("B").is_err());
        assert!(CellAddress::parse("B0").is_err());
        assert!(CellAddress::parse("B1C").is_err());
    }

    #[test]
    fn test_marker_is_case_insensitive() {
        let config = ExtractConfig::default();
        assert!(config.is_marker("Oral"));
        assert!(config.is_marker("ORAL"));
        assert!(!config.is_marker("Oral 2"));
    }
}
