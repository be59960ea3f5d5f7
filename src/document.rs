//! Spreadsheet reader used by the extractor.
//!
//! [`DocumentReader`] opens a team workbook, [`Document`] exposes its ordered
//! sheet names and single-cell lookups. [`XlsxReader`] implements both on top
//! of calamine.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use calamine::{Data, Range, Reader, Sheets, open_workbook_auto};

use crate::config::CellAddress;
use crate::records::RawValue;

/// An opened workbook.
pub trait Document {
    /// Sheet names in the workbook's own order.
    fn sheet_names(&self) -> Vec<String>;

    /// Value at `address` on `sheet`, or [`RawValue::Empty`] when the cell is blank.
    fn cell(&mut self, sheet: &str, address: CellAddress) -> Result<RawValue>;
}

/// Opens workbooks from disk.
pub trait DocumentReader: Send + Sync {
    type Doc: Document;

    fn open(&self, path: &Path) -> Result<Self::Doc>;
}

/// calamine-backed reader for `.xlsx` (and the other formats calamine detects).
#[derive(Debug, Default, Clone, Copy)]
pub struct XlsxReader;

impl DocumentReader for XlsxReader {
    type Doc = XlsxDocument;

    fn open(&self, path: &Path) -> Result<XlsxDocument> {
        let sheets = open_workbook_auto(path)
            .with_context(|| format!("failed to open workbook {}", path.display()))?;
        Ok(XlsxDocument {
            sheets,
            loaded: None,
        })
    }
}

pub struct XlsxDocument {
    sheets: Sheets<BufReader<File>>,
    // Last worksheet range read; grade sheets are read cell after cell.
    loaded: Option<(String, Range<Data>)>,
}

impl XlsxDocument {
    fn range(&mut self, sheet: &str) -> Result<&Range<Data>> {
        let cached = matches!(&self.loaded, Some((name, _)) if name == sheet);
        if !cached {
            let range = self
                .sheets
                .worksheet_range(sheet)
                .with_context(|| format!("failed to read sheet '{sheet}'"))?;
            self.loaded = Some((sheet.to_string(), range));
        }

        match &self.loaded {
            Some((_, range)) => Ok(range),
            None => anyhow::bail!("sheet '{sheet}' was not loaded"),
        }
    }
}

impl Document for XlsxDocument {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.sheet_names()
    }

    fn cell(&mut self, sheet: &str, address: CellAddress) -> Result<RawValue> {
        let range = self.range(sheet)?;
        Ok(range
            .get_value((address.row, address.col))
            .map(raw_value)
            .unwrap_or(RawValue::Empty))
    }
}

/// Maps a calamine cell into the closed [`RawValue`] variant.
pub fn raw_value(data: &Data) -> RawValue {
    match data {
        Data::Int(i) => RawValue::Number(*i as f64),
        Data::Float(f) => RawValue::Number(*f),
        Data::String(s) if s.is_empty() => RawValue::Empty,
        Data::String(s) => RawValue::Text(s.clone()),
        Data::Empty => RawValue::Empty,
        other => RawValue::Other(other.to_string()),
    }
}
