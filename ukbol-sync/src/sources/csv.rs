//! Comma-separated snapshots
//!
//! Reads the spreadsheet dialect: `,` delimiters, `"` quoting with doubled
//! quotes as escapes, and line breaks allowed inside quoted cells. Header
//! names are normalized to lowercase snake case (`Larval feeding guild` →
//! `larval_feeding_guild`).

use crate::error::Result;
use std::io::BufRead;
use ukbol_common::fields::RawRecord;

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Iterator over the data rows of a CSV document with a header row
pub struct CsvRows<R> {
    reader: R,
    header: Vec<String>,
}

impl<R: BufRead> CsvRows<R> {
    /// Read the header row; an empty document has an empty header and no rows
    pub fn new(mut reader: R) -> Result<Self> {
        let header = read_record(&mut reader)?
            .unwrap_or_default()
            .iter()
            .map(|name| header_name(name))
            .collect();
        Ok(Self { reader, header })
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }
}

impl<R: BufRead> Iterator for CsvRows<R> {
    type Item = Result<RawRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let cells = match read_record(&mut self.reader) {
                Ok(cells) => cells?,
                Err(e) => return Some(Err(e)),
            };
            if cells.len() == 1 && cells[0].is_empty() {
                continue;
            }
            let record = self
                .header
                .iter()
                .zip(cells)
                .map(|(column, value)| (column.clone(), value))
                .collect();
            return Some(Ok(record));
        }
    }
}

/// `Broad biotope` → `broad_biotope`
pub fn header_name(name: &str) -> String {
    name.trim_start_matches(BYTE_ORDER_MARK)
        .trim()
        .replace(' ', "_")
        .to_lowercase()
}

/// Read one logical record, following quoted cells across line breaks
fn read_record<R: BufRead>(reader: &mut R) -> Result<Option<Vec<String>>> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Ok(None);
    }

    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut quoted = false;
    loop {
        let mut chars = line.chars().peekable();
        while let Some(c) = chars.next() {
            if quoted {
                match c {
                    '"' if chars.peek() == Some(&'"') => {
                        chars.next();
                        cell.push('"');
                    }
                    '"' => quoted = false,
                    _ => cell.push(c),
                }
            } else {
                match c {
                    '"' => quoted = true,
                    ',' => cells.push(std::mem::take(&mut cell)),
                    '\r' | '\n' => {}
                    _ => cell.push(c),
                }
            }
        }

        if !quoted {
            break;
        }
        line.clear();
        // An unterminated quote runs to the end of the document
        if reader.read_line(&mut line)? == 0 {
            break;
        }
    }
    cells.push(cell);
    Ok(Some(cells))
}
