//! Raw record field extraction
//!
//! Source feeds hand us loosely typed field→string mappings. Every typed value
//! the pipeline uses is pulled out through [`field`], so the defaulting rules
//! live in one place:
//! - surrounding whitespace is trimmed
//! - empty strings and the sentinels `None` / `null` count as absent
//! - lowercasing is opt-in (names, ranks and country codes are matched lowercase)

use std::collections::HashMap;

/// One raw row from a record source, keyed by source field name
pub type RawRecord = HashMap<String, String>;

/// Values some upstream exports use to mean "no value"
const MISSING_MARKERS: [&str; 2] = ["None", "null"];

/// How to treat the extracted value's case
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Case {
    Keep,
    Lower,
}

/// Extract and normalize one field from a raw record
pub fn field(record: &RawRecord, column: &str, case: Case) -> Option<String> {
    record.get(column).and_then(|value| normalize(value, case))
}

/// Normalize a single raw value, returning `None` when it is missing
pub fn normalize(value: &str, case: Case) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() || MISSING_MARKERS.contains(&trimmed) {
        return None;
    }
    Some(match case {
        Case::Keep => trimmed.to_string(),
        Case::Lower => trimmed.to_lowercase(),
    })
}
