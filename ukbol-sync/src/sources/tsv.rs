//! Tab-separated sources
//!
//! Rows are split on tabs with no quote handling at all: snapshot exports
//! contain stray `"` characters that a quoting reader would choke on.

use super::{FieldMapping, RecordSource, RecordStream};
use crate::error::{Result, SyncError};
use async_stream::try_stream;
use flate2::read::GzDecoder;
use futures::Stream;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines, Read};
use std::path::{Path, PathBuf};
use tar::{Archive, Entry};
use tracing::info;
use ukbol_common::fields::RawRecord;

/// Iterator over the data rows of a TSV document with a header row
pub struct TsvRows<R> {
    lines: Lines<R>,
    header: Vec<String>,
}

impl<R: BufRead> TsvRows<R> {
    /// Read the header row; an empty document has an empty header and no rows
    pub fn new(reader: R) -> Result<Self> {
        let mut lines = reader.lines();
        let header = match lines.next() {
            Some(line) => split_row(&line?).map(str::to_string).collect(),
            None => Vec::new(),
        };
        Ok(Self { lines, header })
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }
}

impl<R: BufRead> Iterator for TsvRows<R> {
    type Item = Result<RawRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            if line.trim().is_empty() {
                continue;
            }
            // Short rows leave trailing columns absent; extra cells are ignored
            let record = self
                .header
                .iter()
                .zip(split_row(&line))
                .map(|(column, value)| (column.clone(), value.to_string()))
                .collect();
            return Some(Ok(record));
        }
    }
}

fn split_row(line: &str) -> impl Iterator<Item = &str> {
    line.strip_suffix('\r').unwrap_or(line).split('\t')
}

/// Find the first archive member whose path ends with `suffix`
pub fn find_member<'a, R: Read>(
    archive: &'a mut Archive<R>,
    suffix: &str,
) -> Result<Option<(String, Entry<'a, R>)>> {
    for entry in archive.entries()? {
        let entry = entry?;
        let name = entry.path()?.to_string_lossy().into_owned();
        if name.ends_with(suffix) {
            return Ok(Some((name, entry)));
        }
    }
    Ok(None)
}

/// Open a `.tar.gz` file for sequential reading
pub fn open_tar_gz(path: &Path) -> Result<Archive<GzDecoder<File>>> {
    let file = File::open(path)?;
    Ok(Archive::new(GzDecoder::new(file)))
}

/// Plain TSV file with a header row
pub struct TsvSource {
    path: PathBuf,
    mapping: FieldMapping,
}

impl TsvSource {
    pub fn new(path: impl Into<PathBuf>, mapping: FieldMapping) -> Self {
        Self {
            path: path.into(),
            mapping,
        }
    }

    fn rows(&self) -> impl Stream<Item = Result<RawRecord>> + '_ {
        try_stream! {
            info!(path = %self.path.display(), "Reading taxonomy TSV");
            let file = File::open(&self.path)?;
            for row in TsvRows::new(BufReader::new(file))? {
                yield row?;
            }
        }
    }
}

impl RecordSource for TsvSource {
    fn describe(&self) -> String {
        format!("TSV file {}", self.path.display())
    }

    fn mapping(&self) -> FieldMapping {
        self.mapping
    }

    fn records(&self) -> RecordStream<'_> {
        Box::pin(self.rows())
    }
}

/// TSV member inside a `.tar.gz` archive (e.g. a Darwin Core Archive export)
pub struct ArchiveSource {
    path: PathBuf,
    member_suffix: String,
    mapping: FieldMapping,
}

impl ArchiveSource {
    pub fn new(path: impl Into<PathBuf>, member_suffix: impl Into<String>, mapping: FieldMapping) -> Self {
        Self {
            path: path.into(),
            member_suffix: member_suffix.into(),
            mapping,
        }
    }

    fn rows(&self) -> impl Stream<Item = Result<RawRecord>> + '_ {
        try_stream! {
            let mut archive = open_tar_gz(&self.path)?;
            let (name, entry) = find_member(&mut archive, &self.member_suffix)?
                .ok_or_else(|| SyncError::MissingMember {
                    archive: self.path.clone(),
                    suffix: self.member_suffix.clone(),
                })?;

            info!(archive = %self.path.display(), member = %name, "Reading taxonomy archive member");
            for row in TsvRows::new(BufReader::new(entry))? {
                yield row?;
            }
        }
    }
}

impl RecordSource for ArchiveSource {
    fn describe(&self) -> String {
        format!("archive {} ({})", self.path.display(), self.member_suffix)
    }

    fn mapping(&self) -> FieldMapping {
        self.mapping
    }

    fn records(&self) -> RecordStream<'_> {
        Box::pin(self.rows())
    }
}
