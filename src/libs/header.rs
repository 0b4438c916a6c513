//! Header block of a VCF-like file and reconciliation across inputs.
//!
//! A header is a run of meta lines (`##...`) followed by one column line
//! (`#CHROM POS ID REF ALT QUAL FILTER INFO [FORMAT samples...]`). Merging
//! keeps each distinct meta line once, in the order first seen, and replaces
//! the sample columns with the sorted union of every input's samples.

use crate::libs::error::VcfError;
use crate::libs::record::MANDATORY_COLUMNS;
use indexmap::IndexSet;
use std::collections::BTreeSet;
use std::io::{self, BufRead, Write};
use std::path::Path;

pub const META_PREFIX: &str = "##";
pub const COLUMN_PREFIX: &str = "#CHROM";

/// Fixed columns including `FORMAT`.
const FIXED_WITH_FORMAT: usize = MANDATORY_COLUMNS + 1;

const DEFAULT_COLUMNS: [&str; MANDATORY_COLUMNS] = [
    "#CHROM", "POS", "ID", "REF", "ALT", "QUAL", "FILTER", "INFO",
];

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Header {
    pub meta: Vec<String>,
    pub columns: Vec<String>,
}

impl Header {
    /// Reads header lines up to and including the `#CHROM` line.
    ///
    /// Stops early at the first line not starting with `#`, which is handed
    /// back so the caller can treat it as the first data line. A file without
    /// a column line yields an empty `columns`. Bytes that are not UTF-8 are
    /// replaced rather than rejected.
    pub fn read_from<R: BufRead>(reader: &mut R) -> io::Result<(Self, Option<String>)> {
        let mut header = Header::default();

        loop {
            let Some(line) = read_lossy_line(reader)? else {
                return Ok((header, None));
            };
            let text = line.trim_end_matches(['\r', '\n']);

            if text.starts_with(COLUMN_PREFIX) {
                header.columns = text.split('\t').map(str::to_string).collect();
                return Ok((header, None));
            } else if text.starts_with(META_PREFIX) {
                header.meta.push(text.to_string());
            } else if !text.starts_with('#') {
                return Ok((header, Some(line)));
            }
        }
    }

    pub fn fixed_columns(&self) -> &[String] {
        let n = self.columns.len().min(FIXED_WITH_FORMAT);
        &self.columns[..n]
    }

    pub fn samples(&self) -> &[String] {
        self.columns.get(FIXED_WITH_FORMAT..).unwrap_or(&[])
    }

    /// Meta lines followed by the column line, each newline-terminated.
    pub fn to_lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self.meta.iter().map(|m| format!("{}\n", m)).collect();
        if !self.columns.is_empty() {
            lines.push(format!("{}\n", self.columns.join("\t")));
        }
        lines
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for line in self.to_lines() {
            writer.write_all(line.as_bytes())?;
        }
        Ok(())
    }
}

/// Reads one line, terminator kept, decoding invalid UTF-8 lossily.
pub fn read_lossy_line<R: BufRead>(reader: &mut R) -> io::Result<Option<String>> {
    let mut buf = Vec::new();
    if reader.read_until(b'\n', &mut buf)? == 0 {
        return Ok(None);
    }
    Ok(Some(match String::from_utf8(buf) {
        Ok(line) => line,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    }))
}

/// Columns two headers must agree on: the mandatory ones, plus `FORMAT` when
/// both carry it.
fn schema_matches(a: &[String], b: &[String]) -> bool {
    let common = a.len().min(b.len());
    if common < MANDATORY_COLUMNS && a.len() != b.len() {
        return false;
    }
    a[..common] == b[..common]
}

/// Combines the headers of several inputs into one.
///
/// `paths` names the inputs in the same order as `headers` and is only used
/// for error reporting.
pub fn reconcile(headers: &[Header], paths: &[&Path]) -> anyhow::Result<Header> {
    let mut meta: IndexSet<&str> = IndexSet::new();
    let mut samples: BTreeSet<&str> = BTreeSet::new();

    for header in headers {
        meta.extend(header.meta.iter().map(String::as_str));
        samples.extend(header.samples().iter().map(String::as_str));
    }

    let mut columns: Vec<String> = match headers.iter().find(|h| !h.columns.is_empty()) {
        Some(first) => first.fixed_columns().to_vec(),
        None => DEFAULT_COLUMNS.iter().map(|s| s.to_string()).collect(),
    };

    for (i, header) in headers.iter().enumerate() {
        if header.columns.is_empty() {
            continue;
        }
        if !schema_matches(&columns, header.fixed_columns()) {
            let path = paths
                .get(i)
                .map(|p| p.to_path_buf())
                .unwrap_or_default();
            return Err(VcfError::SchemaMismatch {
                path,
                expected: columns.join("\t"),
                found: header.fixed_columns().join("\t"),
            }
            .into());
        }
    }

    if !samples.is_empty() && columns.len() == MANDATORY_COLUMNS {
        columns.push("FORMAT".to_string());
    }
    columns.extend(samples.into_iter().map(str::to_string));

    Ok(Header {
        meta: meta.into_iter().map(str::to_string).collect(),
        columns,
    })
}
