//! CSV reading, schema checks and dataset provenance.

pub mod load;
pub mod records;

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub use load::{validate, Datasets, WorldGeometry};
pub use records::*;

/// Date format used by every dated column.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetManifest {
    pub path: String,
    pub hash_sha256: String,
    pub row_count: u64,
    pub bad_rows: u64,
    pub columns: Vec<String>,
    pub warnings: Vec<String>,
    pub generated_at_epoch: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaReport {
    pub columns: Vec<String>,
    pub expected: Vec<String>,
    pub missing: Vec<String>,
    pub ok: bool,
    pub message: String,
}

/// A parsed CSV file: header plus raw string fields.
#[derive(Debug, Clone)]
pub struct CsvTable {
    pub source: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CsvTable {
    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read dataset {}", path.display()))?;
        Self::parse(&path.display().to_string(), &text)
    }

    pub fn parse(source: &str, text: &str) -> Result<Self> {
        let mut lines = text
            .lines()
            .map(|l| l.trim_start_matches('\u{feff}'))
            .filter(|l| !l.trim().is_empty() && !l.starts_with('#'));
        let header_line = lines
            .next()
            .ok_or_else(|| anyhow!("{}: empty file, no header", source))?;
        let header: Vec<String> = split_csv_line(header_line)
            .into_iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for (idx, line) in lines.enumerate() {
            let fields = split_csv_line(line);
            if fields.len() != header.len() {
                return Err(anyhow!(
                    "{}: row {} has {} fields, header has {}",
                    source,
                    idx + 2,
                    fields.len(),
                    header.len()
                ));
            }
            rows.push(fields);
        }
        Ok(Self {
            source: source.to_string(),
            header,
            rows,
        })
    }

    pub fn column(&self, name: &str) -> Result<usize> {
        self.header
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| anyhow!("{}: missing column {:?} (have {:?})", self.source, name, self.header))
    }

    /// Map every row through `parse`, failing on the first bad row.
    pub fn records<T>(&self, parse: impl Fn(&Row<'_>) -> Result<T>) -> Result<Vec<T>> {
        self.rows
            .iter()
            .enumerate()
            .map(|(idx, fields)| {
                let row = Row {
                    table: self,
                    line: idx + 2,
                    fields,
                };
                parse(&row)
            })
            .collect()
    }
}

pub struct Row<'a> {
    table: &'a CsvTable,
    line: usize,
    fields: &'a [String],
}

impl<'a> Row<'a> {
    pub fn str(&self, column: &str) -> Result<&'a str> {
        let idx = self.table.column(column)?;
        Ok(self.fields[idx].trim())
    }

    pub fn parse<T>(&self, column: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let raw = self.str(column)?;
        raw.parse::<T>().map_err(|e| {
            anyhow!(
                "{}:{}: bad value {:?} in column {:?}: {}",
                self.table.source,
                self.line,
                raw,
                column,
                e
            )
        })
    }

    /// Whole numbers that may have been written as floats (`12.0`).
    pub fn count(&self, column: &str) -> Result<u32> {
        let value: f64 = self.parse(column)?;
        if value < 0.0 || value.fract() != 0.0 || value > u32::MAX as f64 {
            return Err(anyhow!(
                "{}:{}: {:?} is not a count: {}",
                self.table.source,
                self.line,
                column,
                value
            ));
        }
        Ok(value as u32)
    }

    pub fn date(&self, column: &str) -> Result<NaiveDate> {
        let raw = self.str(column)?;
        // Timestamps exported as "2011-01-01 00:00:00" keep only the date part.
        let day = raw.split_whitespace().next().unwrap_or(raw);
        NaiveDate::parse_from_str(day, DATE_FORMAT).map_err(|e| {
            anyhow!(
                "{}:{}: bad date {:?} in column {:?}: {}",
                self.table.source,
                self.line,
                raw,
                column,
                e
            )
        })
    }
}

/// Split one CSV line, honouring double quotes and `""` escapes.
pub fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match (c, in_quotes) {
            ('"', true) if chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            ('"', _) => in_quotes = !in_quotes,
            (',', false) => fields.push(std::mem::take(&mut current)),
            ('\r', false) => {}
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

pub fn read_header(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    for line in text.lines() {
        let trimmed = line.trim_start_matches('\u{feff}').trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        return Ok(split_csv_line(trimmed)
            .into_iter()
            .map(|s| s.trim().to_string())
            .collect());
    }
    Ok(Vec::new())
}

pub fn validate_schema(path: &Path, expected: &[&str]) -> Result<SchemaReport> {
    let header = read_header(path)?;
    let missing: Vec<String> = expected
        .iter()
        .filter(|col| !header.iter().any(|h| h == *col))
        .map(|s| s.to_string())
        .collect();
    let ok = missing.is_empty();
    let message = if ok {
        "schema ok".to_string()
    } else {
        format!("schema mismatch: missing {:?} in {:?}", missing, header)
    };
    Ok(SchemaReport {
        columns: header,
        expected: expected.iter().map(|s| s.to_string()).collect(),
        missing,
        ok,
        message,
    })
}

/// Hash, count rows and record field-count problems without rejecting the file.
pub fn build_manifest(path: &Path, expected: &[&str], now_ts: u64) -> Result<DatasetManifest> {
    let hash = file_sha256(path)?;
    let schema = validate_schema(path, expected)?;
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;

    let mut warnings = Vec::new();
    if !schema.ok {
        warnings.push(schema.message.clone());
    }
    let mut row_count = 0u64;
    let mut bad_rows = 0u64;
    let rows = text
        .lines()
        .filter(|l| !l.trim().is_empty() && !l.starts_with('#'))
        .skip(1);
    for (idx, line) in rows.enumerate() {
        let n = split_csv_line(line).len();
        if n == schema.columns.len() {
            row_count += 1;
        } else {
            bad_rows += 1;
            warnings.push(format!("bad_row {}: {} fields", idx + 2, n));
        }
    }
    if row_count == 0 {
        warnings.push("no_rows".to_string());
    }

    Ok(DatasetManifest {
        path: path.display().to_string(),
        hash_sha256: hash,
        row_count,
        bad_rows,
        columns: schema.columns,
        warnings,
        generated_at_epoch: now_ts,
    })
}

pub fn file_sha256(path: &Path) -> Result<String> {
    let mut file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

pub fn default_manifest_path(dataset_path: &Path) -> PathBuf {
    let mut p = dataset_path.to_path_buf();
    let fname = dataset_path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("dataset.csv");
    p.set_file_name(format!("{}.manifest.json", fname));
    p
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_handles_quotes_and_escapes() {
        let fields = split_csv_line(r#"535,"Bonaire, Sint Eustatius and Saba","say ""hi""",x"#);
        assert_eq!(
            fields,
            vec!["535", "Bonaire, Sint Eustatius and Saba", r#"say "hi""#, "x"]
        );
    }

    #[test]
    fn split_keeps_empty_fields() {
        assert_eq!(split_csv_line("a,,c,"), vec!["a", "", "c", ""]);
    }

    #[test]
    fn table_rejects_ragged_rows() {
        let err = CsvTable::parse("t.csv", "a,b\n1,2\n3\n").unwrap_err();
        assert!(err.to_string().contains("row 3"));
    }

    #[test]
    fn row_parses_dates_with_time_suffix() {
        let table = CsvTable::parse("t.csv", "Year,n\n2011-01-01 00:00:00,3\n").unwrap();
        let years = table.records(|r| r.date("Year")).unwrap();
        assert_eq!(years[0], NaiveDate::from_ymd_opt(2011, 1, 1).unwrap());
    }

    #[test]
    fn count_rejects_fractions_and_negatives() {
        let table = CsvTable::parse("t.csv", "n\n2.5\n-1\n4.0\n").unwrap();
        let parsed: Vec<_> = table
            .rows
            .iter()
            .enumerate()
            .map(|(i, f)| {
                Row {
                    table: &table,
                    line: i + 2,
                    fields: f,
                }
                .count("n")
                .ok()
            })
            .collect();
        assert_eq!(parsed, vec![None, None, Some(4)]);
    }

    #[test]
    fn missing_column_names_the_source() {
        let table = CsvTable::parse("food.csv", "Category\nFood\n").unwrap();
        let err = table.records(|r| r.parse::<f64>("Percent")).unwrap_err();
        assert!(err.to_string().contains("food.csv"));
        assert!(err.to_string().contains("Percent"));
    }
}
