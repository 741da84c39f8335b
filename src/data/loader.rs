use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use thiserror::Error;

use super::model::{CellValue, Dataset, TIMESTAMP_COLUMN};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failures while reading or parsing an uploaded file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{name}: malformed CSV: {source}")]
    Csv {
        name: String,
        #[source]
        source: csv::Error,
    },

    #[error("unsupported file extension: .{0} (expected .csv)")]
    UnsupportedExtension(String),

    #[error("{name}: file has no header row")]
    Empty { name: String },

    #[error("{name}, row {row}: expected at most {expected} fields, found {found}")]
    RaggedRow {
        name: String,
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("{name}, row {row}: '{value}' cannot be converted to a timestamp")]
    InvalidTimestamp {
        name: String,
        row: usize,
        value: String,
    },
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Read the raw bytes of an upload after checking its extension.
pub fn read_upload(path: &Path) -> Result<Vec<u8>, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    if ext != "csv" {
        return Err(LoadError::UnsupportedExtension(ext));
    }

    std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Load and parse a CSV file from disk.
pub fn load_file(path: &Path) -> Result<Dataset, LoadError> {
    let bytes = read_upload(path)?;
    parse_csv(&display_name(path), &bytes)
}

/// File name shown for an upload.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string())
}

/// Parse CSV bytes into a [`Dataset`].
///
/// The first row is the header. Cell types are guessed per cell. When a
/// `Timestamp` column is present its cells are converted to timestamps; a
/// missing `Timestamp` column is not an error here, the chart pipeline
/// reports it together with the available columns.
pub fn parse_csv(name: &str, bytes: &[u8]) -> Result<Dataset, LoadError> {
    let csv_err = |source| LoadError::Csv {
        name: name.to_string(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let raw_headers: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();
    if raw_headers.is_empty() || raw_headers.iter().all(String::is_empty) {
        return Err(LoadError::Empty {
            name: name.to_string(),
        });
    }
    let headers = dedupe_headers(raw_headers);

    let mut rows: Vec<Vec<CellValue>> = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.map_err(csv_err)?;
        if record.len() > headers.len() {
            return Err(LoadError::RaggedRow {
                name: name.to_string(),
                row: row_no,
                expected: headers.len(),
                found: record.len(),
            });
        }
        rows.push(record.iter().map(guess_cell_type).collect());
    }

    let mut dataset = Dataset::from_rows(name, headers, rows);
    convert_timestamps(&mut dataset)?;

    log::debug!(
        "Parsed {name}: {} rows, columns {:?}",
        dataset.len(),
        dataset.column_names
    );
    Ok(dataset)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Repeated header names get `.1`, `.2`, ... suffixes in order of appearance.
fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    headers
        .into_iter()
        .map(|header| {
            if seen.insert(header.clone()) {
                return header;
            }
            let mut n = 1;
            loop {
                let candidate = format!("{header}.{n}");
                if seen.insert(candidate.clone()) {
                    return candidate;
                }
                n += 1;
            }
        })
        .collect()
}

fn guess_cell_type(raw: &str) -> CellValue {
    let s = raw.trim();
    if s.is_empty() {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return CellValue::Float(f);
    }
    match s {
        "true" | "True" | "TRUE" => CellValue::Bool(true),
        "false" | "False" | "FALSE" => CellValue::Bool(false),
        _ => CellValue::String(raw.to_string()),
    }
}

fn convert_timestamps(dataset: &mut Dataset) -> Result<(), LoadError> {
    let name = dataset.name.clone();
    let Some(column) = dataset.column_mut(TIMESTAMP_COLUMN) else {
        return Ok(());
    };

    for (row, cell) in column.iter_mut().enumerate() {
        let converted = match &*cell {
            CellValue::Null | CellValue::Timestamp(_) => continue,
            CellValue::String(s) => parse_timestamp(s),
            // Bare numbers such as `20240101` are read as compact dates.
            CellValue::Integer(i) => parse_timestamp(&i.to_string()),
            other => parse_timestamp(&other.to_string()),
        };
        match converted {
            Some(ts) => *cell = CellValue::Timestamp(ts),
            None => {
                return Err(LoadError::InvalidTimestamp {
                    name,
                    row,
                    value: cell.to_string(),
                })
            }
        }
    }
    Ok(())
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%Y%m%d"];

/// Convert a timestamp cell. Offsets are normalized to UTC.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn parses_headers_and_guesses_types() {
        let csv = "Timestamp,Temp,Label,Ok\n2024-01-01 00:00:00,21.5,north,true\n2024-01-01 01:00:00,22,,false\n";
        let ds = parse_csv("a.csv", csv.as_bytes()).unwrap();

        assert_eq!(ds.column_names, vec!["Timestamp", "Temp", "Label", "Ok"]);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.column("Temp").unwrap()[0], CellValue::Float(21.5));
        assert_eq!(ds.column("Temp").unwrap()[1], CellValue::Integer(22));
        assert_eq!(ds.column("Label").unwrap()[1], CellValue::Null);
        assert_eq!(ds.column("Ok").unwrap()[0], CellValue::Bool(true));
        assert_eq!(
            ds.timestamps().unwrap()[1],
            CellValue::Timestamp(ts("2024-01-01 01:00:00"))
        );
    }

    #[test]
    fn accepts_common_timestamp_shapes() {
        let expected = ts("2024-03-05 14:30:00");
        for raw in [
            "2024-03-05 14:30:00",
            "2024-03-05T14:30:00",
            "2024-03-05T14:30:00Z",
            "2024-03-05T16:30:00+02:00",
            "2024-03-05 14:30",
            "03/05/2024 14:30",
            "2024/03/05 14:30:00",
        ] {
            assert_eq!(parse_timestamp(raw), Some(expected), "{raw}");
        }
        assert_eq!(parse_timestamp("2024-03-05"), Some(ts("2024-03-05 00:00:00")));
        assert_eq!(parse_timestamp("20240305"), Some(ts("2024-03-05 00:00:00")));
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn fractional_seconds_are_kept() {
        let parsed = parse_timestamp("2024-03-05 14:30:00.250").unwrap();
        assert_eq!(parsed.and_utc().timestamp_subsec_millis(), 250);
    }

    #[test]
    fn invalid_timestamp_reports_row_and_value() {
        let csv = "Timestamp,Temp\n2024-01-01,1\nnot a date,2\n";
        let err = parse_csv("bad.csv", csv.as_bytes()).unwrap_err();
        match err {
            LoadError::InvalidTimestamp { name, row, value } => {
                assert_eq!(name, "bad.csv");
                assert_eq!(row, 1);
                assert_eq!(value, "not a date");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_timestamp_column_still_loads() {
        let ds = parse_csv("b.csv", b"Time,Temp\n1,2\n").unwrap();
        assert!(ds.timestamps().is_none());
        assert_eq!(ds.column_names, vec!["Time", "Temp"]);
    }

    #[test]
    fn duplicate_headers_get_suffixes() {
        let ds = parse_csv("d.csv", b"Timestamp,A,A,A\n2024-01-01,1,2,3\n").unwrap();
        assert_eq!(ds.column_names, vec!["Timestamp", "A", "A.1", "A.2"]);
        assert_eq!(ds.column("A.2").unwrap()[0], CellValue::Integer(3));
    }

    #[test]
    fn rows_longer_than_header_are_rejected() {
        let err = parse_csv("r.csv", b"Timestamp,A\n2024-01-01,1,2\n").unwrap_err();
        assert!(matches!(
            err,
            LoadError::RaggedRow { row: 0, expected: 2, found: 3, .. }
        ));
    }

    #[test]
    fn short_rows_are_padded() {
        let ds = parse_csv("s.csv", b"Timestamp,A,B\n2024-01-01,1\n").unwrap();
        assert_eq!(ds.column("B").unwrap()[0], CellValue::Null);
    }

    #[test]
    fn empty_input_is_rejected() {
        let err = parse_csv("e.csv", b"").unwrap_err();
        assert!(matches!(err, LoadError::Empty { .. }));
    }

    #[test]
    fn load_file_checks_extension_and_reads_disk() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("temps.csv");
        std::fs::write(&csv_path, "Timestamp,Temp\n2024-01-01,3.5\n").unwrap();
        let ds = load_file(&csv_path).unwrap();
        assert_eq!(ds.name, "temps.csv");
        assert_eq!(ds.len(), 1);

        let txt_path = dir.path().join("temps.txt");
        std::fs::write(&txt_path, "Timestamp\n").unwrap();
        assert!(matches!(
            load_file(&txt_path),
            Err(LoadError::UnsupportedExtension(ext)) if ext == "txt"
        ));

        assert!(matches!(
            load_file(&dir.path().join("missing.csv")),
            Err(LoadError::Io { .. })
        ));
    }
}
