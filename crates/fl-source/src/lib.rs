//! Movement log readers.
//!
//! Reads JSONL exports of the movement sheet into [`RawEvent`]s for the
//! reconciliation engine. Each non-blank line holds one row object, either in
//! sheet shape ([`SheetRow`]) or already in event shape.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use fl_core::{KindLabels, RawEvent};
use serde_json::{Map, Value};
use thiserror::Error;

mod row;

pub use row::{SheetRow, decode_row};

/// Buffer size for `BufReader` (64KB).
const BUFFER_SIZE: usize = 64 * 1024;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("failed to open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid row on line {line}: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Where to read rows from and how to read their kind column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceConfig {
    /// Input file; `None` reads standard input.
    pub path: Option<PathBuf>,
    pub labels: KindLabels,
    /// Fail on the first unreadable line instead of skipping it.
    pub strict: bool,
}

/// Rows read from one source.
#[derive(Debug, Default)]
pub struct Batch {
    /// Decoded rows, in file order.
    pub events: Vec<RawEvent>,
    /// 1-based line number of each entry in `events`.
    pub lines: Vec<usize>,
    /// Lines skipped because they were not valid row objects.
    pub unreadable: Vec<SourceError>,
}

impl Batch {
    /// Line number of the event at `index`.
    pub fn line_of(&self, index: usize) -> Option<usize> {
        self.lines.get(index).copied()
    }
}

/// Reads a batch from any buffered reader.
pub fn read_batch<R: BufRead>(reader: R, config: &SourceConfig) -> Result<Batch, SourceError> {
    let mut batch = Batch::default();

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let decoded = serde_json::from_str::<Map<String, Value>>(trimmed)
            .and_then(|object| decode_row(object, &config.labels));
        match decoded {
            Ok(event) => {
                batch.events.push(event);
                batch.lines.push(line_no);
            }
            Err(source) => {
                let err = SourceError::Json {
                    line: line_no,
                    source,
                };
                if config.strict {
                    return Err(err);
                }
                tracing::warn!(line = line_no, error = %err, "skipping unreadable row");
                batch.unreadable.push(err);
            }
        }
    }

    tracing::debug!(
        rows = batch.events.len(),
        skipped = batch.unreadable.len(),
        "read movement rows"
    );
    Ok(batch)
}

/// Reads a batch from a file.
pub fn read_file(path: &Path, config: &SourceConfig) -> Result<Batch, SourceError> {
    let file = File::open(path).map_err(|source| SourceError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    read_batch(BufReader::with_capacity(BUFFER_SIZE, file), config)
}

/// Reads the batch `config` points at.
pub fn load(config: &SourceConfig) -> Result<Batch, SourceError> {
    match &config.path {
        Some(path) => read_file(path, config),
        None => read_batch(io::stdin().lock(), config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::{Cursor, Write};

    use fl_core::OdometerValue;
    use tempfile::NamedTempFile;

    const ROWS: &str = r#"{"timestamp":"10/03/2025 08:00","driver":"Ana","plate":"ABC123","model":"Strada","kind":"Saída","odometer_start":100,"purpose":"Client visit"}

{"timestamp":"10/03/2025 09:00","driver":"Ana","plate":"ABC123","model":"Strada","kind":"Chegada","odometer_end":150}
"#;

    #[test]
    fn reads_rows_and_tracks_lines() {
        let batch = read_batch(Cursor::new(ROWS), &SourceConfig::default()).unwrap();

        assert_eq!(batch.events.len(), 2);
        assert_eq!(batch.lines, [1, 3]);
        assert_eq!(batch.line_of(1), Some(3));
        assert_eq!(batch.line_of(2), None);
        assert_eq!(batch.events[1].odometer, Some(OdometerValue::Integer(150)));
    }

    #[test]
    fn lenient_read_skips_bad_lines() {
        let input = format!("{ROWS}not json\n[1,2]\n");
        let batch = read_batch(Cursor::new(input), &SourceConfig::default()).unwrap();

        assert_eq!(batch.events.len(), 2);
        assert_eq!(batch.unreadable.len(), 2);
        assert!(matches!(batch.unreadable[0], SourceError::Json { line: 4, .. }));
        assert!(matches!(batch.unreadable[1], SourceError::Json { line: 5, .. }));
    }

    #[test]
    fn strict_read_fails_on_bad_line() {
        let config = SourceConfig {
            strict: true,
            ..SourceConfig::default()
        };
        let err = read_batch(Cursor::new("{\"driver\":\n"), &config).unwrap_err();
        assert!(matches!(err, SourceError::Json { line: 1, .. }));
        assert!(err.to_string().starts_with("invalid row on line 1"));
    }

    #[test]
    fn reads_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{ROWS}").unwrap();
        file.flush().unwrap();

        let config = SourceConfig {
            path: Some(file.path().to_path_buf()),
            ..SourceConfig::default()
        };
        let batch = load(&config).unwrap();
        assert_eq!(batch.events.len(), 2);
    }

    #[test]
    fn missing_file_names_path() {
        let err = read_file(Path::new("/nonexistent/movements.jsonl"), &SourceConfig::default())
            .unwrap_err();
        assert!(matches!(err, SourceError::Open { .. }));
        assert!(err.to_string().contains("/nonexistent/movements.jsonl"));
    }

    #[test]
    fn custom_labels_select_odometer_column() {
        let config = SourceConfig {
            labels: KindLabels {
                departure: "out".to_string(),
                arrival: "in".to_string(),
            },
            ..SourceConfig::default()
        };
        let input = r#"{"driver":"Ana","kind":"in","odometer_start":1,"odometer_end":2}"#;
        let batch = read_batch(Cursor::new(input), &config).unwrap();
        assert_eq!(batch.events[0].odometer, Some(OdometerValue::Integer(2)));
    }
}
