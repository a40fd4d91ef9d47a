//! Reading tabular source files with format and encoding fallback.
//!
//! A file is tried with each [`LoaderStrategy`] in turn until one yields a
//! table. Failed attempts are logged at debug level and only surface if every
//! strategy fails.

use std::fmt;
use std::fs;
use std::path::Path;

use encoding_rs::Encoding;
use log::debug;

use crate::error::{NetworkError, Result};
use crate::office::extract_rows_from_xlsx;

/// Rows of cells, no header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub rows: Vec<Vec<String>>,
    /// Description of the strategy that produced the table
    pub source_format: String,
}

impl RawTable {
    /// Widest row length.
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Non-blank cells of column `index`, in row order.
    ///
    /// Rows too short to have the column are treated as missing values.
    pub fn texts(&self, index: usize) -> Result<Vec<String>> {
        let available = self.column_count();
        if index >= available {
            return Err(NetworkError::Column { index, available });
        }
        Ok(self
            .rows
            .iter()
            .filter_map(|row| row.get(index))
            .filter(|cell| !cell.trim().is_empty())
            .cloned()
            .collect())
    }
}

/// One way of turning a file into a [`RawTable`].
#[derive(Debug, Clone, Copy)]
pub enum LoaderStrategy {
    /// First worksheet of an Office Open XML workbook
    Xlsx,
    /// Headerless CSV decoded strictly with the given encoding
    Csv {
        label: &'static str,
        encoding: &'static Encoding,
    },
}

impl fmt::Display for LoaderStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoaderStrategy::Xlsx => f.write_str("xlsx"),
            LoaderStrategy::Csv { label, .. } => write!(f, "csv ({label})"),
        }
    }
}

/// Resolve an encoding label. Accepts WHATWG labels plus the Windows code
/// page names commonly used for Japanese CSV exports.
pub fn encoding_for_label(label: &str) -> Option<(&'static str, &'static Encoding)> {
    let normalized = label.trim().to_ascii_lowercase();
    let encoding = match normalized.as_str() {
        "cp932" | "ms932" | "windows-31j" => encoding_rs::SHIFT_JIS,
        "utf8" | "utf-8" => encoding_rs::UTF_8,
        other => Encoding::for_label(other.as_bytes())?,
    };
    let label: &'static str = match normalized.as_str() {
        "cp932" => "cp932",
        _ => encoding.name(),
    };
    Some((label, encoding))
}

/// Ordered strategies for `path`: XLSX first for `.xlsx` files, then CSV in
/// each encoding.
pub fn strategies_for(path: &Path, encodings: &[String]) -> Result<Vec<LoaderStrategy>> {
    let mut strategies = Vec::new();
    let is_xlsx = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("xlsx"));
    if is_xlsx {
        strategies.push(LoaderStrategy::Xlsx);
    }
    for name in encodings {
        let (label, encoding) = encoding_for_label(name)
            .ok_or_else(|| NetworkError::Config(format!("unknown encoding '{name}'")))?;
        strategies.push(LoaderStrategy::Csv { label, encoding });
    }
    Ok(strategies)
}

impl LoaderStrategy {
    pub fn load(&self, path: &Path) -> std::result::Result<RawTable, String> {
        let rows = match self {
            LoaderStrategy::Xlsx => extract_rows_from_xlsx(path)?,
            LoaderStrategy::Csv { encoding, .. } => {
                let bytes = fs::read(path).map_err(|e| format!("Read failed: {e}"))?;
                let text = decode_strict(&bytes, encoding)
                    .ok_or_else(|| format!("Not valid {}", encoding.name()))?;
                parse_csv(&text)?
            }
        };
        Ok(RawTable {
            rows,
            source_format: self.to_string(),
        })
    }
}

/// Try every strategy in order and return the first table.
pub fn load_table(path: &Path, strategies: &[LoaderStrategy]) -> Result<RawTable> {
    let mut attempts = Vec::new();
    for strategy in strategies {
        match strategy.load(path) {
            Ok(table) => return Ok(table),
            Err(e) => {
                debug!("{}: {} attempt failed: {}", path.display(), strategy, e);
                attempts.push(format!("{strategy}: {e}"));
            }
        }
    }
    Err(NetworkError::Load {
        path: path.to_path_buf(),
        attempts: attempts.join("; "),
    })
}

// ---- Internal helpers ----

fn decode_strict(bytes: &[u8], encoding: &'static Encoding) -> Option<String> {
    let bytes = if encoding == encoding_rs::UTF_8 {
        bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes)
    } else {
        bytes
    };
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|text| text.into_owned())
}

fn parse_csv(text: &str) -> std::result::Result<Vec<Vec<String>>, String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| format!("Parse CSV failed: {e}"))?;
        rows.push(record.iter().map(String::from).collect());
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn csv_strategies() -> Vec<LoaderStrategy> {
        let encodings: Vec<String> = ["utf-8", "cp932", "shift_jis"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        strategies_for(Path::new("data.csv"), &encodings).unwrap()
    }

    #[test]
    fn test_encoding_labels() {
        assert_eq!(encoding_for_label("UTF-8").unwrap().1, encoding_rs::UTF_8);
        assert_eq!(encoding_for_label("cp932").unwrap().0, "cp932");
        assert_eq!(
            encoding_for_label("shift_jis").unwrap().1,
            encoding_rs::SHIFT_JIS
        );
        assert!(encoding_for_label("klingon").is_none());
    }

    #[test]
    fn test_strategies_order_and_unknown_encoding() {
        let encodings = vec!["utf-8".to_string()];
        let xlsx = strategies_for(Path::new("book.XLSX"), &encodings).unwrap();
        assert_eq!(xlsx.len(), 2);
        assert!(matches!(xlsx[0], LoaderStrategy::Xlsx));
        assert_eq!(xlsx[1].to_string(), "csv (UTF-8)");

        let csv = csv_strategies();
        assert_eq!(csv.len(), 3);
        assert_eq!(csv[1].to_string(), "csv (cp932)");

        let bad = strategies_for(Path::new("a.csv"), &["nope".to_string()]);
        assert!(matches!(bad, Err(NetworkError::Config(_))));
    }

    #[test]
    fn test_utf8_csv_with_bom_and_ragged_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.csv");
        fs::write(&path, "\u{feff}first,x\n\"quoted, text\"\nlast,y,z\n").unwrap();

        let table = load_table(&path, &csv_strategies()).unwrap();
        assert_eq!(table.source_format, "csv (UTF-8)");
        assert_eq!(table.column_count(), 3);
        assert_eq!(table.texts(0).unwrap(), vec!["first", "quoted, text", "last"]);
        assert_eq!(table.texts(1).unwrap(), vec!["x", "y"]);
    }

    #[test]
    fn test_falls_back_to_shift_jis() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sjis.csv");
        let (bytes, _, had_errors) = encoding_rs::SHIFT_JIS.encode("猫と犬,1\n");
        assert!(!had_errors);
        fs::write(&path, &bytes).unwrap();

        let table = load_table(&path, &csv_strategies()).unwrap();
        assert_eq!(table.source_format, "csv (cp932)");
        assert_eq!(table.texts(0).unwrap(), vec!["猫と犬"]);
    }

    #[test]
    fn test_missing_column_and_blank_cells() {
        let table = RawTable {
            rows: vec![
                vec!["".to_string()],
                vec!["   ".to_string()],
                vec!["text".to_string()],
            ],
            source_format: "test".into(),
        };
        assert_eq!(table.texts(0).unwrap(), vec!["text"]);
        assert!(matches!(
            table.texts(3),
            Err(NetworkError::Column {
                index: 3,
                available: 1
            })
        ));
    }

    #[test]
    fn test_unreadable_file_reports_all_attempts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.csv");
        match load_table(&path, &csv_strategies()) {
            Err(NetworkError::Load { attempts, .. }) => {
                assert_eq!(attempts.matches("Read failed").count(), 3);
            }
            other => panic!("expected load error, got {other:?}"),
        }
    }
}
