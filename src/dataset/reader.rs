use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use flate2::read::MultiGzDecoder;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use crate::error::{DqError, Result};
use super::frame::{Column, DataFrame};
use super::infer::TypeInference;
use super::schema::ColumnType;
use super::value::Value;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    Auto,
    Gzip,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsvReadOptions {
    #[serde(default = "default_true")]
    pub header: bool,
    #[serde(default)]
    pub infer_schema: bool,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    #[serde(default)]
    pub compression: Compression,
}

fn default_true() -> bool {
    true
}

fn default_delimiter() -> char {
    ','
}

impl Default for CsvReadOptions {
    fn default() -> Self {
        Self {
            header: true,
            infer_schema: false,
            delimiter: ',',
            compression: Compression::Auto,
        }
    }
}

impl CsvReadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, header: bool) -> Self {
        self.header = header;
        self
    }

    pub fn infer_schema(mut self, infer: bool) -> Self {
        self.infer_schema = infer;
        self
    }

    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }
}

pub fn read_csv(path: impl AsRef<Path>, options: &CsvReadOptions) -> Result<DataFrame> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|_| DqError::DatasetNotFound(path.display().to_string()))?;
    let mut buffered = BufReader::new(file);

    let gzip = match options.compression {
        Compression::Gzip => true,
        Compression::None => false,
        Compression::Auto => {
            let by_extension = path
                .extension()
                .map(|ext| ext.eq_ignore_ascii_case("gz"))
                .unwrap_or(false);
            by_extension || buffered.fill_buf()?.starts_with(&GZIP_MAGIC)
        }
    };

    info!("Reading {} (gzip: {})", path.display(), gzip);

    let frame = if gzip {
        read_csv_from_reader(MultiGzDecoder::new(buffered), options)?
    } else {
        read_csv_from_reader(buffered, options)?
    };

    info!(
        "Loaded {} rows x {} columns from {}",
        frame.row_count(),
        frame.column_count(),
        path.display()
    );

    Ok(frame)
}

pub fn read_csv_from_reader<R: Read>(reader: R, options: &CsvReadOptions) -> Result<DataFrame> {
    if !options.delimiter.is_ascii() {
        return Err(DqError::Dataset(format!(
            "delimiter must be a single ASCII character, got '{}'",
            options.delimiter
        )));
    }

    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(options.header)
        .delimiter(options.delimiter as u8)
        .flexible(true)
        .from_reader(reader);

    let mut headers: Option<Vec<String>> = if options.header {
        Some(csv_reader.headers()?.iter().map(|h| h.to_string()).collect())
    } else {
        None
    };

    let mut raw_columns: Vec<Vec<String>> = Vec::new();
    let mut malformed = 0usize;
    let mut row_count = 0usize;

    for record in csv_reader.records() {
        let record = record?;

        let width = match &headers {
            Some(h) => h.len(),
            None => {
                let generated: Vec<String> = (0..record.len()).map(|i| format!("_c{}", i)).collect();
                let width = generated.len();
                headers = Some(generated);
                width
            }
        };

        if raw_columns.len() != width {
            raw_columns = (0..width).map(|_| Vec::new()).collect();
        }

        if record.len() != width {
            malformed += 1;
            debug!("Row {} has {} fields, expected {}", row_count + 1, record.len(), width);
        }

        for (i, column) in raw_columns.iter_mut().enumerate() {
            column.push(record.get(i).unwrap_or("").to_string());
        }
        row_count += 1;
    }

    if malformed > 0 {
        warn!("{} malformed rows were padded or truncated to the header width", malformed);
    }

    let headers = dedupe_headers(headers.unwrap_or_default());
    if raw_columns.is_empty() {
        raw_columns = headers.iter().map(|_| Vec::new()).collect();
    }

    let columns = headers
        .into_iter()
        .zip(raw_columns)
        .map(|(name, cells)| {
            let column_type = if options.infer_schema {
                let mut inference = TypeInference::new();
                for cell in &cells {
                    inference.observe(cell);
                }
                inference.finish()
            } else {
                ColumnType::String
            };

            let values = cells
                .iter()
                .map(|cell| Value::parse(cell, column_type))
                .collect();

            Column::new(name, column_type, values)
        })
        .collect();

    DataFrame::new(columns)
}

/// Blank headers become `_c<index>`, repeated ones `<name><index>`; a
/// generated name that is still taken gets a `_<n>` suffix.
fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for h in &headers {
        *counts.entry(h.as_str()).or_default() += 1;
    }

    let renamed: Vec<Option<String>> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            if h.is_empty() {
                Some(format!("_c{}", i))
            } else if counts[h.as_str()] > 1 {
                Some(format!("{}{}", h, i))
            } else {
                None
            }
        })
        .collect();

    let mut taken: HashSet<String> = headers
        .iter()
        .zip(&renamed)
        .filter(|(_, r)| r.is_none())
        .map(|(h, _)| h.clone())
        .collect();

    headers
        .into_iter()
        .zip(renamed)
        .map(|(h, r)| match r {
            None => h,
            Some(base) => {
                let mut name = base.clone();
                let mut n = 1;
                while taken.contains(&name) {
                    name = format!("{}_{}", base, n);
                    n += 1;
                }
                taken.insert(name.clone());
                name
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "id,fare,flag,pickup\n1,2.5,true,2019-01-01 00:46:40\n2,,false,2019-01-01 01:00:00\n3,7,true,\n";

    #[test]
    fn test_strings_without_inference() {
        let df = read_csv_from_reader(CSV.as_bytes(), &CsvReadOptions::new()).unwrap();
        assert_eq!(df.row_count(), 3);
        assert_eq!(df.column_names(), vec!["id", "fare", "flag", "pickup"]);
        assert!(df.columns().iter().all(|c| c.column_type == ColumnType::String));
        assert!(df.column("fare").unwrap().values[1].is_null());
    }

    #[test]
    fn test_inference() {
        let options = CsvReadOptions::new().infer_schema(true);
        let df = read_csv_from_reader(CSV.as_bytes(), &options).unwrap();
        assert_eq!(df.column("id").unwrap().column_type, ColumnType::Integer);
        assert_eq!(df.column("fare").unwrap().column_type, ColumnType::Double);
        assert_eq!(df.column("flag").unwrap().column_type, ColumnType::Boolean);
        assert_eq!(df.column("pickup").unwrap().column_type, ColumnType::Timestamp);
        assert_eq!(df.column("fare").unwrap().values[2], Value::Float(7.0));
    }

    #[test]
    fn test_no_header_generates_names() {
        let options = CsvReadOptions::new().header(false);
        let df = read_csv_from_reader("a,b\nc,d\n".as_bytes(), &options).unwrap();
        assert_eq!(df.column_names(), vec!["_c0", "_c1"]);
        assert_eq!(df.row_count(), 2);
    }

    #[test]
    fn test_duplicate_headers() {
        let df = read_csv_from_reader("a,b,a\n1,2,3\n".as_bytes(), &CsvReadOptions::new()).unwrap();
        assert_eq!(df.column_names(), vec!["a0", "b", "a2"]);
    }

    #[test]
    fn test_generated_header_does_not_shadow_real_one() {
        let df = read_csv_from_reader("a,a0,a,,_c3\n1,2,3,4,5\n".as_bytes(), &CsvReadOptions::new()).unwrap();
        assert_eq!(df.column_names(), vec!["a0_1", "a0", "a2", "_c3_1", "_c3"]);
        assert_eq!(df.column("a0").unwrap().values[0], Value::Str("2".into()));
    }

    #[test]
    fn test_ragged_rows_are_padded() {
        let df = read_csv_from_reader("a,b,c\n1,2\n1,2,3,4\n".as_bytes(), &CsvReadOptions::new()).unwrap();
        assert_eq!(df.row_count(), 2);
        assert!(df.column("c").unwrap().values[0].is_null());
        assert_eq!(df.column("c").unwrap().values[1], Value::Str("3".into()));
    }

    #[test]
    fn test_header_only() {
        let df = read_csv_from_reader("a,b\n".as_bytes(), &CsvReadOptions::new()).unwrap();
        assert_eq!(df.row_count(), 0);
        assert_eq!(df.column_count(), 2);
    }

    #[test]
    fn test_missing_file() {
        let result = read_csv("/definitely/not/here.csv", &CsvReadOptions::new());
        assert!(matches!(result, Err(DqError::DatasetNotFound(_))));
    }
}
