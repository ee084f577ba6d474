use crate::error::{MonthlyStatisticsError, Result};
use crate::schema::RawRecord;
use crate::utils::month_from_number;
use glob::glob;
use log::{debug, info};
use rayon::prelude::*;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// The columns of a monthly extract that feed the statistics. Extra columns are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceRow {
    pub month: String,
    #[serde(rename = "Qty")]
    pub qty: Option<f64>,
    #[serde(rename = "Amount")]
    pub amount: Option<f64>,
    #[serde(rename = "ProductCode")]
    pub product_code: String,
    #[serde(rename = "EntityCode")]
    pub entity_code: String,
}

/// Records read from a single source file.
#[derive(Debug, Clone, Default)]
pub struct IngestedPartition {
    pub source: String,
    pub records: Vec<RawRecord>,
    pub rows_read: usize,
    /// Rows without a quantity; they cannot yield a unit cost.
    pub rows_missing_values: usize,
}

/// Lists every regular file in `dir` whose name contains `.csv`, sorted by path.
pub fn discover_source_files(dir: &Path) -> Result<Vec<PathBuf>> {
    // Brackets and other glob metacharacters in the directory name are literal.
    let pattern = format!(
        "{}/*.csv*",
        glob::Pattern::escape(&dir.to_string_lossy())
    );

    let mut files = Vec::new();
    for entry in glob(&pattern)? {
        let path = entry.map_err(|e| MonthlyStatisticsError::IoError(e.into_error()))?;
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();

    if files.is_empty() {
        return Err(MonthlyStatisticsError::NoSourceFiles(
            dir.display().to_string(),
        ));
    }

    debug!("Discovered {} source files in {}", files.len(), dir.display());
    Ok(files)
}

fn invalid_record(
    source_name: &str,
    line: u64,
    reason: impl Into<String>,
) -> MonthlyStatisticsError {
    MonthlyStatisticsError::InvalidRecord {
        source_name: source_name.to_string(),
        line,
        reason: reason.into(),
    }
}

fn convert_row(row: SourceRow, source_name: &str, line: u64) -> Result<Option<RawRecord>> {
    let trimmed = row.month.trim();
    let number = trimmed.parse::<i64>().map_err(|_| {
        invalid_record(
            source_name,
            line,
            format!("month '{}' is not an integer", trimmed),
        )
    })?;
    let month = month_from_number(number)
        .map_err(|e| invalid_record(source_name, line, e.to_string()))?;

    let quantity = match row.qty {
        Some(quantity) => quantity,
        None => return Ok(None),
    };

    Ok(Some(RawRecord {
        month,
        quantity,
        amount: row.amount,
        product_code: row.product_code,
        entity_code: row.entity_code,
    }))
}

/// Parses one headered extract. Fails on the first row whose month is not an
/// integer in 1..=12 or whose numeric fields cannot be parsed.
pub fn read_records<R: Read>(
    reader: R,
    source_name: &str,
    delimiter: u8,
) -> Result<IngestedPartition> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();

    let mut partition = IngestedPartition {
        source: source_name.to_string(),
        ..Default::default()
    };

    for result in csv_reader.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        partition.rows_read += 1;

        let row: SourceRow = record
            .deserialize(Some(&headers))
            .map_err(|e| invalid_record(source_name, line, e.to_string()))?;

        match convert_row(row, source_name, line)? {
            Some(raw) => partition.records.push(raw),
            None => partition.rows_missing_values += 1,
        }
    }

    if partition.rows_missing_values > 0 {
        debug!(
            "{}: skipped {} rows without quantity",
            source_name, partition.rows_missing_values
        );
    }

    Ok(partition)
}

pub fn read_records_from_path(path: &Path, delimiter: u8) -> Result<IngestedPartition> {
    info!("Reading {}", path.display());
    let file = File::open(path)?;
    read_records(file, &path.display().to_string(), delimiter)
}

/// Reads every partition in parallel. Partitions are returned in the order of `paths`.
pub fn load_partitions(paths: &[PathBuf], delimiter: u8) -> Result<Vec<IngestedPartition>> {
    paths
        .par_iter()
        .map(|path| read_records_from_path(path, delimiter))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Month;
    use std::fs;
    use tempfile::tempdir;

    const HEADER: &str = "month,Object,Qty,Amount,ProductCode,EntityCode\n";

    #[test]
    fn test_read_records_keeps_codes_as_text() {
        let data = format!(
            "{}12,x,2,0.000094,0001B00700,A05150500323\n11,y,3,9,X013-A30SF-1,5120000302\n",
            HEADER
        );
        let partition = read_records(data.as_bytes(), "dec.csv", b',').unwrap();

        assert_eq!(partition.rows_read, 2);
        assert_eq!(partition.records.len(), 2);
        assert_eq!(partition.records[0].product_code, "0001B00700");
        assert_eq!(partition.records[0].month, Month::December);
        assert_eq!(partition.records[1].entity_code, "5120000302");
        assert_eq!(partition.records[1].quantity, 3.0);
    }

    #[test]
    fn test_zero_quantity_rows_are_kept_for_the_deriver() {
        let data = format!("{}1,x,0,10,P,E\n", HEADER);
        let partition = read_records(data.as_bytes(), "jan.csv", b',').unwrap();
        assert_eq!(partition.records.len(), 1);
        assert_eq!(partition.records[0].quantity, 0.0);
    }

    #[test]
    fn test_missing_quantity_is_skipped_missing_amount_is_kept() {
        let data = format!("{}1,x,,10,P,E\n1,x,2,,P,E\n1,x,2,4,P,E\n", HEADER);
        let partition = read_records(data.as_bytes(), "jan.csv", b',').unwrap();
        assert_eq!(partition.rows_read, 3);
        assert_eq!(partition.rows_missing_values, 1);
        assert_eq!(partition.records.len(), 2);
        assert_eq!(partition.records[0].amount, None);
        assert_eq!(partition.records[0].quantity, 2.0);
        assert_eq!(partition.records[1].amount, Some(4.0));
    }

    #[test]
    fn test_out_of_range_month_fails_with_location() {
        let data = format!("{}1,x,1,1,P,E\n13,x,1,1,P,E\n", HEADER);
        let err = read_records(data.as_bytes(), "bad.csv", b',').unwrap_err();

        match err {
            MonthlyStatisticsError::InvalidRecord {
                source_name, line, ..
            } => {
                assert_eq!(source_name, "bad.csv");
                assert_eq!(line, 3);
            }
            other => panic!("expected InvalidRecord, got {:?}", other),
        }
    }

    #[test]
    fn test_non_integer_month_fails() {
        let data = format!("{}March,x,1,1,P,E\n", HEADER);
        assert!(matches!(
            read_records(data.as_bytes(), "bad.csv", b','),
            Err(MonthlyStatisticsError::InvalidRecord { .. })
        ));
    }

    #[test]
    fn test_custom_delimiter() {
        let data = "month;Qty;Amount;ProductCode;EntityCode\n2;4;2;P;E\n";
        let partition = read_records(data.as_bytes(), "feb.csv", b';').unwrap();
        assert_eq!(partition.records[0].amount, Some(2.0));
    }

    #[test]
    fn test_discover_and_load_partitions() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("2023-02.csv"),
            format!("{}2,x,1,2,P,E\n", HEADER),
        )
        .unwrap();
        fs::write(
            dir.path().join("2023-01.csv"),
            format!("{}1,x,1,1,P,E\n", HEADER),
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        fs::create_dir(dir.path().join("nested.csv.d")).unwrap();

        let files = discover_source_files(dir.path()).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("2023-01.csv"));

        let partitions = load_partitions(&files, b',').unwrap();
        assert_eq!(partitions.len(), 2);
        assert_eq!(partitions[0].records[0].month, Month::January);
        assert_eq!(partitions[1].records[0].month, Month::February);
    }

    #[test]
    fn test_directory_name_with_glob_characters() {
        let dir = tempdir().unwrap();
        let source_dir = dir.path().join("data[2023]");
        fs::create_dir(&source_dir).unwrap();
        fs::write(source_dir.join("01.csv"), format!("{}1,x,1,1,P,E\n", HEADER)).unwrap();

        let files = discover_source_files(&source_dir).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("01.csv"));
    }

    #[test]
    fn test_empty_directory_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            discover_source_files(dir.path()),
            Err(MonthlyStatisticsError::NoSourceFiles(_))
        ));
    }
}
