//! CSV file data adapter.
//!
//! Reads `<base_path>/<SYMBOL>.csv` with a header row followed by
//! `timestamp,open,high,low,close[,volume]`. Rows are returned in file order.

use crate::domain::error::TraderError;
use crate::domain::ohlcv::Bar;
use crate::ports::data_port::DataPort;
use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::path::PathBuf;

const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }
}

pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn price_field(record: &csv::StringRecord, col: usize, name: &str) -> Result<f64, String> {
    let raw = record
        .get(col)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("missing {} column", name))?;
    raw.parse()
        .map_err(|e| format!("invalid {} value '{}': {}", name, raw, e))
}

fn volume_field(record: &csv::StringRecord) -> Result<i64, String> {
    match record.get(5).map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(0),
        Some(raw) => raw
            .parse::<i64>()
            .or_else(|_| raw.parse::<f64>().map(|v| v.round() as i64))
            .map_err(|e| format!("invalid volume value '{}': {}", raw, e)),
    }
}

fn parse_record(record: &csv::StringRecord) -> Result<Bar, String> {
    let ts_str = record.get(0).unwrap_or_default();
    let timestamp =
        parse_timestamp(ts_str).ok_or_else(|| format!("invalid timestamp '{}'", ts_str))?;
    Ok(Bar {
        timestamp,
        open: price_field(record, 1, "open")?,
        high: price_field(record, 2, "high")?,
        low: price_field(record, 3, "low")?,
        close: price_field(record, 4, "close")?,
        volume: volume_field(record)?,
    })
}

impl DataPort for CsvAdapter {
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<Bar>, TraderError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| TraderError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(content.as_bytes());
        let mut bars = Vec::new();

        // `index` follows the returned sequence, matching the loop's numbering;
        // the file line goes in the reason.
        for (row, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| TraderError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;

            let bar = parse_record(&record).map_err(|reason| TraderError::InvalidBar {
                index: bars.len(),
                reason: format!("{} line {}: {}", path.display(), row + 2, reason),
            })?;

            let date = bar.timestamp.date();
            if start_date.is_some_and(|s| date < s) || end_date.is_some_and(|e| date > e) {
                continue;
            }
            bars.push(bar);
        }

        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, TraderError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| TraderError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| TraderError::Data {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            if let Some(symbol) = name_str.strip_suffix(".csv") {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        let csv_content = "date,open,high,low,close,volume\n\
            2024-01-15,100.0,110.0,90.0,105.0,50000\n\
            2024-01-16,105.0,115.0,100.0,110.0,60000\n\
            2024-01-17,110.0,120.0,105.0,115.0,55000\n";

        fs::write(path.join("AAPL.csv"), csv_content).unwrap();
        fs::write(path.join("MSFT.csv"), "date,open,high,low,close,volume\n").unwrap();
        fs::write(path.join("notes.txt"), "not data").unwrap();

        (dir, path)
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn fetch_bars_returns_correct_data() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let bars = adapter.fetch_bars("AAPL", None, None).unwrap();

        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].timestamp, day(15).and_hms_opt(0, 0, 0).unwrap());
        assert_eq!(bars[0].open, 100.0);
        assert_eq!(bars[0].high, 110.0);
        assert_eq!(bars[0].low, 90.0);
        assert_eq!(bars[0].close, 105.0);
        assert_eq!(bars[0].volume, 50000);
    }

    #[test]
    fn fetch_bars_filters_by_date() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let bars = adapter.fetch_bars("AAPL", Some(day(16)), Some(day(16))).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].timestamp.date(), day(16));

        let bars = adapter.fetch_bars("AAPL", Some(day(16)), None).unwrap();
        assert_eq!(bars.len(), 2);
    }

    #[test]
    fn fetch_bars_errors_for_missing_file() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        let result = adapter.fetch_bars("XYZ", None, None);
        assert!(matches!(result, Err(TraderError::Data { .. })));
    }

    #[test]
    fn fetch_bars_keeps_file_order() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("X.csv"),
            "date,open,high,low,close\n2024-01-02,1,2,0.5,1.5\n2024-01-01,1,2,0.5,1.5\n",
        )
        .unwrap();
        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        let bars = adapter.fetch_bars("X", None, None).unwrap();
        assert_eq!(bars[0].timestamp.date(), day(2));
        assert_eq!(bars[1].timestamp.date(), day(1));
        assert_eq!(bars[0].volume, 0);
    }

    #[test]
    fn missing_close_is_invalid_bar() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("X.csv"),
            "date,open,high,low,close\n2024-01-01,1,2,0.5,1.5\n2024-01-02,1,2,0.5,\n",
        )
        .unwrap();
        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        let err = adapter.fetch_bars("X", None, None).unwrap_err();
        assert!(matches!(err, TraderError::InvalidBar { index: 1, .. }));
    }

    #[test]
    fn invalid_row_index_counts_returned_bars() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("X.csv"),
            "date,open,high,low,close\n\
             2023-12-30,1,2,0.5,1.5\n\
             2023-12-31,1,2,0.5,1.5\n\
             2024-01-01,1,2,0.5,1.5\n\
             2024-01-02,1,2,0.5,oops\n",
        )
        .unwrap();
        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        let err = adapter.fetch_bars("X", Some(day(1)), None).unwrap_err();
        match err {
            TraderError::InvalidBar { index, reason } => {
                assert_eq!(index, 1);
                assert!(reason.contains("X.csv line 5"), "{reason}");
                assert!(reason.contains("invalid close value 'oops'"), "{reason}");
            }
            other => panic!("expected InvalidBar, got {other:?}"),
        }
    }

    #[test]
    fn parse_timestamp_formats() {
        let midnight = day(5).and_hms_opt(0, 0, 0).unwrap();
        let intraday = day(5).and_hms_opt(9, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2024-01-05"), Some(midnight));
        assert_eq!(parse_timestamp("2024-01-05 09:30:00"), Some(intraday));
        assert_eq!(parse_timestamp(" 2024-01-05T09:30:00 "), Some(intraday));
        assert_eq!(parse_timestamp("05/01/2024"), None);
    }

    #[test]
    fn list_symbols_returns_csv_stems() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        assert_eq!(adapter.list_symbols().unwrap(), vec!["AAPL", "MSFT"]);
    }
}
