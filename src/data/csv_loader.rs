use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::domain::Bar;
use crate::error::SignalError;
use crate::models::PriceSeries;
use crate::utils::time_utils::parse_date_to_epoch_ms;

/// One row of a Yahoo-style daily export. `Adj Close` and unknown columns are ignored.
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Date", alias = "Datetime")]
    date: String,
    #[serde(rename = "Open", deserialize_with = "csv::invalid_option")]
    open: Option<f64>,
    #[serde(rename = "High", deserialize_with = "csv::invalid_option")]
    high: Option<f64>,
    #[serde(rename = "Low", deserialize_with = "csv::invalid_option")]
    low: Option<f64>,
    #[serde(rename = "Close", deserialize_with = "csv::invalid_option")]
    close: Option<f64>,
    #[serde(rename = "Volume", default, deserialize_with = "csv::invalid_option")]
    volume: Option<f64>,
}

pub fn load_price_csv(path: &Path, symbol: &str) -> Result<PriceSeries> {
    let file = File::open(path).context(format!("Failed to open price file: {:?}", path))?;
    read_price_csv(BufReader::new(file), symbol)
        .context(format!("Failed to load price file: {:?}", path))
}

/// Parse a price CSV from any reader.
///
/// Rows with a missing or unparseable price (Yahoo writes `null` on
/// non-trading days) are skipped. A missing volume counts as zero.
pub fn read_price_csv<R: Read>(reader: R, symbol: &str) -> Result<PriceSeries> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut bars = Vec::new();
    // File line of each kept bar, for error messages after skipped rows
    let mut lines = Vec::new();
    let mut skipped = 0usize;

    for (idx, row) in csv_reader.deserialize::<CsvRow>().enumerate() {
        // +2: one for the header, one for 1-based line numbers
        let line = idx + 2;
        let row = row.context(format!("Malformed row at line {}", line))?;

        let timestamp_ms = parse_date_to_epoch_ms(&row.date)
            .with_context(|| format!("Unrecognised date {:?} at line {}", row.date, line))?;

        let (Some(open), Some(high), Some(low), Some(close)) = (row.open, row.high, row.low, row.close)
        else {
            skipped += 1;
            continue;
        };

        bars.push(Bar::new(
            timestamp_ms,
            open,
            high,
            low,
            close,
            row.volume.unwrap_or(0.0),
        ));
        lines.push(line);
    }

    if skipped > 0 {
        log::warn!("{}: skipped {} rows without prices", symbol, skipped);
    }

    let series = match PriceSeries::from_bars(symbol, &bars) {
        Ok(series) => series,
        Err(err) => {
            let line = match &err {
                SignalError::InvalidInput { index, .. } => lines.get(*index),
                _ => None,
            };
            let context = match line {
                Some(line) => format!("Invalid price row for {} at line {}", symbol, line),
                None => format!("Price rows for {} are not a valid series", symbol),
            };
            return Err(anyhow::Error::new(err).context(context));
        }
    };
    log::info!("Loaded {} bars for {}", series.len(), symbol);
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "\
Date,Open,High,Low,Close,Adj Close,Volume
2024-01-02,10.0,11.0,9.5,10.5,10.4,1000
2024-01-03,10.5,12.0,10.0,11.5,11.4,1500
2024-01-04,null,null,null,null,null,null
2024-01-05,11.5,11.8,11.0,11.2,11.1,900
";

    #[test]
    fn test_reads_yahoo_export_and_skips_null_rows() {
        let series = read_price_csv(SAMPLE.as_bytes(), "TEST").unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.closes(), &[10.5, 11.5, 11.2]);
        assert_eq!(series.volumes(), &[1000.0, 1500.0, 900.0]);
        assert_eq!(series.symbol(), "TEST");
    }

    #[test]
    fn test_datetime_header_and_missing_volume() {
        let text = "Datetime,Open,High,Low,Close\n\
                    2024-01-02T14:30:00Z,1,2,0.5,1.5\n\
                    2024-01-02T15:30:00Z,1.5,2,1,1.8\n";
        let series = read_price_csv(text.as_bytes(), "INTRA").unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.timestamps()[1] - series.timestamps()[0], 3_600_000);
        assert_eq!(series.volumes(), &[0.0, 0.0]);
    }

    #[test]
    fn test_out_of_order_rows_are_rejected() {
        let text = "Date,Open,High,Low,Close,Volume\n\
                    2024-01-03,1,1,1,1,1\n\
                    2024-01-02,1,1,1,1,1\n";
        let err = read_price_csv(text.as_bytes(), "BAD").unwrap_err();
        let signal = err.downcast_ref::<SignalError>();
        assert!(
            matches!(signal, Some(SignalError::InvalidInput { index: 1, .. })),
            "unexpected error: {:?}",
            err
        );
    }

    #[test]
    fn test_rejected_row_names_file_line_after_skipped_rows() {
        let text = "Date,Open,High,Low,Close,Volume\n\
                    2024-01-03,1,1,1,1,1\n\
                    2024-01-04,null,null,null,null,null\n\
                    2024-01-02,1,1,1,1,1\n";
        let err = read_price_csv(text.as_bytes(), "BAD").unwrap_err();
        // Bar index 1 comes from the fourth line of the file
        assert!(err.to_string().contains("line 4"), "error was: {}", err);
        assert!(
            matches!(err.downcast_ref::<SignalError>(), Some(SignalError::InvalidInput { index: 1, .. })),
            "unexpected error: {:?}",
            err
        );
    }

    #[test]
    fn test_bad_date_names_line() {
        let text = "Date,Open,High,Low,Close,Volume\nnot-a-date,1,1,1,1,1\n";
        let err = read_price_csv(text.as_bytes(), "BAD").unwrap_err();
        assert!(err.to_string().contains("line 2"), "error was: {}", err);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let series = load_price_csv(file.path(), "FILE").unwrap();
        assert_eq!(series.len(), 3);

        let missing = load_price_csv(Path::new("/nonexistent/prices.csv"), "NONE").unwrap_err();
        assert!(missing.to_string().contains("prices.csv"));
    }
}
