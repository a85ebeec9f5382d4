//! MonkeyType results export → cleaned performance records.

use chrono::{TimeZone, Utc};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{PersonaError, Result};
use crate::record::PerformanceRecord;

const REQUIRED_COLUMNS: [&str; 3] = ["wpm", "acc", "timestamp"];

#[derive(Debug, Deserialize)]
struct ResultRow {
    #[serde(default, deserialize_with = "csv::invalid_option")]
    wpm: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    acc: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    consistency: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    timestamp: Option<f64>,
}

impl ResultRow {
    /// Applies the cleaning rules; `None` drops the row.
    fn into_record(self) -> Option<PerformanceRecord> {
        let wpm = self.wpm.filter(|v| v.is_finite() && *v > 0.0)?;
        let acc = self
            .acc
            .filter(|v| v.is_finite() && (0.0..=100.0).contains(v))?;
        let millis = self.timestamp.filter(|v| v.is_finite())?;
        let timestamp = Utc.timestamp_millis_opt(millis as i64).single()?;
        let consistency = self.consistency.filter(|v| v.is_finite()).unwrap_or(0.0);

        Some(PerformanceRecord::new(wpm, acc, consistency).with_timestamp(timestamp))
    }
}

/// Reads a results CSV, skipping malformed or invalid rows, and returns the
/// surviving records in chronological order.
pub fn read_results<R: Read>(reader: R) -> Result<Vec<PerformanceRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    if let Some(missing) = REQUIRED_COLUMNS
        .iter()
        .find(|col| !headers.iter().any(|h| h == **col))
    {
        return Err(PersonaError::MissingColumn(missing.to_string()));
    }

    let mut total = 0usize;
    let mut records = Vec::new();
    for (line, row) in rdr.deserialize::<ResultRow>().enumerate() {
        total += 1;
        match row {
            Ok(row) => records.extend(row.into_record()),
            Err(e) => debug!(line = line + 2, error = %e, "skipping malformed row"),
        }
    }

    records.sort_by_key(|r| r.timestamp);
    info!(
        loaded = total,
        valid = records.len(),
        "parsed typing results"
    );

    Ok(records)
}

pub fn read_results_file<P: AsRef<Path>>(path: P) -> Result<Vec<PerformanceRecord>> {
    let file = std::fs::File::open(path)?;
    read_results(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const HEADER: &str = "_id,isPb,wpm,acc,rawWpm,consistency,charStats,mode,mode2,timestamp\n";

    fn parse(body: &str) -> Result<Vec<PerformanceRecord>> {
        read_results(format!("{HEADER}{body}").as_bytes())
    }

    #[test]
    fn parses_monkeytype_rows() {
        let records = parse(
            "a1,false,98.5,96.2,101.3,78.4,120;3;0;1,time,30,1700000000000\n\
             a2,true,110,97,112,81,130;2;0;0,time,30,1700000060000\n",
        )
        .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].speed, 98.5);
        assert_eq!(records[0].accuracy, 96.2);
        assert_eq!(records[0].consistency, 78.4);
        assert_eq!(
            records[0].timestamp.unwrap().timestamp_millis(),
            1_700_000_000_000
        );
    }

    #[test]
    fn sorts_chronologically() {
        let records = parse(
            "b,false,60,90,61,70,1;0;0;0,time,15,1700000090000\n\
             a,false,70,91,71,71,1;0;0;0,time,15,1700000010000\n",
        )
        .unwrap();
        assert_eq!(records[0].speed, 70.0);
        assert_eq!(records[1].speed, 60.0);
    }

    #[test]
    fn drops_invalid_rows() {
        let records = parse(
            "ok,false,80,95,82,75,1;0;0;0,time,30,1700000000000\n\
             zero,false,0,95,0,75,1;0;0;0,time,30,1700000001000\n\
             neg,false,-3,95,0,75,1;0;0;0,time,30,1700000002000\n\
             acc,false,80,101,82,75,1;0;0;0,time,30,1700000003000\n\
             nots,false,80,95,82,75,1;0;0;0,time,30,\n\
             junk,false,abc,95,82,75,1;0;0;0,time,30,1700000004000\n\
             short,false\n",
        )
        .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].speed, 80.0);
    }

    #[test]
    fn missing_consistency_becomes_zero() {
        let records = parse("a,false,80,95,82,,1;0;0;0,time,30,1700000000000\n").unwrap();
        assert_eq!(records[0].consistency, 0.0);
    }

    #[test]
    fn missing_required_column_is_an_error() {
        let result = read_results("wpm,consistency,timestamp\n80,70,1700000000000\n".as_bytes());
        assert_matches!(result, Err(PersonaError::MissingColumn(col)) if col == "acc");
    }

    #[test]
    fn reads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");
        std::fs::write(
            &path,
            format!("{HEADER}a,false,80,95,82,75,1;0;0;0,time,30,1700000000000\n"),
        )
        .unwrap();
        assert_eq!(read_results_file(&path).unwrap().len(), 1);
    }
}
