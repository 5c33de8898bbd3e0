//! CSV import/export for wallet balance dumps and the cumulative series

use {
    crate::{Result, StoreError},
    csv::{ReaderBuilder, StringRecord, Trim, Writer},
    stakewatch_common::{
        types::{CumulativeSeries, SeriesEntry},
        utils::parse_date,
    },
    std::{
        collections::BTreeMap,
        io::{Read, Write},
    },
    tracing::warn,
};

pub const SERIES_CSV_HEADER: [&str; 2] = ["Snapshot Date", "Total Staked Amount"];

fn line_of(record: &StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or_default()
}

/// Reads an `address,balance` dump (first row is a header).
///
/// Rows whose balance is at or below `epsilon`, or does not parse, are skipped.
pub fn read_wallet_balances<R: Read>(reader: R, epsilon: f64) -> Result<BTreeMap<String, f64>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut wallets = BTreeMap::new();
    for record in rdr.records() {
        let record = record?;
        let (Some(address), Some(balance)) = (record.get(0), record.get(1)) else {
            continue;
        };
        if address.is_empty() || balance.is_empty() {
            continue;
        }
        match balance.parse::<f64>() {
            Ok(balance) if balance.is_finite() && balance > epsilon => {
                wallets.insert(address.to_string(), balance);
            }
            Ok(_) => {}
            Err(e) => warn!("Skipping wallet {} on line {}: {}", address, line_of(&record), e),
        }
    }
    Ok(wallets)
}

/// Reads a `Snapshot Date,Total Staked Amount` export into a series.
///
/// The date column may carry a time suffix (`2025-06-24 00:00:00.000`); only
/// the date part is kept. Such exports carry no wallet counts.
pub fn read_series_csv<R: Read>(reader: R) -> Result<CumulativeSeries> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut entries = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let line = line_of(&record);
        let raw_date = record.get(0).unwrap_or_default();
        let date_part = raw_date.split(' ').next().unwrap_or_default();
        let date = parse_date(date_part).map_err(|e| StoreError::InvalidRecord {
            line,
            reason: e.to_string(),
        })?;
        let total_staked = record
            .get(1)
            .unwrap_or_default()
            .parse::<f64>()
            .map_err(|e| StoreError::InvalidRecord {
                line,
                reason: format!("total staked: {e}"),
            })?;
        entries.push(SeriesEntry {
            date,
            total_staked,
            active_wallets: None,
        });
    }
    Ok(CumulativeSeries::from_entries(entries))
}

/// Writes the series newest first in the `Snapshot Date,Total Staked Amount` layout.
pub fn write_series_csv<W: Write>(writer: W, series: &CumulativeSeries) -> Result<()> {
    let mut wtr = Writer::from_writer(writer);
    wtr.write_record(SERIES_CSV_HEADER)?;
    for entry in &series.daily_data {
        wtr.write_record([
            format!("{} 00:00:00.000", entry.date.format("%Y-%m-%d")),
            entry.total_staked.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}
