//! Export daily totals as CSV or JSON

use crate::{history::DailyTotals, DailyRecord};
use chrono::{DateTime, Local, NaiveDate};
use serde::Serialize;
use std::io::Write;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ExportError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Some(ExportFormat::Csv),
            "json" => Some(ExportFormat::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize)]
struct ExportRow {
    date: NaiveDate,
    work_seconds: u64,
    break_seconds: u64,
    idle_seconds: u64,
}

impl ExportRow {
    fn new(date: NaiveDate, record: DailyRecord) -> Self {
        Self {
            date,
            work_seconds: record.work_seconds,
            break_seconds: record.break_seconds,
            idle_seconds: record.idle_seconds,
        }
    }
}

/// Export data structure for JSON
#[derive(Debug, Serialize)]
struct ExportData {
    exported_at: DateTime<Local>,
    days: Vec<ExportRow>,
}

pub struct Exporter<'a> {
    totals: &'a DailyTotals,
}

impl<'a> Exporter<'a> {
    pub fn new(totals: &'a DailyTotals) -> Self {
        Self { totals }
    }

    /// Export the most recent `days` recorded days, or everything when `None`
    pub fn export<W: Write>(&self, writer: W, days: Option<usize>, format: ExportFormat) -> Result<()> {
        let records = match days {
            Some(n) => self.totals.recent_days(n),
            None => self
                .totals
                .snapshot()
                .iter()
                .map(|(date, record)| (*date, *record))
                .collect(),
        };
        let rows = records
            .into_iter()
            .map(|(date, record)| ExportRow::new(date, record))
            .collect();

        match format {
            ExportFormat::Csv => Self::export_csv(writer, rows),
            ExportFormat::Json => Self::export_json(writer, rows),
        }
    }

    fn export_csv<W: Write>(writer: W, rows: Vec<ExportRow>) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for row in rows {
            csv_writer.serialize(row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    fn export_json<W: Write>(mut writer: W, rows: Vec<ExportRow>) -> Result<()> {
        let export_data = ExportData {
            exported_at: Local::now(),
            days: rows,
        };
        let json = serde_json::to_string_pretty(&export_data)?;
        writer.write_all(json.as_bytes())?;
        Ok(())
    }
}
