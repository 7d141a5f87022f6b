//! Daily totals store
//!
//! Keeps one [`DailyRecord`] per calendar date and mirrors it to the history
//! file, an object keyed by `YYYY-MM-DD`.

use crate::{write_json_atomic, Category, DailyRecord, PersistError};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const DATE_FORMAT: &str = "%Y-%m-%d";

pub type Result<T> = std::result::Result<T, PersistError>;

pub struct DailyTotals {
    records: BTreeMap<NaiveDate, DailyRecord>,
    file_path: Option<PathBuf>,
}

impl DailyTotals {
    pub fn new_in_memory() -> Self {
        Self {
            records: BTreeMap::new(),
            file_path: None,
        }
    }

    /// Load the history file. A missing or unreadable file yields an empty store.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let records = match Self::read(path) {
            Ok(Some(records)) => {
                info!("Loaded {} days of history from {:?}", records.len(), path);
                records
            }
            Ok(None) => BTreeMap::new(),
            Err(e) => {
                warn!("Failed to load history from {:?} ({}), starting empty", path, e);
                BTreeMap::new()
            }
        };

        Self {
            records,
            file_path: Some(path.to_path_buf()),
        }
    }

    fn read(path: &Path) -> Result<Option<BTreeMap<NaiveDate, DailyRecord>>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)?;
        let raw: BTreeMap<String, serde_json::Value> = serde_json::from_str(&content)?;

        let mut records = BTreeMap::new();
        for (key, value) in raw {
            let Ok(date) = NaiveDate::parse_from_str(&key, DATE_FORMAT) else {
                warn!("Skipping history entry with invalid date {:?}", key);
                continue;
            };
            match serde_json::from_value::<DailyRecord>(value) {
                Ok(record) => {
                    records.insert(date, record);
                }
                Err(e) => warn!("Skipping malformed history entry for {}: {}", key, e),
            }
        }
        Ok(Some(records))
    }

    /// Record for a date; all zero if nothing was recorded
    pub fn get(&self, date: NaiveDate) -> DailyRecord {
        self.records.get(&date).copied().unwrap_or_default()
    }

    /// Whether a record has been materialized for this date
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.records.contains_key(&date)
    }

    pub fn increment(&mut self, date: NaiveDate, category: Category, by: u64) {
        self.records.entry(date).or_default().add(category, by);
    }

    /// Make sure `date` has a record, even if it stays all zero
    pub fn touch(&mut self, date: NaiveDate) {
        self.records.entry(date).or_default();
    }

    /// All dates with their records, oldest first
    pub fn snapshot(&self) -> &BTreeMap<NaiveDate, DailyRecord> {
        &self.records
    }

    /// The most recent `n` recorded days, most recent last
    pub fn recent_days(&self, n: usize) -> Vec<(NaiveDate, DailyRecord)> {
        let skip = self.records.len().saturating_sub(n);
        self.records
            .iter()
            .skip(skip)
            .map(|(date, record)| (*date, *record))
            .collect()
    }

    /// Write the full mapping to the history file
    pub fn persist(&self) -> Result<()> {
        let Some(path) = &self.file_path else {
            return Ok(());
        };

        let raw: BTreeMap<String, DailyRecord> = self
            .records
            .iter()
            .map(|(date, record)| (date.format(DATE_FORMAT).to_string(), *record))
            .collect();

        write_json_atomic(path, &raw)
    }
}
