//! Sent-date store implementations.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{debug, info};

/// Errors from ledger reads and writes.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("ledger I/O error at `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Store of report dates that have been successfully delivered.
///
/// `add` is required to be idempotent: adding a date that is already present
/// is a no-op, so a duplicate run can never produce a duplicate record.
pub trait SentDateStore: Send {
    /// Whether this report date has already been delivered.
    fn contains(&self, date: NaiveDate) -> Result<bool, LedgerError>;

    /// Record a verified delivery for this date.
    fn add(&mut self, date: NaiveDate) -> Result<(), LedgerError>;
}

/// File-backed store: one ISO date per line, bounded to the most recent
/// `max_entries` lines after each append.
pub struct FileSentStore {
    path: PathBuf,
    max_entries: usize,
}

impl FileSentStore {
    pub fn new(path: impl Into<PathBuf>, max_entries: usize) -> Self {
        Self {
            path: path.into(),
            max_entries: max_entries.max(1),
        }
    }

    /// Read the ledger lines. A missing file is an empty ledger, not an
    /// error.
    fn read_lines(&self) -> Result<Vec<String>, LedgerError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => Ok(raw
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(source) => Err(LedgerError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn write_lines(&self, lines: &[String]) -> Result<(), LedgerError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| LedgerError::Io {
                    path: self.path.clone(),
                    source,
                })?;
            }
        }
        let mut body = lines.join("\n");
        if !body.is_empty() {
            body.push('\n');
        }
        std::fs::write(&self.path, body).map_err(|source| LedgerError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl SentDateStore for FileSentStore {
    fn contains(&self, date: NaiveDate) -> Result<bool, LedgerError> {
        let needle = date.format("%Y-%m-%d").to_string();
        Ok(self.read_lines()?.iter().any(|line| *line == needle))
    }

    fn add(&mut self, date: NaiveDate) -> Result<(), LedgerError> {
        let entry = date.format("%Y-%m-%d").to_string();
        let mut lines = self.read_lines()?;

        if lines.iter().any(|line| *line == entry) {
            debug!(date = %entry, "date already recorded, skipping append");
            return Ok(());
        }

        lines.push(entry.clone());
        // Oldest entries fall off the front.
        if lines.len() > self.max_entries {
            let drop = lines.len() - self.max_entries;
            lines.drain(..drop);
        }
        self.write_lines(&lines)?;
        info!(date = %entry, path = %self.path.display(), "recorded successful send");
        Ok(())
    }
}

/// In-memory store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemorySentStore {
    dates: BTreeSet<NaiveDate>,
}

impl MemorySentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dates(dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            dates: dates.into_iter().collect(),
        }
    }

    pub fn dates(&self) -> impl Iterator<Item = &NaiveDate> {
        self.dates.iter()
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

impl SentDateStore for MemorySentStore {
    fn contains(&self, date: NaiveDate) -> Result<bool, LedgerError> {
        Ok(self.dates.contains(&date))
    }

    fn add(&mut self, date: NaiveDate) -> Result<(), LedgerError> {
        self.dates.insert(date);
        Ok(())
    }
}

/// Convenience wrapper used by callers that only have the ledger path.
pub fn open_default(path: &Path) -> FileSentStore {
    FileSentStore::new(path, 90)
}
