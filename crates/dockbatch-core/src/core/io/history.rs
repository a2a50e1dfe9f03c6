use chrono::{Local, NaiveDateTime};
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const HISTORY_DIR: &str = "run_history";
pub const HISTORY_FILE: &str = "history.csv";

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

const HEADER: [&str; 11] = [
    "start_date",
    "start_time",
    "end_date",
    "end_time",
    "receptor",
    "processed_ligands",
    "exhaustiveness",
    "parallel_workers",
    "output_dir",
    "status",
    "observations",
];

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Failed to open run history '{path}': {source}", path = path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("Failed to append to run history '{path}': {source}", path = path.display())]
    Csv { path: PathBuf, source: csv::Error },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Ok,
    Error,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Ok => write!(f, "OK"),
            RunStatus::Error => write!(f, "Error"),
        }
    }
}

/// One attempted receptor run, as recorded in the history ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub started_at: NaiveDateTime,
    pub receptor: String,
    /// Ligands discovered at batch start, whether or not they docked.
    pub ligands: Vec<String>,
    pub exhaustiveness: Option<u32>,
    pub workers: Option<usize>,
    pub output_dir: PathBuf,
    pub status: RunStatus,
    pub observations: String,
}

/// Append-only CSV log of receptor runs under a working root.
#[derive(Debug, Clone)]
pub struct RunHistory {
    path: PathBuf,
}

impl RunHistory {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn in_working_root(working_root: &Path) -> Self {
        Self::new(working_root.join(HISTORY_DIR).join(HISTORY_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `entry`, stamping the end time now.
    pub fn append(&self, entry: &HistoryEntry) -> Result<(), LedgerError> {
        self.append_at(entry, Local::now().naive_local())
    }

    /// Appends `entry` with an explicit end time. The header row is written only
    /// when the file is created (or found empty).
    pub fn append_at(
        &self,
        entry: &HistoryEntry,
        finished_at: NaiveDateTime,
    ) -> Result<(), LedgerError> {
        let io_err = |source| LedgerError::Io {
            path: self.path.clone(),
            source,
        };
        let csv_err = |source| LedgerError::Csv {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(io_err)?;
        let needs_header = file.metadata().map_err(io_err)?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if needs_header {
            writer.write_record(HEADER).map_err(csv_err)?;
        }
        writer
            .write_record(Self::row(entry, finished_at))
            .map_err(csv_err)?;
        writer.flush().map_err(io_err)
    }

    fn row(entry: &HistoryEntry, finished_at: NaiveDateTime) -> [String; 11] {
        [
            entry.started_at.format(DATE_FORMAT).to_string(),
            entry.started_at.format(TIME_FORMAT).to_string(),
            finished_at.format(DATE_FORMAT).to_string(),
            finished_at.format(TIME_FORMAT).to_string(),
            entry.receptor.clone(),
            entry.ligands.join(","),
            entry
                .exhaustiveness
                .map(|e| e.to_string())
                .unwrap_or_default(),
            entry.workers.map(|w| w.to_string()).unwrap_or_default(),
            entry.output_dir.display().to_string(),
            entry.status.to_string(),
            entry.observations.clone(),
        ]
    }
}
