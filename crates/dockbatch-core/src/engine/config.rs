use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_VINA_EXECUTABLE: &str = "vina";

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for '{0}': {1}")]
    InvalidValue(&'static str, String),
}

/// Process-wide settings threaded explicitly through the batch.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub vina_path: PathBuf,
    /// Root under which the run history ledger is kept.
    pub working_root: PathBuf,
    /// Worker bound used for receptors whose configuration leaves it unbounded.
    pub default_workers: usize,
}

#[derive(Default)]
pub struct EngineSettingsBuilder {
    vina_path: Option<PathBuf>,
    working_root: Option<PathBuf>,
    default_workers: Option<usize>,
}

impl EngineSettingsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vina_path(mut self, path: PathBuf) -> Self {
        self.vina_path = Some(path);
        self
    }
    pub fn working_root(mut self, path: PathBuf) -> Self {
        self.working_root = Some(path);
        self
    }
    pub fn default_workers(mut self, workers: usize) -> Self {
        self.default_workers = Some(workers);
        self
    }

    pub fn build(self) -> Result<EngineSettings, ConfigError> {
        let default_workers = match self.default_workers {
            Some(0) => {
                return Err(ConfigError::InvalidValue(
                    "default_workers",
                    "must be at least 1".to_string(),
                ));
            }
            Some(n) => n,
            None => available_parallelism(),
        };
        Ok(EngineSettings {
            vina_path: self
                .vina_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_VINA_EXECUTABLE)),
            working_root: self
                .working_root
                .ok_or(ConfigError::MissingParameter("working_root"))?,
            default_workers,
        })
    }
}

/// External converters used to produce docking-ready PDBQT files.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolPaths {
    pub mk_prepare_receptor: PathBuf,
    pub mk_prepare_ligand: PathBuf,
    pub scrub: PathBuf,
    /// Optional hydrogen-placement pass run on receptors before conversion.
    pub reduce: Option<PathBuf>,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            mk_prepare_receptor: PathBuf::from("mk_prepare_receptor.py"),
            mk_prepare_ligand: PathBuf::from("mk_prepare_ligand.py"),
            scrub: PathBuf::from("scrub.py"),
            reduce: None,
        }
    }
}

/// Hardware threads available to this process, at least 1.
pub fn available_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
