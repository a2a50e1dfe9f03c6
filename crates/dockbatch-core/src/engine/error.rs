use thiserror::Error;

use crate::core::io::history::LedgerError;
use crate::core::io::reports::ReportError;
use std::path::PathBuf;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Parameter '{field}' must be {expected} (received: {value})")]
    InvalidParameter {
        field: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error("Could not resolve path for '{field}' ({value}): {source}")]
    PathResolution {
        field: &'static str,
        value: String,
        source: std::io::Error,
    },

    #[error("Environment validation failed:\n{}", .0.join("\n"))]
    Validation(Vec<String>),

    #[error("Failed to prepare output directory '{path}': {source}", path = path.display())]
    OutputDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to list ligands in '{path}': {source}", path = path.display())]
    LigandDiscovery {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to build worker pool: {0}")]
    WorkerPool(String),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl EngineError {
    /// Whether this error means the batch cannot start at all, as opposed to one
    /// receptor failing while its siblings can still run.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            EngineError::InvalidParameter { .. }
                | EngineError::PathResolution { .. }
                | EngineError::Validation(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_lists_every_message() {
        let err = EngineError::Validation(vec![
            "Receptor file not found: /a".into(),
            "No PDBQT files in: /b".into(),
        ]);
        assert_eq!(
            err.to_string(),
            "Environment validation failed:\nReceptor file not found: /a\nNo PDBQT files in: /b"
        );
        assert!(err.is_precondition());
    }

    #[test]
    fn invalid_parameter_names_the_field() {
        let err = EngineError::InvalidParameter {
            field: "exhaustiveness",
            expected: "an integer",
            value: "abc".into(),
        };
        assert_eq!(
            err.to_string(),
            "Parameter 'exhaustiveness' must be an integer (received: abc)"
        );
    }

    #[test]
    fn runtime_failures_are_not_preconditions() {
        assert!(!EngineError::WorkerPool("no threads".into()).is_precondition());
    }
}
