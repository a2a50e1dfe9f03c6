use dockbatch::engine::error::EngineError;
use dockbatch::workflows::prepare::PrepareError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Prepare(#[from] PrepareError),

    #[error("Invalid invocation: {0}")]
    Invocation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse file '{path}': {source}", path = path.display())]
    FileParsing {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid argument: {0}")]
    Argument(String),

    #[error("Preparation incomplete: {0}")]
    Incomplete(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
