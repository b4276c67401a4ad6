use banksight_core::EngineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Missing fields: {0}")]
    MissingFields(String),
    #[error("Unknown import format: {0}, expected .csv or .json")]
    UnknownFormat(String),
}
