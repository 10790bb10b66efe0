use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Shadow not found: {id}")]
    NotFound { id: String },

    #[error("Invalid record: {0}")]
    InvalidRecord(#[from] serde_json::Error),

    #[error("Invalid ID: {0}")]
    InvalidId(String),

    #[error("Lineage cycle detected at shadow {id}")]
    LineageCycle { id: String },

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
