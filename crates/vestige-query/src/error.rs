use vestige_core::error::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}
