use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Unknown block type: {0}")]
    UnknownBlockType(String),

    #[error("Invalid block: {0}")]
    InvalidBlock(String),

    #[error("Duplicate component id: {0}")]
    DuplicateId(String),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}
