use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Invalid uuid: {0}")]
    InvalidUuid(#[from] uuid::Error),
}
