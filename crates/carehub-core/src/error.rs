use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown response type: {0}")]
    UnknownResponseType(String),

    #[error("unknown template category: {0}")]
    UnknownCategory(String),

    #[error("invalid uuid: {0}")]
    InvalidUuid(#[from] uuid::Error),
}
