use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("patient id must not be empty")]
    EmptyPatientId,
    #[error("unknown code system: {0}")]
    UnknownCodeSystem(String),
    #[error("unknown variable category: {0}")]
    UnknownCategory(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
