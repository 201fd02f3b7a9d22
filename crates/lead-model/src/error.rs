use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("unknown file category '{0}' (expected 'buyers' or 'visitors')")]
    UnknownCategory(String),
    #[error("unknown field '{0}'")]
    UnknownField(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
