use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Invalid input for {0}: {1}")]
    InvalidInput(String, String),

    #[error("Series '{left}' and '{right}' are not indexed on the same dates")]
    IndexMismatch { left: String, right: String },
}
