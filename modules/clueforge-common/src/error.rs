use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClueError {
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Invalid enumeration: {0}")]
    InvalidEnumeration(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
