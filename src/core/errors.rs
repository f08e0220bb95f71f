use std::path::PathBuf;
use std::string::FromUtf8Error;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("no icon determined for '{0}'")]
    Guess(String),
    #[error("'{}' is not valid UTF-8 text", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: FromUtf8Error,
    },
    #[error("'{}' is outside the browse root", .0.display())]
    Forbidden(PathBuf),
    #[error("invalid icon pattern: {0}")]
    InvalidPattern(#[from] globset::Error),
    #[error("config error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("other error: {0}")]
    Other(String),
}

impl Error {
    pub(crate) fn not_found(path: impl Into<PathBuf>) -> Self {
        Error::NotFound(format!("'{}' does not exist", path.into().display()))
    }

    /// True for every failure a serving layer should answer with "not found".
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::NotFound(_) => true,
            Error::Io(err) => err.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}
