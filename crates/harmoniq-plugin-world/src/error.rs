use std::path::PathBuf;

use harmoniq_rdf::{ParseError, StoreError, Value};
use thiserror::Error;

/// Errors raised while acquiring or running a dynamic manifest binary.
#[derive(Debug, Error)]
pub enum ExtensionError {
    #[error("dynamic manifest binary not found at {0}")]
    MissingBinary(PathBuf),
    #[error("{0} is not a local binary")]
    NotLocal(String),
    #[error("failed to load dynamic manifest library: {0}")]
    LibraryLoad(#[from] libloading::Error),
    #[error("{path} does not export {symbol}")]
    MissingEntry { path: PathBuf, symbol: &'static str },
    #[error("{symbol} returned {code}")]
    Failed { symbol: &'static str, code: i32 },
    #[error("dynamic manifest output is not UTF-8")]
    InvalidOutput(#[from] std::string::FromUtf8Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum WorldError {
    #[error("bundle reference {0} is not a URI")]
    NotAUri(Value),
    #[error("invalid URI {uri}: {reason}")]
    InvalidUri { uri: String, reason: String },
    #[error("failed to create triple storage: {0}")]
    Store(#[from] StoreError),
    #[error("failed to parse {uri}: {source}")]
    Parse {
        uri: String,
        #[source]
        source: ParseError,
    },
    #[error(transparent)]
    Extension(#[from] ExtensionError),
    #[error("failed to read configuration: {0}")]
    ConfigRead(#[from] std::io::Error),
    #[error("failed to parse configuration: {0}")]
    Config(#[from] serde_json::Error),
}
