// Errors raised while generating reflection sources.

use std::path::PathBuf;

use mundi_reflect_parse::ParseError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodegenError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("cache {}: {source}", path.display())]
    Cache {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
}

impl CodegenError {
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CodegenError::Read { path: path.into(), source }
    }

    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CodegenError::Write { path: path.into(), source }
    }
}

pub type CodegenResult<T> = Result<T, CodegenError>;
