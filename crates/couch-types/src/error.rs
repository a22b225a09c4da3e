//! Error types for couchmode.

use std::io;

/// Errors produced by the couchmode crates.
#[derive(Debug, thiserror::Error)]
pub enum CouchError {
    #[error("backend error: {0}")]
    Backend(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("asset error: {0}")]
    Asset(String),

    #[error("launch error: {0}")]
    Launch(String),

    #[error("bridge error: {0}")]
    Bridge(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, CouchError>;
