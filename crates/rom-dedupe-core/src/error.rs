use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Manifest error in {}: {source}", path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Trash error for {}: {message}", path.display())]
    Trash { path: PathBuf, message: String },

    #[error("Another process holds the lock on {}", .0.display())]
    Locked(PathBuf),

    #[error("{0}")]
    Other(String),
}
