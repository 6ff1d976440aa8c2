use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by storage and the menu feed.
///
/// Tab operations themselves never fail: unknown ids are ignored and
/// unknown routes fall back to the home view.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid storage key '{0}': only ASCII letters, digits, '.', '_' and '-' are allowed")]
    InvalidKey(String),

    #[error("menu fetch failed: {0}")]
    MenuFetch(String),
}

pub type Result<T> = std::result::Result<T, Error>;
