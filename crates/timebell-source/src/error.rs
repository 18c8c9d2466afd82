use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no school matching {0:?}")]
    SchoolNotFound(String),

    #[error("no school selected")]
    NoSchoolSelected,

    #[error("source not initialized")]
    NotInitialized,

    #[error("timetable fetch timed out after {0:?}")]
    Timeout(Duration),
}
