// Wallmix Error Types

use thiserror::Error;

/// Failure inside a single provider adapter.
/// Browse and search swallow these; only the random chain sees them.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Provider returned no results")]
    Empty,
}

#[derive(Error, Debug)]
pub enum WallmixError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    #[error("Wallpaper not found: {0}")]
    WallpaperNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("All providers failed: {}", .0.join(", "))]
    AllProvidersFailed(Vec<String>),

    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("{0}")]
    Other(String),
}

impl WallmixError {
    /// True for the not-found family (collection or wallpaper).
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            WallmixError::CollectionNotFound(_) | WallmixError::WallpaperNotFound(_)
        )
    }
}

impl From<anyhow::Error> for WallmixError {
    fn from(err: anyhow::Error) -> Self {
        WallmixError::Other(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, WallmixError>;
