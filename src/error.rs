use crate::category::Category;
use thiserror::Error;

/// Errors from the network seam.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Request failed {status}: {url}")]
    Status { status: u16, url: String },
}

/// Errors writing a category document.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Missing run-time credentials.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("session cookie is required (DOUBAN_COOKIE)")]
    MissingCookie,
    #[error("user id is required (DOUBAN_USER_ID)")]
    MissingUserId,
}

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("categories failed: {}", .0.iter().map(|c| c.as_str()).collect::<Vec<_>>().join(", "))]
    CategoriesFailed(Vec<Category>),
}

/// The dashboard refuses to start without its data document.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("cannot load movies document: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot load movies document: {0}")]
    Fetch(#[from] FetchError),
    #[error("movies document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
