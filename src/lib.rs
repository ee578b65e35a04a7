pub mod analysis;
pub mod category;
pub mod config;
pub mod dom;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod filter;
pub mod gate;
pub mod history;
pub mod item;
pub mod merger;
pub mod parser;
pub mod server;

#[cfg(test)]
mod testing;

pub use category::Category;
pub use error::{ConfigError, DashboardError, FetchError, ScrapeError, StoreError};
pub use history::HistoryStore;
pub use item::{FieldValue, Item, MovieDetail};
pub use merger::{MergeReport, PaginationMerger, StopReason, run_categories, scrape_all};

/// Source of raw page HTML. Everything that talks to the collection site
/// goes through this, so a run can be replayed from memory.
#[async_trait::async_trait]
pub trait PageFetcher: Send + Sync {
    /// Body of `url`, or an error for transport failures and non-success
    /// statuses.
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError>;
}
