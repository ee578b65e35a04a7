//! Paginated, incremental scraping of one category into its history.
//!
//! Each page goes through fetch -> dedup -> persist, then the loop either
//! continues to the next offset or stops. Progress is saved after every
//! page so an aborted run keeps what it already merged.

use crate::PageFetcher;
use crate::category::Category;
use crate::config::{Credentials, ScrapeSettings};
use crate::error::ScrapeError;
use crate::fetch::{HttpFetcher, Pacing};
use crate::history::HistoryStore;
use crate::item::Item;
use crate::parser::parse_items;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{error, info};

pub const PAGE_SIZE: usize = 15;
/// Runaway guard on the number of pages per category.
pub const MAX_PAGES: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// A page came back with no items.
    Exhausted,
    /// A page had items but none we hadn't seen.
    NoNewItems,
    /// `MAX_PAGES` reached.
    PageLimit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    pub category: Category,
    pub pages: usize,
    pub new_items: usize,
    pub total: usize,
    pub stop: StopReason,
}

/// Split page items into those with an unseen link and the rest, marking
/// the new links as known right away.
pub fn take_new_items(items: Vec<Item>, known: &mut HashSet<String>) -> Vec<Item> {
    items
        .into_iter()
        .filter(|item| !item.link.is_empty() && known.insert(item.link.clone()))
        .collect()
}

pub struct PaginationMerger<'a> {
    fetcher: &'a dyn PageFetcher,
    store: &'a HistoryStore,
    user_id: &'a str,
    pacing: Pacing,
}

impl<'a> PaginationMerger<'a> {
    pub fn new(fetcher: &'a dyn PageFetcher, store: &'a HistoryStore, user_id: &'a str, pacing: Pacing) -> Self {
        Self {
            fetcher,
            store,
            user_id,
            pacing,
        }
    }

    pub async fn run(&self, category: Category) -> Result<MergeReport, ScrapeError> {
        let mut history = self.store.load(category).await;
        let mut known: HashSet<String> = history
            .iter()
            .filter(|item| !item.link.is_empty())
            .map(|item| item.link.clone())
            .collect();

        let mut report = MergeReport {
            category,
            pages: 0,
            new_items: 0,
            total: history.len(),
            stop: StopReason::PageLimit,
        };

        for page in 0..MAX_PAGES {
            let start = page * PAGE_SIZE;
            info!("Fetching {} page start={}", category, start);
            let html = self.fetcher.fetch_page(&category.page_url(self.user_id, start)).await?;
            let items = parse_items(self.fetcher, &html, category, &known, &self.pacing).await;
            if items.is_empty() {
                info!("{}: no more items, stop paging", category);
                report.stop = StopReason::Exhausted;
                break;
            }

            let mut fresh = take_new_items(items, &mut known);
            let page_new = fresh.len();
            fresh.append(&mut history);
            history = fresh;
            self.store.save(category, &history).await?;

            report.pages += 1;
            report.new_items += page_new;
            report.total = history.len();
            info!(
                "{}: saved page start={}, page_new={}, total={}",
                category,
                start,
                page_new,
                history.len()
            );

            if page_new == 0 {
                info!("{}: page has nothing new, stop paging", category);
                report.stop = StopReason::NoNewItems;
                break;
            }
            tokio::time::sleep(self.pacing.page_delay).await;
        }

        info!("{}: finished, history={}", category, report.total);
        Ok(report)
    }
}

/// Run the merger over each category in turn. A failing category is logged
/// and does not stop the others; the result is an error if any failed.
pub async fn run_categories(
    fetcher: &dyn PageFetcher,
    store: &HistoryStore,
    user_id: &str,
    pacing: Pacing,
    categories: &[Category],
) -> Result<Vec<MergeReport>, ScrapeError> {
    let merger = PaginationMerger::new(fetcher, store, user_id, pacing);
    let mut reports = Vec::with_capacity(categories.len());
    let mut failed = Vec::new();

    for &category in categories {
        match merger.run(category).await {
            Ok(report) => reports.push(report),
            Err(e) => {
                error!("{}: scrape aborted: {}", category, e);
                failed.push(category);
            }
        }
    }

    if failed.is_empty() {
        Ok(reports)
    } else {
        Err(ScrapeError::CategoriesFailed(failed))
    }
}

/// Full pipeline: check credentials, then scrape every configured category
/// over HTTP.
pub async fn scrape_all(settings: &ScrapeSettings) -> Result<Vec<MergeReport>, ScrapeError> {
    let Credentials { cookie, user_id } = settings.credentials()?;
    let fetcher = HttpFetcher::new(cookie)?;
    let store = HistoryStore::new(&settings.data_dir);
    run_categories(&fetcher, &store, &user_id, settings.pacing, &settings.categories).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryFetcher, listing_page, movie_node};
    use tempfile::TempDir;

    fn page_url(start: usize) -> String {
        Category::Movies.page_url("u1", start)
    }

    #[test]
    fn duplicate_links_on_one_page_count_once() {
        let mut known: HashSet<String> = ["a".to_string()].into();
        let items = ["a", "b", "b", ""]
            .iter()
            .map(|link| Item {
                link: link.to_string(),
                ..Item::default()
            })
            .collect();
        let fresh = take_new_items(items, &mut known);
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].link, "b");
        assert!(known.contains("b"));
    }

    #[tokio::test]
    async fn stops_on_empty_page_and_prepends_new_items() {
        let tmp = TempDir::new().unwrap();
        let store = HistoryStore::new(tmp.path());
        let fetcher = MemoryFetcher::default()
            .with_page(&page_url(0), listing_page(&[movie_node("1", "甲", "2024-03-01"), movie_node("2", "乙", "2024-02-01")]))
            .with_page(&page_url(15), listing_page(&[movie_node("3", "丙", "2024-01-01")]))
            .with_page(&page_url(30), listing_page(&[]));

        let merger = PaginationMerger::new(&fetcher, &store, "u1", Pacing::none());
        let report = merger.run(Category::Movies).await.unwrap();

        assert_eq!(report.stop, StopReason::Exhausted);
        assert_eq!(report.pages, 2);
        assert_eq!(report.new_items, 3);
        let titles: Vec<_> = store
            .load(Category::Movies)
            .await
            .into_iter()
            .map(|i| i.title)
            .collect();
        assert_eq!(titles, vec!["丙", "甲", "乙"]);
    }

    #[tokio::test]
    async fn second_run_adds_nothing_and_skips_details() {
        let tmp = TempDir::new().unwrap();
        let store = HistoryStore::new(tmp.path());
        let fetcher = MemoryFetcher::default()
            .with_page(&page_url(0), listing_page(&[movie_node("1", "甲", "2024-03-01")]))
            .with_page(&page_url(15), listing_page(&[]))
            .with_detail("1", &["科幻"], "100分钟", "2010-01-01");
        let merger = PaginationMerger::new(&fetcher, &store, "u1", Pacing::none());

        merger.run(Category::Movies).await.unwrap();
        let first = store.load(Category::Movies).await;
        fetcher.clear_requests();

        let report = merger.run(Category::Movies).await.unwrap();
        let second = store.load(Category::Movies).await;

        assert_eq!(report.stop, StopReason::NoNewItems);
        assert_eq!(report.new_items, 0);
        assert_eq!(first, second);
        assert_eq!(fetcher.requests(), vec![page_url(0)]);
    }

    #[tokio::test]
    async fn failed_listing_page_keeps_saved_pages() {
        let tmp = TempDir::new().unwrap();
        let store = HistoryStore::new(tmp.path());
        let fetcher = MemoryFetcher::default()
            .with_page(&page_url(0), listing_page(&[movie_node("1", "甲", "2024-03-01")]));
        let merger = PaginationMerger::new(&fetcher, &store, "u1", Pacing::none());

        let err = merger.run(Category::Movies).await.unwrap_err();
        assert!(matches!(err, ScrapeError::Fetch(_)));
        assert_eq!(store.load(Category::Movies).await.len(), 1);
    }

    #[tokio::test]
    async fn one_failing_category_does_not_stop_the_rest() {
        let tmp = TempDir::new().unwrap();
        let store = HistoryStore::new(tmp.path());
        let fetcher = MemoryFetcher::default()
            .with_page(&Category::Books.page_url("u1", 0), listing_page(&[]));

        let err = run_categories(
            &fetcher,
            &store,
            "u1",
            Pacing::none(),
            &[Category::Movies, Category::Books],
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ScrapeError::CategoriesFailed(ref c) if c == &vec![Category::Movies]));
        assert!(fetcher.requests().contains(&Category::Books.page_url("u1", 0)));
    }

    #[tokio::test]
    async fn missing_credentials_abort_before_any_request() {
        let tmp = TempDir::new().unwrap();
        let settings = ScrapeSettings {
            cookie: None,
            user_id: Some("u1".into()),
            data_dir: tmp.path().to_path_buf(),
            pacing: Pacing::none(),
            categories: Category::ALL.to_vec(),
        };
        let err = scrape_all(&settings).await.unwrap_err();
        assert!(matches!(err, ScrapeError::Config(_)));
        assert!(!tmp.path().join("movies.json").exists());
    }
}
