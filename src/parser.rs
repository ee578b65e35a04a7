//! Turns one listing page into items.

use crate::PageFetcher;
use crate::category::Category;
use crate::dom::QueryNode;
use crate::extract;
use crate::fetch::{Pacing, fetch_movie_detail};
use crate::item::Item;
use scraper::Html;
use std::collections::HashSet;
use tracing::info;

/// Items of one page, plus the indexes of those still missing detail data.
#[derive(Debug, Default)]
pub struct ParsedPage {
    pub items: Vec<Item>,
    pub detail_queue: Vec<usize>,
}

/// Build an item from one listing node.
pub fn parse_node<N: QueryNode>(node: &N, category: Category) -> Item {
    let spec = category.spec();
    let title = extract::extract_title(node);
    Item {
        title: title.title,
        title_arr: title.title_arr,
        link: title.link,
        cover: extract::extract_cover(node),
        rating: extract::extract_rating(node),
        updated_at: extract::extract_updated_at(node),
        comments: extract::extract_comment(node, spec.comment).into_iter().collect(),
        desc: spec.keeps_desc.then(|| extract::extract_desc(node)),
        ..Item::default()
    }
}

/// Parse a listing page without touching the network.
///
/// For categories with detail pages, items whose link is non-empty and not
/// in `known_links` are queued, in page order.
pub fn parse_page(html: &str, category: Category, known_links: &HashSet<String>) -> ParsedPage {
    let doc = Html::parse_document(html);
    let spec = category.spec();

    let mut page = ParsedPage::default();
    for node in doc.root_element().select_all(spec.node_selector) {
        let item = parse_node(&node, category);
        if spec.fetches_detail && !item.link.is_empty() && !known_links.contains(&item.link) {
            page.detail_queue.push(page.items.len());
        }
        page.items.push(item);
    }
    page
}

/// Parse a listing page and enrich queued movies from their detail pages,
/// one at a time.
pub async fn parse_items(
    fetcher: &dyn PageFetcher,
    html: &str,
    category: Category,
    known_links: &HashSet<String>,
    pacing: &Pacing,
) -> Vec<Item> {
    let ParsedPage {
        mut items,
        detail_queue,
    } = parse_page(html, category, known_links);

    for idx in detail_queue {
        let item = &mut items[idx];
        info!("Fetching detail for {}: {}", category, item.title);
        let detail = fetch_movie_detail(fetcher, &item.link, pacing).await;
        item.apply_detail(detail);
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::FieldValue;
    use crate::testing::{MemoryFetcher, listing_page, movie_node};

    #[test]
    fn books_keep_desc_and_skip_details() {
        let html = r#"<ul>
            <li class="subject-item"><div class="info">
                <h2><a href="https://book.douban.com/subject/1/" title="活着">活着</a></h2>
                <div class="pub">余华 / 作家出版社</div>
                <span class="rating4-t"></span><span class="date">2022-01-02 读过</span>
                <p class="comment">好书</p>
            </div></li>
        </ul>"#;
        let page = parse_page(html, Category::Books, &HashSet::new());
        assert_eq!(page.items.len(), 1);
        assert!(page.detail_queue.is_empty());
        let item = &page.items[0];
        assert_eq!(item.desc.as_deref(), Some("余华 / 作家出版社"));
        assert_eq!(item.rating, Some(4));
        assert_eq!(item.updated_at, "2022-01-02");
        assert_eq!(item.comments, vec!["好书".to_string()]);
    }

    #[test]
    fn games_take_the_third_content_div_as_comment() {
        let html = r#"<div class="game-list">
            <div class="common-item">
                <div class="pic"><a href="https://www.douban.com/game/26/"><img src="https://img.example/g26.jpg"></a></div>
                <div class="content">
                    <div class="title"><a href="https://www.douban.com/game/26/" title="塞尔达传说：王国之泪">塞尔达传说</a></div>
                    <div class="intro">Switch / 动作 / 冒险</div>
                    <div>  通关了，神作  </div>
                    <div class="rating-info"><span class="rating-star allstar50"></span><span class="date">2023-06-01</span></div>
                </div>
            </div>
            <div class="common-item">
                <div class="content">
                    <div class="title"><a href="https://www.douban.com/game/27/">空洞骑士</a></div>
                    <div class="intro">PC</div>
                </div>
            </div>
        </div>"#;
        let page = parse_page(html, Category::Games, &HashSet::new());
        assert_eq!(page.items.len(), 2);
        assert!(page.detail_queue.is_empty());

        let item = &page.items[0];
        assert_eq!(item.title, "塞尔达传说：王国之泪");
        assert_eq!(item.link, "https://www.douban.com/game/26/");
        assert_eq!(item.cover, "https://img.example/g26.jpg");
        assert_eq!(item.rating, Some(5));
        assert_eq!(item.updated_at, "2023-06-01");
        assert_eq!(item.comments, vec!["通关了，神作".to_string()]);
        assert_eq!(item.desc.as_deref(), Some("Switch / 动作 / 冒险"));
        assert!(item.detail.is_empty());

        let bare = &page.items[1];
        assert_eq!(bare.title, "空洞骑士");
        assert_eq!(bare.rating, None);
        assert_eq!(bare.updated_at, "");
        assert!(bare.comments.is_empty());
        assert_eq!(bare.desc.as_deref(), Some("PC"));
    }

    #[test]
    fn movies_queue_only_unknown_links() {
        let html = listing_page(&[
            movie_node("1", "甲", "2024-01-01"),
            movie_node("2", "乙", "2024-01-02"),
            movie_node("3", "丙", "2024-01-03"),
        ]);
        let known: HashSet<String> = ["https://movie.douban.com/subject/2/".to_string()].into();
        let page = parse_page(&html, Category::Movies, &known);
        assert_eq!(page.items.len(), 3);
        assert_eq!(page.detail_queue, vec![0, 2]);
        assert!(page.items.iter().all(|i| i.desc.is_none()));
    }

    #[tokio::test]
    async fn known_links_never_trigger_detail_fetches() {
        let html = listing_page(&[movie_node("1", "甲", "2024-01-01"), movie_node("2", "乙", "2024-01-02")]);
        let fetcher = MemoryFetcher::default().with_detail("1", &["剧情", "爱情"], "120分钟", "1999-01-01");
        let known: HashSet<String> = ["https://movie.douban.com/subject/2/".to_string()].into();

        let items = parse_items(&fetcher, &html, Category::Movies, &known, &Pacing::none()).await;

        assert_eq!(fetcher.requests(), vec!["https://movie.douban.com/subject/1/".to_string()]);
        assert_eq!(
            items[0].detail.genres,
            Some(FieldValue::Many(vec!["剧情".into(), "爱情".into()]))
        );
        assert_eq!(items[0].detail.duration_minutes, Some(120));
        assert!(items[1].detail.is_empty());
    }

    #[tokio::test]
    async fn failed_detail_fetch_leaves_item_bare() {
        let html = listing_page(&[movie_node("9", "失败", "2024-01-01")]);
        let fetcher = MemoryFetcher::default();

        let items = parse_items(&fetcher, &html, Category::Movies, &HashSet::new(), &Pacing::none()).await;

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "失败");
        assert!(items[0].detail.is_empty());
    }
}
