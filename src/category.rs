//! The four tracked collections and their per-site scraping rules.
//!
//! Everything that differs between categories lives in one table row, so
//! the parser never branches on the category name itself.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Movies,
    Books,
    Music,
    Games,
}

/// Where a listing node keeps the user's short comment.
#[derive(Debug, Clone, Copy)]
pub enum CommentRule {
    /// Text of the first element matching the selector.
    Element(&'static str),
    /// Text of the `index`-th match, dropped when it starts with `discard_prefix`.
    Nth {
        selector: &'static str,
        index: usize,
        discard_prefix: Option<&'static str>,
    },
}

/// Scraping rules for one category.
#[derive(Debug)]
pub struct CategorySpec {
    pub category: Category,
    pub name: &'static str,
    /// Selector for one listing entry.
    pub node_selector: &'static str,
    pub comment: CommentRule,
    /// Listing URL with a `{uid}` placeholder, ending in `?` or `&`.
    pub listing: &'static str,
    /// Whether items keep the `desc` publication/track line.
    pub keeps_desc: bool,
    /// Whether new items get a detail-page fetch.
    pub fetches_detail: bool,
}

const DEFAULT_NODE_SELECTOR: &str = ".subject-item";
const COMMENT_ITEM_SELECTOR: &str = ".comment-item";

static SPECS: [CategorySpec; 4] = [
    CategorySpec {
        category: Category::Movies,
        name: "movies",
        node_selector: COMMENT_ITEM_SELECTOR,
        comment: CommentRule::Element(".comment"),
        listing: "https://movie.douban.com/people/{uid}/collect?",
        keeps_desc: false,
        fetches_detail: true,
    },
    CategorySpec {
        category: Category::Books,
        name: "books",
        node_selector: DEFAULT_NODE_SELECTOR,
        comment: CommentRule::Element(".comment"),
        listing: "https://book.douban.com/people/{uid}/collect?",
        keeps_desc: true,
        fetches_detail: false,
    },
    CategorySpec {
        category: Category::Music,
        name: "music",
        node_selector: COMMENT_ITEM_SELECTOR,
        comment: CommentRule::Nth {
            selector: ".info > ul > li",
            index: 3,
            discard_prefix: Some("修改"),
        },
        listing: "https://music.douban.com/people/{uid}/collect?",
        keeps_desc: true,
        fetches_detail: false,
    },
    CategorySpec {
        category: Category::Games,
        name: "games",
        node_selector: ".common-item",
        comment: CommentRule::Nth {
            selector: ".content > div",
            index: 2,
            discard_prefix: None,
        },
        listing: "https://www.douban.com/people/{uid}/games?action=collect&",
        keeps_desc: true,
        fetches_detail: false,
    },
];

impl Category {
    /// Run order of a full scrape.
    pub const ALL: [Category; 4] = [
        Category::Movies,
        Category::Books,
        Category::Music,
        Category::Games,
    ];

    pub fn spec(self) -> &'static CategorySpec {
        &SPECS[self as usize]
    }

    pub fn as_str(self) -> &'static str {
        self.spec().name
    }

    /// Listing URL for one page, `start` being the item offset.
    pub fn page_url(self, user_id: &str, start: usize) -> String {
        format!("{}start={}", self.spec().listing.replace("{uid}", user_id), start)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SPECS
            .iter()
            .find(|spec| spec.name == s)
            .map(|spec| spec.category)
            .ok_or_else(|| format!("unknown category: {s}"))
    }
}
