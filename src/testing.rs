//! In-memory fixtures shared by the unit tests.

use crate::PageFetcher;
use crate::error::FetchError;
use std::collections::HashMap;
use std::sync::Mutex;

/// Serves canned pages by URL; unknown URLs fail like a 404.
#[derive(Default)]
pub struct MemoryFetcher {
    pages: Mutex<HashMap<String, String>>,
    requests: Mutex<Vec<String>>,
}

impl MemoryFetcher {
    pub fn with_page(self, url: &str, html: impl Into<String>) -> Self {
        self.set_page(url, html);
        self
    }

    pub fn with_detail(self, id: &str, genres: &[&str], runtime: &str, release: &str) -> Self {
        let url = movie_link(id);
        self.with_page(&url, detail_page(genres, runtime, release))
    }

    pub fn set_page(&self, url: &str, html: impl Into<String>) {
        self.pages
            .lock()
            .unwrap()
            .insert(url.to_string(), html.into());
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn clear_requests(&self) {
        self.requests.lock().unwrap().clear();
    }
}

#[async_trait::async_trait]
impl PageFetcher for MemoryFetcher {
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());
        self.pages
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Status {
                status: 404,
                url: url.to_string(),
            })
    }
}

pub fn movie_link(id: &str) -> String {
    format!("https://movie.douban.com/subject/{id}/")
}

pub fn movie_node(id: &str, title: &str, date: &str) -> String {
    format!(
        r#"<div class="comment-item">
            <div class="pic"><img src="https://img.example/{id}.jpg"></div>
            <div class="info"><ul>
                <li class="title"><a href="{link}"><em>{title}</em></a></li>
                <li><span class="rating4-t"></span><span class="date">{date}</span></li>
                <li><span class="comment">{title} 不错</span></li>
            </ul></div>
        </div>"#,
        link = movie_link(id),
    )
}

pub fn listing_page(nodes: &[String]) -> String {
    format!(
        "<html><body><div class=\"grid-view\">{}</div></body></html>",
        nodes.join("\n")
    )
}

pub fn detail_page(genres: &[&str], runtime: &str, release: &str) -> String {
    let genres = genres
        .iter()
        .map(|g| format!(r#"<span property="v:genre">{g}</span>"#))
        .collect::<Vec<_>>()
        .join(" / ");
    format!(
        r#"<html><body><div id="info">
            <span><span class="pl">导演</span>: <span class="attrs"><a>某导演</a></span></span><br/>
            <span class="pl">类型:</span> {genres}<br/>
            <span class="pl">制片国家/地区:</span> 中国大陆 / 香港<br/>
            <span class="pl">语言:</span> 汉语普通话<br/>
            <span class="pl">上映日期:</span> <span>{release}</span><br/>
            <span class="pl">片长:</span> <span>{runtime}</span><br/>
        </div></body></html>"#
    )
}
