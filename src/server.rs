//! HTTP front for the dashboard: static files, the cover cache, the refresh
//! trigger and a JSON rendition of the dashboard.

use crate::analysis::{self, Dashboard};
use crate::category::Category;
use crate::config::ScrapeSettings;
use crate::error::{FetchError, ScrapeError};
use crate::fetch::USER_AGENT;
use crate::filter::{FilterQuery, YearOptions, year_options};
use crate::gate::RefreshGate;
use crate::merger::{MergeReport, scrape_all};
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Datelike, Local};
use reqwest::header;
use serde::Serialize;
use serde_json::Value;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Runs one full scrape when the refresh endpoint is hit.
#[async_trait::async_trait]
pub trait ScrapeRunner: Send + Sync {
    async fn run(&self) -> Result<Vec<MergeReport>, ScrapeError>;
}

#[async_trait::async_trait]
impl ScrapeRunner for ScrapeSettings {
    async fn run(&self) -> Result<Vec<MergeReport>, ScrapeError> {
        scrape_all(self).await
    }
}

/// Downloads cover images for the local cache.
#[async_trait::async_trait]
pub trait ImageSource: Send + Sync {
    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

#[async_trait::async_trait]
impl ImageSource for reqwest::Client {
    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let resp = self.get(url).header(header::USER_AGENT, USER_AGENT).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(resp.bytes().await?.to_vec())
    }
}

#[derive(Clone)]
pub struct AppState {
    pub data_dir: PathBuf,
    pub gate: RefreshGate,
    pub runner: Arc<dyn ScrapeRunner>,
    pub images: Arc<dyn ImageSource>,
}

impl AppState {
    pub fn new(
        data_dir: impl Into<PathBuf>,
        runner: Arc<dyn ScrapeRunner>,
        images: Arc<dyn ImageSource>,
    ) -> Self {
        Self {
            data_dir: data_dir.into(),
            gate: RefreshGate::new(),
            runner,
            images,
        }
    }

    pub fn pic_dir(&self) -> PathBuf {
        self.data_dir.join("pic")
    }

    fn movies_path(&self) -> PathBuf {
        self.data_dir.join(format!("{}.json", Category::Movies))
    }
}

pub fn create_router(state: AppState, static_dir: &Path) -> Router {
    Router::new()
        .route("/api/cache-image", post(cache_image))
        .route("/api/fresh", get(fresh))
        .route("/api/dashboard", get(dashboard))
        .route_service("/analysis", ServeFile::new(static_dir.join("analysis.html")))
        .nest_service("/data", ServeDir::new(&state.data_dir))
        .fallback_service(ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(state: AppState, static_dir: &Path, port: u16) -> std::io::Result<()> {
    tokio::fs::create_dir_all(state.pic_dir()).await?;
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("Server running at http://localhost:{}", port);

    axum::serve(listener, create_router(state, static_dir))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Server shutting down");
        })
        .await
}

fn text_field(body: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| body.get(key))
        .find_map(|value| match value {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

/// Only plain file names are accepted as cache keys.
fn is_safe_id(id: &str) -> bool {
    !id.contains(['/', '\\']) && id != "." && id != ".."
}

/// `POST /api/cache-image` with `{pic_id | id, url}`.
pub async fn cache_image(State(state): State<AppState>, body: Bytes) -> Response {
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let pic_id = text_field(&body, &["pic_id", "id"]);
    let url = text_field(&body, &["url"]);
    let (Some(pic_id), Some(url)) = (pic_id, url) else {
        return (StatusCode::BAD_REQUEST, "missing id or url").into_response();
    };
    if !is_safe_id(&pic_id) {
        return (StatusCode::BAD_REQUEST, "invalid id").into_response();
    }

    let bytes = match state.images.fetch_image(&url).await {
        Ok(bytes) => bytes,
        Err(FetchError::Status { status, .. }) => {
            warn!("Cover {} answered {}", url, status);
            return (StatusCode::BAD_GATEWAY, "fetch remote failed").into_response();
        }
        Err(e) => {
            error!("Cover {} failed: {}", url, e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "cache failed").into_response();
        }
    };

    let dir = state.pic_dir();
    let path = dir.join(format!("{pic_id}.jpg"));
    let written = async {
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(&path, &bytes).await
    }
    .await;
    match written {
        Ok(()) => (StatusCode::OK, "ok").into_response(),
        Err(e) => {
            error!("Cannot write {}: {}", path.display(), e);
            (StatusCode::INTERNAL_SERVER_ERROR, "cache failed").into_response()
        }
    }
}

/// `GET /api/fresh`: one full scrape at a time, later callers get 409. The
/// run is its own task holding the permit, so a dropped request does not
/// cut it short.
pub async fn fresh(State(state): State<AppState>) -> Response {
    let Some(permit) = state.gate.try_acquire() else {
        warn!("Fetch already in progress, rejecting new request");
        return (StatusCode::CONFLICT, "fetch already in progress").into_response();
    };

    let runner = state.runner.clone();
    let run = tokio::spawn(async move {
        let _permit = permit;
        let result = runner.run().await;
        info!("Fetch lock released");
        result
    });

    match run.await {
        Ok(Ok(reports)) => {
            let added: usize = reports.iter().map(|r| r.new_items).sum();
            info!("Fetch completed, {} new items", added);
            (StatusCode::OK, "fetch completed").into_response()
        }
        Ok(Err(e)) => {
            error!("Fetch failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "fetch failed").into_response()
        }
        Err(e) => {
            error!("Fetch task died: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "fetch failed").into_response()
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub year_options: YearOptions,
    #[serde(flatten)]
    pub dashboard: Dashboard,
}

/// `GET /api/dashboard?preset=&start=&end=&year=&month=`
pub async fn dashboard(State(state): State<AppState>, Query(query): Query<FilterQuery>) -> Response {
    let path = state.movies_path();
    let items = match analysis::load_items(&path.to_string_lossy()).await {
        Ok(items) => items,
        Err(e) => {
            error!("{}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
        }
    };
    let today = Local::now().date_naive();
    let range = query.resolve(today);
    Json(DashboardResponse {
        year_options: year_options(&items, today.year()),
        dashboard: analysis::analyze(&items, &range),
    })
    .into_response()
}
