//! Command-line and environment configuration.

use crate::category::Category;
use crate::error::ConfigError;
use crate::fetch::Pacing;
use clap::Args;
use std::path::PathBuf;
use std::time::Duration;

/// Options shared by every command that scrapes.
#[derive(Debug, Clone, Args)]
pub struct ScrapeArgs {
    /// Session cookie sent with every request
    #[arg(long, env = "DOUBAN_COOKIE", hide_env_values = true)]
    pub cookie: Option<String>,

    /// Account id or personal domain whose collections are scraped
    #[arg(long, env = "DOUBAN_USER_ID")]
    pub user_id: Option<String>,

    /// Directory holding the category documents
    #[arg(long, default_value = "./data")]
    pub data_dir: PathBuf,

    /// Delay before each movie detail request
    #[arg(long, default_value_t = 800)]
    pub detail_delay_ms: u64,

    /// Delay between listing pages
    #[arg(long, default_value_t = 1300)]
    pub page_delay_ms: u64,

    /// Restrict the run to these categories (default: all, in order)
    #[arg(long = "category", value_enum)]
    pub categories: Vec<Category>,
}

impl ScrapeArgs {
    pub fn settings(&self) -> ScrapeSettings {
        ScrapeSettings {
            cookie: self.cookie.clone(),
            user_id: self.user_id.clone(),
            data_dir: self.data_dir.clone(),
            pacing: Pacing {
                detail_delay: Duration::from_millis(self.detail_delay_ms),
                page_delay: Duration::from_millis(self.page_delay_ms),
            },
            categories: if self.categories.is_empty() {
                Category::ALL.to_vec()
            } else {
                self.categories.clone()
            },
        }
    }
}

/// Resolved scrape configuration.
#[derive(Debug, Clone)]
pub struct ScrapeSettings {
    pub cookie: Option<String>,
    pub user_id: Option<String>,
    pub data_dir: PathBuf,
    pub pacing: Pacing,
    pub categories: Vec<Category>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub cookie: String,
    pub user_id: String,
}

impl ScrapeSettings {
    /// Both credentials, or the first one missing. Blank counts as missing.
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        let present = |v: &Option<String>| v.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string);
        let cookie = present(&self.cookie).ok_or(ConfigError::MissingCookie)?;
        let user_id = present(&self.user_id).ok_or(ConfigError::MissingUserId)?;
        Ok(Credentials { cookie, user_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(cookie: Option<&str>, user_id: Option<&str>) -> ScrapeSettings {
        ScrapeSettings {
            cookie: cookie.map(String::from),
            user_id: user_id.map(String::from),
            data_dir: PathBuf::from("data"),
            pacing: Pacing::none(),
            categories: Category::ALL.to_vec(),
        }
    }

    #[test]
    fn credentials_require_both_values() {
        assert_eq!(settings(None, Some("u")).credentials(), Err(ConfigError::MissingCookie));
        assert_eq!(settings(Some("c"), Some("  ")).credentials(), Err(ConfigError::MissingUserId));
        assert_eq!(
            settings(Some("bid=1"), Some("ahbei")).credentials(),
            Ok(Credentials {
                cookie: "bid=1".into(),
                user_id: "ahbei".into()
            })
        );
    }
}
