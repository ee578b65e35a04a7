//! Per-category JSON documents of accumulated items.

use crate::category::Category;
use crate::error::StoreError;
use crate::item::Item;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::warn;

/// On-disk shape: `{ "items": [...] }`. Entries stay raw until
/// [`parse_items`] decodes them one at a time.
#[derive(Debug, Default, Deserialize)]
struct RawDocument {
    #[serde(default)]
    items: Vec<Value>,
}

#[derive(Serialize)]
struct DocumentRef<'a> {
    items: &'a [Item],
}

/// Decode a stored document. Only a body that is not a document at all is an
/// error; an entry that is not an item is logged and skipped.
pub fn parse_items(body: &str) -> Result<Vec<Item>, serde_json::Error> {
    let doc: RawDocument = serde_json::from_str(body)?;
    let mut items = Vec::with_capacity(doc.items.len());
    for (index, entry) in doc.items.into_iter().enumerate() {
        match Item::deserialize(entry) {
            Ok(item) => items.push(item),
            Err(e) => warn!("Skipping stored entry {}: {}", index, e),
        }
    }
    Ok(items)
}

#[derive(Debug, Clone)]
pub struct HistoryStore {
    dir: PathBuf,
}

impl HistoryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, category: Category) -> PathBuf {
        self.dir.join(format!("{category}.json"))
    }

    /// Stored items, or an empty history when the document is missing or
    /// unreadable.
    pub async fn load(&self, category: Category) -> Vec<Item> {
        let path = self.path(category);
        let body = match tokio::fs::read_to_string(&path).await {
            Ok(body) => body,
            Err(e) if e.kind() == ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!("Cannot read {}: {}", path.display(), e);
                return Vec::new();
            }
        };
        match parse_items(&body) {
            Ok(items) => items,
            Err(e) => {
                warn!("Ignoring unparseable {}: {}", path.display(), e);
                Vec::new()
            }
        }
    }

    /// Rewrite the whole document. The body goes to a sibling temp file first
    /// and is renamed into place.
    pub async fn save(&self, category: Category, items: &[Item]) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let body = serde_json::to_string_pretty(&DocumentRef { items })?;

        let path = self.path(category);
        let tmp = self.dir.join(format!(".{category}.json.tmp"));
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}
