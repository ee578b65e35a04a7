use serde::Serialize;
use std::collections::HashMap;

/// Count plus rating sum for one label.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bucket {
    pub count: usize,
    pub rating_sum: f64,
    pub rating_count: usize,
}

impl Bucket {
    pub fn add(&mut self, rating: Option<u8>) {
        self.count += 1;
        if let Some(r) = rating {
            self.rating_sum += f64::from(r);
            self.rating_count += 1;
        }
    }

    pub fn avg_rating(&self) -> Option<f64> {
        (self.rating_count > 0).then(|| self.rating_sum / self.rating_count as f64)
    }
}

/// A bucket flattened for output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketEntry {
    pub key: String,
    pub count: usize,
    pub avg_rating: Option<f64>,
}

/// Buckets keyed by label, remembering first-insertion order so ties in
/// later sorts resolve the same way on every pass.
#[derive(Debug, Clone, Default)]
pub struct BucketMap {
    index: HashMap<String, usize>,
    entries: Vec<(String, Bucket)>,
}

impl BucketMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: &str, rating: Option<u8>) {
        let idx = match self.index.get(key) {
            Some(&idx) => idx,
            None => {
                self.entries.push((key.to_string(), Bucket::default()));
                self.index.insert(key.to_string(), self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        self.entries[idx].1.add(rating);
    }

    pub fn get(&self, key: &str) -> Option<&Bucket> {
        self.index.get(key).map(|&idx| &self.entries[idx].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> Vec<BucketEntry> {
        self.entries
            .iter()
            .map(|(key, bucket)| BucketEntry {
                key: key.clone(),
                count: bucket.count,
                avg_rating: bucket.avg_rating(),
            })
            .collect()
    }

    /// Most frequent first; equal counts keep insertion order.
    pub fn by_count(&self) -> Vec<BucketEntry> {
        let mut list = self.entries();
        list.sort_by(|a, b| b.count.cmp(&a.count));
        list
    }

    pub fn by_key(&self) -> Vec<BucketEntry> {
        let mut list = self.entries();
        list.sort_by(|a, b| a.key.cmp(&b.key));
        list
    }
}

/// `count / total` as a percentage rounded to one decimal, `0.0` for an
/// empty total.
pub fn share(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 * 1000.0 / total as f64).round() / 10.0
}

pub fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrated_entries_count_but_do_not_average() {
        let mut map = BucketMap::new();
        map.add("科幻", Some(4));
        map.add("科幻", None);
        map.add("喜剧", None);
        let scifi = map.get("科幻").unwrap();
        assert_eq!(scifi.count, 2);
        assert_eq!(scifi.avg_rating(), Some(4.0));
        assert_eq!(map.get("喜剧").unwrap().avg_rating(), None);
    }

    #[test]
    fn count_ties_keep_first_seen_order() {
        let mut map = BucketMap::new();
        for key in ["b", "a", "c", "a"] {
            map.add(key, None);
        }
        let keys: Vec<_> = map.by_count().into_iter().map(|e| e.key).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        let keys: Vec<_> = map.by_key().into_iter().map(|e| e.key).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[test]
    fn shares_round_to_one_decimal() {
        assert_eq!(share(3, 5), 60.0);
        assert_eq!(share(1, 3), 33.3);
        assert_eq!(share(2, 0), 0.0);
    }
}
