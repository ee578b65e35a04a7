//! Comment volume, keyword extraction and a word-list sentiment tally.
//!
//! The keyword pass is a heuristic: Latin words are filtered by length,
//! stop words and a handful of English suffixes; CJK runs are cut into every
//! 2- to 4-character n-gram.

#![allow(clippy::expect_used)]

use crate::item::Item;
use regex::Regex;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

pub const TOP_KEYWORDS: usize = 10;
const MAX_TOKEN_LEN: usize = 30;
const UNKNOWN_TITLE: &str = "未知影片";

static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "the", "a", "an", "and", "or", "but", "if", "then", "else", "when", "while", "of", "at",
        "by", "for", "with", "without", "to", "from", "in", "on", "into", "onto", "over", "under",
        "as", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had", "do",
        "does", "did", "will", "would", "shall", "should", "can", "could", "may", "might", "must",
        "this", "that", "these", "those", "it", "its", "he", "she", "they", "them", "we", "you",
        "your", "i", "me", "my", "mine", "our", "ours", "their", "theirs", "who", "whom", "which",
        "what", "where", "why", "how", "movie", "film", "watch", "watched", "seen", "like",
        "just", "very", "also", "one", "two", "get", "got", "see", "的", "了", "在", "和", "是",
        "也", "就", "都", "而", "与", "或", "及", "被", "于", "对", "从", "到", "但", "而且",
        "所以", "如果", "因为", "还有", "我们", "你们", "他们", "她们", "它们", "这", "那",
        "一个", "没有", "还是", "已经", "就是", "对于", "以及", "其中", "其中的",
    ]
    .into_iter()
    .collect()
});

const NOUN_SUFFIXES: [&str; 12] = [
    "ment", "ness", "tion", "sion", "ity", "er", "or", "ist", "ism", "age", "ence", "ship",
];
const ADJ_SUFFIXES: [&str; 12] = [
    "able", "ible", "al", "ful", "ic", "ive", "less", "ous", "ish", "y", "ent", "ant",
];

const POSITIVE_WORDS: [&str; 13] = [
    "good", "great", "love", "excellent", "amazing", "favorite", "喜欢", "好看", "精彩", "推荐",
    "不错", "喜爱", "超赞",
];
const NEGATIVE_WORDS: [&str; 12] = [
    "bad", "terrible", "boring", "worst", "disappoint", "hate", "难看", "糟糕", "失望", "无聊",
    "一般", "欠缺",
];

static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\x{4e00}-\x{9fff}A-Za-z0-9]+").expect("NON_WORD regex"));
static LATIN_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]+$").expect("LATIN_WORD regex"));
static INFLECTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(ing|ed|s)$").expect("INFLECTED regex"));
static CJK_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\x{4e00}-\x{9fff}]+").expect("CJK_RUN regex"));

fn has_affix(token: &str) -> bool {
    NOUN_SUFFIXES
        .iter()
        .chain(ADJ_SUFFIXES.iter())
        .any(|suffix| token.ends_with(suffix))
}

fn is_cjk(token: &str) -> bool {
    token.chars().any(|c| ('\u{4e00}'..='\u{9fff}').contains(&c))
}

fn tokenize(text: &str) -> Vec<String> {
    let cleaned = NON_WORD.replace_all(text, " ");
    let mut tokens = Vec::new();

    for part in cleaned.split_whitespace() {
        if LATIN_WORD.is_match(part) {
            let word = part.to_lowercase();
            let len = word.chars().count();
            if len < 3 || STOP_WORDS.contains(word.as_str()) {
                continue;
            }
            if INFLECTED.is_match(&word) && len <= 5 {
                continue;
            }
            if has_affix(&word) || len >= 4 {
                tokens.push(word);
            }
            continue;
        }

        for run in CJK_RUN.find_iter(part) {
            let chars: Vec<char> = run.as_str().chars().collect();
            let max_n = chars.len().min(4);
            for n in 2..=max_n {
                for window in chars.windows(n) {
                    let gram: String = window.iter().collect();
                    if !STOP_WORDS.contains(gram.as_str()) {
                        tokens.push(gram);
                    }
                }
            }
        }
    }
    tokens
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Keyword {
    pub token: String,
    pub count: usize,
}

/// Most frequent tokens. Ties go to CJK tokens, then suffix-matching
/// tokens, then shorter ones.
pub fn keywords(text: &str, top_n: usize) -> Vec<Keyword> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut ranked: Vec<Keyword> = Vec::new();
    for token in tokenize(text) {
        if token.is_empty() || token.chars().count() > MAX_TOKEN_LEN {
            continue;
        }
        match index.get(&token) {
            Some(&idx) => ranked[idx].count += 1,
            None => {
                index.insert(token.clone(), ranked.len());
                ranked.push(Keyword { token, count: 1 });
            }
        }
    }

    ranked.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| is_cjk(&b.token).cmp(&is_cjk(&a.token)))
            .then_with(|| has_affix(&b.token).cmp(&has_affix(&a.token)))
            .then_with(|| a.token.chars().count().cmp(&b.token.chars().count()))
    });
    ranked.truncate(top_n);
    ranked
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Sentiment {
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
}

/// +1 per positive word present, -1 per negative word present.
pub fn sentiment_score(comment: &str) -> i32 {
    let lower = comment.to_lowercase();
    let hits = |words: &[&str]| words.iter().filter(|w| lower.contains(*w)).count() as i32;
    hits(&POSITIVE_WORDS) - hits(&NEGATIVE_WORDS)
}

pub fn sentiment<'a>(comments: impl IntoIterator<Item = &'a str>) -> Sentiment {
    let mut tally = Sentiment::default();
    for comment in comments {
        match sentiment_score(comment) {
            s if s > 0 => tally.positive += 1,
            s if s < 0 => tally.negative += 1,
            _ => tally.neutral += 1,
        }
    }
    tally
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LongestComment {
    pub title: String,
    pub length: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentAnalysis {
    pub count: usize,
    pub total_chars: usize,
    pub avg_chars: Option<f64>,
    pub longest: Option<LongestComment>,
    pub keywords: Vec<Keyword>,
    pub sentiment: Sentiment,
}

pub fn analyze_comments(items: &[&Item]) -> CommentAnalysis {
    let mut comments: Vec<(&str, &str)> = Vec::new();
    for item in items {
        let title = if item.title.is_empty() {
            UNKNOWN_TITLE
        } else {
            item.title.as_str()
        };
        for text in &item.comments {
            let text = text.trim();
            if !text.is_empty() {
                comments.push((text, title));
            }
        }
    }

    let mut total_chars = 0;
    let mut longest: Option<LongestComment> = None;
    for &(text, title) in &comments {
        let length = text.chars().count();
        total_chars += length;
        if longest.as_ref().is_none_or(|l| length > l.length) {
            longest = Some(LongestComment {
                title: title.to_string(),
                length,
            });
        }
    }

    let joined = comments
        .iter()
        .map(|(text, _)| *text)
        .collect::<Vec<_>>()
        .join(" ");

    CommentAnalysis {
        count: comments.len(),
        total_chars,
        avg_chars: (!comments.is_empty()).then(|| total_chars as f64 / comments.len() as f64),
        longest,
        keywords: keywords(&joined, TOP_KEYWORDS),
        sentiment: sentiment(comments.iter().map(|(text, _)| *text)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(text: &str) -> Vec<String> {
        tokenize(text)
    }

    #[test]
    fn latin_filters() {
        assert!(tokens("an ok the").is_empty());
        // short inflected forms are dropped, longer ones are kept
        assert!(tokens("cats liked").is_empty());
        assert_eq!(tokens("stunning"), vec!["stunning"]);
        // three-letter words survive only through a suffix
        assert_eq!(tokens("ivy fun"), vec!["ivy"]);
        assert_eq!(tokens("Direction"), vec!["direction"]);
    }

    #[test]
    fn cjk_runs_become_ngrams() {
        assert_eq!(tokens("好看"), vec!["好看"]);
        assert_eq!(
            tokens("剧情紧凑"),
            vec!["剧情", "情紧", "紧凑", "剧情紧", "情紧凑", "剧情紧凑"]
        );
        assert!(tokens("的").is_empty());
        assert!(tokens("我们").is_empty());
    }

    #[test]
    fn ties_prefer_cjk_then_affix_then_short() {
        let ranked = keywords("happiness wonderful kindness 配乐 stunning", 10);
        let order: Vec<_> = ranked.iter().map(|k| k.token.as_str()).collect();
        assert_eq!(
            order,
            vec!["配乐", "kindness", "happiness", "wonderful", "stunning"]
        );
    }

    #[test]
    fn frequency_wins_over_tie_breaks() {
        let ranked = keywords("stunning stunning 配乐", 1);
        assert_eq!(
            ranked,
            vec![Keyword {
                token: "stunning".into(),
                count: 2
            }]
        );
    }

    #[test]
    fn sentiment_buckets() {
        let tally = sentiment(["很好看，推荐", "Boring and BAD", "好看但是无聊", "平平无奇"]);
        assert_eq!(
            tally,
            Sentiment {
                positive: 1,
                neutral: 2,
                negative: 1
            }
        );
    }

    #[test]
    fn longest_comment_first_seen_wins() {
        let a = Item {
            title: "甲".into(),
            comments: vec!["一二三".into()],
            ..Item::default()
        };
        let b = Item {
            comments: vec!["四五六".into(), "  ".into()],
            ..Item::default()
        };
        let analysis = analyze_comments(&[&a, &b]);
        assert_eq!(analysis.count, 2);
        assert_eq!(analysis.total_chars, 6);
        assert_eq!(analysis.avg_chars, Some(3.0));
        assert_eq!(
            analysis.longest,
            Some(LongestComment {
                title: "甲".into(),
                length: 3
            })
        );
    }

    #[test]
    fn no_comments() {
        let analysis = analyze_comments(&[]);
        assert_eq!(analysis.count, 0);
        assert_eq!(analysis.avg_chars, None);
        assert_eq!(analysis.longest, None);
        assert!(analysis.keywords.is_empty());
    }
}
