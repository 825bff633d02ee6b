//! Market commentary and news collaborators.
//!
//! Both are advisory: failures are logged by callers and rendered as "no data",
//! and nothing here can touch simulation state.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod http;
pub mod mock;

pub use http::HttpCommentaryProvider;
pub use mock::MockCommentaryProvider;

pub const DEFAULT_NEWS_URL: &str = "https://finance.google.com";
const MAX_SOURCES: usize = 5;
const MAX_STRATEGIES: usize = 3;
const DEFAULT_SCORE: u8 = 50;
const FALLBACK_STRATEGIES: [&str; 3] = ["Watch key levels", "Manage risk", "Monitor volume"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sentiment {
    Bullish,
    Bearish,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketInsight {
    pub summary: String,
    pub sentiment: Sentiment,
    /// 0..=100
    pub score: u8,
    pub strategies: Vec<String>,
    pub sources: Vec<Source>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    pub source: String,
    /// Relative time as reported, e.g. "2 hours ago".
    pub time: String,
    pub url: String,
}

/// Error type for commentary and news lookups.
#[derive(Debug, Clone)]
pub enum CommentaryError {
    NetworkError(String),
    HttpError { status: u16, message: String },
    ParseError(String),
    RateLimited,
    Unavailable(String),
}

impl fmt::Display for CommentaryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommentaryError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            CommentaryError::HttpError { status, message } => {
                write!(f, "HTTP error {}: {}", status, message)
            }
            CommentaryError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            CommentaryError::RateLimited => write!(f, "Rate limited"),
            CommentaryError::Unavailable(msg) => write!(f, "Commentary unavailable: {}", msg),
        }
    }
}

impl std::error::Error for CommentaryError {}

/// Produces a market read for one instrument.
#[async_trait]
pub trait CommentaryProvider: Send + Sync + fmt::Debug {
    async fn get_insight(&self, symbol: &str, name: &str)
        -> Result<MarketInsight, CommentaryError>;
}

/// Produces recent headlines for a market category. An empty list is valid.
#[async_trait]
pub trait NewsProvider: Send + Sync + fmt::Debug {
    async fn get_news(&self, category: &str) -> Result<Vec<NewsArticle>, CommentaryError>;
}

/// A grounding reference as returned by the commentary backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawSource {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, alias = "uri")]
    pub url: Option<String>,
}

/// Turn a free-text analysis into a structured insight.
///
/// The text is expected to carry `SENTIMENT:`, `SCORE:` and `STRATEGIES:`
/// sections after a leading summary, but every field has a fallback.
pub fn parse_insight(text: &str, sources: Vec<RawSource>) -> MarketInsight {
    // ASCII lowercasing keeps byte offsets aligned with `text`.
    let lower = text.to_ascii_lowercase();

    let sentiment = if lower.contains("bullish") {
        Sentiment::Bullish
    } else if lower.contains("bearish") {
        Sentiment::Bearish
    } else {
        Sentiment::Neutral
    };

    let summary_end = ["sentiment:", "score:", "strategies:"]
        .iter()
        .filter_map(|marker| lower.find(marker))
        .min()
        .unwrap_or(text.len());

    MarketInsight {
        summary: text[..summary_end].trim().to_string(),
        sentiment,
        score: parse_score(text, &lower),
        strategies: parse_strategies(text, &lower),
        sources: sources
            .into_iter()
            .filter_map(|s| {
                let url = s.url.filter(|u| !u.is_empty() && u != "#")?;
                Some(Source {
                    title: s.title.unwrap_or_else(|| "Search Result".to_string()),
                    url,
                })
            })
            .take(MAX_SOURCES)
            .collect(),
    }
}

fn parse_score(text: &str, lower: &str) -> u8 {
    let Some(at) = lower.find("score:") else {
        return DEFAULT_SCORE;
    };
    let digits: String = text[at + "score:".len()..]
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    match digits.parse::<u64>() {
        Ok(score) => score.min(100) as u8,
        Err(_) => DEFAULT_SCORE,
    }
}

fn parse_strategies(text: &str, lower: &str) -> Vec<String> {
    const MARKER: &str = "strategies:";
    let strategies: Vec<String> = match lower.find(MARKER) {
        Some(at) => {
            let start = at + MARKER.len();
            let end = lower[start..]
                .find(MARKER)
                .map(|i| start + i)
                .unwrap_or(text.len());
            text[start..end]
                .lines()
                .map(|line| {
                    line.trim()
                        .trim_start_matches(|c: char| {
                            c.is_ascii_digit() || matches!(c, '.' | '-' | '*' | ')')
                        })
                        .trim()
                        .to_string()
                })
                .filter(|line| line.len() > 10)
                .take(MAX_STRATEGIES)
                .collect()
        }
        None => Vec::new(),
    };

    if strategies.is_empty() {
        FALLBACK_STRATEGIES.iter().map(|s| s.to_string()).collect()
    } else {
        strategies
    }
}
