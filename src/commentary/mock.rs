//! Offline commentary for tests and for running without a backend.

use super::{
    parse_insight, CommentaryError, CommentaryProvider, MarketInsight, NewsArticle, NewsProvider,
};
use async_trait::async_trait;

/// Mock provider that returns canned data.
#[derive(Debug, Clone, Default)]
pub struct MockCommentaryProvider {
    insight: Option<MarketInsight>,
    news: Vec<NewsArticle>,
    failing: bool,
}

impl MockCommentaryProvider {
    /// Create a mock that synthesizes a neutral read for any symbol.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return this insight for every symbol.
    pub fn with_insight(mut self, insight: MarketInsight) -> Self {
        self.insight = Some(insight);
        self
    }

    pub fn with_news(mut self, news: Vec<NewsArticle>) -> Self {
        self.news = news;
        self
    }

    /// Make every call fail.
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }
}

#[async_trait]
impl CommentaryProvider for MockCommentaryProvider {
    async fn get_insight(
        &self,
        symbol: &str,
        name: &str,
    ) -> Result<MarketInsight, CommentaryError> {
        if self.failing {
            return Err(CommentaryError::Unavailable("mock failure".to_string()));
        }
        if let Some(insight) = &self.insight {
            return Ok(insight.clone());
        }

        let text = format!(
            "{} ({}) is trading in a range with no strong catalyst.\nSCORE: 50",
            name, symbol
        );
        Ok(parse_insight(&text, Vec::new()))
    }
}

#[async_trait]
impl NewsProvider for MockCommentaryProvider {
    async fn get_news(&self, _category: &str) -> Result<Vec<NewsArticle>, CommentaryError> {
        if self.failing {
            return Err(CommentaryError::Unavailable("mock failure".to_string()));
        }
        Ok(self.news.clone())
    }
}
