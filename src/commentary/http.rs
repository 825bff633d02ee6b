//! HTTP client for a text-generation commentary backend.
//!
//! Endpoints (POST, JSON):
//! - `{base}/insight` with `{"symbol", "name"}` answers `{"text", "sources": [{title, url}]}`
//! - `{base}/news` with `{"category"}` answers `{"articles": [{title, source, time}], "sources": [...]}`

use super::{
    parse_insight, CommentaryError, CommentaryProvider, MarketInsight, NewsArticle, NewsProvider,
    RawSource, DEFAULT_NEWS_URL,
};
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct HttpCommentaryProvider {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct InsightResponse {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    sources: Vec<RawSource>,
}

#[derive(Debug, Deserialize)]
struct RawArticle {
    title: String,
    source: String,
    time: String,
}

#[derive(Debug, Deserialize)]
struct NewsResponse {
    #[serde(default)]
    articles: Vec<RawArticle>,
    #[serde(default)]
    sources: Vec<RawSource>,
}

impl HttpCommentaryProvider {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn post<T: DeserializeOwned + Send>(
        &self,
        path: &str,
        payload: serde_json::Value,
    ) -> Result<T, CommentaryError> {
        let url = format!("{}/{}", self.base_url, path);
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(30)),
            ..Default::default()
        };

        retry(backoff, || async {
            let response = self
                .client
                .post(&url)
                .json(&payload)
                .send()
                .await
                .map_err(|e| {
                    backoff::Error::transient(CommentaryError::NetworkError(e.to_string()))
                })?;

            let status = response.status();
            if status == 429 {
                return Err(backoff::Error::transient(CommentaryError::RateLimited));
            }
            if status.is_server_error() {
                return Err(backoff::Error::transient(CommentaryError::HttpError {
                    status: status.as_u16(),
                    message: "Server error".to_string(),
                }));
            }
            if !status.is_success() {
                return Err(backoff::Error::permanent(CommentaryError::HttpError {
                    status: status.as_u16(),
                    message: "Client error".to_string(),
                }));
            }

            response
                .json::<T>()
                .await
                .map_err(|e| backoff::Error::permanent(CommentaryError::ParseError(e.to_string())))
        })
        .await
    }
}

#[async_trait]
impl CommentaryProvider for HttpCommentaryProvider {
    async fn get_insight(
        &self,
        symbol: &str,
        name: &str,
    ) -> Result<MarketInsight, CommentaryError> {
        debug!("Fetching insight for {} ({})", name, symbol);

        let payload = serde_json::json!({ "symbol": symbol, "name": name });
        let response: InsightResponse = self.post("insight", payload).await?;
        let text = response
            .text
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| "Unable to generate insights.".to_string());

        Ok(parse_insight(&text, response.sources))
    }
}

#[async_trait]
impl NewsProvider for HttpCommentaryProvider {
    async fn get_news(&self, category: &str) -> Result<Vec<NewsArticle>, CommentaryError> {
        debug!("Fetching news for category={}", category);

        let payload = serde_json::json!({ "category": category });
        let response: NewsResponse = self.post("news", payload).await?;

        Ok(attach_urls(response.articles, response.sources))
    }
}

/// Pair headlines with grounding links by position.
fn attach_urls(articles: Vec<RawArticle>, sources: Vec<RawSource>) -> Vec<NewsArticle> {
    articles
        .into_iter()
        .enumerate()
        .map(|(i, article)| NewsArticle {
            title: article.title,
            source: article.source,
            time: article.time,
            url: sources
                .get(i)
                .and_then(|s| s.url.clone())
                .filter(|u| !u.is_empty())
                .unwrap_or_else(|| DEFAULT_NEWS_URL.to_string()),
        })
        .collect()
}
