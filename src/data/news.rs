//! NewsAPI top-headlines client
//!
//! This module fetches pages of headlines from NewsAPI and maps the JSON
//! envelope onto our Article structures.

use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt};
use log::debug;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Deserializer};
use thiserror::Error;

use super::Article;
use crate::feed::FeedSource;

/// Base URL for the NewsAPI top-headlines endpoint
pub const NEWS_API_BASE_URL: &str = "https://newsapi.org/v2/top-headlines";

/// NewsAPI rejects requests without a user agent
const USER_AGENT: &str = concat!("headlines/", env!("CARGO_PKG_VERSION"));

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Errors that can occur when fetching headlines
#[derive(Debug, Error)]
pub enum NewsError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// The API answered with `"status": "error"`
    #[error("News API error ({code}): {message}")]
    Api { code: String, message: String },

    /// Non-success HTTP status without a readable error body
    #[error("Unexpected HTTP status: {0}")]
    HttpStatus(u16),

    /// Missing expected field in response
    #[error("Missing expected field in response: {0}")]
    MissingField(String),
}

/// Headline categories supported by the top-headlines endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Business,
    Entertainment,
    General,
    Health,
    Science,
    Sports,
    Technology,
}

impl Category {
    /// Returns all categories in display order
    pub fn all() -> &'static [Category] {
        &[
            Category::Business,
            Category::Entertainment,
            Category::General,
            Category::Health,
            Category::Science,
            Category::Sports,
            Category::Technology,
        ]
    }

    /// Value sent in the `category` query parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Business => "business",
            Category::Entertainment => "entertainment",
            Category::General => "general",
            Category::Health => "health",
            Category::Science => "science",
            Category::Sports => "sports",
            Category::Technology => "technology",
        }
    }

    /// Parses a category from user input, accepting a few short aliases
    pub fn from_str(s: &str) -> Option<Category> {
        match s.to_lowercase().trim() {
            "business" | "biz" => Some(Category::Business),
            "entertainment" => Some(Category::Entertainment),
            "general" => Some(Category::General),
            "health" => Some(Category::Health),
            "science" | "sci" => Some(Category::Science),
            "sports" | "sport" => Some(Category::Sports),
            "technology" | "tech" => Some(Category::Technology),
            _ => None,
        }
    }
}

/// Which headlines to request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsQuery {
    /// Two-letter country code
    pub country: Option<String>,
    pub category: Option<Category>,
    /// Keyword filter
    pub keywords: Option<String>,
}

impl Default for NewsQuery {
    fn default() -> Self {
        Self {
            country: Some("us".to_string()),
            category: None,
            keywords: None,
        }
    }
}

/// Client for fetching headlines from NewsAPI
#[derive(Debug, Clone)]
pub struct NewsClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    query: NewsQuery,
}

impl NewsClient {
    /// Create a new NewsClient for the public endpoint
    pub fn new(api_key: Option<String>) -> Result<Self, NewsError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self::with_client(client, api_key))
    }

    /// Create a new NewsClient with a custom HTTP client
    pub fn with_client(client: Client, api_key: Option<String>) -> Self {
        Self {
            client,
            api_key,
            base_url: NEWS_API_BASE_URL.to_string(),
            query: NewsQuery::default(),
        }
    }

    /// Point the client at another endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Replace the headline query
    pub fn with_query(mut self, query: NewsQuery) -> Self {
        self.query = query;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch one page of headlines
    ///
    /// Articles come back exactly as the API listed them, invalid ones
    /// included; filtering is the caller's job.
    ///
    /// # Arguments
    /// * `page` - 1-based page number
    /// * `page_size` - Number of articles per page
    ///
    /// # Returns
    /// * `Ok(Vec<Article>)` - The page, possibly shorter than `page_size`
    /// * `Err(NewsError)` - Transport failure, error status, or malformed body
    pub async fn fetch_headlines(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<Article>, NewsError> {
        let mut request = self
            .client
            .get(&self.base_url)
            .query(&self.query_params(page, page_size));
        if let Some(ref key) = self.api_key {
            request = request.header("X-Api-Key", key);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        debug!(
            "GET {} page {} -> {} ({} bytes)",
            self.base_url,
            page,
            status,
            text.len()
        );

        parse_envelope(status, &text)
    }

    /// Query string for a page request
    fn query_params(&self, page: u32, page_size: u32) -> Vec<(&'static str, String)> {
        let mut params = Vec::with_capacity(5);
        if let Some(ref country) = self.query.country {
            params.push(("country", country.clone()));
        }
        if let Some(category) = self.query.category {
            params.push(("category", category.as_str().to_string()));
        }
        if let Some(ref keywords) = self.query.keywords {
            params.push(("q", keywords.clone()));
        }
        params.push(("page", page.to_string()));
        params.push(("pageSize", page_size.to_string()));
        params
    }
}

impl FeedSource for NewsClient {
    fn fetch_page(
        &self,
        page: u32,
        page_size: u32,
    ) -> BoxFuture<'_, Result<Vec<Article>, NewsError>> {
        self.fetch_headlines(page, page_size).boxed()
    }
}

/// Turn a response body into articles, or the error it describes
///
/// NewsAPI reports most failures as a JSON envelope with a non-2xx status, so
/// the body is inspected before the status code.
fn parse_envelope(status: StatusCode, body: &str) -> Result<Vec<Article>, NewsError> {
    let envelope: NewsEnvelope = match serde_json::from_str(body) {
        Ok(envelope) => envelope,
        Err(_) if !status.is_success() => return Err(NewsError::HttpStatus(status.as_u16())),
        Err(e) => return Err(e.into()),
    };

    if envelope.status != "ok" {
        return Err(NewsError::Api {
            code: envelope.code.unwrap_or_else(|| "unknown".to_string()),
            message: envelope
                .message
                .unwrap_or_else(|| "request was not successful".to_string()),
        });
    }
    if !status.is_success() {
        return Err(NewsError::HttpStatus(status.as_u16()));
    }

    let articles = envelope
        .articles
        .ok_or_else(|| NewsError::MissingField("articles".to_string()))?;

    Ok(articles.into_iter().map(RawArticle::into_article).collect())
}

/// NewsAPI response envelope
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsEnvelope {
    status: String,
    code: Option<String>,
    message: Option<String>,
    #[allow(dead_code)]
    total_results: Option<u64>,
    articles: Option<Vec<RawArticle>>,
}

/// Article as NewsAPI sends it, every field nullable
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArticle {
    source: Option<RawSource>,
    author: Option<String>,
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    url_to_image: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    published_at: Option<DateTime<Utc>>,
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    name: Option<String>,
}

impl RawArticle {
    fn into_article(self) -> Article {
        Article {
            title: self.title.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            url: self.url.unwrap_or_default(),
            image_url: non_empty(self.url_to_image),
            published_at: self.published_at,
            source_name: self
                .source
                .and_then(|source| source.name)
                .unwrap_or_else(|| "Unknown source".to_string()),
            author: non_empty(self.author),
            content: non_empty(self.content),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// RFC 3339 timestamp, or `None` when the value is missing or unparseable
///
/// One bad date should cost the article its age, not fail the whole page.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|timestamp| timestamp.with_timezone(&Utc)))
}
