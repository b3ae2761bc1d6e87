//! Command-line interface parsing for the headlines reader
//!
//! This module handles parsing of CLI arguments using clap and turns them into
//! the feed configuration and headline query used at startup.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;

use crate::data::news::NEWS_API_BASE_URL;
use crate::data::{Category, NewsQuery};
use crate::feed::FeedConfig;

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// The specified category name is not recognized
    #[error("Invalid category: '{0}'. Valid categories: business, entertainment, general, health, science, sports, technology")]
    InvalidCategory(String),

    /// Country codes are two ASCII letters
    #[error("Invalid country code: '{0}'. Expected two letters, e.g. 'us' or 'gb'")]
    InvalidCountry(String),

    /// No key given for the public NewsAPI endpoint
    #[error("No API key given. Pass --api-key or set NEWS_API_KEY")]
    MissingApiKey,
}

/// Headlines - read top news headlines in the terminal
#[derive(Parser, Debug)]
#[command(name = "headlines")]
#[command(about = "Top news headlines in your terminal")]
#[command(version)]
pub struct Cli {
    /// NewsAPI key
    #[arg(long, env = "NEWS_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Two-letter country code for headlines
    #[arg(long, default_value = "us")]
    pub country: String,

    /// Restrict headlines to a category
    ///
    /// Valid categories: business, entertainment, general, health, science, sports, technology
    #[arg(long, value_name = "CATEGORY")]
    pub category: Option<String>,

    /// Only show headlines matching these keywords
    #[arg(long, value_name = "KEYWORDS")]
    pub query: Option<String>,

    /// Articles per page
    #[arg(long, default_value_t = 20, value_parser = clap::value_parser!(u32).range(1..=100))]
    pub page_size: u32,

    /// Seconds the first page stays fresh in the cache
    #[arg(long, default_value_t = 300, value_parser = clap::value_parser!(u64).range(1..=86_400))]
    pub cache_ttl: u64,

    /// Headlines endpoint
    #[arg(long, env = "NEWS_API_BASE_URL", default_value = NEWS_API_BASE_URL)]
    pub base_url: String,

    /// Where to write the log (defaults to the user cache directory)
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone)]
pub struct StartupConfig {
    pub feed: FeedConfig,
    pub query: NewsQuery,
    pub api_key: Option<String>,
    pub base_url: String,
    pub log_file: Option<PathBuf>,
}

/// Parses a category string argument into a Category enum.
///
/// # Arguments
/// * `s` - The category string from CLI
///
/// # Returns
/// * `Ok(Category)` if the string matches a valid category
/// * `Err(CliError::InvalidCategory)` if the string doesn't match
pub fn parse_category_arg(s: &str) -> Result<Category, CliError> {
    Category::from_str(s).ok_or_else(|| CliError::InvalidCategory(s.to_string()))
}

/// Normalizes a country code to lowercase, rejecting anything but two letters
pub fn parse_country_arg(s: &str) -> Result<String, CliError> {
    let code = s.trim();
    if code.len() == 2 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(code.to_ascii_lowercase())
    } else {
        Err(CliError::InvalidCountry(s.to_string()))
    }
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// An API key is only required when talking to the public endpoint.
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with appropriate settings
    /// * `Err(CliError)` if an argument is invalid
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let category = cli.category.as_deref().map(parse_category_arg).transpose()?;
        let country = parse_country_arg(&cli.country)?;

        let api_key = cli.api_key.clone().filter(|key| !key.trim().is_empty());
        if api_key.is_none() && cli.base_url == NEWS_API_BASE_URL {
            return Err(CliError::MissingApiKey);
        }

        Ok(StartupConfig {
            feed: FeedConfig {
                page_size: cli.page_size,
                cache_ttl: Duration::from_secs(cli.cache_ttl),
                ..FeedConfig::default()
            },
            query: NewsQuery {
                country: Some(country),
                category,
                keywords: cli.query.clone().filter(|q| !q.trim().is_empty()),
            },
            api_key,
            base_url: cli.base_url.clone(),
            log_file: cli.log_file.clone(),
        })
    }
}
