use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use feed_rs::parser;
use reqwest::Client;
use tracing::info;

use crate::config::Config;
use crate::error::{Error, Result};

/// One feed entry as handed to the page template.
#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    pub title: Option<String>,
    pub link: Option<String>,
    pub summary: Option<String>,
    pub published: Option<DateTime<Utc>>,
}

impl Article {
    fn from_entry(entry: feed_rs::model::Entry) -> Self {
        Self {
            title: entry.title.map(|t| t.content),
            link: entry.links.into_iter().next().map(|l| l.href),
            summary: entry.summary.map(|t| t.content),
            published: entry.published.or(entry.updated),
        }
    }

    pub fn published_display(&self) -> Option<String> {
        self.published
            .map(|dt| dt.format("%a, %d %b %Y %H:%M UTC").to_string())
    }
}

pub struct HeadlineFetcher {
    client: Client,
    feeds: BTreeMap<String, String>,
    default_publication: String,
}

impl HeadlineFetcher {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            feeds: config.publications.clone(),
            default_publication: config.defaults.publication.clone(),
        }
    }

    /// Known publication keys, in directory order
    pub fn publications(&self) -> impl Iterator<Item = &str> {
        self.feeds.keys().map(String::as_str)
    }

    /// Case-insensitive lookup; empty or unknown keys map to the default publication.
    pub fn publication_key(&self, requested: &str) -> &str {
        let wanted = requested.to_lowercase();
        self.feeds
            .get_key_value(wanted.as_str())
            .map(|(key, _)| key.as_str())
            .unwrap_or(&self.default_publication)
    }

    pub fn feed_url(&self, requested: &str) -> Option<&str> {
        self.feeds
            .get(self.publication_key(requested))
            .map(String::as_str)
    }

    /// Fetch the publication's feed and return every entry in feed order.
    pub async fn fetch(&self, requested: &str) -> Result<Vec<Article>> {
        let key = self.publication_key(requested);
        let url = self
            .feed_url(requested)
            .ok_or_else(|| Error::UnknownPublication(key.to_string()))?;

        info!("Fetching feed: {} ({})", key, url);

        let response = self.client.get(url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;

        let articles = parse_articles(&bytes)?;
        info!("Parsed {} entries for '{}'", articles.len(), key);
        Ok(articles)
    }
}

pub fn parse_articles(bytes: &[u8]) -> Result<Vec<Article>> {
    let parsed = parser::parse(bytes).map_err(|e| Error::FeedParse(e.to_string()))?;
    Ok(parsed.entries.into_iter().map(Article::from_entry).collect())
}
