use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::preferences::PreferenceKey;

/// Environment variable holding the currency rates endpoint
pub const CURRENCY_URL_VAR: &str = "CURRENCY_URL";
/// Environment variable holding the weather API credential
pub const WEATHER_API_KEY_VAR: &str = "WEATHER_API_KEY";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Timeout applied to every upstream request, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub currency_url: Option<String>,
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub defaults: Defaults,
    /// Feed directory: publication key -> feed URL
    #[serde(default = "default_publications")]
    pub publications: BTreeMap<String, String>,
}

fn default_bind_address() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_publications() -> BTreeMap<String, String> {
    [
        ("cnn", "http://rss.cnn.com/rss/edition.rss"),
        ("fox", "http://feeds.foxnews.com/foxnews/latest"),
        ("un", "https://news.un.org/feed/subscribe/ru/news/all/rss.xml"),
        ("bbc", "http://feeds.bbci.co.uk/news/world/rss.xml"),
        ("sky", "https://feeds.skynews.com/feeds/rss/world.xml"),
        ("nytimes", "https://rss.nytimes.com/services/xml/rss/nyt/US.xml"),
        ("asahi", "https://www.asahi.com/rss/asahi/newsheadlines.rdf"),
    ]
    .into_iter()
    .map(|(key, url)| (key.to_string(), url.to_string()))
    .collect()
}

#[derive(Debug, Deserialize, Clone)]
pub struct WeatherConfig {
    #[serde(default = "default_weather_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_weather_url() -> String {
    "http://api.weatherapi.com/v1/current.json".to_string()
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: default_weather_url(),
            api_key: None,
        }
    }
}

/// Values used when neither the query string nor a cookie names a preference.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Defaults {
    #[serde(default = "default_publication")]
    pub publication: String,
    #[serde(default = "default_city")]
    pub city: String,
    #[serde(default = "default_currency_from")]
    pub currency_from: String,
    #[serde(default = "default_currency_to")]
    pub currency_to: String,
}

fn default_publication() -> String {
    "cnn".to_string()
}

fn default_city() -> String {
    "New York".to_string()
}

fn default_currency_from() -> String {
    "EUR".to_string()
}

fn default_currency_to() -> String {
    "USD".to_string()
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            publication: default_publication(),
            city: default_city(),
            currency_from: default_currency_from(),
            currency_to: default_currency_to(),
        }
    }
}

impl Defaults {
    pub fn get(&self, key: PreferenceKey) -> &str {
        match key {
            PreferenceKey::Publication => &self.publication,
            PreferenceKey::City => &self.city,
            PreferenceKey::CurrencyFrom => &self.currency_from,
            PreferenceKey::CurrencyTo => &self.currency_to,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            request_timeout_secs: default_request_timeout(),
            currency_url: None,
            weather: WeatherConfig::default(),
            defaults: Defaults::default(),
            publications: default_publications(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the file if it exists, otherwise fall back to the built-in settings
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse config from a TOML string (useful for testing)
    pub fn from_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Overlay `CURRENCY_URL` and `WEATHER_API_KEY` from the process environment
    pub fn apply_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(CURRENCY_URL_VAR).filter(|v| !v.is_empty()) {
            self.currency_url = Some(url);
        }
        if let Some(key) = lookup(WEATHER_API_KEY_VAR).filter(|v| !v.is_empty()) {
            self.weather.api_key = Some(key);
        }
    }

    /// Normalize the feed directory and check that everything the fetchers need is present
    pub fn validate(&mut self) -> anyhow::Result<()> {
        self.publications = std::mem::take(&mut self.publications)
            .into_iter()
            .map(|(key, url)| (key.to_lowercase(), url))
            .collect();
        self.defaults.publication = self.defaults.publication.to_lowercase();

        if self.publications.is_empty() {
            anyhow::bail!("At least one publication must be configured");
        }
        if !self.publications.contains_key(&self.defaults.publication) {
            anyhow::bail!(
                "Default publication '{}' is not in the feed directory",
                self.defaults.publication
            );
        }
        if self.currency_url().is_none() {
            anyhow::bail!("Currency rates URL is not set (use {})", CURRENCY_URL_VAR);
        }
        if self.weather_api_key().is_none() {
            anyhow::bail!("Weather API key is not set (use {})", WEATHER_API_KEY_VAR);
        }
        Ok(())
    }

    pub fn currency_url(&self) -> Option<&str> {
        self.currency_url.as_deref().filter(|v| !v.is_empty())
    }

    pub fn weather_api_key(&self) -> Option<&str> {
        self.weather.api_key.as_deref().filter(|v| !v.is_empty())
    }
}
