//! Resolution of the four visitor preferences.
//!
//! Each preference is taken from the query string first, then from the
//! cookie of the same name, then from the configured defaults. Values are
//! not validated here; each fetcher decides what to do with values it
//! does not recognize.

use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use crate::config::Defaults;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferenceKey {
    Publication,
    City,
    CurrencyFrom,
    CurrencyTo,
}

impl PreferenceKey {
    pub const ALL: [PreferenceKey; 4] = [
        PreferenceKey::Publication,
        PreferenceKey::City,
        PreferenceKey::CurrencyFrom,
        PreferenceKey::CurrencyTo,
    ];

    /// Name shared by the query parameter and the cookie
    pub fn as_str(&self) -> &'static str {
        match self {
            PreferenceKey::Publication => "publication",
            PreferenceKey::City => "city",
            PreferenceKey::CurrencyFrom => "currency_from",
            PreferenceKey::CurrencyTo => "currency_to",
        }
    }
}

/// Query parameters accepted by the home page
#[derive(Debug, Default, Deserialize)]
pub struct PreferenceQuery {
    pub publication: Option<String>,
    pub city: Option<String>,
    pub currency_from: Option<String>,
    pub currency_to: Option<String>,
}

impl PreferenceQuery {
    pub fn get(&self, key: PreferenceKey) -> Option<&str> {
        let value = match key {
            PreferenceKey::Publication => &self.publication,
            PreferenceKey::City => &self.city,
            PreferenceKey::CurrencyFrom => &self.currency_from,
            PreferenceKey::CurrencyTo => &self.currency_to,
        };
        value.as_deref()
    }
}

/// First present, non-empty value among query parameter, cookie and default.
pub fn resolve(query: Option<&str>, cookie: Option<&str>, default: &str) -> String {
    query
        .filter(|v| !v.is_empty())
        .or_else(|| cookie.filter(|v| !v.is_empty()))
        .unwrap_or(default)
        .to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preferences {
    pub publication: String,
    pub city: String,
    pub currency_from: String,
    pub currency_to: String,
}

impl Preferences {
    pub fn resolve(query: &PreferenceQuery, jar: &CookieJar, defaults: &Defaults) -> Self {
        let lookup = |key: PreferenceKey| {
            resolve(
                query.get(key),
                jar.get(key.as_str()).map(|c| c.value()),
                defaults.get(key),
            )
        };

        Self {
            publication: lookup(PreferenceKey::Publication),
            city: lookup(PreferenceKey::City),
            currency_from: lookup(PreferenceKey::CurrencyFrom),
            currency_to: lookup(PreferenceKey::CurrencyTo),
        }
    }

    pub fn get(&self, key: PreferenceKey) -> &str {
        match key {
            PreferenceKey::Publication => &self.publication,
            PreferenceKey::City => &self.city,
            PreferenceKey::CurrencyFrom => &self.currency_from,
            PreferenceKey::CurrencyTo => &self.currency_to,
        }
    }
}
