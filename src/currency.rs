use std::collections::HashMap;

use reqwest::Client;
use serde::Deserialize;
use tracing::info;

use crate::config::Config;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct CurrencyRate {
    /// Units of the target currency per one unit of the source currency
    pub rate: f64,
    /// Every code the rates source knows, sorted
    pub currencies: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RatesPayload {
    rates: HashMap<String, f64>,
}

pub struct CurrencyFetcher {
    client: Client,
    url: String,
}

impl CurrencyFetcher {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            url: config.currency_url().unwrap_or_default().to_string(),
        }
    }

    pub async fn fetch(&self, from: &str, to: &str) -> Result<CurrencyRate> {
        info!("Fetching currency rates for {} -> {}", from, to);

        let response = self.client.get(&self.url).send().await?.error_for_status()?;
        let body = response.text().await?;
        let payload: RatesPayload = serde_json::from_str(&body)?;

        conversion(&payload.rates, from, to)
    }
}

/// Rate from `from` to `to` given rates relative to a common base.
pub fn conversion(rates: &HashMap<String, f64>, from: &str, to: &str) -> Result<CurrencyRate> {
    let lookup = |code: &str| {
        let code = code.to_uppercase();
        rates
            .get(&code)
            .copied()
            .ok_or(Error::UnknownCurrency(code))
    };

    let from_rate = lookup(from)?;
    let to_rate = lookup(to)?;
    if from_rate == 0.0 || !from_rate.is_finite() {
        return Err(Error::InvalidRate(from.to_uppercase()));
    }

    let mut currencies: Vec<String> = rates.keys().cloned().collect();
    currencies.sort();

    Ok(CurrencyRate {
        rate: to_rate / from_rate,
        currencies,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAYLOAD: &str = r#"{"base":"EUR","rates":{"EUR":1.0,"USD":1.1,"GBP":0.9}}"#;

    fn rates() -> HashMap<String, f64> {
        serde_json::from_str::<RatesPayload>(PAYLOAD).unwrap().rates
    }

    fn fetcher_for(server: &MockServer) -> CurrencyFetcher {
        let mut config = Config::default();
        config.currency_url = Some(format!("{}/latest", server.uri()));
        CurrencyFetcher::new(Client::new(), &config)
    }

    mod conversion_tests {
        use super::*;

        #[test]
        fn test_base_to_other() {
            let result = conversion(&rates(), "EUR", "USD").unwrap();
            assert!((result.rate - 1.1).abs() < 1e-12);
            assert_eq!(result.currencies, ["EUR", "GBP", "USD"]);
        }

        #[test]
        fn test_same_currency_is_one() {
            for code in ["EUR", "USD", "GBP"] {
                let result = conversion(&rates(), code, code).unwrap();
                assert_eq!(result.rate, 1.0);
            }
        }

        #[test]
        fn test_cross_rate() {
            let result = conversion(&rates(), "GBP", "USD").unwrap();
            assert!((result.rate - 1.1 / 0.9).abs() < 1e-12);
        }

        #[test]
        fn test_codes_are_case_insensitive() {
            let result = conversion(&rates(), "eur", "Usd").unwrap();
            assert!((result.rate - 1.1).abs() < 1e-12);
        }

        #[test]
        fn test_unknown_source_currency() {
            let result = conversion(&rates(), "xyz", "USD");
            assert!(matches!(result, Err(Error::UnknownCurrency(code)) if code == "XYZ"));
        }

        #[test]
        fn test_unknown_target_currency() {
            let result = conversion(&rates(), "EUR", "ABC");
            assert!(matches!(result, Err(Error::UnknownCurrency(code)) if code == "ABC"));
        }

        #[test]
        fn test_zero_source_rate() {
            let mut rates = rates();
            rates.insert("ZZZ".to_string(), 0.0);
            let result = conversion(&rates, "ZZZ", "USD");
            assert!(matches!(result, Err(Error::InvalidRate(_))));
        }
    }

    mod fetch_tests {
        use super::*;

        #[tokio::test]
        async fn test_fetch_rate_and_codes() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(200).set_body_string(PAYLOAD))
                .expect(1)
                .mount(&server)
                .await;

            let result = fetcher_for(&server).fetch("EUR", "USD").await.unwrap();
            assert!((result.rate - 1.1).abs() < 1e-12);
            assert_eq!(result.currencies.len(), 3);
        }

        #[tokio::test]
        async fn test_fetch_malformed_payload() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"data":[]}"#))
                .mount(&server)
                .await;

            let result = fetcher_for(&server).fetch("EUR", "USD").await;
            assert!(matches!(result, Err(Error::Json(_))));
        }

        #[tokio::test]
        async fn test_fetch_upstream_error_status() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(500))
                .mount(&server)
                .await;

            let result = fetcher_for(&server).fetch("EUR", "USD").await;
            assert!(matches!(result, Err(Error::Http(_))));
        }
    }
}
