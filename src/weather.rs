use reqwest::Client;
use serde::Deserialize;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{Error, Result};

/// Current conditions for the visitor's city.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherSummary {
    pub description: String,
    /// Degrees Celsius
    pub temperature: f64,
    pub city: String,
    pub country: String,
    pub icon: String,
}

impl WeatherSummary {
    /// The upstream hands out protocol-relative icon references.
    pub fn icon_url(&self) -> String {
        if self.icon.starts_with("//") {
            format!("https:{}", self.icon)
        } else {
            self.icon.clone()
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    current: Option<Current>,
    location: Option<Location>,
}

#[derive(Debug, Deserialize)]
struct Current {
    temp_c: f64,
    condition: Condition,
}

#[derive(Debug, Deserialize)]
struct Condition {
    text: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct Location {
    name: String,
    country: String,
}

pub struct WeatherFetcher {
    client: Client,
    base_url: String,
    api_key: String,
}

impl WeatherFetcher {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            base_url: config.weather.base_url.clone(),
            api_key: config.weather_api_key().unwrap_or_default().to_string(),
        }
    }

    /// Current weather for `city`, or `None` when the upstream has no conditions for it.
    pub async fn fetch(&self, city: &str) -> Result<Option<WeatherSummary>> {
        info!("Fetching weather for '{}'", city);

        // The upstream answers unknown cities with an error payload; read the body either way.
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("key", self.api_key.as_str()), ("q", city), ("aqi", "no")])
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        let summary = parse_weather(&body)?;
        if summary.is_none() {
            warn!("No current weather for '{}' (status {})", city, status);
        }
        Ok(summary)
    }
}

pub fn parse_weather(body: &str) -> Result<Option<WeatherSummary>> {
    let parsed: ApiResponse = serde_json::from_str(body)?;

    let Some(current) = parsed.current else {
        return Ok(None);
    };
    let location = parsed
        .location
        .ok_or_else(|| Error::MalformedResponse("weather response has no location".to_string()))?;

    Ok(Some(WeatherSummary {
        description: current.condition.text,
        temperature: current.temp_c,
        city: location.name,
        country: location.country,
        icon: current.condition.icon,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const LONDON: &str = r#"{
        "location": {
            "name": "London",
            "region": "City of London, Greater London",
            "country": "United Kingdom",
            "lat": 51.52,
            "lon": -0.11
        },
        "current": {
            "temp_c": 11.0,
            "temp_f": 51.8,
            "condition": {
                "text": "Partly cloudy",
                "icon": "//cdn.weatherapi.com/weather/64x64/day/116.png",
                "code": 1003
            },
            "humidity": 82
        }
    }"#;

    const NO_MATCH: &str = r#"{"error":{"code":1006,"message":"No matching location found."}}"#;

    fn fetcher_for(server: &MockServer) -> WeatherFetcher {
        let mut config = Config::default();
        config.weather.base_url = format!("{}/v1/current.json", server.uri());
        config.weather.api_key = Some("test-key".to_string());
        WeatherFetcher::new(Client::new(), &config)
    }

    mod parse_tests {
        use super::*;

        #[test]
        fn test_populated_current_block() {
            let summary = parse_weather(LONDON).unwrap().unwrap();
            assert_eq!(
                summary,
                WeatherSummary {
                    description: "Partly cloudy".to_string(),
                    temperature: 11.0,
                    city: "London".to_string(),
                    country: "United Kingdom".to_string(),
                    icon: "//cdn.weatherapi.com/weather/64x64/day/116.png".to_string(),
                }
            );
        }

        #[test]
        fn test_missing_current_block() {
            assert_eq!(parse_weather(NO_MATCH).unwrap(), None);
            assert_eq!(parse_weather("{}").unwrap(), None);
        }

        #[test]
        fn test_current_without_location_is_malformed() {
            let body = r#"{"current":{"temp_c":1.5,"condition":{"text":"Snow","icon":"x.png"}}}"#;
            assert!(matches!(parse_weather(body), Err(Error::MalformedResponse(_))));
        }

        #[test]
        fn test_invalid_json() {
            assert!(matches!(parse_weather("<html>"), Err(Error::Json(_))));
        }

        #[test]
        fn test_icon_url() {
            let summary = parse_weather(LONDON).unwrap().unwrap();
            assert_eq!(
                summary.icon_url(),
                "https://cdn.weatherapi.com/weather/64x64/day/116.png"
            );

            let absolute = WeatherSummary {
                icon: "https://icons.example.com/sun.png".to_string(),
                ..summary
            };
            assert_eq!(absolute.icon_url(), "https://icons.example.com/sun.png");
        }
    }

    mod fetch_tests {
        use super::*;

        #[tokio::test]
        async fn test_fetch_sends_key_and_encoded_city() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/v1/current.json"))
                .and(query_param("key", "test-key"))
                .and(query_param("q", "New York"))
                .and(query_param("aqi", "no"))
                .respond_with(ResponseTemplate::new(200).set_body_string(LONDON))
                .expect(1)
                .mount(&server)
                .await;

            let summary = fetcher_for(&server).fetch("New York").await.unwrap();
            assert_eq!(summary.map(|s| s.city), Some("London".to_string()));
        }

        #[tokio::test]
        async fn test_fetch_unknown_city_is_none() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(400).set_body_string(NO_MATCH))
                .mount(&server)
                .await;

            let summary = fetcher_for(&server).fetch("Atlantis").await.unwrap();
            assert_eq!(summary, None);
        }

        #[tokio::test]
        async fn test_fetch_non_json_body_is_an_error() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
                .mount(&server)
                .await;

            let result = fetcher_for(&server).fetch("London").await;
            assert!(matches!(result, Err(Error::Json(_))));
        }
    }
}
