use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use time::OffsetDateTime;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{debug, error};

use crate::config::{Config, Defaults};
use crate::currency::CurrencyFetcher;
use crate::error::Error;
use crate::http::build_client;
use crate::news::{Article, HeadlineFetcher};
use crate::preferences::{PreferenceKey, PreferenceQuery, Preferences};
use crate::weather::{WeatherFetcher, WeatherSummary};

/// How long preference cookies live
const COOKIE_LIFETIME_DAYS: i64 = 365;

pub struct AppState {
    pub defaults: Defaults,
    pub news: HeadlineFetcher,
    pub weather: WeatherFetcher,
    pub currency: CurrencyFetcher,
}

impl AppState {
    pub fn from_config(config: &Config) -> crate::error::Result<Self> {
        let client = build_client(config.request_timeout_secs)?;
        Ok(Self {
            defaults: config.defaults.clone(),
            news: HeadlineFetcher::new(client.clone(), config),
            weather: WeatherFetcher::new(client.clone(), config),
            currency: CurrencyFetcher::new(client, config),
        })
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .nest_service("/static", ServeDir::new("static"))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// Template structs
#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub date: String,
    pub editor_name: String,
    pub articles: Vec<Article>,
    pub weather: Option<WeatherSummary>,
    pub city: String,
    pub rate: f64,
    pub currency_from: String,
    pub currency_to: String,
    pub publications: Vec<SelectOption>,
    pub currencies_from: Vec<SelectOption>,
    pub currencies_to: Vec<SelectOption>,
}

pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

#[derive(Template)]
#[template(path = "404.html")]
pub struct NotFoundTemplate;

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub status: u16,
    pub message: Option<String>,
}

// Wrapper for HTML responses
struct HtmlTemplate<T>(T);

impl<T: Template> IntoResponse for HtmlTemplate<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to render template: {}", err),
            )
                .into_response(),
        }
    }
}

// Custom error type
pub struct AppError(anyhow::Error);

impl AppError {
    fn status(&self) -> StatusCode {
        match self.0.downcast_ref::<Error>() {
            Some(err) if err.is_client_error() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        error!("Request failed ({}): {:#}", status, self.0);

        // Upstream details stay in the log
        let message = status.is_client_error().then(|| self.0.to_string());
        let page = ErrorTemplate {
            status: status.as_u16(),
            message,
        };
        (status, HtmlTemplate(page)).into_response()
    }
}

impl<E: Into<anyhow::Error>> From<E> for AppError {
    fn from(err: E) -> Self {
        AppError(err.into())
    }
}

/// Date shown in the page header, e.g. "October 19, 2026"
pub fn today() -> String {
    chrono::Local::now().format("%B %d, %Y").to_string()
}

/// Attach one long-lived cookie per preference.
pub fn preference_cookies(jar: CookieJar, prefs: &Preferences, now: OffsetDateTime) -> CookieJar {
    let expires = now + time::Duration::days(COOKIE_LIFETIME_DAYS);
    PreferenceKey::ALL.into_iter().fold(jar, |jar, key| {
        jar.add(
            Cookie::build((key.as_str(), prefs.get(key).to_string()))
                .path("/")
                .expires(expires),
        )
    })
}

fn currency_options(currencies: &[String], chosen: &str) -> Vec<SelectOption> {
    currencies
        .iter()
        .map(|code| SelectOption {
            value: code.clone(),
            label: code.clone(),
            selected: code.eq_ignore_ascii_case(chosen),
        })
        .collect()
}

fn publication_options(news: &HeadlineFetcher, chosen: &str) -> Vec<SelectOption> {
    news.publications()
        .map(|key| SelectOption {
            value: key.to_string(),
            label: key.to_uppercase(),
            selected: key == chosen,
        })
        .collect()
}

// Route handlers
pub async fn home(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PreferenceQuery>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    let prefs = Preferences::resolve(&query, &jar, &state.defaults);
    debug!("Resolved preferences: {:?}", prefs);

    let (articles, weather, rates) = tokio::try_join!(
        state.news.fetch(&prefs.publication),
        state.weather.fetch(&prefs.city),
        state.currency.fetch(&prefs.currency_from, &prefs.currency_to),
    )?;

    let chosen_publication = state.news.publication_key(&prefs.publication);
    let page = HomeTemplate {
        date: today(),
        editor_name: prefs.publication.to_uppercase(),
        articles,
        weather,
        city: prefs.city.clone(),
        rate: rates.rate,
        currency_from: prefs.currency_from.to_uppercase(),
        currency_to: prefs.currency_to.to_uppercase(),
        publications: publication_options(&state.news, chosen_publication),
        currencies_from: currency_options(&rates.currencies, &prefs.currency_from),
        currencies_to: currency_options(&rates.currencies, &prefs.currency_to),
    };

    let jar = preference_cookies(jar, &prefs, OffsetDateTime::now_utc());
    Ok((jar, HtmlTemplate(page)))
}

pub async fn health() -> impl IntoResponse {
    Html("OK")
}

pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, HtmlTemplate(NotFoundTemplate))
}
