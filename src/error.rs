use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed parsing error: {0}")]
    FeedParse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No feed configured for publication: {0}")]
    UnknownPublication(String),

    #[error("Malformed upstream response: {0}")]
    MalformedResponse(String),

    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),

    #[error("Invalid rate for currency: {0}")]
    InvalidRate(String),
}

impl Error {
    /// Errors caused by what the visitor asked for rather than by an upstream failure.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::UnknownCurrency(_) | Error::InvalidRate(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
