use std::time::Duration;

use reqwest::Client;

use crate::error::Result;

const USER_AGENT: &str = "Headlines/1.0 (News Portal)";

/// Shared client for every upstream call made while composing a page.
pub fn build_client(timeout_secs: u64) -> Result<Client> {
    let client = Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}
