use reqwest::Client;
use std::time::Duration;

/// Builds the HTTP client shared by every provider.
pub fn build_client(user_agent: &str, timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .build()
}
