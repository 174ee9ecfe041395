//! HTTP client utilities.

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

use crate::config::HttpConfig;
use crate::sources::SourceError;

/// Shared HTTP client with a per-request timeout and a courtesy pause after
/// every round trip.
///
/// Requests are never retried: a failed call is final for that attempt.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Arc<Client>,
    pause: Duration,
}

impl HttpClient {
    /// Create a client with the crate's default user agent and settings
    pub fn new() -> Result<Self, SourceError> {
        Self::with_user_agent(
            concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")),
            &HttpConfig::default(),
        )
    }

    /// Create a client with a custom user agent
    pub fn with_user_agent(user_agent: &str, http: &HttpConfig) -> Result<Self, SourceError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(http.timeout_secs))
            .connect_timeout(Duration::from_secs(http.timeout_secs.min(10)))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| SourceError::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client: Arc::new(client),
            pause: Duration::from_millis(http.pause_ms),
        })
    }

    /// Create from an existing reqwest Client
    pub fn from_client(client: Arc<Client>, pause: Duration) -> Self {
        Self { client, pause }
    }

    /// Get the underlying client
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Pause applied after each request
    pub fn pause(&self) -> Duration {
        self.pause
    }

    /// GET `url` with query parameters and decode a JSON body
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<T, SourceError> {
        let body = self.get_text(url, params).await?;
        serde_json::from_str(&body).map_err(SourceError::from)
    }

    /// GET `url` with query parameters and return the body as text
    pub async fn get_text(&self, url: &str, params: &[(&str, String)]) -> Result<String, SourceError> {
        tracing::trace!(url, ?params, "GET");

        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Request to {} failed: {}", url, e)))?;

        let status = response.status();
        let body = response.text().await;
        self.courtesy_pause().await;

        match status {
            s if s.is_success() => {
                body.map_err(|e| SourceError::Network(format!("Failed to read response: {}", e)))
            }
            StatusCode::NOT_FOUND => Err(SourceError::NotFound(url.to_string())),
            StatusCode::TOO_MANY_REQUESTS => Err(SourceError::RateLimit),
            s => Err(SourceError::Api(format!("{} returned status: {}", url, s))),
        }
    }

    async fn courtesy_pause(&self) {
        if !self.pause.is_zero() {
            tokio::time::sleep(self.pause).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_pause() -> HttpConfig {
        HttpConfig {
            timeout_secs: 5,
            pause_ms: 0,
        }
    }

    #[tokio::test]
    async fn test_get_json_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/ping")
            .match_query(mockito::Matcher::UrlEncoded("q".into(), "a b".into()))
            .with_status(200)
            .with_body(r#"{"ok": true}"#)
            .create_async()
            .await;

        let client = HttpClient::with_user_agent("test", &no_pause()).unwrap();
        let value: serde_json::Value = client
            .get_json(&format!("{}/ping", server.url()), &[("q", "a b".to_string())])
            .await
            .unwrap();

        assert_eq!(value["ok"], true);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let mut server = mockito::Server::new_async().await;
        server.mock("GET", "/missing").with_status(404).create_async().await;
        server.mock("GET", "/busy").with_status(429).create_async().await;
        server.mock("GET", "/broken").with_status(500).create_async().await;

        let client = HttpClient::with_user_agent("test", &no_pause()).unwrap();
        let url = server.url();

        assert!(matches!(
            client.get_text(&format!("{url}/missing"), &[]).await,
            Err(SourceError::NotFound(_))
        ));
        assert!(matches!(
            client.get_text(&format!("{url}/busy"), &[]).await,
            Err(SourceError::RateLimit)
        ));
        assert!(matches!(
            client.get_text(&format!("{url}/broken"), &[]).await,
            Err(SourceError::Api(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_json_is_parse_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/garbage")
            .with_body("not json")
            .create_async()
            .await;

        let client = HttpClient::with_user_agent("test", &no_pause()).unwrap();
        let result: Result<serde_json::Value, _> =
            client.get_json(&format!("{}/garbage", server.url()), &[]).await;
        assert!(matches!(result, Err(SourceError::Parse(_))));
    }
}
