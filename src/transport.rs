// Wallmix - HTTP transport
// Single seam for every outbound request. Every provider refuses direct
// client requests, so each target URL is percent-encoded and appended to
// the relay prefix. Relay failures are reported like any other failure.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::config::Config;
use crate::constants::USER_AGENT;
use crate::error::ProviderError;

/// Issues a GET and returns the body of a 2xx response.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get_text(&self, url: &str) -> Result<String, ProviderError>;
}

/// reqwest-backed transport
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_text(&self, url: &str) -> Result<String, ProviderError> {
        let resp = self
            .client
            .get(url)
            .header("Accept", "application/json, text/html;q=0.9, */*;q=0.8")
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(ProviderError::Status {
                status: resp.status().as_u16(),
                url: url.to_string(),
            });
        }

        Ok(resp.text().await?)
    }
}

/// Wrap a target URL for the relay.
pub fn relay_url(relay_base: &str, target: &str) -> String {
    format!("{}{}", relay_base, urlencoding::encode(target))
}

/// Shared request helper handed to every adapter.
#[derive(Clone)]
pub struct Fetcher {
    transport: Arc<dyn Transport>,
    relay_base: String,
}

impl Fetcher {
    pub fn new(transport: Arc<dyn Transport>, relay_base: impl Into<String>) -> Self {
        Self {
            transport,
            relay_base: relay_base.into(),
        }
    }

    /// Real HTTP transport configured from `Config`.
    pub fn from_config(config: &Config) -> Result<Self, ProviderError> {
        let transport = HttpTransport::new(Duration::from_secs(config.timeout_secs))?;
        Ok(Self::new(Arc::new(transport), config.relay_url.clone()))
    }

    pub async fn get_text(&self, target: &str) -> Result<String, ProviderError> {
        let url = relay_url(&self.relay_base, target);
        log::debug!("GET {}", url);
        self.transport.get_text(&url).await
    }

    pub async fn get_json<T: DeserializeOwned>(&self, target: &str) -> Result<T, ProviderError> {
        let body = self.get_text(target).await?;
        Ok(serde_json::from_str(&body)?)
    }
}


#[cfg(test)]
mod tests {
    use super::fake::{FakeTransport, RELAY};
    use super::*;

    #[test]
    fn test_relay_url_percent_encodes_target() {
        let url = relay_url(
            "https://api.allorigins.win/raw?url=",
            "https://wallhaven.cc/api/v1/search?q=space OR galaxy&page=1",
        );
        assert_eq!(
            url,
            "https://api.allorigins.win/raw?url=https%3A%2F%2Fwallhaven.cc%2Fapi%2Fv1%2Fsearch%3Fq%3Dspace%20OR%20galaxy%26page%3D1"
        );
    }

    #[tokio::test]
    async fn test_requests_go_through_relay() {
        let transport = Arc::new(FakeTransport::new());
        transport.respond(&relay_url(RELAY, "https://blocked.test/b"), "relayed");
        let fetcher = Fetcher::new(transport.clone(), RELAY);

        assert_eq!(fetcher.get_text("https://blocked.test/b").await.unwrap(), "relayed");
        assert_eq!(
            transport.requests(),
            vec!["https://relay.test/raw?url=https%3A%2F%2Fblocked.test%2Fb"]
        );
    }

    #[tokio::test]
    async fn test_relay_failure_is_ordinary_failure() {
        let transport = Arc::new(FakeTransport::new());
        transport.fail(&relay_url(RELAY, "https://blocked.test/b"), 502);
        let fetcher = Fetcher::new(transport, RELAY);

        let err = fetcher.get_text("https://blocked.test/b").await.unwrap_err();
        assert!(matches!(err, ProviderError::Status { status: 502, .. }));
    }

    #[tokio::test]
    async fn test_get_json_reports_bad_payload() {
        let transport = Arc::new(FakeTransport::new());
        transport.respond(&relay_url(RELAY, "https://blocked.test/json"), "<html>not json</html>");
        let fetcher = Fetcher::new(transport, RELAY);

        let result: Result<serde_json::Value, _> =
            fetcher.get_json("https://blocked.test/json").await;
        assert!(matches!(result, Err(ProviderError::Json(_))));
    }
}
