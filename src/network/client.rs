//! HTTP client for upstream suggestion endpoints

use crate::config::OutgoingSettings;
use anyhow::Result;
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;

/// Browser-equivalent User-Agent for upstreams that gate on it
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// HTTP client wrapper with aerostart-specific configuration
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    user_agent: String,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self> {
        Self::with_settings(&OutgoingSettings::default())
    }

    /// Create a new HTTP client with custom settings
    pub fn with_settings(settings: &OutgoingSettings) -> Result<Self> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs_f64(settings.request_timeout))
            .pool_max_idle_per_host(settings.pool_maxsize)
            .gzip(true)
            .brotli(true);

        // SSL verification
        if !settings.verify_ssl {
            builder = builder.danger_accept_invalid_certs(true);
        }

        // Proxy settings
        if let Some(ref proxy_url) = settings.proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        }

        let client = builder.build()?;

        Ok(Self {
            client,
            user_agent: settings
                .user_agent
                .clone()
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        })
    }

    /// Simple GET request
    pub async fn get(&self, url: &str) -> Result<HttpResponse> {
        self.get_with_headers(url, &HashMap::new()).await
    }

    /// GET request with extra headers; extras override the defaults on
    /// name collisions rather than duplicating them
    pub async fn get_with_headers(
        &self,
        url: &str,
        extra: &HashMap<String, String>,
    ) -> Result<HttpResponse> {
        let mut headers = HashMap::from([
            ("User-Agent".to_string(), self.user_agent.clone()),
            (
                "Accept".to_string(),
                "application/json, text/javascript, */*; q=0.8".to_string(),
            ),
            ("Accept-Language".to_string(), "en-US,en;q=0.9".to_string()),
        ]);
        for (key, value) in extra {
            headers.insert(key.clone(), value.clone());
        }

        let mut req_builder = self.client.get(url);
        for (key, value) in &headers {
            req_builder = req_builder.header(key, value);
        }

        let response = req_builder.send().await?;

        let status = response.status().as_u16();
        let url = response.url().to_string();
        let text = response.text().await?;

        Ok(HttpResponse { status, text, url })
    }

    /// Get current user agent
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new().expect("Failed to create default HTTP client")
    }
}

/// Response from an upstream endpoint
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub text: String,
    /// Final URL after redirects
    pub url: String,
}

impl HttpResponse {
    /// Check if response is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_client_creation() {
        let client = HttpClient::new();
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_extra_headers_override_defaults() {
        use wiremock::matchers::{header, method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/suggest"))
            .and(header("User-Agent", "custom-agent"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let extra = HashMap::from([("User-Agent".to_string(), "custom-agent".to_string())]);
        let response = client
            .get_with_headers(&format!("{}/suggest", server.uri()), &extra)
            .await
            .unwrap();
        assert!(response.is_success());
        assert_eq!(response.text, "ok");
    }
}
