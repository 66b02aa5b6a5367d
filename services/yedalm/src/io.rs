//! HTTP client abstraction for testability

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};

/// HTTP response from a request
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Abstraction over HTTP client for dependency injection
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait HttpClient: Send + Sync {
    /// Send a GET request to the given URL
    async fn get(&self, url: &str) -> crate::Result<HttpResponse>;

    /// Send a POST request with a JSON body
    async fn post_json(&self, url: &str, body: &serde_json::Value) -> crate::Result<HttpResponse>;

    /// Send a PATCH request with a JSON body
    async fn patch_json(&self, url: &str, body: &serde_json::Value)
        -> crate::Result<HttpResponse>;

    /// Send a DELETE request
    async fn delete(&self, url: &str) -> crate::Result<HttpResponse>;
}

/// Production HTTP client using reqwest
///
/// Every request carries the data API key both as `apikey` and as a bearer
/// token, and asks the API to echo affected rows back.
#[derive(Default)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new(api_key: &str) -> crate::Result<Self> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(api_key)
            .map_err(|e| crate::YedalmError::Config(format!("Invalid API key header: {}", e)))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|e| crate::YedalmError::Config(format!("Invalid API key header: {}", e)))?;
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| crate::YedalmError::Http(format!("Building HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    async fn send(
        &self,
        method: &str,
        url: &str,
        request: reqwest::RequestBuilder,
    ) -> crate::Result<HttpResponse> {
        tracing::debug!("{} {}", method, url);
        let response = request
            .send()
            .await
            .map_err(|e| crate::YedalmError::Http(format!("{} {} failed: {}", method, url, e)))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| crate::YedalmError::Http(format!("Reading response body: {}", e)))?;

        tracing::debug!("{} {} -> {} ({} bytes)", method, url, status, body.len());
        Ok(HttpResponse { status, body })
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str) -> crate::Result<HttpResponse> {
        self.send("GET", url, self.client.get(url)).await
    }

    async fn post_json(&self, url: &str, body: &serde_json::Value) -> crate::Result<HttpResponse> {
        self.send("POST", url, self.client.post(url).json(body))
            .await
    }

    async fn patch_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> crate::Result<HttpResponse> {
        self.send("PATCH", url, self.client.patch(url).json(body))
            .await
    }

    async fn delete(&self, url: &str) -> crate::Result<HttpResponse> {
        self.send("DELETE", url, self.client.delete(url)).await
    }
}
