//! Request executor trait and reqwest-backed implementation

use crate::error::ApiError;
use async_trait::async_trait;
use reqwest::{Client, Response};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// HTTP method for an API request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Delete,
}

/// One request against the search service, relative to the API root
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// Path relative to the API root, e.g. `search/validate`
    pub path: String,
    /// HTTP method
    pub method: HttpMethod,
    /// Query parameters
    pub params: HashMap<String, String>,
    /// JSON request body
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    /// Create a GET request
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method: HttpMethod::Get,
            params: HashMap::new(),
            body: None,
        }
    }

    /// Create a POST request
    pub fn post(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method: HttpMethod::Post,
            params: HashMap::new(),
            body: None,
        }
    }

    /// Create a DELETE request
    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method: HttpMethod::Delete,
            params: HashMap::new(),
            body: None,
        }
    }

    /// Add a query parameter
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Set the JSON body
    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Capability to perform one authenticated call against the service.
///
/// The production implementation is [`HttpExecutor`]; tests substitute
/// scripted doubles. Implementations decode the response body to JSON and
/// map HTTP-level failures onto [`ApiError`]; they do not retry.
#[async_trait]
pub trait ApiExecutor: Send + Sync {
    /// Execute the request and return the decoded response body.
    async fn call(&self, request: ApiRequest) -> Result<serde_json::Value, ApiError>;
}

/// Reqwest-backed executor with bearer authentication
pub struct HttpExecutor {
    client: Client,
    root_url: String,
    api_key: String,
    user_agent: String,
}

impl HttpExecutor {
    /// Create an executor for the given API root and key
    pub fn new(root_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, ApiError> {
        Self::with_timeout(root_url, api_key, Duration::from_secs(30))
    }

    /// Create an executor with a custom per-request timeout
    pub fn with_timeout(
        root_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).gzip(true).build()?;

        Ok(Self {
            client,
            root_url: root_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            user_agent: format!("goshawk-search/{}", env!("CARGO_PKG_VERSION")),
        })
    }

    /// Current user agent string
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.root_url, path.trim_start_matches('/'))
    }

    async fn parse_response(response: Response) -> Result<serde_json::Value, ApiError> {
        let status = response.status().as_u16();
        let text = response.text().await?;

        if status == 401 || status == 403 {
            return Err(ApiError::Auth(error_message(&text)));
        }
        if !(200..300).contains(&status) {
            return Err(ApiError::Status {
                status,
                message: error_message(&text),
            });
        }

        if text.trim().is_empty() {
            // 204-style acknowledgements carry no body
            return Ok(serde_json::Value::Null);
        }

        serde_json::from_str(&text)
            .map_err(|e| ApiError::Protocol(format!("response is not valid JSON: {}", e)))
    }
}

#[async_trait]
impl ApiExecutor for HttpExecutor {
    async fn call(&self, request: ApiRequest) -> Result<serde_json::Value, ApiError> {
        let url = self.url_for(&request.path);
        debug!(method = ?request.method, %url, "api request");

        let mut req_builder = match request.method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url),
            HttpMethod::Delete => self.client.delete(&url),
        };

        req_builder = req_builder
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("User-Agent", &self.user_agent)
            .header("Accept", "application/json");

        if !request.params.is_empty() {
            req_builder = req_builder.query(&request.params);
        }

        if let Some(body) = request.body {
            req_builder = req_builder.json(&body);
        }

        let response = req_builder.send().await?;
        Self::parse_response(response).await
    }
}

/// Human-readable message from a failure body.
///
/// The service reports failures as `{"error": "..."}`; anything else falls
/// back to the first line of the body, bounded.
fn error_message(text: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(text) {
        if let Some(error) = value.get("error").and_then(|e| e.as_str()) {
            return error.to_string();
        }
    }

    let line = text.lines().next().unwrap_or("").trim();
    if line.chars().count() > 200 {
        let bounded: String = line.chars().take(200).collect();
        format!("{}...", bounded)
    } else {
        line.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let req = ApiRequest::get("search/abc")
            .query("token", "tok-2")
            .query("limit", "10");
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.path, "search/abc");
        assert_eq!(req.params.get("token").map(String::as_str), Some("tok-2"));
        assert!(req.body.is_none());

        let req = ApiRequest::post("search").json(serde_json::json!({"query": "*"}));
        assert_eq!(req.method, HttpMethod::Post);
        assert!(req.body.is_some());
    }

    #[test]
    fn test_url_joining() {
        let executor = HttpExecutor::new("https://search.goshawk.io/v1/", "key").unwrap();
        assert_eq!(
            executor.url_for("/search/validate"),
            "https://search.goshawk.io/v1/search/validate"
        );
        assert_eq!(
            executor.url_for("search"),
            "https://search.goshawk.io/v1/search"
        );
    }

    #[test]
    fn test_user_agent_carries_version() {
        let executor = HttpExecutor::new("https://search.goshawk.io/v1", "key").unwrap();
        assert!(executor.user_agent().starts_with("goshawk-search/"));
    }

    #[test]
    fn test_error_message_prefers_error_field() {
        assert_eq!(
            error_message(r#"{"error": "Job not found", "jobId": "x"}"#),
            "Job not found"
        );
        assert_eq!(error_message("  plain  \nrest"), "plain");

        let long = "x".repeat(500);
        assert_eq!(error_message(&long).len(), 203);
    }
}
