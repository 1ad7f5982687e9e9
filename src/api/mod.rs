//! Admin REST client.
//!
//! Request/response calls against the backend's `/admin` endpoints. Every
//! response is wrapped in an [`ApiResponse`] envelope; `success: false` is
//! surfaced as [`ApiError::Rejected`] with the server's message.
//!
//! There are no automatic retries. Callers (the console's action handlers)
//! run each request once and report the outcome.
//!
//! ## Example
//!
//! ```rust,no_run
//! use mentionwatch::api::{AdminApi, ErrorLogQuery};
//!
//! # tokio_test::block_on(async {
//! let api = AdminApi::builder()
//!     .endpoint("https://api.example.com")
//!     .token("admin-token")
//!     .build()?;
//!
//! let stats = api.queue_stats().await?;
//! println!("{} failed of {}", stats.failed, stats.total());
//!
//! for entry in api.queue_errors(&ErrorLogQuery::default().limit(20)).await? {
//!     println!("{}: {}", entry.source_type, entry.error_message);
//! }
//! # Ok::<(), mentionwatch::api::ApiError>(())
//! # });
//! ```

mod error;
pub mod guidance;

pub use error::ApiError;
pub use guidance::{guidance_for, Guidance};

use std::time::Duration;

use mentionwatch_types::{
    ApiHealth, ApiResponse, ErrorLogEntry, KeywordUpdate, QueueErrorEntry, QueueReset,
    QueueStatus, ResetSummary, SourcePreferenceUpdate, UserStats,
};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

/// Filters for the error log endpoints.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorLogQuery {
    pub limit: Option<u32>,
    pub severity: Option<String>,
    pub source: Option<String>,
}

impl ErrorLogQuery {
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn severity(mut self, severity: impl Into<String>) -> Self {
        self.severity = Some(severity.into());
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(severity) = &self.severity {
            pairs.push(("severity", severity.clone()));
        }
        if let Some(source) = &self.source {
            pairs.push(("source", source.clone()));
        }
        pairs
    }
}

/// Client for the backend's admin REST API.
#[derive(Debug, Clone)]
pub struct AdminApi {
    client: Client,
    endpoint: String,
    token: Option<String>,
}

impl AdminApi {
    /// Create a new builder for configuring the client.
    pub fn builder() -> AdminApiBuilder {
        AdminApiBuilder::default()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// `GET /admin/queue/stats`
    pub async fn queue_stats(&self) -> Result<QueueStatus, ApiError> {
        self.fetch(self.get("/admin/queue/stats")).await
    }

    /// `GET /admin/api-health`
    pub async fn api_health(&self) -> Result<ApiHealth, ApiError> {
        self.fetch(self.get("/admin/api-health")).await
    }

    /// `GET /admin/users/stats`
    pub async fn user_stats(&self) -> Result<UserStats, ApiError> {
        self.fetch(self.get("/admin/users/stats")).await
    }

    /// `GET /admin/error-logs`
    pub async fn error_logs(&self, query: &ErrorLogQuery) -> Result<Vec<ErrorLogEntry>, ApiError> {
        self.fetch(self.get("/admin/error-logs").query(&query.pairs()))
            .await
    }

    /// `GET /admin/queue/errors`
    pub async fn queue_errors(
        &self,
        query: &ErrorLogQuery,
    ) -> Result<Vec<QueueErrorEntry>, ApiError> {
        self.fetch(self.get("/admin/queue/errors").query(&query.pairs()))
            .await
    }

    /// `PUT /admin/users/keyword`
    pub async fn update_brand_keyword(&self, update: &KeywordUpdate) -> Result<(), ApiError> {
        self.acknowledge(self.put("/admin/users/keyword", update))
            .await
    }

    /// `PUT /admin/sources/preferences`
    pub async fn update_source_preferences(
        &self,
        update: &SourcePreferenceUpdate,
    ) -> Result<(), ApiError> {
        self.acknowledge(self.put("/admin/sources/preferences", update))
            .await
    }

    /// `POST /admin/queue/reset`
    pub async fn reset_queue(&self, reset: &QueueReset) -> Result<ResetSummary, ApiError> {
        self.fetch(self.request(reqwest::Method::POST, "/admin/queue/reset").json(reset))
            .await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        let request = self.client.request(method, self.url(path));
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.request(reqwest::Method::GET, path)
    }

    fn put<B: Serialize>(&self, path: &str, body: &B) -> RequestBuilder {
        self.request(reqwest::Method::PUT, path).json(body)
    }

    async fn envelope<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<ApiResponse<T>, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        debug!(url = %response.url(), %status, "admin API response");

        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Err(ApiError::Auth(format!("API returned status {}", status)));
        }

        let body = response.text().await?;
        match serde_json::from_str::<ApiResponse<T>>(&body) {
            Ok(envelope) => Ok(envelope),
            // Error statuses without an envelope body.
            Err(_) if !status.is_success() => {
                Err(ApiError::Http(format!("API returned status {}", status)))
            }
            Err(e) => Err(ApiError::Parse(e.to_string())),
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        self.envelope(request)
            .await?
            .into_result()
            .map_err(ApiError::Rejected)
    }

    async fn acknowledge(&self, request: RequestBuilder) -> Result<(), ApiError> {
        self.envelope::<serde_json::Value>(request)
            .await?
            .into_ack()
            .map_err(ApiError::Rejected)
    }
}

/// Builder for [`AdminApi`].
#[derive(Debug, Default)]
pub struct AdminApiBuilder {
    endpoint: Option<String>,
    token: Option<String>,
    timeout: Option<Duration>,
}

impl AdminApiBuilder {
    /// Set the API base URL (e.g., "https://api.example.com").
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the bearer token sent with every request.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into()).filter(|t| !t.is_empty());
        self
    }

    /// Set the request timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<AdminApi, ApiError> {
        let timeout = self.timeout.unwrap_or(Duration::from_secs(10));

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Http(e.to_string()))?;

        let endpoint = self
            .endpoint
            .unwrap_or_else(|| "http://localhost:3000".to_string());

        Ok(AdminApi {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            token: self.token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serve one canned HTTP response and return the raw request.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request).to_string();
                if let Some(head_end) = text.find("\r\n\r\n") {
                    let length = text[..head_end]
                        .lines()
                        .find_map(|l| {
                            let (name, value) = l.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())?
                        })
                        .unwrap_or(0);
                    if request.len() >= head_end + 4 + length {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&request).to_string()
        });

        (format!("http://{}", addr), server)
    }

    fn api(endpoint: &str) -> AdminApi {
        AdminApi::builder()
            .endpoint(endpoint)
            .token("secret")
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_defaults() {
        let api = AdminApi::builder().build().unwrap();
        assert_eq!(api.endpoint(), "http://localhost:3000");
        assert!(api.token.is_none());

        let api = AdminApi::builder()
            .endpoint("https://api.example.com/")
            .token("")
            .build()
            .unwrap();
        assert_eq!(api.endpoint(), "https://api.example.com");
        assert!(api.token.is_none());
    }

    #[test]
    fn test_query_pairs() {
        let query = ErrorLogQuery::default().limit(50).severity("error");
        assert_eq!(
            query.pairs(),
            vec![("limit", "50".to_string()), ("severity", "error".to_string())]
        );
        assert!(ErrorLogQuery::default().pairs().is_empty());
    }

    #[tokio::test]
    async fn test_queue_stats_sends_bearer_token() {
        let (endpoint, server) = serve_once(
            "200 OK",
            r#"{"success":true,"data":{"pending":3,"processing":1,"completed":90,"failed":6}}"#,
        )
        .await;

        let stats = api(&endpoint).queue_stats().await.unwrap();
        assert_eq!(stats.pending, 3);
        assert_eq!(stats.total(), 100);

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /admin/queue/stats "));
        assert!(request.to_lowercase().contains("authorization: bearer secret"));
    }

    #[tokio::test]
    async fn test_error_logs_query_string() {
        let (endpoint, server) = serve_once("200 OK", r#"{"success":true,"data":[]}"#).await;

        let logs = api(&endpoint)
            .error_logs(&ErrorLogQuery::default().limit(5).source("twitter"))
            .await
            .unwrap();
        assert!(logs.is_empty());

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /admin/error-logs?limit=5&source=twitter "));
    }

    #[tokio::test]
    async fn test_rejected_envelope() {
        let (endpoint, _server) =
            serve_once("200 OK", r#"{"success":false,"error":"user not found"}"#).await;

        let err = api(&endpoint)
            .update_brand_keyword(&KeywordUpdate {
                user_id: "u1".into(),
                keyword: "acme".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Rejected(ref m) if m == "user not found"));
    }

    #[tokio::test]
    async fn test_keyword_update_body() {
        let (endpoint, server) = serve_once("200 OK", r#"{"success":true}"#).await;

        api(&endpoint)
            .update_brand_keyword(&KeywordUpdate {
                user_id: "u1".into(),
                keyword: "acme".into(),
            })
            .await
            .unwrap();

        let request = server.await.unwrap();
        assert!(request.starts_with("PUT /admin/users/keyword "));
        assert!(request.contains(r#"{"userId":"u1","keyword":"acme"}"#));
    }

    #[tokio::test]
    async fn test_unauthorized() {
        let (endpoint, _server) = serve_once("401 Unauthorized", "").await;
        let err = api(&endpoint).user_stats().await.unwrap_err();
        assert!(matches!(err, ApiError::Auth(_)));
    }

    #[tokio::test]
    async fn test_server_error_without_envelope() {
        let (endpoint, _server) = serve_once("502 Bad Gateway", "upstream down").await;
        let err = api(&endpoint).api_health().await.unwrap_err();
        assert!(matches!(err, ApiError::Http(_)));
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let err = api(&endpoint).queue_stats().await.unwrap_err();
        assert!(matches!(err, ApiError::Connection(_)));
    }
}
