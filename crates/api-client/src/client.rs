//! Main API client implementation

use crate::config::ClientConfig;
use crate::endpoints::{AuthorsApi, BooksApi, BorrowedBooksApi, MembersApi};
use crate::envelope::{error_message, ApiEnvelope};
use crate::error::{ApiError, ApiResult, ErrorContext};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, instrument, Span};
use uuid::Uuid;

/// Request correlation ID header
const X_REQUEST_ID: &str = "X-Request-ID";

/// Query string type for requests without parameters
type NoQuery = [(&'static str, &'static str)];

/// Libris REST API client
///
/// Wraps `reqwest` with a fixed base URL, a bounded timeout, JSON headers and a
/// correlation id per request. Every call issues exactly one HTTP request; retry
/// lives in the query layer.
#[derive(Clone)]
pub struct LibraryClient {
    inner: Client,
    config: Arc<ClientConfig>,
}

impl LibraryClient {
    /// Create a new client with configuration from environment
    pub fn new() -> ApiResult<Self> {
        let config = ClientConfig::from_env()?;
        Self::with_config(config)
    }

    /// Create a new client with specific configuration
    pub fn with_config(config: ClientConfig) -> ApiResult<Self> {
        config.validate()?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        default_headers.insert(USER_AGENT, HeaderValue::from_static("libris-api-client/0.3"));

        let inner = Client::builder()
            .timeout(config.timeout)
            .default_headers(default_headers)
            .build()
            .map_err(ApiError::Request)?;

        Ok(Self {
            inner,
            config: Arc::new(config),
        })
    }

    /// Get the current configuration
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get the base URL
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    // -------------------------------------------------------------------------
    // Endpoint API accessors
    // -------------------------------------------------------------------------

    /// Access author endpoints
    #[must_use]
    pub fn authors(&self) -> AuthorsApi {
        AuthorsApi::new(self.clone())
    }

    /// Access book endpoints
    #[must_use]
    pub fn books(&self) -> BooksApi {
        BooksApi::new(self.clone())
    }

    /// Access member endpoints
    #[must_use]
    pub fn members(&self) -> MembersApi {
        MembersApi::new(self.clone())
    }

    /// Access borrowing endpoints
    #[must_use]
    pub fn borrowed_books(&self) -> BorrowedBooksApi {
        BorrowedBooksApi::new(self.clone())
    }

    // -------------------------------------------------------------------------
    // Low-level HTTP methods
    // -------------------------------------------------------------------------

    /// Perform a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<ApiEnvelope<T>> {
        self.request(Method::GET, path, Option::<&NoQuery>::None, Option::<&()>::None)
            .await
    }

    /// Perform a GET request with query parameters
    pub async fn get_with_query<T, Q>(&self, path: &str, query: &Q) -> ApiResult<ApiEnvelope<T>>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        self.request(Method::GET, path, Some(query), Option::<&()>::None)
            .await
    }

    /// Perform a POST request with a JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<ApiEnvelope<T>> {
        self.request(Method::POST, path, Option::<&NoQuery>::None, Some(body))
            .await
    }

    /// Perform a PUT request with a JSON body
    pub async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<ApiEnvelope<T>> {
        self.request(Method::PUT, path, Option::<&NoQuery>::None, Some(body))
            .await
    }

    /// Perform a PUT request without a body
    pub async fn put_empty<T, Q>(&self, path: &str, query: Option<&Q>) -> ApiResult<ApiEnvelope<T>>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        self.request(Method::PUT, path, query, Option::<&()>::None)
            .await
    }

    /// Perform a DELETE request
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> ApiResult<ApiEnvelope<T>> {
        self.request(Method::DELETE, path, Option::<&NoQuery>::None, Option::<&()>::None)
            .await
    }

    /// Execute a single request and decode the envelope
    #[instrument(skip(self, query, body), fields(request_id))]
    async fn request<T, Q, B>(
        &self,
        method: Method,
        path: &str,
        query: Option<&Q>,
        body: Option<&B>,
    ) -> ApiResult<ApiEnvelope<T>>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
        B: Serialize,
    {
        let request_id = Uuid::new_v4().to_string();
        Span::current().record("request_id", request_id.as_str());

        let context = ErrorContext {
            request_id: Some(request_id.clone()),
            endpoint: path.to_string(),
            method: method.to_string(),
        };

        let url = self.config.url(path);
        let mut request = self
            .inner
            .request(method, &url)
            .header(X_REQUEST_ID, &request_id);

        if let Some(q) = query {
            request = request.query(q);
        }
        if let Some(b) = body {
            request = request.json(b);
        }

        let start = Instant::now();
        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        debug!(
            status = response.status().as_u16(),
            elapsed_ms = start.elapsed().as_millis(),
            "Response received"
        );

        self.handle_response(response, &context).await
    }

    /// Decode a response, logging forbidden and server errors
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: Response,
        context: &ErrorContext,
    ) -> ApiResult<ApiEnvelope<T>> {
        let status = response.status();
        let body = response.bytes().await.map_err(|e| self.transport_error(e))?;

        if status.is_success() {
            return Ok(serde_json::from_slice(&body)?);
        }

        if status == StatusCode::FORBIDDEN {
            error!(status = status.as_u16(), context = %context, "Access forbidden");
        } else if status.is_server_error() {
            error!(status = status.as_u16(), context = %context, "Server error occurred");
        }

        let message = error_message(&String::from_utf8_lossy(&body));
        Err(ApiError::api(status.as_u16(), message))
    }

    fn transport_error(&self, e: reqwest::Error) -> ApiError {
        if e.is_timeout() {
            ApiError::Timeout(self.config.timeout)
        } else {
            ApiError::Request(e)
        }
    }
}
