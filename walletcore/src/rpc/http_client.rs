/// HTTP client interface the embedding service must implement for the
/// crate to reach its JSON-RPC endpoint.
///
/// Keeping the transport outside the crate lets the embedder own
/// connection pooling, authentication headers, TLS policy and timeouts;
/// implementations should map their transport failures onto the
/// [`HttpError`] variants so callers see a consistent taxonomy.
#[async_trait::async_trait]
pub trait HttpClient: Send + Sync {
    /// Sends `body` as a JSON POST to `url` and returns the raw response
    /// body.
    ///
    /// # Errors
    /// * `HttpError::BadStatusCode` - for HTTP error status codes (4xx,
    ///   5xx) with the response body
    /// * `HttpError::NoConnectivity` - when no connection is available
    /// * `HttpError::Timeout` - when the request times out
    /// * `HttpError::Generic` - for other unexpected transport errors
    async fn post_json(
        &self,
        url: &str,
        body: Vec<u8>,
    ) -> Result<Vec<u8>, HttpError>;
}

/// Represents HTTP-related errors that can occur during network requests.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// HTTP error with specific status code (4xx, 5xx responses)
    #[error("bad status code {code}")]
    BadStatusCode {
        /// The HTTP status code that was returned
        code: u64,
        /// The response body, which may contain error details
        response_body: Vec<u8>,
    },
    /// No connectivity available
    #[error("no connectivity")]
    NoConnectivity,
    /// Request timed out
    #[error("request timed out after {seconds} seconds")]
    Timeout {
        /// Number of seconds before timeout occurred
        seconds: u64,
    },
    /// Generic error for unexpected transport failures
    #[error("transport error: {message}")]
    Generic {
        /// The error message
        message: String,
    },
}
