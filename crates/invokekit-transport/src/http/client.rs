//! HTTP transport client implementation
//!
//! Implements the Transport trait by POSTing each command to
//! `{endpoint}/{command}` with the arguments as a JSON body.

use crate::error::{DomainFailure, Result, TransportError};
use crate::traits::{CommandRequest, Deadline, Transport};
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use reqwest::header::HeaderMap;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// HTTP transport implementation
///
/// Performs exactly one request per attempt; retries are the client's job.
///
/// - 2xx responses yield the JSON body (`null` when empty)
/// - error responses carrying a `{code, description, ...}` body, bare or
///   wrapped in `{"error": ...}`, become domain failures
/// - other error responses, timeouts and connection failures become system
///   failures
///
/// # Examples
///
/// ```rust,no_run
/// use invokekit_transport::{CommandRequest, Deadline, HttpTransport, Transport};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = HttpTransport::new("http://127.0.0.1:8080/commands")?;
/// let request = CommandRequest::new("get_accounts").with_arg("userId", "u-1");
/// let accounts = transport
///     .attempt(&request, Deadline::after(Duration::from_secs(30)))
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Arc<ReqwestClient>,
    endpoint: Url,
}

impl HttpTransport {
    /// Create a new HTTP transport for `endpoint` with default configuration
    ///
    /// # Errors
    ///
    /// Returns a system failure if the endpoint is not a valid base URL or the
    /// underlying client cannot be built.
    pub fn new(endpoint: &str) -> Result<Self> {
        let endpoint = Url::parse(endpoint).map_err(|e| {
            TransportError::system_with_cause(format!("invalid endpoint '{}'", endpoint), e)
        })?;
        Self::with_config(HttpTransportConfig::new(endpoint))
    }

    /// Create a new HTTP transport with custom configuration
    ///
    /// # Errors
    ///
    /// Returns a system failure if the endpoint cannot serve as a base URL or
    /// the underlying client cannot be built.
    pub fn with_config(config: HttpTransportConfig) -> Result<Self> {
        if config.endpoint.cannot_be_a_base() {
            return Err(TransportError::system(format!(
                "endpoint '{}' cannot be used as a base URL",
                config.endpoint
            )));
        }

        let client = ReqwestClient::builder()
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .default_headers(config.default_headers)
            .build()
            .map_err(|e| TransportError::system_with_cause("failed to build HTTP client", e))?;

        Ok(Self {
            client: Arc::new(client),
            endpoint: config.endpoint,
        })
    }

    /// The base endpoint commands are posted to
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// URL a given command is posted to
    pub fn command_url(&self, name: &str) -> Url {
        let mut url = self.endpoint.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(name);
        }
        url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn attempt(&self, request: &CommandRequest, deadline: Deadline) -> Result<Value> {
        let url = self.command_url(&request.name);
        tracing::debug!(command = %request.name, url = %url, "Sending command over HTTP");

        let response = self
            .client
            .post(url)
            .timeout(deadline.remaining())
            .json(&request.args)
            .send()
            .await
            .map_err(|e| map_send_error(e, deadline))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| map_send_error(e, deadline))?;

        tracing::debug!(command = %request.name, status = status.as_u16(), "Received HTTP response");

        if status.is_success() {
            if body.is_empty() {
                return Ok(Value::Null);
            }
            return serde_json::from_slice(&body).map_err(|e| {
                TransportError::Other(anyhow::Error::new(e).context(format!(
                    "command '{}' returned a non-JSON body",
                    request.name
                )))
            });
        }

        if let Ok(envelope) = serde_json::from_slice::<ErrorEnvelope>(&body) {
            return Err(TransportError::Domain(envelope.into_failure()));
        }

        Err(TransportError::system(format!(
            "HTTP {}: {}",
            status.as_u16(),
            String::from_utf8_lossy(&body)
        )))
    }
}

fn map_send_error(err: reqwest::Error, deadline: Deadline) -> TransportError {
    if err.is_timeout() {
        TransportError::system_with_cause(
            format!("request timed out after {}ms", deadline.timeout().as_millis()),
            err,
        )
    } else if err.is_connect() {
        TransportError::system_with_cause(format!("connection failed: {}", err), err)
    } else if err.is_request() || err.is_body() {
        TransportError::system_with_cause(format!("request failed: {}", err), err)
    } else {
        TransportError::Other(anyhow::Error::new(err))
    }
}

/// Error bodies are accepted bare or wrapped in an `error` field
#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorEnvelope {
    Wrapped { error: DomainFailure },
    Bare(DomainFailure),
}

impl ErrorEnvelope {
    fn into_failure(self) -> DomainFailure {
        match self {
            ErrorEnvelope::Wrapped { error } => error,
            ErrorEnvelope::Bare(failure) => failure,
        }
    }
}

/// HTTP transport configuration
#[derive(Clone, Debug)]
pub struct HttpTransportConfig {
    /// Base URL commands are posted under
    pub endpoint: Url,

    /// Connection timeout
    pub connect_timeout: Duration,

    /// Maximum idle connections per host
    pub pool_max_idle_per_host: usize,

    /// Headers sent with every request
    pub default_headers: HeaderMap,
}

impl HttpTransportConfig {
    /// Configuration for `endpoint` with default connection settings
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            connect_timeout: Duration::from_secs(10),
            pool_max_idle_per_host: 10,
            default_headers: HeaderMap::new(),
        }
    }
}
