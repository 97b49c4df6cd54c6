//! Blocking HTTP client implementation.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue};
use parking_lot::RwLock;
use tracing::trace;

use crate::{HttpClientConfig, HttpClientError, RequestBuilder, Result, Transport, TransportBody};

static DEFAULT_CLIENT: RwLock<Option<HttpClient>> = parking_lot::const_rwlock(None);

/// Install the process-wide default client.
pub fn set_default_client(client: HttpClient) {
    *DEFAULT_CLIENT.write() = Some(client);
}

/// Get a handle to the process-wide default client, if one was installed.
pub fn default_client() -> Option<HttpClient> {
    DEFAULT_CLIENT.read().clone()
}

/// Blocking HTTP client backed by reqwest.
///
/// Cloning is cheap and clones share the connection pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::blocking::Client,
    base_url: Option<Arc<url::Url>>,
    config: Arc<HttpClientConfig>,
}

impl HttpClient {
    /// Create a new HTTP client with the given configuration.
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        for (name, value) in &config.default_headers {
            let header_name = HeaderName::try_from(name.as_str())
                .map_err(|e| HttpClientError::InvalidHeader(format!("{name}: {e}")))?;
            let header_value = HeaderValue::try_from(value.as_str())
                .map_err(|e| HttpClientError::InvalidHeader(format!("{name}: {e}")))?;
            default_headers.append(header_name, header_value);
        }

        let base_url = config
            .base_url
            .as_deref()
            .map(url::Url::parse)
            .transpose()?
            .map(Arc::new);

        let redirect = if config.follow_redirects {
            reqwest::redirect::Policy::limited(config.max_redirects)
        } else {
            reqwest::redirect::Policy::none()
        };

        let inner = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .user_agent(config.user_agent.as_str())
            .default_headers(default_headers)
            .gzip(config.gzip)
            .brotli(config.brotli)
            .redirect(redirect)
            .build()
            .map_err(|e| HttpClientError::ClientBuild(e.to_string()))?;

        Ok(Self {
            inner,
            base_url,
            config: Arc::new(config),
        })
    }

    /// Create a client with default configuration and the given timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        Self::new(HttpClientConfig::builder().timeout(timeout).build())
    }

    /// Get the underlying reqwest client.
    pub fn inner(&self) -> &reqwest::blocking::Client {
        &self.inner
    }

    /// Get the client configuration.
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Create a request builder bound to this client.
    ///
    /// The builder starts with the configured base URL and retry policy.
    pub fn request(&self) -> RequestBuilder<'_> {
        let mut builder = RequestBuilder::new(self);
        if let Some(base) = &self.base_url {
            builder = builder.base_url(base);
        }
        if let Some(policy) = &self.config.retry {
            builder = builder.retry(policy.clone());
        }
        builder
    }

    /// Create a GET request builder.
    pub fn get(&self, url: impl Into<String>) -> RequestBuilder<'_> {
        self.request().get(url)
    }

    /// Create a POST request builder.
    pub fn post(&self, url: impl Into<String>) -> RequestBuilder<'_> {
        self.request().post(url)
    }

    /// Create a PUT request builder.
    pub fn put(&self, url: impl Into<String>) -> RequestBuilder<'_> {
        self.request().put(url)
    }

    /// Create a PATCH request builder.
    pub fn patch(&self, url: impl Into<String>) -> RequestBuilder<'_> {
        self.request().patch(url)
    }

    /// Create a DELETE request builder.
    pub fn delete(&self, url: impl Into<String>) -> RequestBuilder<'_> {
        self.request().delete(url)
    }

    /// Create a HEAD request builder.
    pub fn head(&self, url: impl Into<String>) -> RequestBuilder<'_> {
        self.request().head(url)
    }

    /// Create an OPTIONS request builder.
    pub fn options(&self, url: impl Into<String>) -> RequestBuilder<'_> {
        self.request().options(url)
    }
}

impl Transport for HttpClient {
    fn execute(&self, request: &http::Request<Bytes>) -> Result<http::Response<TransportBody>> {
        trace!(method = %request.method(), uri = %request.uri(), "Executing request");

        let mut builder = self
            .inner
            .request(request.method().clone(), request.uri().to_string())
            .headers(request.headers().clone());
        if !request.body().is_empty() {
            builder = builder.body(request.body().to_vec());
        }
        let response = builder.send()?;

        let status = response.status();
        let version = response.version();
        let headers = response.headers().clone();
        let mut mapped: http::Response<TransportBody> = http::Response::new(Box::new(response));
        *mapped.status_mut() = status;
        *mapped.version_mut() = version;
        *mapped.headers_mut() = headers;
        Ok(mapped)
    }
}
