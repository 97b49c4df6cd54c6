//! # Armature Request
//!
//! A fluent, blocking HTTP request builder with retry policies and
//! per-attempt trace logs.
//!
//! ## Features
//!
//! - **Fluent Builder**: Method, URL, headers, query, cookies and auth in one chain
//! - **Body Encoders**: JSON, URL-encoded forms and multipart file uploads
//! - **Retry Policies**: Retry on transport errors, status codes or status ranges
//! - **Trace Logs**: One diagnostic record per attempt, body prefix included
//! - **Expected Status**: Turn an unexpected final status into an error
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use armature_request::{HttpClient, HttpClientConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = HttpClient::new(HttpClientConfig::default())?;
//!
//!     let result = client
//!         .get("https://api.example.com/users")
//!         .set_query("page", "2")
//!         .expect_status(200)
//!         .send();
//!
//!     let users: serde_json::Value = result.json()?;
//!     println!("{users}");
//!     Ok(())
//! }
//! ```
//!
//! ## With Retries
//!
//! ```rust,no_run
//! use armature_request::{HttpClient, RetryPolicy};
//! use std::time::Duration;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = HttpClient::with_timeout(Duration::from_secs(5))?;
//!
//!     // Retry up to twice, 100ms apart, on errors and any 5xx response.
//!     let result = client
//!         .post("https://api.example.com/orders")
//!         .retry(RetryPolicy::new(2, Duration::from_millis(100), [], 500, 599))
//!         .send_json(serde_json::json!({"item": "widget", "quantity": 5}))
//!         .log_info();
//!
//!     for log in result.logs() {
//!         println!("attempt {} -> {}", log.attempt(), log.status_code());
//!     }
//!     Ok(())
//! }
//! ```

mod body;
mod client;
mod config;
mod dispatch;
mod error;
mod request;
mod response;
mod result;
mod retry;
mod transport;

pub use body::{
    ContentKind, FileSource, MultipartFile, Payload, encode_form, encode_json, encode_multipart,
};
pub use client::{HttpClient, default_client, set_default_client};
pub use config::{HttpClientConfig, HttpClientConfigBuilder};
pub use dispatch::{Dispatcher, MAX_ATTEMPTS};
pub use error::{HttpClientError, Result, TransportErrorKind};
pub use request::{Cookie, RequestBuilder};
pub use response::Response;
pub use result::{MAX_LOG_BODY, RequestResult, TraceLog};
pub use retry::{BackoffStrategy, RetryPolicy, RetryStrategy};
pub use transport::{Transport, TransportBody};

pub use bytes::Bytes;
pub use http::{HeaderMap, Method, StatusCode, header};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{
        ContentKind, Cookie, HttpClient, HttpClientConfig, HttpClientError, MultipartFile,
        RequestBuilder, RequestResult, RetryPolicy, RetryStrategy, TraceLog,
    };
}
