//! Dispatch results and per-attempt trace logs.

use std::time::Duration;

use bytes::Bytes;
use http::StatusCode;
use serde::de::DeserializeOwned;
use tracing::info;

use crate::{HttpClientError, Response, Result};

/// Maximum number of response body bytes kept on a [`TraceLog`].
pub const MAX_LOG_BODY: usize = 1024;

/// Diagnostic record of a single attempt.
#[derive(Debug, Clone)]
pub struct TraceLog {
    attempt: u32,
    elapsed: Duration,
    status: Option<StatusCode>,
    body: Bytes,
    error: Option<HttpClientError>,
}

impl TraceLog {
    pub(crate) fn new(
        attempt: u32,
        elapsed: Duration,
        status: Option<StatusCode>,
        body: &[u8],
        error: Option<HttpClientError>,
    ) -> Self {
        let len = body.len().min(MAX_LOG_BODY);
        Self {
            attempt,
            elapsed,
            status,
            body: Bytes::copy_from_slice(&body[..len]),
            error,
        }
    }

    /// Attempt index, starting at 0.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Time spent waiting for the transport on this attempt.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Response status, if a response was received.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Response status as a number, 0 when no response was received.
    pub fn status_code(&self) -> u16 {
        self.status.map_or(0, |s| s.as_u16())
    }

    /// Response body prefix, at most [`MAX_LOG_BODY`] bytes.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Error observed on this attempt.
    pub fn error(&self) -> Option<&HttpClientError> {
        self.error.as_ref()
    }
}

/// Outcome of one dispatch: the last attempt's response, body and error,
/// plus one [`TraceLog`] per attempt in order.
///
/// Always inspect [`error`](Self::error) before trusting the response or
/// body.
#[derive(Debug)]
pub struct RequestResult {
    request: Option<http::Request<Bytes>>,
    response: Option<Response>,
    body: Bytes,
    error: Option<HttpClientError>,
    logs: Vec<TraceLog>,
    total_elapsed: Duration,
}

impl RequestResult {
    pub(crate) fn new(
        request: http::Request<Bytes>,
        response: Option<Response>,
        body: Bytes,
        error: Option<HttpClientError>,
        logs: Vec<TraceLog>,
        total_elapsed: Duration,
    ) -> Self {
        Self {
            request: Some(request),
            response,
            body,
            error,
            logs,
            total_elapsed,
        }
    }

    /// A result for a request that failed before any attempt was made.
    pub(crate) fn failed(error: HttpClientError) -> Self {
        Self {
            request: None,
            response: None,
            body: Bytes::new(),
            error: Some(error),
            logs: Vec::new(),
            total_elapsed: Duration::ZERO,
        }
    }

    /// The request that was dispatched, if one was built.
    pub fn request(&self) -> Option<&http::Request<Bytes>> {
        self.request.as_ref()
    }

    /// Response, body and error of the last attempt.
    pub fn response(&self) -> (Option<&Response>, &Bytes, Option<&HttpClientError>) {
        (self.response.as_ref(), &self.body, self.error.as_ref())
    }

    /// Status of the final response.
    pub fn status(&self) -> Option<StatusCode> {
        self.response.as_ref().map(Response::status)
    }

    /// Raw body of the final response.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Final error.
    pub fn error(&self) -> Option<&HttpClientError> {
        self.error.as_ref()
    }

    /// Check if the dispatch ended without an error.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Trace logs in attempt order.
    pub fn logs(&self) -> &[TraceLog] {
        &self.logs
    }

    /// Number of attempts made.
    pub fn attempts(&self) -> usize {
        self.logs.len()
    }

    /// Wall time of the whole dispatch, retry intervals included.
    pub fn total_elapsed(&self) -> Duration {
        self.total_elapsed
    }

    /// Decode the body as JSON.
    ///
    /// A result that already carries an error returns that error without
    /// looking at the body.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        if let Some(error) = &self.error {
            return Err(error.clone());
        }
        serde_json::from_slice(&self.body).map_err(|e| HttpClientError::Json(e.to_string()))
    }

    /// Decode the body as JSON, returning it alongside the response and raw body.
    pub fn json_to<T: DeserializeOwned>(&self) -> (Option<&Response>, &Bytes, Result<T>) {
        (self.response.as_ref(), &self.body, self.json())
    }

    /// Get the body as text.
    pub fn text(&self) -> Result<String> {
        if let Some(error) = &self.error {
            return Err(error.clone());
        }
        String::from_utf8(self.body.to_vec()).map_err(|e| HttpClientError::BodyRead(e.to_string()))
    }

    /// Consume the result, returning the response and body or the error.
    pub fn into_result(self) -> Result<(Response, Bytes)> {
        if let Some(error) = self.error {
            return Err(error);
        }
        self.response
            .map(|response| (response, self.body))
            .ok_or(HttpClientError::NoResponse)
    }

    /// Emit one log record per attempt and return the result unchanged.
    pub fn log_info(self) -> Self {
        let (method, uri) = match &self.request {
            Some(request) => (request.method().as_str(), request.uri().to_string()),
            None => ("-", String::from("-")),
        };
        for log in &self.logs {
            info!(
                method,
                uri = %uri,
                attempt = log.attempt(),
                status = log.status_code(),
                elapsed_ms = log.elapsed().as_millis() as u64,
                body = %String::from_utf8_lossy(log.body()),
                error = ?log.error(),
                "HTTP attempt"
            );
        }
        info!(
            method,
            uri = %uri,
            attempts = self.logs.len(),
            total_elapsed_ms = self.total_elapsed.as_millis() as u64,
            error = ?self.error,
            "HTTP request finished"
        );
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        id: u32,
    }

    fn ok_result(body: &'static [u8]) -> RequestResult {
        let (parts, ()) = http::Response::builder()
            .status(200)
            .body(())
            .unwrap()
            .into_parts();
        let request = http::Request::builder()
            .uri("http://localhost/items")
            .body(Bytes::new())
            .unwrap();
        let log = TraceLog::new(
            0,
            Duration::from_millis(3),
            Some(StatusCode::OK),
            body,
            None,
        );
        RequestResult::new(
            request,
            Some(Response::from_parts(parts)),
            Bytes::from_static(body),
            None,
            vec![log],
            Duration::from_millis(3),
        )
    }

    #[test]
    fn test_trace_log_truncates_large_body() {
        let body = vec![b'x'; MAX_LOG_BODY * 3];
        let log = TraceLog::new(0, Duration::ZERO, Some(StatusCode::OK), &body, None);
        assert_eq!(log.body().len(), MAX_LOG_BODY);
    }

    #[test]
    fn test_trace_log_keeps_small_body() {
        let log = TraceLog::new(2, Duration::ZERO, None, b"short", None);
        assert_eq!(&log.body()[..], b"short");
        assert_eq!(log.attempt(), 2);
        assert_eq!(log.status_code(), 0);
    }

    #[test]
    fn test_json_decodes_body() {
        let result = ok_result(br#"{"id": 7}"#);
        let item: Item = result.json().unwrap();
        assert_eq!(item, Item { id: 7 });

        let (response, body, decoded) = result.json_to::<Item>();
        assert_eq!(response.unwrap().status(), StatusCode::OK);
        assert_eq!(&body[..], br#"{"id": 7}"#);
        assert_eq!(decoded.unwrap(), Item { id: 7 });
    }

    #[test]
    fn test_json_short_circuits_on_error() {
        let err = HttpClientError::UnexpectedStatus {
            status: 404,
            expected: 200,
        };
        let result = RequestResult::failed(err.clone());
        assert_eq!(result.json::<Item>().unwrap_err(), err);
        assert_eq!(result.attempts(), 0);
        assert!(result.request().is_none());
    }

    #[test]
    fn test_json_decode_error() {
        let result = ok_result(b"not json");
        assert!(matches!(
            result.json::<Item>(),
            Err(HttpClientError::Json(_))
        ));
    }

    #[test]
    fn test_into_result() {
        let (response, body) = ok_result(b"hello").into_result().unwrap();
        assert!(response.is_success());
        assert_eq!(&body[..], b"hello");

        let result = RequestResult::failed(HttpClientError::NoResponse);
        assert_eq!(
            result.into_result().unwrap_err(),
            HttpClientError::NoResponse
        );
    }

    #[test]
    fn test_log_info_returns_self() {
        let result = ok_result(b"ok").log_info();
        assert_eq!(result.text().unwrap(), "ok");
    }
}
