//! Request dispatch with retries.

use std::io::Read;
use std::thread;
use std::time::Instant;

use bytes::Bytes;
use http::StatusCode;
use tracing::{debug, warn};

use crate::{HttpClientError, RequestResult, Response, RetryStrategy, TraceLog, Transport};

/// Hard ceiling on attempts per dispatch, whatever the retry strategy says.
pub const MAX_ATTEMPTS: u32 = 5;

/// Runs a built request against a transport, retrying as the strategy allows.
pub struct Dispatcher<'a> {
    transport: &'a dyn Transport,
    retry: Option<&'a dyn RetryStrategy>,
    expected_status: Option<StatusCode>,
}

struct Attempt {
    response: Option<Response>,
    body: Bytes,
    error: Option<HttpClientError>,
}

impl<'a> Dispatcher<'a> {
    /// Create a dispatcher that makes a single attempt.
    pub fn new(transport: &'a dyn Transport) -> Self {
        Self {
            transport,
            retry: None,
            expected_status: None,
        }
    }

    /// Set the retry strategy.
    pub fn retry(mut self, retry: Option<&'a dyn RetryStrategy>) -> Self {
        self.retry = retry;
        self
    }

    /// Require the final response to carry this status.
    pub fn expect_status(mut self, status: Option<StatusCode>) -> Self {
        self.expected_status = status;
        self
    }

    /// Run the retry loop and collect the result.
    ///
    /// The result reflects the last attempt made, whether or not an earlier
    /// one succeeded.
    pub fn dispatch(&self, request: http::Request<Bytes>) -> RequestResult {
        let started = Instant::now();
        let mut logs = Vec::new();
        let mut last = None;
        let mut retries = 0;

        for index in 0..MAX_ATTEMPTS {
            let (attempt, log) = self.attempt(index, &request);
            let status = log.status().map(|s| s.as_u16());
            logs.push(log);

            let retry = self.retry.filter(|strategy| {
                index + 1 < MAX_ATTEMPTS
                    && strategy.should_retry(attempt.error.as_ref(), status, retries)
            });
            last = Some(attempt);

            let Some(strategy) = retry else {
                break;
            };
            let delay = strategy.retry_delay(retries);
            retries += 1;
            debug!(
                attempt = index,
                retry = retries,
                status,
                delay_ms = delay.as_millis() as u64,
                "Retrying request"
            );
            thread::sleep(delay);
        }

        let (response, body, mut error) = match last {
            Some(attempt) => (attempt.response, attempt.body, attempt.error),
            None => (None, Bytes::new(), None),
        };
        if error.is_none() {
            error = match (&response, self.expected_status) {
                (None, _) => Some(HttpClientError::NoResponse),
                (Some(response), Some(expected)) if response.status() != expected => {
                    Some(HttpClientError::UnexpectedStatus {
                        status: response.status().as_u16(),
                        expected: expected.as_u16(),
                    })
                }
                _ => None,
            };
        }

        let total_elapsed = started.elapsed();
        if let Some(error) = &error {
            warn!(
                method = %request.method(),
                uri = %request.uri(),
                attempts = logs.len(),
                error = %error,
                "Request failed"
            );
        }
        RequestResult::new(request, response, body, error, logs, total_elapsed)
    }

    fn attempt(&self, index: u32, request: &http::Request<Bytes>) -> (Attempt, TraceLog) {
        let started = Instant::now();
        let outcome = self.transport.execute(request);
        let elapsed = started.elapsed();

        match outcome {
            Ok(response) => {
                let (parts, mut reader) = response.into_parts();
                let mut body = Vec::new();
                let read = reader.read_to_end(&mut body);
                drop(reader);

                let error = read.err().map(|e| HttpClientError::from_body_read(&e));
                let log = TraceLog::new(index, elapsed, Some(parts.status), &body, error.clone());
                debug!(
                    attempt = index,
                    status = parts.status.as_u16(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    body_len = body.len(),
                    "Received response"
                );
                let attempt = Attempt {
                    response: Some(Response::from_parts(parts)),
                    body: Bytes::from(body),
                    error,
                };
                (attempt, log)
            }
            Err(error) => {
                debug!(
                    attempt = index,
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %error,
                    "Request attempt failed"
                );
                let log = TraceLog::new(index, elapsed, None, &[], Some(error.clone()));
                let attempt = Attempt {
                    response: None,
                    body: Bytes::new(),
                    error: Some(error),
                };
                (attempt, log)
            }
        }
    }
}
