//! Transport boundary.

use std::io::Read;
use std::sync::Arc;

use bytes::Bytes;

use crate::Result;

/// Response body handed back by a transport.
///
/// The dispatcher reads it to the end and drops it after every attempt,
/// which releases the underlying connection.
pub type TransportBody = Box<dyn Read + Send>;

/// A blocking HTTP transport.
///
/// Implementations own connection pooling, TLS and proxy behavior and may
/// be shared by any number of concurrent requests.
pub trait Transport: Send + Sync {
    /// Execute one request and return the response head with an unread body.
    fn execute(&self, request: &http::Request<Bytes>) -> Result<http::Response<TransportBody>>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn execute(&self, request: &http::Request<Bytes>) -> Result<http::Response<TransportBody>> {
        (**self).execute(request)
    }
}
