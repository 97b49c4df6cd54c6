//! Request builder.

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use bytes::Bytes;
use http::header::{AUTHORIZATION, CONNECTION, CONTENT_TYPE, COOKIE};
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use serde::Serialize;

use crate::body::{self, ContentKind, MultipartFile, Payload};
use crate::{
    Dispatcher, HttpClientError, RequestResult, Result, RetryPolicy, RetryStrategy, Transport,
};

/// A cookie sent with the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    /// Cookie name.
    pub name: String,
    /// Cookie value.
    pub value: String,
}

impl Cookie {
    /// Create a cookie.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Chainable builder for a single logical request.
///
/// Setters never fail. Malformed input (a bad header, method or status) is
/// remembered and reported by the terminal `send*` call, which then makes
/// no attempt. A builder is consumed by its `send*` call.
pub struct RequestBuilder<'a> {
    transport: &'a dyn Transport,
    base_url: Option<&'a url::Url>,
    method: Option<Method>,
    url: Option<String>,
    headers: HeaderMap,
    query: Vec<(String, String)>,
    cookies: Vec<Cookie>,
    basic_auth: Option<(String, String)>,
    keep_alive: bool,
    expected_status: Option<StatusCode>,
    retry: Option<Arc<dyn RetryStrategy>>,
    error: Option<HttpClientError>,
}

impl<'a> RequestBuilder<'a> {
    /// Create an empty builder that will send through `transport`.
    pub fn new(transport: &'a dyn Transport) -> Self {
        Self {
            transport,
            base_url: None,
            method: None,
            url: None,
            headers: HeaderMap::new(),
            query: Vec::new(),
            cookies: Vec::new(),
            basic_auth: None,
            keep_alive: true,
            expected_status: None,
            retry: None,
            error: None,
        }
    }

    /// Join relative URLs onto `base`.
    pub fn base_url(mut self, base: &'a url::Url) -> Self {
        self.base_url = Some(base);
        self
    }

    fn target(mut self, method: Method, url: impl Into<String>) -> Self {
        self.method = Some(method);
        self.url = Some(url.into());
        self
    }

    fn fail(&mut self, error: HttpClientError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// Target `url` with GET.
    pub fn get(self, url: impl Into<String>) -> Self {
        self.target(Method::GET, url)
    }

    /// Target `url` with POST.
    pub fn post(self, url: impl Into<String>) -> Self {
        self.target(Method::POST, url)
    }

    /// Target `url` with HEAD.
    pub fn head(self, url: impl Into<String>) -> Self {
        self.target(Method::HEAD, url)
    }

    /// Target `url` with PUT.
    pub fn put(self, url: impl Into<String>) -> Self {
        self.target(Method::PUT, url)
    }

    /// Target `url` with DELETE.
    pub fn delete(self, url: impl Into<String>) -> Self {
        self.target(Method::DELETE, url)
    }

    /// Target `url` with PATCH.
    pub fn patch(self, url: impl Into<String>) -> Self {
        self.target(Method::PATCH, url)
    }

    /// Target `url` with OPTIONS.
    pub fn options(self, url: impl Into<String>) -> Self {
        self.target(Method::OPTIONS, url)
    }

    /// Target `url` with a method given by name.
    ///
    /// Standard names map to the standard methods; any other valid token
    /// is sent as an extension method.
    pub fn custom_method(mut self, method: &str, url: impl Into<String>) -> Self {
        match Method::from_bytes(method.as_bytes()) {
            Ok(method) => self.target(method, url),
            Err(_) => {
                self.fail(HttpClientError::InvalidMethod(method.to_string()));
                self.url = Some(url.into());
                self
            }
        }
    }

    /// Keep the connection open after the request (the default).
    pub fn enable_keep_alive(self) -> Self {
        self.keep_alive(true)
    }

    /// Ask the server to close the connection after the request.
    pub fn disable_keep_alive(self) -> Self {
        self.keep_alive(false)
    }

    /// Set whether the connection should be kept open.
    pub fn keep_alive(mut self, enable: bool) -> Self {
        self.keep_alive = enable;
        self
    }

    fn parse_header(&mut self, name: &str, value: &str) -> Option<(HeaderName, HeaderValue)> {
        let parsed = HeaderName::try_from(name)
            .map_err(|e| e.to_string())
            .and_then(|n| {
                HeaderValue::try_from(value)
                    .map(|v| (n, v))
                    .map_err(|e| e.to_string())
            });
        match parsed {
            Ok(pair) => Some(pair),
            Err(e) => {
                self.fail(HttpClientError::InvalidHeader(format!("{name}: {e}")));
                None
            }
        }
    }

    /// Set a header, replacing any values already set for that name.
    pub fn set_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        if let Some((name, value)) = self.parse_header(name.as_ref(), value.as_ref()) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Add a header value, keeping values already set for that name.
    pub fn add_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        if let Some((name, value)) = self.parse_header(name.as_ref(), value.as_ref()) {
            self.headers.append(name, value);
        }
        self
    }

    /// Set the `Content-Type` header from the content-type registry.
    pub fn content_kind(mut self, kind: ContentKind) -> Self {
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static(kind.mime()));
        self
    }

    /// Set basic authentication.
    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.basic_auth = Some((username.into(), password.into()));
        self
    }

    /// Add a cookie.
    pub fn cookie(mut self, cookie: Cookie) -> Self {
        self.cookies.push(cookie);
        self
    }

    /// Add several cookies.
    pub fn cookies(mut self, cookies: impl IntoIterator<Item = Cookie>) -> Self {
        self.cookies.extend(cookies);
        self
    }

    /// Add a query parameter value, keeping values already set for that key.
    pub fn add_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Set a query parameter, replacing any values already set for that key.
    pub fn set_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        self.query.retain(|(k, _)| *k != key);
        self.query.push((key, value.into()));
        self
    }

    /// Set several query parameters, each replacing earlier values for its key.
    pub fn set_query_map<I, K, V>(self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        params
            .into_iter()
            .fold(self, |builder, (k, v)| builder.set_query(k, v))
    }

    /// Retry according to `policy`.
    pub fn retry(self, policy: RetryPolicy) -> Self {
        self.retry_strategy(Arc::new(policy))
    }

    /// Retry according to a custom strategy.
    pub fn retry_strategy(mut self, strategy: Arc<dyn RetryStrategy>) -> Self {
        self.retry = Some(strategy);
        self
    }

    /// Retry with a constant interval on errors, on the given status codes,
    /// and on statuses in `status_begin..=status_end`.
    pub fn retry_with(
        self,
        max_retries: u32,
        interval: Duration,
        status_codes: impl IntoIterator<Item = u16>,
        status_begin: u16,
        status_end: u16,
    ) -> Self {
        self.retry(RetryPolicy::new(
            max_retries,
            interval,
            status_codes,
            status_begin,
            status_end,
        ))
    }

    /// Retry once after 50ms on errors and 500-504 responses.
    pub fn retry_default(self) -> Self {
        self.retry(RetryPolicy::standard())
    }

    /// Require the final response to carry `status`. Zero clears the check.
    pub fn expect_status(mut self, status: u16) -> Self {
        if status == 0 {
            self.expected_status = None;
            return self;
        }
        match StatusCode::from_u16(status) {
            Ok(status) => self.expected_status = Some(status),
            Err(_) => self.fail(HttpClientError::InvalidStatus(status)),
        }
        self
    }

    /// Send the request without a body.
    pub fn send(self) -> RequestResult {
        self.send_request(Bytes::new())
    }

    /// Send a text body as is.
    pub fn send_string(self, body: impl Into<String>) -> RequestResult {
        self.send_request(Bytes::from(body.into()))
    }

    /// Send a byte body as is.
    pub fn send_bytes(self, body: impl Into<Bytes>) -> RequestResult {
        self.send_request(body.into())
    }

    /// Send a JSON body.
    ///
    /// Text is sent verbatim as JSON text; objects, arrays and maps are
    /// serialized. Raw bytes and scalars are rejected without sending.
    pub fn send_json(self, payload: impl Into<Payload>) -> RequestResult {
        let payload = payload.into();
        self.send_encoded(ContentKind::Json, || body::encode_json(&payload))
    }

    /// Serialize `value` as the JSON body.
    pub fn send_json_as<T: Serialize + ?Sized>(self, value: &T) -> RequestResult {
        self.send_encoded(ContentKind::Json, || {
            serde_json::to_vec(value)
                .map(Bytes::from)
                .map_err(HttpClientError::from)
        })
    }

    /// Send an `application/x-www-form-urlencoded` body.
    ///
    /// Text is sent verbatim; maps are encoded; objects must have only
    /// string fields; raw bytes are decoded as a flat JSON object first.
    pub fn send_form(self, payload: impl Into<Payload>) -> RequestResult {
        let payload = payload.into();
        self.send_encoded(ContentKind::Form, || body::encode_form(&payload))
    }

    /// Encode the string fields of `value` as the form body.
    pub fn send_form_as<T: Serialize + ?Sized>(self, value: &T) -> RequestResult {
        self.send_encoded(ContentKind::Form, || {
            body::encode_form(&Payload::serialize(value)?)
        })
    }

    /// Upload one file as `multipart/form-data`.
    pub fn send_file(self, file: MultipartFile) -> RequestResult {
        self.send_files([file])
    }

    /// Upload files as `multipart/form-data`.
    ///
    /// A file that cannot be read aborts the request before any attempt.
    pub fn send_files(mut self, files: impl IntoIterator<Item = MultipartFile>) -> RequestResult {
        let files: Vec<MultipartFile> = files.into_iter().collect();
        match body::encode_multipart(&files) {
            Ok((body, content_type)) => {
                if let Some((name, value)) = self.parse_header(CONTENT_TYPE.as_str(), &content_type)
                {
                    self.headers.insert(name, value);
                }
                self.send_request(body)
            }
            Err(error) => RequestResult::failed(error),
        }
    }

    fn send_encoded(
        mut self,
        kind: ContentKind,
        encode: impl FnOnce() -> Result<Bytes>,
    ) -> RequestResult {
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static(kind.mime()));
        match encode() {
            Ok(body) => self.send_request(body),
            Err(error) => RequestResult::failed(error),
        }
    }

    fn send_request(mut self, body: Bytes) -> RequestResult {
        let request = match self.build_request(body) {
            Ok(request) => request,
            Err(error) => return RequestResult::failed(error),
        };
        Dispatcher::new(self.transport)
            .retry(self.retry.as_deref())
            .expect_status(self.expected_status)
            .dispatch(request)
    }

    fn build_request(&mut self, body: Bytes) -> Result<http::Request<Bytes>> {
        if let Some(error) = self.error.take() {
            return Err(error);
        }
        let (Some(method), Some(url)) = (self.method.clone(), self.url.as_deref()) else {
            return Err(HttpClientError::RequestBuild(
                "method and URL must be set before sending".to_string(),
            ));
        };

        let mut url = match (url::Url::parse(url), self.base_url) {
            (Err(url::ParseError::RelativeUrlWithoutBase), Some(base)) => base.join(url)?,
            (parsed, _) => parsed?,
        };
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(self.query.iter());
        }

        let mut headers = std::mem::take(&mut self.headers);
        if !self.keep_alive && !headers.contains_key(CONNECTION) {
            headers.insert(CONNECTION, HeaderValue::from_static("close"));
        }
        if let Some((username, password)) = &self.basic_auth {
            let credentials =
                base64::engine::general_purpose::STANDARD.encode(format!("{username}:{password}"));
            let value = HeaderValue::try_from(format!("Basic {credentials}"))
                .map_err(|e| HttpClientError::InvalidHeader(e.to_string()))?;
            headers.insert(AUTHORIZATION, value);
        }
        if !self.cookies.is_empty() {
            let rendered = self
                .cookies
                .iter()
                .map(|c| format!("{}={}", c.name, c.value))
                .collect::<Vec<_>>()
                .join("; ");
            let value = match headers.get(COOKIE).and_then(|v| v.to_str().ok()) {
                Some(existing) if !existing.is_empty() => format!("{existing}; {rendered}"),
                _ => rendered,
            };
            let value = HeaderValue::try_from(value)
                .map_err(|e| HttpClientError::InvalidHeader(format!("cookie: {e}")))?;
            headers.insert(COOKIE, value);
        }

        let mut request = http::Request::builder()
            .method(method)
            .uri(url.as_str())
            .body(body)
            .map_err(|e| HttpClientError::RequestBuild(e.to_string()))?;
        *request.headers_mut() = headers;
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TransportBody;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::collections::{BTreeMap, HashMap};

    /// Records every request and answers 200 with a fixed body.
    #[derive(Default)]
    struct RecordingTransport {
        requests: Mutex<Vec<http::Request<Bytes>>>,
    }

    impl RecordingTransport {
        fn calls(&self) -> usize {
            self.requests.lock().len()
        }

        fn last(&self) -> http::Request<Bytes> {
            self.requests.lock().last().cloned().unwrap()
        }
    }

    impl Transport for RecordingTransport {
        fn execute(&self, request: &http::Request<Bytes>) -> Result<http::Response<TransportBody>> {
            self.requests.lock().push(request.clone());
            let body: TransportBody = Box::new(std::io::Cursor::new(br#"{"ok":true}"#.to_vec()));
            Ok(http::Response::new(body))
        }
    }

    #[derive(Serialize)]
    #[allow(non_snake_case)]
    struct Req {
        Name: String,
        Age: u32,
    }

    fn build(builder: RequestBuilder<'_>) -> Result<http::Request<Bytes>> {
        let mut builder = builder;
        builder.build_request(Bytes::new())
    }

    #[test]
    fn test_query_add_and_set() {
        let transport = RecordingTransport::default();
        let request = build(
            RequestBuilder::new(&transport)
                .get("http://localhost/search?page=1")
                .add_query("tag", "a")
                .add_query("tag", "b")
                .add_query("q", "old")
                .set_query("q", "new value"),
        )
        .unwrap();

        assert_eq!(
            request.uri().to_string(),
            "http://localhost/search?page=1&tag=a&tag=b&q=new+value"
        );
    }

    #[test]
    fn test_relative_url_joined_onto_base() {
        let transport = RecordingTransport::default();
        let base = url::Url::parse("http://api.local/v1/").unwrap();
        let request = build(
            RequestBuilder::new(&transport)
                .base_url(&base)
                .get("users/7")
                .add_query("full", "1"),
        )
        .unwrap();
        assert_eq!(
            request.uri().to_string(),
            "http://api.local/v1/users/7?full=1"
        );

        let request = build(
            RequestBuilder::new(&transport)
                .base_url(&base)
                .get("http://other.local/x"),
        )
        .unwrap();
        assert_eq!(request.uri().to_string(), "http://other.local/x");
    }

    #[test]
    fn test_set_query_map() {
        let transport = RecordingTransport::default();
        let mut params = BTreeMap::new();
        params.insert("q1", "v1");
        params.insert("q2", "v2");
        let request = build(
            RequestBuilder::new(&transport)
                .get("http://localhost/")
                .add_query("q1", "stale")
                .set_query_map(params),
        )
        .unwrap();

        assert_eq!(request.uri().query(), Some("q1=v1&q2=v2"));
    }

    #[test]
    fn test_headers_case_insensitive_multimap() {
        let transport = RecordingTransport::default();
        let request = build(
            RequestBuilder::new(&transport)
                .get("http://localhost/")
                .set_header("TestHeader", "header")
                .add_header("testheader", "header2"),
        )
        .unwrap();

        let values: Vec<_> = request.headers().get_all("TESTHEADER").iter().collect();
        assert_eq!(values, vec!["header", "header2"]);
    }

    #[test]
    fn test_set_header_replaces() {
        let transport = RecordingTransport::default();
        let request = build(
            RequestBuilder::new(&transport)
                .get("http://localhost/")
                .add_header("X-Trace", "1")
                .add_header("X-Trace", "2")
                .set_header("x-trace", "3"),
        )
        .unwrap();

        let values: Vec<_> = request.headers().get_all("x-trace").iter().collect();
        assert_eq!(values, vec!["3"]);
    }

    #[test]
    fn test_keep_alive_flag() {
        let transport = RecordingTransport::default();
        let request = build(RequestBuilder::new(&transport).get("http://localhost/")).unwrap();
        assert!(request.headers().get(CONNECTION).is_none());

        let request = build(
            RequestBuilder::new(&transport)
                .get("http://localhost/")
                .disable_keep_alive(),
        )
        .unwrap();
        assert_eq!(request.headers()[CONNECTION], "close");

        let request = build(
            RequestBuilder::new(&transport)
                .get("http://localhost/")
                .set_header("Connection", "upgrade")
                .disable_keep_alive(),
        )
        .unwrap();
        assert_eq!(request.headers()[CONNECTION], "upgrade");
    }

    #[test]
    fn test_basic_auth_presence() {
        let transport = RecordingTransport::default();
        let request = build(RequestBuilder::new(&transport).get("http://localhost/")).unwrap();
        assert!(request.headers().get(AUTHORIZATION).is_none());

        // Empty credentials are still sent when explicitly requested.
        let request = build(
            RequestBuilder::new(&transport)
                .get("http://localhost/")
                .basic_auth("", ""),
        )
        .unwrap();
        assert_eq!(request.headers()[AUTHORIZATION], "Basic Og==");

        let request = build(
            RequestBuilder::new(&transport)
                .get("http://localhost/")
                .basic_auth("user", "pass"),
        )
        .unwrap();
        assert_eq!(request.headers()[AUTHORIZATION], "Basic dXNlcjpwYXNz");
    }

    #[test]
    fn test_cookies_rendered() {
        let transport = RecordingTransport::default();
        let request = build(
            RequestBuilder::new(&transport)
                .get("http://localhost/")
                .set_header("Cookie", "theme=dark")
                .cookie(Cookie::new("session", "abc"))
                .cookies([Cookie::new("lang", "en")]),
        )
        .unwrap();

        assert_eq!(
            request.headers()[COOKIE],
            "theme=dark; session=abc; lang=en"
        );
    }

    #[test]
    fn test_custom_method() {
        let transport = RecordingTransport::default();
        let request =
            build(RequestBuilder::new(&transport).custom_method("PURGE", "http://localhost/cache"))
                .unwrap();
        assert_eq!(request.method().as_str(), "PURGE");

        let request =
            build(RequestBuilder::new(&transport).custom_method("PUT", "http://localhost/"))
                .unwrap();
        assert_eq!(request.method(), Method::PUT);

        let err = build(RequestBuilder::new(&transport).custom_method("BAD METHOD", "http://x/"))
            .unwrap_err();
        assert!(matches!(err, HttpClientError::InvalidMethod(_)));
    }

    #[test]
    fn test_missing_target() {
        let transport = RecordingTransport::default();
        let result = RequestBuilder::new(&transport).send();
        assert!(matches!(
            result.error(),
            Some(HttpClientError::RequestBuild(_))
        ));
        assert_eq!(transport.calls(), 0);
    }

    #[test]
    fn test_invalid_url() {
        let transport = RecordingTransport::default();
        let result = RequestBuilder::new(&transport).get("not a url").send();
        assert!(matches!(
            result.error(),
            Some(HttpClientError::InvalidUrl(_))
        ));
        assert_eq!(result.attempts(), 0);
    }

    #[test]
    fn test_invalid_header_deferred() {
        let transport = RecordingTransport::default();
        let result = RequestBuilder::new(&transport)
            .get("http://localhost/")
            .set_header("bad header", "v")
            .send();
        assert!(matches!(
            result.error(),
            Some(HttpClientError::InvalidHeader(_))
        ));
        assert_eq!(transport.calls(), 0);
    }

    #[test]
    fn test_expect_status() {
        let transport = RecordingTransport::default();
        let result = RequestBuilder::new(&transport)
            .get("http://localhost/")
            .expect_status(201)
            .send();
        assert_eq!(
            result.error(),
            Some(&HttpClientError::UnexpectedStatus {
                status: 200,
                expected: 201
            })
        );

        let result = RequestBuilder::new(&transport)
            .get("http://localhost/")
            .expect_status(201)
            .expect_status(0)
            .send();
        assert!(result.is_success());

        let result = RequestBuilder::new(&transport)
            .get("http://localhost/")
            .expect_status(42)
            .send();
        assert_eq!(result.error(), Some(&HttpClientError::InvalidStatus(42)));
    }

    #[test]
    fn test_send_json_struct() {
        let transport = RecordingTransport::default();
        let result = RequestBuilder::new(&transport)
            .post("http://localhost/json")
            .send_json_as(&Req {
                Name: "test".to_string(),
                Age: 10,
            });

        assert!(result.is_success());
        let request = transport.last();
        assert_eq!(&request.body()[..], br#"{"Name":"test","Age":10}"#);
        assert_eq!(request.headers()[CONTENT_TYPE], "application/json");

        let decoded: HashMap<String, bool> = result.json().unwrap();
        assert_eq!(decoded["ok"], true);
    }

    #[test]
    fn test_send_json_raw_text() {
        let transport = RecordingTransport::default();
        RequestBuilder::new(&transport)
            .post("http://localhost/json")
            .send_json(r#"{"already":"json"}"#);
        assert_eq!(&transport.last().body()[..], br#"{"already":"json"}"#);

        RequestBuilder::new(&transport)
            .post("http://localhost/json")
            .send_json(json!([1, 2, 3]));
        assert_eq!(&transport.last().body()[..], b"[1,2,3]");
    }

    #[test]
    fn test_send_json_unsupported_makes_no_attempt() {
        let transport = RecordingTransport::default();
        let result = RequestBuilder::new(&transport)
            .post("http://localhost/json")
            .send_json(vec![1u8, 2, 3]);

        assert!(result.error().unwrap().is_encoding());
        assert_eq!(result.attempts(), 0);
        assert_eq!(transport.calls(), 0);
    }

    #[test]
    fn test_send_form_map() {
        let transport = RecordingTransport::default();
        let mut form = HashMap::new();
        form.insert("fa", "test");
        form.insert("fb", "test");
        let result = RequestBuilder::new(&transport)
            .post("http://localhost/form")
            .send_form(form);

        assert!(result.is_success());
        let request = transport.last();
        assert_eq!(
            request.headers()[CONTENT_TYPE],
            "application/x-www-form-urlencoded"
        );
        let decoded: HashMap<String, String> =
            serde_urlencoded::from_bytes(request.body()).unwrap();
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded["fa"], "test");
        assert_eq!(decoded["fb"], "test");
    }

    #[test]
    fn test_send_form_struct_with_non_string_field() {
        let transport = RecordingTransport::default();
        let result = RequestBuilder::new(&transport)
            .post("http://localhost/form")
            .send_form_as(&Req {
                Name: "test".to_string(),
                Age: 10,
            });

        assert!(matches!(result.error(), Some(HttpClientError::Form(_))));
        assert_eq!(transport.calls(), 0);
    }

    #[test]
    fn test_send_files() {
        let transport = RecordingTransport::default();
        let result = RequestBuilder::new(&transport)
            .post("http://localhost/upload")
            .send_file(MultipartFile::from_bytes("test_field", "test.txt", "hello"));

        assert!(result.is_success());
        let request = transport.last();
        let content_type = request.headers()[CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.starts_with("multipart/form-data; boundary="));
        let body = std::str::from_utf8(request.body()).unwrap();
        assert!(body.contains("name=\"test_field\"; filename=\"test.txt\""));
        assert!(body.contains("\r\n\r\nhello\r\n"));
    }

    #[test]
    fn test_send_files_read_failure() {
        let transport = RecordingTransport::default();
        let result = RequestBuilder::new(&transport)
            .post("http://localhost/upload")
            .send_files([
                MultipartFile::from_bytes("a", "a.txt", "ok"),
                MultipartFile::from_path("b", "b.txt", "/no/such/dir/b.txt"),
            ]);

        assert!(matches!(
            result.error(),
            Some(HttpClientError::FileRead { .. })
        ));
        assert_eq!(result.attempts(), 0);
        assert_eq!(transport.calls(), 0);
    }

    #[test]
    fn test_content_kind_for_raw_send() {
        let transport = RecordingTransport::default();
        RequestBuilder::new(&transport)
            .post("http://localhost/xml")
            .content_kind(ContentKind::Xml)
            .send_string("<a/>");

        let request = transport.last();
        assert_eq!(request.headers()[CONTENT_TYPE], "application/xml");
        assert_eq!(&request.body()[..], b"<a/>");
    }
}
