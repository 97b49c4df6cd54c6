//! Request body encoding.
//!
//! Typed sends hand a [`Payload`] to one of the encoders here and get back
//! the bytes to put on the wire. Encoding happens before dispatch, so a
//! failure never costs a network attempt.

use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::path::PathBuf;

use bytes::Bytes;
use reqwest::blocking::multipart::{Form, Part};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::{HttpClientError, Result};

/// Logical body kinds and their MIME types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    /// `application/json`
    Json,
    /// `application/xml`
    Xml,
    /// `application/x-www-form-urlencoded`
    Urlencoded,
    /// `application/x-www-form-urlencoded`
    Form,
    /// `application/x-www-form-urlencoded`
    FormData,
    /// `text/html`
    Html,
    /// `text/plain`
    Text,
    /// `multipart/form-data`
    Multipart,
}

impl ContentKind {
    /// MIME type sent in the `Content-Type` header.
    pub fn mime(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Xml => "application/xml",
            Self::Urlencoded | Self::Form | Self::FormData => "application/x-www-form-urlencoded",
            Self::Html => "text/html",
            Self::Text => "text/plain",
            Self::Multipart => "multipart/form-data",
        }
    }

    /// Short tag for this kind.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Xml => "xml",
            Self::Urlencoded => "urlencoded",
            Self::Form => "form",
            Self::FormData => "form-data",
            Self::Html => "html",
            Self::Text => "text",
            Self::Multipart => "multipart",
        }
    }

    /// Look a kind up by its tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let kind = match tag {
            "json" => Self::Json,
            "xml" => Self::Xml,
            "urlencoded" => Self::Urlencoded,
            "form" => Self::Form,
            "form-data" => Self::FormData,
            "html" => Self::Html,
            "text" => Self::Text,
            "multipart" => Self::Multipart,
            _ => return None,
        };
        Some(kind)
    }
}

/// Payload accepted by the typed send methods.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Text sent verbatim: raw JSON text, or an already URL-encoded form.
    Text(String),
    /// A structured value.
    Value(Value),
    /// A flat string-to-string mapping, in insertion order.
    Map(Vec<(String, String)>),
    /// Raw bytes. Form sends decode them as a flat JSON object.
    Bytes(Bytes),
}

impl Payload {
    /// Serialize any `Serialize` value into a structured payload.
    pub fn serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        Ok(Self::Value(serde_json::to_value(value)?))
    }

    fn shape(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Value(Value::Object(_)) => "object",
            Self::Value(Value::Array(_)) => "array",
            Self::Value(_) => "scalar",
            Self::Map(_) => "map",
            Self::Bytes(_) => "bytes",
        }
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Bytes> for Payload {
    fn from(bytes: Bytes) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(bytes))
    }
}

impl From<Vec<(String, String)>> for Payload {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self::Map(pairs)
    }
}

impl<K: Into<String>, V: Into<String>> From<HashMap<K, V>> for Payload {
    fn from(map: HashMap<K, V>) -> Self {
        Self::Map(map.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<K: Into<String>, V: Into<String>> From<BTreeMap<K, V>> for Payload {
    fn from(map: BTreeMap<K, V>) -> Self {
        Self::Map(map.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Encode a payload as a JSON body.
///
/// Text is trusted to already be JSON and is sent verbatim, as is a
/// structured string value. Other scalars are rejected.
pub fn encode_json(payload: &Payload) -> Result<Bytes> {
    match payload {
        Payload::Text(text) | Payload::Value(Value::String(text)) => {
            Ok(Bytes::copy_from_slice(text.as_bytes()))
        }
        Payload::Value(value @ (Value::Object(_) | Value::Array(_))) => {
            Ok(Bytes::from(serde_json::to_vec(value)?))
        }
        Payload::Map(pairs) => {
            let object: Map<String, Value> = pairs
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect();
            Ok(Bytes::from(serde_json::to_vec(&object)?))
        }
        Payload::Value(_) | Payload::Bytes(_) => Err(HttpClientError::UnsupportedPayload {
            encoding: "JSON",
            payload: payload.shape(),
        }),
    }
}

/// Encode a payload as an `application/x-www-form-urlencoded` body.
///
/// Text is trusted to already be URL-encoded and is sent verbatim.
pub fn encode_form(payload: &Payload) -> Result<Bytes> {
    let pairs = match payload {
        Payload::Text(text) => return Ok(Bytes::copy_from_slice(text.as_bytes())),
        Payload::Map(pairs) => pairs.clone(),
        Payload::Value(Value::Object(object)) => flatten_object(object)?,
        Payload::Bytes(raw) => {
            let object: Map<String, Value> = serde_json::from_slice(raw)?;
            flatten_object(&object)?
        }
        Payload::Value(_) => {
            return Err(HttpClientError::UnsupportedPayload {
                encoding: "form",
                payload: payload.shape(),
            });
        }
    };
    serde_urlencoded::to_string(&pairs)
        .map(Bytes::from)
        .map_err(|e| HttpClientError::Form(e.to_string()))
}

fn flatten_object(object: &Map<String, Value>) -> Result<Vec<(String, String)>> {
    object
        .iter()
        .map(|(key, value)| match value {
            Value::String(s) => Ok((key.clone(), s.clone())),
            other => Err(HttpClientError::Form(format!(
                "field `{key}` must be a string, got {other}"
            ))),
        })
        .collect()
}

/// Where the content of an uploaded file comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum FileSource {
    /// Content supplied by the caller.
    Bytes(Bytes),
    /// Content read from disk at encoding time.
    Path(PathBuf),
}

/// One file part of a multipart upload.
#[derive(Debug, Clone, PartialEq)]
pub struct MultipartFile {
    /// Form field name.
    pub field: String,
    /// File name reported to the server.
    pub file_name: String,
    /// File content.
    pub source: FileSource,
}

impl MultipartFile {
    /// A file read from `path` when the request is sent.
    pub fn from_path(
        field: impl Into<String>,
        file_name: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            field: field.into(),
            file_name: file_name.into(),
            source: FileSource::Path(path.into()),
        }
    }

    /// A file with in-memory content.
    pub fn from_bytes(
        field: impl Into<String>,
        file_name: impl Into<String>,
        content: impl Into<Bytes>,
    ) -> Self {
        Self {
            field: field.into(),
            file_name: file_name.into(),
            source: FileSource::Bytes(content.into()),
        }
    }

    fn content(&self) -> Result<Bytes> {
        match &self.source {
            FileSource::Bytes(bytes) => Ok(bytes.clone()),
            FileSource::Path(path) => {
                std::fs::read(path)
                    .map(Bytes::from)
                    .map_err(|e| HttpClientError::FileRead {
                        path: path.clone(),
                        message: e.to_string(),
                    })
            }
        }
    }
}

/// Encode files as a `multipart/form-data` body.
///
/// Parts are framed by reqwest's multipart writer and collected into one
/// buffer so the request can be replayed on retry. Returns the body and
/// the `Content-Type` value carrying the boundary.
pub fn encode_multipart(files: &[MultipartFile]) -> Result<(Bytes, String)> {
    let mut form = Form::new();
    for file in files {
        let part = Part::bytes(file.content()?.to_vec())
            .file_name(file.file_name.clone())
            .mime_str("application/octet-stream")
            .map_err(|e| HttpClientError::Multipart(e.to_string()))?;
        form = form.part(file.field.clone(), part);
    }

    let boundary = form.boundary().to_string();
    let content_type = format!("{}; boundary={boundary}", ContentKind::Multipart.mime());

    // An empty form has no parts to carry the closing delimiter.
    if files.is_empty() {
        return Ok((Bytes::from(format!("--{boundary}--\r\n")), content_type));
    }

    let mut body = Vec::new();
    form.into_reader()
        .read_to_end(&mut body)
        .map_err(|e| HttpClientError::Multipart(e.to_string()))?;
    Ok((Bytes::from(body), content_type))
}
