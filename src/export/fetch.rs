//! Resolving an encoded image reference into a typed blob.

use crate::export::ExportError;
use async_trait::async_trait;
use base64::Engine;

const DEFAULT_MIME: &str = "text/plain";

/// Binary payload tagged with a MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl Blob {
    pub fn new(mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime: mime.into(),
            bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// A fetched resource whose body has not been read yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub content_type: String,
    body: Vec<u8>,
}

impl FetchResponse {
    pub fn new(content_type: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            content_type: content_type.into(),
            body,
        }
    }

    /// Read the body as a blob typed with the response's content type.
    ///
    /// An empty body gives an empty blob; the clipboard write rejects it.
    pub async fn blob(self) -> Blob {
        Blob::new(self.content_type, self.body)
    }
}

/// Turns a resource reference into a response.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, uri: &str) -> Result<FetchResponse, ExportError>;
}

/// Fetches `data:` URIs, the only references the chart renderer produces.
#[derive(Debug, Default, Clone, Copy)]
pub struct DataUriFetcher;

#[async_trait]
impl Fetcher for DataUriFetcher {
    async fn fetch(&self, uri: &str) -> Result<FetchResponse, ExportError> {
        parse_data_uri(uri)
    }
}

/// Build a base64 `data:` URI.
pub fn encode_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        mime,
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

/// Parse `data:[<mime>][;base64],<payload>`.
pub fn parse_data_uri(uri: &str) -> Result<FetchResponse, ExportError> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| ExportError::Fetch("Not a data: URL".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| ExportError::Fetch("Malformed data URL".to_string()))?;

    let mut is_base64 = false;
    let mut mime: Option<String> = None;
    for (idx, segment) in header.split(';').enumerate() {
        let seg = segment.trim();
        if seg.eq_ignore_ascii_case("base64") {
            is_base64 = true;
        } else if idx == 0 && seg.contains('/') {
            mime = Some(seg.to_ascii_lowercase());
        }
    }

    let body = if is_base64 {
        base64::engine::general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| ExportError::Fetch(format!("Invalid base64 data URL: {}", e)))?
    } else {
        urlencoding::decode_binary(payload.as_bytes()).into_owned()
    };

    Ok(FetchResponse::new(
        mime.unwrap_or_else(|| DEFAULT_MIME.to_string()),
        body,
    ))
}
