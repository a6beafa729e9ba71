use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::error::RemoteError;
use crate::request::{Body, HttpRequest};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }

    /// Best-effort human-readable body, for error reporting.
    pub fn text_lossy(&self) -> String {
        String::from_utf8_lossy(&self.body).trim().to_string()
    }
}

/// Execute a request value with a bounded timeout.
///
/// Without the explicit timeout a broken endpoint hangs the whole exchange;
/// the caller's in-flight gate would then never clear.
pub async fn execute(req: &HttpRequest, timeout: Duration) -> Result<HttpResponse, RemoteError> {
    let client = reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(timeout)
        .build()?;

    let mut headers = HeaderMap::new();
    for (k, v) in &req.headers {
        let name = HeaderName::from_bytes(k.as_bytes())
            .map_err(|_| RemoteError::Transport(format!("invalid header name: {k}")))?;
        let value = HeaderValue::from_str(v)
            .map_err(|_| RemoteError::Transport(format!("invalid header value for {k}")))?;
        headers.insert(name, value);
    }

    let builder = match req.method.as_str() {
        "GET" => client.get(&req.url),
        "POST" => client.post(&req.url),
        other => return Err(RemoteError::Transport(format!("unsupported method: {other}"))),
    }
    .headers(headers);

    let builder = match &req.body {
        Body::Empty => builder,
        Body::Json(s) => builder.body(s.clone()),
        Body::Bytes(b) => builder.body(b.clone()),
    };

    let resp = builder.send().await?;
    let status = resp.status().as_u16();
    let body = resp.bytes().await?.to_vec();

    Ok(HttpResponse { status, body })
}
