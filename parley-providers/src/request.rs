use serde::{Deserialize, Serialize};

/// An outgoing request as an explicit value: built by a pure function,
/// inspectable in tests, executed by [`crate::runtime::execute`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Body,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Body {
    Empty,
    Json(String),
    Bytes(Vec<u8>),
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

impl std::fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redacted_headers: Vec<(String, String)> = self
            .headers
            .iter()
            .map(|(k, v)| {
                let sensitive = k.eq_ignore_ascii_case("authorization")
                    || k.to_ascii_lowercase().contains("api-key");
                let v = if sensitive { "[REDACTED]".into() } else { v.clone() };
                (k.clone(), v)
            })
            .collect();

        let body_summary = match &self.body {
            Body::Empty => "Empty".to_string(),
            Body::Json(s) => format!("Json(len={})", s.len()),
            Body::Bytes(b) => format!("Bytes(len={})", b.len()),
        };

        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &redacted_headers)
            .field("body", &body_summary)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_is_case_insensitive() {
        let req = HttpRequest {
            method: "POST".into(),
            url: "https://example.com".into(),
            headers: vec![("Content-Type".into(), "application/json".into())],
            body: Body::Empty,
        };
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(req.header("x-missing"), None);
    }

    #[test]
    fn debug_redacts_credentials() {
        let req = HttpRequest {
            method: "POST".into(),
            url: "https://example.com".into(),
            headers: vec![
                ("Authorization".into(), "Bearer sk-secret-1".into()),
                ("X-Api-Key".into(), "k-secret-2".into()),
                ("Accept".into(), "application/json".into()),
            ],
            body: Body::Bytes(vec![1, 2, 3]),
        };

        let shown = format!("{req:?}");
        assert!(!shown.contains("sk-secret-1"));
        assert!(!shown.contains("k-secret-2"));
        assert!(shown.contains("[REDACTED]"));
        assert!(shown.contains("application/json"));
        assert!(shown.contains("Bytes(len=3)"));
    }
}
