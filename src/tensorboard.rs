use std::time::Duration;

use serde_json::{Map, Value};
use thiserror::Error;

/// Data types TensorBoard serves per tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesKind {
    Scalars,
    Histograms,
}

impl SeriesKind {
    fn path(self) -> &'static str {
        match self {
            Self::Scalars => "scalars",
            Self::Histograms => "histograms",
        }
    }
}

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("TensorBoard request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected answer from TensorBoard: {0}")]
    UnexpectedBody(String),
}

/// HTTP client for the TensorBoard instance reading our log directory.
///
/// `reqwest::Client` is cheaply cloneable; every clone shares one
/// connection pool. Each call is bounded by the configured timeout.
#[derive(Clone)]
pub struct TensorBoard {
    base_url: String,
    http: reqwest::Client,
}

impl TensorBoard {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ProxyError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /data/runs`: run name → per-type tag metadata.
    pub async fn runs(&self) -> Result<Map<String, Value>, ProxyError> {
        let body = self.get("runs", None).await?;
        match serde_json::from_str(&body) {
            Ok(Value::Object(runs)) => Ok(runs),
            _ => Err(ProxyError::UnexpectedBody(body)),
        }
    }

    /// `GET /data/{kind}?run=..&tag=..`, body passed through untouched.
    pub async fn series(&self, kind: SeriesKind, run: &str, tag: &str) -> Result<String, ProxyError> {
        self.get(kind.path(), Some((run, tag))).await
    }

    async fn get(&self, path: &str, run_tag: Option<(&str, &str)>) -> Result<String, ProxyError> {
        let url = format!("{}/data/{}", self.base_url, path);
        let mut request = self.http.get(&url);
        if let Some((run, tag)) = run_tag {
            request = request.query(&[("run", run), ("tag", tag)]);
        }

        let response = request.send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}
