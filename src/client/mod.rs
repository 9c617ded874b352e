//! Async client for the relay.
//!
//! ```no_run
//! use tensorboard_relay::client::{ScalarEvent, TbClient};
//!
//! #[tokio::main]
//! async fn main() -> tensorboard_relay::client::Result<()> {
//!     let client = TbClient::connect("localhost", 8889).await?;
//!     client
//!         .add_scalar("baseline", "loss", ScalarEvent::new(1_700_000_000.0, 1, 0.42))
//!         .await?;
//!     println!("{}", client.get_scalars("baseline", "loss").await?);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod payload;

pub use error::{ClientError, Result};
pub use payload::{check_histogram_data, HistogramEvent, HistogramPayload, ScalarEvent};

use serde_json::Value;
use std::time::Duration;

/// Client for one relay instance.
pub struct TbClient {
    /// Relay base URL
    base_url: String,
    /// HTTP client
    http: reqwest::Client,
}

impl TbClient {
    /// Resolves the relay URL and checks the relay is working, not only up:
    /// `GET /data` has to reach TensorBoard through it.
    pub async fn connect(hostname: &str, port: u16) -> Result<Self> {
        let mut base_url = format!("{}:{}", hostname.trim_end_matches('/'), port);
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            base_url = format!("http://{base_url}");
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        let resp = http
            .get(format!("{base_url}/data"))
            .send()
            .await
            .map_err(|_| ClientError::ServerDown(base_url.clone()))?;

        if !resp.status().is_success() {
            return Err(ClientError::Backend {
                status: resp.status().as_u16(),
                message: resp.text().await.unwrap_or_default(),
            });
        }

        Ok(Self { base_url, http })
    }

    /// Get the relay URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Names of all experiments; empty if the relay answers with an error.
    pub async fn experiments(&self) -> Result<Vec<String>> {
        let resp = self.http.get(self.url("/data")).send().await?;
        if !resp.status().is_success() {
            return Ok(Vec::new());
        }
        Ok(resp.json().await?)
    }

    /// Supported data types and tags of one experiment.
    pub async fn experiment(&self, xp: &str) -> Result<Value> {
        let resp = self
            .http
            .get(self.url("/data"))
            .query(&[("xp", xp)])
            .send()
            .await?;
        Self::json(resp).await
    }

    pub async fn add_scalar(&self, xp: &str, name: &str, event: ScalarEvent) -> Result<()> {
        event.validate()?;
        self.post("/data/scalars", &[("xp", xp), ("name", name)], event.to_json())
            .await
    }

    pub async fn get_scalars(&self, xp: &str, name: &str) -> Result<Value> {
        self.get_series("/data/scalars", xp, name).await
    }

    /// Sample payloads are posted with `tobuild=true`, built ones with
    /// `tobuild=false` after their key set has been checked. Non-finite
    /// numbers are refused before anything is sent.
    pub async fn add_histogram(&self, xp: &str, name: &str, event: &HistogramEvent) -> Result<()> {
        if !check_histogram_data(&event.payload) {
            return Err(ClientError::InvalidArgument(
                "Data was not provided in a valid format!".into(),
            ));
        }
        event.validate()?;
        let tobuild = if event.tobuild() { "true" } else { "false" };
        self.post(
            "/data/histograms",
            &[("xp", xp), ("name", name), ("tobuild", tobuild)],
            event.to_json(),
        )
        .await
    }

    pub async fn get_histograms(&self, xp: &str, name: &str) -> Result<Value> {
        self.get_series("/data/histograms", xp, name).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_series(&self, path: &str, xp: &str, name: &str) -> Result<Value> {
        let resp = self
            .http
            .get(self.url(path))
            .query(&[("xp", xp), ("name", name)])
            .send()
            .await?;
        Self::json(resp).await
    }

    /// The relay reads the tuple from the key of a single form field.
    async fn post(&self, path: &str, query: &[(&str, &str)], tuple: Value) -> Result<()> {
        let body = serde_json::to_string(&tuple)?;
        let resp = self
            .http
            .post(self.url(path))
            .query(query)
            .form(&[(body.as_str(), "")])
            .send()
            .await?;
        Self::check(resp).await.map(|_| ())
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response> {
        if !resp.status().is_success() {
            return Err(ClientError::Server {
                status: resp.status().as_u16(),
                message: resp.text().await.unwrap_or_default(),
            });
        }
        Ok(resp)
    }

    async fn json(resp: reqwest::Response) -> Result<Value> {
        let text = Self::check(resp).await?.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}
