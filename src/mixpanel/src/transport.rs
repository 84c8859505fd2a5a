use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::CONTENT_LENGTH;
use serde_json::Value;

use crate::error::Result;
use crate::plan::RequestStep;
use crate::settings::Settings;
use crate::value::Props;

pub const DEFAULT_BASE_URL: &str = "https://api.mixpanel.com";

/// The outbound HTTP seam. Retries, pooling and timeouts live behind
/// the implementation; this crate only issues calls.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST with an empty body; the payload travels in the query
    /// string. Returns the pre-parsed JSON response body.
    async fn post(&self, path: &str, query: &[(String, String)]) -> Result<Value>;
}

pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_base_url(client, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        HttpTransport {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, path: &str, query: &[(String, String)]) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(url)
            .query(query)
            // Mixpanel rejects POSTs without an explicit length
            .header(CONTENT_LENGTH, 0)
            .send()
            .await?;
        Ok(response.json().await?)
    }
}

/// base64(JSON(payload)), the only shape the destination accepts.
pub fn encode_data(payload: &Props) -> Result<String> {
    Ok(STANDARD.encode(serde_json::to_vec(payload)?))
}

/// Query string for one planned step: the encoded payload, the fixed
/// `ip=0`/`verbose=1` pair, and the access key where the plan asks for
/// it.
pub fn step_query(step: &RequestStep, settings: &Settings) -> Result<Vec<(String, String)>> {
    let mut query = vec![
        ("data".to_string(), encode_data(&step.payload)?),
        ("ip".to_string(), "0".to_string()),
        ("verbose".to_string(), "1".to_string()),
    ];
    if step.with_api_key {
        if let Some(key) = &settings.api_key {
            query.push(("api_key".to_string(), key.clone()));
        }
    }
    Ok(query)
}
