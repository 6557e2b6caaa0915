//! 上游翻译服务客户端

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// 上游调用错误
#[derive(Error, Debug, Clone)]
pub enum UpstreamError {
    #[error("translation API key is not configured")]
    MissingApiKey,

    #[error("upstream returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("upstream request failed: {0}")]
    Transport(String),

    #[error("upstream returned an unreadable body: {0}")]
    Decode(String),
}

impl UpstreamError {
    /// HTTP status reported by the upstream, if it answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            UpstreamError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// 翻译服务
///
/// Given texts and a target language, returns the provider's JSON response
/// body unchanged.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, texts: &[String], target: &str) -> Result<Value, UpstreamError>;
}

#[derive(Serialize)]
struct TranslateBody<'a> {
    q: &'a [String],
    target: &'a str,
}

/// Google Cloud Translation v2 (`POST <url>?key=<api key>`).
#[derive(Debug, Clone)]
pub struct GoogleTranslator {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
}

impl GoogleTranslator {
    pub fn new(api_url: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            api_url: api_url.into(),
            api_key,
        })
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(&self, texts: &[String], target: &str) -> Result<Value, UpstreamError> {
        let api_key = self.api_key.as_deref().ok_or(UpstreamError::MissingApiKey)?;

        // without_url: the query string carries the API key
        let response = self
            .client
            .post(&self.api_url)
            .query(&[("key", api_key)])
            .json(&TranslateBody { q: texts, target })
            .send()
            .await
            .map_err(|e| UpstreamError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| UpstreamError::Decode(e.without_url().to_string()))
    }
}
