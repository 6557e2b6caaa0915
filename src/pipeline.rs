//! 翻译请求处理流水线
//!
//! decode → access check → parameter validation → token validation →
//! cache lookup → upstream call on miss → cache store → response.
//! Each step returns a `Result`; the first failure ends the request.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::cache::{CacheKey, CacheStore};
use crate::error::{GatewayError, GatewayResult};
use crate::guard::AccessGuard;
use crate::token::{now_unix, TokenValidator};
use crate::upstream::Translator;

/// 单次请求最多翻译的文本数
pub const MAX_TEXTS: usize = 50;

/// Query string of `GET /translate`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TranslateQuery {
    /// lz-string `compressToEncodedURIComponent` of a JSON array of strings
    pub q: Option<String>,
    pub target: Option<String>,
    pub token: Option<String>,
}

/// Decoded but not yet validated request.
#[derive(Debug, Clone)]
pub struct RawRequest {
    pub texts: Value,
    pub target: Option<String>,
    pub token: Option<String>,
}

/// 已验证的翻译请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    pub texts: Vec<String>,
    pub target: String,
    pub token: Option<String>,
}

/// 解压并解析 `q` 参数
pub fn decode_texts(q: &str) -> GatewayResult<Value> {
    let wide = lz_str::decompress_from_encoded_uri_component(q)
        .ok_or_else(|| GatewayError::param("q is not a valid compressed payload"))?;
    let json = String::from_utf16(&wide).map_err(|e| GatewayError::param(format!("q is not valid text: {}", e)))?;
    serde_json::from_str(&json).map_err(|e| GatewayError::param(format!("q is not valid JSON: {}", e)))
}

/// Inverse of [`decode_texts`], for clients and tests.
pub fn encode_texts<S: AsRef<str>>(texts: &[S]) -> String {
    let list: Vec<&str> = texts.iter().map(AsRef::as_ref).collect();
    let json = Value::from(list).to_string();
    lz_str::compress_to_encoded_uri_component(json.as_str())
}

impl RawRequest {
    pub fn decode(query: TranslateQuery) -> GatewayResult<Self> {
        let texts = match query.q.as_deref() {
            Some(q) if !q.is_empty() => decode_texts(q)?,
            _ => Value::Null,
        };

        Ok(Self {
            texts,
            target: query.target,
            token: query.token,
        })
    }

    /// 参数验证
    ///
    /// `texts` must be a JSON array of 1 to [`MAX_TEXTS`] entries and the
    /// target a non-empty string. Non-string entries are converted to their
    /// string form.
    pub fn validate(self) -> GatewayResult<TranslationRequest> {
        let target = match self.target {
            Some(target) if !target.is_empty() => target,
            _ => return Err(GatewayError::param("translation parameters required (q=array&target=language)")),
        };

        let items = match self.texts {
            Value::Array(items) => items,
            _ => return Err(GatewayError::param("translation parameters required (q=array&target=language)")),
        };

        if items.is_empty() {
            return Err(GatewayError::param("q must contain at least one text"));
        }
        if items.len() > MAX_TEXTS {
            return Err(GatewayError::param(format!(
                "too many texts: {} (at most {} per request)",
                items.len(),
                MAX_TEXTS
            )));
        }

        Ok(TranslationRequest {
            texts: items.into_iter().map(text_form).collect(),
            target,
            token: self.token,
        })
    }
}

fn text_form(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// 流水线输出
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineResponse {
    pub body: Value,
    pub cache_hit: bool,
}

/// 请求处理流水线
#[derive(Clone)]
pub struct RequestPipeline {
    guard: AccessGuard,
    tokens: TokenValidator,
    cache: Option<CacheStore>,
    translator: Arc<dyn Translator>,
}

impl RequestPipeline {
    /// Pipeline with the default access guard and no cache.
    pub fn new(tokens: TokenValidator, translator: Arc<dyn Translator>) -> Self {
        Self {
            guard: AccessGuard::default(),
            tokens,
            cache: None,
            translator,
        }
    }

    pub fn with_cache(mut self, cache: Option<CacheStore>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_guard(mut self, guard: AccessGuard) -> Self {
        self.guard = guard;
        self
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache.is_some()
    }

    pub async fn handle(&self, query: TranslateQuery, user_agent: Option<&str>) -> GatewayResult<PipelineResponse> {
        self.handle_at(query, user_agent, now_unix()).await
    }

    /// 处理翻译请求，`now` 为当前 Unix 时间（秒）
    pub async fn handle_at(
        &self,
        query: TranslateQuery,
        user_agent: Option<&str>,
        now: u64,
    ) -> GatewayResult<PipelineResponse> {
        let raw = RawRequest::decode(query)?;

        if let Err(denied) = self.guard.check(user_agent) {
            tracing::warn!(user_agent = user_agent.unwrap_or_default(), "blocked request: {}", denied);
            return Err(denied.into());
        }

        let request = raw.validate()?;

        let grant = self.tokens.validate(request.token.as_deref(), now)?;
        tracing::debug!(?grant, texts = request.texts.len(), lang = %request.target, "request authorized");

        let key = CacheKey::derive(&request.texts, &request.target);

        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get(key.as_str()).await {
                match serde_json::from_str::<Value>(&cached) {
                    Ok(body) => {
                        tracing::info!(%key, "缓存命中");
                        return Ok(PipelineResponse { body, cache_hit: true });
                    }
                    Err(e) => tracing::warn!(%key, "ignoring unreadable cache entry: {}", e),
                }
            }
        }

        let body = self
            .translator
            .translate(&request.texts, &request.target)
            .await
            .map_err(|e| {
                tracing::error!(target_lang = %request.target, "翻译失败: {}", e);
                GatewayError::from(e)
            })?;

        if let Some(cache) = &self.cache {
            if !cache.set(key.as_str(), &body.to_string(), None).await {
                tracing::debug!(%key, "response not cached");
            }
        }

        Ok(PipelineResponse { body, cache_hit: false })
    }
}
