// 集成测试公共模块
//
// 提供测试辅助工具和共享功能

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use translate_gateway::cache::{CacheBackend, CacheError, CacheStore, MemoryBackend};
use translate_gateway::pipeline::{encode_texts, RequestPipeline, TranslateQuery};
use translate_gateway::token::{Token, TokenValidator};
use translate_gateway::upstream::{Translator, UpstreamError};

pub const SECRET: &str = "integration-secret";
pub const BROWSER_UA: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 Chrome/120.0";

/// Upstream double that answers like Google v2 and counts its calls.
#[derive(Default)]
pub struct CountingTranslator {
    calls: AtomicUsize,
}

impl CountingTranslator {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn expected_body(texts: &[&str], target: &str) -> Value {
        let translations: Vec<Value> = texts
            .iter()
            .map(|text| json!({ "translatedText": format!("[{}] {}", target, text) }))
            .collect();
        json!({ "data": { "translations": translations } })
    }
}

#[async_trait]
impl Translator for CountingTranslator {
    async fn translate(&self, texts: &[String], target: &str) -> Result<Value, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let texts: Vec<&str> = texts.iter().map(String::as_str).collect();
        Ok(Self::expected_body(&texts, target))
    }
}

/// Upstream double that always answers with an HTTP error.
pub struct FailingTranslator {
    pub status: u16,
}

#[async_trait]
impl Translator for FailingTranslator {
    async fn translate(&self, _texts: &[String], _target: &str) -> Result<Value, UpstreamError> {
        Err(UpstreamError::Status {
            status: self.status,
            body: r#"{"error":{"message":"quota exceeded"}}"#.to_string(),
        })
    }
}

/// Cache backend whose reads and/or writes fail, counting attempts.
#[derive(Default)]
pub struct FlakyBackend {
    pub fail_get: bool,
    pub fail_set: bool,
    pub inner: MemoryBackend,
    pub gets: AtomicUsize,
    pub sets: AtomicUsize,
}

impl FlakyBackend {
    pub fn failing(fail_get: bool, fail_set: bool) -> Self {
        Self {
            fail_get,
            fail_set,
            ..Self::default()
        }
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn sets(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CacheBackend for FlakyBackend {
    fn name(&self) -> &'static str {
        "flaky"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.fail_get {
            return Err(CacheError::Connection("connection reset by peer".to_string()));
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        if self.fail_set {
            return Err(CacheError::Command("OOM command not allowed".to_string()));
        }
        self.inner.set(key, value, ttl).await
    }
}

/// 测试环境：流水线及其替身
pub struct TestEnvironment {
    pub pipeline: RequestPipeline,
    pub translator: Arc<CountingTranslator>,
    pub backend: Option<Arc<FlakyBackend>>,
}

impl TestEnvironment {
    pub fn without_cache() -> Self {
        let translator = Arc::new(CountingTranslator::default());
        let pipeline = RequestPipeline::new(validator(), translator.clone());
        Self {
            pipeline,
            translator,
            backend: None,
        }
    }

    pub fn with_backend(backend: FlakyBackend) -> Self {
        let translator = Arc::new(CountingTranslator::default());
        let backend = Arc::new(backend);
        let store = CacheStore::new(backend.clone());
        let pipeline = RequestPipeline::new(validator(), translator.clone()).with_cache(Some(store));
        Self {
            pipeline,
            translator,
            backend: Some(backend),
        }
    }

    pub fn with_cache() -> Self {
        Self::with_backend(FlakyBackend::default())
    }

    pub fn backend(&self) -> &FlakyBackend {
        self.backend.as_deref().expect("environment has a cache backend")
    }
}

pub fn validator() -> TokenValidator {
    TokenValidator::new(Some(SECRET.to_string()))
}

pub fn signed_token(expiry: u64) -> String {
    Token::issue(SECRET, expiry).to_string()
}

pub fn query(texts: &[&str], target: &str, token: &str) -> TranslateQuery {
    TranslateQuery {
        q: Some(encode_texts(texts)),
        target: Some(target.to_string()),
        token: Some(token.to_string()),
    }
}

/// Percent-encoded `/translate?...` URI for HTTP-level tests.
pub fn translate_uri(texts: &[&str], target: &str, token: &str) -> String {
    // lz-string's URI alphabet is already query-safe except '+'
    let q = encode_texts(texts).replace('+', "%2B");
    format!("/translate?q={}&target={}&token={}", q, target, token)
}
