//! Web 模块的数据类型定义

use std::sync::Arc;

use crate::cache;
use crate::env::EnvConfig;
use crate::error::GatewayError;
use crate::pipeline::RequestPipeline;
use crate::token::TokenValidator;
use crate::upstream::GoogleTranslator;

/// 应用状态
#[derive(Clone)]
pub struct AppState {
    pub pipeline: RequestPipeline,
}

impl AppState {
    pub fn new(pipeline: RequestPipeline) -> Self {
        Self { pipeline }
    }

    /// Wire the pipeline from environment configuration: token validator,
    /// upstream client, and (if enabled and reachable) the cache store.
    pub async fn from_env_config(env: &EnvConfig) -> Result<Self, GatewayError> {
        let tokens = TokenValidator::new(env.server_secret.clone()).with_bypass(env.bypass_token.clone());

        let translator = GoogleTranslator::new(
            env.translation_api_url.clone(),
            env.translation_api_key.clone(),
            env.translation_timeout,
        )?;

        let cache = cache::store_from_config(env.cache_enabled, env.cache_backend, &env.redis_url, env.cache_ttl).await;

        let pipeline = RequestPipeline::new(tokens, Arc::new(translator)).with_cache(cache);
        Ok(Self::new(pipeline))
    }
}
