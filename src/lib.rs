//! # Translate Gateway
//!
//! 位于第三方翻译服务前的网关：令牌鉴权、请求来源过滤、确定性缓存键，
//! 以及围绕上游调用的 cache-aside 缓存。
//!
//! ## 模块组织
//!
//! - `cache` - 缓存键生成与容错缓存（Redis / 进程内）
//! - `token` - 带过期时间的 HMAC 令牌
//! - `guard` - User-Agent 拦截
//! - `upstream` - 上游翻译服务客户端
//! - `pipeline` - 请求处理流水线
//! - `web` - HTTP 服务
//! - `env` - 环境变量配置
//! - `error` - 错误类型与 HTTP 映射

pub mod cache;
pub mod env;
pub mod error;
pub mod guard;
pub mod pipeline;
pub mod token;
pub mod upstream;
pub mod web;

pub use cache::{CacheBackend, CacheKey, CacheStore};
pub use error::{GatewayError, GatewayResult};
pub use guard::AccessGuard;
pub use pipeline::{RequestPipeline, TranslateQuery};
pub use token::{Token, TokenValidator};
pub use upstream::{GoogleTranslator, Translator};
