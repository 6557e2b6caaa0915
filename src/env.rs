//! 统一的环境变量管理系统
//!
//! 网关读取的全部环境变量：类型安全、可验证

use std::env;
use std::fmt;
use std::time::Duration;

/// 环境变量解析错误
#[derive(Debug, Clone)]
pub struct EnvError {
    pub variable: String,
    pub message: String,
}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Environment variable '{}': {}", self.variable, self.message)
    }
}

impl std::error::Error for EnvError {}

pub type EnvResult<T> = Result<T, EnvError>;

/// 环境变量访问器特性
pub trait EnvVar<T> {
    const NAME: &'static str;
    const DEFAULT: Option<T>;
    const DESCRIPTION: &'static str;

    fn parse(value: &str) -> EnvResult<T>;

    fn get() -> EnvResult<T> {
        match env::var(Self::NAME) {
            Ok(value) => Self::parse(&value),
            Err(_) => {
                if let Some(default) = Self::DEFAULT {
                    Ok(default)
                } else {
                    Err(EnvError {
                        variable: Self::NAME.to_string(),
                        message: "Required environment variable not set".to_string(),
                    })
                }
            }
        }
    }

    fn get_or_default(default: T) -> T {
        Self::get().unwrap_or(default)
    }
}

/// 核心环境变量定义
pub mod core {
    use super::*;

    /// 日志级别
    pub struct LogLevel;
    impl EnvVar<String> for LogLevel {
        const NAME: &'static str = "GATEWAY_LOG_LEVEL";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Log level used when RUST_LOG is unset: trace, debug, info, warn, error";

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("info".to_string()),
            }
        }

        fn parse(value: &str) -> EnvResult<String> {
            match value.to_lowercase().as_str() {
                "trace" | "debug" | "info" | "warn" | "error" => Ok(value.to_lowercase()),
                _ => Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!("Invalid log level '{}'. Use: trace, debug, info, warn, error", value),
                }),
            }
        }
    }
}

/// 翻译相关环境变量
pub mod translation {
    use super::*;

    /// 上游翻译服务 API 密钥
    pub struct ApiKey;
    impl EnvVar<String> for ApiKey {
        const NAME: &'static str = "TRANSLATION_KEY";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "API key passed to the upstream translation service";

        fn parse(value: &str) -> EnvResult<String> {
            non_empty(value, Self::NAME, "API key cannot be empty")
        }
    }

    /// API URL
    pub struct ApiUrl;
    impl EnvVar<String> for ApiUrl {
        const NAME: &'static str = "TRANSLATION_API_URL";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Upstream translation endpoint URL";

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok(DEFAULT_API_URL.to_string()),
            }
        }

        fn parse(value: &str) -> EnvResult<String> {
            let url = value.trim();
            if url.starts_with("http://") || url.starts_with("https://") {
                Ok(url.to_string())
            } else {
                Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "API URL must start with http:// or https://".to_string(),
                })
            }
        }
    }

    /// 上游请求超时
    pub struct Timeout;
    impl EnvVar<Duration> for Timeout {
        const NAME: &'static str = "TRANSLATION_TIMEOUT";
        const DEFAULT: Option<Duration> = Some(Duration::from_secs(30));
        const DESCRIPTION: &'static str = "Upstream request timeout in seconds";

        fn parse(value: &str) -> EnvResult<Duration> {
            let seconds = parse_u64_in_range(value, Self::NAME, 1, 300)?;
            Ok(Duration::from_secs(seconds))
        }
    }

    pub const DEFAULT_API_URL: &str = "https://translation.googleapis.com/language/translate/v2";
}

/// 缓存相关环境变量
pub mod cache {
    use super::*;

    /// 缓存启用状态
    pub struct Enabled;
    impl EnvVar<bool> for Enabled {
        const NAME: &'static str = "USE_CACHE";
        const DEFAULT: Option<bool> = Some(false);
        const DESCRIPTION: &'static str = "Enable the cache-aside layer around upstream calls";

        fn parse(value: &str) -> EnvResult<bool> {
            parse_bool(value, Self::NAME)
        }
    }

    /// 缓存后端类型
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum BackendKind {
        Redis,
        Memory,
    }

    pub struct Backend;
    impl EnvVar<BackendKind> for Backend {
        const NAME: &'static str = "CACHE_BACKEND";
        const DEFAULT: Option<BackendKind> = Some(BackendKind::Redis);
        const DESCRIPTION: &'static str = "Cache backend: redis or memory";

        fn parse(value: &str) -> EnvResult<BackendKind> {
            match value.trim().to_lowercase().as_str() {
                "redis" => Ok(BackendKind::Redis),
                "memory" | "mem" => Ok(BackendKind::Memory),
                _ => Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!("Invalid backend '{}'. Use: redis, memory", value),
                }),
            }
        }
    }

    /// Redis 连接地址
    pub struct RedisUrl;
    impl EnvVar<String> for RedisUrl {
        const NAME: &'static str = "REDIS_URL";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Redis connection URL";

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("redis://localhost:6379".to_string()),
            }
        }

        fn parse(value: &str) -> EnvResult<String> {
            let url = value.trim();
            if url.starts_with("redis://") || url.starts_with("rediss://") || url.starts_with("unix://") {
                Ok(url.to_string())
            } else {
                Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Redis URL must start with redis://, rediss:// or unix://".to_string(),
                })
            }
        }
    }

    /// 缓存TTL
    pub struct Ttl;
    impl EnvVar<Duration> for Ttl {
        const NAME: &'static str = "CACHE_TTL";
        const DEFAULT: Option<Duration> = Some(Duration::from_secs(crate::cache::DEFAULT_TTL_SECS));
        const DESCRIPTION: &'static str = "Cache entry TTL in seconds";

        fn parse(value: &str) -> EnvResult<Duration> {
            let seconds = parse_u64_in_range(value, Self::NAME, 1, u64::MAX)?;
            Ok(Duration::from_secs(seconds))
        }
    }
}

/// 安全相关环境变量
pub mod security {
    use super::*;

    /// 令牌签名密钥（HMAC）
    pub struct ServerSecret;
    impl EnvVar<String> for ServerSecret {
        const NAME: &'static str = "SERVER_SECRET";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Shared secret used to sign request tokens";

        fn parse(value: &str) -> EnvResult<String> {
            non_empty(value, Self::NAME, "Server secret cannot be empty")
        }
    }

    /// 跳过验证的令牌字面量，设为空字符串即禁用
    pub struct BypassToken;
    impl EnvVar<Option<String>> for BypassToken {
        const NAME: &'static str = "TOKEN_BYPASS";
        const DEFAULT: Option<Option<String>> = None;
        const DESCRIPTION: &'static str = "Token literal accepted without verification (empty disables)";

        fn get() -> EnvResult<Option<String>> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok(Some(crate::token::DEFAULT_BYPASS_TOKEN.to_string())),
            }
        }

        fn parse(value: &str) -> EnvResult<Option<String>> {
            let literal = value.trim();
            if literal.is_empty() {
                Ok(None)
            } else {
                Ok(Some(literal.to_string()))
            }
        }
    }
}

/// Web服务器相关环境变量
pub mod web {
    use super::*;

    /// 绑定地址
    pub struct BindAddress;
    impl EnvVar<String> for BindAddress {
        const NAME: &'static str = "BIND_ADDRESS";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Web server bind address";

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("0.0.0.0".to_string()),
            }
        }

        fn parse(value: &str) -> EnvResult<String> {
            non_empty(value, Self::NAME, "Address cannot be empty")
        }
    }

    /// 端口
    pub struct Port;
    impl EnvVar<u16> for Port {
        const NAME: &'static str = "PORT";
        const DEFAULT: Option<u16> = Some(3000);
        const DESCRIPTION: &'static str = "Web server port";

        fn parse(value: &str) -> EnvResult<u16> {
            let port: u16 = value.trim().parse().map_err(|_| EnvError {
                variable: Self::NAME.to_string(),
                message: "Must be a valid port number (1-65535)".to_string(),
            })?;

            if port == 0 {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Port cannot be 0".to_string(),
                });
            }

            Ok(port)
        }
    }
}

/// 辅助函数
fn parse_bool(value: &str, var_name: &str) -> EnvResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" | "enabled" => Ok(true),
        "false" | "0" | "no" | "off" | "disabled" | "" => Ok(false),
        _ => Err(EnvError {
            variable: var_name.to_string(),
            message: format!(
                "Invalid boolean value '{}'. Use: true/false, 1/0, yes/no, on/off, enabled/disabled",
                value
            ),
        }),
    }
}

fn parse_u64_in_range(value: &str, var_name: &str, min: u64, max: u64) -> EnvResult<u64> {
    let num: u64 = value.trim().parse().map_err(|_| EnvError {
        variable: var_name.to_string(),
        message: "Must be a valid positive number".to_string(),
    })?;

    if num < min {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} is below minimum {}", num, min),
        });
    }

    if num > max {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} exceeds maximum {}", num, max),
        });
    }

    Ok(num)
}

fn non_empty(value: &str, var_name: &str, message: &str) -> EnvResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: message.to_string(),
        });
    }
    Ok(trimmed.to_string())
}

/// 环境变量配置汇总
#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub log_level: String,

    pub translation_api_key: Option<String>,
    pub translation_api_url: String,
    pub translation_timeout: Duration,

    pub server_secret: Option<String>,
    pub bypass_token: Option<String>,

    pub cache_enabled: bool,
    pub cache_backend: cache::BackendKind,
    pub redis_url: String,
    pub cache_ttl: Duration,

    pub bind_address: String,
    pub port: u16,
}

impl EnvConfig {
    /// 从环境变量加载配置
    ///
    /// Secrets are optional here: their absence is reported by
    /// [`EnvConfig::warn_missing`] rather than failing start-up.
    pub fn from_env() -> EnvResult<Self> {
        Ok(Self {
            log_level: core::LogLevel::get()?,

            translation_api_key: optional(translation::ApiKey::get())?,
            translation_api_url: translation::ApiUrl::get()?,
            translation_timeout: translation::Timeout::get()?,

            server_secret: optional(security::ServerSecret::get())?,
            bypass_token: security::BypassToken::get()?,

            cache_enabled: cache::Enabled::get()?,
            cache_backend: cache::Backend::get()?,
            redis_url: cache::RedisUrl::get()?,
            cache_ttl: cache::Ttl::get()?,

            bind_address: web::BindAddress::get()?,
            port: web::Port::get()?,
        })
    }

    /// 对未配置的密钥逐一输出警告
    pub fn warn_missing(&self) {
        if self.translation_api_key.is_none() {
            tracing::warn!("{} is not set; upstream calls will fail", translation::ApiKey::NAME);
        }
        if self.server_secret.is_none() {
            tracing::warn!("{} is not set; only the bypass token will be accepted", security::ServerSecret::NAME);
        }
    }

    /// 打印配置摘要（隐藏敏感信息）
    pub fn log_summary(&self) {
        tracing::info!(
            api_key = configured(&self.translation_api_key),
            server_secret = configured(&self.server_secret),
            bypass_token = self.bypass_token.is_some(),
            cache = self.cache_enabled,
            backend = ?self.cache_backend,
            ttl_secs = self.cache_ttl.as_secs(),
            "environment configuration loaded"
        );
    }
}

/// 未设置（或为空）的变量视为 `None`，设置了但无效的值仍然报错
fn optional<T>(result: EnvResult<T>) -> EnvResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if env::var(&e.variable).map_or(true, |v| v.trim().is_empty()) => Ok(None),
        Err(e) => Err(e),
    }
}

fn configured<T>(value: &Option<T>) -> &'static str {
    if value.is_some() {
        "configured"
    } else {
        "not configured"
    }
}

/// 环境变量文档生成器
pub fn generate_env_docs() -> String {
    fn line<T: fmt::Debug>(name: &str, description: &str, default: Option<T>) -> String {
        format!("- `{}`: {} (default: {:?})\n", name, description, default)
    }

    let mut docs = String::new();
    docs.push_str("# Environment Variables Documentation\n\n");

    docs.push_str("## Core Configuration\n\n");
    docs.push_str(&line(core::LogLevel::NAME, core::LogLevel::DESCRIPTION, Some("info")));

    docs.push_str("\n## Translation Configuration\n\n");
    docs.push_str(&line(translation::ApiKey::NAME, translation::ApiKey::DESCRIPTION, translation::ApiKey::DEFAULT));
    docs.push_str(&line(translation::ApiUrl::NAME, translation::ApiUrl::DESCRIPTION, Some(translation::DEFAULT_API_URL)));
    docs.push_str(&line(translation::Timeout::NAME, translation::Timeout::DESCRIPTION, translation::Timeout::DEFAULT));

    docs.push_str("\n## Security Configuration\n\n");
    docs.push_str(&line(security::ServerSecret::NAME, security::ServerSecret::DESCRIPTION, security::ServerSecret::DEFAULT));
    docs.push_str(&line(
        security::BypassToken::NAME,
        security::BypassToken::DESCRIPTION,
        Some(crate::token::DEFAULT_BYPASS_TOKEN),
    ));

    docs.push_str("\n## Cache Configuration\n\n");
    docs.push_str(&line(cache::Enabled::NAME, cache::Enabled::DESCRIPTION, cache::Enabled::DEFAULT));
    docs.push_str(&line(cache::Backend::NAME, cache::Backend::DESCRIPTION, cache::Backend::DEFAULT));
    docs.push_str(&line(cache::RedisUrl::NAME, cache::RedisUrl::DESCRIPTION, Some("redis://localhost:6379")));
    docs.push_str(&line(cache::Ttl::NAME, cache::Ttl::DESCRIPTION, cache::Ttl::DEFAULT));

    docs.push_str("\n## Web Server Configuration\n\n");
    docs.push_str(&line(web::BindAddress::NAME, web::BindAddress::DESCRIPTION, Some("0.0.0.0")));
    docs.push_str(&line(web::Port::NAME, web::Port::DESCRIPTION, web::Port::DEFAULT));

    docs
}
