//! Web 服务器配置

use crate::env::{EnvConfig, EnvError, EnvResult};

/// Web 服务器配置
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// 绑定地址
    pub bind_addr: String,
    /// 端口
    pub port: u16,
}

impl WebConfig {
    pub fn from_env_config(env: &EnvConfig) -> Self {
        Self {
            bind_addr: env.bind_address.clone(),
            port: env.port,
        }
    }

    /// Command-line overrides win over the environment.
    pub fn with_overrides(mut self, bind_addr: Option<String>, port: Option<u16>) -> Self {
        if let Some(bind_addr) = bind_addr {
            self.bind_addr = bind_addr;
        }
        if let Some(port) = port {
            self.port = port;
        }
        self
    }

    /// 验证配置
    pub fn validate(&self) -> EnvResult<()> {
        if self.bind_addr.is_empty() {
            return Err(EnvError {
                variable: "BIND_ADDRESS".to_string(),
                message: "Bind address cannot be empty".to_string(),
            });
        }

        if self.port == 0 {
            return Err(EnvError {
                variable: "PORT".to_string(),
                message: "Port cannot be 0".to_string(),
            });
        }

        Ok(())
    }

    /// 获取完整的监听地址
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_and_listen_address() {
        let config = WebConfig::default().with_overrides(Some("127.0.0.1".to_string()), None);
        assert_eq!(config.listen_address(), "127.0.0.1:3000");

        let config = config.with_overrides(None, Some(8080));
        assert_eq!(config.listen_address(), "127.0.0.1:8080");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let config = WebConfig::default().with_overrides(Some(String::new()), None);
        assert!(config.validate().is_err());

        let config = WebConfig::default().with_overrides(None, Some(0));
        assert!(config.validate().is_err());
    }
}
