//! 请求来源检查
//!
//! Rejects clients whose user agent names a bot or a scripted HTTP client.
//! This only raises the cost of casual scraping; a spoofed user agent passes.

use thiserror::Error;

/// 默认拦截关键字
pub const DEFAULT_BLOCKED_AGENTS: &[&str] = &[
    "bot",
    "spider",
    "crawler",
    "slurp",
    "curl",
    "wget",
    "python-requests",
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("user agent matches blocked keyword '{keyword}'")]
pub struct AccessDenied {
    pub keyword: String,
}

/// User-agent denylist check.
#[derive(Debug, Clone)]
pub struct AccessGuard {
    keywords: Vec<String>,
}

impl Default for AccessGuard {
    fn default() -> Self {
        Self::with_keywords(DEFAULT_BLOCKED_AGENTS.iter().copied())
    }
}

impl AccessGuard {
    pub fn with_keywords<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.into().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    /// A missing user agent is treated as empty and passes.
    pub fn check(&self, user_agent: Option<&str>) -> Result<(), AccessDenied> {
        let ua = user_agent.unwrap_or_default().to_lowercase();
        match self.keywords.iter().find(|keyword| ua.contains(keyword.as_str())) {
            Some(keyword) => Err(AccessDenied {
                keyword: keyword.clone(),
            }),
            None => Ok(()),
        }
    }
}
