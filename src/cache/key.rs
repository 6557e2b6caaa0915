//! 缓存键生成

use std::fmt;

use sha2::{Digest, Sha256};

/// Prefix shared by every key this gateway writes.
pub const KEY_NAMESPACE: &str = "translate:";

/// 缓存键
///
/// `translate:<sha256 hex>` over the texts sorted and joined with `|`,
/// followed by `:` and the target language. Text order does not matter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// 生成缓存键
    pub fn derive<S: AsRef<str>>(texts: &[S], target_lang: &str) -> Self {
        let mut sorted: Vec<&str> = texts.iter().map(AsRef::as_ref).collect();
        // UTF-16 order keeps keys identical to ones written by JavaScript clients
        sorted.sort_by(|a, b| a.encode_utf16().cmp(b.encode_utf16()));

        let raw_key = format!("{}:{}", sorted.join("|"), target_lang);
        let digest = Sha256::digest(raw_key.as_bytes());

        CacheKey(format!("{}{:x}", KEY_NAMESPACE, digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
