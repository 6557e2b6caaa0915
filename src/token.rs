//! 访问令牌
//!
//! Tokens are `<signature>.<expiry>` where `expiry` is a Unix timestamp in
//! seconds and `signature` is the lowercase hex HMAC-SHA256 of the expiry
//! field, keyed with the server secret.

use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// 默认的免验证令牌
pub const DEFAULT_BYPASS_TOKEN: &str = "valid";

const SIGNATURE_HEX_LEN: usize = 64;

/// 令牌验证错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is required (?token=...)")]
    Missing,

    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("token expired: now {now}, expiry {expiry}")]
    Expired { now: u64, expiry: u64 },

    #[error("invalid token signature")]
    BadSignature,
}

/// 解析后的令牌
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    signature: String,
    /// Kept verbatim: the signature covers the field as sent, not its numeric value.
    expiry_field: String,
    expiry: u64,
}

impl Token {
    /// 生成一个在 `expiry` 过期的已签名令牌
    pub fn issue(secret: &str, expiry: u64) -> Self {
        let expiry_field = expiry.to_string();
        Self {
            signature: sign(secret, &expiry_field),
            expiry_field,
            expiry,
        }
    }

    /// 解析 `<signature>.<expiry>`
    pub fn parse(raw: &str) -> Result<Self, TokenError> {
        let (signature, expiry_field) = raw
            .split_once('.')
            .ok_or_else(|| TokenError::Malformed("expected <signature>.<expiry>".to_string()))?;

        if expiry_field.is_empty() || !expiry_field.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TokenError::Malformed(format!("expiry is not a timestamp: {:?}", expiry_field)));
        }
        let expiry = expiry_field
            .parse::<u64>()
            .map_err(|_| TokenError::Malformed(format!("expiry out of range: {}", expiry_field)))?;

        Ok(Self {
            signature: signature.to_string(),
            expiry_field: expiry_field.to_string(),
            expiry,
        })
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn expiry(&self) -> u64 {
        self.expiry
    }

    /// Constant-time check of the signature against `secret`.
    fn verify(&self, secret: &str) -> Result<(), TokenError> {
        // hex::decode is case-insensitive; the wire format is lowercase only
        let well_formed = self.signature.len() == SIGNATURE_HEX_LEN
            && self.signature.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
        if !well_formed {
            return Err(TokenError::BadSignature);
        }
        let provided = hex::decode(&self.signature).map_err(|_| TokenError::BadSignature)?;

        let mut mac = keyed_mac(secret);
        mac.update(self.expiry_field.as_bytes());
        mac.verify_slice(&provided).map_err(|_| TokenError::BadSignature)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.signature, self.expiry_field)
    }
}

impl FromStr for Token {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Token::parse(s)
    }
}

fn keyed_mac(secret: &str) -> HmacSha256 {
    HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC takes keys of any length")
}

fn sign(secret: &str, expiry_field: &str) -> String {
    let mut mac = keyed_mac(secret);
    mac.update(expiry_field.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// 当前 Unix 时间（秒）
pub fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// How a token was accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenGrant {
    Bypass,
    Signed { expiry: u64 },
}

/// 令牌验证器
#[derive(Debug, Clone)]
pub struct TokenValidator {
    secret: Option<String>,
    bypass: Option<String>,
}

impl TokenValidator {
    /// Validator for `secret` that also accepts [`DEFAULT_BYPASS_TOKEN`].
    ///
    /// Without a secret only the bypass literal can succeed.
    pub fn new(secret: Option<String>) -> Self {
        Self {
            secret,
            bypass: Some(DEFAULT_BYPASS_TOKEN.to_string()),
        }
    }

    pub fn with_bypass(mut self, bypass: Option<String>) -> Self {
        self.bypass = bypass;
        self
    }

    /// 验证令牌
    ///
    /// Order matters: missing, bypass, parse, expiry, then signature. An
    /// expired token is rejected as expired even when its signature is wrong.
    pub fn validate(&self, raw: Option<&str>, now: u64) -> Result<TokenGrant, TokenError> {
        let raw = match raw {
            Some(raw) if !raw.is_empty() => raw,
            _ => return Err(TokenError::Missing),
        };

        if self.bypass.as_deref() == Some(raw) {
            return Ok(TokenGrant::Bypass);
        }

        let token = Token::parse(raw)?;

        if now >= token.expiry() {
            return Err(TokenError::Expired {
                now,
                expiry: token.expiry(),
            });
        }

        let secret = self.secret.as_deref().ok_or(TokenError::BadSignature)?;
        token.verify(secret)?;

        Ok(TokenGrant::Signed {
            expiry: token.expiry(),
        })
    }
}
