use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroizing;

/// Bearer token for one account. Redacted from `Debug`, wiped on drop.
#[derive(Clone)]
pub struct AccountCredential {
    token: Zeroizing<String>,
}

impl AccountCredential {
    /// Returns `None` for blank input.
    pub fn new(token: &str) -> Option<Self> {
        let token = token.trim();
        if token.is_empty() {
            return None;
        }
        Some(Self {
            token: Zeroizing::new(token.to_string()),
        })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Short label safe to print: first 6 chars of the token.
    pub fn label(&self) -> String {
        let head: String = self.token.chars().take(6).collect();
        format!("{}…", head)
    }
}

impl fmt::Debug for AccountCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountCredential")
            .field("token", &"***REDACTED***")
            .finish()
    }
}

/// Raw proxy string as it appeared in the proxy source, before it is resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProxyDescriptor {
    pub raw: String,
}

impl ProxyDescriptor {
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into().trim().to_string(),
        }
    }
}

impl fmt::Display for ProxyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[derive(Debug, Clone)]
pub struct AccountEntry {
    pub credential: AccountCredential,
    pub proxy: Option<ProxyDescriptor>,
}

/// Which proxy file is the source of truth for account pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxySource {
    /// Structured JSON file if present, flat file otherwise.
    #[default]
    Auto,
    Flat,
    Structured,
    None,
}
