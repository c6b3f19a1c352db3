use crate::error::{NewsApiError, Result};
use std::fmt;

pub const FINNHUB_API_KEY_VAR: &str = "FINNHUB_API_KEY";

/// API token for a REST news provider.
#[derive(Clone)]
pub struct ApiCredential {
    api_key: String,
}

impl ApiCredential {
    /// Build a credential from an explicit key. Blank keys are rejected.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(NewsApiError::MissingCredential("api key".to_string()));
        }
        Ok(Self { api_key })
    }

    /// Read the key from `FINNHUB_API_KEY`.
    pub fn from_env() -> Result<Self> {
        Self::from_var(FINNHUB_API_KEY_VAR)
    }

    /// Read the key from the named environment variable
    pub fn from_var(name: &str) -> Result<Self> {
        match std::env::var(name) {
            Ok(value) if !value.trim().is_empty() => Ok(Self { api_key: value.trim().to_string() }),
            _ => Err(NewsApiError::MissingCredential(name.to_string())),
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// First characters of the key, for logs.
    pub fn redacted(&self) -> String {
        let prefix: String = self.api_key.chars().take(4).collect();
        format!("{}***", prefix)
    }
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredential")
            .field("api_key", &self.redacted())
            .finish()
    }
}
