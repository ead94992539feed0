//! Judge API credentials.
//!
//! Read from `CODEFORCES_API_KEY` and `CODEFORCES_API_SECRET`, normally
//! supplied through a `.env` file loaded at startup.

use crate::error::ConfigError;

pub const API_KEY_VAR: &str = "CODEFORCES_API_KEY";
pub const API_SECRET_VAR: &str = "CODEFORCES_API_SECRET";

#[derive(Clone, PartialEq, Eq)]
pub struct ApiCredentials {
    pub key: String,
    pub secret: String,
}

impl std::fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("key", &self.key)
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl ApiCredentials {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds credentials from any variable lookup. Blank values count as
    /// missing.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let present = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        match (present(API_KEY_VAR), present(API_SECRET_VAR)) {
            (Some(key), Some(secret)) => Ok(Self { key, secret }),
            _ => Err(ConfigError::MissingCredentials {
                key: API_KEY_VAR.to_string(),
                secret: API_SECRET_VAR.to_string(),
            }),
        }
    }
}
