use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Dev,
    Prod,
}

impl FromStr for Platform {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dev" => Ok(Platform::Dev),
            "prod" => Ok(Platform::Prod),
            other => Err(anyhow::anyhow!("unknown platform: {}", other)),
        }
    }
}

/// Process-wide secrets, loaded once at startup and shared read-only.
#[derive(Clone)]
pub struct SecretConfig {
    pub token_secret: Vec<u8>,
    pub webhook_api_key: String,
    pub platform: Platform,
}

impl SecretConfig {
    pub fn allows_reset(&self) -> bool {
        self.platform == Platform::Dev
    }
}

impl fmt::Debug for SecretConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretConfig")
            .field("token_secret", &"<redacted>")
            .field("webhook_api_key", &"<redacted>")
            .field("platform", &self.platform)
            .finish()
    }
}
