use crate::components::redis_service::RedisActorHandle;
use crate::config::Config;
use crate::error::{validation_error, DeskResult, Error};
use chrono::Utc;
use serde_json::{json, Value};
use std::fmt;

/// Bearer credential for the Calendar API, obtained out of band
#[derive(Clone, PartialEq)]
pub struct Credential {
    access_token: String,
    expires_at: Option<i64>,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl Credential {
    /// Credential with no known expiry
    pub fn bearer(access_token: impl Into<String>) -> DeskResult<Self> {
        let access_token = access_token.into();
        if access_token.trim().is_empty() {
            return Err(validation_error("Access token must not be empty"));
        }
        Ok(Self {
            access_token,
            expires_at: None,
        })
    }

    /// Parse the stored JSON form (`access_token`, optional `expires_at`)
    pub fn from_json(token: &Value) -> DeskResult<Self> {
        let access_token = token
            .get("access_token")
            .and_then(|t| t.as_str())
            .ok_or_else(|| validation_error("Stored token has no access_token"))?;

        let mut credential = Self::bearer(access_token)?;
        credential.expires_at = token.get("expires_at").and_then(|v| v.as_i64());
        Ok(credential)
    }

    pub fn to_json(&self) -> Value {
        match self.expires_at {
            Some(expires_at) => json!({ "access_token": self.access_token, "expires_at": expires_at }),
            None => json!({ "access_token": self.access_token }),
        }
    }

    pub fn with_expiry(mut self, expires_at: i64) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn is_expired(&self, now_timestamp: i64) -> bool {
        matches!(self.expires_at, Some(expiry) if expiry <= now_timestamp)
    }
}

/// Get the credential, preferring the configured override over Redis
pub async fn load_credential(config: &Config, redis: &RedisActorHandle) -> DeskResult<Credential> {
    if let Some(token) = &config.google_access_token {
        return Credential::bearer(token.clone());
    }

    let stored = redis.get_token().await?.ok_or_else(|| {
        Error::Config("No calendar credential found. Store one with `lifedesk auth set-token`.".to_string())
    })?;

    let credential = Credential::from_json(&stored)?;
    if credential.is_expired(Utc::now().timestamp()) {
        return Err(Error::Config(
            "Stored calendar credential has expired. Store a fresh one with `lifedesk auth set-token`."
                .to_string(),
        ));
    }

    Ok(credential)
}

/// Persist a credential for later runs
pub async fn store_credential(redis: &RedisActorHandle, credential: &Credential) -> DeskResult<()> {
    redis.save_token(&credential.to_json()).await
}
