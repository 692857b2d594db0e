use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Whether realm signing keys are reused between authorization checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase", tag = "mode", content = "ttl")]
pub enum KeyCachePolicy {
    /// Fetch the certificate set on every check.
    #[default]
    Disabled,
    /// Reuse fetched keys until the TTL elapses.
    Ttl(Duration),
}

impl KeyCachePolicy {
    /// `0` disables caching.
    pub fn from_secs(secs: u64) -> Self {
        if secs == 0 {
            Self::Disabled
        } else {
            Self::Ttl(Duration::from_secs(secs))
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Identity provider base URL, e.g. `https://sso.example.com/` or
    /// `https://sso.example.com/auth/`.
    pub server_url: Option<Url>,
    pub realm: Option<String>,
    /// Only reported in logs; tokens are not checked against it.
    pub client_id: Option<String>,
    pub clock_skew_leeway: Duration,
    pub http_timeout: Duration,
    pub key_cache: KeyCachePolicy,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            server_url: None,
            realm: None,
            client_id: None,
            clock_skew_leeway: Duration::ZERO,
            http_timeout: Duration::from_secs(5),
            key_cache: KeyCachePolicy::Disabled,
        }
    }
}

impl AuthConfig {
    /// `{server}/realms/{realm}/protocol/openid-connect/certs`, if both
    /// parts are configured.
    pub fn certs_uri(&self) -> Option<Url> {
        let base = self.server_url.as_ref()?;
        let realm = self.realm.as_deref()?;
        let mut base = base.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.join(&format!("realms/{realm}/protocol/openid-connect/certs"))
            .ok()
    }
}
