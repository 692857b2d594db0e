//! Realm signing keys.
//!
//! The identity provider publishes its keys at the realm's OpenID Connect
//! certificate endpoint. Only keys tagged `use = "sig"` with RSA components
//! are kept.

use anyhow::{Context, Result};
use async_trait::async_trait;
use jsonwebtoken::DecodingKey;
use moka::sync::Cache;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use super::config::KeyCachePolicy;

const MAX_CERTS_RESPONSE_BYTES: u64 = 512 * 1024;

#[derive(Debug, Clone, Deserialize)]
struct Jwk {
    kid: Option<String>,
    kty: String,
    #[serde(rename = "use")]
    usage: Option<String>,
    n: Option<String>,
    e: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CertsResponse {
    keys: Vec<Jwk>,
}

/// Signing keys currently published by the realm.
#[derive(Clone, Default)]
pub struct RealmKeys {
    keys: Vec<(Option<String>, Arc<DecodingKey>)>,
}

impl RealmKeys {
    pub fn single(key: DecodingKey) -> Self {
        Self {
            keys: vec![(None, Arc::new(key))],
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// The key matching `kid`, falling back to the first signing key.
    pub fn select(&self, kid: Option<&str>) -> Option<Arc<DecodingKey>> {
        kid.and_then(|kid| {
            self.keys
                .iter()
                .find(|(k, _)| k.as_deref() == Some(kid))
                .map(|(_, key)| key.clone())
        })
        .or_else(|| self.keys.first().map(|(_, key)| key.clone()))
    }

    fn from_response(jwks: CertsResponse) -> Self {
        let keys = jwks
            .keys
            .into_iter()
            .filter(|jwk| jwk.usage.as_deref() == Some("sig") && jwk.kty == "RSA")
            .filter_map(|jwk| {
                let (n, e) = (jwk.n.as_deref()?, jwk.e.as_deref()?);
                match DecodingKey::from_rsa_components(n, e) {
                    Ok(key) => Some((jwk.kid, Arc::new(key))),
                    Err(err) => {
                        tracing::warn!(kid = ?jwk.kid, error = %err, "skipping unusable signing key");
                        None
                    }
                }
            })
            .collect();
        Self { keys }
    }
}

/// Source of the keys used to verify bearer tokens.
#[async_trait]
pub trait SigningKeySource: Send + Sync {
    async fn realm_keys(&self) -> Result<Arc<RealmKeys>>;
}

/// Fetches keys from the realm certificate endpoint.
#[derive(Clone)]
pub struct RealmCertsProvider {
    cache: Option<Cache<String, Arc<RealmKeys>>>,
    client: Client,
    certs_uri: Url,
}

impl RealmCertsProvider {
    pub fn new(certs_uri: Url, timeout: Duration, policy: KeyCachePolicy) -> Result<Self> {
        let cache = match policy {
            KeyCachePolicy::Disabled => None,
            KeyCachePolicy::Ttl(ttl) => Some(Cache::builder().max_capacity(1).time_to_live(ttl).build()),
        };
        Ok(Self {
            cache,
            client: Client::builder()
                .timeout(timeout)
                .user_agent(concat!("occurrence-server/", env!("CARGO_PKG_VERSION")))
                .redirect(reqwest::redirect::Policy::none())
                .build()
                .context("failed to build certificate HTTP client")?,
            certs_uri,
        })
    }

    pub fn certs_uri(&self) -> &Url {
        &self.certs_uri
    }

    async fn fetch(&self) -> Result<Arc<RealmKeys>> {
        tracing::debug!(event = "realm_certs_fetch", uri = %self.certs_uri);
        let mut resp = self
            .client
            .get(self.certs_uri.clone())
            .send()
            .await
            .context("certificate endpoint unreachable")?
            .error_for_status()
            .context("certificate endpoint returned an error status")?;

        if let Some(len) = resp.content_length() {
            if len > MAX_CERTS_RESPONSE_BYTES {
                anyhow::bail!("certificate response too large: {} bytes", len);
            }
        }

        // Content-Length is absent on chunked responses; count what is read.
        let mut body = Vec::new();
        while let Some(chunk) = resp
            .chunk()
            .await
            .context("failed to read certificate response")?
        {
            if (body.len() + chunk.len()) as u64 > MAX_CERTS_RESPONSE_BYTES {
                anyhow::bail!(
                    "certificate response too large: over {} bytes",
                    MAX_CERTS_RESPONSE_BYTES
                );
            }
            body.extend_from_slice(&chunk);
        }

        let jwks: CertsResponse =
            serde_json::from_slice(&body).context("failed to parse certificate set")?;
        let keys = RealmKeys::from_response(jwks);
        if keys.is_empty() {
            anyhow::bail!("realm publishes no usable signing key");
        }
        Ok(Arc::new(keys))
    }
}

#[async_trait]
impl SigningKeySource for RealmCertsProvider {
    async fn realm_keys(&self) -> Result<Arc<RealmKeys>> {
        let Some(cache) = &self.cache else {
            return self.fetch().await;
        };
        let key = self.certs_uri.to_string();
        if let Some(keys) = cache.get(&key) {
            return Ok(keys);
        }
        let keys = self.fetch().await?;
        cache.insert(key, keys.clone());
        Ok(keys)
    }
}

/// A fixed RSA public key, for tests and offline deployments.
#[derive(Clone)]
pub struct StaticKeySource {
    keys: Arc<RealmKeys>,
}

impl StaticKeySource {
    pub fn from_rsa_pem(key_pem: &[u8]) -> Result<Self> {
        let key = DecodingKey::from_rsa_pem(key_pem)
            .map_err(|e| anyhow::anyhow!("Failed to create DecodingKey from RSA PEM: {}", e))?;
        Ok(Self {
            keys: Arc::new(RealmKeys::single(key)),
        })
    }
}

#[async_trait]
impl SigningKeySource for StaticKeySource {
    async fn realm_keys(&self) -> Result<Arc<RealmKeys>> {
        Ok(self.keys.clone())
    }
}
