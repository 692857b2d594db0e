use anyhow::Context;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use std::sync::Arc;
use std::time::Duration;

use super::certs::{RealmCertsProvider, SigningKeySource};
use super::claims::{AuthContext, Claims, RequiredRoles};
use super::config::AuthConfig;
use super::error::{AuthorizationError, RejectReason};

/// Verifies bearer tokens against the realm signing keys and checks that the
/// caller holds every required realm role.
#[derive(Clone)]
pub struct AuthGate {
    keys: Arc<dyn SigningKeySource>,
    leeway: Duration,
}

impl AuthGate {
    pub fn new(keys: Arc<dyn SigningKeySource>) -> Self {
        Self {
            keys,
            leeway: Duration::ZERO,
        }
    }

    pub fn with_leeway(mut self, leeway: Duration) -> Self {
        self.leeway = leeway;
        self
    }

    /// Gate backed by the realm certificate endpoint.
    pub fn from_config(config: &AuthConfig) -> anyhow::Result<Self> {
        let certs_uri = config
            .certs_uri()
            .context("identity provider server URL and realm must both be configured")?;
        tracing::info!(
            certs_uri = %certs_uri,
            client_id = config.client_id.as_deref().unwrap_or("-"),
            key_cache = ?config.key_cache,
            "authorization gate configured"
        );
        let provider =
            RealmCertsProvider::new(certs_uri, config.http_timeout, config.key_cache)?;
        Ok(Self::new(Arc::new(provider)).with_leeway(config.clock_skew_leeway))
    }

    /// Checks the raw `Authorization` header value. Every failure carries the
    /// same generic response body; the reason is only logged.
    pub async fn authorize(
        &self,
        authorization: Option<&str>,
        required: &RequiredRoles,
    ) -> Result<AuthContext, AuthorizationError> {
        match self.check(authorization, required).await {
            Ok(ctx) => {
                tracing::debug!(subject = ctx.subject.as_deref().unwrap_or("-"), "authorized");
                Ok(ctx)
            }
            Err(reason) => {
                tracing::warn!(reason = %reason, "authorization rejected");
                Err(reason.into())
            }
        }
    }

    async fn check(
        &self,
        authorization: Option<&str>,
        required: &RequiredRoles,
    ) -> Result<AuthContext, RejectReason> {
        let token = bearer_token(authorization)?;

        let header =
            decode_header(token).map_err(|e| RejectReason::InvalidToken(e.to_string()))?;
        if header.alg != Algorithm::RS256 {
            return Err(RejectReason::UnsupportedAlgorithm(format!("{:?}", header.alg)));
        }

        let keys = self
            .keys
            .realm_keys()
            .await
            .map_err(|e| RejectReason::KeyFetch(format!("{e:#}")))?;
        let key = keys
            .select(header.kid.as_deref())
            .ok_or_else(|| RejectReason::KeyFetch("no signing key published".into()))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = true;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);
        validation.leeway = self.leeway.as_secs();

        let claims = decode::<Claims>(token, &key, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => RejectReason::Expired,
                _ => RejectReason::InvalidToken(e.to_string()),
            })?
            .claims;

        let granted = claims.realm_roles();
        if granted.is_empty() {
            return Err(RejectReason::NoRealmRoles);
        }
        let missing = required.missing_from(&granted);
        if !missing.is_empty() {
            return Err(RejectReason::MissingRoles(missing));
        }

        Ok(AuthContext {
            subject: claims.sub,
            issuer: claims.iss,
            username: claims.preferred_username,
            roles: granted,
        })
    }
}

/// Extracts the token from `Bearer <token>`. The scheme is case-insensitive.
fn bearer_token(authorization: Option<&str>) -> Result<&str, RejectReason> {
    let value = authorization.ok_or(RejectReason::MissingHeader)?;
    let mut parts = value.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => Ok(token),
        _ => Err(RejectReason::MalformedHeader),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        assert_eq!(bearer_token(Some("Bearer abc")), Ok("abc"));
        assert_eq!(bearer_token(Some("bearer abc")), Ok("abc"));
        assert_eq!(bearer_token(Some("BEARER  abc ")), Ok("abc"));
    }

    #[test]
    fn bearer_header_shape_is_enforced() {
        assert_eq!(bearer_token(None), Err(RejectReason::MissingHeader));
        for bad in ["", "Bearer", "abc", "Basic abc", "Bearer a b"] {
            assert_eq!(bearer_token(Some(bad)), Err(RejectReason::MalformedHeader), "{bad:?}");
        }
    }
}
