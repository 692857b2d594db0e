//! Shared fixtures: one runtime RSA key per test binary and token helpers.
#![allow(dead_code)]

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

pub struct TestKey {
    pub private_pem: String,
    pub public_pem: String,
    pub n: String,
    pub e: String,
}

pub fn test_key() -> &'static TestKey {
    static KEY: OnceLock<TestKey> = OnceLock::new();
    KEY.get_or_init(|| {
        use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey, LineEnding};
        use rsa::traits::PublicKeyParts;
        use rsa::RsaPrivateKey;

        let mut rng = rand::thread_rng();
        let private = RsaPrivateKey::new(&mut rng, 2048).expect("failed to generate key");
        let public = private.to_public_key();
        TestKey {
            private_pem: private.to_pkcs8_pem(LineEnding::LF).unwrap().to_string(),
            public_pem: public.to_public_key_pem(LineEnding::LF).unwrap(),
            n: URL_SAFE_NO_PAD.encode(public.n().to_bytes_be()),
            e: URL_SAFE_NO_PAD.encode(public.e().to_bytes_be()),
        }
    })
}

pub fn now() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs()
}

pub fn claims_with_roles(roles: &[&str]) -> Value {
    json!({
        "sub": "8f1c",
        "iss": "https://sso.example.com/realms/lines",
        "preferred_username": "operator",
        "exp": now() + 3600,
        "realm_access": { "roles": roles },
    })
}

pub fn sign_with_kid(claims: &Value, kid: Option<&str>) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = kid.map(str::to_owned);
    let key = EncodingKey::from_rsa_pem(test_key().private_pem.as_bytes()).unwrap();
    encode(&header, claims, &key).unwrap()
}

/// `Bearer <token>` for a fresh token carrying `roles`.
pub fn bearer(roles: &[&str]) -> String {
    format!("Bearer {}", sign_with_kid(&claims_with_roles(roles), Some("sig-1")))
}

/// Certificate set as the realm publishes it: an encryption key that must be
/// skipped, then the signing key.
pub fn realm_certs() -> Value {
    let key = test_key();
    json!({
        "keys": [
            {
                "kid": "enc-1", "kty": "RSA", "alg": "RSA-OAEP", "use": "enc",
                "n": key.n, "e": key.e,
            },
            {
                "kid": "sig-1", "kty": "RSA", "alg": "RS256", "use": "sig",
                "n": key.n, "e": key.e,
                "x5c": ["MIIC..."],
            },
        ]
    })
}
