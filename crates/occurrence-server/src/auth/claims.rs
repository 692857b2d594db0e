use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// `realm_access` claim issued by the identity provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RealmAccess {
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Claims read from a verified access token. Unknown claims are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub exp: u64,
    pub sub: Option<String>,
    pub iss: Option<String>,
    pub preferred_username: Option<String>,
    #[serde(default)]
    pub realm_access: Option<RealmAccess>,
}

impl Claims {
    pub fn realm_roles(&self) -> BTreeSet<String> {
        self.realm_access
            .as_ref()
            .map(|access| access.roles.iter().cloned().collect())
            .unwrap_or_default()
    }
}

/// Roles an endpoint requires; all of them must be present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequiredRoles(BTreeSet<String>);

impl RequiredRoles {
    pub fn new<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(roles.into_iter().map(Into::into).collect())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Required roles absent from `granted`, sorted.
    pub fn missing_from(&self, granted: &BTreeSet<String>) -> Vec<String> {
        self.0.difference(granted).cloned().collect()
    }
}

/// Verified identity handed to handlers after the gate lets a request through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub subject: Option<String>,
    pub issuer: Option<String>,
    pub username: Option<String>,
    pub roles: BTreeSet<String>,
}
