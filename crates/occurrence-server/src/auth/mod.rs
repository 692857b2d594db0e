pub mod certs;
pub mod claims;
pub mod config;
pub mod error;
pub mod gate;

pub use certs::{RealmCertsProvider, RealmKeys, SigningKeySource, StaticKeySource};
pub use claims::{AuthContext, Claims, RealmAccess, RequiredRoles};
pub use config::{AuthConfig, KeyCachePolicy};
pub use error::{AuthorizationError, RejectReason, FORBIDDEN_MESSAGE};
pub use gate::AuthGate;
