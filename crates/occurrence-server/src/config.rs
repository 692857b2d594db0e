use clap::{Parser, ValueEnum};
use occurrence_core::{Projection, DEFAULT_UTC_OFFSET_HOURS};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::auth::{AuthConfig, KeyCachePolicy, RequiredRoles};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Parser)]
#[command(
    name = "occurrence-server",
    version,
    about = "REST API for Occurrence records behind a realm-role token gate"
)]
pub struct Cli {
    /// Address to listen on
    #[arg(long, env = "OCCURRENCE_BIND", default_value = "127.0.0.1:8080")]
    pub bind: SocketAddr,

    /// SQLite database file; in-memory when omitted
    #[arg(long, env = "OCCURRENCE_DATABASE")]
    pub database: Option<PathBuf>,

    /// Hours added to stored timestamps when rendering them
    #[arg(
        long,
        env = "OCCURRENCE_UTC_OFFSET_HOURS",
        default_value_t = DEFAULT_UTC_OFFSET_HOURS,
        allow_negative_numbers = true
    )]
    pub utc_offset_hours: i32,

    /// Realm roles every /occurrence request must carry
    #[arg(
        long,
        env = "OCCURRENCE_REQUIRED_ROLES",
        value_delimiter = ',',
        default_value = "user_role"
    )]
    pub required_roles: Vec<String>,

    /// Identity provider base URL
    #[arg(long, env = "KC_SERVER_URL")]
    pub kc_server_url: Option<Url>,

    #[arg(long, env = "KC_REALM")]
    pub kc_realm: Option<String>,

    #[arg(long, env = "KC_BACKEND_CLIENT_ID")]
    pub kc_client_id: Option<String>,

    /// Seconds to reuse fetched signing keys; 0 refetches on every request
    #[arg(long, env = "KC_KEY_CACHE_TTL_SECS", default_value_t = 0)]
    pub kc_key_cache_ttl_secs: u64,

    /// Allowed clock skew when checking token expiry
    #[arg(long, env = "KC_LEEWAY_SECS", default_value_t = 0)]
    pub kc_leeway_secs: u64,

    #[arg(long, env = "KC_HTTP_TIMEOUT_SECS", default_value_t = 5)]
    pub kc_http_timeout_secs: u64,

    #[arg(long, value_enum, env = "OCCURRENCE_LOG_FORMAT", default_value_t)]
    pub log_format: LogFormat,
}

impl Cli {
    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig {
            server_url: self.kc_server_url.clone(),
            realm: self.kc_realm.clone(),
            client_id: self.kc_client_id.clone(),
            clock_skew_leeway: Duration::from_secs(self.kc_leeway_secs),
            http_timeout: Duration::from_secs(self.kc_http_timeout_secs),
            key_cache: KeyCachePolicy::from_secs(self.kc_key_cache_ttl_secs),
        }
    }

    pub fn projection(&self) -> Projection {
        Projection::with_offset_hours(self.utc_offset_hours)
    }

    pub fn required_roles(&self) -> RequiredRoles {
        RequiredRoles::new(
            self.required_roles
                .iter()
                .map(|role| role.trim())
                .filter(|role| !role.is_empty()),
        )
    }
}
