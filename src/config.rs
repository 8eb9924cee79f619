//! Configuration for the address book service
//!
//! CLI arguments and environment variable handling using clap. Values are read
//! once at startup and passed explicitly to the components that need them.

use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::time::Duration;

use crate::auth::{HashParams, SessionCodec, MIN_SECRET_LEN};
use crate::db::schemas::USER_COLLECTION;
use crate::types::AddressBookError;

/// Log output format
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

/// Address book - per-user contact collections behind bearer-token auth
#[derive(Parser, Debug, Clone)]
#[command(name = "addressbook")]
#[command(about = "Multi-tenant address book HTTP service")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "addressbook")]
    pub mongodb_db: String,

    /// Collection holding one document per user
    #[arg(long, env = "USER_COLLECTION", default_value = USER_COLLECTION)]
    pub user_collection: String,

    /// Secret for signing session tokens (required in production)
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Enable development mode (in-memory store, built-in token secret)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Argon2 memory cost in KiB
    #[arg(long, env = "HASH_MEMORY_KIB", default_value = "65536")]
    pub hash_memory_kib: u32,

    /// Argon2 iterations
    #[arg(long, env = "HASH_ITERATIONS", default_value = "3")]
    pub hash_iterations: u32,

    /// Argon2 lanes
    #[arg(long, env = "HASH_PARALLELISM", default_value = "1")]
    pub hash_parallelism: u32,

    /// Per-request deadline in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "30000")]
    pub request_timeout_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

impl Args {
    /// Check the configuration before anything is started
    pub fn validate(&self) -> Result<(), String> {
        if !self.dev_mode {
            match self.jwt_secret.as_deref() {
                None | Some("") => {
                    return Err("JWT_SECRET is required in production mode".to_string());
                }
                Some(secret) if secret.len() < MIN_SECRET_LEN => {
                    return Err(format!(
                        "JWT_SECRET must be at least {} characters",
                        MIN_SECRET_LEN
                    ));
                }
                Some(_) => {}
            }
        }

        if self.hash_memory_kib == 0 || self.hash_iterations == 0 || self.hash_parallelism == 0 {
            return Err("HASH_* parameters must be greater than zero".to_string());
        }

        if self.request_timeout_ms == 0 {
            return Err("REQUEST_TIMEOUT_MS must be greater than zero".to_string());
        }

        Ok(())
    }

    /// Argon2 cost parameters
    pub fn hash_params(&self) -> HashParams {
        HashParams::new(
            self.hash_memory_kib,
            self.hash_iterations,
            self.hash_parallelism,
        )
    }

    /// Build the token codec (uses the built-in secret in dev mode when none is set)
    pub fn session_codec(&self) -> Result<SessionCodec, AddressBookError> {
        match (self.jwt_secret.as_deref(), self.dev_mode) {
            (Some(secret), _) if !secret.is_empty() => SessionCodec::new(secret),
            (_, true) => Ok(SessionCodec::new_dev()),
            (_, false) => SessionCodec::new(""),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
