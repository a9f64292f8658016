//! HTTP server configuration sourced from the environment.

use std::env;
use std::net::SocketAddr;

use actix_web::cookie::Key;
use tracing::warn;

/// Default bind address when `BIND_ADDR` is unset.
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
/// Default location of the session key file.
const DEFAULT_SESSION_KEY_FILE: &str = "/var/run/secrets/session_key";

/// Resolved server configuration.
pub struct ServerConfig {
    /// Session cookie signing key.
    pub key: Key,
    /// Whether the session cookie carries the `Secure` attribute.
    pub cookie_secure: bool,
    /// Socket address the server binds to.
    pub bind_addr: SocketAddr,
    /// PostgreSQL connection string.
    pub database_url: String,
}

impl ServerConfig {
    /// Resolve configuration from the environment.
    ///
    /// - `DATABASE_URL` (required): PostgreSQL connection string.
    /// - `BIND_ADDR` (default `0.0.0.0:8080`).
    /// - `SESSION_KEY_FILE` (default `/var/run/secrets/session_key`): file
    ///   holding the cookie key material. Missing files are fatal in release
    ///   builds; debug builds, or `SESSION_ALLOW_EPHEMERAL=1`, fall back to a
    ///   generated throwaway key.
    /// - `SESSION_COOKIE_SECURE` (default on; set `0` to disable for local
    ///   plain-HTTP development).
    pub fn from_env() -> std::io::Result<Self> {
        let database_url = env::var("DATABASE_URL").map_err(|_| {
            std::io::Error::other("DATABASE_URL must point at the PostgreSQL instance")
        })?;

        let bind_addr = parse_bind_addr(
            &env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_owned()),
        )?;

        let key_path = env::var("SESSION_KEY_FILE")
            .unwrap_or_else(|_| DEFAULT_SESSION_KEY_FILE.to_owned());
        let key = match std::fs::read(&key_path) {
            Ok(bytes) => Key::derive_from(&bytes),
            Err(read_error) => {
                let allow_dev = env::var("SESSION_ALLOW_EPHEMERAL").ok().as_deref() == Some("1");
                if cfg!(debug_assertions) || allow_dev {
                    warn!(path = %key_path, error = %read_error, "using temporary session key (dev only)");
                    Key::generate()
                } else {
                    return Err(std::io::Error::other(format!(
                        "failed to read session key at {key_path}: {read_error}"
                    )));
                }
            }
        };

        let cookie_secure = env::var("SESSION_COOKIE_SECURE")
            .map(|value| value != "0")
            .unwrap_or(true);

        Ok(Self {
            key,
            cookie_secure,
            bind_addr,
            database_url,
        })
    }
}

fn parse_bind_addr(raw: &str) -> std::io::Result<SocketAddr> {
    raw.parse()
        .map_err(|err| std::io::Error::other(format!("invalid BIND_ADDR {raw:?}: {err}")))
}
