use std::env;
use std::net::SocketAddr;

use anyhow::{Context, Result};
use zeroize::{Zeroize, Zeroizing};

/// Minimum length of the signing secret in bytes.
const MIN_SECRET_LEN: usize = 32;
/// Longest accepted session lifetime, one year.
const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;

/// Route protection settings consumed by the gatekeeper.
#[derive(Clone, Debug)]
pub struct RouteConfig {
    /// Requests whose path starts with this prefix require a session.
    pub protected_prefix: String,
    /// Where unauthenticated requests to protected routes are sent.
    pub sign_in_path: String,
    /// Path prefixes the gatekeeper never looks at (assets, JSON endpoints).
    pub public_prefixes: Vec<String>,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            protected_prefix: "/dashboard".to_string(),
            sign_in_path: "/sign-in".to_string(),
            public_prefixes: vec![
                "/api".to_string(),
                "/static".to_string(),
                "/favicon.ico".to_string(),
            ],
        }
    }
}

/// The application's configuration.
#[derive(Clone)]
pub struct Config {
    /// The URL of the PostgreSQL database.
    pub database_url: String,
    /// The address the HTTP server binds to.
    pub bind_addr: SocketAddr,
    /// The lifetime of a session in hours.
    pub session_ttl_hours: i64,
    /// The secret used to sign session tokens.
    pub auth_secret: Zeroizing<Vec<u8>>,
    /// Gatekeeper routing.
    pub routes: RouteConfig,
}

impl Config {
    /// Creates a new `Config` from environment variables.
    ///
    /// A missing or short `AUTH_SECRET` is fatal: nothing can sign or verify
    /// sessions without it.
    pub fn from_env() -> Result<Self> {
        let mut secret = env::var("AUTH_SECRET")
            .context("AUTH_SECRET must be set (generate with: openssl rand -hex 32)")?;

        if secret.len() < MIN_SECRET_LEN {
            secret.zeroize();
            anyhow::bail!("AUTH_SECRET must be at least {} bytes", MIN_SECRET_LEN);
        }

        let auth_secret = Zeroizing::new(secret.as_bytes().to_vec());
        secret.zeroize();

        let defaults = RouteConfig::default();
        let public_prefixes = match env::var("PUBLIC_PREFIXES") {
            Ok(raw) => parse_prefixes(&raw),
            Err(_) => defaults.public_prefixes,
        };

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            bind_addr: env::var("BIND_ADDR")
                .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
                .parse()
                .context("Invalid BIND_ADDR")?,
            session_ttl_hours: parse_session_ttl(
                &env::var("SESSION_TTL_HOURS").unwrap_or_else(|_| "24".to_string()),
            )?,
            auth_secret,
            routes: RouteConfig {
                protected_prefix: env::var("PROTECTED_PREFIX")
                    .unwrap_or(defaults.protected_prefix),
                sign_in_path: env::var("SIGN_IN_PATH").unwrap_or(defaults.sign_in_path),
                public_prefixes,
            },
        })
    }
}

fn parse_session_ttl(raw: &str) -> Result<i64> {
    let hours: i64 = raw.trim().parse().context("Invalid SESSION_TTL_HOURS")?;
    if !(1..=MAX_SESSION_TTL_HOURS).contains(&hours) {
        anyhow::bail!(
            "SESSION_TTL_HOURS must be between 1 and {}, got {}",
            MAX_SESSION_TTL_HOURS,
            hours
        );
    }
    Ok(hours)
}

fn parse_prefixes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_are_trimmed_and_blank_entries_dropped() {
        assert_eq!(
            parse_prefixes(" /api, /static ,,/favicon.ico"),
            vec!["/api", "/static", "/favicon.ico"]
        );
    }

    #[test]
    fn session_ttl_accepts_hours_within_a_year() {
        assert_eq!(parse_session_ttl("24").unwrap(), 24);
        assert_eq!(parse_session_ttl(" 1 ").unwrap(), 1);
        assert_eq!(parse_session_ttl("8760").unwrap(), MAX_SESSION_TTL_HOURS);
    }

    #[test]
    fn session_ttl_out_of_range_is_rejected() {
        for raw in ["0", "-1", "8761", "2000000000000", "soon"] {
            assert!(parse_session_ttl(raw).is_err(), "accepted {raw}");
        }
    }

    #[test]
    fn default_routes_protect_dashboard() {
        let routes = RouteConfig::default();
        assert_eq!(routes.protected_prefix, "/dashboard");
        assert_eq!(routes.sign_in_path, "/sign-in");
        assert!(routes.public_prefixes.iter().any(|p| p == "/api"));
    }
}
