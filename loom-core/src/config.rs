//! Environment-driven configuration (§6, SPEC_FULL §10.3).
//!
//! Deliberately flat: this system has no config-file/profile layering to
//! replicate, since the Non-goals of §1 rule out persistence/auth
//! surfaces that would need it.

use std::time::Duration;

use crate::error::LoomError;

pub const ENV_REDIS_URL: &str = "REDIS_STATE_STORE_URL";
pub const ENV_SESSION_TTL_HOURS: &str = "SESSION_TTL_HOURS";
pub const ENV_CONTEXT_LIMIT: &str = "CONTEXT_LIMIT";
pub const ENV_MAX_VERSIONS_PER_SESSION: &str = "MAX_VERSIONS_PER_SESSION";
pub const ENV_COMPRESSION_KEEP_RECENT: &str = "COMPRESSION_KEEP_RECENT";
pub const ENV_CONFIDENCE_THRESHOLD: &str = "CONFIDENCE_THRESHOLD";
pub const ENV_GENERATOR_TIMEOUT_SECONDS: &str = "GENERATOR_TIMEOUT_SECONDS";
pub const ENV_HOST: &str = "LOOM_HOST";
pub const ENV_PORT: &str = "LOOM_PORT";

/// Process-wide settings, built once at startup (§9 re-architecture note:
/// composition root, not lazy singletons).
#[derive(Debug, Clone)]
pub struct Settings {
    pub redis_url: String,
    pub session_ttl: Duration,
    pub context_limit: usize,
    pub max_versions_per_session: usize,
    pub compression_keep_recent: usize,
    pub confidence_threshold: f64,
    pub generator_timeout: Duration,
    pub host: String,
    pub port: u16,
}

impl Settings {
    /// Reads configuration from the process environment, applying the
    /// defaults in §6 for everything but `REDIS_STATE_STORE_URL`.
    pub fn from_env() -> Result<Self, LoomError> {
        let redis_url = std::env::var(ENV_REDIS_URL).map_err(|_| {
            LoomError::config(format!("{ENV_REDIS_URL} is required but not set"))
        })?;

        let session_ttl_hours = parse_env_or(ENV_SESSION_TTL_HOURS, 24u64)?;
        let context_limit = parse_env_or(ENV_CONTEXT_LIMIT, 10usize)?;
        let max_versions_per_session = parse_env_or(ENV_MAX_VERSIONS_PER_SESSION, 50usize)?;
        let compression_keep_recent = parse_env_or(ENV_COMPRESSION_KEEP_RECENT, 10usize)?;
        let confidence_threshold = parse_env_or(ENV_CONFIDENCE_THRESHOLD, 0.7f64)?;
        let generator_timeout_seconds = parse_env_or(ENV_GENERATOR_TIMEOUT_SECONDS, 180u64)?;
        let host = std::env::var(ENV_HOST).unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = parse_env_or(ENV_PORT, 8080u16)?;

        Ok(Self {
            redis_url,
            session_ttl: Duration::from_secs(session_ttl_hours * 3600),
            context_limit,
            max_versions_per_session,
            compression_keep_recent,
            confidence_threshold,
            generator_timeout: Duration::from_secs(generator_timeout_seconds),
            host,
            port,
        })
    }
}

fn parse_env_or<T>(key: &str, default: T) -> Result<T, LoomError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| LoomError::config(format!("{key}={raw:?} is invalid: {e}"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn missing_redis_url_is_a_config_error() {
        std::env::remove_var(ENV_REDIS_URL);
        let result = Settings::from_env();
        assert!(result.is_err());
    }

    #[test]
    #[serial]
    fn defaults_match_spec() {
        std::env::set_var(ENV_REDIS_URL, "redis://localhost:6379");
        for key in [
            ENV_SESSION_TTL_HOURS,
            ENV_CONTEXT_LIMIT,
            ENV_MAX_VERSIONS_PER_SESSION,
            ENV_COMPRESSION_KEEP_RECENT,
            ENV_CONFIDENCE_THRESHOLD,
            ENV_GENERATOR_TIMEOUT_SECONDS,
            ENV_HOST,
            ENV_PORT,
        ] {
            std::env::remove_var(key);
        }

        let settings = Settings::from_env().unwrap();
        assert_eq!(settings.session_ttl, Duration::from_secs(24 * 3600));
        assert_eq!(settings.context_limit, 10);
        assert_eq!(settings.max_versions_per_session, 50);
        assert_eq!(settings.compression_keep_recent, 10);
        assert_eq!(settings.confidence_threshold, 0.7);
        assert_eq!(settings.generator_timeout, Duration::from_secs(180));
        std::env::remove_var(ENV_REDIS_URL);
    }
}
