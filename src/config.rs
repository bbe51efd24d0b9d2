// Runtime configuration from command line flags and environment

use chrono::Duration;
use clap::Parser;

use crate::error::IssuerError;
use crate::token::{ClaimsTemplate, KidDefaults};

/// JWKS issuer configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "jwks-issuer")]
#[command(about = "Publishes a JWKS and issues RS256 tokens, optionally already expired")]
#[command(version)]
pub struct Config {
    /// Address the HTTP server binds to
    #[arg(long, env = "JWKS_BIND", default_value = "0.0.0.0:8080")]
    pub bind: String,

    /// Log level used when RUST_LOG is not set
    #[arg(long, env = "JWKS_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// `iss` claim of issued tokens
    #[arg(long, env = "JWKS_ISSUER", default_value = "jwks-server")]
    pub issuer: String,

    /// `aud` claim of issued tokens
    #[arg(long, env = "JWKS_AUDIENCE", default_value = "test-audience")]
    pub audience: String,

    /// `sub` claim of issued tokens
    #[arg(long, env = "JWKS_SUBJECT", default_value = "test_user")]
    pub subject: String,

    /// Identifier of the long-lived signing key
    #[arg(long, env = "JWKS_PRIMARY_KID", default_value = "key1")]
    pub primary_kid: String,

    /// Identifier of the key generated already expired
    #[arg(long, env = "JWKS_EXPIRED_KID", default_value = "expired_key")]
    pub expired_kid: String,

    /// Validity of the primary key in days
    #[arg(long, env = "JWKS_KEY_VALIDITY_DAYS", default_value_t = 30)]
    pub key_validity_days: i64,
}

impl Default for Config {
    fn default() -> Self {
        let claims = ClaimsTemplate::default();
        let kids = KidDefaults::default();
        Self {
            bind: "0.0.0.0:8080".to_string(),
            log_level: "info".to_string(),
            issuer: claims.issuer,
            audience: claims.audience,
            subject: claims.subject,
            primary_kid: kids.primary,
            expired_kid: kids.expired,
            key_validity_days: 30,
        }
    }
}

impl Config {
    pub fn claims_template(&self) -> ClaimsTemplate {
        ClaimsTemplate {
            subject: self.subject.clone(),
            issuer: self.issuer.clone(),
            audience: self.audience.clone(),
        }
    }

    pub fn kid_defaults(&self) -> KidDefaults {
        KidDefaults {
            primary: self.primary_kid.clone(),
            expired: self.expired_kid.clone(),
        }
    }

    /// Validity of the primary key.
    ///
    /// # Errors
    ///
    /// `KeyGeneration` when the day count does not fit a `Duration`.
    pub fn key_validity(&self) -> Result<Duration, IssuerError> {
        let days = self.key_validity_days;
        Duration::try_days(days).ok_or_else(|| {
            IssuerError::key_generation(format!("key validity of {days} days is out of range"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let config = Config::parse_from([
            "jwks-issuer",
            "--bind",
            "127.0.0.1:9000",
            "--primary-kid",
            "main",
            "--key-validity-days",
            "7",
        ]);

        assert_eq!(config.bind, "127.0.0.1:9000");
        assert_eq!(config.kid_defaults().primary, "main");
        assert_eq!(config.key_validity().unwrap(), Duration::days(7));
    }

    #[test]
    fn test_default_matches_seed_values() {
        let config = Config::default();

        assert_eq!(config.claims_template(), ClaimsTemplate::default());
        assert_eq!(config.kid_defaults(), KidDefaults::default());
        assert_eq!(config.key_validity().unwrap(), Duration::days(30));
    }

    #[test]
    fn test_out_of_range_validity_is_an_error() {
        let args = ["jwks-issuer", "--key-validity-days", "200000000000000"];
        let config = Config::parse_from(args);

        let err = config.key_validity().unwrap_err();
        assert!(matches!(err, IssuerError::KeyGeneration { .. }));
        assert!(err.to_string().contains("200000000000000"));
    }
}
