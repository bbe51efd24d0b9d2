// Token construction and RS256 signing

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, Header, encode};

use crate::error::IssuerError;
use crate::key_management::KeyStore;
use crate::types::Claims;

/// Lifetime of a token issued with the valid policy.
pub const VALID_TOKEN_LIFETIME: Duration = Duration::minutes(30);

/// How far in the past an expired token's `exp` is placed.
pub const EXPIRED_TOKEN_BACKDATE: Duration = Duration::hours(24);

/// Whether the issued token should already be expired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryPolicy {
    Valid,
    Expired,
}

impl ExpiryPolicy {
    pub fn from_flag(want_expired: bool) -> Self {
        if want_expired {
            Self::Expired
        } else {
            Self::Valid
        }
    }

    /// `exp` instant for a token issued at `now`.
    ///
    /// Independent of the signing key's own expiry.
    pub fn expiry(self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Self::Valid => now + VALID_TOKEN_LIFETIME,
            Self::Expired => now - EXPIRED_TOKEN_BACKDATE,
        }
    }
}

/// Fixed claim values stamped into every token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimsTemplate {
    pub subject: String,
    pub issuer: String,
    pub audience: String,
}

impl Default for ClaimsTemplate {
    fn default() -> Self {
        Self {
            subject: "test_user".to_string(),
            issuer: "jwks-server".to_string(),
            audience: "test-audience".to_string(),
        }
    }
}

/// Key identifiers used when the caller does not name one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KidDefaults {
    pub primary: String,
    pub expired: String,
}

impl Default for KidDefaults {
    fn default() -> Self {
        Self {
            primary: "key1".to_string(),
            expired: "expired_key".to_string(),
        }
    }
}

impl KidDefaults {
    /// An explicit `kid` always wins; otherwise the expired flag picks
    /// between the expired and the primary key.
    pub fn select<'a>(&'a self, requested: Option<&'a str>, want_expired: bool) -> &'a str {
        match requested {
            Some(kid) => kid,
            None if want_expired => &self.expired,
            None => &self.primary,
        }
    }
}

/// A signed token together with the claims it carries.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

/// Signs tokens with keys looked up from a shared [`KeyStore`].
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    store: Arc<KeyStore>,
    template: ClaimsTemplate,
}

impl TokenIssuer {
    pub fn new(store: Arc<KeyStore>, template: ClaimsTemplate) -> Self {
        Self { store, template }
    }

    pub fn store(&self) -> &KeyStore {
        &self.store
    }

    /// Issue a compact RS256 token signed by `kid`.
    pub fn issue(
        &self,
        kid: &str,
        want_expired: bool,
        now: DateTime<Utc>,
    ) -> Result<String, IssuerError> {
        self.issue_with_claims(kid, ExpiryPolicy::from_flag(want_expired), now)
            .map(|issued| issued.token)
    }

    /// Issue a token and hand back the claims that were signed.
    ///
    /// # Errors
    ///
    /// `KeyNotFound` when `kid` is not in the store; `Signing` if the key
    /// material cannot be turned into a signature.
    pub fn issue_with_claims(
        &self,
        kid: &str,
        policy: ExpiryPolicy,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, IssuerError> {
        let key = self
            .store
            .get(kid)
            .ok_or_else(|| IssuerError::key_not_found(kid))?;

        let claims = Claims {
            sub: self.template.subject.clone(),
            iss: self.template.issuer.clone(),
            aud: self.template.audience.clone(),
            iat: now.timestamp(),
            exp: policy.expiry(now).timestamp(),
        };

        // Header is exactly {alg, kid}.
        let mut header = Header::new(Algorithm::RS256);
        header.typ = None;
        header.kid = Some(key.kid().to_string());

        let encoding_key = key.encoding_key()?;
        let token = encode(&header, &claims, &encoding_key)?;

        tracing::debug!(
            kid,
            want_expired = policy == ExpiryPolicy::Expired,
            exp = claims.exp,
            "issued token"
        );
        Ok(IssuedToken { token, claims })
    }
}
