// Data structures for the JWKS issuer

use std::fmt;

use chrono::{DateTime, Utc};
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};

/// RSA key pair with its identifier and expiry instant.
///
/// The private half never leaves the crate; it is only read when a token
/// is signed.
#[derive(Clone)]
pub struct KeyMaterial {
    pub(crate) kid: String,
    pub(crate) private_key: RsaPrivateKey,
    pub(crate) public_key: RsaPublicKey,
    pub(crate) expires_at: DateTime<Utc>,
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("kid", &self.kid)
            .field("private_key", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// JSON Web Key structure for JWKS responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonWebKey {
    pub kid: String, // Key ID
    pub kty: String, // Key type (RSA)
    pub alg: String, // Algorithm (RS256)
    #[serde(rename = "use")]
    pub key_use: String, // Key usage (sig for signature)
    pub n: String,   // Modulus (base64url)
    pub e: String,   // Exponent (base64url)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>, // Key expiry (Unix seconds), full listings only
}

/// JWKS response format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwksResponse {
    pub keys: Vec<JsonWebKey>,
}

/// JWT Claims structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Subject
    pub iss: String, // Issuer
    pub aud: String, // Audience
    pub iat: i64,    // Issued at
    pub exp: i64,    // Expires at
}

/// Auth endpoint response
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
}

/// Error body returned by the service boundary
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Query parameters for the auth endpoint
#[derive(Debug, Default, Deserialize)]
pub struct AuthQuery {
    pub expired: Option<String>,
    pub kid: Option<String>,
}

impl AuthQuery {
    /// Only the literal `"true"` asks for an already-expired token.
    pub fn wants_expired(&self) -> bool {
        self.expired.as_deref() == Some("true")
    }
}
