// Error taxonomy for key management and token issuance

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::types::ErrorResponse;

/// Errors raised by the key store and the token issuer.
#[derive(Debug, thiserror::Error)]
pub enum IssuerError {
    /// No key with the requested identifier exists in the store.
    #[error("Key with kid '{kid}' not found")]
    KeyNotFound {
        /// The identifier that was looked up.
        kid: String,
    },

    /// RSA key pair generation failed.
    #[error("Key generation error: {message}")]
    KeyGeneration {
        /// Description of the generation failure.
        message: String,
    },

    /// Signing a token with stored key material failed.
    #[error("Signing error: {message}")]
    Signing {
        /// Description of the signing failure.
        message: String,
    },
}

impl IssuerError {
    /// Creates a new `KeyNotFound` error.
    #[must_use]
    pub fn key_not_found(kid: impl Into<String>) -> Self {
        Self::KeyNotFound { kid: kid.into() }
    }

    /// Creates a new `KeyGeneration` error.
    #[must_use]
    pub fn key_generation(message: impl Into<String>) -> Self {
        Self::KeyGeneration {
            message: message.into(),
        }
    }

    /// Creates a new `Signing` error.
    #[must_use]
    pub fn signing(message: impl Into<String>) -> Self {
        Self::Signing {
            message: message.into(),
        }
    }

    /// Returns `true` when the caller asked for a key that does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::KeyNotFound { .. })
    }

    /// HTTP status used when this error crosses the service boundary.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::KeyNotFound { .. } => StatusCode::NOT_FOUND,
            Self::KeyGeneration { .. } | Self::Signing { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<rsa::Error> for IssuerError {
    fn from(err: rsa::Error) -> Self {
        Self::key_generation(err.to_string())
    }
}

impl From<rsa::pkcs8::Error> for IssuerError {
    fn from(err: rsa::pkcs8::Error) -> Self {
        Self::signing(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for IssuerError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::signing(err.to_string())
    }
}

impl IntoResponse for IssuerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if self.is_not_found() {
            tracing::warn!(error = %self, "token request rejected");
        } else {
            tracing::error!(error = %self, "token issuance failed");
        }

        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
