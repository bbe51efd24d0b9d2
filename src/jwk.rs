// Public key to JWK conversion

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rsa::BigUint;
use rsa::traits::PublicKeyParts;

use crate::types::{JsonWebKey, JwksResponse, KeyMaterial};

/// Encode a non-negative integer as unpadded base64url over its minimal
/// big-endian bytes (RFC 7518 `Base64urlUInt`).
pub fn int_to_base64url(value: &BigUint) -> String {
    let mut bytes = value.to_bytes_be();
    if bytes.is_empty() {
        bytes.push(0);
    }
    URL_SAFE_NO_PAD.encode(&bytes)
}

/// Convert the public half of `key` into a JWK.
///
/// `include_expiry` adds the key's expiry as `exp`; active-key discovery
/// leaves it out, full listings carry it.
pub fn encode(key: &KeyMaterial, include_expiry: bool) -> JsonWebKey {
    JsonWebKey {
        kid: key.kid().to_string(),
        kty: "RSA".to_string(),
        alg: "RS256".to_string(),
        key_use: "sig".to_string(),
        n: int_to_base64url(key.public_key().n()),
        e: int_to_base64url(key.public_key().e()),
        exp: include_expiry.then(|| key.expires_at().timestamp()),
    }
}

/// Encode a sequence of keys into a JWKS document.
pub fn key_set<'a>(
    keys: impl IntoIterator<Item = &'a KeyMaterial>,
    include_expiry: bool,
) -> JwksResponse {
    JwksResponse {
        keys: keys
            .into_iter()
            .map(|key| encode(key, include_expiry))
            .collect(),
    }
}
