// Key generation and the in-memory key store

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey};
use rand::rngs::OsRng;
use rsa::pkcs8::EncodePrivateKey;
use rsa::{BigUint, RsaPrivateKey, RsaPublicKey};

use crate::error::IssuerError;
use crate::jwk;
use crate::types::KeyMaterial;

/// Modulus size of every generated key.
pub const KEY_BITS: usize = 2048;

/// Public exponent of every generated key (F4).
pub const PUBLIC_EXPONENT: u32 = 65537;

impl KeyMaterial {
    /// Generate a new RSA key pair that expires `validity` from now.
    ///
    /// A negative `validity` yields a key that is already expired.
    ///
    /// # Errors
    ///
    /// `KeyGeneration` if the expiry falls outside the representable date
    /// range or the RSA key pair cannot be generated.
    pub fn generate(kid: impl Into<String>, validity: Duration) -> Result<Self, IssuerError> {
        let Some(expires_at) = Utc::now().checked_add_signed(validity) else {
            let message = format!("key validity {validity} is out of range");
            return Err(IssuerError::key_generation(message));
        };

        let mut rng = OsRng;
        let exponent = BigUint::from(PUBLIC_EXPONENT);
        let private_key = RsaPrivateKey::new_with_exp(&mut rng, KEY_BITS, &exponent)?;

        Ok(Self::new(kid, private_key, expires_at))
    }

    /// Wrap an existing private key; the public half is derived from it.
    pub fn new(
        kid: impl Into<String>,
        private_key: RsaPrivateKey,
        expires_at: DateTime<Utc>,
    ) -> Self {
        let public_key = RsaPublicKey::from(&private_key);
        KeyMaterial {
            kid: kid.into(),
            private_key,
            public_key,
            expires_at,
        }
    }

    pub fn kid(&self) -> &str {
        &self.kid
    }

    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// A key is active strictly before its expiry instant.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_active_at(now)
    }

    /// Signing key for `jsonwebtoken`, rebuilt from the private key on demand.
    pub(crate) fn encoding_key(&self) -> Result<EncodingKey, IssuerError> {
        let pem = self.private_key.to_pkcs8_pem(rsa::pkcs8::LineEnding::LF)?;
        Ok(EncodingKey::from_rsa_pem(pem.as_bytes())?)
    }

    /// Verification key built from the same `n`/`e` that the JWKS publishes.
    pub fn decoding_key(&self) -> Result<DecodingKey, IssuerError> {
        let jwk = jwk::encode(self, false);
        Ok(DecodingKey::from_rsa_components(&jwk.n, &jwk.e)?)
    }
}

/// In-memory set of signing keys indexed by `kid`.
///
/// Populated once at startup and read-only afterwards, so it can be shared
/// behind an `Arc` without locking.
#[derive(Debug, Default)]
pub struct KeyStore {
    keys: BTreeMap<String, KeyMaterial>,
}

impl KeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the startup key set: one long-lived primary key and one that
    /// expired a day ago.
    pub fn seed(
        primary_kid: &str,
        expired_kid: &str,
        validity: Duration,
    ) -> Result<Self, IssuerError> {
        let mut store = Self::new();
        store.generate(primary_kid, validity)?;
        store.generate(expired_kid, Duration::days(-1))?;
        Ok(store)
    }

    /// Generate a fresh key pair under `kid`, replacing any previous entry.
    pub fn generate(&mut self, kid: &str, validity: Duration) -> Result<(), IssuerError> {
        let key = KeyMaterial::generate(kid, validity)?;
        if self.contains(kid) {
            tracing::warn!(kid, "replacing existing signing key");
        }
        tracing::info!(
            kid,
            expires_at = %key.expires_at,
            expired = key.is_expired_at(Utc::now()),
            "generated signing key"
        );
        self.insert(key);
        Ok(())
    }

    /// Store `key` under its own `kid`, replacing any previous entry.
    pub fn insert(&mut self, key: KeyMaterial) {
        self.keys.insert(key.kid.clone(), key);
    }

    /// Exact-match lookup.
    pub fn get(&self, kid: &str) -> Option<&KeyMaterial> {
        self.keys.get(kid)
    }

    pub fn contains(&self, kid: &str) -> bool {
        self.keys.contains_key(kid)
    }

    /// Keys whose expiry is still in the future, ordered by `kid`.
    pub fn active_keys(&self, now: DateTime<Utc>) -> Vec<&KeyMaterial> {
        self.keys
            .values()
            .filter(|key| key.is_active_at(now))
            .collect()
    }

    /// Every key regardless of expiry, ordered by `kid`.
    pub fn all_keys(&self) -> Vec<&KeyMaterial> {
        self.keys.values().collect()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rsa::traits::PublicKeyParts;
    use std::sync::LazyLock;

    /// One private key shared by the unit tests; generating 2048-bit keys is slow.
    pub(crate) static TEST_PRIVATE_KEY: LazyLock<RsaPrivateKey> = LazyLock::new(|| {
        let exponent = BigUint::from(PUBLIC_EXPONENT);
        RsaPrivateKey::new_with_exp(&mut OsRng, KEY_BITS, &exponent)
            .expect("key generation failed")
    });

    pub(crate) fn test_key(kid: &str, expires_at: DateTime<Utc>) -> KeyMaterial {
        KeyMaterial::new(kid, TEST_PRIVATE_KEY.clone(), expires_at)
    }

    #[test]
    fn test_generate_key_parameters() {
        let key = KeyMaterial::generate("fresh", Duration::days(30)).expect("generate failed");

        assert_eq!(key.kid(), "fresh");
        assert_eq!(key.public_key().size() * 8, KEY_BITS);
        assert_eq!(key.public_key().e(), &BigUint::from(PUBLIC_EXPONENT));
        assert_eq!(key.public_key(), &RsaPublicKey::from(&key.private_key));
        assert!(key.is_active_at(Utc::now()));
    }

    #[test]
    fn test_out_of_range_validity_is_an_error() {
        let err = KeyMaterial::generate("far", Duration::days(100_000_000)).unwrap_err();
        assert!(matches!(err, IssuerError::KeyGeneration { .. }));

        let mut store = KeyStore::new();
        assert!(store.generate("far", Duration::days(-100_000_000)).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_generate_twice_replaces_entry() {
        let now = Utc::now();
        let mut store = KeyStore::new();
        store.generate("rotating", Duration::days(-1)).unwrap();
        let first_modulus = store.get("rotating").unwrap().public_key().n().clone();

        store.generate("rotating", Duration::days(30)).unwrap();

        assert_eq!(store.len(), 1);
        let key = store.get("rotating").unwrap();
        assert!(key.expires_at() > now + Duration::days(29));
        assert!(key.is_active_at(now));
        assert_ne!(key.public_key().n(), &first_modulus);
    }

    #[test]
    fn test_negative_validity_is_already_expired() {
        let now = Utc::now();
        let key = test_key("old", now - Duration::days(1));
        assert!(key.is_expired_at(now));
        assert!(!key.is_active_at(now));
    }

    #[test]
    fn test_expiry_boundary_is_exclusive() {
        let now = Utc::now();
        let key = test_key("edge", now);
        assert!(!key.is_active_at(now));
        assert!(key.is_active_at(now - Duration::seconds(1)));
    }

    #[test]
    fn test_debug_redacts_private_key() {
        let key = test_key("secret", Utc::now());
        let rendered = format!("{key:?}");
        assert!(rendered.contains("secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_empty_store_yields_empty_sequences() {
        let store = KeyStore::new();
        assert!(store.is_empty());
        assert!(store.active_keys(Utc::now()).is_empty());
        assert!(store.all_keys().is_empty());
        assert!(store.get("key1").is_none());
    }

    #[test]
    fn test_active_keys_is_subset_of_all_keys() {
        let now = Utc::now();
        let mut store = KeyStore::new();
        store.insert(test_key("a", now + Duration::hours(1)));
        store.insert(test_key("b", now - Duration::hours(1)));
        store.insert(test_key("c", now + Duration::days(30)));

        let active: Vec<&str> = store.active_keys(now).iter().map(|k| k.kid()).collect();
        let all: Vec<&str> = store.all_keys().iter().map(|k| k.kid()).collect();

        assert_eq!(active, vec!["a", "c"]);
        assert_eq!(all, vec!["a", "b", "c"]);

        // Far enough in the future everything has lapsed.
        assert!(store.active_keys(now + Duration::days(365)).is_empty());
        assert_eq!(store.all_keys().len(), 3);
    }

    #[test]
    fn test_insert_overwrites_same_kid() {
        let now = Utc::now();
        let mut store = KeyStore::new();
        store.insert(test_key("dup", now - Duration::days(1)));
        store.insert(test_key("dup", now + Duration::days(1)));

        assert_eq!(store.len(), 1);
        assert!(store.get("dup").unwrap().is_active_at(now));
    }

    #[test]
    fn test_get_is_exact_match() {
        let mut store = KeyStore::new();
        store.insert(test_key("key1", Utc::now()));

        assert!(store.contains("key1"));
        assert!(store.get("KEY1").is_none());
        assert!(store.get("key").is_none());
        assert!(store.get("key1 ").is_none());
    }

    #[test]
    fn test_entries_keyed_by_their_own_kid() {
        let mut store = KeyStore::new();
        store.insert(test_key("x", Utc::now()));
        store.insert(test_key("y", Utc::now()));

        for (kid, key) in &store.keys {
            assert_eq!(kid, key.kid());
        }
    }
}
