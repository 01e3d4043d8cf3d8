//! A provider owns one key for one protocol and turns messages into tokens.
//!
//! A provider starts [`Uninitialized`](ProviderState::Uninitialized) and moves
//! to [`KeyReady`](ProviderState::KeyReady) exactly once, through
//! [`generate_key`](Provider::generate_key) or [`import_key`](Provider::import_key).
//! The key slot is a [`OnceLock`]: concurrent writers race, the first wins and
//! the rest observe [`PasetoError::ProviderState`]. After that every operation
//! only reads, so a provider can be shared freely across threads.

use std::sync::OnceLock;

use crate::PasetoError;
use crate::encodings::Payload;
use crate::key::{KeyHandle, KeyPair, KeyUsage, check_key_purpose};
use crate::pae::pae;
use crate::token::{self, TokenLayout, UnsealedToken};
use crate::validation::{
    Validate, footer_to_string, validate_claims, validate_footer, validate_header,
    validate_message,
};
use crate::version::{AlgorithmParams, Operation, Protocol, Purpose, Registry};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderState {
    Uninitialized,
    KeyReady,
}

/// Signs/verifies or encrypts/decrypts tokens for a single `(version, purpose)`.
pub struct Provider {
    protocol: Protocol,
    header: String,
    keys: OnceLock<KeyPair>,
}

impl Provider {
    pub fn new(protocol: Protocol) -> Self {
        Self {
            header: protocol.header(),
            protocol,
            keys: OnceLock::new(),
        }
    }

    /// Create a provider for the protocol registered under `version` and `purpose`.
    pub fn from_registry(
        registry: &Registry,
        version: &str,
        purpose: Purpose,
    ) -> Result<Self, PasetoError> {
        registry.lookup(version, purpose).map(Self::new)
    }

    pub fn protocol(&self) -> &Protocol {
        &self.protocol
    }

    /// `"{version}.{purpose}"`
    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn state(&self) -> ProviderState {
        match self.keys.get() {
            Some(_) => ProviderState::KeyReady,
            None => ProviderState::Uninitialized,
        }
    }

    /// Generate this provider's key.
    ///
    /// Fails with [`PasetoError::ProviderState`] if a key is already present,
    /// leaving that key untouched.
    #[tracing::instrument(level = "debug", skip_all, fields(header = %self.header))]
    pub fn generate_key(&self) -> Result<(), PasetoError> {
        if self.keys.get().is_some() {
            tracing::debug!("key already present");
            return Err(PasetoError::ProviderState);
        }
        let pair = self.protocol.engine.generate(&self.protocol.params)?;
        self.install(pair)
    }

    /// Load existing key material into this provider.
    ///
    /// The same one-shot rule as [`generate_key`](Self::generate_key) applies.
    #[tracing::instrument(level = "debug", skip_all, fields(header = %self.header, ?usage))]
    pub fn import_key(&self, usage: KeyUsage, bytes: &[u8]) -> Result<(), PasetoError> {
        if self.keys.get().is_some() {
            tracing::debug!("key already present");
            return Err(PasetoError::ProviderState);
        }
        let pair = self.protocol.engine.import(&self.protocol.params, usage, bytes)?;
        self.install(pair)
    }

    fn install(&self, pair: KeyPair) -> Result<(), PasetoError> {
        match self.keys.set(pair) {
            Ok(()) => {
                tracing::debug!("key installed");
                Ok(())
            }
            Err(_) => {
                tracing::debug!("lost race to install key");
                Err(PasetoError::ProviderState)
            }
        }
    }

    /// Export the verification key, so that another provider can import it.
    pub fn export_public_key(&self) -> Result<Box<[u8]>, PasetoError> {
        let key = self
            .keys
            .get()
            .and_then(KeyPair::public)
            .ok_or(PasetoError::KeyPurpose)?;
        self.protocol.engine.export(key)
    }

    fn key_for(&self, op: Operation) -> Result<&KeyHandle, PasetoError> {
        if !self.protocol.capabilities.allows(op) {
            return Err(PasetoError::Unsupported);
        }
        let key = self.keys.get().and_then(|pair| pair.for_operation(op));
        check_key_purpose(op, key, self.protocol.params.algorithm())
    }

    fn layout(&self) -> TokenLayout<'_> {
        TokenLayout {
            version: self.protocol.version,
            purpose: self.protocol.purpose.as_str(),
            signature_len: self.protocol.params.trailer_len(),
        }
    }

    /// Sign `message` into a token, attaching `footer` unencrypted.
    #[tracing::instrument(level = "trace", skip_all, fields(header = %self.header))]
    pub fn sign<M: Payload>(&self, message: &M, footer: &str) -> Result<String, PasetoError> {
        let key = self.key_for(Operation::Sign)?;
        let m = validate_message(message)?;
        let f = validate_footer(footer);
        let h = &self.header;

        let pae = pae(&[h.as_bytes(), &m, f]);
        let signature = self.protocol.engine.sign(key, &pae)?;
        if signature.len() != self.protocol.params.trailer_len() {
            return Err(PasetoError::Crypto);
        }

        Ok(token::pack(h, &m, &signature, f))
    }

    /// Verify a signed token and decode its message.
    #[tracing::instrument(level = "trace", skip_all, fields(header = %self.header))]
    pub fn verify<M: Payload>(&self, raw: &str) -> Result<UnsealedToken<M>, PasetoError> {
        let key = self.key_for(Operation::Verify)?;
        let parsed = token::parse(raw, &self.layout())?;
        let h = validate_header(
            self.protocol.version,
            self.protocol.purpose.as_str(),
            parsed.version,
            parsed.purpose,
        )?;

        let pae = pae(&[h.as_bytes(), &parsed.payload, &parsed.footer]);
        if let Err(err) = self.protocol.engine.verify(key, &pae, &parsed.signature) {
            tracing::debug!("token verification failed");
            return Err(match err {
                PasetoError::KeyPurpose => PasetoError::KeyPurpose,
                _ => PasetoError::Verification,
            });
        }

        Ok(UnsealedToken {
            message: validate_claims(&parsed.payload)?,
            footer: footer_to_string(parsed.footer)?,
        })
    }

    /// [`verify`](Self::verify), then check the claims against `validation`.
    pub fn verify_with<M: Payload>(
        &self,
        raw: &str,
        validation: &impl Validate<Claims = M>,
    ) -> Result<UnsealedToken<M>, PasetoError> {
        let token = self.verify(raw)?;
        validation.validate(&token.message)?;
        Ok(token)
    }

    /// Encrypt `message` into a token, attaching `footer` unencrypted.
    #[tracing::instrument(level = "trace", skip_all, fields(header = %self.header))]
    pub fn encrypt<M: Payload>(&self, message: &M, footer: &str) -> Result<String, PasetoError> {
        let key = self.key_for(Operation::Encrypt)?;
        let m = validate_message(message)?;
        let f = validate_footer(footer);

        let mut body = self.protocol.engine.encrypt(key, &self.header, &m, f)?;
        let tag_at = body
            .len()
            .checked_sub(self.protocol.params.trailer_len())
            .ok_or(PasetoError::Crypto)?;
        let tag = body.split_off(tag_at);

        Ok(token::pack(&self.header, &body, &tag, f))
    }

    /// Decrypt a local token and decode its message.
    #[tracing::instrument(level = "trace", skip_all, fields(header = %self.header))]
    pub fn decrypt<M: Payload>(&self, raw: &str) -> Result<UnsealedToken<M>, PasetoError> {
        let key = self.key_for(Operation::Decrypt)?;
        let parsed = token::parse(raw, &self.layout())?;
        let h = validate_header(
            self.protocol.version,
            self.protocol.purpose.as_str(),
            parsed.version,
            parsed.purpose,
        )?;

        if let AlgorithmParams::AesCtrHmac { nonce_len, .. } = self.protocol.params
            && parsed.payload.len() < nonce_len
        {
            return Err(PasetoError::MalformedToken);
        }

        let plaintext = self
            .protocol
            .engine
            .decrypt(key, &h, &parsed.payload, &parsed.signature, &parsed.footer)
            .map_err(|err| {
                tracing::debug!("token decryption failed");
                match err {
                    PasetoError::KeyPurpose => PasetoError::KeyPurpose,
                    _ => PasetoError::Verification,
                }
            })?;

        Ok(UnsealedToken {
            message: validate_claims(&plaintext)?,
            footer: footer_to_string(parsed.footer)?,
        })
    }

    /// [`decrypt`](Self::decrypt), then check the claims against `validation`.
    pub fn decrypt_with<M: Payload>(
        &self,
        raw: &str,
        validation: &impl Validate<Claims = M>,
    ) -> Result<UnsealedToken<M>, PasetoError> {
        let token = self.decrypt(raw)?;
        validation.validate(&token.message)?;
        Ok(token)
    }
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("header", &self.header)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;
    use std::sync::atomic::{AtomicU64, Ordering};

    use super::*;
    use crate::version::{Algorithm, Capabilities, Engine};

    /// Bytes that must at least be braced like a JSON object.
    #[derive(Debug, PartialEq)]
    struct Object(Vec<u8>);

    impl Object {
        fn check(bytes: &[u8]) -> Result<(), Box<dyn Error + Send + Sync>> {
            match bytes {
                [b'{', .., b'}'] => Ok(()),
                _ => Err("not an object".into()),
            }
        }
    }

    impl Payload for Object {
        fn encode(&self, out: &mut Vec<u8>) -> Result<(), Box<dyn Error + Send + Sync>> {
            Self::check(&self.0)?;
            out.extend_from_slice(&self.0);
            Ok(())
        }

        fn decode(payload: &[u8]) -> Result<Self, Box<dyn Error + Send + Sync>> {
            Self::check(payload)?;
            Ok(Object(payload.to_vec()))
        }
    }

    fn hello() -> Object {
        Object(br#"{"hello":1}"#.to_vec())
    }

    /// Not a signature scheme: FNV-1a keyed by a shared secret.
    struct Fnv;

    static NEXT_KEY: AtomicU64 = AtomicU64::new(1);

    fn tag(secret: u64, message: &[u8]) -> [u8; 8] {
        let mut h = 0xcbf29ce484222325u64 ^ secret;
        for b in message {
            h ^= *b as u64;
            h = h.wrapping_mul(0x100000001b3);
        }
        h.to_le_bytes()
    }

    impl Engine for Fnv {
        fn generate(&self, _: &AlgorithmParams) -> Result<KeyPair, PasetoError> {
            let secret = NEXT_KEY.fetch_add(1, Ordering::Relaxed);
            Ok(KeyPair::Asymmetric {
                secret: Some(KeyHandle::new(KeyUsage::Sign, Algorithm::RsaPssSha384, secret)),
                public: KeyHandle::new(KeyUsage::Verify, Algorithm::RsaPssSha384, secret),
            })
        }

        fn import(
            &self,
            _: &AlgorithmParams,
            usage: KeyUsage,
            bytes: &[u8],
        ) -> Result<KeyPair, PasetoError> {
            let bytes = bytes.try_into().map_err(|_| PasetoError::InvalidKey)?;
            let secret = u64::from_le_bytes(bytes);
            let public = KeyHandle::new(KeyUsage::Verify, Algorithm::RsaPssSha384, secret);
            match usage {
                KeyUsage::Verify => Ok(KeyPair::Asymmetric {
                    secret: None,
                    public,
                }),
                KeyUsage::Sign => Ok(KeyPair::Asymmetric {
                    secret: Some(KeyHandle::new(KeyUsage::Sign, Algorithm::RsaPssSha384, secret)),
                    public,
                }),
                KeyUsage::Local => Err(PasetoError::KeyPurpose),
            }
        }

        fn export(&self, key: &KeyHandle) -> Result<Box<[u8]>, PasetoError> {
            Ok(Box::new(key.material::<u64>()?.to_le_bytes()))
        }

        fn sign(&self, key: &KeyHandle, message: &[u8]) -> Result<Vec<u8>, PasetoError> {
            Ok(tag(*key.material::<u64>()?, message).to_vec())
        }

        fn verify(
            &self,
            key: &KeyHandle,
            message: &[u8],
            signature: &[u8],
        ) -> Result<(), PasetoError> {
            if tag(*key.material::<u64>()?, message) == signature {
                Ok(())
            } else {
                Err(PasetoError::Verification)
            }
        }
    }

    const FAKE: Protocol = Protocol {
        version: "v1",
        purpose: Purpose::Public,
        params: AlgorithmParams::RsaPss {
            modulus_bits: 64,
            salt_len: 0,
            signature_len: 8,
        },
        capabilities: Capabilities::PUBLIC,
        engine: &Fnv,
    };

    fn ready() -> Provider {
        let provider = Provider::new(FAKE);
        provider.generate_key().unwrap();
        provider
    }

    #[test]
    fn state_machine() {
        let provider = Provider::new(FAKE);
        assert_eq!(provider.state(), ProviderState::Uninitialized);
        assert_eq!(
            provider.sign(&Object(b"{}".to_vec()), "").unwrap_err(),
            PasetoError::KeyPurpose
        );

        provider.generate_key().unwrap();
        assert_eq!(provider.state(), ProviderState::KeyReady);

        let before = provider.export_public_key().unwrap();
        assert_eq!(provider.generate_key(), Err(PasetoError::ProviderState));
        assert_eq!(
            provider.import_key(KeyUsage::Sign, &[0; 8]),
            Err(PasetoError::ProviderState)
        );
        assert_eq!(provider.export_public_key().unwrap(), before);
        assert_eq!(provider.state(), ProviderState::KeyReady);
    }

    #[test]
    fn concurrent_generation_has_one_winner() {
        let provider = Provider::new(FAKE);
        let results: Vec<_> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8).map(|_| s.spawn(|| provider.generate_key())).collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(
            results
                .iter()
                .filter_map(|r| r.err())
                .all(|e| e == PasetoError::ProviderState)
        );
    }

    #[test]
    fn sign_then_verify() {
        let provider = ready();
        let token = provider.sign(&hello(), "kid").unwrap();
        assert!(token.starts_with("v1.public."));

        let opened: UnsealedToken<Object> = provider.verify(&token).unwrap();
        assert_eq!(opened.message, hello());
        assert_eq!(opened.footer, "kid");
    }

    #[test]
    fn messages_must_be_objects() {
        let provider = ready();
        for message in [&b"42"[..], b"[1]", b"\"{}\"", b""] {
            assert_eq!(
                provider.sign(&Object(message.to_vec()), "").unwrap_err(),
                PasetoError::InvalidMessage
            );
        }
    }

    #[test]
    fn authenticated_non_object_is_a_claims_error() {
        let provider = ready();
        let KeyPair::Asymmetric {
            secret: Some(secret),
            ..
        } = provider.keys.get().unwrap()
        else {
            panic!("expected a signing key");
        };

        let payload: &[u8] = b"[1,2,3]";
        let signature = Fnv.sign(secret, &pae(&[&b"v1.public"[..], payload, b""])).unwrap();
        let token = token::pack("v1.public", payload, &signature, b"");
        assert_eq!(
            provider.verify::<Object>(&token).unwrap_err(),
            PasetoError::Claims
        );
    }

    #[test]
    fn signature_binds_the_footer() {
        let provider = ready();
        let token = provider.sign(&hello(), "kid").unwrap();
        let (body, _) = token.rsplit_once('.').unwrap();
        let forged = format!("{body}.{}", crate::base64::encode(b"kie"));
        assert_eq!(
            provider.verify::<Object>(&forged).unwrap_err(),
            PasetoError::Verification
        );

        // dropping the footer entirely
        assert_eq!(
            provider.verify::<Object>(body).unwrap_err(),
            PasetoError::Verification
        );
    }

    #[test]
    fn keys_from_another_provider_fail_verification() {
        let a = ready();
        let b = ready();
        let token = a.sign(&hello(), "").unwrap();
        assert_eq!(
            b.verify::<Object>(&token).unwrap_err(),
            PasetoError::Verification
        );
    }

    #[test]
    fn verify_only_provider() {
        let signer = ready();
        let verifier = Provider::new(FAKE);
        verifier
            .import_key(KeyUsage::Verify, &signer.export_public_key().unwrap())
            .unwrap();

        let token = signer.sign(&hello(), "").unwrap();
        assert!(verifier.verify::<Object>(&token).is_ok());
        assert_eq!(
            verifier.sign(&hello(), "").unwrap_err(),
            PasetoError::KeyPurpose
        );
    }

    #[test]
    fn header_gate_runs_before_crypto() {
        let provider = ready();
        let other = Provider::new(Protocol {
            version: "v2",
            ..FAKE
        });
        other.generate_key().unwrap();

        let token = provider.sign(&hello(), "").unwrap();
        assert_eq!(
            other.verify::<Object>(&token).unwrap_err(),
            PasetoError::HeaderMismatch
        );
    }

    #[test]
    fn capabilities_are_enforced() {
        let provider = ready();
        assert_eq!(
            provider.encrypt(&hello(), "").unwrap_err(),
            PasetoError::Unsupported
        );
        assert_eq!(
            provider.decrypt::<Object>("v1.public.AAAA").unwrap_err(),
            PasetoError::Unsupported
        );
    }

    #[test]
    fn registry_lookup() {
        let registry = Registry::new().with(FAKE);
        let provider = Provider::from_registry(&registry, "v1", Purpose::Public).unwrap();
        assert_eq!(provider.header(), "v1.public");
        assert_eq!(
            Provider::from_registry(&registry, "v1", Purpose::Local).unwrap_err(),
            PasetoError::UnknownProtocol
        );
        assert_eq!(
            Provider::from_registry(&registry, "v3", Purpose::Public).unwrap_err(),
            PasetoError::UnknownProtocol
        );
    }
}
