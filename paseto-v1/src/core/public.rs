use paseto_core::PasetoError;
use paseto_core::key::{KeyHandle, KeyPair, KeyUsage};
use paseto_core::version::{Algorithm, AlgorithmParams, Engine};
use rsa::pss::Signature;
use rsa::rand_core::OsRng;
use rsa::traits::PublicKeyParts;

pub const PARAMS: AlgorithmParams = AlgorithmParams::RsaPss {
    modulus_bits: 2048,
    salt_len: 48,
    signature_len: 256,
};

#[derive(Clone)]
pub struct SecretKey(rsa::pss::SigningKey<sha2::Sha384>);

#[derive(Clone)]
pub struct PublicKey(rsa::pss::VerifyingKey<sha2::Sha384>);

/// RSASSA-PSS with SHA-384 and MGF1-SHA-384.
pub struct RsaPss;

fn rsa_params(params: &AlgorithmParams) -> Result<(usize, usize), PasetoError> {
    match *params {
        AlgorithmParams::RsaPss {
            modulus_bits,
            salt_len,
            ..
        } => Ok((modulus_bits, salt_len)),
        AlgorithmParams::AesCtrHmac { .. } => Err(PasetoError::Unsupported),
    }
}

impl SecretKey {
    fn new(key: rsa::RsaPrivateKey, salt_len: usize) -> Self {
        Self(rsa::pss::SigningKey::new_with_salt_len(key, salt_len))
    }

    fn public_key(&self, salt_len: usize) -> PublicKey {
        let key: &rsa::RsaPrivateKey = self.0.as_ref();
        PublicKey::new(key.to_public_key(), salt_len)
    }

    fn decode(bytes: &[u8], modulus_bits: usize, salt_len: usize) -> Result<Self, PasetoError> {
        use rsa::pkcs1::DecodeRsaPrivateKey;

        let key = if let Ok(key) = rsa::RsaPrivateKey::from_pkcs1_der(bytes) {
            key
        } else {
            let s = str::from_utf8(bytes).map_err(|_| PasetoError::InvalidKey)?;
            rsa::RsaPrivateKey::from_pkcs1_pem(s).map_err(|_| PasetoError::InvalidKey)?
        };

        if key.n().bits() != modulus_bits {
            return Err(PasetoError::InvalidKey);
        }

        Ok(Self::new(key, salt_len))
    }

    fn encode(&self) -> Result<Box<[u8]>, PasetoError> {
        use rsa::pkcs1::EncodeRsaPrivateKey;

        let key: &rsa::RsaPrivateKey = self.0.as_ref();
        key.to_pkcs1_der()
            .map(|der| der.as_bytes().into())
            .map_err(|_| PasetoError::InvalidKey)
    }
}

impl PublicKey {
    fn new(key: rsa::RsaPublicKey, salt_len: usize) -> Self {
        Self(rsa::pss::VerifyingKey::new_with_salt_len(key, salt_len))
    }

    fn decode(bytes: &[u8], modulus_bits: usize, salt_len: usize) -> Result<Self, PasetoError> {
        use rsa::pkcs8::DecodePublicKey;

        let key = if let Ok(key) = rsa::RsaPublicKey::from_public_key_der(bytes) {
            key
        } else {
            let s = str::from_utf8(bytes).map_err(|_| PasetoError::InvalidKey)?;
            rsa::RsaPublicKey::from_public_key_pem(s).map_err(|_| PasetoError::InvalidKey)?
        };

        if key.n().bits() != modulus_bits {
            return Err(PasetoError::InvalidKey);
        }

        Ok(Self::new(key, salt_len))
    }

    fn encode(&self) -> Result<Box<[u8]>, PasetoError> {
        use rsa::pkcs8::EncodePublicKey;

        let key: &rsa::RsaPublicKey = self.0.as_ref();
        key.to_public_key_der()
            .map(|der| der.into_vec().into_boxed_slice())
            .map_err(|_| PasetoError::InvalidKey)
    }
}

fn pair(secret: Option<SecretKey>, public: PublicKey) -> KeyPair {
    KeyPair::Asymmetric {
        secret: secret.map(|key| KeyHandle::new(KeyUsage::Sign, Algorithm::RsaPssSha384, key)),
        public: KeyHandle::new(KeyUsage::Verify, Algorithm::RsaPssSha384, public),
    }
}

impl Engine for RsaPss {
    fn generate(&self, params: &AlgorithmParams) -> Result<KeyPair, PasetoError> {
        let (modulus_bits, salt_len) = rsa_params(params)?;

        let key = rsa::RsaPrivateKey::new(&mut OsRng, modulus_bits).map_err(|err| {
            tracing::warn!(%err, "rsa key generation failed");
            PasetoError::Crypto
        })?;
        let secret = SecretKey::new(key, salt_len);
        let public = secret.public_key(salt_len);

        Ok(pair(Some(secret), public))
    }

    fn import(
        &self,
        params: &AlgorithmParams,
        usage: KeyUsage,
        bytes: &[u8],
    ) -> Result<KeyPair, PasetoError> {
        let (modulus_bits, salt_len) = rsa_params(params)?;

        match usage {
            KeyUsage::Sign => {
                let secret = SecretKey::decode(bytes, modulus_bits, salt_len)?;
                let public = secret.public_key(salt_len);
                Ok(pair(Some(secret), public))
            }
            KeyUsage::Verify => Ok(pair(None, PublicKey::decode(bytes, modulus_bits, salt_len)?)),
            KeyUsage::Local => Err(PasetoError::KeyPurpose),
        }
    }

    fn export(&self, key: &KeyHandle) -> Result<Box<[u8]>, PasetoError> {
        match key.usage() {
            KeyUsage::Sign => key.material::<SecretKey>()?.encode(),
            KeyUsage::Verify => key.material::<PublicKey>()?.encode(),
            KeyUsage::Local => Err(PasetoError::KeyPurpose),
        }
    }

    fn sign(&self, key: &KeyHandle, message: &[u8]) -> Result<Vec<u8>, PasetoError> {
        use rsa::signature::{RandomizedSigner, SignatureEncoding};

        let key = key.material::<SecretKey>()?;
        let signature = key
            .0
            .try_sign_with_rng(&mut OsRng, message)
            .map_err(|_| PasetoError::Crypto)?;

        Ok(signature.to_vec())
    }

    fn verify(&self, key: &KeyHandle, message: &[u8], signature: &[u8]) -> Result<(), PasetoError> {
        use rsa::signature::Verifier;

        let key = key.material::<PublicKey>()?;
        let signature = Signature::try_from(signature).map_err(|_| PasetoError::Verification)?;
        key.0
            .verify(message, &signature)
            .map_err(|_| PasetoError::Verification)
    }
}
