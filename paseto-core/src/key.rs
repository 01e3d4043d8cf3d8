//! Key handles and the key purpose guard.

use core::any::Any;
use core::fmt;

use crate::PasetoError;
use crate::version::{Algorithm, Operation};

/// What a key may be used for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyUsage {
    /// A private key that creates signatures.
    Sign,
    /// A public key that checks signatures.
    Verify,
    /// A symmetric key that both encrypts and decrypts.
    Local,
}

/// Opaque key material tagged with its usage and algorithm.
///
/// The material is owned by the handle and only engines know its concrete type.
pub struct KeyHandle {
    usage: KeyUsage,
    algorithm: Algorithm,
    material: Box<dyn Any + Send + Sync>,
}

impl KeyHandle {
    pub fn new<T: Any + Send + Sync>(usage: KeyUsage, algorithm: Algorithm, material: T) -> Self {
        Self {
            usage,
            algorithm,
            material: Box::new(material),
        }
    }

    pub fn usage(&self) -> KeyUsage {
        self.usage
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Borrow the material as `T`, or fail with [`PasetoError::KeyPurpose`].
    pub fn material<T: Any>(&self) -> Result<&T, PasetoError> {
        self.material
            .downcast_ref::<T>()
            .ok_or(PasetoError::KeyPurpose)
    }
}

impl fmt::Debug for KeyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyHandle")
            .field("usage", &self.usage)
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

/// The key material held by one provider.
#[derive(Debug)]
pub enum KeyPair {
    /// A signing key, when held, and its verification key.
    Asymmetric {
        secret: Option<KeyHandle>,
        public: KeyHandle,
    },
    Symmetric(KeyHandle),
}

impl KeyPair {
    /// The handle that would serve `op`, if this pair has one.
    pub fn for_operation(&self, op: Operation) -> Option<&KeyHandle> {
        match (self, op) {
            (KeyPair::Asymmetric { secret, .. }, Operation::Sign) => secret.as_ref(),
            (KeyPair::Asymmetric { public, .. }, Operation::Verify) => Some(public),
            (KeyPair::Symmetric(key), Operation::Encrypt | Operation::Decrypt) => Some(key),
            // hand back the nearest key so the guard rejects it on usage
            (KeyPair::Asymmetric { public, .. }, _) => Some(public),
            (KeyPair::Symmetric(key), _) => Some(key),
        }
    }

    pub fn public(&self) -> Option<&KeyHandle> {
        match self {
            KeyPair::Asymmetric { public, .. } => Some(public),
            KeyPair::Symmetric(_) => None,
        }
    }
}

/// Check that `key` exists and is meant for `op` under `algorithm`.
///
/// Runs on every operation, independent of how the key was obtained.
pub fn check_key_purpose(
    op: Operation,
    key: Option<&KeyHandle>,
    algorithm: Algorithm,
) -> Result<&KeyHandle, PasetoError> {
    let key = key.ok_or(PasetoError::KeyPurpose)?;
    if key.usage != op.required_usage() || key.algorithm != algorithm {
        return Err(PasetoError::KeyPurpose);
    }
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(usage: KeyUsage) -> KeyHandle {
        KeyHandle::new(usage, Algorithm::RsaPssSha384, [0u8; 4])
    }

    #[test]
    fn absent_key() {
        let err = check_key_purpose(Operation::Sign, None, Algorithm::RsaPssSha384);
        assert_eq!(err.unwrap_err(), PasetoError::KeyPurpose);
    }

    #[test]
    fn usage_must_match_operation() {
        let sign = handle(KeyUsage::Sign);
        let verify = handle(KeyUsage::Verify);
        let alg = Algorithm::RsaPssSha384;

        assert!(check_key_purpose(Operation::Sign, Some(&sign), alg).is_ok());
        assert!(check_key_purpose(Operation::Verify, Some(&verify), alg).is_ok());

        for (op, key) in [
            (Operation::Sign, &verify),
            (Operation::Verify, &sign),
            (Operation::Encrypt, &sign),
            (Operation::Decrypt, &verify),
        ] {
            assert_eq!(
                check_key_purpose(op, Some(key), alg).unwrap_err(),
                PasetoError::KeyPurpose
            );
        }
    }

    #[test]
    fn algorithm_must_match() {
        let local = KeyHandle::new(KeyUsage::Local, Algorithm::RsaPssSha384, ());
        let err = check_key_purpose(
            Operation::Encrypt,
            Some(&local),
            Algorithm::Aes256CtrHmacSha384,
        );
        assert_eq!(err.unwrap_err(), PasetoError::KeyPurpose);
    }

    #[test]
    fn material_downcast() {
        let key = handle(KeyUsage::Sign);
        assert_eq!(key.material::<[u8; 4]>().unwrap(), &[0; 4]);
        assert_eq!(key.material::<u32>().unwrap_err(), PasetoError::KeyPurpose);
    }

    #[test]
    fn verify_only_pair_has_no_signing_key() {
        let pair = KeyPair::Asymmetric {
            secret: None,
            public: handle(KeyUsage::Verify),
        };
        assert!(pair.for_operation(Operation::Sign).is_none());
        assert_eq!(
            pair.for_operation(Operation::Verify).map(KeyHandle::usage),
            Some(KeyUsage::Verify)
        );
    }
}
