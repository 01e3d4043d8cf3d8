use core::fmt;

use crate::PasetoError;
use crate::key::{KeyHandle, KeyPair, KeyUsage};

/// Declares token intent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Purpose {
    /// Symmetric, authenticated encryption.
    Local,
    /// Asymmetric signatures.
    Public,
}

impl Purpose {
    pub const fn as_str(self) -> &'static str {
        match self {
            Purpose::Local => "local",
            Purpose::Public => "public",
        }
    }
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An operation a provider can be asked to perform with its key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    Sign,
    Verify,
    Encrypt,
    Decrypt,
}

impl Operation {
    /// The key usage this operation requires.
    pub const fn required_usage(self) -> KeyUsage {
        match self {
            Operation::Sign => KeyUsage::Sign,
            Operation::Verify => KeyUsage::Verify,
            Operation::Encrypt | Operation::Decrypt => KeyUsage::Local,
        }
    }
}

/// Identifies a key's algorithm family, checked on every key use.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Algorithm {
    /// RSASSA-PSS with a SHA-384 digest and MGF1-SHA-384.
    RsaPssSha384,
    /// AES-256-CTR then HMAC-SHA-384, with HKDF-SHA-384 key splitting.
    Aes256CtrHmacSha384,
}

/// Fixed algorithm parameters for one protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlgorithmParams {
    RsaPss {
        modulus_bits: usize,
        salt_len: usize,
        signature_len: usize,
    },
    AesCtrHmac {
        key_len: usize,
        nonce_len: usize,
        tag_len: usize,
    },
}

impl AlgorithmParams {
    pub const fn algorithm(&self) -> Algorithm {
        match self {
            AlgorithmParams::RsaPss { .. } => Algorithm::RsaPssSha384,
            AlgorithmParams::AesCtrHmac { .. } => Algorithm::Aes256CtrHmacSha384,
        }
    }

    /// Length of the fixed-size authenticator at the end of the token body.
    pub const fn trailer_len(&self) -> usize {
        match *self {
            AlgorithmParams::RsaPss { signature_len, .. } => signature_len,
            AlgorithmParams::AesCtrHmac { tag_len, .. } => tag_len,
        }
    }
}

/// The operations a protocol supports.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub sign: bool,
    pub verify: bool,
    pub encrypt: bool,
    pub decrypt: bool,
}

impl Capabilities {
    pub const PUBLIC: Self = Self {
        sign: true,
        verify: true,
        encrypt: false,
        decrypt: false,
    };

    pub const LOCAL: Self = Self {
        sign: false,
        verify: false,
        encrypt: true,
        decrypt: true,
    };

    pub const fn allows(&self, op: Operation) -> bool {
        match op {
            Operation::Sign => self.sign,
            Operation::Verify => self.verify,
            Operation::Encrypt => self.encrypt,
            Operation::Decrypt => self.decrypt,
        }
    }
}

/// The cryptographic engine behind a protocol.
///
/// Engines receive opaque [`KeyHandle`]s and must downcast them to their own
/// key types, failing with [`PasetoError::KeyPurpose`] on a mismatch.
/// Operations outside the protocol's [`Capabilities`] keep the default
/// [`PasetoError::Unsupported`] implementations.
pub trait Engine: Send + Sync + 'static {
    /// Create a fresh key pair using `params`.
    fn generate(&self, params: &AlgorithmParams) -> Result<KeyPair, PasetoError>;

    /// Load existing key material for the given usage.
    fn import(
        &self,
        params: &AlgorithmParams,
        usage: KeyUsage,
        bytes: &[u8],
    ) -> Result<KeyPair, PasetoError>;

    /// Serialize a key for transport.
    fn export(&self, key: &KeyHandle) -> Result<Box<[u8]>, PasetoError>;

    /// Sign a pre-auth encoded message, returning a fixed-size signature.
    fn sign(&self, key: &KeyHandle, message: &[u8]) -> Result<Vec<u8>, PasetoError> {
        let _ = (key, message);
        Err(PasetoError::Unsupported)
    }

    /// Check `signature` over a pre-auth encoded message.
    ///
    /// Every failure must be reported as [`PasetoError::Verification`].
    fn verify(&self, key: &KeyHandle, message: &[u8], signature: &[u8]) -> Result<(), PasetoError> {
        let _ = (key, message, signature);
        Err(PasetoError::Unsupported)
    }

    /// Encrypt `plaintext`, returning the token body without its footer.
    fn encrypt(
        &self,
        key: &KeyHandle,
        header: &str,
        plaintext: &[u8],
        footer: &[u8],
    ) -> Result<Vec<u8>, PasetoError> {
        let _ = (key, header, plaintext, footer);
        Err(PasetoError::Unsupported)
    }

    /// Authenticate and decrypt a token body split into `sealed` and `tag`.
    ///
    /// Every failure must be reported as [`PasetoError::Verification`].
    fn decrypt(
        &self,
        key: &KeyHandle,
        header: &str,
        sealed: &[u8],
        tag: &[u8],
        footer: &[u8],
    ) -> Result<Vec<u8>, PasetoError> {
        let _ = (key, header, sealed, tag, footer);
        Err(PasetoError::Unsupported)
    }
}

/// A `(version, purpose)` registration.
#[derive(Clone, Copy)]
pub struct Protocol {
    /// e.g. `"v1"`
    pub version: &'static str,
    pub purpose: Purpose,
    pub params: AlgorithmParams,
    pub capabilities: Capabilities,
    pub engine: &'static dyn Engine,
}

impl Protocol {
    /// `"{version}.{purpose}"`
    pub fn header(&self) -> String {
        format!("{}.{}", self.version, self.purpose)
    }
}

impl fmt::Debug for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Protocol")
            .field("version", &self.version)
            .field("purpose", &self.purpose)
            .field("params", &self.params)
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

/// Protocols available for lookup, keyed by version and purpose.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    protocols: Vec<Protocol>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a protocol, replacing any previous one with the same version and purpose.
    pub fn register(&mut self, protocol: Protocol) -> &mut Self {
        self.protocols
            .retain(|p| (p.version, p.purpose) != (protocol.version, protocol.purpose));
        self.protocols.push(protocol);
        self
    }

    pub fn with(mut self, protocol: Protocol) -> Self {
        self.register(protocol);
        self
    }

    pub fn lookup(&self, version: &str, purpose: Purpose) -> Result<Protocol, PasetoError> {
        self.protocols
            .iter()
            .find(|p| p.version == version && p.purpose == purpose)
            .copied()
            .ok_or(PasetoError::UnknownProtocol)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Protocol> {
        self.protocols.iter()
    }
}
