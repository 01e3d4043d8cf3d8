//! Protocol core shared by PASETO providers.
//!
//! This crate knows nothing about RSA or AES. It owns the parts of the protocol
//! that turn a primitive into a token format: the pre-authentication encoding,
//! the wire framing, the header gate, key purpose checks and the provider state
//! machine. Cryptography is plugged in through [`version::Engine`].
#![forbid(unsafe_code)]

pub mod base64;
pub mod encodings;
pub mod key;
pub mod pae;
pub mod provider;
pub mod token;
pub mod validation;
pub mod version;

pub use provider::{Provider, ProviderState};
pub use token::UnsealedToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
/// Error returned for all PASETO operations that can fail
pub enum PasetoError {
    /// The provider already holds a key.
    ProviderState,
    /// The key is missing or not meant for the requested operation.
    KeyPurpose,
    /// The token was not of a valid form.
    MalformedToken,
    /// The token header names a different version or purpose.
    HeaderMismatch,
    /// The message is not a serializable object.
    InvalidMessage,
    /// The token claims could not be decoded or failed validation.
    Claims,
    /// Could not verify/decrypt the token.
    ///
    /// This never says why.
    Verification,
    /// Could not decode the provided key.
    InvalidKey,
    /// The cryptographic engine failed to produce a key or signature.
    Crypto,
    /// The protocol does not support this operation.
    Unsupported,
    /// No protocol is registered under this version and purpose.
    UnknownProtocol,
}

impl std::error::Error for PasetoError {}

impl std::fmt::Display for PasetoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PasetoError::ProviderState => f.write_str("A key has already been generated"),
            PasetoError::KeyPurpose => f.write_str("The key cannot be used for this operation"),
            PasetoError::MalformedToken => f.write_str("Could not parse the token"),
            PasetoError::HeaderMismatch => {
                f.write_str("The token header does not match this provider")
            }
            PasetoError::InvalidMessage => f.write_str("The message must be a serializable object"),
            PasetoError::Claims => f.write_str("Token claims could not be validated"),
            PasetoError::Verification => f.write_str("Invalid token"),
            PasetoError::InvalidKey => f.write_str("Could not parse the key"),
            PasetoError::Crypto => f.write_str("The cryptographic operation failed"),
            PasetoError::Unsupported => f.write_str("Operation not supported by this protocol"),
            PasetoError::UnknownProtocol => f.write_str("Unknown protocol version or purpose"),
        }
    }
}
