//! PASETO message encodings.

use std::error::Error;

/// A PASETO payload object.
///
/// Implementations decide what a well-formed message is, and must reject
/// anything that is not an object on both `encode` and `decode`. `encode`
/// must be deterministic: the same logical message always produces the same
/// bytes, since those bytes are what gets signed.
pub trait Payload: Sized {
    /// Encode the message
    fn encode(&self, out: &mut Vec<u8>) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// Decode the message
    fn decode(payload: &[u8]) -> Result<Self, Box<dyn Error + Send + Sync>>;
}

