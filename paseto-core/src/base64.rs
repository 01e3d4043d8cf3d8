//! Constant-time, unpadded base64url.
//!
//! <https://github.com/paseto-standard/paseto-spec/blob/master/docs/01-Protocol-Versions/Common.md#base64-encoding>.
//!
//! Decoding is strict: padding, non-alphabet characters and non-canonical
//! trailing bits are all rejected, so each byte string has exactly one
//! textual form.

use base64ct::{Base64UrlUnpadded, Encoding};

use crate::PasetoError;

pub fn encode(bytes: &[u8]) -> String {
    Base64UrlUnpadded::encode_string(bytes)
}

pub fn decode(src: &str) -> Result<Vec<u8>, PasetoError> {
    Base64UrlUnpadded::decode_vec(src).map_err(|_| PasetoError::MalformedToken)
}
