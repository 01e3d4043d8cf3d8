//! Token framing.
//!
//! ```text
//! token   := header "." body ["." footer]
//! header  := version "." purpose
//! body    := base64url(payload ‖ signature)
//! footer  := base64url(footer-bytes)
//! ```

use crate::{PasetoError, base64};

/// The contents of a token that passed verification or decryption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsealedToken<M> {
    /// The message that was contained in the token
    pub message: M,
    /// The footer that was sent with the token
    pub footer: String,
}

/// What a parser expects of a token.
#[derive(Debug, Clone, Copy)]
pub struct TokenLayout<'a> {
    pub version: &'a str,
    pub purpose: &'a str,
    /// Length of the signature (or MAC tag) at the end of the body.
    pub signature_len: usize,
}

/// A token split into its parts. Nothing here has been authenticated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedToken<'a> {
    pub version: &'a str,
    pub purpose: &'a str,
    pub payload: Vec<u8>,
    pub signature: Vec<u8>,
    pub footer: Vec<u8>,
}

/// Serialize a token.
///
/// The footer segment is omitted when `footer` is empty.
pub fn pack(header: &str, payload: &[u8], signature: &[u8], footer: &[u8]) -> String {
    let mut body = Vec::with_capacity(payload.len() + signature.len());
    body.extend_from_slice(payload);
    body.extend_from_slice(signature);

    let encoded_len = (body.len() + footer.len()) * 4 / 3 + 2;
    let mut token = String::with_capacity(header.len() + 2 + encoded_len);
    token.push_str(header);
    token.push('.');
    token.push_str(&base64::encode(&body));
    if !footer.is_empty() {
        token.push('.');
        token.push_str(&base64::encode(footer));
    }
    token
}

/// Split a token into header, payload, signature and footer.
///
/// The header is compared against `layout` before anything is decoded.
pub fn parse<'a>(raw: &'a str, layout: &TokenLayout<'_>) -> Result<ParsedToken<'a>, PasetoError> {
    let segments: Vec<&str> = raw.split('.').collect();
    let (version, purpose, body, footer) = match segments[..] {
        [version, purpose, body] => (version, purpose, body, None),
        [version, purpose, body, footer] => (version, purpose, body, Some(footer)),
        _ => return Err(PasetoError::MalformedToken),
    };

    if version != layout.version || purpose != layout.purpose {
        return Err(PasetoError::HeaderMismatch);
    }

    let mut payload = base64::decode(body)?;
    let split = payload
        .len()
        .checked_sub(layout.signature_len)
        .ok_or(PasetoError::MalformedToken)?;
    let signature = payload.split_off(split);

    let footer = match footer {
        None => Vec::new(),
        // an empty footer is never packed, so this form has no canonical producer
        Some("") => return Err(PasetoError::MalformedToken),
        // the footer is authenticated data: a garbled footer is a tampered footer
        Some(footer) => base64::decode(footer).map_err(|_| PasetoError::Verification)?,
    };

    Ok(ParsedToken {
        version,
        purpose,
        payload,
        signature,
        footer,
    })
}
