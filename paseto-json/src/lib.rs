#![forbid(unsafe_code)]

use std::error::Error;

pub use paseto_core::validation::Validate;
use paseto_core::encodings::Payload;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// `Json` is a type wrapper to implement [`Payload`] for all types that implement
/// [`serde::Serialize`] and [`serde::Deserialize`]
///
/// Messages must serialize to a JSON object. They are signed in canonical form:
/// object keys sorted, no insignificant whitespace, so two equal messages always
/// produce the same bytes whatever order their fields were built in.
///
/// Currently, this uses [`serde_json`] internally, which by default offers a stack-overflow
/// protection limit on parsing JSON. You should parse into a known struct layout where
/// possible, and avoid arbitrary key-value mappings.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Json<T>(pub T);

fn to_canonical<T: Serialize>(
    message: &T,
    out: &mut Vec<u8>,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    // `Value::Object` is a BTreeMap, which is what puts the keys in order
    match serde_json::to_value(message)? {
        value @ Value::Object(_) => serde_json::to_writer(out, &value).map_err(From::from),
        other => Err(format!("expected a JSON object, found {}", kind(&other)).into()),
    }
}

fn from_object<T: DeserializeOwned>(payload: &[u8]) -> Result<T, Box<dyn Error + Send + Sync>> {
    match serde_json::from_slice(payload)? {
        value @ Value::Object(_) => serde_json::from_value(value).map_err(From::from),
        other => Err(format!("expected a JSON object, found {}", kind(&other)).into()),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl<M: Serialize + DeserializeOwned> Payload for Json<M> {
    fn encode(&self, out: &mut Vec<u8>) -> Result<(), Box<dyn Error + Send + Sync>> {
        to_canonical(&self.0, out)
    }

    fn decode(payload: &[u8]) -> Result<Self, Box<dyn Error + Send + Sync>> {
        from_object(payload).map(Self)
    }
}

#[cfg(feature = "claims")]
pub use claims::{
    ForAudience, ForSubject, FromIssuer, HasExpiry, RegisteredClaims, Time, TimeWithLeeway,
};

#[cfg(feature = "claims")]
pub use jiff;

#[cfg(feature = "claims")]
mod claims;
