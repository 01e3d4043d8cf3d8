//! Structural checks on messages, footers, headers and claims.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::PasetoError;
use crate::encodings::Payload;

/// Encode a message for signing or encryption.
pub fn validate_message<M: Payload>(message: &M) -> Result<Vec<u8>, PasetoError> {
    let mut out = Vec::new();
    message.encode(&mut out).map_err(|err| {
        tracing::debug!(%err, "rejected message");
        PasetoError::InvalidMessage
    })?;
    Ok(out)
}

pub fn validate_footer(footer: &str) -> &[u8] {
    footer.as_bytes()
}

/// Compare a token header against the provider's, returning `"{version}.{purpose}"`.
pub fn validate_header(
    expected_version: &str,
    expected_purpose: &str,
    actual_version: &str,
    actual_purpose: &str,
) -> Result<String, PasetoError> {
    if expected_version != actual_version || expected_purpose != actual_purpose {
        return Err(PasetoError::HeaderMismatch);
    }
    Ok(format!("{actual_version}.{actual_purpose}"))
}

/// Decode authenticated payload bytes into a message.
pub fn validate_claims<M: Payload>(payload: &[u8]) -> Result<M, PasetoError> {
    M::decode(payload).map_err(|err| {
        tracing::debug!(%err, "rejected claims");
        PasetoError::Claims
    })
}

/// Authenticated footers were produced from a `&str`, so anything else is malformed.
pub(crate) fn footer_to_string(footer: Vec<u8>) -> Result<String, PasetoError> {
    String::from_utf8(footer).map_err(|_| PasetoError::MalformedToken)
}

/// A rule over the claims of a verified token.
pub trait Validate {
    /// The type of claim that can be validated
    type Claims;

    /// The validation to perform on the claims
    fn validate(&self, claims: &Self::Claims) -> Result<(), PasetoError>;

    /// Extend the validation with another validation.
    fn and_then<V>(self, other: V) -> impl Validate<Claims = Self::Claims>
    where
        Self: Sized,
        V: Validate<Claims = Self::Claims>,
    {
        ValidateThen(self, other)
    }

    /// Validate a part of some larger claims type.
    fn map<T>(self, f: impl for<'a> Fn(&'a T) -> &'a Self::Claims) -> impl Validate<Claims = T>
    where
        Self: Sized,
    {
        Map(PhantomData::<T>, f, self)
    }
}

/// Accepts every set of claims.
pub struct NoValidation<Claims>(PhantomData<Claims>);

impl<Claims> NoValidation<Claims> {
    pub fn dangerous_no_validation() -> Self {
        NoValidation(PhantomData)
    }
}

impl<Claims> Validate for NoValidation<Claims> {
    type Claims = Claims;
    fn validate(&self, _: &Self::Claims) -> Result<(), PasetoError> {
        Ok(())
    }
}

struct Map<Claims, F, T>(PhantomData<Claims>, F, T);

impl<Claims, F, T> Validate for Map<Claims, F, T>
where
    F: for<'a> Fn(&'a Claims) -> &'a T::Claims,
    T: Validate,
{
    type Claims = Claims;

    fn validate(&self, claims: &Self::Claims) -> Result<(), PasetoError> {
        self.2.validate((self.1)(claims))
    }
}

struct ValidateThen<T, U>(T, U);

impl<T: Validate, U: Validate<Claims = T::Claims>> Validate for ValidateThen<T, U> {
    type Claims = T::Claims;

    fn validate(&self, claims: &Self::Claims) -> Result<(), PasetoError> {
        self.0.validate(claims)?;
        self.1.validate(claims)
    }
}

impl<T: Validate> Validate for [T] {
    type Claims = T::Claims;

    fn validate(&self, claims: &Self::Claims) -> Result<(), PasetoError> {
        self.iter().try_for_each(|v| v.validate(claims))
    }
}

impl<T: Validate> Validate for Vec<T> {
    type Claims = T::Claims;

    fn validate(&self, claims: &Self::Claims) -> Result<(), PasetoError> {
        <[T]>::validate(self, claims)
    }
}

impl<T: Validate + ?Sized> Validate for &T {
    type Claims = T::Claims;

    fn validate(&self, claims: &Self::Claims) -> Result<(), PasetoError> {
        T::validate(self, claims)
    }
}

impl<T: Validate + ?Sized> Validate for Box<T> {
    type Claims = T::Claims;

    fn validate(&self, claims: &Self::Claims) -> Result<(), PasetoError> {
        T::validate(self, claims)
    }
}

impl<T: Validate + ?Sized> Validate for Arc<T> {
    type Claims = T::Claims;

    fn validate(&self, claims: &Self::Claims) -> Result<(), PasetoError> {
        T::validate(self, claims)
    }
}
