//! Registered claims and the rules that check them.
//!
//! <https://github.com/paseto-standard/paseto-spec/blob/master/docs/02-Implementation-Guide/04-Claims.md>

use std::error::Error;
use std::time::Duration;

use paseto_core::PasetoError;
use paseto_core::encodings::Payload;
use paseto_core::validation::Validate;
use serde::{Deserialize, Serialize};

/// The claims reserved by PASETO. Timestamps travel as RFC 3339 strings.
///
/// Unknown claims are ignored when decoding.
#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq)]
pub struct RegisteredClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<jiff::Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<jiff::Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<jiff::Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

impl RegisteredClaims {
    /// Claims issued at `now`, valid from `now` for `exp`.
    pub fn new(now: jiff::Timestamp, exp: Duration) -> Self {
        Self {
            exp: Some(now + exp),
            nbf: Some(now),
            iat: Some(now),
            ..Self::default()
        }
    }

    pub fn now(exp: Duration) -> Self {
        Self::new(jiff::Timestamp::now(), exp)
    }

    pub fn from_issuer(mut self, iss: String) -> Self {
        self.iss = Some(iss);
        self
    }

    pub fn for_audience(mut self, aud: String) -> Self {
        self.aud = Some(aud);
        self
    }

    pub fn for_subject(mut self, sub: String) -> Self {
        self.sub = Some(sub);
        self
    }

    pub fn with_token_id(mut self, jti: String) -> Self {
        self.jti = Some(jti);
        self
    }
}

impl Payload for RegisteredClaims {
    fn encode(&self, out: &mut Vec<u8>) -> Result<(), Box<dyn Error + Send + Sync>> {
        crate::to_canonical(self, out)
    }

    fn decode(payload: &[u8]) -> Result<Self, Box<dyn Error + Send + Sync>> {
        crate::from_object(payload)
    }
}

/// Rejects expired and not-yet-valid tokens.
pub struct Time {
    now: jiff::Timestamp,
}

impl Time {
    pub fn valid_now() -> Self {
        Self {
            now: jiff::Timestamp::now(),
        }
    }

    pub fn valid_at(now: jiff::Timestamp) -> Self {
        Self { now }
    }

    /// Tolerate clock skew of up to `leeway` in either direction.
    pub fn with_leeway(self, leeway: Duration) -> TimeWithLeeway {
        TimeWithLeeway {
            now: self.now,
            leeway,
        }
    }
}

impl Validate for Time {
    type Claims = RegisteredClaims;

    fn validate(&self, claims: &Self::Claims) -> Result<(), PasetoError> {
        self.with_leeway_of(Duration::ZERO, claims)
    }
}

impl Time {
    fn with_leeway_of(
        &self,
        leeway: Duration,
        claims: &RegisteredClaims,
    ) -> Result<(), PasetoError> {
        if let Some(exp) = claims.exp
            && exp < self.now - leeway
        {
            return Err(PasetoError::Claims);
        }

        if let Some(nbf) = claims.nbf
            && self.now + leeway < nbf
        {
            return Err(PasetoError::Claims);
        }

        Ok(())
    }
}

pub struct TimeWithLeeway {
    now: jiff::Timestamp,
    leeway: Duration,
}

impl Validate for TimeWithLeeway {
    type Claims = RegisteredClaims;

    fn validate(&self, claims: &Self::Claims) -> Result<(), PasetoError> {
        Time { now: self.now }.with_leeway_of(self.leeway, claims)
    }
}

/// Requires an `exp` claim.
pub struct HasExpiry;

impl Validate for HasExpiry {
    type Claims = RegisteredClaims;

    fn validate(&self, claims: &Self::Claims) -> Result<(), PasetoError> {
        match claims.exp {
            Some(_) => Ok(()),
            None => Err(PasetoError::Claims),
        }
    }
}

pub struct ForSubject<T: AsRef<str>>(pub T);

impl<T: AsRef<str>> Validate for ForSubject<T> {
    type Claims = RegisteredClaims;

    fn validate(&self, claims: &Self::Claims) -> Result<(), PasetoError> {
        expect(&claims.sub, self.0.as_ref())
    }
}

pub struct FromIssuer<T: AsRef<str>>(pub T);

impl<T: AsRef<str>> Validate for FromIssuer<T> {
    type Claims = RegisteredClaims;

    fn validate(&self, claims: &Self::Claims) -> Result<(), PasetoError> {
        expect(&claims.iss, self.0.as_ref())
    }
}

pub struct ForAudience<T: AsRef<str>>(pub T);

impl<T: AsRef<str>> Validate for ForAudience<T> {
    type Claims = RegisteredClaims;

    fn validate(&self, claims: &Self::Claims) -> Result<(), PasetoError> {
        expect(&claims.aud, self.0.as_ref())
    }
}

fn expect(claim: &Option<String>, value: &str) -> Result<(), PasetoError> {
    if claim.as_deref() == Some(value) {
        Ok(())
    } else {
        Err(PasetoError::Claims)
    }
}
