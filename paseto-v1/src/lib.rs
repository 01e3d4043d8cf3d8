//! PASETO v1 (RustCrypto)
//!
//! ```
//! use paseto_json::Json;
//! use paseto_v1::PasetoError;
//! use serde_json::json;
//!
//! // create a provider and its keypair
//! let signer = paseto_v1::public();
//! signer.generate_key().unwrap();
//!
//! // create and sign a new token
//! let token = signer.sign(&Json(json!({"sub": "alice"})), "footer1").unwrap();
//! assert!(token.starts_with("v1.public."));
//!
//! // hand the public key to a verify-only provider
//! let verifier = paseto_v1::public();
//! verifier
//!     .import_key(paseto_v1::KeyUsage::Verify, &signer.export_public_key().unwrap())
//!     .unwrap();
//!
//! // verify the token signature and decode the claims.
//! let verified = verifier.verify::<Json<serde_json::Value>>(&token).unwrap();
//! assert_eq!(verified.message.0, json!({"sub": "alice"}));
//! assert_eq!(verified.footer, "footer1");
//!
//! // the verifier cannot sign
//! let err = verifier.sign(&Json(json!({"sub": "mallory"})), "").unwrap_err();
//! assert_eq!(err, PasetoError::KeyPurpose);
//! ```
#![forbid(unsafe_code)]

/// Low level implementation primitives.
pub mod core;

pub use paseto_core::key::KeyUsage;
pub use paseto_core::version::{Protocol, Registry};
pub use paseto_core::{PasetoError, Provider, UnsealedToken};

/// The `v1.public` protocol: RSASSA-PSS over SHA-384 with 2048 bit keys.
#[cfg(feature = "public")]
pub const V1_PUBLIC: Protocol = Protocol {
    version: core::VERSION,
    purpose: paseto_core::version::Purpose::Public,
    params: core::public::PARAMS,
    capabilities: paseto_core::version::Capabilities::PUBLIC,
    engine: &core::public::RsaPss,
};

/// The `v1.local` protocol: AES-256-CTR with HMAC-SHA-384.
#[cfg(feature = "local")]
pub const V1_LOCAL: Protocol = Protocol {
    version: core::VERSION,
    purpose: paseto_core::version::Purpose::Local,
    params: core::local::PARAMS,
    capabilities: paseto_core::version::Capabilities::LOCAL,
    engine: &core::local::AesCtrHmac,
};

/// Every v1 protocol enabled in this build.
pub fn registry() -> Registry {
    let registry = Registry::new();
    #[cfg(feature = "public")]
    let registry = registry.with(V1_PUBLIC);
    #[cfg(feature = "local")]
    let registry = registry.with(V1_LOCAL);
    registry
}

/// A fresh `v1.public` provider with no key.
#[cfg(feature = "public")]
pub fn public() -> Provider {
    Provider::new(V1_PUBLIC)
}

/// A fresh `v1.local` provider with no key.
#[cfg(feature = "local")]
pub fn local() -> Provider {
    Provider::new(V1_LOCAL)
}
