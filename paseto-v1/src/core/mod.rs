#[cfg(feature = "local")]
pub mod local;
#[cfg(feature = "public")]
pub mod public;

pub const VERSION: &str = "v1";

#[cfg(feature = "public")]
pub use public::{PublicKey, SecretKey};

#[cfg(feature = "local")]
pub use local::LocalKey;
