//! Request authentication: shared secrets, HMAC request tokens, and the inbound verifier.

pub mod secret;
pub mod signer;
pub mod verifier;

pub use secret::*;
pub use signer::*;
pub use verifier::*;
