//! Credential models: redacted secrets, expiry bookkeeping, and the credential snapshot.

pub mod credential;
pub mod expiry;
pub mod secret;

pub use credential::*;
pub use expiry::*;
pub use secret::*;
