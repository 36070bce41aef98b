//! Public extension contracts for request signing.
//!
//! The contracts stay independent of any HTTP client: requests only need to expose their
//! header map, and signers only need a [`Credential`](crate::auth::Credential) snapshot.

pub mod request_signer;

pub use request_signer::*;
