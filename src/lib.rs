//! prckey: key generation for prc file signing (library crate).
//!
//! Re-exports public modules for the `make-prc-key` binary and
//! integration tests.

pub mod artifact;
pub mod config;
pub mod constants;
pub mod crypto;
pub mod env;
pub mod escape;
pub mod keygen;
pub mod keyspec;
pub mod naming;
pub mod pipeline;
pub mod registry;
