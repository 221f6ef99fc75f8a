//! Cryptographic primitives for license verification.

pub mod canonical;
pub mod digest;
pub mod verify;
