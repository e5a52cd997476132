//! Security primitives: one-way credential hashing.

pub mod password;

pub use password::{CredentialHasher, HashCost};
