//! Password hashing with Argon2id.
//!
//! Hashes are stored as PHC strings, so the salt and cost parameters travel
//! with each hash and verification needs nothing else.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;

use crate::config::AccountsConfig;
use crate::core::store::{StoreError, StoreResult};

/// Argon2 cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashCost {
    pub memory_kib: u32,
    pub iterations: u32,
}

impl HashCost {
    /// Cheapest parameters Argon2 accepts. For tests only.
    pub const MINIMAL: HashCost = HashCost {
        memory_kib: 8,
        iterations: 1,
    };
}

impl Default for HashCost {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CredentialHasher {
    params: Params,
}

impl CredentialHasher {
    pub fn new(cost: HashCost) -> StoreResult<Self> {
        let params = Params::new(cost.memory_kib, cost.iterations, 1, None)
            .map_err(|e| StoreError::Hashing(e.to_string()))?;
        Ok(Self { params })
    }

    pub fn from_config(config: &AccountsConfig) -> StoreResult<Self> {
        Self::new(HashCost {
            memory_kib: config.hash_memory_kib,
            iterations: config.hash_iterations,
        })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a password into a PHC string with a fresh random salt.
    pub fn hash(&self, password: &str) -> StoreResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| StoreError::Hashing(e.to_string()))
    }

    /// Check a password against a stored PHC string.
    ///
    /// An unparseable stored hash never verifies.
    pub fn verify(&self, password: &str, stored_hash: &str) -> bool {
        match PasswordHash::new(stored_hash) {
            Ok(parsed) => self
                .argon2()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                log::warn!("Stored password hash is unreadable: {}", e);
                false
            }
        }
    }
}
