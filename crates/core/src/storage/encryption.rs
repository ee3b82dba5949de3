use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use argon2::{Algorithm, Argon2, Params, Version};

use crate::errors::CoreError;

pub const SALT_LEN: usize = 16;
pub const NONCE_LEN: usize = 12;

/// Argon2id cost parameters, written into every container header so a
/// file can always be opened with the parameters it was sealed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// Memory cost in KiB
    pub memory_cost: u32,
    /// Number of passes
    pub time_cost: u32,
    /// Lanes
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_cost: 65_536, // 64 MiB
            time_cost: 3,
            parallelism: 4,
        }
    }
}

impl KdfParams {
    /// Reject parameters a crafted header could use to exhaust memory/CPU.
    ///
    /// Bounds: memory 8 KiB..=1 GiB, time 1..=20, parallelism 1..=16.
    pub fn check_bounds(&self) -> Result<(), CoreError> {
        if !(8..=1_048_576).contains(&self.memory_cost) {
            return Err(CoreError::InvalidFileFormat(format!(
                "KDF memory_cost out of range: {} KiB",
                self.memory_cost
            )));
        }
        if !(1..=20).contains(&self.time_cost) {
            return Err(CoreError::InvalidFileFormat(format!(
                "KDF time_cost out of range: {}",
                self.time_cost
            )));
        }
        if !(1..=16).contains(&self.parallelism) {
            return Err(CoreError::InvalidFileFormat(format!(
                "KDF parallelism out of range: {}",
                self.parallelism
            )));
        }
        Ok(())
    }
}

/// A 256-bit AES key derived from the user's password.
pub struct SnapshotKey([u8; 32]);

impl SnapshotKey {
    /// Derive the key with Argon2id. The salt must be fresh for every save.
    pub fn derive(password: &str, salt: &[u8; SALT_LEN], params: &KdfParams) -> Result<Self, CoreError> {
        let argon2_params = Params::new(
            params.memory_cost,
            params.time_cost,
            params.parallelism,
            Some(32),
        )
        .map_err(|e| CoreError::Encryption(format!("Invalid Argon2 params: {e}")))?;

        let mut key = [0u8; 32];
        Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params)
            .hash_password_into(password.as_bytes(), salt, &mut key)
            .map_err(|e| CoreError::Encryption(format!("Key derivation failed: {e}")))?;
        Ok(Self(key))
    }

    /// AES-256-GCM encrypt; the 16-byte tag is appended to the output.
    pub fn seal(&self, plaintext: &[u8], nonce: &[u8; NONCE_LEN]) -> Result<Vec<u8>, CoreError> {
        self.cipher()?
            .encrypt(Nonce::from_slice(nonce), plaintext)
            .map_err(|e| CoreError::Encryption(format!("Encryption failed: {e}")))
    }

    /// AES-256-GCM decrypt and authenticate. A wrong password and a
    /// tampered file both surface as `CoreError::Decryption`.
    pub fn open(&self, ciphertext: &[u8], nonce: &[u8; NONCE_LEN]) -> Result<Vec<u8>, CoreError> {
        Ok(self.cipher()?.decrypt(Nonce::from_slice(nonce), ciphertext)?)
    }

    fn cipher(&self) -> Result<Aes256Gcm, CoreError> {
        Aes256Gcm::new_from_slice(&self.0)
            .map_err(|e| CoreError::Encryption(format!("Failed to create cipher: {e}")))
    }
}

/// Cryptographically secure random bytes (salts and nonces).
pub fn random_bytes<const N: usize>() -> Result<[u8; N], CoreError> {
    let mut buf = [0u8; N];
    getrandom::getrandom(&mut buf)
        .map_err(|e| CoreError::Encryption(format!("Failed to gather randomness: {e}")))?;
    Ok(buf)
}
