// SPDX-FileCopyrightText: 2026 Envia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Argon2id derivation of the vault key material.
//!
//! The salt is a fixed constant: the same secret must yield the same keys
//! across restarts, and there is nowhere to store a per-install salt before
//! the first credential is sealed.

use envia_core::EnviaError;
use zeroize::Zeroizing;

pub const VAULT_SALT: &[u8; 16] = b"envia/vault/v1\0\0";

/// Derive 64 bytes (cipher key + MAC key) from `secret`.
pub fn derive_key_material(
    secret: &[u8],
    memory_cost: u32,
    iterations: u32,
    parallelism: u32,
) -> Result<Zeroizing<[u8; 64]>, EnviaError> {
    let params = argon2::Params::new(memory_cost, iterations, parallelism, Some(64))
        .map_err(|e| EnviaError::Vault(format!("invalid Argon2id parameters: {e}")))?;
    let argon2 = argon2::Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let mut output = Zeroizing::new([0u8; 64]);
    argon2
        .hash_password_into(secret, VAULT_SALT, output.as_mut())
        .map_err(|e| EnviaError::Vault(format!("Argon2id key derivation failed: {e}")))?;
    Ok(output)
}
