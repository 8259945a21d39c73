// SPDX-FileCopyrightText: 2026 Envia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! AES-256-CBC sealing with an HMAC-SHA256 tag.
//!
//! Every call to [`seal`] draws a fresh 16-byte IV from the system CSPRNG.
//! The tag covers `iv || ciphertext` and is checked before any decryption,
//! so a flipped byte anywhere is rejected instead of decrypting to garbage.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use envia_core::EnviaError;
use ring::hmac;
use ring::rand::{SecureRandom, SystemRandom};
use zeroize::Zeroizing;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

pub const IV_LEN: usize = 16;
pub const TAG_LEN: usize = 32;
pub const BLOCK_LEN: usize = 16;

/// Cipher and MAC keys split from the 64 bytes of derived key material.
pub struct SealingKeys {
    cipher: Zeroizing<[u8; 32]>,
    mac: hmac::Key,
}

impl std::fmt::Debug for SealingKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SealingKeys([REDACTED])")
    }
}

impl SealingKeys {
    /// First half encrypts, second half authenticates.
    pub fn from_material(material: &[u8; 64]) -> Self {
        let mut cipher = Zeroizing::new([0u8; 32]);
        cipher.copy_from_slice(&material[..32]);
        Self {
            cipher,
            mac: hmac::Key::new(hmac::HMAC_SHA256, &material[32..]),
        }
    }

    /// Short public fingerprint of the keys, used as the token key id.
    pub fn fingerprint(&self) -> String {
        let tag = hmac::sign(&self.mac, b"envia/vault/key-id");
        hex::encode(&tag.as_ref()[..4])
    }
}

fn authenticated_bytes(iv: &[u8; IV_LEN], ciphertext: &[u8]) -> Vec<u8> {
    let mut data = Vec::with_capacity(IV_LEN + ciphertext.len());
    data.extend_from_slice(iv);
    data.extend_from_slice(ciphertext);
    data
}

/// Encrypt `plaintext`. Returns the IV and `ciphertext || tag`.
pub fn seal(keys: &SealingKeys, plaintext: &[u8]) -> Result<([u8; IV_LEN], Vec<u8>), EnviaError> {
    let mut iv = [0u8; IV_LEN];
    SystemRandom::new()
        .fill(&mut iv)
        .map_err(|_| EnviaError::Vault("failed to generate random IV".to_string()))?;

    let mut body = Aes256CbcEnc::new_from_slices(keys.cipher.as_ref(), &iv)
        .map_err(|_| EnviaError::Vault("invalid AES-256-CBC key length".to_string()))?
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    let tag = hmac::sign(&keys.mac, &authenticated_bytes(&iv, &body));
    body.extend_from_slice(tag.as_ref());
    Ok((iv, body))
}

/// Verify and decrypt `ciphertext || tag`. Every failure is
/// [`EnviaError::Decryption`].
pub fn open(
    keys: &SealingKeys,
    iv: &[u8; IV_LEN],
    body: &[u8],
) -> Result<Zeroizing<Vec<u8>>, EnviaError> {
    if body.len() < BLOCK_LEN + TAG_LEN || (body.len() - TAG_LEN) % BLOCK_LEN != 0 {
        return Err(EnviaError::Decryption);
    }
    let (ciphertext, tag) = body.split_at(body.len() - TAG_LEN);
    hmac::verify(&keys.mac, &authenticated_bytes(iv, ciphertext), tag)
        .map_err(|_| EnviaError::Decryption)?;

    Aes256CbcDec::new_from_slices(keys.cipher.as_ref(), iv)
        .map_err(|_| EnviaError::Decryption)?
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map(Zeroizing::new)
        .map_err(|_| EnviaError::Decryption)
}
