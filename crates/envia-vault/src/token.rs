// SPDX-FileCopyrightText: 2026 Envia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Textual token format: `iv:ciphertext`, or `kid:iv:ciphertext` when a key
//! id is present. Both binary fields are lower-case hex.

use envia_core::EnviaError;

use crate::crypto::{BLOCK_LEN, IV_LEN, TAG_LEN};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedToken<'a> {
    pub key_id: Option<&'a str>,
    pub iv: [u8; IV_LEN],
    pub body: Vec<u8>,
}

impl<'a> SealedToken<'a> {
    /// Parse a stored token. Malformed input is [`EnviaError::Decryption`].
    pub fn parse(token: &'a str) -> Result<Self, EnviaError> {
        let parts: Vec<&str> = token.trim().split(':').collect();
        let (key_id, iv_hex, body_hex) = match parts.as_slice() {
            [iv, body] => (None, *iv, *body),
            [kid, iv, body] if !kid.is_empty() => (Some(*kid), *iv, *body),
            _ => return Err(EnviaError::Decryption),
        };

        let iv: [u8; IV_LEN] = hex::decode(iv_hex)
            .ok()
            .and_then(|v| v.try_into().ok())
            .ok_or(EnviaError::Decryption)?;
        let body = hex::decode(body_hex).map_err(|_| EnviaError::Decryption)?;
        if body.len() < BLOCK_LEN + TAG_LEN {
            return Err(EnviaError::Decryption);
        }

        Ok(Self { key_id, iv, body })
    }

    /// Render as `iv:ciphertext`, or `kid:iv:ciphertext` when a key id is set.
    pub fn encode(&self) -> String {
        let tail = format!("{}:{}", hex::encode(self.iv), hex::encode(&self.body));
        match self.key_id {
            Some(kid) => format!("{kid}:{tail}"),
            None => tail,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SealedToken<'static> {
        SealedToken {
            key_id: None,
            iv: [0xab; IV_LEN],
            body: vec![0x01; BLOCK_LEN + TAG_LEN],
        }
    }

    #[test]
    fn two_segment_format_is_lower_hex() {
        let encoded = sample().encode();
        let (iv, body) = encoded.split_once(':').unwrap();
        assert_eq!(iv, "ab".repeat(16));
        assert_eq!(body.len(), 2 * (BLOCK_LEN + TAG_LEN));
        assert_eq!(SealedToken::parse(&encoded).unwrap(), sample());
    }

    #[test]
    fn key_id_prefix_is_parsed() {
        let encoded = format!("k1:{}", sample().encode());
        let parsed = SealedToken::parse(&encoded).unwrap();
        assert_eq!(parsed.key_id, Some("k1"));
        assert_eq!(parsed.iv, sample().iv);
    }

    #[test]
    fn malformed_tokens_are_decryption_errors() {
        for bad in [
            "",
            "nothex:00",
            "abcd:0011",
            "a:b:c:d",
            ":00:11",
            format!("{}:zz", "00".repeat(16)).as_str(),
        ] {
            assert!(
                matches!(SealedToken::parse(bad), Err(EnviaError::Decryption)),
                "{bad:?}"
            );
        }
    }
}
