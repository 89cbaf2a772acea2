//! AES-256-CBC message envelope.
//!
//! Plaintext layout: `random(16) ∥ len(4, BE) ∥ message(len) ∥ id`, padded to
//! a multiple of 32 bytes where every pad byte holds the pad length.

use aes::Aes256;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use cbc::cipher::{block_padding::NoPadding, BlockDecryptMut, BlockEncryptMut, KeyIvInit};

use crate::crypto::error::{DecryptError, KeyError};

const KEY_LEN: usize = 32;
const IV_LEN: usize = 16;
const RANDOM_LEN: usize = 16;
const HEADER_LEN: usize = RANDOM_LEN + 4;
const PAD_BLOCK: usize = 32;

/// Configured keys are unpadded base64 and may carry non-zero trailing bits.
const KEY_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// A decoded 256-bit key. The IV is its first 16 bytes.
#[derive(Clone)]
pub struct AesKey([u8; KEY_LEN]);

impl AesKey {
    /// Decode the configured 43-character key.
    pub fn decode(encoded: Option<&str>) -> Result<Self, KeyError> {
        let encoded = match encoded {
            Some(k) if !k.is_empty() => k,
            _ => return Err(KeyError::Missing),
        };
        let raw = KEY_ENGINE.decode(format!("{encoded}="))?;
        let key: [u8; KEY_LEN] = raw
            .as_slice()
            .try_into()
            .map_err(|_| KeyError::InvalidLength(raw.len()))?;
        Ok(Self(key))
    }

    fn iv(&self) -> &[u8] {
        &self.0[..IV_LEN]
    }
}

impl std::fmt::Debug for AesKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AesKey(..)")
    }
}

/// Result of opening an envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decrypted {
    pub message: String,
    /// App / corp id embedded after the message.
    pub id: String,
}

/// Open a base64 ciphertext.
pub fn decrypt(key: &AesKey, ciphertext: &str) -> Result<Decrypted, DecryptError> {
    let mut buf = STANDARD.decode(ciphertext.trim())?;

    let plaintext = cbc::Decryptor::<Aes256>::new((&key.0).into(), key.iv().into())
        .decrypt_padded_mut::<NoPadding>(&mut buf)
        .map_err(|_| DecryptError::Cipher)?;

    let unpadded = strip_padding(plaintext);
    if unpadded.len() < HEADER_LEN {
        return Err(DecryptError::TooShort(unpadded.len()));
    }

    let len_bytes = [
        unpadded[RANDOM_LEN],
        unpadded[RANDOM_LEN + 1],
        unpadded[RANDOM_LEN + 2],
        unpadded[RANDOM_LEN + 3],
    ];
    let msg_len = u32::from_be_bytes(len_bytes) as usize;
    let msg_end = HEADER_LEN.saturating_add(msg_len).min(unpadded.len());

    Ok(Decrypted {
        message: String::from_utf8_lossy(&unpadded[HEADER_LEN..msg_end]).into_owned(),
        id: String::from_utf8_lossy(&unpadded[msg_end..]).into_owned(),
    })
}

/// Seal a message for the given app / corp id.
pub fn encrypt(key: &AesKey, id: &str, plaintext: &str) -> String {
    let random: [u8; RANDOM_LEN] = rand::random();
    let msg = plaintext.as_bytes();

    let mut buf = Vec::with_capacity(HEADER_LEN + msg.len() + id.len() + PAD_BLOCK);
    buf.extend_from_slice(&random);
    buf.extend_from_slice(&(msg.len() as u32).to_be_bytes());
    buf.extend_from_slice(msg);
    buf.extend_from_slice(id.as_bytes());
    apply_padding(&mut buf);

    let len = buf.len();
    let sealed = cbc::Encryptor::<Aes256>::new((&key.0).into(), key.iv().into())
        .encrypt_padded_mut::<NoPadding>(&mut buf, len)
        .map(<[u8]>::to_vec)
        .unwrap_or_default();

    STANDARD.encode(sealed)
}

/// Remove trailing pad bytes. A last byte outside `1..=32` means no padding.
fn strip_padding(data: &[u8]) -> &[u8] {
    let pad = match data.last() {
        Some(&n) if (1..=PAD_BLOCK as u8).contains(&n) => n as usize,
        _ => 0,
    };
    &data[..data.len().saturating_sub(pad)]
}

fn apply_padding(buf: &mut Vec<u8>) {
    let pad = PAD_BLOCK - (buf.len() % PAD_BLOCK);
    buf.resize(buf.len() + pad, pad as u8);
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "trjsFvOlHtVtIu5fZn390NzJUuMlK7iegzEz5D842gk";

    fn key() -> AesKey {
        AesKey::decode(Some(KEY)).unwrap()
    }

    #[test]
    fn test_key_decoding() {
        assert!(AesKey::decode(Some(KEY)).is_ok());
        // Non-zero trailing bits are accepted.
        assert!(AesKey::decode(Some("abcdefghijklmnopqrstuvwxyz0123456789ABCDEFG")).is_ok());
        assert_eq!(AesKey::decode(None).unwrap_err(), KeyError::Missing);
        assert_eq!(AesKey::decode(Some("")).unwrap_err(), KeyError::Missing);
        assert_eq!(AesKey::decode(Some("c2hvcnQ")).unwrap_err(), KeyError::InvalidLength(5));
        assert!(matches!(
            AesKey::decode(Some("not base64 at all!")).unwrap_err(),
            KeyError::Encoding(_)
        ));
    }

    #[test]
    fn test_round_trip() {
        let key = key();
        let long = "x".repeat(1000);
        for text in ["", "hello", "<xml><A><![CDATA[中文]]></A></xml>", long.as_str()] {
            let sealed = encrypt(&key, "wx2169a1c982fe6157", text);
            let opened = decrypt(&key, &sealed).unwrap();
            assert_eq!(opened.message, text);
            assert_eq!(opened.id, "wx2169a1c982fe6157");
        }
    }

    #[test]
    fn test_ciphertext_is_randomized() {
        let key = key();
        assert_ne!(encrypt(&key, "id", "same"), encrypt(&key, "id", "same"));
    }

    #[test]
    fn test_corrupt_ciphertext() {
        let key = key();
        assert!(matches!(decrypt(&key, "%%%"), Err(DecryptError::Base64(_))));
        assert_eq!(decrypt(&key, &STANDARD.encode([0u8; 15])), Err(DecryptError::Cipher));
        assert!(matches!(decrypt(&key, ""), Err(DecryptError::TooShort(0))));
    }

    #[test]
    fn test_padding() {
        let mut buf = vec![1u8; 30];
        apply_padding(&mut buf);
        assert_eq!(buf.len(), 32);
        assert_eq!(&buf[30..], &[2, 2]);

        let mut full = vec![1u8; 32];
        apply_padding(&mut full);
        assert_eq!(full.len(), 64);
        assert_eq!(strip_padding(&full), &[1u8; 32][..]);

        // Out-of-range pad byte leaves the data untouched.
        assert_eq!(strip_padding(&[7, 0]), &[7, 0]);
        assert_eq!(strip_padding(&[7, 33]), &[7, 33]);
        assert_eq!(strip_padding(&[]), &[] as &[u8]);
    }
}
