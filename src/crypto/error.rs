//! Crypto error definitions.

use thiserror::Error;

/// Misconfigured symmetric key. Fatal: never downgraded to plain mode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    /// No key configured but the request needs one.
    #[error("aes key required")]
    Missing,

    /// Key is not valid base64.
    #[error("invalid aes key encoding: {0}")]
    Encoding(#[from] base64::DecodeError),

    /// Key decoded to the wrong number of bytes.
    #[error("invalid aes key: expected 32 bytes, got {0}")]
    InvalidLength(usize),
}

/// Ciphertext that could not be opened.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecryptError {
    #[error("ciphertext is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Length is not a whole number of cipher blocks.
    #[error("ciphertext is not block aligned")]
    Cipher,

    /// Plaintext shorter than the random prefix plus length header.
    #[error("decrypted payload too short ({0} bytes)")]
    TooShort(usize),
}
