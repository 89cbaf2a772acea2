//! Message crypto subsystem.
//!
//! # Data Flow
//! ```text
//! token, timestamp, nonce, [ciphertext | echostr]
//!     → signature.rs (sort, concat, SHA-1 hex)
//!
//! configured aes_key (43 chars, unpadded base64)
//!     → cipher.rs AesKey::decode (32 bytes, IV = first 16)
//!     → decrypt: base64 → AES-256-CBC → unpad → random/len/message/id
//!     → encrypt: random/len/message/id → pad(32) → AES-256-CBC → base64
//! ```
//!
//! # Design Decisions
//! - All functions are pure and synchronous
//! - Key errors are configuration errors and are always surfaced
//! - Decrypt errors carry detail for server-side logs only

pub mod cipher;
pub mod error;
pub mod signature;

pub use cipher::{decrypt, encrypt, AesKey, Decrypted};
pub use error::{DecryptError, KeyError};
pub use signature::sign;
