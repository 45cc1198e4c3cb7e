//! ykseal-crypto: single-recipient envelope encryption with a token-resident key
//!
//! Encrypt: plaintext → AES-256-CBC (random key, random IV) → RSA PKCS#1 v1.5 wrap of the key → envelope
//!
//! Decrypt: envelope → token deciphers the wrapped key → PKCS#1 v1.5 padding stripped → AES-256-CBC decrypt
//!
//! Envelope format (binary):
//! ```text
//! [2 bytes: wrapped key length N, big-endian][N bytes: wrapped key][16 bytes: IV][ciphertext]
//! ```
//!
//! There is no MAC over the envelope: flipping ciphertext bits corrupts the
//! recovered plaintext without being detected.

pub mod cipher;
pub mod envelope;
pub mod keys;
pub mod padding;
pub mod pipeline;
pub mod token;
pub mod wrap;

pub use cipher::{decrypt_payload, encrypt_payload};
pub use envelope::Envelope;
pub use keys::{generate_key_material, ContentKey, Iv};
pub use padding::{pad_key_block, strip_key_block};
pub use pipeline::{
    decrypt_file, encrypt_file, open, seal, DecryptReport, DecryptRequest, EncryptReport,
    EncryptRequest,
};
pub use token::{SoftwareToken, TokenBackend, TokenSession};
pub use wrap::{inspect_public_key, load_public_key, wrap_content_key, KeySummary};

/// Size of a content key in bytes (AES-256)
pub const KEY_SIZE: usize = 32;

/// Size of the CBC initialization vector
pub const IV_SIZE: usize = 16;

/// AES block size
pub const BLOCK_SIZE: usize = 16;

/// Size of the big-endian wrapped-key length prefix
pub const LENGTH_PREFIX_SIZE: usize = 2;
