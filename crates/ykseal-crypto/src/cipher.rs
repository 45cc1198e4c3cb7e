//! AES-256-CBC payload encryption with PKCS#7 padding
//!
//! Padding is always added, so the ciphertext of an `n`-byte plaintext is
//! `(n / 16 + 1) * 16` bytes. There is no authentication tag.

use aes::Aes256;
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use zeroize::Zeroizing;

use ykseal_core::{SealError, SealResult};

use crate::keys::{ContentKey, Iv};
use crate::BLOCK_SIZE;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Encrypt `plaintext` under `key` and `iv`.
pub fn encrypt_payload(key: &ContentKey, iv: &Iv, plaintext: &[u8]) -> Vec<u8> {
    Aes256CbcEnc::new(key.as_bytes().into(), iv.into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext)
}

/// Decrypt `ciphertext` under `key` and `iv`, removing PKCS#7 padding.
///
/// Fails with `invalid length` unless the ciphertext is a positive multiple of
/// the block size, and with `invalid padding` if the trailing pad bytes are
/// malformed. Nothing is returned on failure.
pub fn decrypt_payload(
    key: &ContentKey,
    iv: &Iv,
    ciphertext: &[u8],
) -> SealResult<Zeroizing<Vec<u8>>> {
    if ciphertext.is_empty() || ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(SealError::Crypto("invalid length".into()));
    }

    Aes256CbcDec::new(key.as_bytes().into(), iv.into())
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map(Zeroizing::new)
        .map_err(|_| SealError::Crypto("invalid padding".into()))
}
