//! PKCS#1 v1.5 encryption padding (block type 2)
//!
//! The token's decipher operation returns the raw RSA plaintext, so the
//! padding has to be removed here:
//!
//! ```text
//! 0x00 || 0x02 || PS (nonzero bytes) || 0x00 || M
//! ```
//!
//! `strip_key_block` is structural only. It does not check that PS is at
//! least 8 bytes, does not run in constant time, and reports distinct errors
//! per failure. That is acceptable for a local tool; anything that exposes it
//! to remote callers turns it into a Bleichenbacher oracle and needs a
//! constant-time, single-error rewrite.

use rand::{CryptoRng, RngCore};
use zeroize::Zeroizing;

use ykseal_core::{SealError, SealResult};

use crate::keys::ContentKey;

/// Minimum PS length for block type 2 (RFC 8017 §7.2.1).
pub const MIN_PADDING_LEN: usize = 8;

/// Build a `block_len`-byte type-2 padded block around `message`.
///
/// PS is filled with nonzero random bytes.
pub fn pad_key_block<R>(
    message: &[u8],
    block_len: usize,
    rng: &mut R,
) -> SealResult<Zeroizing<Vec<u8>>>
where
    R: RngCore + CryptoRng + ?Sized,
{
    if message.len() + MIN_PADDING_LEN + 3 > block_len {
        return Err(SealError::Crypto(format!(
            "message of {} bytes does not fit a {block_len}-byte block",
            message.len()
        )));
    }

    let ps_len = block_len - message.len() - 3;
    let mut block = Zeroizing::new(Vec::with_capacity(block_len));
    block.extend_from_slice(&[0x00, 0x02]);

    let mut byte = [0u8; 1];
    while block.len() < 2 + ps_len {
        rng.try_fill_bytes(&mut byte)
            .map_err(|_| SealError::Crypto("rng failure".into()))?;
        if byte[0] != 0 {
            block.push(byte[0]);
        }
    }

    block.push(0x00);
    block.extend_from_slice(message);
    Ok(block)
}

/// Remove type-2 padding from `block` and return the trailing key.
///
/// Fails with `bad header` unless the block starts `0x00 0x02`, with
/// `missing separator` if no zero byte follows, and with
/// `unexpected key length: N` if the bytes after the separator are not
/// exactly `expected_key_len` long.
pub fn strip_key_block(block: &[u8], expected_key_len: usize) -> SealResult<Zeroizing<Vec<u8>>> {
    if block.len() < 2 || block[0] != 0x00 || block[1] != 0x02 {
        return Err(SealError::Padding("bad header".into()));
    }

    let separator = block[2..]
        .iter()
        .position(|&b| b == 0x00)
        .map(|i| i + 2)
        .ok_or_else(|| SealError::Padding("missing separator".into()))?;

    let actual_key_len = block.len() - (separator + 1);
    if actual_key_len != expected_key_len {
        return Err(SealError::Padding(format!(
            "unexpected key length: {actual_key_len}"
        )));
    }

    Ok(Zeroizing::new(block[separator + 1..].to_vec()))
}

/// Strip the padding and return the recovered content key.
pub fn recover_content_key(block: &[u8]) -> SealResult<ContentKey> {
    let key = strip_key_block(block, crate::KEY_SIZE)?;
    ContentKey::from_slice(&key)
}
