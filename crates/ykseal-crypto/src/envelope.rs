//! Envelope serialization
//!
//! ```text
//! offset 0..2      wrapped key length N (u16, big-endian)
//! offset 2..2+N    wrapped key
//! next 16 bytes    IV
//! remainder        AES-256-CBC ciphertext
//! ```
//!
//! `parse` checks structure only. Ciphertext block alignment is left to
//! `cipher::decrypt_payload`, which rejects it.

use ykseal_core::{SealError, SealResult};

use crate::keys::Iv;
use crate::{IV_SIZE, LENGTH_PREFIX_SIZE};

/// Smallest input `parse` will look at: length prefix plus IV.
pub const MIN_ENVELOPE_LEN: usize = LENGTH_PREFIX_SIZE + IV_SIZE;

/// A parsed envelope borrowing from the input buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope<'a> {
    pub wrapped_key: &'a [u8],
    pub iv: Iv,
    pub ciphertext: &'a [u8],
}

impl<'a> Envelope<'a> {
    /// Serialize `wrapped_key`, `iv` and `ciphertext` into one buffer.
    ///
    /// The only failure is a wrapped key too long for the 16-bit prefix.
    pub fn serialize(wrapped_key: &[u8], iv: &Iv, ciphertext: &[u8]) -> SealResult<Vec<u8>> {
        let len = u16::try_from(wrapped_key.len()).map_err(|_| {
            SealError::Format(format!(
                "wrapped key of {} bytes exceeds the 16-bit length field",
                wrapped_key.len()
            ))
        })?;

        let mut out =
            Vec::with_capacity(LENGTH_PREFIX_SIZE + wrapped_key.len() + IV_SIZE + ciphertext.len());
        out.extend_from_slice(&len.to_be_bytes());
        out.extend_from_slice(wrapped_key);
        out.extend_from_slice(iv);
        out.extend_from_slice(ciphertext);
        Ok(out)
    }

    /// Split `bytes` into wrapped key, IV and ciphertext.
    pub fn parse(bytes: &'a [u8]) -> SealResult<Self> {
        if bytes.len() < MIN_ENVELOPE_LEN {
            return Err(SealError::Format("too short".into()));
        }

        let wrapped_len = u16::from_be_bytes([bytes[0], bytes[1]]) as usize;
        let iv_start = LENGTH_PREFIX_SIZE + wrapped_len;
        let ct_start = iv_start + IV_SIZE;
        if bytes.len() < ct_start {
            return Err(SealError::Format("truncated".into()));
        }

        let mut iv = [0u8; IV_SIZE];
        iv.copy_from_slice(&bytes[iv_start..ct_start]);

        Ok(Self {
            wrapped_key: &bytes[LENGTH_PREFIX_SIZE..iv_start],
            iv,
            ciphertext: &bytes[ct_start..],
        })
    }
}
