//! Content key and IV generation

use rand::{CryptoRng, RngCore};
use zeroize::Zeroize;

use ykseal_core::{SealError, SealResult};

use crate::{IV_SIZE, KEY_SIZE};

/// Per-file initialization vector
pub type Iv = [u8; IV_SIZE];

/// A per-file 256-bit content key. Zeroized on drop.
#[derive(Clone)]
pub struct ContentKey {
    bytes: [u8; KEY_SIZE],
}

impl ContentKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    /// Copy a key out of a recovered block. The slice must be exactly `KEY_SIZE` bytes.
    pub fn from_slice(bytes: &[u8]) -> SealResult<Self> {
        let bytes: [u8; KEY_SIZE] = bytes.try_into().map_err(|_| {
            SealError::Padding(format!("unexpected key length: {}", bytes.len()))
        })?;
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for ContentKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for ContentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Draw a fresh content key and IV (32 + 16 bytes) from `rng`.
pub fn generate_key_material<R>(rng: &mut R) -> SealResult<(ContentKey, Iv)>
where
    R: RngCore + CryptoRng + ?Sized,
{
    let mut key = [0u8; KEY_SIZE];
    let mut iv = [0u8; IV_SIZE];

    let filled = rng
        .try_fill_bytes(&mut key)
        .and_then(|()| rng.try_fill_bytes(&mut iv));
    if let Err(e) = filled {
        key.zeroize();
        tracing::debug!(error = %e, "random source failed");
        return Err(SealError::Crypto("rng failure".into()));
    }

    let content_key = ContentKey::from_bytes(key);
    key.zeroize();
    Ok((content_key, iv))
}
