//! RSA public key loading, content-key wrapping, and key inspection

use rand::{CryptoRng, RngCore};
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::pkcs8::{DecodePublicKey, EncodePublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{Pkcs1v15Encrypt, RsaPublicKey};
use serde::Serialize;
use sha2::{Digest, Sha256};

use ykseal_core::{Algorithm, SealError, SealResult};

use crate::keys::ContentKey;

/// Parse an RSA public key from SPKI (`BEGIN PUBLIC KEY`) or PKCS#1
/// (`BEGIN RSA PUBLIC KEY`) PEM.
pub fn load_public_key(pem_bytes: &[u8]) -> SealResult<RsaPublicKey> {
    let pem = std::str::from_utf8(pem_bytes)
        .map_err(|_| SealError::Format("public key is not valid PEM text".into()))?;
    let pem = pem.trim_start_matches('\u{feff}').trim();

    RsaPublicKey::from_public_key_pem(pem)
        .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
        .map_err(|e| SealError::Format(format!("cannot parse RSA public key: {e}")))
}

/// Reject keys the token could never unwrap for.
pub fn check_key_size(public_key: &RsaPublicKey, algorithm: Algorithm) -> SealResult<()> {
    let bits = public_key.n().bits();
    if bits != algorithm.modulus_bits() {
        return Err(SealError::Format(format!(
            "public key is {bits} bits, token algorithm {algorithm} expects {}",
            algorithm.modulus_bits()
        )));
    }
    Ok(())
}

/// Encrypt the content key to `public_key` with RSAES-PKCS1-v1_5.
///
/// The result is exactly the modulus size in bytes.
pub fn wrap_content_key<R>(
    public_key: &RsaPublicKey,
    key: &ContentKey,
    rng: &mut R,
) -> SealResult<Vec<u8>>
where
    R: RngCore + CryptoRng,
{
    public_key
        .encrypt(rng, Pkcs1v15Encrypt, key.as_bytes())
        .map_err(|e| SealError::Crypto(format!("key wrapping failed: {e}")))
}

/// Printable summary of an RSA public key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeySummary {
    /// Modulus n, uppercase hex
    pub modulus: String,
    /// Public exponent e, uppercase hex
    pub exponent: String,
    pub bits: usize,
    pub bytes: usize,
    /// SHA-256 over the SPKI DER encoding, lowercase hex
    pub fingerprint: String,
}

pub fn inspect_public_key(public_key: &RsaPublicKey) -> SealResult<KeySummary> {
    let der = public_key
        .to_public_key_der()
        .map_err(|e| SealError::Format(format!("encoding public key: {e}")))?;

    Ok(KeySummary {
        modulus: hex::encode_upper(public_key.n().to_bytes_be()),
        exponent: hex::encode_upper(public_key.e().to_bytes_be()),
        bits: public_key.n().bits(),
        bytes: public_key.size(),
        fingerprint: hex::encode(Sha256::digest(der.as_bytes())),
    })
}
