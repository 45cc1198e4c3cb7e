//! PEM private key standing in for a hardware token
//!
//! Performs the raw RSA private operation (`c^d mod n`) so the padded block
//! reaches the pipeline exactly as a PIV device would return it. Not constant
//! time; meant for tests and development machines.

use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use rsa::{BigUint, RsaPrivateKey};
use secrecy::{ExposeSecret, SecretString};
use std::path::Path;
use zeroize::Zeroizing;

use ykseal_core::{Algorithm, KeySlot, SealError, SealResult};

use super::{TokenBackend, TokenSession};

/// A private key held in process memory, bound to one slot.
pub struct SoftwareToken {
    key: RsaPrivateKey,
    slot: KeySlot,
    pin: Option<SecretString>,
}

impl SoftwareToken {
    pub fn new(key: RsaPrivateKey, slot: KeySlot) -> Self {
        Self {
            key,
            slot,
            pin: None,
        }
    }

    /// Parse a PKCS#8 (`BEGIN PRIVATE KEY`) or PKCS#1 (`BEGIN RSA PRIVATE KEY`) PEM.
    pub fn from_pem(pem: &str, slot: KeySlot) -> SealResult<Self> {
        let pem = pem.trim_start_matches('\u{feff}').trim();
        let key = RsaPrivateKey::from_pkcs8_pem(pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
            .map_err(|e| SealError::Format(format!("cannot parse RSA private key: {e}")))?;
        Ok(Self::new(key, slot))
    }

    pub fn from_pem_file(path: &Path, slot: KeySlot) -> SealResult<Self> {
        let pem = Zeroizing::new(std::fs::read_to_string(path).map_err(|e| SealError::io(path, e))?);
        Self::from_pem(&pem, slot)
    }

    /// Require `pin` before deciphering, like a PIV slot with a PIN policy.
    pub fn with_pin(mut self, pin: SecretString) -> Self {
        self.pin = Some(pin);
        self
    }
}

impl std::fmt::Debug for SoftwareToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoftwareToken")
            .field("bits", &self.key.n().bits())
            .field("slot", &self.slot)
            .field("pin", &self.pin.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl TokenBackend for SoftwareToken {
    fn connect(&self) -> SealResult<Box<dyn TokenSession + '_>> {
        Ok(Box::new(SoftwareSession {
            token: self,
            authenticated: self.pin.is_none(),
        }))
    }

    fn describe(&self) -> String {
        format!("software key ({} bits, slot {})", self.key.n().bits(), self.slot)
    }
}

struct SoftwareSession<'a> {
    token: &'a SoftwareToken,
    authenticated: bool,
}

impl TokenSession for SoftwareSession<'_> {
    fn authenticate(&mut self, pin: Option<&SecretString>) -> SealResult<()> {
        let Some(expected) = &self.token.pin else {
            self.authenticated = true;
            return Ok(());
        };
        match pin {
            Some(given) if given.expose_secret() == expected.expose_secret() => {
                self.authenticated = true;
                Ok(())
            }
            Some(_) => Err(SealError::hardware(
                "verify_pin",
                "AUTHENTICATION_ERROR",
                "PIN verification failed",
            )),
            None => Err(SealError::hardware(
                "verify_pin",
                "AUTHENTICATION_ERROR",
                "PIN required but none supplied",
            )),
        }
    }

    fn decipher(
        &mut self,
        block: &[u8],
        algorithm: Algorithm,
        slot: KeySlot,
    ) -> SealResult<Zeroizing<Vec<u8>>> {
        if !self.authenticated {
            return Err(SealError::hardware(
                "decipher",
                "AUTHENTICATION_ERROR",
                "security status not satisfied",
            ));
        }
        if slot != self.token.slot {
            return Err(SealError::hardware(
                "decipher",
                "KEY_ERROR",
                format!("no key in slot {slot}"),
            ));
        }

        let key = &self.token.key;
        let modulus_len = key.size();
        if key.n().bits() != algorithm.modulus_bits() {
            return Err(SealError::hardware(
                "decipher",
                "WRONG_ALGORITHM",
                format!(
                    "slot {slot} holds a {}-bit key, requested {algorithm}",
                    key.n().bits()
                ),
            ));
        }
        if block.len() != modulus_len {
            return Err(SealError::hardware(
                "decipher",
                "SIZE_ERROR",
                format!("input is {} bytes, expected {modulus_len}", block.len()),
            ));
        }

        let c = BigUint::from_bytes_be(block);
        if &c >= key.n() {
            return Err(SealError::hardware(
                "decipher",
                "GENERIC_ERROR",
                "input out of range for modulus",
            ));
        }

        let m = Zeroizing::new(c.modpow(key.d(), key.n()).to_bytes_be());
        let mut out = Zeroizing::new(vec![0u8; modulus_len]);
        out[modulus_len - m.len()..].copy_from_slice(&m);
        Ok(out)
    }
}
