//! YubiKey PIV backend

use secrecy::{ExposeSecret, SecretString};
use yubikey::piv::{self, AlgorithmId, SlotId};
use yubikey::YubiKey;
use zeroize::Zeroizing;

use ykseal_core::{Algorithm, KeySlot, SealError, SealResult};

use super::{TokenBackend, TokenSession};

/// The first YubiKey found on the system's PC/SC readers.
#[derive(Debug, Default)]
pub struct PivToken;

impl PivToken {
    pub fn new() -> Self {
        Self
    }
}

fn device_error(operation: &'static str, e: yubikey::Error) -> SealError {
    // Debug gives the variant name (e.g. `WrongPin { tries: 2 }`), Display the description.
    SealError::hardware(operation, format!("{e:?}"), e.to_string())
}

fn algorithm_id(algorithm: Algorithm) -> AlgorithmId {
    match algorithm {
        Algorithm::Rsa1024 => AlgorithmId::Rsa1024,
        Algorithm::Rsa2048 => AlgorithmId::Rsa2048,
    }
}

fn slot_id(slot: KeySlot) -> SlotId {
    match slot {
        KeySlot::Authentication => SlotId::Authentication,
        KeySlot::Signature => SlotId::Signature,
        KeySlot::KeyManagement => SlotId::KeyManagement,
        KeySlot::CardAuthentication => SlotId::CardAuthentication,
    }
}

impl TokenBackend for PivToken {
    fn connect(&self) -> SealResult<Box<dyn TokenSession + '_>> {
        let yubikey = YubiKey::open().map_err(|e| device_error("connect", e))?;
        tracing::debug!(serial = %yubikey.serial(), "connected to YubiKey");
        Ok(Box::new(PivSession { yubikey }))
    }

    fn describe(&self) -> String {
        "YubiKey PIV".into()
    }
}

/// Disconnects when the `YubiKey` handle drops.
struct PivSession {
    yubikey: YubiKey,
}

impl TokenSession for PivSession {
    fn authenticate(&mut self, pin: Option<&SecretString>) -> SealResult<()> {
        match pin {
            Some(pin) => self
                .yubikey
                .verify_pin(pin.expose_secret().as_bytes())
                .map_err(|e| device_error("verify_pin", e)),
            // Slots with PIN policy "never" need nothing; others fail at decipher.
            None => Ok(()),
        }
    }

    fn decipher(
        &mut self,
        block: &[u8],
        algorithm: Algorithm,
        slot: KeySlot,
    ) -> SealResult<Zeroizing<Vec<u8>>> {
        let out = piv::decrypt_data(
            &mut self.yubikey,
            block,
            algorithm_id(algorithm),
            slot_id(slot),
        )
        .map_err(|e| device_error("decipher", e))?;
        Ok(Zeroizing::new(out.to_vec()))
    }
}
