//! Private-key token capability
//!
//! The private key never leaves the token; the pipeline only sees what
//! `decipher` hands back: the raw RSA plaintext, padding included. A session
//! is opened once per invocation and disconnects when dropped.

use secrecy::SecretString;
use zeroize::Zeroizing;

use ykseal_core::{Algorithm, KeySlot, SealResult};

#[cfg(feature = "piv")]
pub mod piv;
pub mod software;

#[cfg(feature = "piv")]
pub use piv::PivToken;
pub use software::SoftwareToken;

/// Something that can open a session to a private-key holder.
pub trait TokenBackend {
    /// Open an exclusive session. Fails if the token is absent or unreachable.
    fn connect(&self) -> SealResult<Box<dyn TokenSession + '_>>;

    /// Short human-readable description, for logs.
    fn describe(&self) -> String;
}

/// An open session with a token.
pub trait TokenSession {
    /// Satisfy the token's PIN policy. `None` means no PIN was supplied.
    fn authenticate(&mut self, pin: Option<&SecretString>) -> SealResult<()>;

    /// Apply the private key in `slot` to `block` and return the raw result,
    /// left-padded to the modulus length.
    fn decipher(
        &mut self,
        block: &[u8],
        algorithm: Algorithm,
        slot: KeySlot,
    ) -> SealResult<Zeroizing<Vec<u8>>>;
}
