use serde::{Deserialize, Serialize};
use std::fmt;

/// Asymmetric algorithm the token's private key uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    Rsa1024,
    #[default]
    Rsa2048,
}

impl Algorithm {
    /// PIV algorithm identifier (SP 800-78).
    pub fn piv_id(self) -> u8 {
        match self {
            Self::Rsa1024 => 0x06,
            Self::Rsa2048 => 0x07,
        }
    }

    pub fn modulus_bits(self) -> usize {
        match self {
            Self::Rsa1024 => 1024,
            Self::Rsa2048 => 2048,
        }
    }

    /// Size of a wrapped key block, and of the padded block the token returns.
    pub fn modulus_len(self) -> usize {
        self.modulus_bits() / 8
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rsa1024 => f.write_str("RSA1024"),
            Self::Rsa2048 => f.write_str("RSA2048"),
        }
    }
}

/// PIV key slot holding the private key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum KeySlot {
    #[default]
    #[serde(rename = "9a")]
    Authentication,
    #[serde(rename = "9c")]
    Signature,
    #[serde(rename = "9d")]
    KeyManagement,
    #[serde(rename = "9e")]
    CardAuthentication,
}

impl KeySlot {
    pub fn id(self) -> u8 {
        match self {
            Self::Authentication => 0x9a,
            Self::Signature => 0x9c,
            Self::KeyManagement => 0x9d,
            Self::CardAuthentication => 0x9e,
        }
    }
}

impl fmt::Display for KeySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}", self.id())
    }
}
