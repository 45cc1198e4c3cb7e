//! Encrypt and decrypt drivers
//!
//! Encrypt: read input → generate key material → encrypt payload → wrap key → serialize → write output
//!
//! Decrypt: read input → parse envelope → unwrap key on the token → strip padding → decrypt payload → write output
//!
//! Every stage is terminal on failure. The output path is written once, after
//! all earlier stages succeeded, so a failed run never leaves partial output.
//! Inputs are read fully into memory.

use rand::{CryptoRng, RngCore};
use rsa::traits::PublicKeyParts;
use rsa::RsaPublicKey;
use secrecy::SecretString;
use std::path::Path;
use tracing::debug;
use zeroize::Zeroizing;

use ykseal_core::{Algorithm, KeySlot, SealError, SealResult};

use crate::cipher::{decrypt_payload, encrypt_payload};
use crate::envelope::Envelope;
use crate::keys::generate_key_material;
use crate::padding::recover_content_key;
use crate::token::TokenBackend;
use crate::wrap::{check_key_size, load_public_key, wrap_content_key};

/// Encrypt `plaintext` into a serialized envelope addressed to `public_key`.
pub fn seal<R>(
    plaintext: &[u8],
    public_key: &RsaPublicKey,
    algorithm: Algorithm,
    rng: &mut R,
) -> SealResult<Vec<u8>>
where
    R: RngCore + CryptoRng,
{
    if plaintext.is_empty() {
        return Err(SealError::Usage("plaintext is empty".into()));
    }
    check_key_size(public_key, algorithm)?;

    let (key, iv) = generate_key_material(rng)?;
    debug!(stage = "generate_key_material", "content key and IV generated");

    let ciphertext = encrypt_payload(&key, &iv, plaintext);
    debug!(stage = "encrypt_payload", ciphertext_len = ciphertext.len(), "payload encrypted");

    let wrapped = wrap_content_key(public_key, &key, rng)?;
    debug!(stage = "wrap_key", wrapped_key_len = wrapped.len(), "content key wrapped");

    Envelope::serialize(&wrapped, &iv, &ciphertext)
}

/// Decrypt a serialized envelope, asking `token` to unwrap the content key.
///
/// Performs one connect → authenticate → decipher cycle; the session is
/// dropped (disconnecting) before the payload is decrypted.
pub fn open(
    envelope: &[u8],
    token: &dyn TokenBackend,
    algorithm: Algorithm,
    slot: KeySlot,
    pin: Option<&SecretString>,
) -> SealResult<Zeroizing<Vec<u8>>> {
    let env = Envelope::parse(envelope)?;
    debug!(
        stage = "parse_envelope",
        wrapped_key_len = env.wrapped_key.len(),
        ciphertext_len = env.ciphertext.len(),
        "envelope parsed"
    );

    let block = {
        let mut session = token.connect()?;
        session.authenticate(pin)?;
        session.decipher(env.wrapped_key, algorithm, slot)?
    };
    if block.len() != algorithm.modulus_len() {
        return Err(SealError::Padding(format!(
            "unexpected block length: {}",
            block.len()
        )));
    }
    debug!(
        stage = "unwrap_key",
        token = %token.describe(),
        %algorithm,
        algorithm_id = algorithm.piv_id(),
        %slot,
        block_len = block.len(),
        "wrapped key deciphered"
    );

    let key = recover_content_key(&block)?;
    drop(block);
    debug!(stage = "strip_padding", "content key recovered");

    decrypt_payload(&key, &env.iv, env.ciphertext)
}

pub struct EncryptRequest<'a> {
    pub input: &'a Path,
    pub public_key: &'a Path,
    pub output: &'a Path,
    pub algorithm: Algorithm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncryptReport {
    pub bytes_in: usize,
    pub bytes_out: usize,
    pub wrapped_key_len: usize,
}

/// Encrypt `request.input` to `request.output`.
pub fn encrypt_file<R>(request: &EncryptRequest<'_>, rng: &mut R) -> SealResult<EncryptReport>
where
    R: RngCore + CryptoRng,
{
    let plaintext = Zeroizing::new(read_input(request.input)?);
    if plaintext.is_empty() {
        return Err(SealError::Usage(format!(
            "plaintext {} is empty",
            request.input.display()
        )));
    }
    let pem = read_input(request.public_key)?;
    let public_key = load_public_key(&pem)?;
    debug!(
        stage = "read_input",
        input = %request.input.display(),
        bytes = plaintext.len(),
        "inputs loaded"
    );

    let envelope = seal(&plaintext, &public_key, request.algorithm, rng)?;

    write_output(request.output, &envelope)?;
    let report = EncryptReport {
        bytes_in: plaintext.len(),
        bytes_out: envelope.len(),
        wrapped_key_len: public_key.size(),
    };
    debug!(
        output = %request.output.display(),
        bytes_in = report.bytes_in,
        bytes_out = report.bytes_out,
        "encryption complete"
    );
    Ok(report)
}

pub struct DecryptRequest<'a> {
    pub input: &'a Path,
    pub output: &'a Path,
    pub algorithm: Algorithm,
    pub slot: KeySlot,
    pub pin: Option<&'a SecretString>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecryptReport {
    pub bytes_in: usize,
    pub bytes_out: usize,
    pub wrapped_key_len: usize,
}

/// Decrypt `request.input` to `request.output` using `token`.
pub fn decrypt_file(
    request: &DecryptRequest<'_>,
    token: &dyn TokenBackend,
) -> SealResult<DecryptReport> {
    let envelope = read_input(request.input)?;
    debug!(
        stage = "read_input",
        input = %request.input.display(),
        bytes = envelope.len(),
        "envelope loaded"
    );

    let plaintext = open(
        &envelope,
        token,
        request.algorithm,
        request.slot,
        request.pin,
    )?;

    write_output(request.output, &plaintext)?;
    let report = DecryptReport {
        bytes_in: envelope.len(),
        bytes_out: plaintext.len(),
        wrapped_key_len: usize::from(u16::from_be_bytes([envelope[0], envelope[1]])),
    };
    debug!(
        output = %request.output.display(),
        bytes_in = report.bytes_in,
        bytes_out = report.bytes_out,
        "decryption complete"
    );
    Ok(report)
}

fn read_input(path: &Path) -> SealResult<Vec<u8>> {
    std::fs::read(path).map_err(|e| SealError::io(path, e))
}

fn write_output(path: &Path, data: &[u8]) -> SealResult<()> {
    std::fs::write(path, data).map_err(|e| SealError::io(path, e))?;
    debug!(stage = "write_output", output = %path.display(), bytes = data.len(), "output written");
    Ok(())
}
