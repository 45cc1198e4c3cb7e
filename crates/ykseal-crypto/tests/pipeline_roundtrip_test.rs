//! End-to-end tests for the envelope pipeline.
//!
//! Fixtures under `fixtures/` were produced with openssl:
//! - `rsa2048_*.pem`: a 2048-bit key pair
//! - `hello_world.ykenv`: `"Hello, world!"` sealed with AES-256-CBC
//!   (key 00..1f, IV a0..af) and the key wrapped with `pkeyutl -pkeyopt rsa_padding_mode:pkcs1`

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use secrecy::SecretString;
use std::path::Path;
use zeroize::Zeroizing;

use ykseal_core::{Algorithm, KeySlot, SealError, SealResult};
use ykseal_crypto::token::{TokenBackend, TokenSession};
use ykseal_crypto::{
    decrypt_file, encrypt_file, encrypt_payload, load_public_key, open, pad_key_block, seal,
    ContentKey, DecryptRequest, EncryptRequest, Envelope, SoftwareToken,
};

const PRIVATE_PEM: &str = include_str!("fixtures/rsa2048_private.pem");
const PUBLIC_PEM: &str = include_str!("fixtures/rsa2048_public.pem");
const HELLO_ENVELOPE: &[u8] = include_bytes!("fixtures/hello_world.ykenv");

fn software_token() -> SoftwareToken {
    SoftwareToken::from_pem(PRIVATE_PEM, KeySlot::Authentication).unwrap()
}

fn fixed_key_bytes() -> [u8; 32] {
    let mut k = [0u8; 32];
    for (i, b) in k.iter_mut().enumerate() {
        *b = i as u8;
    }
    k
}

fn fixed_iv() -> [u8; 16] {
    let mut iv = [0u8; 16];
    for (i, b) in iv.iter_mut().enumerate() {
        *b = 0xa0 + i as u8;
    }
    iv
}

/// Stands in for a token: ignores its input and returns a canned block.
struct CannedToken {
    block: Vec<u8>,
}

struct CannedSession<'a> {
    block: &'a [u8],
}

impl TokenBackend for CannedToken {
    fn connect(&self) -> SealResult<Box<dyn TokenSession + '_>> {
        Ok(Box::new(CannedSession { block: &self.block }))
    }

    fn describe(&self) -> String {
        "canned".into()
    }
}

impl TokenSession for CannedSession<'_> {
    fn authenticate(&mut self, _pin: Option<&SecretString>) -> SealResult<()> {
        Ok(())
    }

    fn decipher(
        &mut self,
        _block: &[u8],
        _algorithm: Algorithm,
        _slot: KeySlot,
    ) -> SealResult<Zeroizing<Vec<u8>>> {
        Ok(Zeroizing::new(self.block.to_vec()))
    }
}

/// A token that is never plugged in.
struct AbsentToken;

impl TokenBackend for AbsentToken {
    fn connect(&self) -> SealResult<Box<dyn TokenSession + '_>> {
        Err(SealError::hardware(
            "connect",
            "PCSC_ERROR",
            "no smart card reader found",
        ))
    }

    fn describe(&self) -> String {
        "absent".into()
    }
}

/// `00 02 <nonzero PS> 00 <key>`, 256 bytes.
fn padded_block(key: &[u8]) -> Vec<u8> {
    padded_block_of_len(key, 256)
}

fn padded_block_of_len(key: &[u8], len: usize) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(len as u64);
    pad_key_block(key, len, &mut rng).unwrap().to_vec()
}

/// An envelope with a placeholder wrapped key, for use with `CannedToken`.
fn hello_envelope_fixed_key() -> Vec<u8> {
    let key = ContentKey::from_bytes(fixed_key_bytes());
    let ct = encrypt_payload(&key, &fixed_iv(), b"Hello, world!");
    Envelope::serialize(&[0xAA; 256], &fixed_iv(), &ct).unwrap()
}

fn decrypt_request<'a>(input: &'a Path, output: &'a Path) -> DecryptRequest<'a> {
    DecryptRequest {
        input,
        output,
        algorithm: Algorithm::Rsa2048,
        slot: KeySlot::Authentication,
        pin: None,
    }
}

#[test]
fn openssl_envelope_decrypts() {
    let plaintext = open(
        HELLO_ENVELOPE,
        &software_token(),
        Algorithm::Rsa2048,
        KeySlot::Authentication,
        None,
    )
    .expect("openssl-produced envelope should decrypt");
    assert_eq!(plaintext.as_slice(), b"Hello, world!");

    let env = Envelope::parse(HELLO_ENVELOPE).unwrap();
    assert_eq!(env.wrapped_key.len(), 256);
    assert_eq!(env.iv, fixed_iv());
    assert_eq!(env.ciphertext, hex_ct().as_slice());
}

fn hex_ct() -> Vec<u8> {
    vec![
        0x9d, 0x37, 0x67, 0x01, 0x28, 0xc1, 0xfa, 0xb6, 0x46, 0x14, 0xb9, 0xc8, 0x0b, 0x10, 0x4d,
        0xe1,
    ]
}

#[test]
fn canned_unwrap_recovers_fixed_key_and_plaintext() {
    let envelope = hello_envelope_fixed_key();
    assert_eq!(Envelope::parse(&envelope).unwrap().ciphertext, hex_ct().as_slice());

    let token = CannedToken {
        block: padded_block(&fixed_key_bytes()),
    };
    let plaintext = open(
        &envelope,
        &token,
        Algorithm::Rsa2048,
        KeySlot::Authentication,
        None,
    )
    .unwrap();
    assert_eq!(plaintext.len(), 13);
    assert_eq!(plaintext.as_slice(), b"Hello, world!");
}

#[test]
fn padding_failures_surface_as_padding_errors() {
    let envelope = hello_envelope_fixed_key();

    let mut bad_header = padded_block(&fixed_key_bytes());
    bad_header[1] = 0x01;

    let mut no_separator = padded_block(&fixed_key_bytes());
    let sep = 256 - 32 - 1;
    no_separator[sep] = 0x42;
    for b in no_separator[sep..].iter_mut() {
        if *b == 0 {
            *b = 0x42;
        }
    }

    let short_key = padded_block(&fixed_key_bytes()[..16]);
    let short_block = padded_block_of_len(&fixed_key_bytes(), 255);

    for (block, expected) in [
        (bad_header, "bad header".to_string()),
        (no_separator, "missing separator".to_string()),
        (short_key, "unexpected key length: 16".to_string()),
        (short_block, "unexpected block length: 255".to_string()),
    ] {
        let err = open(
            &envelope,
            &CannedToken { block },
            Algorithm::Rsa2048,
            KeySlot::Authentication,
            None,
        )
        .unwrap_err();
        assert!(
            matches!(err, SealError::Padding(ref m) if *m == expected),
            "expected {expected}, got {err}"
        );
    }
}

#[test]
fn ciphertext_tampering_goes_undetected() {
    let mut rng = StdRng::seed_from_u64(2024);
    let public_key = load_public_key(PUBLIC_PEM.as_bytes()).unwrap();
    let original = b"transfer 100 units to account 42, memo: rent".to_vec();
    let mut envelope = seal(&original, &public_key, Algorithm::Rsa2048, &mut rng).unwrap();

    // First ciphertext byte: garbles block 0 and flips a bit in block 1, padding untouched.
    let ct_offset = 2 + 256 + 16;
    envelope[ct_offset] ^= 0x80;

    let recovered = open(
        &envelope,
        &software_token(),
        Algorithm::Rsa2048,
        KeySlot::Authentication,
        None,
    )
    .expect("no integrity check exists, so decryption succeeds");
    assert_eq!(recovered.len(), original.len());
    assert_ne!(recovered.as_slice(), original.as_slice());
    assert_eq!(recovered[16], original[16] ^ 0x80);
}

#[test]
fn misaligned_ciphertext_is_rejected_after_unwrap() {
    let mut envelope = hello_envelope_fixed_key();
    envelope.push(0x00);
    let token = CannedToken {
        block: padded_block(&fixed_key_bytes()),
    };
    let err = open(
        &envelope,
        &token,
        Algorithm::Rsa2048,
        KeySlot::Authentication,
        None,
    )
    .unwrap_err();
    assert!(matches!(err, SealError::Crypto(ref m) if m == "invalid length"));
}

#[test]
fn hardware_failure_leaves_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("hello.ykenv");
    let output = dir.path().join("hello.txt");
    std::fs::write(&input, HELLO_ENVELOPE).unwrap();

    let err = decrypt_file(&decrypt_request(&input, &output), &AbsentToken).unwrap_err();
    assert!(
        matches!(err, SealError::Hardware { operation: "connect", ref code, .. } if code == "PCSC_ERROR")
    );
    assert!(!output.exists());
}

#[test]
fn decrypt_failure_keeps_existing_output_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("short.ykenv");
    let output = dir.path().join("existing.txt");
    std::fs::write(&input, [0u8; 17]).unwrap();
    std::fs::write(&output, b"previous contents").unwrap();

    let err = decrypt_file(&decrypt_request(&input, &output), &software_token()).unwrap_err();
    assert!(matches!(err, SealError::Format(ref m) if m == "too short"));
    assert_eq!(std::fs::read(&output).unwrap(), b"previous contents");
}

#[test]
fn truncated_envelope_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("cut.ykenv");
    let output = dir.path().join("cut.txt");
    std::fs::write(&input, &HELLO_ENVELOPE[..200]).unwrap();

    let err = decrypt_file(&decrypt_request(&input, &output), &software_token()).unwrap_err();
    assert!(matches!(err, SealError::Format(ref m) if m == "truncated"));
    assert!(!output.exists());
}

#[test]
fn pin_protected_token_through_file_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let plain = dir.path().join("notes.txt");
    let key = dir.path().join("pub.pem");
    let sealed = dir.path().join("notes.ykenv");
    let restored = dir.path().join("notes.out");
    std::fs::write(&plain, b"meet at the usual place").unwrap();
    std::fs::write(&key, PUBLIC_PEM).unwrap();

    encrypt_file(
        &EncryptRequest {
            input: &plain,
            public_key: &key,
            output: &sealed,
            algorithm: Algorithm::Rsa2048,
        },
        &mut rand::rngs::OsRng,
    )
    .unwrap();

    let token = software_token().with_pin(SecretString::from("246810".to_string()));

    let err = decrypt_file(&decrypt_request(&sealed, &restored), &token).unwrap_err();
    assert!(matches!(err, SealError::Hardware { .. }));
    assert!(!restored.exists());

    let pin = SecretString::from("246810".to_string());
    let mut request = decrypt_request(&sealed, &restored);
    request.pin = Some(&pin);
    decrypt_file(&request, &token).unwrap();
    assert_eq!(std::fs::read(&restored).unwrap(), b"meet at the usual place");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn seal_open_roundtrip(
        plaintext in proptest::collection::vec(any::<u8>(), 1..=2048),
        seed in any::<u64>(),
    ) {
        let public_key = load_public_key(PUBLIC_PEM.as_bytes()).unwrap();
        let mut rng = StdRng::seed_from_u64(seed);
        let envelope = seal(&plaintext, &public_key, Algorithm::Rsa2048, &mut rng).unwrap();

        let declared = u16::from_be_bytes([envelope[0], envelope[1]]) as usize;
        prop_assert_eq!(declared, 256);
        prop_assert!(envelope.len() >= 18);

        let recovered = open(
            &envelope,
            &software_token(),
            Algorithm::Rsa2048,
            KeySlot::Authentication,
            None,
        )
        .unwrap();
        prop_assert_eq!(recovered.as_slice(), plaintext.as_slice());
    }
}
