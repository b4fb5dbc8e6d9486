//! Secret lifecycle and transport: generation, `otpauth://` provisioning,
//! and authenticated encryption for at-rest storage.

use aes_gcm::{
    aead::generic_array::typenum::U16, aes::Aes256, AeadInPlace, AesGcm, Key, KeyInit, Nonce, Tag,
};
use chrono::{DateTime, Duration, Utc};
use rand::{rngs::OsRng, RngCore};

use crate::error::{Result, TwoFactorError};
use crate::totp;

// AES-256-GCM with the 16-byte IV the envelope format mandates.
type Cipher = AesGcm<Aes256, U16>;

pub const SECRET_LENGTH: usize = 20;
pub const MASTER_KEY_LENGTH: usize = 32;
const IV_LENGTH: usize = 16;
const TAG_LENGTH: usize = 16;

/// Minutes a successful verification stays fresh for gating sensitive
/// actions without re-prompting.
pub const DEFAULT_RECENCY_MINUTES: i64 = 5;

/// Generates a new base32-encoded secret from 20 OS-CSPRNG bytes.
pub fn generate_secret() -> String {
    let mut bytes = [0u8; SECRET_LENGTH];
    OsRng.fill_bytes(&mut bytes);
    crate::base32::encode(&bytes)
}

/// Builds the `otpauth://` URI that authenticator apps import from the
/// enrollment QR code.
pub fn provisioning_uri(secret_base32: &str, account_label: &str, issuer: &str) -> String {
    format!(
        "otpauth://totp/{}:{}?secret={}&issuer={}&algorithm=SHA1&digits={}&period={}",
        urlencoding::encode(issuer),
        urlencoding::encode(account_label),
        secret_base32,
        urlencoding::encode(issuer),
        totp::CODE_DIGITS,
        totp::STEP_SECONDS,
    )
}

/// Encrypts a secret for storage under AES-256-GCM.
///
/// Returns the envelope `hex(iv):hex(tag):hex(ciphertext)` with a fresh
/// random 16-byte IV per call.
pub fn encrypt_secret(secret_base32: &str, master_key: &[u8]) -> Result<String> {
    let cipher = build_cipher(master_key)?;

    let mut iv = [0u8; IV_LENGTH];
    OsRng.fill_bytes(&mut iv);

    let mut buffer = secret_base32.as_bytes().to_vec();
    let tag = cipher
        .encrypt_in_place_detached(Nonce::from_slice(&iv), b"", &mut buffer)
        .map_err(|_| TwoFactorError::InvalidInput("secret too large to encrypt".to_string()))?;

    Ok(format!(
        "{}:{}:{}",
        hex::encode(iv),
        hex::encode(tag),
        hex::encode(&buffer)
    ))
}

/// Decrypts a stored envelope back to the base32 secret.
///
/// Tampering with any segment, or a master key other than the one used to
/// encrypt, fails the GCM tag check and surfaces as `IntegrityFailure`.
pub fn decrypt_secret(envelope: &str, master_key: &[u8]) -> Result<String> {
    let cipher = build_cipher(master_key)?;

    let parts: Vec<&str> = envelope.split(':').collect();
    if parts.len() != 3 {
        return Err(TwoFactorError::InvalidInput(
            "encrypted secret must be iv:tag:ciphertext".to_string(),
        ));
    }

    let iv = decode_segment(parts[0], "iv")?;
    let tag = decode_segment(parts[1], "tag")?;
    let mut buffer = decode_segment(parts[2], "ciphertext")?;
    if iv.len() != IV_LENGTH {
        return Err(TwoFactorError::InvalidInput(format!(
            "iv must be {} bytes, got {}",
            IV_LENGTH,
            iv.len()
        )));
    }
    if tag.len() != TAG_LENGTH {
        return Err(TwoFactorError::InvalidInput(format!(
            "tag must be {} bytes, got {}",
            TAG_LENGTH,
            tag.len()
        )));
    }

    cipher
        .decrypt_in_place_detached(Nonce::from_slice(&iv), b"", &mut buffer, Tag::from_slice(&tag))
        .map_err(|_| {
            tracing::warn!("stored two-factor secret failed authenticated decryption");
            TwoFactorError::IntegrityFailure
        })?;

    String::from_utf8(buffer).map_err(|_| TwoFactorError::IntegrityFailure)
}

/// True iff the last successful verification is recent enough to skip
/// re-prompting for a code.
pub fn is_verification_recency_valid(
    last_verified_at: Option<DateTime<Utc>>,
    validity_window: Duration,
) -> bool {
    match last_verified_at {
        Some(at) => Utc::now().signed_duration_since(at) < validity_window,
        None => false,
    }
}

fn build_cipher(master_key: &[u8]) -> Result<Cipher> {
    if master_key.len() != MASTER_KEY_LENGTH {
        return Err(TwoFactorError::InvalidMasterKey(master_key.len()));
    }
    Ok(Cipher::new(Key::<Cipher>::from_slice(master_key)))
}

fn decode_segment(segment: &str, name: &str) -> Result<Vec<u8>> {
    hex::decode(segment)
        .map_err(|_| TwoFactorError::InvalidInput(format!("{} segment is not valid hex", name)))
}
