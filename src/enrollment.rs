//! Enrollment state over a caller-owned record.
//!
//! Persistence stays with the caller; this module only drives the
//! not-enrolled / pending / enabled transitions using the pure primitives
//! from [`crate::secret`] and [`crate::totp`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::Result;
use crate::{secret, totp};

/// The second-factor columns of an account record.
///
/// `encrypted_secret` holds the `iv:tag:ciphertext` envelope, never the
/// plaintext secret.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TwoFactorRecord {
    pub encrypted_secret: Option<String>,
    pub enabled: bool,
    pub verified_at: Option<DateTime<Utc>>,
}

impl TwoFactorRecord {
    pub fn is_enabled(&self) -> bool {
        self.encrypted_secret.is_some() && self.enabled
    }

    /// A secret has been issued but the user has not yet confirmed a code.
    pub fn has_pending_enrollment(&self) -> bool {
        self.encrypted_secret.is_some() && !self.enabled
    }
}

/// Returned from enrollment for the one-time reveal to the user.
///
/// The plaintext secret and URI are shown/scanned once and must not be
/// persisted; only the record's envelope is.
pub struct EnrollmentSetup {
    pub secret_base32: String,
    pub provisioning_uri: String,
}

/// Drives the second-factor lifecycle for one configuration.
#[derive(Debug, Clone)]
pub struct TwoFactor {
    config: Config,
}

impl TwoFactor {
    pub fn new(config: Config) -> Self {
        TwoFactor { config }
    }

    /// Issues a fresh secret and stores its envelope on the record.
    ///
    /// Re-enrollment overwrites any previous secret and drops the enabled
    /// flag until the new secret is confirmed.
    pub fn begin_enrollment(
        &self,
        record: &mut TwoFactorRecord,
        account_label: &str,
    ) -> Result<EnrollmentSetup> {
        let secret_base32 = secret::generate_secret();
        let provisioning_uri =
            secret::provisioning_uri(&secret_base32, account_label, &self.config.issuer);
        let envelope = secret::encrypt_secret(&secret_base32, &self.config.master_key)?;

        record.encrypted_secret = Some(envelope);
        record.enabled = false;
        record.verified_at = None;
        tracing::debug!("two-factor enrollment started");

        Ok(EnrollmentSetup {
            secret_base32,
            provisioning_uri,
        })
    }

    /// Confirms a pending enrollment with a code from the authenticator app.
    ///
    /// `Ok(false)` leaves the record pending so the caller can retry or
    /// re-enroll; errors surface decryption or configuration problems.
    pub fn confirm_enrollment(&self, record: &mut TwoFactorRecord, code: &str) -> Result<bool> {
        if !record.has_pending_enrollment() {
            return Ok(false);
        }
        if !self.check_code(record, code)? {
            return Ok(false);
        }
        record.enabled = true;
        record.verified_at = Some(Utc::now());
        tracing::info!("two-factor enrollment confirmed");
        Ok(true)
    }

    /// Verifies a code against an enabled record, stamping `verified_at` on
    /// success.
    pub fn verify_code(&self, record: &mut TwoFactorRecord, code: &str) -> Result<bool> {
        if !record.is_enabled() {
            return Ok(false);
        }
        if !self.check_code(record, code)? {
            return Ok(false);
        }
        record.verified_at = Some(Utc::now());
        Ok(true)
    }

    /// Disables the second factor, destroying the stored envelope.
    pub fn disable(&self, record: &mut TwoFactorRecord) {
        record.encrypted_secret = None;
        record.enabled = false;
        record.verified_at = None;
        tracing::info!("two-factor disabled");
    }

    /// True iff the record's last verification falls inside the configured
    /// grace period.
    pub fn is_recently_verified(&self, record: &TwoFactorRecord) -> bool {
        secret::is_verification_recency_valid(record.verified_at, self.config.recency_window())
    }

    fn check_code(&self, record: &TwoFactorRecord, code: &str) -> Result<bool> {
        let envelope = match record.encrypted_secret.as_deref() {
            Some(envelope) => envelope,
            None => return Ok(false),
        };
        let secret_base32 = secret::decrypt_secret(envelope, &self.config.master_key)?;
        Ok(totp::verify(code, &secret_base32))
    }
}
