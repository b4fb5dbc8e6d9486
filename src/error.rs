use thiserror::Error;

pub type Result<T> = std::result::Result<T, TwoFactorError>;

/// Failure taxonomy for the second-factor core.
///
/// A wrong code is not an error; verification reports that as `false`.
#[derive(Debug, Error)]
pub enum TwoFactorError {
    /// Malformed caller input: bad envelope shape, bad hex, bad IV/tag length.
    #[error("{0}")]
    InvalidInput(String),

    /// The master key is not exactly 32 raw bytes.
    #[error("master key must be 32 bytes, got {0}")]
    InvalidMasterKey(usize),

    /// GCM authentication failed: the envelope was tampered with or was
    /// encrypted under a different master key. Never treated as "secret
    /// absent" and never decrypted to garbage.
    #[error("encrypted secret failed authentication")]
    IntegrityFailure,

    /// Startup-class misconfiguration, e.g. the master key variable unset.
    #[error("configuration error: {0}")]
    Configuration(String),
}
