//! TOTP second-factor core for the Cookbook application.
//!
//! Three layers, leaves first: [`base32`] (RFC 4648 codec for authenticator
//! secrets), [`totp`] (RFC 6238 code computation and windowed verification),
//! and [`secret`] (secret generation, `otpauth://` provisioning, AES-256-GCM
//! envelopes for at-rest storage). [`enrollment`] ties them together as pure
//! state transitions over a caller-owned record; persistence, sessions, and
//! HTTP belong to the embedding application.
//!
//! Everything here is synchronous, CPU-bound, and free of shared mutable
//! state; calls are safe from any number of threads.

pub mod base32;
pub mod config;
pub mod enrollment;
pub mod error;
pub mod secret;
pub mod totp;

pub use config::Config;
pub use enrollment::{EnrollmentSetup, TwoFactor, TwoFactorRecord};
pub use error::{Result, TwoFactorError};
