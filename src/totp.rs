//! RFC 6238 TOTP engine: HMAC-SHA1 over a 30-second time-step counter,
//! truncated to 6 digits per RFC 4226.

use hmac::{Hmac, Mac};
use sha1::Sha1;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::base32;

type HmacSha1 = Hmac<Sha1>;

pub const CODE_DIGITS: usize = 6;
pub const STEP_SECONDS: u64 = 30;
/// Steps checked on either side of "now", tolerating ±30s of clock skew.
pub const DEFAULT_WINDOW: u64 = 1;

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Current time-step counter, `floor(unix_now / 30)`.
pub fn current_time_step() -> u64 {
    unix_now() / STEP_SECONDS
}

/// Computes the 6-digit code for a secret at a given time-step counter.
///
/// Deterministic: identical inputs always yield the identical code. A secret
/// that decodes to zero bytes keys the HMAC with an empty key rather than
/// failing; enrollment only ever issues 20-byte secrets.
pub fn compute_code(secret_base32: &str, time_step: u64) -> String {
    let key = base32::decode(secret_base32);
    let mut mac = HmacSha1::new_from_slice(&key).expect("HMAC-SHA1 accepts any key length");
    mac.update(&time_step.to_be_bytes());
    let digest = mac.finalize().into_bytes();

    // Dynamic truncation (RFC 4226 5.3): 31-bit big-endian integer read at
    // an offset taken from the digest's own last nibble.
    let offset = (digest[19] & 0x0f) as usize;
    let binary = u32::from_be_bytes([
        digest[offset] & 0x7f,
        digest[offset + 1],
        digest[offset + 2],
        digest[offset + 3],
    ]);

    format!("{:06}", binary % 1_000_000)
}

/// Computes the code for the current wall-clock step.
pub fn code_for_current_time(secret_base32: &str) -> String {
    compute_code(secret_base32, current_time_step())
}

/// Verifies a user-supplied code against the current time with the default
/// ±1 step window.
pub fn verify(presented_code: &str, secret_base32: &str) -> bool {
    verify_with_window(presented_code, secret_base32, DEFAULT_WINDOW)
}

/// Verifies a user-supplied code, checking every step in
/// `[current - window, current + window]`.
///
/// Stateless: replay bookkeeping within the window is the caller's concern.
pub fn verify_with_window(presented_code: &str, secret_base32: &str, window: u64) -> bool {
    verify_at(presented_code, secret_base32, window, unix_now())
}

/// Same check evaluated at an explicit Unix timestamp.
pub fn verify_at(presented_code: &str, secret_base32: &str, window: u64, unix_time: u64) -> bool {
    let code: String = presented_code
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if code.len() != CODE_DIGITS || !code.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }

    let current = unix_time / STEP_SECONDS;
    let start = current.saturating_sub(window);
    let end = current.saturating_add(window);
    (start..=end).any(|step| compute_code(secret_base32, step) == code)
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 6238 Appendix B vectors for the SHA-1 mode, reduced modulo 10^6
    // from the published 8-digit codes.
    const RFC_SECRET: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

    #[test]
    fn rfc6238_appendix_b_vectors() {
        let cases: &[(u64, &str)] = &[
            (59, "287082"),
            (1_111_111_109, "081804"),
            (1_111_111_111, "050471"),
            (1_234_567_890, "005924"),
            (2_000_000_000, "279037"),
            (20_000_000_000, "353130"),
        ];
        for &(time, expected) in cases {
            assert_eq!(
                compute_code(RFC_SECRET, time / STEP_SECONDS),
                expected,
                "t={}",
                time
            );
        }
    }

    #[test]
    fn compute_is_deterministic_and_six_digits() {
        let secret = crate::secret::generate_secret();
        for step in [0u64, 1, 47, 1_000_000_000] {
            let code = compute_code(&secret, step);
            assert_eq!(code, compute_code(&secret, step));
            assert_eq!(code.len(), CODE_DIGITS);
            assert!(code.bytes().all(|b| b.is_ascii_digit()));
        }
    }

    #[test]
    fn verify_accepts_codes_within_one_step_of_skew() {
        let t = 1_111_111_111u64;
        let code = compute_code(RFC_SECRET, t / STEP_SECONDS);
        assert!(verify_at(&code, RFC_SECRET, 1, t));
        assert!(verify_at(&code, RFC_SECRET, 1, t - STEP_SECONDS));
        assert!(verify_at(&code, RFC_SECRET, 1, t + STEP_SECONDS));
    }

    #[test]
    fn verify_rejects_codes_two_steps_away() {
        let t = 1_111_111_111u64;
        let code = compute_code(RFC_SECRET, t / STEP_SECONDS);
        assert!(!verify_at(&code, RFC_SECRET, 1, t - 2 * STEP_SECONDS));
        assert!(!verify_at(&code, RFC_SECRET, 1, t + 2 * STEP_SECONDS));
    }

    #[test]
    fn verify_tolerates_whitespace_in_the_presented_code() {
        let t = 1_234_567_890u64;
        assert!(verify_at("005 924", RFC_SECRET, 1, t));
        assert!(verify_at(" 005924\n", RFC_SECRET, 1, t));
    }

    #[test]
    fn verify_rejects_malformed_codes_without_panicking() {
        for bad in ["12a456", "123", "", "1234567", "12345x", "٣٣٣٣٣٣"] {
            assert!(!verify(bad, RFC_SECRET), "accepted {:?}", bad);
        }
    }

    #[test]
    fn verify_at_epoch_edge_does_not_underflow() {
        let code = compute_code(RFC_SECRET, 0);
        assert!(verify_at(&code, RFC_SECRET, 1, 0));
    }
}
