//! The pinned signing key and fingerprint validation.

use sequoia_openpgp as openpgp;
use openpgp::Fingerprint;

use crate::Error;
use crate::engine::ImportResult;

/// The fingerprint of the Tor Browser Developers signing key.
pub const TOR_BROWSER_DEVELOPERS_FINGERPRINT: &str =
    "EF6E286DDA85EA2A4BA7DE684E2C6E8793298290";

const TOR_BROWSER_DEVELOPERS_FINGERPRINT_BYTES: [u8; 20] = [
    0xEF, 0x6E, 0x28, 0x6D, 0xDA, 0x85, 0xEA, 0x2A, 0x4B, 0xA7,
    0xDE, 0x68, 0x4E, 0x2C, 0x6E, 0x87, 0x93, 0x29, 0x82, 0x90,
];

/// The address the signing key is published under in the Web Key
/// Directory.
pub const TOR_BROWSER_DEVELOPERS_EMAIL: &str = "torbrowser@torproject.org";

/// A signing key whose fingerprint is pinned.
#[derive(Debug, Clone)]
pub struct SigningKey {
    name: String,
    fingerprint: Fingerprint,
    email: Option<String>,
}

impl SigningKey {
    /// Returns the key that signs Tor Browser releases.
    pub fn tor_browser_developers() -> Self {
        SigningKey {
            name: "Tor Browser Developers signing key".into(),
            fingerprint: Fingerprint::V4(TOR_BROWSER_DEVELOPERS_FINGERPRINT_BYTES),
            email: Some(TOR_BROWSER_DEVELOPERS_EMAIL.into()),
        }
    }

    /// Returns a signing key with the given pinned fingerprint.
    pub fn new<S: Into<String>>(name: S, fingerprint: Fingerprint) -> Self {
        SigningKey {
            name: name.into(),
            fingerprint,
            email: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the pinned fingerprint.
    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Checks that `result` imported this key.
    ///
    /// Returns the matching fingerprint, or an
    /// [`Error::FingerprintMismatch`] naming what was found instead.
    pub fn check(&self, result: &ImportResult) -> Result<Fingerprint, Error> {
        let expected = self.fingerprint.to_hex();
        if validate(result, &expected) {
            Ok(self.fingerprint.clone())
        } else {
            Err(Error::FingerprintMismatch {
                key: self.name.clone(),
                expected,
                found: result.fingerprints().iter()
                    .map(|fpr| fpr.to_hex())
                    .collect(),
            })
        }
    }
}

/// Returns whether `result` is a successful import of the key with
/// the `expected` fingerprint.
///
/// Whitespace in `expected` is ignored, and the comparison is case
/// insensitive.  An empty `expected` never matches.
pub fn validate(result: &ImportResult, expected: &str) -> bool {
    let expected = normalize(expected);
    if expected.is_empty() || ! result.is_success() {
        return false;
    }

    result.fingerprints().iter()
        .any(|fpr| fpr.to_hex() == expected)
}

/// Strips whitespace and upper-cases a hex fingerprint.
fn normalize(fingerprint: &str) -> String {
    fingerprint.chars()
        .filter(|c| ! c.is_ascii_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}
