//! The OpenPGP engine capability.
//!
//! The launcher never touches cryptographic primitives itself.  It
//! drives an [`Engine`], which owns the on-disk format of the keyring
//! and the signature checks.  [`SequoiaEngine`] is the production
//! implementation, tests may substitute their own.

use std::fmt;
use std::path::Path;

use sequoia_openpgp as openpgp;
use openpgp::Fingerprint;
use openpgp::Result;

use crate::Error;

mod sequoia;
pub use self::sequoia::SequoiaEngine;

/// The operations the launcher needs from an OpenPGP implementation.
///
/// All operations are scoped to a keyring directory.
pub trait Engine {
    /// Merges `blob` into the keyring.
    ///
    /// Never fails outright, failures are reported in the result.
    fn import_key(&self, keyring: &Path, blob: &[u8]) -> ImportResult;

    /// Lists the fingerprints of all certificates in the keyring.
    fn list_fingerprints(&self, keyring: &Path) -> Result<Vec<Fingerprint>>;

    /// Checks the detached `signature` over `artifact`.
    ///
    /// Only certificates in the keyring whose fingerprint is listed
    /// in `trusted` may be used.
    fn verify_detached(&self, keyring: &Path, trusted: &[Fingerprint],
                       artifact: &Path, signature: &Path)
                       -> VerificationOutcome;
}

/// The outcome of one import attempt.
#[derive(Debug)]
pub struct ImportResult {
    /// Fingerprints of the imported certificates that are present in
    /// the keyring after the import.
    fingerprints: Vec<Fingerprint>,
    error: Option<Error>,
}

impl ImportResult {
    /// Returns a successful result.
    pub fn success(fingerprints: Vec<Fingerprint>) -> Self {
        ImportResult {
            fingerprints,
            error: None,
        }
    }

    /// Returns a failed result.
    pub fn failure(error: Error) -> Self {
        ImportResult {
            fingerprints: Vec::new(),
            error: Some(error),
        }
    }

    /// Returns whether the import succeeded.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn fingerprints(&self) -> &[Fingerprint] {
        &self.fingerprints
    }

    /// Returns why the import failed, if it did.
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Converts the result into the imported fingerprints or the
    /// error.
    pub fn into_result(self) -> std::result::Result<Vec<Fingerprint>, Error> {
        match self.error {
            None => Ok(self.fingerprints),
            Some(err) => Err(err),
        }
    }
}

/// The result of checking a detached signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// The signature was made by a trusted key.
    Valid {
        /// Fingerprint of the certificate that made the signature.
        signer: Fingerprint,
    },

    /// The signature was checked and is bad.
    Invalid {
        reason: String,
    },

    /// Whether the signature is good could not be determined.
    Unverifiable {
        reason: String,
    },
}

impl VerificationOutcome {
    pub fn invalid<S: fmt::Display>(reason: S) -> Self {
        VerificationOutcome::Invalid { reason: reason.to_string() }
    }

    pub fn unverifiable<S: fmt::Display>(reason: S) -> Self {
        VerificationOutcome::Unverifiable { reason: reason.to_string() }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, VerificationOutcome::Valid { .. })
    }

    /// Returns the signer, or an error for any outcome other than
    /// `Valid`.
    ///
    /// `artifact` names the file in the error.
    pub fn into_result(self, artifact: &Path)
                       -> std::result::Result<Fingerprint, Error>
    {
        match self {
            VerificationOutcome::Valid { signer } => Ok(signer),
            VerificationOutcome::Invalid { reason } =>
                Err(Error::BadSignature {
                    artifact: artifact.into(),
                    reason,
                }),
            VerificationOutcome::Unverifiable { reason } =>
                Err(Error::Unverifiable {
                    artifact: artifact.into(),
                    reason,
                }),
        }
    }
}

impl fmt::Display for VerificationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerificationOutcome::Valid { signer } =>
                write!(f, "good signature from {}", signer),
            VerificationOutcome::Invalid { reason } =>
                write!(f, "bad signature: {}", reason),
            VerificationOutcome::Unverifiable { reason } =>
                write!(f, "unverifiable: {}", reason),
        }
    }
}
