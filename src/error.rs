//! Errors raised by the launcher.

use std::path::PathBuf;

/// Errors used in this crate.
///
/// Note: This enum cannot be exhaustively matched to allow future
/// extensions.
#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The keyring directory cannot be used.
    #[error("Keyring directory {} is unusable", .path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The engine refused the key material.
    #[error("Failed to import key material")]
    Import(#[source] anyhow::Error),

    /// The imported key is not the pinned one.
    #[error("Could not import key with fingerprint {expected} ({key}): \
             found {}", found_list(.found))]
    FingerprintMismatch {
        key: String,
        expected: String,
        found: Vec<String>,
    },

    /// The key was rejected earlier and is no longer considered.
    #[error("The {key} was rejected, refusing to use it until restart")]
    Rejected {
        key: String,
    },

    /// Fetching key material over the network failed.
    #[error("Error fetching {url}: {reason}")]
    Fetch {
        url: String,
        reason: String,
    },

    /// A signature was checked, and it is bad.
    #[error("Signature verification of {} failed: {reason}",
            .artifact.display())]
    BadSignature {
        artifact: PathBuf,
        reason: String,
    },

    /// The signature could not be checked at all.
    #[error("Signature of {} could not be verified: {reason}",
            .artifact.display())]
    Unverifiable {
        artifact: PathBuf,
        reason: String,
    },

    /// The settings file cannot be read or written.
    #[error("Settings file {} is unusable", .path.display())]
    Settings {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
}

fn found_list(found: &[String]) -> String {
    if found.is_empty() {
        "no key".into()
    } else {
        found.join(", ")
    }
}
