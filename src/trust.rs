//! Trust in the pinned signing key.
//!
//! A [`TrustContext`] tracks whether the signing key may be used to
//! verify downloads.  It starts out [`KeyState::Absent`], even if the
//! keyring on disk already contains the key: a key is only trusted
//! after it has been imported and its fingerprint validated by this
//! context.
//!
//! ```text
//! Absent --import--> Unvalidated --fingerprint ok--> Trusted
//!                                \--mismatch-------> Rejected
//! Trusted --refresh--> Unvalidated --> Trusted | Rejected
//! ```
//!
//! `Rejected` is terminal.  Failed reads, fetches, and imports leave
//! the state as it was.

use std::fs;
use std::path::Path;

use sequoia_openpgp as openpgp;
use openpgp::Fingerprint;

use crate::Error;
use crate::engine::{Engine, ImportResult, VerificationOutcome};
use crate::keyring::Keyring;
use crate::net::{self, Fetch, ProxyConfig};
use crate::one_line_error_chain;
use crate::signing_key::SigningKey;

const TRACE: bool = false;

/// What we know about the signing key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyState {
    /// Nothing has been imported yet.
    Absent,
    /// Key material was imported, but not yet validated.
    Unvalidated,
    /// The key with the given fingerprint was imported and validated.
    Trusted(Fingerprint),
    /// The imported material did not contain the pinned key.
    Rejected {
        /// What was imported instead.
        found: Vec<Fingerprint>,
    },
}

/// The trust state of one signing key in one keyring.
pub struct TrustContext<E: Engine> {
    engine: E,
    keyring: Keyring,
    key: SigningKey,
    state: KeyState,
}

impl<E: Engine> TrustContext<E> {
    /// Returns a context for `key` in `keyring`.
    pub fn new(engine: E, keyring: Keyring, key: SigningKey) -> Self {
        TrustContext {
            engine,
            keyring,
            key,
            state: KeyState::Absent,
        }
    }

    /// Opens the keyring at `path`, and returns a context for `key`.
    pub fn open<P: AsRef<Path>>(engine: E, path: P, key: SigningKey)
                                -> Result<Self, Error>
    {
        Ok(Self::new(engine, Keyring::ensure_initialized(path)?, key))
    }

    pub fn state(&self) -> &KeyState {
        &self.state
    }

    /// Returns the fingerprint of the trusted key, if any.
    pub fn trusted_fingerprint(&self) -> Option<&Fingerprint> {
        match &self.state {
            KeyState::Trusted(fpr) => Some(fpr),
            _ => None,
        }
    }

    pub fn keyring(&self) -> &Keyring {
        &self.keyring
    }

    pub fn signing_key(&self) -> &SigningKey {
        &self.key
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Fails if the key was rejected.
    fn check_not_rejected(&self) -> Result<(), Error> {
        if let KeyState::Rejected { .. } = self.state {
            Err(Error::Rejected {
                key: self.key.name().into(),
            })
        } else {
            Ok(())
        }
    }

    /// Imports the key material in the file at `path`, and validates
    /// it.
    pub fn import_file<P: AsRef<Path>>(&mut self, path: P)
                                       -> Result<Fingerprint, Error>
    {
        let path = path.as_ref();
        self.check_not_rejected()?;

        let blob = fs::read(path).map_err(|err| Error::Import(
            anyhow::Error::from(err)
                .context(format!("Reading {}", path.display()))))?;
        self.import_bytes(&blob)
    }

    /// Imports `blob`, and validates it.
    ///
    /// On success, returns the fingerprint of the now trusted key.
    pub fn import_bytes(&mut self, blob: &[u8]) -> Result<Fingerprint, Error> {
        tracer!(TRACE, "TrustContext::import_bytes");
        self.check_not_rejected()?;

        let result = {
            let _guard = self.keyring.lock()?;
            self.engine.import_key(self.keyring.path(), blob)
        };
        let result = match result.into_result() {
            Ok(fingerprints) => ImportResult::success(fingerprints),
            Err(err) => {
                t!("import failed, keeping {:?}", self.state);
                return Err(err);
            }
        };

        self.state = KeyState::Unvalidated;
        match self.key.check(&result) {
            Ok(fpr) => {
                t!("{}: trusted", fpr);
                self.state = KeyState::Trusted(fpr.clone());
                Ok(fpr)
            }
            Err(err) => {
                t!("{}", err);
                self.state = KeyState::Rejected {
                    found: result.fingerprints().to_vec(),
                };
                Err(err)
            }
        }
    }

    /// Returns where to fetch the signing key from by default.
    ///
    /// This is the key's Web Key Directory location.
    pub fn default_refresh_url(&self) -> anyhow::Result<String> {
        let email = self.key.email().ok_or_else(|| anyhow::anyhow!(
            "The {} has no address to look it up by", self.key.name()))?;
        net::wkd_url(email)
    }

    /// Fetches the key from `url`, and imports and validates it.
    ///
    /// The keyring is not locked while fetching.  If the fetch fails,
    /// or the fetched material cannot be imported, the state is left
    /// unchanged.
    pub fn refresh(&mut self, fetcher: &dyn Fetch, url: &str,
                   proxy: Option<&ProxyConfig>)
                   -> Result<Fingerprint, Error>
    {
        tracer!(TRACE, "TrustContext::refresh");
        self.check_not_rejected()?;

        let blob = fetcher.fetch(url, proxy)?;
        t!("fetched {} bytes from {}", blob.len(), url);
        self.import_bytes(&blob)
    }

    /// Verifies the detached `signature` over `artifact`.
    ///
    /// Trust is re-derived on every call: the key must be trusted,
    /// have the pinned fingerprint, and still be in the keyring.
    /// Otherwise, the outcome is `Unverifiable`.
    pub fn verify<A, S>(&self, artifact: A, signature: S) -> VerificationOutcome
    where
        A: AsRef<Path>,
        S: AsRef<Path>,
    {
        tracer!(TRACE, "TrustContext::verify");
        let artifact = artifact.as_ref();
        let signature = signature.as_ref();

        let fpr = match &self.state {
            KeyState::Trusted(fpr) => fpr,
            KeyState::Rejected { .. } =>
                return VerificationOutcome::unverifiable(format!(
                    "the {} was rejected", self.key.name())),
            KeyState::Absent | KeyState::Unvalidated =>
                return VerificationOutcome::unverifiable(format!(
                    "the {} has not been validated", self.key.name())),
        };

        if fpr != self.key.fingerprint() {
            t!("{} is not the pinned {}", fpr, self.key.fingerprint());
            return VerificationOutcome::unverifiable(format!(
                "{} is not the {}", fpr, self.key.name()));
        }

        match self.engine.list_fingerprints(self.keyring.path()) {
            Ok(present) if present.contains(fpr) => (),
            Ok(_) => return VerificationOutcome::unverifiable(format!(
                "the {} is no longer in the keyring", self.key.name())),
            Err(err) => return VerificationOutcome::unverifiable(
                one_line_error_chain(err)),
        }

        let outcome = self.engine.verify_detached(
            self.keyring.path(), std::slice::from_ref(fpr),
            artifact, signature);
        t!("{}: {}", artifact.display(), outcome);

        match outcome {
            VerificationOutcome::Valid { signer } if &signer != fpr =>
                VerificationOutcome::invalid(format!(
                    "signed by {}, not by the {}", signer, self.key.name())),
            outcome => outcome,
        }
    }
}
