//! An [`Engine`] backed by sequoia-openpgp.
//!
//! The keyring is a single file of concatenated certificates,
//! `pubring.pgp`, inside the keyring directory.  Writes go to a
//! temporary file that atomically replaces the keyring, so the
//! keyring on disk is always one that was completely written.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::collections::btree_map::Entry;
use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::Context;

use sequoia_openpgp as openpgp;
use openpgp::Cert;
use openpgp::Fingerprint;
use openpgp::KeyHandle;
use openpgp::Result;
use openpgp::cert::CertParser;
use openpgp::parse::Parse;
use openpgp::parse::stream::DetachedVerifierBuilder;
use openpgp::parse::stream::GoodChecksum;
use openpgp::parse::stream::MessageLayer;
use openpgp::parse::stream::MessageStructure;
use openpgp::parse::stream::VerificationError;
use openpgp::parse::stream::VerificationHelper;
use openpgp::policy::StandardPolicy;
use openpgp::serialize::Serialize;

use sequoia_policy_config::ConfiguredStandardPolicy;

use crate::Error;
use crate::one_line_error_chain;
use super::{Engine, ImportResult, VerificationOutcome};

const TRACE: bool = false;

/// Name of the keyring file inside the keyring directory.
pub const KEYRING_FILE: &str = "pubring.pgp";

/// Imports and verifies using sequoia-openpgp.
pub struct SequoiaEngine {
    policy: StandardPolicy<'static>,
}

impl SequoiaEngine {
    /// Returns an engine using the system's configured standard
    /// policy.
    pub fn new() -> Result<Self> {
        let mut policy = ConfiguredStandardPolicy::new();
        policy.parse_default_config()?;
        Ok(Self::with_policy(policy.build()))
    }

    /// Returns an engine using the given policy.
    pub fn with_policy(policy: StandardPolicy<'static>) -> Self {
        SequoiaEngine {
            policy,
        }
    }

    /// Returns the path of the keyring file in `keyring`.
    pub fn keyring_file(keyring: &Path) -> PathBuf {
        keyring.join(KEYRING_FILE)
    }

    /// Reads all certificates from the keyring.
    ///
    /// Certificates that fail to parse are skipped.
    fn load_keyring(keyring: &Path) -> Result<Vec<Cert>> {
        tracer!(TRACE, "SequoiaEngine::load_keyring");

        let path = Self::keyring_file(keyring);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                t!("{}: no keyring yet", path.display());
                return Ok(Vec::new());
            }
            Err(err) => return Err(anyhow::Error::from(err)
                .context(format!("Reading the keyring {}", path.display()))),
        };
        if bytes.is_empty() {
            return Ok(Vec::new());
        }

        let certs = CertParser::from_bytes(&bytes)
            .with_context(|| format!("Parsing the keyring {}", path.display()))?
            .filter_map(|cert| match cert {
                Ok(cert) => Some(cert),
                Err(err) => {
                    t!("skipping bad cert in {}: {}",
                       path.display(), one_line_error_chain(err));
                    None
                }
            })
            .collect();

        Ok(certs)
    }

    /// Atomically replaces the keyring with `certs`.
    fn store_keyring<'a, I>(keyring: &Path, certs: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a Cert>,
    {
        let mut f = tempfile::NamedTempFile::new_in(keyring)
            .with_context(|| format!("Creating a temporary file in {}",
                                     keyring.display()))?;
        for cert in certs {
            cert.serialize(&mut f)?;
        }
        f.as_file().sync_all()?;
        f.persist(Self::keyring_file(keyring))
            .context("Replacing the keyring")?;
        Ok(())
    }

    fn import(&self, keyring: &Path, blob: &[u8]) -> Result<Vec<Fingerprint>> {
        tracer!(TRACE, "SequoiaEngine::import");

        let imported = CertParser::from_bytes(blob)
            .context("Parsing key material")?
            .collect::<Result<Vec<Cert>>>()
            .context("Parsing key material")?;
        if imported.is_empty() {
            return Err(anyhow::anyhow!("Key material contains no certificate"));
        }

        let fingerprints = imported.iter()
            .map(Cert::fingerprint)
            .collect::<BTreeSet<_>>();
        t!("importing {:?}", fingerprints);

        let existing = match Self::load_keyring(keyring) {
            Ok(certs) => certs,
            Err(err) => {
                // The keyring is rewritten below, replacing the
                // unreadable one.
                t!("discarding unreadable keyring: {}",
                   one_line_error_chain(err));
                Vec::new()
            }
        };

        let merged = merge_keyring(
            existing.into_iter()
                .chain(imported.into_iter()
                       .map(|cert| cert.strip_secret_key_material())))?;
        Self::store_keyring(keyring, merged.values())?;

        Ok(fingerprints.into_iter()
           .filter(|fpr| merged.contains_key(fpr))
           .collect())
    }
}

/// Merges duplicate certs in a keyring.
fn merge_keyring<C>(certs: C) -> Result<BTreeMap<Fingerprint, Cert>>
where
    C: IntoIterator<Item = Cert>,
{
    let mut merged = BTreeMap::new();
    for cert in certs {
        match merged.entry(cert.fingerprint()) {
            Entry::Vacant(e) => {
                e.insert(cert);
            },
            Entry::Occupied(mut e) => {
                let old = e.get().clone();
                e.insert(old.merge_public(cert)?);
            },
        }
    }
    Ok(merged)
}

impl Engine for SequoiaEngine {
    fn import_key(&self, keyring: &Path, blob: &[u8]) -> ImportResult {
        tracer!(TRACE, "SequoiaEngine::import_key");

        match self.import(keyring, blob) {
            Ok(fingerprints) => ImportResult::success(fingerprints),
            Err(err) => {
                t!("import into {} failed: {}",
                   keyring.display(), one_line_error_chain(&err));
                ImportResult::failure(Error::Import(err))
            }
        }
    }

    fn list_fingerprints(&self, keyring: &Path) -> Result<Vec<Fingerprint>> {
        Ok(Self::load_keyring(keyring)?.iter()
           .map(Cert::fingerprint)
           .collect())
    }

    fn verify_detached(&self, keyring: &Path, trusted: &[Fingerprint],
                       artifact: &Path, signature: &Path)
                       -> VerificationOutcome
    {
        tracer!(TRACE, "SequoiaEngine::verify_detached");

        if trusted.is_empty() {
            return VerificationOutcome::unverifiable(
                "no trusted signing key available");
        }

        let certs = match Self::load_keyring(keyring) {
            Ok(certs) => certs.into_iter()
                .filter(|cert| trusted.contains(&cert.fingerprint()))
                .collect::<Vec<_>>(),
            Err(err) => return VerificationOutcome::unverifiable(
                one_line_error_chain(err)),
        };
        if certs.is_empty() {
            return VerificationOutcome::unverifiable(
                "the keyring does not contain a trusted signing key");
        }

        let sig = match File::open(signature) {
            Ok(f) => f,
            Err(err) => return VerificationOutcome::unverifiable(
                format!("{}: {}", signature.display(), err)),
        };
        let data = match File::open(artifact) {
            Ok(f) => f,
            Err(err) => return VerificationOutcome::unverifiable(
                format!("{}: {}", artifact.display(), err)),
        };

        let helper = VHelper::new(certs);
        let mut v = match DetachedVerifierBuilder::from_reader(sig)
            .and_then(|b| b.with_policy(&self.policy, None, helper))
        {
            Ok(v) => v,
            Err(err) => {
                t!("{}: {}", signature.display(), one_line_error_chain(&err));
                return VerificationOutcome::unverifiable(format!(
                    "{}: {}", signature.display(), one_line_error_chain(err)));
            }
        };

        let result = v.verify_reader(data);
        let helper = v.into_helper();
        match (result, helper.outcome) {
            (_, Some(outcome)) => outcome,
            (Err(err), None) => VerificationOutcome::unverifiable(
                one_line_error_chain(err)),
            (Ok(()), None) => VerificationOutcome::unverifiable(
                "no signature was checked"),
        }
    }
}

/// Offers the trusted certificates to the verifier, and records the
/// outcome.
struct VHelper {
    certs: Vec<Cert>,
    outcome: Option<VerificationOutcome>,
}

impl VHelper {
    fn new(certs: Vec<Cert>) -> Self {
        VHelper {
            certs,
            outcome: None,
        }
    }
}

impl VerificationHelper for VHelper {
    fn get_certs(&mut self, _ids: &[KeyHandle]) -> Result<Vec<Cert>> {
        Ok(self.certs.clone())
    }

    fn check(&mut self, structure: MessageStructure) -> Result<()> {
        tracer!(TRACE, "VHelper::check");

        let mut good = None;
        let mut bad = Vec::new();
        let mut unknown = Vec::new();
        let mut broken = Vec::new();

        for layer in structure {
            let results = match layer {
                MessageLayer::SignatureGroup { results } => results,
                _ => continue,
            };

            use self::VerificationError::*;
            for result in results {
                match result {
                    Ok(GoodChecksum { ka, .. }) => {
                        t!("good signature from {}", ka.key().fingerprint());
                        good.get_or_insert(ka.cert().fingerprint());
                    }
                    Err(MissingKey { sig, .. }) => {
                        unknown.push(sig.get_issuers().first()
                                     .map(|issuer| issuer.to_string())
                                     .unwrap_or_else(|| "an unknown key".into()));
                    }
                    Err(UnboundKey { cert, error, .. }) => {
                        bad.push(format!("signing key on {} is not bound: {}",
                                         cert.fingerprint(),
                                         one_line_error_chain(error)));
                    }
                    Err(BadKey { ka, error, .. }) => {
                        bad.push(format!("signing key on {} is bad: {}",
                                         ka.cert().fingerprint(),
                                         one_line_error_chain(error)));
                    }
                    Err(BadSignature { ka, error, .. }) => {
                        bad.push(format!("bad signature from {}: {}",
                                         ka.key().fingerprint(),
                                         one_line_error_chain(error)));
                    }
                    Err(err) => {
                        broken.push(err.to_string());
                    }
                }
            }
        }

        let outcome = if ! bad.is_empty() {
            VerificationOutcome::invalid(bad.join("; "))
        } else if let Some(signer) = good {
            VerificationOutcome::Valid { signer }
        } else if ! unknown.is_empty() {
            VerificationOutcome::invalid(format!(
                "signed by {}, not by the trusted signing key",
                unknown.join(", ")))
        } else if ! broken.is_empty() {
            VerificationOutcome::unverifiable(broken.join("; "))
        } else {
            VerificationOutcome::unverifiable("no signature found")
        };
        t!("{}", outcome);

        let valid = outcome.is_valid();
        self.outcome = Some(outcome);
        if valid {
            Ok(())
        } else {
            Err(anyhow::anyhow!("Verification failed"))
        }
    }
}
