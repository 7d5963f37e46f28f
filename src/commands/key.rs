//! Keyring setup and maintenance.

use crate::cli;
use crate::engine::Engine;
use crate::launcher::Launcher;
use crate::net::HttpFetcher;
use crate::trust::KeyState;

/// Sets up the launcher, and reports whether the signing key is
/// trusted.
pub fn init(launcher: &mut Launcher) -> anyhow::Result<()> {
    launcher.init_keyring()?;

    if ! launcher.quiet() {
        match launcher.trust().and_then(|t| t.trusted_fingerprint()) {
            Some(fpr) => weprintln!("Signing key {} is trusted", fpr),
            None => weprintln!("No trusted signing key, downloads cannot \
                                be verified"),
        }
    }
    Ok(())
}

pub fn refresh(launcher: &mut Launcher, c: cli::RefreshKeyCommand)
    -> anyhow::Result<()>
{
    launcher.init_keyring()?;

    if ! launcher.quiet() {
        weprintln!("Downloading latest Tor Browser signing key...");
    }
    let fpr = launcher.refresh_key(&HttpFetcher::default(),
                                   c.url.as_deref())?;
    if ! launcher.quiet() {
        weprintln!("Key {} imported successfully", fpr);
    }
    Ok(())
}

pub fn fingerprints(launcher: &mut Launcher) -> anyhow::Result<()> {
    launcher.init_keyring()?;

    let trust = launcher.trust()
        .ok_or_else(|| anyhow::anyhow!("The keyring is not available"))?;
    let fingerprints = trust.engine()
        .list_fingerprints(trust.keyring().path())?;

    for fpr in &fingerprints {
        let marker = if Some(fpr) == trust.trusted_fingerprint() {
            " (trusted)"
        } else {
            ""
        };
        println!("{}{}", fpr.to_hex(), marker);
    }

    if ! launcher.quiet() {
        match trust.state() {
            KeyState::Absent | KeyState::Unvalidated =>
                weprintln!("The {} is not trusted",
                           trust.signing_key().name()),
            KeyState::Trusted(_) => (),
            KeyState::Rejected { found } =>
                weprintln!("The {} was rejected: found {}",
                           trust.signing_key().name(),
                           found.iter().map(|f| f.to_hex())
                           .collect::<Vec<_>>().join(", ")),
        }
    }
    Ok(())
}
