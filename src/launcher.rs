//! The launcher's state.

use std::fmt;
use std::path::Path;

use anyhow::Context as _;

use sequoia_openpgp as openpgp;
use openpgp::Fingerprint;

use crate::Error;
use crate::engine::SequoiaEngine;
use crate::keyring::create_private_dir;
use crate::mirrors::load_mirrors;
use crate::net::Fetch;
use crate::one_line_error_chain;
use crate::paths::Paths;
use crate::settings::Settings;
use crate::signing_key::SigningKey;
use crate::trust::TrustContext;

const TRACE: bool = false;

/// The version recorded in the settings.
pub const TBL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Everything the commands operate on.
///
/// This is created once at startup, and handed to the commands.
pub struct Launcher {
    verbose: bool,
    quiet: bool,
    paths: Paths,
    mirrors: Vec<String>,
    settings: Settings,
    trust: Option<TrustContext<SequoiaEngine>>,
}

impl Launcher {
    /// Creates the directories, and loads the mirrors and settings.
    ///
    /// Directories that cannot be created are reported as warnings.
    /// Without a configuration directory, the default settings are
    /// used.  The keyring is set up by [`Launcher::init_keyring`].
    pub fn new(paths: Paths, verbose: bool, quiet: bool)
               -> anyhow::Result<Self>
    {
        tracer!(TRACE, "Launcher::new");

        // This has to happen before we look for the installed bundle.
        match paths.tbb.rename_old_tbb() {
            Ok(Some(old)) => if ! quiet {
                weprintln!("Renamed {} to {}",
                           old.display(), paths.tbb.dir_tbb.display());
            },
            Ok(None) => (),
            Err(err) => warn(format_args!(
                "Cannot move the old bundle in {}: {}",
                paths.tbb.dir.display(), err)),
        }

        let mut have_config_dir = true;
        for dir in paths.dirs().into_iter()
            .chain(std::iter::once(paths.download_dir.as_path()))
        {
            t!("creating {}", dir.display());
            if let Err(err) = create_private_dir(dir) {
                warn(format_args!("Cannot create directory {}: {}",
                                  dir.display(), err));
                if dir == paths.config_dir.as_path() {
                    have_config_dir = false;
                }
            }
        }

        let mirrors = load_mirrors(&paths.mirrors_txt).unwrap_or_else(|err| {
            warn(format_args!("{}", one_line_error_chain(err)));
            Vec::new()
        });

        let installed = paths.tbb.start.is_file();
        let settings = if have_config_dir {
            let (settings, dirty) =
                Settings::read(&paths.settings_file, TBL_VERSION, installed)?;
            if dirty {
                if let Err(err) = settings.save(&paths.settings_file) {
                    warn(format_args!("{}", one_line_error_chain(
                        anyhow::Error::from(err))));
                }
            }
            settings
        } else {
            let mut settings = Settings::defaults(TBL_VERSION);
            settings.installed = installed;
            settings
        };

        Ok(Launcher {
            verbose,
            quiet,
            paths,
            mirrors,
            settings,
            trust: None,
        })
    }

    /// Be verbose.
    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// Be quiet.
    pub fn quiet(&self) -> bool {
        self.quiet
    }

    /// Prints additional information in verbose mode.
    pub fn info(&self, msg: fmt::Arguments) {
        if self.verbose && ! self.quiet {
            weprintln!("{}", msg);
        }
    }

    /// Prints a warning.
    pub fn warn(&self, msg: fmt::Arguments) {
        warn(msg)
    }

    pub fn paths(&self) -> &Paths {
        &self.paths
    }

    pub fn mirrors(&self) -> &[String] {
        &self.mirrors
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Writes the settings to the settings file.
    pub fn save_settings(&self) -> Result<(), Error> {
        self.settings.save(&self.paths.settings_file)
    }

    /// Returns the trust context, if the keyring is usable.
    pub fn trust(&self) -> Option<&TrustContext<SequoiaEngine>> {
        self.trust.as_ref()
    }

    /// Opens the keyring and imports the bundled signing key.
    ///
    /// Problems with the keyring or the bundled key are reported as
    /// warnings.  Verification fails later if no key is trusted.
    pub fn init_keyring(&mut self) -> anyhow::Result<()> {
        if self.trust.is_some() {
            return Ok(());
        }

        let engine = SequoiaEngine::new()
            .context("Loading the cryptographic policy")?;
        self.init_keyring_with(engine, SigningKey::tor_browser_developers());
        Ok(())
    }

    /// Opens the keyring using `engine`, and imports the bundled key,
    /// expecting it to be `key`.
    pub fn init_keyring_with(&mut self, engine: SequoiaEngine,
                             key: SigningKey)
    {
        if ! self.paths.keyring_dir.exists() {
            self.info(format_args!("Creating keyring {}",
                                   self.paths.keyring_dir.display()));
        }
        match TrustContext::open(engine, &self.paths.keyring_dir, key) {
            Ok(trust) => self.trust = Some(trust),
            Err(err) => {
                self.warn(format_args!("{}", one_line_error_chain(
                    anyhow::Error::from(err))));
                return;
            }
        }

        self.import_bundled_key();
    }

    /// Imports the signing key shipped with the launcher.
    ///
    /// Returns whether the key is now trusted.
    fn import_bundled_key(&mut self) -> bool {
        let Some(trust) = self.trust.as_mut() else {
            return false;
        };

        let bundled_key = &self.paths.bundled_key;
        match trust.import_file(bundled_key) {
            Ok(fpr) => {
                if self.verbose && ! self.quiet {
                    weprintln!("Imported {} from {}", fpr, bundled_key.display());
                }
                true
            }
            Err(err) => {
                warn(format_args!("{}", one_line_error_chain(
                    anyhow::Error::from(err))));
                false
            }
        }
    }

    /// Fetches the signing key again, and re-validates it.
    ///
    /// If `url` is `None`, the key is looked up in the Web Key
    /// Directory.  Honors the proxy settings.
    pub fn refresh_key(&mut self, fetcher: &dyn Fetch, url: Option<&str>)
                       -> anyhow::Result<Fingerprint>
    {
        let proxy = self.settings.proxy();
        if let Some(proxy) = &proxy {
            self.info(format_args!("Using proxy {}", proxy));
        }

        let trust = self.trust.as_mut()
            .ok_or_else(|| anyhow::anyhow!("The keyring is not available"))?;
        let url = match url {
            Some(url) => url.to_string(),
            None => trust.default_refresh_url()?,
        };

        Ok(trust.refresh(fetcher, &url, proxy.as_ref())?)
    }

    /// Verifies `signature` over `artifact`.
    ///
    /// Anything but a good signature by the trusted signing key is an
    /// error.
    pub fn verify(&self, artifact: &Path, signature: &Path)
                  -> Result<Fingerprint, Error>
    {
        match &self.trust {
            Some(trust) => trust.verify(artifact, signature)
                .into_result(artifact),
            None => Err(Error::Unverifiable {
                artifact: artifact.into(),
                reason: "the keyring is not available".into(),
            }),
        }
    }

    /// Verifies the downloaded tarball of `version`.
    pub fn verify_download(&self, version: &str) -> Result<Fingerprint, Error> {
        let download = self.paths.download(version, &self.settings.mirror);
        self.verify(&download.tarball_file, &download.sig_file)
    }
}

/// Prints a warning.
fn warn(msg: fmt::Arguments) {
    weprintln!(indent = "  ", "Warning: {}", msg);
}
