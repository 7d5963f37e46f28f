//! Persistent settings.
//!
//! Settings are stored as a JSON object in `settings.json`.  Keys we
//! don't know about are preserved, so that settings written by other
//! versions of the launcher survive a round trip.

use std::fs;
use std::io;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::Error;
use crate::net::ProxyConfig;

const TRACE: bool = false;

/// Tor's default SOCKS port.
pub const DEFAULT_TOR_SOCKS_ADDRESS: &str = "127.0.0.1:9050";

/// The mirror used unless the user picks another one.
pub const DEFAULT_MIRROR: &str = "https://dist.torproject.org/";

/// The launcher's settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Version of the launcher that last wrote the settings.
    pub tbl_version: String,
    /// Whether the bundle is installed.
    pub installed: bool,
    /// Whether to route downloads through Tor.
    pub download_over_tor: bool,
    pub tor_socks_address: String,
    pub mirror: String,

    /// Keys we don't know about.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Settings {
    /// Returns the default settings.
    pub fn defaults(tbl_version: &str) -> Self {
        Settings {
            tbl_version: tbl_version.into(),
            installed: false,
            download_over_tor: false,
            tor_socks_address: DEFAULT_TOR_SOCKS_ADDRESS.into(),
            mirror: DEFAULT_MIRROR.into(),
            extra: Map::new(),
        }
    }

    /// Reads the settings from `path`.
    ///
    /// If the file does not exist, the defaults are used.  Missing
    /// keys are filled in from the defaults, a `tcp:` prefix on the
    /// SOCKS address is removed, and the version is updated to
    /// `tbl_version`.  Returns the settings and whether they differ
    /// from the file, i.e. need saving.
    ///
    /// `installed` is not taken from the file, the caller determines
    /// it by looking for the installed bundle.
    pub fn read(path: &Path, tbl_version: &str, installed: bool)
                -> Result<(Self, bool), Error>
    {
        tracer!(TRACE, "Settings::read");
        let settings_error = |source: anyhow::Error| Error::Settings {
            path: path.into(),
            source,
        };

        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                t!("{}: creating defaults", path.display());
                let mut settings = Self::defaults(tbl_version);
                settings.installed = installed;
                return Ok((settings, true));
            }
            Err(err) => return Err(settings_error(err.into())),
        };

        let mut map: Map<String, Value> = serde_json::from_slice(&bytes)
            .context("Parsing settings")
            .map_err(settings_error)?;

        let mut resave = false;
        let defaults = serde_json::to_value(Self::defaults(tbl_version))
            .context("Serializing default settings")
            .map_err(settings_error)?;
        if let Value::Object(defaults) = defaults {
            for (key, value) in defaults {
                if ! map.contains_key(&key) {
                    t!("{}: adding missing {}", path.display(), key);
                    map.insert(key, value);
                    resave = true;
                }
            }
        }

        let mut settings: Settings = serde_json::from_value(Value::Object(map))
            .context("Parsing settings")
            .map_err(settings_error)?;
        settings.installed = installed;

        if let Some(address) = settings.tor_socks_address.strip_prefix("tcp:") {
            settings.tor_socks_address = address.into();
            resave = true;
        }

        if settings.tbl_version != tbl_version {
            settings.tbl_version = tbl_version.into();
            resave = true;
        }

        Ok((settings, resave))
    }

    /// Writes the settings to `path`.
    ///
    /// The file is replaced atomically.
    pub fn save(&self, path: &Path) -> Result<(), Error> {
        self.save_(path).map_err(|source| Error::Settings {
            path: path.into(),
            source,
        })
    }

    fn save_(&self, path: &Path) -> anyhow::Result<()> {
        let dir = match path.parent() {
            Some(dir) if ! dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };

        let mut f = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("Creating a temporary file in {}",
                                     dir.display()))?;
        serde_json::to_writer_pretty(&mut f, self)
            .context("Serializing settings")?;
        f.persist(path).context("Replacing the settings file")?;
        Ok(())
    }

    /// Returns the proxy to use for downloads, if any.
    pub fn proxy(&self) -> Option<ProxyConfig> {
        if self.download_over_tor {
            Some(ProxyConfig::socks5h(&self.tor_socks_address))
        } else {
            None
        }
    }
}
