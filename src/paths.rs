//! File system layout.
//!
//! The launcher keeps its configuration, cache, and data in
//! `torbrowser` directories below the XDG base directories.  Files
//! shipped with the launcher live in the share directory, which can
//! be relocated using `TBL_SHARE`.

use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context;

/// Directory name used below each base directory.
const APP_DIR: &str = "torbrowser";

/// The CPU architecture of the bundle to install.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arch {
    X86_64,
    I686,
}

impl Arch {
    /// Returns the architecture we are running on.
    pub fn current() -> Self {
        if cfg!(target_pointer_width = "64") {
            Arch::X86_64
        } else {
            Arch::I686
        }
    }

    /// Returns the platform name used in tarball names.
    pub fn platform(&self) -> &'static str {
        match self {
            Arch::X86_64 => "linux-x86_64",
            Arch::I686 => "linux-i686",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arch::X86_64 => f.write_str("x86_64"),
            Arch::I686 => f.write_str("i686"),
        }
    }
}

/// The base directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseDirs {
    pub home: PathBuf,
    pub config: PathBuf,
    pub cache: PathBuf,
    pub data: PathBuf,
}

impl BaseDirs {
    /// Returns the base directories for `home` without any XDG
    /// overrides.
    pub fn with_home<P: Into<PathBuf>>(home: P) -> Self {
        let home = home.into();
        BaseDirs {
            config: home.join(".config"),
            cache: home.join(".cache"),
            data: home.join(".local").join("share"),
            home,
        }
    }

    /// Computes the base directories from the environment.
    ///
    /// If `HOME` is not set, the home directory from the password
    /// database is used.  If that is not known either,
    /// `/tmp/.torbrowser-$USER` is used and created.
    ///
    /// The XDG variables are read here instead of using
    /// `dirs::config_dir` and friends, because their defaults must be
    /// relative to the home directory chosen above.
    pub fn from_env() -> anyhow::Result<Self> {
        let home = match non_empty_var("HOME").map(PathBuf::from)
            .or_else(dirs::home_dir)
        {
            Some(home) => home,
            None => {
                let user = non_empty_var("USER")
                    .ok_or_else(|| anyhow::anyhow!(
                        "Neither HOME nor USER is set"))?;
                let home = PathBuf::from(format!("/tmp/.torbrowser-{}", user));
                if ! home.exists() {
                    crate::keyring::create_private_dir(&home)
                        .with_context(|| format!("Error creating {}",
                                                 home.display()))?;
                }
                home
            }
        };

        let mut dirs = Self::with_home(home);
        if let Some(config) = non_empty_var("XDG_CONFIG_HOME") {
            dirs.config = config.into();
        }
        if let Some(cache) = non_empty_var("XDG_CACHE_HOME") {
            dirs.cache = cache.into();
        }
        if let Some(data) = non_empty_var("XDG_DATA_HOME") {
            dirs.data = data.into();
        }
        Ok(dirs)
    }
}

/// Returns the value of the environment variable `name`, unless it
/// is unset or empty.
fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| ! v.is_empty())
}

/// Returns the directory holding files shipped with the launcher.
///
/// This is `$TBL_SHARE/torbrowser-launcher`, where `TBL_SHARE`
/// defaults to `/usr/share`.
pub fn share_dir() -> PathBuf {
    let share = non_empty_var("TBL_SHARE")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/usr/share"));
    share.join("torbrowser-launcher")
}

/// Locations of the installed bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundlePaths {
    /// Holds the extracted bundle.
    pub dir: PathBuf,
    /// The bundle itself.
    pub dir_tbb: PathBuf,
    /// The desktop file, which exists iff the bundle is installed.
    pub start: PathBuf,
}

impl BundlePaths {
    /// Moves a bundle extracted by an old launcher into place.
    ///
    /// Before Tor Browser 12, the bundle was extracted to a
    /// locale-specific directory like `tor-browser_en-US`.  The first
    /// such directory found is renamed to [`BundlePaths::dir_tbb`].
    /// Returns the old location, if a bundle was moved.
    pub fn rename_old_tbb(&self) -> io::Result<Option<PathBuf>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound =>
                return Ok(None),
            Err(err) => return Err(err),
        };

        let mut old = Vec::new();
        for entry in entries {
            let entry = entry?;
            let is_old = entry.file_name().to_str()
                .map(|name| name.starts_with("tor-browser_"))
                .unwrap_or(false);
            if is_old && entry.path().is_dir() {
                old.push(entry.path());
            }
        }
        old.sort();

        match old.into_iter().next() {
            Some(old) => {
                fs::rename(&old, &self.dir_tbb)?;
                Ok(Some(old))
            }
            None => Ok(None),
        }
    }
}

/// All relevant paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub arch: Arch,
    pub config_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub data_dir: PathBuf,
    pub share_dir: PathBuf,
    /// The signing key shipped with the launcher.
    pub bundled_key: PathBuf,
    pub mirrors_txt: Vec<PathBuf>,
    pub download_dir: PathBuf,
    pub keyring_dir: PathBuf,
    pub settings_file: PathBuf,
    pub tbb: BundlePaths,
}

impl Paths {
    /// Computes the layout below `base`.
    pub fn new(base: &BaseDirs, share_dir: PathBuf, arch: Arch) -> Self {
        let config = base.config.join(APP_DIR);
        let cache = base.cache.join(APP_DIR);
        let local = base.data.join(APP_DIR);
        let download_dir = cache.join("download");
        let tbb_dir = local.join("tbb").join(arch.to_string());
        let dir_tbb = tbb_dir.join("tor-browser");

        Paths {
            arch,
            bundled_key: share_dir.join("tor-browser-developers.asc"),
            mirrors_txt: vec![
                share_dir.join("mirrors.txt"),
                config.join("mirrors.txt"),
            ],
            keyring_dir: local.join("gnupg_homedir"),
            settings_file: config.join("settings.json"),
            tbb: BundlePaths {
                start: dir_tbb.join("start-tor-browser.desktop"),
                dir: tbb_dir,
                dir_tbb,
            },
            download_dir,
            share_dir,
            config_dir: config,
            cache_dir: cache,
            data_dir: local,
        }
    }

    /// Computes the layout from the environment.
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self::new(&BaseDirs::from_env()?, share_dir(), Arch::current()))
    }

    /// Returns the directories the launcher creates at startup.
    pub fn dirs(&self) -> [&Path; 3] {
        [&self.config_dir, &self.cache_dir, &self.data_dir]
    }

    /// Returns the download locations for `version` on `mirror`.
    pub fn download(&self, version: &str, mirror: &str) -> Download {
        let tarball_filename = format!("tor-browser-{}-{}.tar.xz",
                                       self.arch.platform(), version);
        let sig_filename = format!("{}.asc", tarball_filename);
        let base = if mirror.ends_with('/') {
            format!("{}torbrowser/{}/", mirror, version)
        } else {
            format!("{}/torbrowser/{}/", mirror, version)
        };

        Download {
            tarball_url: format!("{}{}", base, tarball_filename),
            tarball_file: self.download_dir.join(&tarball_filename),
            sig_url: format!("{}{}", base, sig_filename),
            sig_file: self.download_dir.join(&sig_filename),
            tarball_filename,
            sig_filename,
        }
    }
}

/// Where to get a release, and where to put it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub tarball_url: String,
    pub tarball_file: PathBuf,
    pub tarball_filename: String,
    pub sig_url: String,
    pub sig_file: PathBuf,
    pub sig_filename: String,
}
