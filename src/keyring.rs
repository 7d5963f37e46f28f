//! The application's isolated keyring directory.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use crate::Error;

const TRACE: bool = false;

/// Name of the lock file inside the keyring directory.
pub const LOCK_FILE: &str = ".lock";

/// A keyring directory owned by this application.
///
/// The keyring is never the user's default keyring.  Imports must
/// hold the guard returned by [`Keyring::lock`].
#[derive(Debug)]
pub struct Keyring {
    path: PathBuf,
}

impl Keyring {
    /// Opens the keyring at `path`, creating it if necessary.
    ///
    /// The directory is created with owner-only permissions.  Fails if
    /// the directory cannot be created, `path` is not a directory, or
    /// the directory is not writable.  Calling this on an existing
    /// keyring does not modify it.
    pub fn ensure_initialized<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        tracer!(TRACE, "Keyring::ensure_initialized");
        let path = path.as_ref();
        let storage = |source| Error::Storage {
            path: path.into(),
            source,
        };

        match fs::metadata(path) {
            Ok(m) if m.is_dir() => {
                t!("{}: exists", path.display());
            }
            Ok(_) => {
                return Err(storage(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    "exists, but is not a directory")));
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                t!("{}: creating", path.display());
                create_private_dir(path).map_err(storage)?;
            }
            Err(err) => return Err(storage(err)),
        }

        // Probe for writability: the keyring is replaced by renaming
        // a temporary file into place.
        tempfile::NamedTempFile::new_in(path)
            .and_then(|f| f.close())
            .map_err(storage)?;

        Ok(Keyring {
            path: path.into(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Acquires exclusive write access to the keyring.
    ///
    /// This takes an advisory lock on a file in the keyring directory,
    /// so it excludes every other holder, whether it is in this
    /// process or in another one.  Blocks until the lock is
    /// available.  The lock is released when the guard is dropped.
    pub fn lock(&self) -> Result<KeyringLock, Error> {
        tracer!(TRACE, "Keyring::lock");
        let path = self.path.join(LOCK_FILE);
        let storage = |source| Error::Storage {
            path: path.clone(),
            source,
        };

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(storage)?;
        lock_exclusive(&file).map_err(storage)?;
        t!("{}: locked", path.display());

        Ok(KeyringLock {
            _file: file,
        })
    }
}

/// Exclusive access to a keyring.
///
/// Closing the file releases the lock.
#[derive(Debug)]
pub struct KeyringLock {
    _file: File,
}

/// Waits for an exclusive advisory lock on `file`.
fn lock_exclusive(file: &File) -> io::Result<()> {
    platform! {
        unix => {
            use std::os::unix::io::AsRawFd;
            loop {
                // SAFETY: the descriptor is owned by `file`, which
                // outlives the call.
                let r = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX) };
                if r == 0 {
                    return Ok(());
                }
                let err = io::Error::last_os_error();
                if err.kind() != io::ErrorKind::Interrupted {
                    return Err(err);
                }
            }
        },
        windows => {
            // TODO: lock with LockFileEx once Windows is supported.
            let _ = file;
            Ok(())
        },
    }
}

/// Creates `path` and missing parents with mode 0700.
pub fn create_private_dir(path: &Path) -> io::Result<()> {
    platform! {
        unix => {
            use std::os::unix::fs::DirBuilderExt;
            fs::DirBuilder::new()
                .recursive(true)
                .mode(0o700)
                .create(path)
        },
        windows => {
            fs::create_dir_all(path)
        },
    }
}
