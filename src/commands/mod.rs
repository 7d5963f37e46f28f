//! Implementations of the subcommands.

use crate::cli::{LauncherCommand, Subcommands};
use crate::launcher::Launcher;
use crate::paths::Paths;

pub mod key;
pub mod settings;
pub mod verify;

const TRACE: bool = false;

/// Sets up the launcher and runs the command.
pub fn dispatch(c: LauncherCommand) -> anyhow::Result<()> {
    tracer!(TRACE, "dispatch");

    let paths = Paths::from_env()?;
    t!("config in {}", paths.config_dir.display());
    let mut launcher = Launcher::new(paths, c.verbose, c.quiet)?;

    match c.subcommand {
        Subcommands::Init(_) => key::init(&mut launcher),
        Subcommands::Verify(c) => verify::dispatch(&mut launcher, c),
        Subcommands::VerifyDownload(c) => verify::download(&mut launcher, c),

        Subcommands::RefreshKey(c) => key::refresh(&mut launcher, c),
        Subcommands::Fingerprints(_) => key::fingerprints(&mut launcher),

        Subcommands::Settings(c) => settings::dispatch(&mut launcher, c),
        Subcommands::Urls(c) => settings::urls(&launcher, c),
        Subcommands::Mirrors(_) => settings::mirrors(&launcher),
    }
}
