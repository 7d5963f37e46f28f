//! Command-line parser for torbrowser-launcher.
//!
//! Subcommands are ordered from most often used to least often used.
//! Use the imperative mood in the first sentence documenting
//! commands and arguments.  The first line of the about texts must
//! not end in a period.

use clap::{Command, CommandFactory, Parser, Subcommand};

pub mod settings;
pub mod verify;

pub const GLOBAL_OPTIONS_HEADER: &str = "Global Options";

/// Builds the top-level Clap command.
pub fn build() -> Command {
    let version = Box::leak(
        format!(
            "{} (sequoia-openpgp {}, using {})",
            env!("CARGO_PKG_VERSION"),
            sequoia_openpgp::VERSION,
            sequoia_openpgp::crypto::backend()
        )
        .into_boxed_str(),
    ) as &str;

    LauncherCommand::command()
        .version(version)
    // To improve readability limit the width of the text columns.
        .max_term_width(100)
}

/// Defines the CLI.
#[derive(Parser, Debug)]
#[clap(
    name = "torbrowser-launcher",
    about = "Download, verify, and launch Tor Browser",
    long_about = "Download, verify, and launch Tor Browser

Tor Browser releases are signed by the Tor Browser Developers.  The \
launcher keeps the developers' signing key in a keyring of its own, \
and only uses it after checking that its fingerprint is the pinned \
EF6E286DDA85EA2A4BA7DE684E2C6E8793298290.

Files are placed according to the XDG Base Directory Specification.  \
Files shipped with the launcher are looked up in \
`$TBL_SHARE/torbrowser-launcher`, where `TBL_SHARE` defaults to \
`/usr/share`.
",
    subcommand_required = true,
    arg_required_else_help = true,
    disable_colored_help = true,
)]
pub struct LauncherCommand {
    #[clap(
        short = 'v',
        long,
        global = true,
        help_heading = GLOBAL_OPTIONS_HEADER,
        help = "Be more verbose.",
    )]
    pub verbose: bool,

    #[clap(
        short = 'q',
        long = "quiet",
        global = true,
        help_heading = GLOBAL_OPTIONS_HEADER,
        help = "Be more quiet.",
        conflicts_with = "verbose",
    )]
    pub quiet: bool,

    #[clap(subcommand)]
    pub subcommand: Subcommands,
}

/// The order of top-level subcommands is:
///
///   - Setup and verification
///   - Key management
///   - Configuration and inspection
///
/// The order is derived from the order of variants in this enum.
#[derive(Debug, Subcommand)]
pub enum Subcommands {
    Init(InitCommand),
    Verify(verify::Command),
    VerifyDownload(verify::DownloadCommand),

    RefreshKey(RefreshKeyCommand),
    Fingerprints(FingerprintsCommand),

    Settings(settings::Command),
    Urls(UrlsCommand),
    Mirrors(MirrorsCommand),
}

#[derive(Parser, Debug)]
#[clap(
    name = "init",
    about = "Set up the directories, settings, and keyring",
    long_about = "Set up the directories, settings, and keyring

Creates the configuration, cache, and data directories, writes the \
default settings if there are none, creates the keyring, and imports \
the signing key shipped with the launcher.

If the shipped key cannot be imported, or its fingerprint does not \
match, a warning is printed.  Downloads cannot be verified until the \
key is refreshed using `torbrowser-launcher refresh-key`.
",
)]
pub struct InitCommand {}

#[derive(Parser, Debug)]
#[clap(
    name = "refresh-key",
    about = "Fetch the signing key and validate it again",
    long_about = "Fetch the signing key and validate it again

By default, the key is fetched from the Web Key Directory of \
torproject.org.  If downloading over Tor is enabled in the settings, \
the key is fetched over Tor as well.

If the fetched key does not have the pinned fingerprint, it is \
rejected, and the key is not used for the rest of the run.
",
)]
pub struct RefreshKeyCommand {
    #[clap(
        long,
        value_name = "URL",
        help = "Fetch the key from URL",
    )]
    pub url: Option<String>,
}

#[derive(Parser, Debug)]
#[clap(
    name = "fingerprints",
    about = "List the keys in the keyring",
    long_about = "List the keys in the keyring

Lists the fingerprints of the certificates in the launcher's keyring, \
and whether the signing key is trusted.
",
)]
pub struct FingerprintsCommand {}

#[derive(Parser, Debug)]
#[clap(
    name = "urls",
    about = "Print where a release is downloaded from",
)]
pub struct UrlsCommand {
    #[clap(
        value_name = "VERSION",
        help = "Print the locations for release VERSION",
    )]
    pub version: String,
}

#[derive(Parser, Debug)]
#[clap(
    name = "mirrors",
    about = "List the known mirrors",
)]
pub struct MirrorsCommand {}
