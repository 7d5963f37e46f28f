//! Command-line parser for `torbrowser-launcher settings`.

use clap::Parser;

#[derive(Parser, Debug)]
#[clap(
    name = "settings",
    about = "Show or change the settings",
    long_about = "Show or change the settings

Without options, the settings are printed.  Otherwise, the given \
settings are changed and saved.
",
)]
pub struct Command {
    #[clap(
        long,
        value_name = "BOOL",
        help = "Download over Tor",
        long_help = "\
Download over Tor.  Downloads are routed through the SOCKS proxy at \
`--tor-socks-address`.  This includes fetching the signing key.",
    )]
    pub download_over_tor: Option<bool>,

    #[clap(
        long,
        value_name = "ADDRESS",
        help = "Use Tor's SOCKS proxy at ADDRESS",
    )]
    pub tor_socks_address: Option<String>,

    #[clap(
        long,
        value_name = "URL",
        help = "Download from the mirror at URL",
    )]
    pub mirror: Option<String>,
}

impl Command {
    /// Returns whether any setting is changed.
    pub fn changes_something(&self) -> bool {
        self.download_over_tor.is_some()
            || self.tor_socks_address.is_some()
            || self.mirror.is_some()
    }
}
