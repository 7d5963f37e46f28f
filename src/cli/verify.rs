//! Command-line parser for `torbrowser-launcher verify`.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[clap(
    name = "verify",
    about = "Verify a detached signature using the signing key",
    long_about = "Verify a detached signature using the signing key

The signature is checked against the Tor Browser Developers signing \
key only, and only if the key's fingerprint was validated in this \
run.  The bundled key is imported and validated first.

Verification is only successful if the signature is good.  If the \
signature is bad, or cannot be checked, the program terminates with \
an exit status indicating failure.
",
)]
pub struct Command {
    #[clap(
        long = "signature-file",
        value_name = "SIG",
        help = "Read the detached signature from SIG",
    )]
    pub signature_file: PathBuf,

    #[clap(
        value_name = "FILE",
        help = "Verify FILE",
    )]
    pub file: PathBuf,
}

#[derive(Parser, Debug)]
#[clap(
    name = "verify-download",
    about = "Verify a downloaded release",
    long_about = "Verify a downloaded release

Verifies the tarball of release VERSION in the download directory \
against its detached signature next to it, like `verify` does.  See \
`torbrowser-launcher urls` for the file names.
",
)]
pub struct DownloadCommand {
    #[clap(
        value_name = "VERSION",
        help = "Verify the download of release VERSION",
    )]
    pub version: String,
}
