//! Downloads, verifies, and launches Tor Browser.
//!
//! The heart of the launcher is the trust in the signing key of the
//! Tor Browser Developers.  The key is imported into a keyring owned
//! by the launcher, its fingerprint is checked against the pinned
//! one, and only then is it used to verify downloads.  See
//! [`trust::TrustContext`].

use std::borrow::Borrow;

#[macro_use] mod macros;
#[macro_use] mod log;

pub mod output;

pub mod error;
pub use error::Error;

pub mod engine;
pub mod signing_key;
pub mod keyring;
pub mod net;
pub mod paths;
pub mod settings;
pub mod mirrors;
pub mod trust;
pub mod launcher;

pub mod cli;
pub mod commands;

// Sometimes the same error cascades, e.g. an import failure wrapping
// the parse error it was caused by.  Compress these.
fn error_chain(err: &anyhow::Error) -> Vec<String> {
    let mut errs = err.chain()
        .map(|source| source.to_string())
        .collect::<Vec<String>>();
    errs.dedup();
    errs
}

/// Prints the error and causes, if any.
pub fn print_error_chain(err: &anyhow::Error) {
    let mut errs = error_chain(err).into_iter();
    if let Some(err) = errs.next() {
        weprintln!("Error: {}", err);
    }
    errs.for_each(|cause| weprintln!("  because: {}", cause));
}

/// Returns the error chain as a string.
///
/// The error and causes are separated by `error_separator`.  The
/// causes are separated by `cause_separator`, or, if that is `None`,
/// `error_separator`.
pub fn display_error_chain<'a, E, C>(err: E,
                                     error_separator: &str,
                                     cause_separator: C)
    -> String
where E: Borrow<anyhow::Error>,
      C: Into<Option<&'a str>>
{
    let err = err.borrow();
    let cause_separator = cause_separator.into();

    let mut error_chain = error_chain(err).into_iter();
    let mut s = error_chain.next().unwrap_or_default();
    if let Some(cause) = error_chain.next() {
        s.push_str(error_separator);
        s.push_str(&cause);
    }
    for cause in error_chain {
        s.push_str(cause_separator.unwrap_or(error_separator));
        s.push_str(&cause);
    }
    s
}

/// Returns the error chain as a single line.
pub fn one_line_error_chain<E>(err: E) -> String
where E: Borrow<anyhow::Error>,
{
    display_error_chain(err, ": ", ", because ")
}
