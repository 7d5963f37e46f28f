//! Line wrapping human-readable output.

use std::fmt;
use std::io;
use std::sync::OnceLock;

/// Writes the given message to `stream`, wrapped at the terminal
/// width.
///
/// Hint: Use `weprintln!(..)` instead of invoking this function
/// directly.
pub fn wwriteln(stream: &mut dyn io::Write, msg: fmt::Arguments) {
    iwwriteln(stream, "", "", msg)
}

/// Writes the given message to `stream`, indenting continuations.
pub fn iwwriteln(stream: &mut dyn io::Write,
                 initial_indent: &str,
                 subsequent_indent: &str,
                 msg: fmt::Arguments) {
    let m = msg.to_string();
    let options = options()
        .initial_indent(initial_indent)
        .subsequent_indent(subsequent_indent);

    // Keep explicit line breaks, wrap each paragraph on its own.
    for line in m.split('\n') {
        if line.is_empty() {
            if let Err(err) = writeln!(stream) {
                panic!("Error writing to output stream: {}", err);
            }
            continue;
        }

        for l in textwrap::wrap(line, options.clone()) {
            if let Err(err) = writeln!(stream, "{}", l) {
                panic!("Error writing to output stream: {}", err);
            }
        }
    }
}

/// Returns options for text-wrapping.
fn options() -> textwrap::Options<'static> {
    static OPTIONS: OnceLock<textwrap::Options> = OnceLock::new();
    OPTIONS.get_or_init(|| {
        // Fingerprints and paths must not be hyphenated or split.
        textwrap::Options::new(terminal_width())
            .break_words(false)
    }).clone()
}

/// Returns the terminal width we assume for wrapping.
pub fn terminal_width() -> usize {
    terminal_size::terminal_size().map(|(w, _h)| w.0)
        .unwrap_or(80)
        .into()
}
