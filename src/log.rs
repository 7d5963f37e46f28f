//! Developer tracing.
//!
//! Every module that wants to trace defines `const TRACE: bool`, and
//! functions open a tracer with `tracer!(TRACE, "function_name")`.
//! Afterwards, `t!(..)` writes to stderr if tracing is enabled for
//! the module.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Current nesting of traced functions.
static INDENT: AtomicUsize = AtomicUsize::new(0);

/// Returns the indentation for the current nesting level.
pub fn indent() -> String {
    "  ".repeat(INDENT.load(Ordering::Relaxed).min(20))
}

/// Increments the nesting level while alive.
pub struct Indent(());

impl Indent {
    pub fn init() -> Self {
        INDENT.fetch_add(1, Ordering::Relaxed);
        Indent(())
    }
}

impl Drop for Indent {
    fn drop(&mut self) {
        INDENT.fetch_sub(1, Ordering::Relaxed);
    }
}

macro_rules! trace {
    ( $TRACE:expr, $fmt:expr, $($pargs:expr),* ) => {
        if $TRACE {
            eprintln!($fmt, $($pargs),*);
        }
    };
    ( $TRACE:expr, $fmt:expr ) => {
        trace!($TRACE, $fmt, );
    };
}

macro_rules! tracer {
    ( $TRACE:expr, $func:expr ) => {
        let _indent = if $TRACE {
            Some($crate::log::Indent::init())
        } else {
            None
        };

        // Nested macros cannot have repetitions, see
        // https://github.com/rust-lang/rust/issues/35853.
        #[allow(unused_macros)]
        macro_rules! t {
            ( $fmt:expr ) =>
            { trace!($TRACE, "{}{}: {}", $crate::log::indent(), $func, $fmt) };
            ( $fmt:expr, $a:expr ) =>
            { trace!($TRACE, "{}{}: {}", $crate::log::indent(), $func, format!($fmt, $a)) };
            ( $fmt:expr, $a:expr, $b:expr ) =>
            { trace!($TRACE, "{}{}: {}", $crate::log::indent(), $func, format!($fmt, $a, $b)) };
            ( $fmt:expr, $a:expr, $b:expr, $c:expr ) =>
            { trace!($TRACE, "{}{}: {}", $crate::log::indent(), $func, format!($fmt, $a, $b, $c)) };
            ( $fmt:expr, $a:expr, $b:expr, $c:expr, $d:expr ) =>
            { trace!($TRACE, "{}{}: {}", $crate::log::indent(), $func, format!($fmt, $a, $b, $c, $d)) };
        }
    };
}
