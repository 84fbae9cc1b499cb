//
// lib.rs
// golden
//
// Library entry: golden file assertions for test suites. A value is marshalled, normalized by transformers, compared
// byte for byte against a recorded file and, on mismatch, rendered as a diff. Update mode rewrites the file instead.
//
// Thales Matheus Mendonça Santos - November 2025
//
pub mod cli;
pub mod diff;
pub mod error;
pub mod golden;
pub mod marshal;
pub mod transform;
pub mod utils;

pub use cli::{build_options, update_requested, Args, Options};
pub use diff::{Diff, LineDiff, PrettyDiff, SimpleDiff};
pub use error::{Error, Result};
pub use golden::{file, Golden, PanicReporter, Reporter, DEFAULT_CHUNK_SIZE, DEFAULT_PERM};
pub use marshal::{Format, Json, Marshal, Raw, Xml};
pub use transform::{NormalizeEol, StripWhitespace, Transform};

/// Asserts that a value matches the golden file at the given path.
///
/// Uses the process-wide update flag and the marshaller implied by the file extension.
#[macro_export]
macro_rules! assert_golden {
    ($path:expr, $value:expr $(,)?) => {
        $crate::file($path).assert_matches(&$value)
    };
}
