use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use crate::utils::parse_size;

/// Environment variable that switches every comparison into update mode.
pub const UPDATE_ENV: &str = "GOLDEN_UPDATE";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Golden file to compare against
    pub golden: PathBuf,

    /// File holding the actual value (stdin when omitted)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Overwrite the golden file instead of comparing
    #[arg(short, long, env = UPDATE_ENV)]
    pub update: bool,

    /// Ignore all whitespace when comparing
    #[arg(short = 'w', long)]
    pub ignore_whitespace: bool,

    /// Normalize EOL (CRLF/LF) before comparison
    #[arg(short = 'E', long)]
    pub normalize_eol: bool,

    /// Compare in blocks of this size (e.g., 4KiB, 65536) instead of reading the whole file
    #[arg(short = 'C', long)]
    pub chunk_size: Option<String>,

    /// How mismatches are rendered
    #[arg(short, long, value_enum, default_value_t = DifferKind::Line)]
    pub differ: DifferKind,

    /// Disable ANSI colours in the pretty differ
    #[arg(long)]
    pub no_color: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DifferKind {
    Line,
    Pretty,
    Simple,
}

#[derive(Debug)]
pub struct Options {
    pub update: bool,
    pub ignore_whitespace: bool,
    pub normalize_eol: bool,
    pub chunk_size: Option<usize>,
    pub differ: DifferKind,
    pub color: bool,
}

pub fn build_options(args: &Args) -> Result<Options> {
    let chunk_size = args
        .chunk_size
        .as_deref()
        .map(|s| {
            parse_size(s)
                .filter(|n| *n > 0)
                .and_then(|n| usize::try_from(n).ok())
                .with_context(|| format!("Invalid chunk size: {s}"))
        })
        .transpose()?;

    Ok(Options {
        update: args.update,
        ignore_whitespace: args.ignore_whitespace,
        normalize_eol: args.normalize_eol,
        chunk_size,
        differ: args.differ,
        color: !args.no_color,
    })
}

#[derive(Parser, Debug)]
#[command(disable_help_flag = true, disable_version_flag = true)]
struct UpdateFlag {
    #[arg(long, env = UPDATE_ENV)]
    update: bool,
}

/// Whether this process was asked to regenerate golden files.
///
/// Resolved once, from `GOLDEN_UPDATE` or from `--update` among the process
/// arguments, and fixed for the lifetime of the process. The standard test
/// harness rejects options it does not know, so under `cargo test` set
/// `GOLDEN_UPDATE=1`; `--update` only reaches custom harnesses and binaries.
pub fn update_requested() -> bool {
    static UPDATE: OnceLock<bool> = OnceLock::new();
    *UPDATE.get_or_init(|| update_from_args(std::env::args_os()))
}

/// Resolves the update flag from an argument list (program name first).
///
/// Test harnesses pass their own filters and flags, so everything except the
/// program name and `--update` is ignored.
pub fn update_from_args<I, T>(args: I) -> bool
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let args = args
        .into_iter()
        .map(Into::into)
        .enumerate()
        .filter(|(i, arg)| *i == 0 || arg == "--update")
        .map(|(_, arg)| arg);

    UpdateFlag::try_parse_from(args)
        .map(|flag| flag.update)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(args).unwrap()
    }

    #[test]
    fn update_flag_is_picked_out_of_harness_arguments() {
        assert!(update_from_args(["tests", "--nocapture", "--update", "some::filter"]));
        assert!(update_from_args(["tests", "--update"]));
    }

    #[test]
    fn update_flag_defaults_to_off() {
        if std::env::var_os(UPDATE_ENV).is_some() {
            return;
        }
        assert!(!update_from_args(["tests"]));
        assert!(!update_from_args(["tests", "--exact", "update"]));
    }

    #[test]
    fn options_from_arguments() {
        let args = parse(&[
            "golden",
            "out.txt",
            "-w",
            "-E",
            "--chunk-size",
            "4KiB",
            "--differ",
            "pretty",
            "--no-color",
        ]);
        let opts = build_options(&args).unwrap();
        assert!(opts.ignore_whitespace);
        assert!(opts.normalize_eol);
        assert_eq!(opts.chunk_size, Some(4096));
        assert_eq!(opts.differ, DifferKind::Pretty);
        assert!(!opts.color);
    }

    #[test]
    fn zero_or_garbage_chunk_sizes_are_rejected() {
        for size in ["0", "0k", "nope"] {
            let args = parse(&["golden", "out.txt", "-C", size]);
            let err = build_options(&args).unwrap_err();
            assert!(err.to_string().contains("Invalid chunk size"), "{err}");
        }
    }
}
