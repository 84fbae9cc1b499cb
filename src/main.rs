use std::fs;
use std::io::{self, Read};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use golden::cli::DifferKind;
use golden::{build_options, Args, Error, Golden, LineDiff, PrettyDiff, SimpleDiff};

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("golden=warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let opts = build_options(&args)?;

    let actual = match &args.input {
        Some(path) => {
            fs::read(path).with_context(|| format!("Failed to read input {}", path.display()))?
        }
        None => {
            let mut buf = Vec::new();
            io::stdin()
                .read_to_end(&mut buf)
                .context("Failed to read input from stdin")?;
            buf
        }
    };

    let mut golden = Golden::new(&args.golden, opts.update).raw();
    if opts.normalize_eol {
        golden = golden.normalize_eol();
    }
    if opts.ignore_whitespace {
        golden = golden.ignore_whitespace();
    }
    if let Some(size) = opts.chunk_size {
        golden = golden.with_chunk_size(size);
    }
    let golden = match (opts.differ, opts.color) {
        (DifferKind::Line, _) => golden.with_differ(LineDiff),
        (DifferKind::Pretty, true) => golden.with_differ(PrettyDiff::default()),
        (DifferKind::Pretty, false) => golden.with_differ(PrettyDiff::plain()),
        (DifferKind::Simple, _) => golden.with_differ(SimpleDiff),
    };

    match golden.compare(actual.as_slice()) {
        Ok(()) if opts.update => {
            println!("updated {}", args.golden.display());
            Ok(ExitCode::SUCCESS)
        }
        Ok(()) => {
            println!("ok");
            Ok(ExitCode::SUCCESS)
        }
        Err(Error::NotEqual { diff }) => {
            println!("{diff}");
            eprintln!("{} does not match", args.golden.display());
            Ok(ExitCode::FAILURE)
        }
        Err(err) => Err(err).with_context(|| format!("Failed to check {}", args.golden.display())),
    }
}
