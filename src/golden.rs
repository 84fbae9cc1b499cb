use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, trace};

use crate::cli::update_requested;
use crate::diff::{Diff, LineDiff};
use crate::error::{Error, Result};
use crate::marshal::{Format, Marshal};
use crate::transform::{self, NormalizeEol, StripWhitespace, Transform};

/// Mode bits for created golden files (`-rw-r--r--`).
pub const DEFAULT_PERM: u32 = 0o644;

/// Block size used by [`Golden::chunked`].
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// A golden file: where it lives and how values are compared against it.
///
/// Built once per assertion. Every `with_*` call overrides the previous
/// setting; transformers accumulate in call order.
pub struct Golden<M = Format> {
    path: PathBuf,
    perm: u32,
    flags: i32,
    update: bool,
    marshaller: Option<M>,
    differ: Box<dyn Diff>,
    transformers: Vec<Box<dyn Transform>>,
    chunk_size: Option<usize>,
}

/// Golden file at `path`, in update mode when the process asked for it.
pub fn file(path: impl Into<PathBuf>) -> Golden {
    Golden::new(path, update_requested())
}

impl Golden {
    pub fn new(path: impl Into<PathBuf>, update: bool) -> Self {
        Self {
            path: path.into(),
            perm: DEFAULT_PERM,
            flags: 0,
            update,
            marshaller: None,
            differ: Box::new(LineDiff),
            transformers: Vec::new(),
            chunk_size: None,
        }
    }
}

impl<M> Golden<M> {
    pub fn with_marshaller<N: Marshal>(self, marshaller: N) -> Golden<N> {
        Golden {
            path: self.path,
            perm: self.perm,
            flags: self.flags,
            update: self.update,
            marshaller: Some(marshaller),
            differ: self.differ,
            transformers: self.transformers,
            chunk_size: self.chunk_size,
        }
    }

    pub fn raw(self) -> Golden {
        self.with_marshaller(Format::Raw)
    }

    pub fn json(self) -> Golden {
        self.with_marshaller(Format::Json)
    }

    pub fn xml(self) -> Golden {
        self.with_marshaller(Format::Xml)
    }

    pub fn with_differ(mut self, differ: impl Diff + 'static) -> Self {
        self.differ = Box::new(differ);
        self
    }

    /// Mode bits applied when the file is created (unix only).
    pub fn with_perm(mut self, perm: u32) -> Self {
        self.perm = perm;
        self
    }

    /// Extra `open(2)` flags for both reads and writes (unix only).
    pub fn with_flags(mut self, flags: i32) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_update(mut self, update: bool) -> Self {
        self.update = update;
        self
    }

    /// Compare block by block instead of reading the whole file.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = Some(chunk_size);
        self
    }

    pub fn chunked(self) -> Self {
        self.with_chunk_size(DEFAULT_CHUNK_SIZE)
    }

    pub fn with_transformer(mut self, transformer: impl Transform + 'static) -> Self {
        self.transformers.push(Box::new(transformer));
        self
    }

    pub fn ignore_whitespace(self) -> Self {
        self.with_transformer(StripWhitespace)
    }

    pub fn normalize_eol(self) -> Self {
        self.with_transformer(NormalizeEol)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn perm(&self) -> u32 {
        self.perm
    }

    pub fn is_update(&self) -> bool {
        self.update
    }

    pub fn chunk_size(&self) -> Option<usize> {
        self.chunk_size
    }

    pub fn flags(&self) -> i32 {
        self.flags
    }

    fn open_options(&self) -> OpenOptions {
        #[allow(unused_mut)]
        let mut opts = OpenOptions::new();
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            opts.mode(self.perm).custom_flags(self.flags);
        }
        opts
    }

    fn open(&self) -> Result<File> {
        Ok(self.open_options().read(true).open(&self.path)?)
    }

    /// Reads the whole golden file.
    pub fn read(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.open()?.read_to_end(&mut buf)?;
        Ok(buf)
    }

    /// Replaces the golden file with `bytes`, creating missing parent directories.
    pub fn write(&self, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut file = self
            .open_options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)?;
        file.write_all(bytes)?;
        Ok(())
    }

    fn mismatch(&self, expected: &[u8], actual: &[u8]) -> Error {
        Error::NotEqual {
            diff: self.differ.diff(expected, actual),
        }
    }

    fn compare_whole(&self, actual: Vec<u8>) -> Result<()> {
        let expected = self.read()?;
        debug!(
            path = %self.path.display(),
            actual = actual.len(),
            expected = expected.len(),
            "comparing golden file"
        );
        let (actual, expected) = transform::apply(&self.transformers, actual, expected);
        if actual == expected {
            return Ok(());
        }
        debug!(path = %self.path.display(), "golden file mismatch");
        Err(self.mismatch(&expected, &actual))
    }

    /// Streams the golden file block by block against the value.
    ///
    /// Transformers run on each block pair, and the transformed outputs are
    /// compared as two continuous streams: whichever side runs ahead is carried
    /// into the next round. The diff covers only the window still pending when
    /// the first differing byte turns up.
    fn compare_chunked(&self, actual: &[u8], chunk_size: usize) -> Result<()> {
        let mut reader = BufReader::new(self.open()?);
        let mut rest = actual;
        let mut pending_actual = Vec::new();
        let mut pending_expected = Vec::new();
        let mut offset = 0;
        loop {
            let block = read_block(&mut reader, chunk_size)?;
            let (slice, tail) = split_block(rest, chunk_size);
            rest = tail;
            let done = block.is_empty() && slice.is_empty();
            trace!(offset, read = block.len(), "comparing golden block");
            offset += block.len();

            if !done {
                let (a, e) = transform::apply(&self.transformers, slice.to_vec(), block);
                pending_actual.extend_from_slice(&a);
                pending_expected.extend_from_slice(&e);
            }

            let common = pending_actual.len().min(pending_expected.len());
            let diverged = pending_actual[..common] != pending_expected[..common]
                || (done && pending_actual.len() != pending_expected.len());
            if diverged {
                debug!(path = %self.path.display(), offset, "golden file mismatch");
                return Err(self.mismatch(&pending_expected, &pending_actual));
            }
            if done {
                return Ok(());
            }
            pending_actual.drain(..common);
            pending_expected.drain(..common);
        }
    }
}

/// Whether `next` has to stay in the same block as `block`.
///
/// Blocks never end inside a UTF-8 sequence or between the two bytes of a
/// CRLF, so per-block transformers see whole characters and line endings.
fn continues(block: &[u8], next: u8) -> bool {
    match block.last().copied() {
        None => false,
        Some(b'\r') => next == b'\n',
        Some(_) => {
            let trailing = block
                .iter()
                .rev()
                .take(3)
                .take_while(|b| is_continuation(**b))
                .count();
            is_continuation(next) && trailing < 3
        }
    }
}

fn is_continuation(b: u8) -> bool {
    b & 0xC0 == 0x80
}

fn read_block<R: BufRead>(reader: &mut R, size: usize) -> io::Result<Vec<u8>> {
    let mut block = Vec::with_capacity(size);
    reader.by_ref().take(size as u64).read_to_end(&mut block)?;
    while let Some(&next) = reader.fill_buf()?.first() {
        if !continues(&block, next) {
            break;
        }
        block.push(next);
        reader.consume(1);
    }
    Ok(block)
}

fn split_block(bytes: &[u8], size: usize) -> (&[u8], &[u8]) {
    let mut end = size.min(bytes.len());
    while end < bytes.len() && continues(&bytes[..end], bytes[end]) {
        end += 1;
    }
    bytes.split_at(end)
}

impl<M: Marshal> Golden<M> {
    fn marshal<V: Serialize + ?Sized>(&self, value: &V) -> Result<Vec<u8>> {
        match &self.marshaller {
            Some(m) => m.marshal(value),
            None => Format::for_path(&self.path)?.marshal(value),
        }
    }

    /// Compares `value` against the golden file, or rewrites the file in update mode.
    ///
    /// A mismatch is reported as [`Error::NotEqual`] carrying the rendered diff.
    /// Any other error means the comparison could not be carried out; I/O errors
    /// are passed through untouched in [`Error::Io`].
    pub fn compare<V: Serialize + ?Sized>(&self, value: &V) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(Error::NoPath);
        }
        if self.chunk_size == Some(0) {
            return Err(Error::InvalidChunkSize);
        }

        let actual = self.marshal(value)?;

        if self.update {
            debug!(path = %self.path.display(), bytes = actual.len(), "updating golden file");
            return self.write(&actual);
        }

        match self.chunk_size {
            Some(size) => self.compare_chunked(&actual, size),
            None => self.compare_whole(actual),
        }
    }

    /// Fails the running test when `value` does not match the golden file.
    pub fn assert_matches<V: Serialize + ?Sized>(&self, value: &V) {
        self.assert_matches_with(&PanicReporter, value);
    }

    pub fn assert_matches_with<V, R>(&self, reporter: &R, value: &V)
    where
        V: Serialize + ?Sized,
        R: Reporter + ?Sized,
    {
        match self.compare(value) {
            Ok(()) => {}
            Err(Error::NotEqual { diff }) => reporter.fail(&format!(
                "golden file {} does not match the value\n{diff}",
                self.path.display()
            )),
            Err(err) => reporter.fail(&err.to_string()),
        }
    }
}

/// The test framework side of an assertion.
pub trait Reporter {
    fn fail(&self, message: &str);
}

/// Fails by panicking, which is how a Rust test reports failure.
#[derive(Debug, Default, Clone, Copy)]
pub struct PanicReporter;

impl Reporter for PanicReporter {
    fn fail(&self, message: &str) {
        panic!("{message}");
    }
}
