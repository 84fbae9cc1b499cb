/// Normalizes the (actual, expected) pair before they are compared.
///
/// Implementations must treat the two buffers independently: the same input
/// buffer always maps to the same output, whatever the other buffer holds.
pub trait Transform: Send + Sync {
    fn transform(&self, actual: Vec<u8>, expected: Vec<u8>) -> (Vec<u8>, Vec<u8>);
}

impl<F> Transform for F
where
    F: Fn(Vec<u8>, Vec<u8>) -> (Vec<u8>, Vec<u8>) + Send + Sync,
{
    fn transform(&self, actual: Vec<u8>, expected: Vec<u8>) -> (Vec<u8>, Vec<u8>) {
        self(actual, expected)
    }
}

/// Runs every transformer left to right, each one fed the previous output.
pub fn apply(
    transformers: &[Box<dyn Transform>],
    actual: Vec<u8>,
    expected: Vec<u8>,
) -> (Vec<u8>, Vec<u8>) {
    transformers
        .iter()
        .fold((actual, expected), |(a, e), t| t.transform(a, e))
}

/// Buffers at least this large are processed on the rayon pool.
pub const PARALLEL_THRESHOLD: usize = 64 * 1024;

/// Removes every Unicode whitespace code point.
#[derive(Debug, Default, Clone, Copy)]
pub struct StripWhitespace;

impl Transform for StripWhitespace {
    fn transform(&self, actual: Vec<u8>, expected: Vec<u8>) -> (Vec<u8>, Vec<u8>) {
        both(actual, expected, strip_whitespace)
    }
}

/// Rewrites CRLF and lone CR line endings to LF.
#[derive(Debug, Default, Clone, Copy)]
pub struct NormalizeEol;

impl Transform for NormalizeEol {
    fn transform(&self, actual: Vec<u8>, expected: Vec<u8>) -> (Vec<u8>, Vec<u8>) {
        both(actual, expected, normalize_eol)
    }
}

fn both(a: Vec<u8>, b: Vec<u8>, f: fn(&[u8]) -> Vec<u8>) -> (Vec<u8>, Vec<u8>) {
    if a.len().max(b.len()) >= PARALLEL_THRESHOLD {
        rayon::join(|| f(&a), || f(&b))
    } else {
        (f(&a), f(&b))
    }
}

/// Drops whitespace from the valid UTF-8 runs of `bytes`; invalid bytes are kept.
pub fn strip_whitespace(bytes: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        let mut tmp = [0u8; 4];
        for c in chunk.valid().chars().filter(|c| !c.is_whitespace()) {
            buf.extend_from_slice(c.encode_utf8(&mut tmp).as_bytes());
        }
        buf.extend_from_slice(chunk.invalid());
    }
    buf
}

pub fn normalize_eol(bytes: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(bytes.len());
    let mut iter = bytes.iter().copied().peekable();
    while let Some(b) = iter.next() {
        if b == b'\r' {
            iter.next_if_eq(&b'\n');
            buf.push(b'\n');
        } else {
            buf.push(b);
        }
    }
    buf
}
