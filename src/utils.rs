use std::borrow::Cow;

use encoding_rs::WINDOWS_1252;
use sha2::{Digest, Sha256};

const SNIFF_LEN: usize = 4096;

/// Parses human sizes such as `4KiB`, `1mb` or `512`; `None` when unparsable.
pub fn parse_size(s: &str) -> Option<u64> {
    let s = s.trim().to_lowercase();
    let units = [
        ("gib", 1024u64.pow(3)),
        ("gb", 1000u64.pow(3)),
        ("g", 1000u64.pow(3)),
        ("mib", 1024u64.pow(2)),
        ("mb", 1000u64.pow(2)),
        ("m", 1000u64.pow(2)),
        ("kib", 1024),
        ("kb", 1000),
        ("k", 1000),
        ("b", 1),
    ];

    for (unit, mult) in units {
        if let Some(num) = s.strip_suffix(unit) {
            if let Ok(val) = num.trim().parse::<f64>() {
                if val >= 0.0 {
                    return Some((val * mult as f64) as u64);
                }
            }
            return None;
        }
    }
    s.parse().ok()
}

/// Heuristic on the first 4 KiB: NUL bytes or invalid UTF-8 mean binary.
pub fn is_probably_binary(bytes: &[u8]) -> bool {
    let slice = &bytes[..bytes.len().min(SNIFF_LEN)];
    if slice.contains(&0) {
        return true;
    }
    match std::str::from_utf8(slice) {
        Ok(_) => false,
        // a multi-byte sequence cut by the sniff window is still text
        Err(e) => e.error_len().is_some(),
    }
}

pub fn decode_best_effort(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(s) => Cow::Borrowed(s),
        Err(_) => {
            let (res, _, _) = WINDOWS_1252.decode(bytes);
            res
        }
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_accept_units() {
        assert_eq!(parse_size("4096"), Some(4096));
        assert_eq!(parse_size("4KiB"), Some(4096));
        assert_eq!(parse_size("4k"), Some(4000));
        assert_eq!(parse_size("4kb"), Some(4000));
        assert_eq!(parse_size(" 1MB "), Some(1_000_000));
        assert_eq!(parse_size("1mib"), Some(1024 * 1024));
        assert_eq!(parse_size("2g"), Some(2_000_000_000));
        assert_eq!(parse_size("10b"), Some(10));
        assert_eq!(parse_size("lots"), None);
        assert_eq!(parse_size("-1k"), None);
    }

    #[test]
    fn binary_sniffing() {
        assert!(!is_probably_binary(b""));
        assert!(!is_probably_binary("héllo\n".as_bytes()));
        assert!(is_probably_binary(b"abc\0def"));
        assert!(is_probably_binary(&[0xff, 0xfe, b'a']));

        let mut cut = vec![b'a'; SNIFF_LEN - 1];
        cut.extend_from_slice("é".as_bytes());
        assert!(!is_probably_binary(&cut));
    }

    #[test]
    fn latin1_fallback() {
        assert_eq!(decode_best_effort(b"plain"), "plain");
        assert_eq!(decode_best_effort(&[b'c', b'a', b'f', 0xe9]), "café");
    }

    #[test]
    fn sha256_of_empty_input() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
