//! Random secret generation.
//!
//! Every generated credential in an install run comes from here: database
//! passwords, encryption keys embedded in env files, and the unique suffixes
//! used for crontab temp files. The `rand` default RNG is cryptographically
//! secure, which is the only guarantee callers rely on; there is no
//! uniqueness registry.

use rand::RngExt;

const ALNUM: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
const HEX: &[u8] = b"0123456789abcdef";

fn from_charset(charset: &[u8], len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| {
            let idx = rng.random_range(0..charset.len());
            charset[idx] as char
        })
        .collect()
}

/// Generate a random alphanumeric token of the given length.
pub fn random_token(len: usize) -> String {
    from_charset(ALNUM, len)
}

/// Generate a random lowercase hex string of the given length.
pub fn random_hex(len: usize) -> String {
    from_charset(HEX, len)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn token_has_requested_length() {
        assert_eq!(random_token(20).len(), 20);
        assert_eq!(random_token(0).len(), 0);
    }

    #[test]
    fn token_is_alphanumeric() {
        let token = random_token(256);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn hex_is_lowercase_hex() {
        let token = random_hex(256);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(token, token.to_lowercase());
    }

    // Entropy sanity: at length 20 over a 62-character alphabet a collision
    // within 10k draws would indicate a broken RNG, not bad luck.
    #[test]
    fn ten_thousand_draws_never_collide() {
        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            assert!(seen.insert(random_token(20)), "duplicate token generated");
        }
    }

    #[test]
    fn hex_draws_never_collide() {
        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            assert!(seen.insert(random_hex(32)), "duplicate hex token generated");
        }
    }
}
