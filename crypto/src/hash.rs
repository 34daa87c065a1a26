//! SHA-256 identity hashing.
//!
//! The hashes are only ever compared for equality. The IP digest mixes in a
//! server-held salt so it cannot be inverted by enumerating the address
//! space, and digests from deployments with different salts never match.

use pmp_types::IdentityHash;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Compute a SHA-256 digest of arbitrary data.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Hash multiple byte slices in sequence (avoids concatenation allocation).
pub fn sha256_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Digest of a client IP: `SHA-256(ip || salt)`.
pub fn hash_ip(ip: &str, salt: &str) -> IdentityHash {
    IdentityHash::new(sha256_multi(&[ip.as_bytes(), salt.as_bytes()]))
}

/// Digest of a client-supplied device fingerprint.
///
/// Clients already send a hash; it is hashed again so the stored value is
/// never the one the client holds.
pub fn hash_fingerprint(fingerprint: &str) -> IdentityHash {
    IdentityHash::new(sha256(fingerprint.as_bytes()))
}

/// Digest of confession text, taken over the trimmed text.
pub fn hash_text(text: &str) -> IdentityHash {
    IdentityHash::new(sha256(text.trim().as_bytes()))
}

/// Compare a supplied secret against the configured one in constant time.
///
/// Both sides are digested first so the comparison runs over equal-length
/// inputs and leaks neither content nor length.
pub fn secret_matches(expected: &str, given: &str) -> bool {
    let expected = sha256(expected.as_bytes());
    let given = sha256(given.as_bytes());
    expected[..].ct_eq(&given[..]).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_known_vector() {
        let h = sha256(b"abc");
        assert_eq!(
            IdentityHash::new(h).to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn sha256_multi_equivalent() {
        let single = sha256(b"helloworld");
        let multi = sha256_multi(&[b"hello", b"world"]);
        assert_eq!(single, multi);
    }

    #[test]
    fn ip_hash_depends_on_salt() {
        let a = hash_ip("203.0.113.7", "salt-a");
        let b = hash_ip("203.0.113.7", "salt-b");
        assert_ne!(a, b);
        assert_eq!(a, hash_ip("203.0.113.7", "salt-a"));
    }

    #[test]
    fn ip_hash_is_concatenation() {
        let h = hash_ip("10.0.0.1", "pepper");
        assert_eq!(h, IdentityHash::new(sha256(b"10.0.0.1pepper")));
    }

    #[test]
    fn text_hash_ignores_surrounding_whitespace() {
        assert_eq!(hash_text("  my secret \n"), hash_text("my secret"));
        assert_ne!(hash_text("my secret"), hash_text("my  secret"));
    }

    #[test]
    fn fingerprint_hash_is_plain_digest() {
        assert_eq!(
            hash_fingerprint("device-1"),
            IdentityHash::new(sha256(b"device-1"))
        );
    }

    #[test]
    fn secret_comparison() {
        assert!(secret_matches("s3cret", "s3cret"));
        assert!(!secret_matches("s3cret", "s3cret "));
        assert!(!secret_matches("s3cret", "S3CRET"));
        assert!(!secret_matches("s3cret", ""));
    }
}
