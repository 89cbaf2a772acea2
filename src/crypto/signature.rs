//! Order-independent SHA-1 request signatures.

use sha1::{Digest, Sha1};

/// Sort the parts, concatenate, and return the lowercase hex SHA-1 digest.
///
/// Signers and verifiers only need to agree on the set of values, not on
/// their order.
pub fn sign<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let owned: Vec<S> = parts.into_iter().collect();
    let mut sorted: Vec<&str> = owned.iter().map(AsRef::as_ref).collect();
    sorted.sort_unstable();

    let mut sha = Sha1::new();
    sha.update(sorted.concat());
    hex::encode(sha.finalize())
}

/// Compare a supplied signature against the expected digest.
pub fn matches(expected: &str, supplied: Option<&str>) -> bool {
    let Some(supplied) = supplied else {
        return false;
    };
    supplied.len() == expected.len()
        && supplied
            .bytes()
            .zip(expected.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_value() {
        // sha1("abc")
        assert_eq!(sign(["abc"]), "a9993e364706816aba3e25717850c26c9cd0d89d");
    }

    #[test]
    fn test_order_independent() {
        assert_eq!(sign(["b", "c", "a"]), sign(["a", "b", "c"]));
        assert_eq!(sign(["a", "b", "c"]), sign(["abc"]));
    }

    #[test]
    fn test_platform_vector() {
        let signature = sign(["4c9184f37cff01bcdc32dc486ec36961", "1555644411", "1395122694"]);
        assert_eq!(signature, "b5c32d63ae3061aec855af7b638dcef72cb6f46a");
    }

    #[test]
    fn test_matches() {
        let sig = sign(["t", "1", "2"]);
        assert!(matches(&sig, Some(&sig)));
        assert!(!matches(&sig, Some(&sig[1..])));
        assert!(!matches(&sig, Some(&sig.to_uppercase())));
        assert!(!matches(&sig, None));
    }
}
