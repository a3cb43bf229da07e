use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use sha2::{Digest, Sha256};

pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut h = Sha256::new();
    h.update(data);
    h.finalize().into()
}

/// Proof of key possession: unpadded URL-safe base64 of `sha256(nonce)`.
///
/// Equivalent to standard base64 with `=` stripped, `+` replaced by `-` and
/// `/` replaced by `_`.
pub fn nonce_proof(decrypted_nonce: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(sha256(decrypted_nonce))
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;

    #[test]
    fn test_sha256_known_vector() {
        let digest = sha256(b"abc");
        assert_eq!(digest[0], 0xba);
        assert_eq!(digest[31], 0xad);
    }

    #[test]
    fn test_nonce_proof_matches_substituted_standard_base64() {
        let nonce = b"\xfb\xff\xfe some nonce bytes";
        let expected = STANDARD
            .encode(sha256(nonce))
            .trim_end_matches('=')
            .replace('+', "-")
            .replace('/', "_");
        assert_eq!(nonce_proof(nonce), expected);
    }

    #[test]
    fn test_nonce_proof_length() {
        // 32 byte digest -> 43 unpadded base64 characters
        assert_eq!(nonce_proof(b"").len(), 43);
    }
}
