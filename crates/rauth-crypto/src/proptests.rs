//! Property-based tests for rauth-crypto

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::hash::nonce_proof;
    use crate::keypair::encrypt_to;
    use crate::keypair::tests::shared_keys;

    // OAEP-SHA256 with a 2048-bit modulus carries at most 256 - 2*32 - 2 bytes.
    const MAX_OAEP_PLAINTEXT: usize = 190;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_decrypt_inverts_encrypt(message in prop::collection::vec(any::<u8>(), 0..=MAX_OAEP_PLAINTEXT)) {
            let keys = shared_keys();
            let ciphertext = encrypt_to(keys.public_key(), &message).unwrap();
            let plaintext = keys.decrypt(&ciphertext).unwrap();
            prop_assert_eq!(plaintext.as_slice(), message.as_slice());
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn prop_nonce_proof_is_deterministic(nonce in prop::collection::vec(any::<u8>(), 0..128)) {
            prop_assert_eq!(nonce_proof(&nonce), nonce_proof(&nonce));
        }

        #[test]
        fn prop_nonce_proof_alphabet(nonce in prop::collection::vec(any::<u8>(), 0..128)) {
            let proof = nonce_proof(&nonce);
            prop_assert!(!proof.contains('='));
            prop_assert!(!proof.contains('+'));
            prop_assert!(!proof.contains('/'));
            prop_assert!(proof.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        }

        #[test]
        fn prop_distinct_nonces_distinct_proofs(
            a in prop::collection::vec(any::<u8>(), 1..64),
            b in prop::collection::vec(any::<u8>(), 1..64),
        ) {
            prop_assume!(a != b);
            prop_assert_ne!(nonce_proof(&a), nonce_proof(&b));
        }
    }
}
