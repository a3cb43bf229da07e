//! Per-session RSA key pair.
//!
//! A fresh 2048-bit key pair is generated for every connection attempt. The
//! public half is advertised to the gateway in the `init` frame; everything
//! the gateway or login endpoint sends back (nonce, user record, token) is
//! RSA-OAEP encrypted to it with SHA-256 as the hash function.

use base64::{engine::general_purpose::STANDARD, Engine};
use rand_core::OsRng;
use rsa::pkcs8::{DecodePublicKey, EncodePublicKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::CryptoError;

/// Modulus size for session keys.
pub const MODULUS_BITS: usize = 2048;

/// RSA key pair owned by a single session.
#[derive(Clone)]
pub struct SessionKeyPair {
    private: RsaPrivateKey,
    public: RsaPublicKey,
    encoded_public: String,
}

impl std::fmt::Debug for SessionKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionKeyPair")
            .field("encoded_public", &self.encoded_public)
            .finish_non_exhaustive()
    }
}

impl SessionKeyPair {
    /// Generate a new key pair with the OS RNG.
    pub fn generate() -> Result<Self, CryptoError> {
        let private = RsaPrivateKey::new(&mut OsRng, MODULUS_BITS)
            .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;
        let public = RsaPublicKey::from(&private);
        let encoded_public = export_public(&public)?;
        Ok(Self {
            private,
            public,
            encoded_public,
        })
    }

    /// Public key as a single line of base64 SPKI, ready for the `init` frame.
    pub fn encoded_public_key(&self) -> &str {
        &self.encoded_public
    }

    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public
    }

    pub fn modulus_bits(&self) -> usize {
        self.public.size() * 8
    }

    /// Decrypt a base64 RSA-OAEP(SHA-256) ciphertext.
    pub fn decrypt(&self, ciphertext_b64: &str) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
        let ciphertext = STANDARD
            .decode(ciphertext_b64.trim())
            .map_err(|e| CryptoError::InvalidBase64(e.to_string()))?;
        self.private
            .decrypt(Oaep::new::<Sha256>(), &ciphertext)
            .map(Zeroizing::new)
            .map_err(|_| CryptoError::DecryptionFailed)
    }

    /// Decrypt and interpret the plaintext as UTF-8.
    pub fn decrypt_text(&self, ciphertext_b64: &str) -> Result<Zeroizing<String>, CryptoError> {
        let bytes = self.decrypt(ciphertext_b64)?;
        let text = std::str::from_utf8(&bytes).map_err(|_| CryptoError::NotUtf8)?;
        Ok(Zeroizing::new(text.to_string()))
    }
}

/// Encode a public key as PEM SPKI with the armour lines removed and the body
/// joined onto one line.
pub fn export_public(key: &RsaPublicKey) -> Result<String, CryptoError> {
    let pem = key
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| CryptoError::PublicKey(e.to_string()))?;
    Ok(pem
        .trim()
        .lines()
        .filter(|line| !line.starts_with("-----"))
        .collect())
}

/// Parse the single-line encoding produced by [`export_public`].
pub fn import_public(encoded: &str) -> Result<RsaPublicKey, CryptoError> {
    let der = STANDARD
        .decode(encoded.trim())
        .map_err(|e| CryptoError::PublicKey(e.to_string()))?;
    RsaPublicKey::from_public_key_der(&der).map_err(|e| CryptoError::PublicKey(e.to_string()))
}

/// Encrypt to an advertised public key, the way the gateway and the login
/// endpoint do. Returns base64 ciphertext.
pub fn encrypt_to(key: &RsaPublicKey, plaintext: &[u8]) -> Result<String, CryptoError> {
    let ciphertext = key
        .encrypt(&mut OsRng, Oaep::new::<Sha256>(), plaintext)
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;
    Ok(STANDARD.encode(ciphertext))
}
