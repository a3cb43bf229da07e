use thiserror::Error;

/// Errors from key handling and decryption.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Key pair generation failed
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    /// Public key could not be encoded or decoded
    #[error("invalid public key: {0}")]
    PublicKey(String),

    /// Ciphertext is not valid base64
    #[error("ciphertext is not valid base64: {0}")]
    InvalidBase64(String),

    /// OAEP decryption failed (wrong key or corrupted ciphertext)
    #[error("decryption failed")]
    DecryptionFailed,

    /// Encryption failed (message too long for the key)
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    /// Decrypted bytes were expected to be UTF-8 text
    #[error("decrypted payload is not valid UTF-8")]
    NotUtf8,
}
