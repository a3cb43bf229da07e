//! `keygen-check`: generate a session key and verify it end to end.

use std::time::Instant;

use rauth_crypto::keypair::{encrypt_to, import_public};
use rauth_crypto::{CryptoError, SessionKeyPair};

use crate::output::{KeyCheckOutput, OutputFormatter};
use crate::ExitCode;

const PROBE: &[u8] = b"remote-auth key check";

/// Generate a key pair, re-import its advertised public key and round-trip a
/// probe through it.
pub async fn run(formatter: &OutputFormatter) -> anyhow::Result<ExitCode> {
    formatter.progress("Generating session key...");

    let started = Instant::now();
    let keys = tokio::task::spawn_blocking(SessionKeyPair::generate).await??;
    let generation_ms = started.elapsed().as_millis() as u64;

    let check = inspect(&keys, generation_ms);
    let code = if check.self_test_passed {
        ExitCode::Success
    } else {
        ExitCode::GeneralError
    };

    let rendered = formatter.format_key_check(&check);
    if !rendered.is_empty() {
        println!("{rendered}");
    }
    Ok(code)
}

pub fn inspect(keys: &SessionKeyPair, generation_ms: u64) -> KeyCheckOutput {
    let encoded = keys.encoded_public_key().to_string();
    let self_test_passed = match self_test(keys) {
        Ok(passed) => passed,
        Err(e) => {
            tracing::warn!(error = %e, "key self-test failed");
            false
        }
    };
    KeyCheckOutput {
        modulus_bits: keys.modulus_bits(),
        encoded_len: encoded.len(),
        encoded_public_key: encoded,
        generation_ms,
        self_test_passed,
    }
}

fn self_test(keys: &SessionKeyPair) -> Result<bool, CryptoError> {
    let advertised = import_public(keys.encoded_public_key())?;
    let ciphertext = encrypt_to(&advertised, PROBE)?;
    let plaintext = keys.decrypt(&ciphertext)?;
    Ok(plaintext.as_slice() == PROBE)
}
