//! PKCE and OAuth random material.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;
use sha2::{Digest, Sha256};

/// Random bytes behind each verifier, state and nonce.
const RANDOM_BYTES: usize = 32;

/// Material for one login round trip.
#[derive(Debug, Clone)]
pub struct PkceMaterial {
    pub verifier: String,
    pub challenge: String,
    pub state: String,
    pub nonce: String,
}

impl PkceMaterial {
    /// Generate fresh verifier, challenge, state and nonce.
    #[must_use]
    pub fn generate() -> Self {
        let verifier = random_token();
        let challenge = challenge_for(&verifier);
        Self {
            verifier,
            challenge,
            state: random_token(),
            nonce: random_token(),
        }
    }
}

/// 32 random bytes, base64url without padding.
#[must_use]
pub fn random_token() -> String {
    let mut bytes = [0u8; RANDOM_BYTES];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// S256 challenge: `base64url(SHA-256(verifier))`.
#[must_use]
pub fn challenge_for(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_challenge_rfc7636_vector() {
        // RFC 7636 appendix B
        assert_eq!(
            challenge_for("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn test_generated_material() {
        let material = PkceMaterial::generate();
        // 32 bytes -> 43 base64url characters
        assert_eq!(material.verifier.len(), 43);
        assert_eq!(material.challenge, challenge_for(&material.verifier));
        assert_ne!(material.state, material.nonce);
        assert!(!material.verifier.contains('='));
    }
}
