//! Signing token issuance.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use emarge_types::SigningToken;
use rand::rngs::OsRng;
use rand::RngCore;

/// Number of random bytes per token. 24 bytes = 192 bits of entropy,
/// comfortably above the 120-bit floor for unguessable public links.
const TOKEN_BYTES: usize = 24;

/// Issues high-entropy opaque signing tokens, URL-safe for links and QR
/// codes.
#[derive(Debug, Clone, Default)]
pub struct SigningTokenGenerator;

impl SigningTokenGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn generate(&self) -> SigningToken {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        SigningToken::new(URL_SAFE_NO_PAD.encode(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_url_safe() {
        let token = SigningTokenGenerator::new().generate();
        assert!(token
            .as_str()
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn tokens_carry_full_entropy_length() {
        let token = SigningTokenGenerator::new().generate();
        // 24 bytes -> 32 base64 chars, unpadded
        assert_eq!(token.as_str().len(), 32);
    }

    #[test]
    fn tokens_do_not_repeat() {
        let generator = SigningTokenGenerator::new();
        assert_ne!(generator.generate(), generator.generate());
    }
}
