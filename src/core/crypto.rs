// Cryptographic utilities: AES-256-ECB payload cipher, HMAC-SHA256 envelope
// signing with constant-time verification

use crate::core::constants::crypto::SECRET_KEY_LENGTH;
use crate::core::errors::CryptoError;
use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyInit};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type Aes256EcbEnc = ecb::Encryptor<aes::Aes256>;
type Aes256EcbDec = ecb::Decryptor<aes::Aes256>;
type HmacSha256 = Hmac<Sha256>;

/// Symmetric payload cipher: AES-256 in ECB mode with PKCS#7 padding,
/// ciphertext rendered as standard base64.
///
/// Encryption is deliberately deterministic - no IV or nonce - because the
/// server contract requires identical plaintext to produce identical
/// ciphertext. This is a known weakness (repeated identical requests are
/// distinguishable on the wire) and must not be changed unilaterally.
pub struct CipherCodec {
    key: [u8; SECRET_KEY_LENGTH],
}

impl CipherCodec {
    /// Create a codec from the 32-byte pre-shared secret key.
    pub fn new(key: &[u8]) -> Result<Self, CryptoError> {
        let key: [u8; SECRET_KEY_LENGTH] =
            key.try_into().map_err(|_| CryptoError::InvalidKeyLength {
                expected: SECRET_KEY_LENGTH,
                actual: key.len(),
            })?;
        Ok(Self { key })
    }

    /// Encrypt arbitrary-length plaintext; returns base64 ciphertext.
    pub fn encode(&self, plaintext: &[u8]) -> String {
        let ciphertext =
            Aes256EcbEnc::new(&self.key.into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext);
        BASE64.encode(ciphertext)
    }

    /// Decrypt base64 ciphertext back to plaintext bytes.
    ///
    /// Fails on malformed base64 or bad PKCS#7 padding (wrong key or
    /// corrupted data surface as padding errors in ECB mode).
    pub fn decode(&self, ciphertext: &str) -> Result<Vec<u8>, CryptoError> {
        let bytes = BASE64
            .decode(ciphertext)
            .map_err(|e| CryptoError::MalformedCiphertext(e.to_string()))?;
        Aes256EcbDec::new(&self.key.into())
            .decrypt_padded_vec_mut::<Pkcs7>(&bytes)
            .map_err(|_| CryptoError::InvalidPadding)
    }
}

/// Keyed signer/verifier for envelope payloads.
///
/// The MAC is HMAC-SHA256 over the raw plaintext bytes (never the
/// ciphertext). Wire rendering is base64 of the lowercase-hex digest string,
/// not of the raw digest bytes - the server computes it that way, so both
/// sides must agree.
pub struct EnvelopeSigner {
    mac: HmacSha256,
}

impl EnvelopeSigner {
    /// Create a signer from the shared secret key. The key length is
    /// validated here even though HMAC itself accepts any length, so a
    /// truncated key fails loudly at construction instead of silently
    /// signing with the wrong secret.
    pub fn new(key: &[u8]) -> Result<Self, CryptoError> {
        if key.len() != SECRET_KEY_LENGTH {
            return Err(CryptoError::InvalidKeyLength {
                expected: SECRET_KEY_LENGTH,
                actual: key.len(),
            });
        }
        let mac = <HmacSha256 as Mac>::new_from_slice(key)
            .map_err(|_| CryptoError::InvalidKeyLength {
                expected: SECRET_KEY_LENGTH,
                actual: key.len(),
            })?;
        Ok(Self { mac })
    }

    /// Sign plaintext bytes; returns the wire-format signature.
    pub fn sign(&self, plaintext: &[u8]) -> String {
        let digest = self.mac.clone().chain_update(plaintext).finalize().into_bytes();
        BASE64.encode(hex::encode(digest).as_bytes())
    }

    /// Verify a signature against plaintext bytes.
    ///
    /// Returns `false` - never errors - when either input is empty, and
    /// compares in constant time otherwise. Decrypted response bodies must
    /// not be parsed until this returns `true`.
    pub fn verify(&self, plaintext: &[u8], signature: &str) -> bool {
        if plaintext.is_empty() || signature.is_empty() {
            return false;
        }
        let expected = self.sign(plaintext);
        if expected.len() != signature.len() {
            return false;
        }
        expected.as_bytes().ct_eq(signature.as_bytes()).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const TEST_KEY: &[u8] = b"T4LXYFqvDkzN7BpMjh3oWsR1V2gJ9uZk";

    fn codec() -> CipherCodec {
        CipherCodec::new(TEST_KEY).unwrap()
    }

    fn signer() -> EnvelopeSigner {
        EnvelopeSigner::new(TEST_KEY).unwrap()
    }

    #[test]
    fn test_roundtrip() {
        let plaintext = br#"{"user_id":42,"items":["a","b"]}"#;
        let ciphertext = codec().encode(plaintext);
        assert_eq!(codec().decode(&ciphertext).unwrap(), plaintext);
    }

    #[test]
    fn test_roundtrip_empty_plaintext() {
        let ciphertext = codec().encode(b"");
        assert_eq!(codec().decode(&ciphertext).unwrap(), b"");
    }

    #[test]
    fn test_encryption_is_deterministic() {
        // Wire-compatibility invariant: no IV, so identical plaintext under
        // the same key yields identical ciphertext.
        let plaintext = b"repeated request body";
        assert_eq!(codec().encode(plaintext), codec().encode(plaintext));
    }

    #[test]
    fn test_decode_rejects_malformed_base64() {
        match codec().decode("not//valid@@base64!!") {
            Err(CryptoError::MalformedCiphertext(_)) => (),
            other => panic!("Expected MalformedCiphertext, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_rejects_wrong_key() {
        let other_key = b"00000000000000000000000000000000";
        let ciphertext = codec().encode(b"hello");
        // Wrong key usually shows up as garbage padding; on the off chance
        // the padding happens to validate, the plaintext is still garbage.
        match CipherCodec::new(other_key).unwrap().decode(&ciphertext) {
            Err(CryptoError::InvalidPadding) => (),
            Ok(decrypted) => assert_ne!(decrypted, b"hello"),
            Err(e) => panic!("Expected InvalidPadding, got {:?}", e),
        }
    }

    #[test]
    fn test_key_length_validation() {
        assert!(matches!(
            CipherCodec::new(b"short"),
            Err(CryptoError::InvalidKeyLength { expected: 32, actual: 5 })
        ));
        assert!(matches!(
            EnvelopeSigner::new(b"short"),
            Err(CryptoError::InvalidKeyLength { expected: 32, actual: 5 })
        ));
    }

    #[test]
    fn test_sign_verify() {
        let plaintext = b"payload to protect";
        let signature = signer().sign(plaintext);
        assert!(signer().verify(plaintext, &signature));
    }

    #[test]
    fn test_verify_rejects_mutated_plaintext() {
        let signature = signer().sign(b"original payload");
        assert!(!signer().verify(b"original payloae", &signature));
        assert!(!signer().verify(b"original payload ", &signature));
    }

    #[test]
    fn test_verify_rejects_empty_inputs() {
        let signature = signer().sign(b"payload");
        assert!(!signer().verify(b"", &signature));
        assert!(!signer().verify(b"payload", ""));
    }

    #[test]
    fn test_signature_wire_format_is_base64_of_hex() {
        use base64::Engine;
        // The server base64-encodes the hex digest text, so the decoded
        // signature must be 64 lowercase hex characters.
        let signature = signer().sign(b"payload");
        let decoded = BASE64.decode(&signature).unwrap();
        assert_eq!(decoded.len(), 64);
        assert!(decoded
            .iter()
            .all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase()));
    }

    #[test]
    fn test_skincare_scenario() {
        let payload = serde_json::json!({"category": "skincare"});
        let plaintext = serde_json::to_vec(&payload).unwrap();
        let ciphertext = codec().encode(&plaintext);
        let decrypted = codec().decode(&ciphertext).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&decrypted).unwrap();
        assert_eq!(parsed, payload);
    }

    proptest! {
        #[test]
        fn prop_roundtrip_arbitrary_plaintext(plaintext in proptest::collection::vec(any::<u8>(), 0..512)) {
            let ciphertext = codec().encode(&plaintext);
            prop_assert_eq!(codec().decode(&ciphertext).unwrap(), plaintext);
        }

        #[test]
        fn prop_signature_verifies(plaintext in proptest::collection::vec(any::<u8>(), 1..256)) {
            let signature = signer().sign(&plaintext);
            prop_assert!(signer().verify(&plaintext, &signature));
        }
    }
}
