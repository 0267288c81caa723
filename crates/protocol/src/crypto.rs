//! Cryptographic primitives for the TSM envelope.
//!
//! This module provides the Triple-DES payload cipher and the
//! SHA1withRSA request signer. Both hold only immutable key material, so a
//! single instance can be shared by concurrent calls.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use des::TdesEde3;
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::{Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha1::{Digest, Sha1};

use crate::error::{ProtocolError, Result};

/// Length of a three-key Triple-DES key in bytes.
pub const TDES_KEY_LENGTH: usize = 24;

/// Triple-DES block size in bytes.
pub const TDES_BLOCK_SIZE: usize = 8;

/// The gateway uses a fixed all-zero IV. It is never transmitted.
const ZERO_IV: [u8; TDES_BLOCK_SIZE] = [0u8; TDES_BLOCK_SIZE];

type TdesCbcEnc = cbc::Encryptor<TdesEde3>;
type TdesCbcDec = cbc::Decryptor<TdesEde3>;

/// Triple-DES (EDE, 3-key) in CBC mode with PKCS#7 padding.
///
/// Ciphertext travels as standard Base64. A fresh CBC state is created for
/// every call; the key is fixed at construction.
#[derive(Clone)]
pub struct SymmetricCipher {
    key: [u8; TDES_KEY_LENGTH],
}

impl SymmetricCipher {
    /// Creates a cipher from the Base64 key string found in gateway configuration.
    pub fn from_base64_key(key_b64: &str) -> Result<Self> {
        let raw = STANDARD.decode(key_b64.trim()).map_err(|e| {
            ProtocolError::InvalidKey(format!("symmetric key is not valid Base64: {}", e))
        })?;
        Self::from_key_bytes(&raw)
    }

    /// Creates a cipher from raw key bytes. The key must be exactly 24 bytes.
    pub fn from_key_bytes(raw: &[u8]) -> Result<Self> {
        let key: [u8; TDES_KEY_LENGTH] = raw.try_into().map_err(|_| {
            ProtocolError::InvalidKey(format!(
                "Triple-DES key must be {} bytes, got {}",
                TDES_KEY_LENGTH,
                raw.len()
            ))
        })?;
        Ok(Self { key })
    }

    /// Encrypts a UTF-8 payload and returns Base64 ciphertext.
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let encryptor = TdesCbcEnc::new_from_slices(&self.key, &ZERO_IV)
            .map_err(|e| ProtocolError::Encryption(e.to_string()))?;
        let ciphertext = encryptor.encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());
        Ok(STANDARD.encode(ciphertext))
    }

    /// Decrypts Base64 ciphertext back into the UTF-8 payload.
    pub fn decrypt(&self, ciphertext_b64: &str) -> Result<String> {
        let ciphertext = STANDARD.decode(ciphertext_b64).map_err(|e| {
            ProtocolError::Decryption(format!("ciphertext is not valid Base64: {}", e))
        })?;

        let decryptor = TdesCbcDec::new_from_slices(&self.key, &ZERO_IV)
            .map_err(|e| ProtocolError::Decryption(e.to_string()))?;
        let plaintext = decryptor
            .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
            .map_err(|_| {
                ProtocolError::Decryption(format!(
                    "bad padding or truncated ciphertext ({} bytes)",
                    ciphertext.len()
                ))
            })?;

        String::from_utf8(plaintext)
            .map_err(|e| ProtocolError::Decryption(format!("plaintext is not UTF-8: {}", e)))
    }
}

impl std::fmt::Debug for SymmetricCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymmetricCipher")
            .field("algorithm", &"DESede/CBC/PKCS5Padding")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Signs canonical strings with SHA1withRSA (RSASSA-PKCS1-v1_5 over SHA-1).
#[derive(Clone)]
pub struct RequestSigner {
    key: RsaPrivateKey,
}

impl RequestSigner {
    /// Parses an RSA private key from a PKCS#8 PEM block.
    ///
    /// Fails for malformed PEM and for PKCS#8 keys of any other algorithm.
    pub fn from_pkcs8_pem(pem: &str) -> Result<Self> {
        let key = RsaPrivateKey::from_pkcs8_pem(pem.trim_start())?;
        Ok(Self { key })
    }

    /// Signs the UTF-8 bytes of `message` and returns the Base64 signature.
    pub fn sign(&self, message: &str) -> Result<String> {
        let digest = Sha1::digest(message.as_bytes());
        let signature = self.key.sign(Pkcs1v15Sign::new::<Sha1>(), &digest)?;
        Ok(STANDARD.encode(signature))
    }

    /// Returns the verifier for the matching public key.
    pub fn verifier(&self) -> SignatureVerifier {
        SignatureVerifier {
            key: self.key.to_public_key(),
        }
    }
}

impl std::fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner")
            .field("algorithm", &"SHA1withRSA")
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

/// Verifies SHA1withRSA signatures against an RSA public key.
#[derive(Debug, Clone)]
pub struct SignatureVerifier {
    key: RsaPublicKey,
}

impl SignatureVerifier {
    /// Parses an RSA public key from a SubjectPublicKeyInfo PEM block.
    pub fn from_public_key_pem(pem: &str) -> Result<Self> {
        let key = RsaPublicKey::from_public_key_pem(pem.trim_start())?;
        Ok(Self { key })
    }

    /// Checks a Base64 signature over the UTF-8 bytes of `message`.
    pub fn verify(&self, message: &str, signature_b64: &str) -> Result<()> {
        let signature = STANDARD.decode(signature_b64).map_err(|e| {
            ProtocolError::InvalidSignature(format!("signature is not valid Base64: {}", e))
        })?;
        let digest = Sha1::digest(message.as_bytes());
        self.key
            .verify(Pkcs1v15Sign::new::<Sha1>(), &digest, &signature)
            .map_err(ProtocolError::from)
    }
}

/// Signs `message` with a PKCS#8 PEM private key in one step.
pub fn sign(message: &str, private_key_pem: &str) -> Result<String> {
    RequestSigner::from_pkcs8_pem(private_key_pem)?.sign(message)
}

/// Verifies a Base64 SHA1withRSA signature with a public key PEM in one step.
pub fn verify(public_key_pem: &str, message: &str, signature_b64: &str) -> Result<()> {
    SignatureVerifier::from_public_key_pem(public_key_pem)?.verify(message, signature_b64)
}
