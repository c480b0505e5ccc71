//! AES-GCM encryption of span text
//!
//! Output is `base64(nonce || ciphertext)`. The key is the UTF-8 bytes of the
//! `key` parameter: 16 bytes selects AES-128, 32 bytes AES-256.

use super::{Operator, OperatorConfig, OperatorType, missing};
use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes128Gcm, Aes256Gcm, Nonce};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use veil_core::{Error, Result};

pub const ENCRYPT: &str = "encrypt";
pub const DECRYPT: &str = "decrypt";
pub const KEY: &str = "key";

const NONCE_LEN: usize = 12;

enum Cipher {
    Aes128(Aes128Gcm),
    Aes256(Aes256Gcm),
}

impl Cipher {
    fn from_config(operator: &str, config: &OperatorConfig) -> Result<Self> {
        let key = config.str_param(KEY)?.ok_or_else(|| missing(operator, KEY))?;
        let key_error = |e| Error::Crypto(format!("Invalid key: {}", e));
        match key.len() {
            16 => Ok(Self::Aes128(
                Aes128Gcm::new_from_slice(key.as_bytes()).map_err(key_error)?,
            )),
            32 => Ok(Self::Aes256(
                Aes256Gcm::new_from_slice(key.as_bytes()).map_err(key_error)?,
            )),
            n => Err(Error::InvalidParameter(format!(
                "{}: '{}' must be 128 or 256 bits (16 or 32 bytes), got {} bytes",
                operator, KEY, n
            ))),
        }
    }

    fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = match self {
            Self::Aes128(cipher) => cipher.encrypt(&nonce, plaintext),
            Self::Aes256(cipher) => cipher.encrypt(&nonce, plaintext),
        }
        .map_err(|e| Error::Crypto(format!("Encryption error: {}", e)))?;

        let mut sealed = nonce.to_vec();
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    fn open(&self, sealed: &[u8]) -> Result<Vec<u8>> {
        if sealed.len() < NONCE_LEN {
            return Err(Error::Crypto("Encrypted data too short".to_string()));
        }
        let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);

        match self {
            Self::Aes128(cipher) => cipher.decrypt(nonce, ciphertext),
            Self::Aes256(cipher) => cipher.decrypt(nonce, ciphertext),
        }
        .map_err(|e| Error::Crypto(format!("Decryption error: {}", e)))
    }
}

/// Encrypt the span with the caller's key
pub struct Encrypt;

impl Operator for Encrypt {
    fn operator_name(&self) -> &str {
        ENCRYPT
    }

    fn operator_type(&self) -> OperatorType {
        OperatorType::Anonymize
    }

    fn validate(&self, config: &OperatorConfig) -> Result<()> {
        Cipher::from_config(ENCRYPT, config).map(|_| ())
    }

    fn operate(&self, text: &str, config: &OperatorConfig, _entity_type: &str) -> Result<String> {
        let sealed = Cipher::from_config(ENCRYPT, config)?.seal(text.as_bytes())?;
        Ok(STANDARD.encode(sealed))
    }
}

/// Reverse [`Encrypt`] given the same key
pub struct Decrypt;

impl Operator for Decrypt {
    fn operator_name(&self) -> &str {
        DECRYPT
    }

    fn operator_type(&self) -> OperatorType {
        OperatorType::Deanonymize
    }

    fn validate(&self, config: &OperatorConfig) -> Result<()> {
        Cipher::from_config(DECRYPT, config).map(|_| ())
    }

    fn operate(&self, text: &str, config: &OperatorConfig, _entity_type: &str) -> Result<String> {
        let sealed = STANDARD
            .decode(text)
            .map_err(|e| Error::Crypto(format!("Encrypted text is not valid base64: {}", e)))?;
        let plaintext = Cipher::from_config(DECRYPT, config)?.open(&sealed)?;
        String::from_utf8(plaintext)
            .map_err(|e| Error::Crypto(format!("Decrypted text is not UTF-8: {}", e)))
    }
}
