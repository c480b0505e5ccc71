use super::{Operator, OperatorConfig, OperatorType};
use hmac::{Hmac, Mac};
use sha2::{Sha256, Sha512};
use veil_core::{Error, Result};

pub const NAME: &str = "hash";
pub const HASH_TYPE: &str = "hash_type";
pub const SALT: &str = "salt";

const SALT_LEN: usize = 16;

type HmacSha256 = Hmac<Sha256>;
type HmacSha512 = Hmac<Sha512>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HashType {
    Sha256,
    Sha512,
}

/// Replace the span with a salted HMAC digest in lower-case hex
///
/// Without a `salt` parameter a random salt is drawn per call, so equal
/// inputs hash differently.
pub struct Hash;

fn hash_type(config: &OperatorConfig) -> Result<HashType> {
    match config.str_param(HASH_TYPE)? {
        None | Some("sha256") => Ok(HashType::Sha256),
        Some("sha512") => Ok(HashType::Sha512),
        Some(other) => Err(Error::InvalidParameter(format!(
            "{}: unsupported {} '{}', expected sha256 or sha512",
            NAME, HASH_TYPE, other
        ))),
    }
}

fn salt(config: &OperatorConfig) -> Result<Option<&str>> {
    match config.str_param(SALT)? {
        Some("") => Err(Error::InvalidParameter(format!(
            "{}: '{}' must not be empty",
            NAME, SALT
        ))),
        salt => Ok(salt),
    }
}

fn digest(hash_type: HashType, key: &[u8], text: &str) -> Result<String> {
    let key_error = |e: hmac::digest::InvalidLength| Error::Crypto(format!("HMAC key error: {}", e));
    Ok(match hash_type {
        HashType::Sha256 => {
            let mut mac = HmacSha256::new_from_slice(key).map_err(key_error)?;
            mac.update(text.as_bytes());
            format!("{:x}", mac.finalize().into_bytes())
        }
        HashType::Sha512 => {
            let mut mac = HmacSha512::new_from_slice(key).map_err(key_error)?;
            mac.update(text.as_bytes());
            format!("{:x}", mac.finalize().into_bytes())
        }
    })
}

impl Operator for Hash {
    fn operator_name(&self) -> &str {
        NAME
    }

    fn operator_type(&self) -> OperatorType {
        OperatorType::Anonymize
    }

    fn validate(&self, config: &OperatorConfig) -> Result<()> {
        hash_type(config)?;
        salt(config)?;
        Ok(())
    }

    fn operate(&self, text: &str, config: &OperatorConfig, _entity_type: &str) -> Result<String> {
        let hash_type = hash_type(config)?;
        match salt(config)? {
            Some(salt) => digest(hash_type, salt.as_bytes(), text),
            None => digest(hash_type, &rand::random::<[u8; SALT_LEN]>(), text),
        }
    }
}
