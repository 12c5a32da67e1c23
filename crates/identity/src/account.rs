use ed25519_dalek::SigningKey;
use rand_core::OsRng;
use serde::{Deserialize, Serialize};

use crate::{IdentityError, Result};

/// Demo account minted at email login. Only the public half is kept.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetaAccount {
    pub address: String,     // 0x + 40 hex chars
    pub email: String,
    pub public_key: String,  // hex ed25519 verifying key
}

/// Trim and lowercase `email`; must be non-empty and contain `@`.
pub fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(IdentityError::InvalidEmail(email.to_string()));
    }
    Ok(email.to_lowercase())
}

/// Generate a fresh keypair and derive an address from the last 20 bytes
/// of BLAKE3(verifying_key).
pub fn create_meta_account(email: &str) -> Result<MetaAccount> {
    let email = normalize_email(email)?;

    let signing_key = SigningKey::generate(&mut OsRng);
    let verifying_key = signing_key.verifying_key();
    let digest = blake3::hash(verifying_key.as_bytes());

    Ok(MetaAccount {
        address: format!("0x{}", hex::encode(&digest.as_bytes()[12..])),
        email,
        public_key: hex::encode(verifying_key.as_bytes()),
    })
}
