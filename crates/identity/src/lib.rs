//! Local identity state for ChainBridge ID.
//!
//! Holds the authenticated user record behind an explicit load/save
//! boundary, mints demo meta accounts, and tracks email login challenges.

mod storage;
mod session;
mod account;
mod challenge;

pub use storage::{Storage, StorageError, InMemoryStorage, FileBackedStorage};
pub use session::{AuthUser, SessionStore, SESSION_KEY, DEFAULT_CHAIN_ID};
pub use account::{MetaAccount, create_meta_account, normalize_email};
pub use challenge::{LoginChallenges, DEFAULT_CODE_TTL};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid email: {0:?}")]
    InvalidEmail(String),

    #[error("Address must not be empty")]
    EmptyAddress,

    #[error("No pending login code for this email")]
    ChallengeNotFound,

    #[error("Login code expired")]
    ChallengeExpired,

    #[error("Login code does not match")]
    InvalidCode,
}

pub type Result<T> = std::result::Result<T, IdentityError>;
