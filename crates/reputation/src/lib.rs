//! Reputation scoring over verified external accounts.
//!
//! A score is derived from the accounts a user has proven control of: every
//! provider contributes a base weight plus an activity bonus computed from
//! provider-specific counters. Scores are capped at 100 per provider and in
//! total.

pub mod schema;
pub mod weights;
pub mod score;

pub use schema::*;
pub use weights::*;
pub use score::*;
