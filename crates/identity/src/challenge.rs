use std::collections::HashMap;
use std::time::{Duration, Instant};

use rand::Rng;

use crate::{normalize_email, IdentityError, Result};

pub const DEFAULT_CODE_TTL: Duration = Duration::from_secs(600);

struct Challenge {
    code: String,
    issued_at: Instant,
}

/// Pending 6-digit email login codes, one per address.
///
/// Issuing again replaces the previous code. A correct code is consumed;
/// a wrong one leaves the challenge in place until it expires.
pub struct LoginChallenges {
    ttl: Duration,
    pending: HashMap<String, Challenge>,
}

impl Default for LoginChallenges {
    fn default() -> Self {
        Self::new(DEFAULT_CODE_TTL)
    }
}

impl LoginChallenges {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, pending: HashMap::new() }
    }

    pub fn issue(&mut self, email: &str) -> Result<String> {
        self.issue_at(email, Instant::now())
    }

    pub fn verify(&mut self, email: &str, code: &str) -> Result<()> {
        self.verify_at(email, code, Instant::now())
    }

    fn issue_at(&mut self, email: &str, now: Instant) -> Result<String> {
        let email = normalize_email(email)?;
        let code = rand::thread_rng().gen_range(100_000..1_000_000u32).to_string();
        self.pending.insert(email, Challenge { code: code.clone(), issued_at: now });
        Ok(code)
    }

    fn verify_at(&mut self, email: &str, code: &str, now: Instant) -> Result<()> {
        let email = normalize_email(email)?;
        let challenge = self.pending.get(&email).ok_or(IdentityError::ChallengeNotFound)?;

        if now.saturating_duration_since(challenge.issued_at) > self.ttl {
            self.pending.remove(&email);
            return Err(IdentityError::ChallengeExpired);
        }
        if challenge.code != code.trim() {
            return Err(IdentityError::InvalidCode);
        }

        self.pending.remove(&email);
        Ok(())
    }

    /// Drop expired challenges.
    pub fn prune(&mut self) {
        let now = Instant::now();
        let ttl = self.ttl;
        self.pending.retain(|_, c| now.saturating_duration_since(c.issued_at) <= ttl);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_is_six_digits() {
        let mut ch = LoginChallenges::default();
        let code = ch.issue("a@b.c").unwrap();
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_code_single_use() {
        let mut ch = LoginChallenges::default();
        let code = ch.issue("a@b.c").unwrap();
        ch.verify("A@B.C", &code).unwrap();
        assert!(matches!(ch.verify("a@b.c", &code), Err(IdentityError::ChallengeNotFound)));
    }

    #[test]
    fn test_wrong_code_keeps_challenge() {
        let mut ch = LoginChallenges::default();
        let code = ch.issue("a@b.c").unwrap();
        let wrong = if code == "123456" { "654321" } else { "123456" };
        assert!(matches!(ch.verify("a@b.c", wrong), Err(IdentityError::InvalidCode)));
        ch.verify("a@b.c", &code).unwrap();
    }

    #[test]
    fn test_expired_code() {
        let mut ch = LoginChallenges::new(Duration::from_secs(60));
        let t0 = Instant::now();
        let code = ch.issue_at("a@b.c", t0).unwrap();
        let later = t0 + Duration::from_secs(61);
        assert!(matches!(ch.verify_at("a@b.c", &code, later), Err(IdentityError::ChallengeExpired)));
        assert!(ch.is_empty());
    }

    #[test]
    fn test_reissue_replaces_code() {
        let mut ch = LoginChallenges::default();
        let t0 = Instant::now();
        ch.issue_at("a@b.c", t0).unwrap();
        let second = ch.issue_at("a@b.c", t0).unwrap();
        assert_eq!(ch.len(), 1);
        ch.verify_at("a@b.c", &second, t0).unwrap();
    }
}
