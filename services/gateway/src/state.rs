use std::{collections::HashMap, sync::Arc};

use identity::{create_meta_account, normalize_email, AuthUser, LoginChallenges, MetaAccount, SessionStore, Storage};
use reputation::{ReputationCalculator, VerifiedAccountRecord};
use tokio::sync::{Mutex, RwLock};

use crate::config::GatewayConfig;
use crate::directory::ProviderDirectory;
use crate::verifier::ProofVerifier;

pub type SharedState = Arc<AppState>;
pub type Session = SessionStore<Box<dyn Storage>>;

/// A verified record together with the proof it came from.
#[derive(Clone, Debug)]
pub struct AttachedProof {
    pub proof_id: String,
    pub record: VerifiedAccountRecord,
}

#[derive(Clone)]
pub struct AppState {
    pub config: GatewayConfig,
    pub session: Arc<RwLock<Session>>,
    pub challenges: Arc<Mutex<LoginChallenges>>,
    pub accounts: Arc<RwLock<HashMap<String, MetaAccount>>>,  // by normalized email
    pub proofs: Arc<RwLock<HashMap<String, Vec<AttachedProof>>>>,  // by account address
    pub directory: Arc<dyn ProviderDirectory>,
    pub verifier: Arc<dyn ProofVerifier>,
    pub calculator: ReputationCalculator,
}

impl AppState {
    /// Opens the session store, which loads any previously saved user.
    pub fn new(
        config: GatewayConfig,
        storage: Box<dyn Storage>,
        directory: Arc<dyn ProviderDirectory>,
        verifier: Arc<dyn ProofVerifier>,
        calculator: ReputationCalculator,
    ) -> anyhow::Result<Self> {
        let session = SessionStore::open(storage)?;
        let challenges = LoginChallenges::new(config.login_code_ttl);
        Ok(Self {
            config,
            session: Arc::new(RwLock::new(session)),
            challenges: Arc::new(Mutex::new(challenges)),
            accounts: Arc::new(RwLock::new(HashMap::new())),
            proofs: Arc::new(RwLock::new(HashMap::new())),
            directory,
            verifier,
            calculator,
        })
    }

    pub async fn current_user(&self) -> Option<AuthUser> {
        self.session.read().await.current().cloned()
    }

    /// Mutate the session on the blocking pool; file-backed storage writes
    /// synchronously on every login and logout.
    pub async fn with_session<R, F>(&self, f: F) -> Result<R, tokio::task::JoinError>
    where
        R: Send + 'static,
        F: FnOnce(&mut Session) -> R + Send + 'static,
    {
        let session = self.session.clone();
        tokio::task::spawn_blocking(move || f(&mut session.blocking_write())).await
    }

    /// The meta account for `email`, minted on first login.
    pub async fn account_for(&self, email: &str) -> identity::Result<MetaAccount> {
        let email = normalize_email(email)?;
        let mut accounts = self.accounts.write().await;
        if let Some(account) = accounts.get(&email) {
            return Ok(account.clone());
        }
        let account = create_meta_account(&email)?;
        accounts.insert(email, account.clone());
        Ok(account)
    }

    /// Returns false when `proof_id` was already attached for this user.
    pub async fn attach_proof(&self, address: &str, proof_id: &str, record: VerifiedAccountRecord) -> bool {
        let mut proofs = self.proofs.write().await;
        let list = proofs.entry(address.to_string()).or_default();
        if list.iter().any(|p| p.proof_id == proof_id) {
            return false;
        }
        list.push(AttachedProof {
            proof_id: proof_id.to_string(),
            record,
        });
        true
    }

    /// Records in the order they were attached.
    pub async fn records_for(&self, address: &str) -> Vec<VerifiedAccountRecord> {
        self.proofs
            .read()
            .await
            .get(address)
            .map(|list| list.iter().map(|p| p.record.clone()).collect())
            .unwrap_or_default()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use reputation::ActivityCounters;

    #[tokio::test]
    async fn test_attach_is_idempotent_per_proof() {
        let st = testing::state();
        let rec = VerifiedAccountRecord::new("github", ActivityCounters::new());

        assert!(st.attach_proof("0xa", "p1", rec.clone()).await);
        assert!(!st.attach_proof("0xa", "p1", rec.clone()).await);
        assert!(st.attach_proof("0xa", "p2", rec.clone()).await);
        assert!(st.attach_proof("0xb", "p1", rec).await);

        assert_eq!(st.records_for("0xa").await.len(), 2);
        assert_eq!(st.records_for("0xb").await.len(), 1);
        assert!(st.records_for("0xc").await.is_empty());
    }

    #[tokio::test]
    async fn test_account_reused_per_email() {
        let st = testing::state();
        let first = st.account_for("Frank@Example.com").await.unwrap();
        let again = st.account_for(" frank@example.com ").await.unwrap();
        let other = st.account_for("grace@example.com").await.unwrap();

        assert_eq!(first, again);
        assert_eq!(first.email, "frank@example.com");
        assert_ne!(first.address, other.address);
        assert_eq!(st.accounts.read().await.len(), 2);
        assert!(st.account_for("nope").await.is_err());
    }

    #[tokio::test]
    async fn test_with_session_runs_off_runtime() {
        let st = testing::state();
        let user = st.with_session(|s| s.login("0xabc")).await.unwrap().unwrap();
        assert_eq!(user.address, "0xabc");
        assert_eq!(st.current_user().await, Some(user));

        st.with_session(|s| s.logout()).await.unwrap().unwrap();
        assert!(st.current_user().await.is_none());
    }
}
