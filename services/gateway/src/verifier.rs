use std::collections::HashMap;

use anyhow::bail;
use async_trait::async_trait;
use reputation::{ActivityCounters, VerifiedAccountRecord};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifierInfo {
    pub name: String,
    pub base_url: String,
}

/// Proof request handed to the verification service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationRequest {
    pub request_id: Uuid,
    pub app_id: String,
    pub network: String,
    pub title: String,
    pub requested_proofs: Vec<RequestedProof>,
    pub callback_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestedProof {
    pub name: String,
    pub provider: String,
    #[serde(default)]
    pub params: serde_json::Map<String, serde_json::Value>,
}

impl VerificationRequest {
    pub fn for_provider(provider_id: &str, app_id: &str, network: &str, callback_url: &str) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            app_id: app_id.to_string(),
            network: network.to_string(),
            title: "Verify your identity".to_string(),
            requested_proofs: vec![RequestedProof {
                name: provider_id.to_string(),
                provider: provider_id.to_string(),
                params: serde_json::Map::new(),
            }],
            callback_url: callback_url.to_string(),
        }
    }
}

/// Where to send the user to produce the proof.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationSession {
    pub request_id: Uuid,
    pub url: String,
}

/// The third-party proof service. Internals are the vendor's concern.
#[async_trait]
pub trait ProofVerifier: Send + Sync {
    async fn start_verification(&self, req: &VerificationRequest) -> anyhow::Result<VerificationSession>;
    async fn verify_proof(&self, proof_id: &str) -> anyhow::Result<VerifiedAccountRecord>;
    async fn ping(&self) -> anyhow::Result<()>;
    fn info(&self) -> VerifierInfo;
}

/// Numeric top-level fields of a proof payload as activity counters.
/// Anything else (strings, nested objects, negative numbers) is skipped.
pub fn activity_from_json(data: &serde_json::Value) -> ActivityCounters {
    let mut activity = ActivityCounters::new();
    let Some(obj) = data.as_object() else {
        return activity;
    };
    for (key, value) in obj {
        let Some(n) = value.as_f64() else { continue };
        if let Err(e) = activity.insert(key.clone(), n) {
            debug!(error = %e, "skipping proof field");
        }
    }
    activity
}

/// Local stand-in used when no verifier service is configured.
///
/// Redirect URLs point back at `base_url`. Proof ids resolve either to a
/// record registered with [`MockVerifier::with_proof`] or, for ids shaped
/// `<provider>:<nonce>`, to a bare record for that provider.
pub struct MockVerifier {
    base_url: String,
    proofs: HashMap<String, VerifiedAccountRecord>,
}

impl MockVerifier {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            proofs: HashMap::new(),
        }
    }

    pub fn with_proof(mut self, proof_id: impl Into<String>, record: VerifiedAccountRecord) -> Self {
        self.proofs.insert(proof_id.into(), record);
        self
    }
}

#[async_trait]
impl ProofVerifier for MockVerifier {
    async fn start_verification(&self, req: &VerificationRequest) -> anyhow::Result<VerificationSession> {
        let Some(proof) = req.requested_proofs.first() else {
            bail!("verification request has no requested proofs");
        };
        let url = format!(
            "{}/mock/verify?app_id={}&provider={}&request_id={}&callback={}",
            self.base_url,
            urlencoding::encode(&req.app_id),
            urlencoding::encode(&proof.provider),
            req.request_id,
            urlencoding::encode(&req.callback_url),
        );
        Ok(VerificationSession { request_id: req.request_id, url })
    }

    async fn verify_proof(&self, proof_id: &str) -> anyhow::Result<VerifiedAccountRecord> {
        if let Some(record) = self.proofs.get(proof_id) {
            return Ok(record.clone());
        }
        match proof_id.split_once(':') {
            Some((provider, nonce)) if !provider.is_empty() && !nonce.is_empty() => {
                Ok(VerifiedAccountRecord::new(provider, ActivityCounters::new()))
            }
            _ => bail!("unknown proof id {proof_id:?}"),
        }
    }

    async fn ping(&self) -> anyhow::Result<()> {
        Ok(())
    }

    fn info(&self) -> VerifierInfo {
        VerifierInfo {
            name: "mock".to_string(),
            base_url: self.base_url.clone(),
        }
    }
}
