use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use reputation::VerifiedAccountRecord;
use serde::Deserialize;

use crate::verifier::{activity_from_json, VerificationRequest, VerificationSession, VerifierInfo};

pub struct HttpVerifier {
    base_url: String,
    client: reqwest::Client,
}

impl HttpVerifier {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Deserialize)]
struct StartResp {
    url: String,
}

#[derive(Deserialize)]
struct ProofResp {
    provider: String,
    #[serde(default)]
    data: serde_json::Value,
}

#[async_trait]
impl crate::verifier::ProofVerifier for HttpVerifier {
    async fn start_verification(&self, req: &VerificationRequest) -> anyhow::Result<VerificationSession> {
        let url = format!("{}/v1/requests", self.base_url);
        let resp = self.client.post(url).json(req).send().await?.error_for_status()?;
        let body: StartResp = resp.json().await.context("verifier returned malformed request response")?;

        Ok(VerificationSession {
            request_id: req.request_id,
            url: body.url,
        })
    }

    async fn verify_proof(&self, proof_id: &str) -> anyhow::Result<VerifiedAccountRecord> {
        let url = format!("{}/v1/proofs/{}/verify", self.base_url, urlencoding::encode(proof_id));
        let resp = self.client.post(url).send().await?.error_for_status()?;
        let proof: ProofResp = resp.json().await.context("verifier returned malformed proof")?;

        Ok(VerifiedAccountRecord {
            provider: proof.provider,
            timestamp: Utc::now(),
            activity: activity_from_json(&proof.data),
        })
    }

    async fn ping(&self) -> anyhow::Result<()> {
        let url = format!("{}/v1/health", self.base_url);
        self.client.get(url).send().await?.error_for_status()?;
        Ok(())
    }

    fn info(&self) -> VerifierInfo {
        VerifierInfo {
            name: "http".to_string(),
            base_url: self.base_url.clone(),
        }
    }
}
