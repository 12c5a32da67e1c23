use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use reputation::ReputationWeights;

#[derive(Clone, Debug)]
pub struct GatewayConfig {
    pub bind_addr: String,
    pub session_path: PathBuf,

    /// Public base URL of this gateway; callback URLs are built from it.
    pub public_origin: String,
    pub app_id: String,
    pub network: String,

    /// Proof verification service. `None` runs the built-in mock.
    pub verifier_url: Option<String>,
    pub callback_secret: Option<String>,

    pub login_code_ttl: Duration,
    pub weights_path: Option<PathBuf>,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let opt = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = opt("GATEWAY_BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string());
        let session_path = opt("SESSION_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("chainbridge_session.json"));
        let public_origin = opt("PUBLIC_ORIGIN")
            .unwrap_or_else(|| "http://localhost:3000".to_string())
            .trim_end_matches('/')
            .to_string();
        let app_id = opt("RECLAIM_APP_ID").unwrap_or_else(|| "chainbridge-id".to_string());
        let network = opt("RECLAIM_NETWORK").unwrap_or_else(|| "development".to_string());
        let verifier_url = opt("VERIFIER_URL").map(|u| u.trim_end_matches('/').to_string());
        let callback_secret = opt("CALLBACK_SECRET");
        let weights_path = opt("REPUTATION_WEIGHTS_PATH").map(PathBuf::from);

        let login_code_ttl = match opt("LOGIN_CODE_TTL_SECS") {
            Some(v) => Duration::from_secs(
                v.parse::<u64>()
                    .with_context(|| format!("LOGIN_CODE_TTL_SECS must be a number of seconds, got {v:?}"))?,
            ),
            None => identity::DEFAULT_CODE_TTL,
        };

        // Tiny sanity checks (fail fast, fail loud)
        if !is_http_url(&public_origin) {
            bail!("PUBLIC_ORIGIN must start with http:// or https://");
        }
        if let Some(url) = &verifier_url {
            if !is_http_url(url) {
                bail!("VERIFIER_URL must start with http:// or https://");
            }
        }
        if login_code_ttl.is_zero() {
            bail!("LOGIN_CODE_TTL_SECS must be greater than zero");
        }

        Ok(Self {
            bind_addr,
            session_path,
            public_origin,
            app_id,
            network,
            verifier_url,
            callback_secret,
            login_code_ttl,
            weights_path,
        })
    }

    pub fn callback_url(&self) -> String {
        format!("{}/api/reclaim/callback", self.public_origin)
    }

    /// Weight tables from `REPUTATION_WEIGHTS_PATH`, or the built-in defaults.
    pub fn load_weights(&self) -> Result<ReputationWeights> {
        let Some(path) = &self.weights_path else {
            return Ok(ReputationWeights::default());
        };
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read weights file {}", path.display()))?;
        ReputationWeights::from_json(&bytes)
            .with_context(|| format!("Invalid weights file {}", path.display()))
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}
