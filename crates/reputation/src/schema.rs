use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ActivityError {
    #[error("activity counter `{key}` must be a finite, non-negative number (got {value})")]
    InvalidCount { key: String, value: f64 },
}

/// Named activity counters reported by a provider (commits, followers, ...).
///
/// Keys are open-ended; a counter that was never reported reads as zero.
/// Negative and non-finite values are rejected on the way in, including
/// when deserializing. On deserialize, `null` or a non-object reads as no
/// counters and non-numeric fields are skipped.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Option<Value>", into = "BTreeMap<String, f64>")]
pub struct ActivityCounters(BTreeMap<String, f64>);

impl ActivityCounters {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: f64) -> Result<(), ActivityError> {
        let key = key.into();
        if !value.is_finite() || value < 0.0 {
            return Err(ActivityError::InvalidCount { key, value });
        }
        self.0.insert(key, value);
        Ok(())
    }

    /// Builder form of [`ActivityCounters::insert`].
    pub fn with(mut self, key: impl Into<String>, value: f64) -> Result<Self, ActivityError> {
        self.insert(key, value)?;
        Ok(self)
    }

    pub fn get(&self, key: &str) -> f64 {
        self.0.get(key).copied().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl TryFrom<Option<Value>> for ActivityCounters {
    type Error = ActivityError;

    fn try_from(value: Option<Value>) -> Result<Self, Self::Error> {
        let mut counters = Self::new();
        let Some(Value::Object(map)) = value else {
            return Ok(counters);
        };
        for (key, value) in map {
            if let Some(n) = value.as_f64() {
                counters.insert(key, n)?;
            }
        }
        Ok(counters)
    }
}

impl From<ActivityCounters> for BTreeMap<String, f64> {
    fn from(counters: ActivityCounters) -> Self {
        counters.0
    }
}

/// Evidence that a user controls an account with `provider`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VerifiedAccountRecord {
    pub provider: String,          // case-insensitive
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub activity: ActivityCounters,
}

impl VerifiedAccountRecord {
    pub fn new(provider: impl Into<String>, activity: ActivityCounters) -> Self {
        Self {
            provider: provider.into(),
            timestamp: Utc::now(),
            activity,
        }
    }

    /// Lowercased provider id, the key used for weights and the breakdown.
    pub fn provider_id(&self) -> String {
        self.provider.to_lowercase()
    }
}

/// Snapshot produced by one scoring pass. Never updated in place.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReputationMetrics {
    total: f64,
    breakdown: BTreeMap<String, f64>,
    verified_account_count: usize,
    computed_at: DateTime<Utc>,
}

impl ReputationMetrics {
    pub(crate) fn new(
        total: f64,
        breakdown: BTreeMap<String, f64>,
        verified_account_count: usize,
        computed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            total,
            breakdown,
            verified_account_count,
            computed_at,
        }
    }

    /// Overall score in `[0, 100]`.
    pub fn total(&self) -> f64 {
        self.total
    }

    /// Per-provider scores in `[0, 100]`, keyed by lowercased provider id.
    pub fn breakdown(&self) -> &BTreeMap<String, f64> {
        &self.breakdown
    }

    pub fn provider_score(&self, provider: &str) -> Option<f64> {
        self.breakdown.get(&provider.to_lowercase()).copied()
    }

    pub fn verified_account_count(&self) -> usize {
        self.verified_account_count
    }

    pub fn computed_at(&self) -> DateTime<Utc> {
        self.computed_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_counter_reads_zero() {
        let counters = ActivityCounters::new().with("commits", 4.0).unwrap();
        assert_eq!(counters.get("commits"), 4.0);
        assert_eq!(counters.get("followers"), 0.0);
    }

    #[test]
    fn test_rejects_negative_and_non_finite() {
        let mut counters = ActivityCounters::new();
        assert!(counters.insert("commits", -1.0).is_err());
        assert!(counters.insert("commits", f64::NAN).is_err());
        assert!(counters.insert("commits", f64::INFINITY).is_err());
        assert!(counters.is_empty());
    }

    #[test]
    fn test_deserialize_validates_counters() {
        let ok: VerifiedAccountRecord = serde_json::from_str(
            r#"{"provider":"GitHub","activity":{"commits":3,"followers":1.5}}"#,
        )
        .unwrap();
        assert_eq!(ok.provider_id(), "github");
        assert_eq!(ok.activity.get("followers"), 1.5);

        let bad = serde_json::from_str::<VerifiedAccountRecord>(
            r#"{"provider":"github","activity":{"commits":-3}}"#,
        );
        assert!(bad.is_err());
    }

    #[test]
    fn test_null_activity_reads_as_empty() {
        let rec: VerifiedAccountRecord =
            serde_json::from_str(r#"{"provider":"github","activity":null}"#).unwrap();
        assert!(rec.activity.is_empty());

        let rec: VerifiedAccountRecord =
            serde_json::from_str(r#"{"provider":"github","activity":[1,2]}"#).unwrap();
        assert!(rec.activity.is_empty());
    }

    #[test]
    fn test_non_numeric_activity_fields_skipped() {
        let rec: VerifiedAccountRecord = serde_json::from_str(
            r#"{"provider":"github","activity":{"commits":10,"login":"octocat","orgs":{"n":2}}}"#,
        )
        .unwrap();
        assert_eq!(rec.activity.len(), 1);
        assert_eq!(rec.activity.get("commits"), 10.0);
        assert_eq!(rec.activity.get("login"), 0.0);
    }

    #[test]
    fn test_activity_defaults_to_empty() {
        let rec: VerifiedAccountRecord =
            serde_json::from_str(r#"{"provider":"mastodon"}"#).unwrap();
        assert!(rec.activity.is_empty());
    }
}
