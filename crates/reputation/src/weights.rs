use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ActivityCounters;

/// Upper bound for a single provider score and for the total.
pub const MAX_SCORE: f64 = 100.0;

/// Base weight for providers missing from the base table.
pub const FALLBACK_BASE_WEIGHT: f64 = 10.0;

const BASE_WEIGHTS: &[(&str, f64)] = &[
    ("github", 30.0),
    ("twitter", 20.0),
    ("linkedin", 25.0),
    ("google", 15.0),
    ("facebook", 10.0),
];

// `connections` has no provider rule yet.
const ACTIVITY_WEIGHTS: &[(&str, f64)] = &[
    ("commits", 2.0),
    ("followers", 1.0),
    ("repositories", 3.0),
    ("tweets", 0.5),
    ("connections", 1.5),
];

const PROVIDER_RULES: &[(&str, &[&str])] = &[
    ("github", &["commits", "followers", "repositories"]),
    ("twitter", &["tweets", "followers"]),
];

#[derive(Debug, Error)]
pub enum WeightsError {
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("weight `{key}` in {table} table must be finite and non-negative (got {value})")]
    Invalid {
        table: &'static str,
        key: String,
        value: f64,
    },
}

/// Lookup tables driving the score.
///
/// - `base`: starting score per provider, `fallback_base` for the rest
/// - `activity`: multiplier per activity counter
/// - `rules`: which counters count toward a provider's bonus; providers
///   without a rule get no bonus
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReputationWeights {
    pub base: BTreeMap<String, f64>,
    pub fallback_base: f64,
    pub activity: BTreeMap<String, f64>,
    pub rules: BTreeMap<String, Vec<String>>,
}

impl Default for ReputationWeights {
    fn default() -> Self {
        Self {
            base: BASE_WEIGHTS.iter().map(|(p, w)| (p.to_string(), *w)).collect(),
            fallback_base: FALLBACK_BASE_WEIGHT,
            activity: ACTIVITY_WEIGHTS.iter().map(|(k, w)| (k.to_string(), *w)).collect(),
            rules: PROVIDER_RULES
                .iter()
                .map(|(p, keys)| (p.to_string(), keys.iter().map(|k| k.to_string()).collect()))
                .collect(),
        }
    }
}

impl ReputationWeights {
    /// Parse a weights document. Provider keys are lowercased so lookups
    /// stay case-insensitive.
    pub fn from_json(bytes: &[u8]) -> Result<Self, WeightsError> {
        let raw: Self = serde_json::from_slice(bytes)?;
        let weights = Self {
            base: raw.base.into_iter().map(|(p, w)| (p.to_lowercase(), w)).collect(),
            fallback_base: raw.fallback_base,
            activity: raw.activity,
            rules: raw.rules.into_iter().map(|(p, k)| (p.to_lowercase(), k)).collect(),
        };
        weights.validate()?;
        Ok(weights)
    }

    fn validate(&self) -> Result<(), WeightsError> {
        let check = |table: &'static str, key: &str, value: f64| {
            if value.is_finite() && value >= 0.0 {
                Ok(())
            } else {
                Err(WeightsError::Invalid { table, key: key.to_string(), value })
            }
        };
        check("base", "<fallback>", self.fallback_base)?;
        for (k, v) in &self.base {
            check("base", k, *v)?;
        }
        for (k, v) in &self.activity {
            check("activity", k, *v)?;
        }
        Ok(())
    }

    /// `provider` must already be lowercased.
    pub fn base_weight(&self, provider: &str) -> f64 {
        self.base.get(provider).copied().unwrap_or(self.fallback_base)
    }

    pub fn activity_weight(&self, key: &str) -> f64 {
        self.activity.get(key).copied().unwrap_or(0.0)
    }

    /// `provider` must already be lowercased.
    pub fn activity_bonus(&self, provider: &str, activity: &ActivityCounters) -> f64 {
        match self.rules.get(provider) {
            Some(keys) => keys
                .iter()
                .map(|k| activity.get(k) * self.activity_weight(k))
                .sum(),
            None => 0.0,
        }
    }
}
