use std::collections::BTreeMap;

use chrono::Utc;

use crate::{ActivityCounters, ReputationMetrics, ReputationWeights, VerifiedAccountRecord, MAX_SCORE};

/// Stateless scorer over a set of weight tables.
#[derive(Clone, Debug, Default)]
pub struct ReputationCalculator {
    weights: ReputationWeights,
}

impl ReputationCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weights(weights: ReputationWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ReputationWeights {
        &self.weights
    }

    /// Score of a single record: base weight plus activity bonus, capped at 100.
    pub fn score_record(&self, record: &VerifiedAccountRecord) -> f64 {
        self.score_provider(&record.provider_id(), &record.activity)
    }

    fn score_provider(&self, provider: &str, activity: &ActivityCounters) -> f64 {
        let raw = self.weights.base_weight(provider) + self.weights.activity_bonus(provider, activity);
        raw.min(MAX_SCORE)
    }

    /// Score every record and fold them into a fresh snapshot.
    ///
    /// Records sharing a provider are not merged: the breakdown keeps the
    /// last one's score while the total adds all of them.
    pub fn compute(&self, records: &[VerifiedAccountRecord]) -> ReputationMetrics {
        let mut breakdown = BTreeMap::new();
        let mut total = 0.0;

        for record in records {
            let provider = record.provider_id();
            let score = self.score_provider(&provider, &record.activity);
            breakdown.insert(provider, score);
            total += score;
        }

        ReputationMetrics::new(total.min(MAX_SCORE), breakdown, records.len(), Utc::now())
    }
}

/// Score `records` with the default weight tables.
pub fn compute_reputation(records: &[VerifiedAccountRecord]) -> ReputationMetrics {
    ReputationCalculator::default().compute(records)
}
