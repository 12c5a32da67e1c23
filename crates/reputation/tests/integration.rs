use rand::Rng;
use reputation::{compute_reputation, ActivityCounters, ReputationCalculator, VerifiedAccountRecord};

const PROVIDERS: &[&str] = &["github", "GitHub", "twitter", "linkedin", "google", "facebook", "mastodon"];
const KEYS: &[&str] = &["commits", "followers", "repositories", "tweets", "connections", "stars"];

fn random_record(rng: &mut impl Rng) -> VerifiedAccountRecord {
    let provider = PROVIDERS[rng.gen_range(0..PROVIDERS.len())];
    let mut activity = ActivityCounters::new();
    for key in KEYS {
        if rng.gen_bool(0.5) {
            activity.insert(*key, rng.gen_range(0.0..200.0)).unwrap();
        }
    }
    VerifiedAccountRecord::new(provider, activity)
}

#[test]
fn test_scores_stay_in_bounds() {
    let mut rng = rand::thread_rng();

    for _ in 0..500 {
        let n = rng.gen_range(0..6);
        let records: Vec<_> = (0..n).map(|_| random_record(&mut rng)).collect();
        let m = compute_reputation(&records);

        assert!((0.0..=100.0).contains(&m.total()));
        for score in m.breakdown().values() {
            assert!((0.0..=100.0).contains(score));
        }
        assert_eq!(m.verified_account_count(), records.len());
    }
}

#[test]
fn test_total_is_clamped_sum_of_record_scores() {
    let mut rng = rand::thread_rng();
    let calc = ReputationCalculator::new();

    for _ in 0..200 {
        let records: Vec<_> = (0..rng.gen_range(1..5)).map(|_| random_record(&mut rng)).collect();
        let sum: f64 = records.iter().map(|r| calc.score_record(r)).sum();
        let m = calc.compute(&records);
        assert_eq!(m.total(), sum.min(100.0));
    }
}

#[test]
fn test_breakdown_keeps_last_record_per_provider() {
    let mut rng = rand::thread_rng();
    let calc = ReputationCalculator::new();

    let records: Vec<_> = (0..20).map(|_| random_record(&mut rng)).collect();
    let m = calc.compute(&records);

    for (provider, score) in m.breakdown() {
        let last = records
            .iter()
            .rev()
            .find(|r| &r.provider_id() == provider)
            .unwrap();
        assert_eq!(*score, calc.score_record(last));
    }
}

#[test]
fn test_recompute_is_stable() {
    let mut rng = rand::thread_rng();
    let records: Vec<_> = (0..8).map(|_| random_record(&mut rng)).collect();

    let a = compute_reputation(&records);
    let b = compute_reputation(&records);

    assert_eq!(a.total(), b.total());
    assert_eq!(a.breakdown(), b.breakdown());
}

#[test]
fn test_metrics_serialize_for_clients() {
    let activity = ActivityCounters::new().with("commits", 10.0).unwrap();
    let m = compute_reputation(&[VerifiedAccountRecord::new("github", activity)]);
    let json = serde_json::to_value(&m).unwrap();

    assert_eq!(json["total"], 50.0);
    assert_eq!(json["breakdown"]["github"], 50.0);
    assert_eq!(json["verified_account_count"], 1);
    assert!(json["computed_at"].is_string());
}
