//! Reputation Demo
//!
//! Walks through:
//! 1. Email login mints a meta account and saves the session
//! 2. Scoring a GitHub account with activity
//! 3. A Twitter account hitting the per-provider cap
//! 4. Two GitHub proofs: breakdown keeps the last, total adds both
//! 5. Logout clears the stored session

use identity::{create_meta_account, InMemoryStorage, LoginChallenges, SessionStore};
use reputation::{compute_reputation, ActivityCounters, ReputationMetrics, VerifiedAccountRecord};

fn record(provider: &str, activity: &[(&str, f64)]) -> VerifiedAccountRecord {
    let mut counters = ActivityCounters::new();
    for (k, v) in activity {
        if let Err(e) = counters.insert(*k, *v) {
            eprintln!("   skipping {k}: {e}");
        }
    }
    VerifiedAccountRecord::new(provider, counters)
}

fn show(m: &ReputationMetrics) {
    println!("   Total: {:.1} / 100 ({} verified accounts)", m.total(), m.verified_account_count());
    for (provider, score) in m.breakdown() {
        println!("     {provider:<10} {score:>6.1}");
    }
    println!();
}

fn main() {
    println!("=== ChainBridge ID: Reputation Demo ===\n");

    // 1. Login
    println!("--- Email login ---");
    let mut challenges = LoginChallenges::default();
    let mut session = match SessionStore::open(InMemoryStorage::new()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("session store unavailable: {e}");
            return;
        }
    };

    let email = "dev@chainbridge.example";
    let login = challenges
        .issue(email)
        .and_then(|code| challenges.verify(email, &code))
        .and_then(|_| create_meta_account(email))
        .and_then(|account| session.login(&account.address));
    match login {
        Ok(user) => println!("   Logged in as {} on {:?}\n", user.address, user.chain_ids),
        Err(e) => {
            eprintln!("   login failed: {e}");
            return;
        }
    }

    // 2. GitHub with activity
    println!("--- GitHub: 10 commits, 5 followers, 2 repositories ---");
    let github = record("github", &[("commits", 10.0), ("followers", 5.0), ("repositories", 2.0)]);
    show(&compute_reputation(&[github.clone()]));

    // 3. Twitter capped
    println!("--- Twitter: 100 tweets, 50 followers (capped) ---");
    let twitter = record("Twitter", &[("tweets", 100.0), ("followers", 50.0)]);
    show(&compute_reputation(&[twitter]));

    // 4. Duplicate provider
    println!("--- Two GitHub proofs ---");
    let second = record("github", &[("commits", 1.0)]);
    show(&compute_reputation(&[github, second]));

    // Metrics as clients receive them
    let m = compute_reputation(&[record("mastodon", &[])]);
    match serde_json::to_string_pretty(&m) {
        Ok(json) => println!("--- Unknown provider as JSON ---\n{json}\n"),
        Err(e) => eprintln!("   serialization failed: {e}"),
    }

    // 5. Logout
    println!("--- Logout ---");
    match session.logout() {
        Ok(()) => println!("   Authenticated: {}", session.is_authenticated()),
        Err(e) => eprintln!("   logout failed: {e}"),
    }
}
