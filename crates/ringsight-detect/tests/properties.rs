//! Property tests: score bounds and determinism hold for arbitrary batches.

use chrono::Duration;
use proptest::prelude::*;
use rust_decimal::Decimal;

use ringsight_core::{DetectionConfig, DetectionStrategy, Transaction};
use ringsight_detect::run_detection;
use ringsight_test_utils::base_time;

fn arbitrary_batch() -> impl Strategy<Value = Vec<Transaction>> {
    prop::collection::vec(
        (0usize..10, 0usize..10, 0i64..20_000, 0i64..10_080),
        1..60,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (sender, receiver, amount, minute))| {
                Transaction::new(
                    format!("TXN_{i:04}"),
                    format!("P_{sender:02}"),
                    format!("P_{receiver:02}"),
                    Decimal::from(amount),
                    base_time() + Duration::minutes(minute),
                )
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn scores_always_within_bounds(transactions in arbitrary_batch()) {
        let run = run_detection(
            &transactions,
            &DetectionConfig::default(),
            DetectionStrategy::AllPatterns,
        )
        .expect("non-empty batches always run");

        for account in &run.response.suspicious_accounts {
            prop_assert!(account.suspicion_score > 0.0);
            prop_assert!(account.suspicion_score <= 100.0);
        }
        for score in run.scores.values() {
            prop_assert!(score.score >= 0.0 && score.score <= 100.0);
        }
        for assessment in run.risk.values() {
            prop_assert!(assessment.risk_score >= 0.0 && assessment.risk_score <= 100.0);
            let f = &assessment.risk_factors;
            for value in [f.centrality, f.velocity, f.cycle_involvement, f.ring_density, f.volume_anomaly] {
                prop_assert!((0.0..=100.0).contains(&value));
            }
        }
    }

    #[test]
    fn repeated_runs_are_identical(transactions in arbitrary_batch()) {
        let first = run_detection(
            &transactions,
            &DetectionConfig::default(),
            DetectionStrategy::AllPatterns,
        )
        .expect("run");
        let second = run_detection(
            &transactions,
            &DetectionConfig::default(),
            DetectionStrategy::AllPatterns,
        )
        .expect("run");

        prop_assert_eq!(&first.response.suspicious_accounts, &second.response.suspicious_accounts);
        prop_assert_eq!(&first.response.fraud_rings, &second.response.fraud_rings);
        prop_assert_eq!(&first.cycles, &second.cycles);
    }
}
