//! Fraud ring construction: one ring per detected pattern.

use std::collections::BTreeMap;

use tracing::info;

use ringsight_core::{AccountId, AccountScore, FraudRing, PatternDetection};

/// Build one ring per pattern, in detection input order (cycles, then
/// fan-in, then fan-out, then shell chains). Ids `RING_NNN` follow that
/// order; the risk-descending ranking is a separate view.
pub fn construct_rings(
    patterns: &[PatternDetection],
    scores: &BTreeMap<AccountId, AccountScore>,
) -> Vec<FraudRing> {
    let rings: Vec<FraudRing> = patterns
        .iter()
        .enumerate()
        .map(|(index, pattern)| {
            let members = pattern.members();
            let risk_score = mean_member_score(&members, scores);
            FraudRing {
                ring_id: format!("RING_{:03}", index + 1),
                pattern_type: pattern.kind(),
                member_count: members.len(),
                description: describe(pattern),
                member_accounts: members,
                risk_score,
            }
        })
        .collect();

    info!(rings = rings.len(), "fraud rings constructed");
    rings
}

/// Rings sorted by risk score descending, id ascending on ties.
pub fn rank_by_risk(rings: &[FraudRing]) -> Vec<FraudRing> {
    let mut ranked = rings.to_vec();
    ranked.sort_by(|a, b| {
        b.risk_score
            .partial_cmp(&a.risk_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.ring_id.cmp(&b.ring_id))
    });
    ranked
}

fn mean_member_score(members: &[AccountId], scores: &BTreeMap<AccountId, AccountScore>) -> f64 {
    if members.is_empty() {
        return 0.0;
    }
    let total: f64 = members
        .iter()
        .map(|m| scores.get(m).map_or(0.0, |s| s.score))
        .sum();
    total / members.len() as f64
}

fn describe(pattern: &PatternDetection) -> String {
    match pattern {
        PatternDetection::Cycle { path } => {
            format!("Circular fund routing through {} accounts", path.len())
        }
        PatternDetection::FanIn { senders, .. } => {
            format!("Smurfing collection: {} senders -> 1 receiver", senders.len())
        }
        PatternDetection::FanOut { receivers, .. } => {
            format!("Smurfing distribution: 1 sender -> {} receivers", receivers.len())
        }
        PatternDetection::Chain { path } => {
            format!("Layered shell network: {}-hop chain", path.len())
        }
    }
}
