//! Base suspicion scoring.
//!
//! Additive pattern contributions, then modifiers in fixed order: velocity
//! multiplier, whitelist override, spread-over-time penalty, cap and bucket.
//! Pure over its inputs; nothing here mutates detection state.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDateTime;
use tracing::{debug, info};

use ringsight_core::{
    AccountId, AccountScore, PatternDetection, PatternKind, RiskLevel, Transaction,
};
use ringsight_graph::TransactionGraph;

const CYCLE_POINTS: f64 = 40.0;
const FAN_HUB_POINTS: f64 = 30.0;
const SHELL_INTERMEDIATE_POINTS: f64 = 20.0;

/// Gap below which two consecutive transactions count as rapid.
const RAPID_GAP_SECS: i64 = 86_400;

/// Compute base suspicion scores for every account touched by a pattern or
/// modifier. Scores are in [0, 100] with factor strings explaining each
/// contribution.
pub fn score_accounts(
    patterns: &[PatternDetection],
    transactions: &[Transaction],
    graph: &TransactionGraph,
    whitelist: &BTreeSet<AccountId>,
) -> BTreeMap<AccountId, AccountScore> {
    let mut scores: BTreeMap<AccountId, AccountScore> = BTreeMap::new();

    // 1. Additive pattern contributions.
    for pattern in patterns {
        match pattern {
            PatternDetection::Cycle { path } => {
                for account in path {
                    let entry = scores.entry(account.clone()).or_default();
                    entry.score += CYCLE_POINTS;
                    entry.factors.push("cycle_member".to_string());
                    entry.patterns.push(PatternKind::Cycle);
                }
            }
            PatternDetection::FanIn { receiver, .. } => {
                let entry = scores.entry(receiver.clone()).or_default();
                entry.score += FAN_HUB_POINTS;
                entry.factors.push("fan_in_hub".to_string());
                entry.patterns.push(PatternKind::FanIn);
            }
            PatternDetection::FanOut { sender, .. } => {
                let entry = scores.entry(sender.clone()).or_default();
                entry.score += FAN_HUB_POINTS;
                entry.factors.push("fan_out_hub".to_string());
                entry.patterns.push(PatternKind::FanOut);
            }
            PatternDetection::Chain { path } if path.len() >= 3 => {
                for account in &path[1..path.len() - 1] {
                    let entry = scores.entry(account.clone()).or_default();
                    entry.score += SHELL_INTERMEDIATE_POINTS;
                    entry.factors.push("shell_intermediate".to_string());
                    entry.patterns.push(PatternKind::ShellChain);
                }
            }
            PatternDetection::Chain { .. } => {}
        }
    }

    let timelines = account_timelines(transactions);

    // 2. Velocity multiplier for rapid consecutive activity.
    for account in graph.node_ids() {
        let Some(timeline) = timelines.get(account) else {
            continue;
        };
        if timeline.timestamps.len() < 2 {
            continue;
        }

        let rapid_count = timeline
            .timestamps
            .windows(2)
            .filter(|pair| (pair[1] - pair[0]).num_seconds() < RAPID_GAP_SECS)
            .count();

        if rapid_count >= 2 {
            let multiplier = (1.0 + rapid_count as f64 * 0.1).min(2.0);
            let entry = scores.entry(account.clone()).or_default();
            entry.score *= multiplier;
            entry.factors.push(format!("velocity_x{multiplier:.1}"));
        }
    }

    // 3. Whitelist override. Smurfing membership keeps the account visible
    //    to ring construction at a reduced score.
    let smurfing_members = smurfing_member_set(patterns);
    for account in whitelist {
        let Some(entry) = scores.get_mut(account) else {
            continue;
        };
        if smurfing_members.contains(account) {
            entry.score = (entry.score * 0.5).max(30.0);
            entry
                .factors
                .push("whitelisted_but_smurfing_member".to_string());
            debug!(account = account.as_str(), "whitelisted smurfing member kept at reduced score");
        } else {
            entry.score = 0.0;
            entry.factors = vec!["whitelisted_legitimate_account".to_string()];
            entry.patterns.clear();
            entry.risk_level = RiskLevel::Low;
        }
    }

    // 4. Spread-over-time penalty for sparse, long-running activity.
    for account in graph.node_ids() {
        if whitelist.contains(account) {
            continue;
        }
        let Some(timeline) = timelines.get(account) else {
            continue;
        };
        let days_span = timeline.span_seconds() as f64 / 86_400.0;
        if days_span > 7.0 && timeline.timestamps.len() < 20 {
            let entry = scores.entry(account.clone()).or_default();
            entry.score *= 0.7;
            entry.factors.push("spread_over_time".to_string());
        }
    }

    // 5. Cap and bucket.
    for entry in scores.values_mut() {
        entry.score = entry.score.min(100.0);
        entry.risk_level = RiskLevel::from_suspicion(entry.score);
    }

    let high = scores
        .values()
        .filter(|s| s.risk_level == RiskLevel::High)
        .count();
    let medium = scores
        .values()
        .filter(|s| s.risk_level == RiskLevel::Medium)
        .count();
    info!(high, medium, "suspicion scoring complete");

    scores
}

/// Accounts appearing anywhere in a smurfing pattern (hub or counterparty).
pub fn smurfing_member_set(patterns: &[PatternDetection]) -> BTreeSet<AccountId> {
    let mut members = BTreeSet::new();
    for pattern in patterns {
        match pattern {
            PatternDetection::FanIn { receiver, senders, .. } => {
                members.insert(receiver.clone());
                members.extend(senders.iter().cloned());
            }
            PatternDetection::FanOut { sender, receivers, .. } => {
                members.insert(sender.clone());
                members.extend(receivers.iter().cloned());
            }
            _ => {}
        }
    }
    members
}

struct Timeline {
    timestamps: Vec<NaiveDateTime>,
}

impl Timeline {
    fn span_seconds(&self) -> i64 {
        match (self.timestamps.first(), self.timestamps.last()) {
            (Some(first), Some(last)) => (*last - *first).num_seconds(),
            _ => 0,
        }
    }
}

fn account_timelines(transactions: &[Transaction]) -> HashMap<AccountId, Timeline> {
    let mut map: HashMap<AccountId, Vec<NaiveDateTime>> = HashMap::new();
    for txn in transactions {
        map.entry(txn.sender.clone()).or_default().push(txn.timestamp);
        if txn.receiver != txn.sender {
            map.entry(txn.receiver.clone()).or_default().push(txn.timestamp);
        }
    }

    map.into_iter()
        .map(|(account, mut timestamps)| {
            timestamps.sort_unstable();
            (account, Timeline { timestamps })
        })
        .collect()
}
