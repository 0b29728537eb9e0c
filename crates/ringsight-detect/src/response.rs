//! Canonical detection response: schema-locked, stable-sorted, rounded.
//!
//! Two identical inputs yield byte-identical JSON apart from the
//! processing-time field.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use ringsight_core::{AccountId, AccountScore, FraudRing, PatternKind};

/// One flagged account in the canonical response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseAccount {
    pub account_id: String,
    /// Rounded to one decimal.
    pub suspicion_score: f64,
    /// Standardized pattern tags, sorted and deduplicated.
    pub detected_patterns: Vec<String>,
    /// First ring (by input order) containing the account, if any.
    pub ring_id: Option<String>,
}

/// One fraud ring in the canonical response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRing {
    pub ring_id: String,
    /// Member ids sorted ascending.
    pub member_accounts: Vec<String>,
    pub pattern_type: PatternKind,
    /// Rounded to one decimal.
    pub risk_score: f64,
}

/// Run-level summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseSummary {
    pub total_accounts_analyzed: usize,
    pub suspicious_accounts_flagged: usize,
    pub fraud_rings_detected: usize,
    /// Rounded to two decimals.
    pub processing_time_seconds: f64,
}

/// Complete canonical response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalResponse {
    pub suspicious_accounts: Vec<ResponseAccount>,
    pub fraud_rings: Vec<ResponseRing>,
    pub summary: ResponseSummary,
}

impl CanonicalResponse {
    /// Assemble the canonical response from scored accounts and rings.
    pub fn build(
        scores: &BTreeMap<AccountId, AccountScore>,
        rings: &[FraudRing],
        total_accounts: usize,
        processing_seconds: f64,
    ) -> Self {
        let account_to_ring = first_ring_assignment(rings);

        let mut suspicious_accounts: Vec<ResponseAccount> = scores
            .iter()
            .filter(|(_, score)| score.score != 0.0)
            .map(|(account, score)| ResponseAccount {
                account_id: account.clone(),
                suspicion_score: round1(score.score),
                detected_patterns: pattern_tags(score),
                ring_id: account_to_ring.get(account).cloned(),
            })
            .collect();

        suspicious_accounts.sort_by(|a, b| {
            b.suspicion_score
                .partial_cmp(&a.suspicion_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.account_id.cmp(&b.account_id))
        });

        let fraud_rings: Vec<ResponseRing> = rings
            .iter()
            .map(|ring| {
                let mut members: Vec<String> = ring.member_accounts.clone();
                members.sort();
                ResponseRing {
                    ring_id: ring.ring_id.clone(),
                    member_accounts: members,
                    pattern_type: ring.pattern_type,
                    risk_score: round1(ring.risk_score),
                }
            })
            .collect();

        let summary = ResponseSummary {
            total_accounts_analyzed: total_accounts,
            suspicious_accounts_flagged: suspicious_accounts.len(),
            fraud_rings_detected: fraud_rings.len(),
            processing_time_seconds: round2(processing_seconds),
        };

        Self {
            suspicious_accounts,
            fraud_rings,
            summary,
        }
    }

    /// Serialize to the canonical JSON string.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Map each account to the id of the first ring containing it.
fn first_ring_assignment(rings: &[FraudRing]) -> BTreeMap<AccountId, String> {
    let mut assignment = BTreeMap::new();
    for ring in rings {
        for member in &ring.member_accounts {
            assignment
                .entry(member.clone())
                .or_insert_with(|| ring.ring_id.clone());
        }
    }
    assignment
}

/// Standardized tags: distinct pattern kinds plus `high_velocity` when a
/// velocity factor fired, sorted.
fn pattern_tags(score: &AccountScore) -> Vec<String> {
    let mut tags: Vec<String> = score
        .distinct_patterns()
        .into_iter()
        .map(|kind| kind.response_tag().to_string())
        .collect();

    if score.has_velocity_factor() {
        tags.push("high_velocity".to_string());
    }

    tags.sort();
    tags.dedup();
    tags
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
