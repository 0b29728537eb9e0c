//! Detected pattern variants, fraud rings, and per-account scores.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::risk::RiskLevel;
use super::transaction::AccountId;

/// The four pattern families the detector emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    Cycle,
    FanIn,
    FanOut,
    ShellChain,
}

impl PatternKind {
    /// Internal name used for ring `pattern_type` fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cycle => "cycle",
            Self::FanIn => "fan_in",
            Self::FanOut => "fan_out",
            Self::ShellChain => "shell_chain",
        }
    }

    /// Standardized tag used in the canonical response. The cycle tag keeps
    /// its `_length_3` suffix regardless of actual cycle length for schema
    /// compatibility.
    pub fn response_tag(&self) -> &'static str {
        match self {
            Self::Cycle => "cycle_length_3",
            Self::FanIn => "fan_in_smurfing",
            Self::FanOut => "fan_out_smurfing",
            Self::ShellChain => "shell_chain",
        }
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed time window `[start, end]` covering a smurfing burst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// One detected pattern instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PatternDetection {
    /// Circular fund routing. The path holds distinct accounts; the last
    /// account transfers back to the first.
    Cycle { path: Vec<AccountId> },
    /// Smurfing collection: many senders converge on one receiver inside
    /// the window.
    FanIn {
        receiver: AccountId,
        senders: BTreeSet<AccountId>,
        window: TimeWindow,
        total_amount: Decimal,
    },
    /// Smurfing distribution: one sender disperses to many receivers inside
    /// the window.
    FanOut {
        sender: AccountId,
        receivers: BTreeSet<AccountId>,
        window: TimeWindow,
        total_amount: Decimal,
    },
    /// Layered shell chain through low-degree intermediaries.
    Chain { path: Vec<AccountId> },
}

impl PatternDetection {
    /// Which pattern family this instance belongs to.
    pub fn kind(&self) -> PatternKind {
        match self {
            Self::Cycle { .. } => PatternKind::Cycle,
            Self::FanIn { .. } => PatternKind::FanIn,
            Self::FanOut { .. } => PatternKind::FanOut,
            Self::Chain { .. } => PatternKind::ShellChain,
        }
    }

    /// All participating accounts, hub first for fan patterns.
    pub fn members(&self) -> Vec<AccountId> {
        match self {
            Self::Cycle { path } | Self::Chain { path } => path.clone(),
            Self::FanIn { receiver, senders, .. } => {
                let mut members = vec![receiver.clone()];
                members.extend(senders.iter().cloned());
                members
            }
            Self::FanOut { sender, receivers, .. } => {
                let mut members = vec![sender.clone()];
                members.extend(receivers.iter().cloned());
                members
            }
        }
    }
}

/// A group of accounts jointly participating in one detected pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FraudRing {
    /// Deterministic id `RING_NNN`, assigned in detection order.
    pub ring_id: String,
    /// Pattern family this ring was constructed from.
    pub pattern_type: PatternKind,
    /// Participating accounts.
    pub member_accounts: Vec<AccountId>,
    pub member_count: usize,
    /// Mean of the members' base suspicion scores.
    pub risk_score: f64,
    pub description: String,
}

/// Base suspicion score with supporting evidence for one account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountScore {
    /// Suspicion score in [0, 100].
    pub score: f64,
    /// Human-readable contributing factors, in application order.
    pub factors: Vec<String>,
    /// Pattern families the account participates in, one entry per
    /// detection occurrence.
    pub patterns: Vec<PatternKind>,
    pub risk_level: RiskLevel,
}

impl AccountScore {
    /// Distinct pattern kinds, sorted.
    pub fn distinct_patterns(&self) -> BTreeSet<PatternKind> {
        self.patterns.iter().copied().collect()
    }

    /// Whether any factor string marks velocity inflation.
    pub fn has_velocity_factor(&self) -> bool {
        self.factors.iter().any(|f| f.starts_with("velocity_x"))
    }
}

impl Default for AccountScore {
    fn default() -> Self {
        Self {
            score: 0.0,
            factors: Vec::new(),
            patterns: Vec::new(),
            risk_level: RiskLevel::Low,
        }
    }
}
