//! Alert record and its type/severity enums.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Alert severity ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Alert families the differ emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertType {
    NewRing,
    RiskSpike,
    VelocityAnomaly,
    CriticalNode,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NewRing => "NEW_RING",
            Self::RiskSpike => "RISK_SPIKE",
            Self::VelocityAnomaly => "VELOCITY_ANOMALY",
            Self::CriticalNode => "CRITICAL_NODE",
        }
    }
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One emitted alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Monotonic textual id: type, creation timestamp with sub-second
    /// resolution, and a sequence number.
    pub id: String,
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub message: String,
    pub account_id: Option<String>,
    pub ring_id: Option<String>,
    pub risk_score: Option<f64>,
    pub metadata: Value,
    /// ISO-8601 creation timestamp.
    pub timestamp: String,
    pub acknowledged: bool,
}

impl Alert {
    pub(crate) fn new(
        alert_type: AlertType,
        severity: AlertSeverity,
        message: String,
        created_at: NaiveDateTime,
        sequence: u64,
    ) -> Self {
        Self {
            id: format!(
                "{}_{}_{:06}",
                alert_type,
                created_at.format("%Y%m%d%H%M%S%6f"),
                sequence
            ),
            alert_type,
            severity,
            message,
            account_id: None,
            ring_id: None,
            risk_score: None,
            metadata: Value::Object(Default::default()),
            timestamp: created_at.format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
            acknowledged: false,
        }
    }

    pub(crate) fn with_account(mut self, account_id: &str) -> Self {
        self.account_id = Some(account_id.to_string());
        self
    }

    pub(crate) fn with_ring(mut self, ring_id: &str) -> Self {
        self.ring_id = Some(ring_id.to_string());
        self
    }

    pub(crate) fn with_risk_score(mut self, score: f64) -> Self {
        self.risk_score = Some(score);
        self
    }

    pub(crate) fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }
}
