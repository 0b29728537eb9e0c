//! Explicit configuration records for every detection stage.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

use crate::error::DetectError;

/// Bounds and budgets for cycle enumeration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleConfig {
    /// Minimum cycle length (number of accounts).
    pub min_len: usize,
    /// Maximum cycle length.
    pub max_len: usize,
    /// Wall-clock budget; enumeration stops and returns partial results
    /// once elapsed.
    #[serde(with = "duration_secs")]
    pub time_budget: Duration,
    /// Hard cap on collected cycles.
    pub max_cycles: usize,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            min_len: 3,
            max_len: 5,
            time_budget: Duration::from_secs(5),
            max_cycles: 500,
        }
    }
}

/// Serialize the time budget as whole seconds.
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Ok(Duration::from_secs_f64(secs))
    }
}

/// Sliding-window smurfing parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmurfingConfig {
    /// Minimum distinct counterparties inside the window. `None` selects an
    /// adaptive threshold from the account count: < 50 accounts -> 5,
    /// < 200 -> 7, otherwise 10.
    pub threshold: Option<usize>,
    /// Window width in hours.
    pub window_hours: i64,
}

impl SmurfingConfig {
    /// Resolve the effective threshold for a graph of `account_count` nodes.
    pub fn effective_threshold(&self, account_count: usize) -> usize {
        self.threshold.unwrap_or(match account_count {
            0..=49 => 5,
            50..=199 => 7,
            _ => 10,
        })
    }
}

impl Default for SmurfingConfig {
    fn default() -> Self {
        Self {
            threshold: None,
            window_hours: 72,
        }
    }
}

/// Shell-chain search parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Minimum chain length (number of accounts).
    pub min_len: usize,
    /// Maximum total degree of intermediate accounts.
    pub max_degree: usize,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            min_len: 3,
            max_degree: 3,
        }
    }
}

/// Weights of the five comprehensive risk factors. Must sum to 1.0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskWeights {
    pub centrality: f64,
    pub velocity: f64,
    pub cycle_involvement: f64,
    pub ring_density: f64,
    pub volume_anomaly: f64,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            centrality: 0.20,
            velocity: 0.20,
            cycle_involvement: 0.25,
            ring_density: 0.20,
            volume_anomaly: 0.15,
        }
    }
}

/// Trigger thresholds for the alert differ.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertThresholds {
    /// Minimum score increase that raises a RISK_SPIKE alert.
    pub risk_spike: f64,
    /// Velocity ratio (new / previous) that raises a VELOCITY_ANOMALY alert.
    pub velocity_ratio: f64,
    /// Absolute velocity (txn/hour) that raises a VELOCITY_ANOMALY alert.
    pub high_velocity: f64,
    /// Absolute velocity that escalates to CRITICAL severity.
    pub critical_velocity: f64,
    /// Score at which a previously unseen account raises CRITICAL_NODE.
    pub critical_node: f64,
    /// Bounded alert history size.
    pub max_alerts: usize,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            risk_spike: 20.0,
            velocity_ratio: 5.0,
            high_velocity: 10.0,
            critical_velocity: 15.0,
            critical_node: 85.0,
            max_alerts: 100,
        }
    }
}

/// Complete pipeline configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectionConfig {
    pub cycles: CycleConfig,
    pub smurfing: SmurfingConfig,
    pub chains: ChainConfig,
    pub weights: RiskWeights,
    pub alerts: AlertThresholds,
}

/// Which detector families run in a pipeline invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionStrategy {
    #[default]
    AllPatterns,
    CyclesOnly,
    FanPatterns,
    ShellsOnly,
}

impl DetectionStrategy {
    pub fn runs_cycles(&self) -> bool {
        matches!(self, Self::AllPatterns | Self::CyclesOnly)
    }

    pub fn runs_fan_patterns(&self) -> bool {
        matches!(self, Self::AllPatterns | Self::FanPatterns)
    }

    pub fn runs_chains(&self) -> bool {
        matches!(self, Self::AllPatterns | Self::ShellsOnly)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AllPatterns => "all_patterns",
            Self::CyclesOnly => "cycles_only",
            Self::FanPatterns => "fan_patterns",
            Self::ShellsOnly => "shells_only",
        }
    }
}

impl FromStr for DetectionStrategy {
    type Err = DetectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all_patterns" => Ok(Self::AllPatterns),
            "cycles_only" => Ok(Self::CyclesOnly),
            "fan_patterns" => Ok(Self::FanPatterns),
            "shells_only" => Ok(Self::ShellsOnly),
            other => Err(DetectError::UnknownStrategy(other.to_string())),
        }
    }
}
