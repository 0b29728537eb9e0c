//! The alert engine: diffing, history, acknowledgement, statistics.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use ringsight_core::{AlertThresholds, FraudRing};

use crate::alert::{Alert, AlertSeverity, AlertType};

/// Previous-run state the differ compares against.
#[derive(Debug, Default)]
struct PreviousState {
    ring_ids: BTreeSet<String>,
    risk_scores: BTreeMap<String, f64>,
    velocities: BTreeMap<String, f64>,
}

/// Aggregate alert counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertStatistics {
    pub total_alerts: usize,
    pub by_severity: BTreeMap<String, usize>,
    pub by_type: BTreeMap<String, usize>,
    pub acknowledged: usize,
    pub unacknowledged: usize,
}

/// Stateful alert differ with a bounded, most-recent-first history.
#[derive(Debug)]
pub struct AlertEngine {
    thresholds: AlertThresholds,
    history: VecDeque<Alert>,
    previous: PreviousState,
    sequence: u64,
}

impl AlertEngine {
    pub fn new(thresholds: AlertThresholds) -> Self {
        Self {
            thresholds,
            history: VecDeque::new(),
            previous: PreviousState::default(),
            sequence: 0,
        }
    }

    /// Diff the current run against the stored previous state, record and
    /// return the emitted alerts, then replace the stored state.
    pub fn analyze(
        &mut self,
        current_rings: &[FraudRing],
        risk_scores: &BTreeMap<String, f64>,
        velocities: &BTreeMap<String, f64>,
    ) -> Vec<Alert> {
        let mut alerts = Vec::new();

        self.detect_new_rings(current_rings, &mut alerts);
        self.detect_risk_spikes(risk_scores, &mut alerts);
        self.detect_velocity_anomalies(velocities, &mut alerts);
        self.detect_critical_nodes(risk_scores, &mut alerts);

        for alert in &alerts {
            self.push(alert.clone());
        }

        self.previous.ring_ids = current_rings.iter().map(|r| r.ring_id.clone()).collect();
        self.previous.risk_scores = risk_scores.clone();
        self.previous.velocities = velocities.clone();

        info!(count = alerts.len(), "alert analysis complete");
        alerts
    }

    fn detect_new_rings(&mut self, rings: &[FraudRing], out: &mut Vec<Alert>) {
        for ring in rings {
            if self.previous.ring_ids.contains(&ring.ring_id) {
                continue;
            }

            let severity = if ring.risk_score >= 80.0 || ring.member_count >= 10 {
                AlertSeverity::Critical
            } else if ring.risk_score >= 60.0 || ring.member_count >= 7 {
                AlertSeverity::High
            } else {
                AlertSeverity::Medium
            };

            let alert = self
                .make(
                    AlertType::NewRing,
                    severity,
                    format!(
                        "New fraud ring detected with {} members (Risk: {:.1})",
                        ring.member_count, ring.risk_score
                    ),
                )
                .with_ring(&ring.ring_id)
                .with_risk_score(ring.risk_score)
                .with_metadata(json!({
                    "member_count": ring.member_count,
                    "pattern": ring.pattern_type.as_str(),
                    "description": ring.description,
                }));
            warn!(ring_id = ring.ring_id.as_str(), "new ring alert");
            out.push(alert);
        }
    }

    fn detect_risk_spikes(&mut self, scores: &BTreeMap<String, f64>, out: &mut Vec<Alert>) {
        for (account, current) in scores {
            let previous = self.previous.risk_scores.get(account).copied().unwrap_or(0.0);
            let spike = current - previous;
            if spike < self.thresholds.risk_spike {
                continue;
            }

            let severity = if spike >= 40.0 || *current >= 80.0 {
                AlertSeverity::Critical
            } else if spike >= 30.0 || *current >= 60.0 {
                AlertSeverity::High
            } else {
                AlertSeverity::Medium
            };

            let alert = self
                .make(
                    AlertType::RiskSpike,
                    severity,
                    format!(
                        "Risk spike detected for {account}: {previous:.1} -> {current:.1} (+{spike:.1})"
                    ),
                )
                .with_account(account)
                .with_risk_score(*current)
                .with_metadata(json!({
                    "previous_score": previous,
                    "spike_amount": spike,
                }));
            out.push(alert);
        }
    }

    fn detect_velocity_anomalies(
        &mut self,
        velocities: &BTreeMap<String, f64>,
        out: &mut Vec<Alert>,
    ) {
        for (account, current) in velocities {
            let previous = self.previous.velocities.get(account).copied().unwrap_or(0.0);

            let triggered = if previous > 0.0 {
                let ratio = current / previous;
                ratio >= self.thresholds.velocity_ratio || *current >= self.thresholds.high_velocity
            } else {
                *current >= self.thresholds.high_velocity
            };
            if !triggered {
                continue;
            }

            let severity = if *current >= self.thresholds.critical_velocity {
                AlertSeverity::Critical
            } else if *current >= self.thresholds.high_velocity {
                AlertSeverity::High
            } else {
                AlertSeverity::Medium
            };

            let (message, metadata) = if previous > 0.0 {
                let ratio = current / previous;
                (
                    format!(
                        "Velocity anomaly for {account}: {current:.1} txn/hour ({ratio:.1}x increase)"
                    ),
                    json!({
                        "previous_velocity": previous,
                        "current_velocity": current,
                        "ratio": ratio,
                    }),
                )
            } else {
                (
                    format!(
                        "High velocity detected for new account {account}: {current:.1} txn/hour"
                    ),
                    json!({ "current_velocity": current }),
                )
            };

            let alert = self
                .make(AlertType::VelocityAnomaly, severity, message)
                .with_account(account)
                .with_metadata(metadata);
            out.push(alert);
        }
    }

    fn detect_critical_nodes(&mut self, scores: &BTreeMap<String, f64>, out: &mut Vec<Alert>) {
        for (account, score) in scores {
            if *score < self.thresholds.critical_node
                || self.previous.risk_scores.contains_key(account)
            {
                continue;
            }

            let alert = self
                .make(
                    AlertType::CriticalNode,
                    AlertSeverity::Critical,
                    format!("Critical risk node detected: {account} (Score: {score:.1})"),
                )
                .with_account(account)
                .with_risk_score(*score);
            warn!(account = account.as_str(), score, "critical node alert");
            out.push(alert);
        }
    }

    fn make(&mut self, alert_type: AlertType, severity: AlertSeverity, message: String) -> Alert {
        self.sequence += 1;
        Alert::new(
            alert_type,
            severity,
            message,
            Utc::now().naive_utc(),
            self.sequence,
        )
    }

    /// Insert at the front; evict the oldest from the tail past the cap.
    fn push(&mut self, alert: Alert) {
        self.history.push_front(alert);
        while self.history.len() > self.thresholds.max_alerts {
            self.history.pop_back();
        }
    }

    /// Snapshot of the history, most recent first, optionally filtered.
    pub fn alerts(&self, limit: Option<usize>, severity: Option<AlertSeverity>) -> Vec<Alert> {
        let filtered = self
            .history
            .iter()
            .filter(|a| severity.map_or(true, |s| a.severity == s));
        match limit {
            Some(n) => filtered.take(n).cloned().collect(),
            None => filtered.cloned().collect(),
        }
    }

    /// Mark an alert acknowledged. Unknown ids are reported, not fatal.
    pub fn acknowledge(&mut self, alert_id: &str) -> bool {
        for alert in self.history.iter_mut() {
            if alert.id == alert_id {
                alert.acknowledged = true;
                info!(alert_id, "alert acknowledged");
                return true;
            }
        }
        warn!(alert_id, "acknowledge requested for unknown alert id");
        false
    }

    /// Drop the whole history. Previous-run state is untouched.
    pub fn clear(&mut self) {
        let count = self.history.len();
        self.history.clear();
        info!(count, "alerts cleared");
    }

    pub fn statistics(&self) -> AlertStatistics {
        let mut by_severity: BTreeMap<String, usize> = [
            ("CRITICAL", 0usize),
            ("HIGH", 0),
            ("MEDIUM", 0),
            ("LOW", 0),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        let mut by_type: BTreeMap<String, usize> = BTreeMap::new();
        let mut acknowledged = 0usize;

        for alert in &self.history {
            *by_severity.entry(alert.severity.to_string()).or_insert(0) += 1;
            *by_type.entry(alert.alert_type.to_string()).or_insert(0) += 1;
            if alert.acknowledged {
                acknowledged += 1;
            }
        }

        AlertStatistics {
            total_alerts: self.history.len(),
            by_severity,
            by_type,
            acknowledged,
            unacknowledged: self.history.len() - acknowledged,
        }
    }
}

impl Default for AlertEngine {
    fn default() -> Self {
        Self::new(AlertThresholds::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringsight_core::PatternKind;

    fn ring(id: &str, members: usize, risk: f64) -> FraudRing {
        FraudRing {
            ring_id: id.to_string(),
            pattern_type: PatternKind::Cycle,
            member_accounts: (0..members).map(|i| format!("ACC_{i:03}")).collect(),
            member_count: members,
            risk_score: risk,
            description: "test ring".to_string(),
        }
    }

    fn scores(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_new_ring_alert_critical() {
        let mut engine = AlertEngine::default();
        let alerts = engine.analyze(&[ring("RING_001", 12, 85.0)], &scores(&[]), &scores(&[]));

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type, AlertType::NewRing);
        assert_eq!(alerts[0].severity, AlertSeverity::Critical);
        assert_eq!(alerts[0].ring_id.as_deref(), Some("RING_001"));
    }

    #[test]
    fn test_known_ring_not_realerted() {
        let mut engine = AlertEngine::default();
        let rings = [ring("RING_001", 4, 40.0)];
        let first = engine.analyze(&rings, &scores(&[]), &scores(&[]));
        assert_eq!(first.len(), 1);

        let second = engine.analyze(&rings, &scores(&[]), &scores(&[]));
        assert!(second.is_empty());
    }

    #[test]
    fn test_risk_spike_severity_high() {
        let mut engine = AlertEngine::default();
        engine.analyze(&[], &scores(&[("A", 30.0)]), &scores(&[]));
        let alerts = engine.analyze(&[], &scores(&[("A", 65.0)]), &scores(&[]));

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type, AlertType::RiskSpike);
        assert_eq!(alerts[0].severity, AlertSeverity::High);
        assert_eq!(alerts[0].metadata["previous_score"], 30.0);
        assert_eq!(alerts[0].metadata["spike_amount"], 35.0);
    }

    #[test]
    fn test_velocity_ratio_alert() {
        let mut engine = AlertEngine::default();
        engine.analyze(&[], &scores(&[]), &scores(&[("A", 1.0)]));
        let alerts = engine.analyze(&[], &scores(&[]), &scores(&[("A", 6.0)]));

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type, AlertType::VelocityAnomaly);
        assert_eq!(alerts[0].severity, AlertSeverity::Medium);
        assert_eq!(alerts[0].metadata["ratio"], 6.0);
    }

    #[test]
    fn test_new_account_high_velocity() {
        let mut engine = AlertEngine::default();
        let alerts = engine.analyze(&[], &scores(&[]), &scores(&[("FAST", 12.0)]));

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, AlertSeverity::High);
        assert!(alerts[0].message.contains("new account"));
    }

    #[test]
    fn test_critical_node_only_when_previously_unseen() {
        let mut engine = AlertEngine::default();
        let alerts = engine.analyze(&[], &scores(&[("A", 90.0)]), &scores(&[]));
        assert!(alerts
            .iter()
            .any(|a| a.alert_type == AlertType::CriticalNode
                && a.severity == AlertSeverity::Critical));

        // Second run: A is now in the previous score map.
        let alerts = engine.analyze(&[], &scores(&[("A", 92.0)]), &scores(&[]));
        assert!(alerts.iter().all(|a| a.alert_type != AlertType::CriticalNode));
    }

    #[test]
    fn test_identical_states_produce_no_alerts() {
        let mut engine = AlertEngine::default();
        let rings = [ring("RING_001", 5, 45.0)];
        let risk = scores(&[("A", 50.0), ("B", 20.0)]);
        let velocity = scores(&[("A", 2.0)]);

        engine.analyze(&rings, &risk, &velocity);
        let repeat = engine.analyze(&rings, &risk, &velocity);
        assert!(repeat.is_empty());
    }

    #[test]
    fn test_history_bounded_and_most_recent_first() {
        let thresholds = AlertThresholds {
            max_alerts: 3,
            ..Default::default()
        };
        let mut engine = AlertEngine::new(thresholds);

        for i in 0..5 {
            engine.analyze(
                &[ring(&format!("RING_{i:03}"), 12, 85.0)],
                &scores(&[]),
                &scores(&[]),
            );
        }

        let alerts = engine.alerts(None, None);
        assert_eq!(alerts.len(), 3);
        assert!(alerts[0].ring_id.as_deref() == Some("RING_004"));
        // Ids are strictly increasing with recency reversed in the buffer.
        assert!(alerts[0].id > alerts[1].id);
    }

    #[test]
    fn test_acknowledge_unknown_is_nonfatal() {
        let mut engine = AlertEngine::default();
        assert!(!engine.acknowledge("NOPE_123"));

        let alerts = engine.analyze(&[ring("RING_001", 12, 85.0)], &scores(&[]), &scores(&[]));
        assert!(engine.acknowledge(&alerts[0].id));
        assert_eq!(engine.statistics().acknowledged, 1);
    }

    #[test]
    fn test_statistics_counts() {
        let mut engine = AlertEngine::default();
        engine.analyze(&[ring("RING_001", 12, 85.0)], &scores(&[("A", 90.0)]), &scores(&[]));

        // A jumps from nothing to 90: new ring, risk spike, critical node.
        let stats = engine.statistics();
        assert_eq!(stats.total_alerts, 3);
        assert_eq!(stats.by_severity["CRITICAL"], 3);
        assert_eq!(stats.by_type["NEW_RING"], 1);
        assert_eq!(stats.by_type["RISK_SPIKE"], 1);
        assert_eq!(stats.by_type["CRITICAL_NODE"], 1);
        assert_eq!(stats.unacknowledged, 3);
    }
}
