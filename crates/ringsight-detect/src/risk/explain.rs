//! Natural-language risk explanations.
//!
//! Sentences are selected from banded, factor-specific templates in a fixed
//! factor order, then closed with an overall assessment carrying the
//! account's transaction count and total volume.

use std::collections::BTreeSet;

use ringsight_core::PatternKind;

use super::{RiskEngine, RiskFactors};

/// Compose the explanation for one non-whitelisted account.
pub(super) fn compose(
    engine: &RiskEngine<'_>,
    account: &str,
    factors: &RiskFactors,
    final_score: f64,
    patterns: &[PatternKind],
) -> String {
    let mut sentences: Vec<String> = Vec::new();

    let (txn_count, span_hours) = engine
        .activity(account)
        .map(|a| (a.timestamps.len(), a.span_hours()))
        .unwrap_or((0, 0.0));
    let total_volume: f64 = engine
        .activity(account)
        .map(|a| a.amounts.iter().sum())
        .unwrap_or(0.0);

    // Header.
    sentences.push(if final_score >= 85.0 {
        format!("CRITICAL RISK: {account} poses a severe money laundering threat.")
    } else if final_score >= 70.0 {
        format!("HIGH RISK: {account} exhibits strong indicators of fraud.")
    } else if final_score >= 50.0 {
        format!("ELEVATED RISK: {account} shows concerning patterns.")
    } else {
        format!("SUSPICIOUS: {account} requires investigation.")
    });

    // Centrality.
    if factors.centrality > 70.0 {
        let degree = engine.graph().total_degree(account);
        sentences.push(format!(
            "Network hub: highly connected with {degree} links. \
             Central position enables large-scale money movement coordination."
        ));
    } else if factors.centrality > 40.0 {
        sentences.push(
            "Connected account: moderate network centrality. \
             Acts as an intermediary in transaction chains."
                .to_string(),
        );
    }

    // Velocity.
    if factors.velocity > 70.0 {
        let rate = if span_hours > 0.0 {
            txn_count as f64 / span_hours.max(1.0)
        } else {
            0.0
        };
        sentences.push(format!(
            "High velocity: {txn_count} transactions in {span_hours:.1}h \
             ({rate:.2}/hour). Rapid movement typical of automated layering."
        ));
    } else if factors.velocity > 40.0 {
        sentences.push(format!(
            "Rapid activity: {txn_count} transactions in a short timeframe. \
             Accelerated pace suggests urgency to obscure funds."
        ));
    }

    // Cycle involvement.
    if factors.cycle_involvement > 70.0 {
        sentences.push(
            "Multiple cycles: participates in complex circular routing. \
             Funds return to their origin through layered intermediaries, a \
             classic laundering pattern."
                .to_string(),
        );
    } else if factors.cycle_involvement > 50.0 {
        sentences.push(
            "Cycle member: part of a circular money flow. \
             Indicates the integration phase of a laundering operation."
                .to_string(),
        );
    }

    // Ring density.
    if factors.ring_density > 70.0 {
        sentences.push(
            "Fraud ring core: deeply embedded in an organized fraud network. \
             Dense connections suggest a coordinated criminal operation."
                .to_string(),
        );
    } else if factors.ring_density > 40.0 {
        sentences.push(
            "Ring member: connected to a fraud ring. \
             Likely knows other members and the operation structure."
                .to_string(),
        );
    }

    // Volume anomalies.
    if factors.volume_anomaly > 70.0 {
        let avg = if txn_count > 0 {
            total_volume / engine.activity(account).map_or(1, |a| a.amounts.len()) as f64
        } else {
            0.0
        };
        sentences.push(format!(
            "Structuring pattern: transaction amounts highly anomalous \
             (avg ${avg:.2}). Consistent with deliberate avoidance of \
             reporting thresholds."
        ));
    } else if factors.volume_anomaly > 40.0 {
        sentences.push(
            "Unusual amounts: transaction values deviate from network norms. \
             May indicate smurfing or structuring activity."
                .to_string(),
        );
    }

    // Pattern-specific insights.
    let kinds: BTreeSet<PatternKind> = patterns.iter().copied().collect();
    if kinds.contains(&PatternKind::FanIn) {
        let sources = engine.graph().in_degree(account);
        sentences.push(format!(
            "Collection point: receives from {sources} different sources. \
             Consistent with smurfing collection or mule account aggregation."
        ));
    }
    if kinds.contains(&PatternKind::FanOut) {
        let destinations = engine.graph().out_degree(account);
        sentences.push(format!(
            "Distribution hub: sends to {destinations} different destinations. \
             Matches smurfing distribution or layering schemes."
        ));
    }
    if kinds.contains(&PatternKind::ShellChain) {
        sentences.push(
            "Shell network: acts as an intermediary in a multi-hop chain. \
             Typical of the layering phase using shell accounts."
                .to_string(),
        );
    }

    // Closing assessment.
    sentences.push(format!(
        "Overall assessment: risk score {final_score:.1}/100 across \
         {txn_count} transactions totaling ${total_volume:.2}. \
         Immediate investigation recommended."
    ));

    sentences.join(" ")
}
