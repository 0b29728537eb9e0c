//! Smurfing detection: fan-in (collection) and fan-out (distribution).
//!
//! For each endpoint with enough traffic, a window of `window_hours` slides
//! over its time-sorted transactions. The first window containing at least
//! `threshold` distinct counterparties yields one pattern for that endpoint;
//! later windows are not considered.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Duration, NaiveDateTime};
use rust_decimal::Decimal;
use tracing::{debug, info};

use ringsight_core::{AccountId, PatternDetection, SmurfingConfig, TimeWindow, Transaction};

/// Detect fan-in and fan-out patterns. `account_count` drives the adaptive
/// threshold when the config does not pin one.
pub fn detect_smurfing(
    transactions: &[Transaction],
    config: &SmurfingConfig,
    account_count: usize,
) -> (Vec<PatternDetection>, Vec<PatternDetection>) {
    let threshold = config.effective_threshold(account_count);
    let window = Duration::hours(config.window_hours);

    let mut sorted: Vec<&Transaction> = transactions.iter().collect();
    sorted.sort_by_key(|t| t.timestamp);

    // Group by endpoint, preserving time order inside each group. BTreeMap
    // keys give a stable endpoint visiting order.
    let mut by_receiver: BTreeMap<&AccountId, Vec<&Transaction>> = BTreeMap::new();
    let mut by_sender: BTreeMap<&AccountId, Vec<&Transaction>> = BTreeMap::new();
    for &txn in &sorted {
        by_receiver.entry(&txn.receiver).or_default().push(txn);
        by_sender.entry(&txn.sender).or_default().push(txn);
    }

    let fan_in: Vec<PatternDetection> = by_receiver
        .iter()
        .filter(|(_, group)| group.len() >= threshold)
        .filter_map(|(receiver, group)| {
            first_burst(group, threshold, window, |t| &t.sender).map(
                |(counterparties, time_window, total_amount)| {
                    debug!(
                        receiver = receiver.as_str(),
                        senders = counterparties.len(),
                        "fan-in detected"
                    );
                    PatternDetection::FanIn {
                        receiver: (*receiver).clone(),
                        senders: counterparties,
                        window: time_window,
                        total_amount,
                    }
                },
            )
        })
        .collect();

    let fan_out: Vec<PatternDetection> = by_sender
        .iter()
        .filter(|(_, group)| group.len() >= threshold)
        .filter_map(|(sender, group)| {
            first_burst(group, threshold, window, |t| &t.receiver).map(
                |(counterparties, time_window, total_amount)| {
                    debug!(
                        sender = sender.as_str(),
                        receivers = counterparties.len(),
                        "fan-out detected"
                    );
                    PatternDetection::FanOut {
                        sender: (*sender).clone(),
                        receivers: counterparties,
                        window: time_window,
                        total_amount,
                    }
                },
            )
        })
        .collect();

    info!(
        threshold,
        window_hours = config.window_hours,
        fan_in = fan_in.len(),
        fan_out = fan_out.len(),
        "smurfing detection complete"
    );
    (fan_in, fan_out)
}

/// Slide a window over one endpoint's time-sorted transactions; return the
/// earliest window holding at least `threshold` distinct counterparties,
/// with its counterparty set and summed amount.
fn first_burst<'a, F>(
    group: &[&'a Transaction],
    threshold: usize,
    window: Duration,
    counterparty: F,
) -> Option<(BTreeSet<AccountId>, TimeWindow, Decimal)>
where
    F: Fn(&'a Transaction) -> &'a AccountId,
{
    for (i, first) in group.iter().enumerate() {
        let window_start: NaiveDateTime = first.timestamp;
        let window_end = window_start + window;

        let mut counterparties: BTreeSet<AccountId> = BTreeSet::new();
        let mut total_amount = Decimal::ZERO;

        for &txn in &group[i..] {
            if txn.timestamp > window_end {
                break;
            }
            counterparties.insert(counterparty(txn).clone());
            total_amount += txn.amount;
        }

        if counterparties.len() >= threshold {
            return Some((
                counterparties,
                TimeWindow {
                    start: window_start,
                    end: window_end,
                },
                total_amount,
            ));
        }
    }
    None
}
