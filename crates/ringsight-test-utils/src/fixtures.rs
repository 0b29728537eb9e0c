//! Pre-built transaction scenarios.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rust_decimal::Decimal;

use ringsight_core::{RawBatch, Transaction, EXPECTED_COLUMNS, TIMESTAMP_FORMAT};

/// Common fixture start time: 2024-01-01 10:00:00.
pub fn base_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap()
}

/// Render transactions back into the raw wire shape.
pub fn raw_batch_from(transactions: &[Transaction]) -> RawBatch {
    RawBatch {
        columns: EXPECTED_COLUMNS.iter().map(|c| c.to_string()).collect(),
        rows: transactions
            .iter()
            .map(|t| {
                vec![
                    t.id.clone(),
                    t.sender.clone(),
                    t.receiver.clone(),
                    t.amount.to_string(),
                    t.timestamp.format(TIMESTAMP_FORMAT).to_string(),
                ]
            })
            .collect(),
    }
}

/// Builder for scenario batches with sequential transaction ids.
#[derive(Debug, Default)]
pub struct BatchBuilder {
    transactions: Vec<Transaction>,
    next_id: usize,
}

impl BatchBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, sender: &str, receiver: &str, amount: Decimal, ts: NaiveDateTime) {
        self.next_id += 1;
        self.transactions.push(Transaction::new(
            format!("TXN_{:05}", self.next_id),
            sender,
            receiver,
            amount,
            ts,
        ));
    }

    /// Directed cycle through `accounts`, one hop per hour starting at `at`.
    pub fn cycle(mut self, accounts: &[&str], at: NaiveDateTime, amount: Decimal) -> Self {
        for (i, pair) in accounts.windows(2).enumerate() {
            self.push(pair[0], pair[1], amount, at + Duration::hours(i as i64));
        }
        if accounts.len() >= 2 {
            self.push(
                accounts[accounts.len() - 1],
                accounts[0],
                amount,
                at + Duration::hours(accounts.len() as i64 - 1),
            );
        }
        self
    }

    /// `senders` distinct accounts each sending one transaction to `hub`,
    /// spread evenly across `within_hours`.
    pub fn fan_in(
        mut self,
        hub: &str,
        senders: &[&str],
        at: NaiveDateTime,
        within_hours: i64,
        amount: Decimal,
    ) -> Self {
        let step = (within_hours.max(1) * 60) / senders.len().max(1) as i64;
        for (i, sender) in senders.iter().enumerate() {
            self.push(sender, hub, amount, at + Duration::minutes(step * i as i64));
        }
        self
    }

    /// `hub` sending one transaction to each receiver across `within_hours`.
    pub fn fan_out(
        mut self,
        hub: &str,
        receivers: &[&str],
        at: NaiveDateTime,
        within_hours: i64,
        amount: Decimal,
    ) -> Self {
        let step = (within_hours.max(1) * 60) / receivers.len().max(1) as i64;
        for (i, receiver) in receivers.iter().enumerate() {
            self.push(hub, receiver, amount, at + Duration::minutes(step * i as i64));
        }
        self
    }

    /// Linear chain `accounts[0] -> ... -> accounts[k]`, one hop per
    /// `step_hours`, amounts shrinking slightly per hop.
    pub fn chain(mut self, accounts: &[&str], at: NaiveDateTime, amount: Decimal) -> Self {
        for (i, pair) in accounts.windows(2).enumerate() {
            let hop_amount = amount - Decimal::from(i as i64 * 100);
            self.push(pair[0], pair[1], hop_amount, at + Duration::hours(i as i64));
        }
        self
    }

    /// Seeded pseudo-random background traffic between `pairs` disjoint
    /// account pairs, spread over `days`. Deterministic for a fixed seed.
    pub fn noise(mut self, pairs: usize, days: i64, seed: u64, at: NaiveDateTime) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        for i in 0..pairs {
            let sender = format!("BG_SRC_{i:04}");
            let receiver = format!("BG_DST_{i:04}");
            let amount = Decimal::from(rng.gen_range(50..5000));
            let offset_minutes = rng.gen_range(0..days.max(1) * 24 * 60);
            self.push(
                &sender,
                &receiver,
                amount,
                at + Duration::minutes(offset_minutes),
            );
        }
        self
    }

    /// Seeded pseudo-random traffic among a shared pool of `accounts`
    /// accounts, spread over `days`. Deterministic for a fixed seed.
    pub fn traffic(
        mut self,
        accounts: usize,
        count: usize,
        days: i64,
        seed: u64,
        at: NaiveDateTime,
    ) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let pool = accounts.max(2);
        for _ in 0..count {
            let sender = rng.gen_range(0..pool);
            let mut receiver = rng.gen_range(0..pool);
            if receiver == sender {
                receiver = (receiver + 1) % pool;
            }
            let amount = Decimal::from(rng.gen_range(10..20_000));
            let offset_minutes = rng.gen_range(0..days.max(1) * 24 * 60);
            self.push(
                &format!("ACCT_{sender:04}"),
                &format!("ACCT_{receiver:04}"),
                amount,
                at + Duration::minutes(offset_minutes),
            );
        }
        self
    }

    pub fn build(self) -> Vec<Transaction> {
        self.transactions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_closes() {
        let batch = BatchBuilder::new()
            .cycle(&["A", "B", "C"], base_time(), Decimal::from(1000))
            .build();

        assert_eq!(batch.len(), 3);
        assert_eq!(batch[2].sender, "C");
        assert_eq!(batch[2].receiver, "A");
    }

    #[test]
    fn test_noise_is_deterministic() {
        let a = BatchBuilder::new().noise(20, 5, 42, base_time()).build();
        let b = BatchBuilder::new().noise(20, 5, 42, base_time()).build();
        assert_eq!(a, b);
    }

    #[test]
    fn test_raw_batch_round_trip() {
        let transactions = BatchBuilder::new()
            .cycle(&["A", "B", "C"], base_time(), Decimal::from(1000))
            .build();
        let raw = raw_batch_from(&transactions);

        assert_eq!(raw.columns.len(), EXPECTED_COLUMNS.len());
        assert_eq!(raw.columns[0], "transaction_id");
        assert_eq!(raw.rows.len(), 3);
        assert_eq!(raw.rows[0][4], "2024-01-01 10:00:00");
    }
}
