//! Deterministic password sequencer

use num_bigint::BigUint;
use num_traits::ToPrimitive;
use tokio::sync::{mpsc, watch};

use crate::error::Result;
use crate::space::{Charset, Odometer};
use crate::types::SequencerConfig;

/// Outcome of [`PasswordSequencer::stream`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamSummary {
    /// Values delivered to the channel
    pub sent: u64,
    /// Stopped because the cancel flag was raised
    pub cancelled: bool,
    /// Stopped because the receiver was dropped
    pub receiver_closed: bool,
}

/// Walks every password of a charset and length in lexicographic order
///
/// Involves no randomness. Locations are 1-indexed.
#[derive(Debug)]
pub struct PasswordSequencer {
    config: SequencerConfig,
    odometer: Odometer,
}

impl PasswordSequencer {
    pub fn new(config: SequencerConfig) -> Result<Self> {
        let charset = Charset::new(&config.charset)?;
        let odometer = Odometer::new(charset, config.length, config.rollover)?;

        tracing::debug!(
            length = config.length,
            rollover = config.rollover,
            max_words = %odometer.max_location(),
            "Password sequencer created"
        );

        Ok(Self { config, odometer })
    }

    pub fn config(&self) -> &SequencerConfig {
        &self.config
    }

    pub fn odometer(&self) -> &Odometer {
        &self.odometer
    }

    /// Number of passwords in the sequence
    pub fn max_words(&self) -> &BigUint {
        self.odometer.max_location()
    }

    /// Move to the first password and return it
    pub fn first(&self) -> String {
        self.odometer.first();
        self.odometer.render()
    }

    /// Move to the last password and return it
    pub fn last(&self) -> String {
        self.odometer.last();
        self.odometer.render()
    }

    /// Current password
    pub fn get(&self) -> String {
        self.odometer.render()
    }

    /// Current 1-indexed location
    pub fn location(&self) -> BigUint {
        self.odometer.location()
    }

    /// Whether `next` would return a value
    pub fn has_next(&self) -> bool {
        self.config.rollover || !self.odometer.at_end()
    }

    /// Advance and return the new password, or `None` at the end
    pub fn next(&self) -> Option<String> {
        self.odometer.increment().then(|| self.odometer.render())
    }

    /// Step back and return the new password, or `None` at the start
    pub fn prev(&self) -> Option<String> {
        self.odometer.decrement().then(|| self.odometer.render())
    }

    /// Advance `n` passwords; without rollover, stops at the last one
    pub fn next_n(&self, n: &BigUint) -> String {
        self.odometer.increment_n(n);
        self.odometer.render()
    }

    /// Step back `n` passwords; without rollover, stops at the first one
    pub fn prev_n(&self, n: &BigUint) -> String {
        self.odometer.decrement_n(n);
        self.odometer.render()
    }

    /// Jump to a 1-indexed location
    pub fn goto(&self, n: &BigUint) -> Result<String> {
        self.odometer.goto_location(n)
    }

    /// Jump to a given password
    pub fn goto_value(&self, value: &str) -> Result<()> {
        self.odometer.seek(value)
    }

    /// Move back to the first password
    pub fn reset(&self) {
        self.odometer.first();
    }

    /// The current password followed by up to `count - 1` successors
    ///
    /// Leaves the sequencer on the last password returned.
    pub fn take(&self, count: usize) -> Vec<String> {
        let mut batch = Vec::with_capacity(count);
        if count == 0 {
            return batch;
        }
        batch.push(self.get());
        while batch.len() < count && self.odometer.increment() {
            batch.push(self.odometer.render());
        }
        batch
    }

    /// Send the current password and its successors to `tx`
    ///
    /// Sends at most `count` values (zero or `None` means the whole space)
    /// and never more than one full pass over the space. The cancel flag is
    /// checked before every value; a cancelled or closed stream leaves the
    /// sequencer wherever it stopped.
    pub async fn stream(
        &self,
        tx: mpsc::Sender<String>,
        count: Option<&BigUint>,
        cancel: &watch::Receiver<bool>,
    ) -> Result<StreamSummary> {
        let limit = count
            .filter(|c| !num_traits::Zero::is_zero(*c))
            .unwrap_or_else(|| self.max_words())
            .min(self.max_words())
            .to_u64();

        let mut summary = StreamSummary::default();
        let mut value = self.get();
        loop {
            if *cancel.borrow() {
                summary.cancelled = true;
                break;
            }
            if tx.send(value).await.is_err() {
                summary.receiver_closed = true;
                break;
            }
            summary.sent += 1;

            if limit.is_some_and(|limit| summary.sent >= limit) {
                break;
            }
            if !self.odometer.increment() {
                break;
            }
            value = self.odometer.render();
        }

        tracing::info!(
            sent = summary.sent,
            cancelled = summary.cancelled,
            receiver_closed = summary.receiver_closed,
            "Password stream finished"
        );
        Ok(summary)
    }
}
