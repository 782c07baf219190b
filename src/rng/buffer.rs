//! Fixed-size buffer of secure random bytes

use std::sync::Arc;

use super::EntropySource;
use crate::error::Result;
use crate::types::SamplerStats;

/// Capacity of the random byte buffer
pub const BUFFER_SIZE: usize = 1024;

/// Requests above this size skip the buffer and read the source directly
const BYPASS_THRESHOLD: usize = BUFFER_SIZE / 2;

/// Random bytes drawn ahead of time from an entropy source
///
/// Bytes at `cursor..` have never been handed out. A refill overwrites the
/// whole buffer and resets the cursor.
pub(crate) struct SecureBuffer {
    source: Box<dyn EntropySource>,
    bytes: Box<[u8; BUFFER_SIZE]>,
    cursor: usize,
    stats: Arc<SamplerStats>,
}

impl SecureBuffer {
    pub(crate) fn new(source: Box<dyn EntropySource>, stats: Arc<SamplerStats>) -> Self {
        Self {
            source,
            bytes: Box::new([0u8; BUFFER_SIZE]),
            // start exhausted so the first read fills from the source
            cursor: BUFFER_SIZE,
            stats,
        }
    }

    /// Copy `dest.len()` unused random bytes into `dest`
    pub(crate) fn read(&mut self, dest: &mut [u8]) -> Result<()> {
        let needed = dest.len();
        if needed == 0 {
            return Ok(());
        }

        if needed > BYPASS_THRESHOLD {
            tracing::debug!(source = self.source.name(), bytes = needed, "Direct entropy read");
            self.source.fill(dest)?;
            self.stats.increment_bypass_reads();
            self.stats.add_bytes_served(needed as u64);
            return Ok(());
        }

        if BUFFER_SIZE - self.cursor < needed {
            self.refill()?;
        }

        dest.copy_from_slice(&self.bytes[self.cursor..self.cursor + needed]);
        self.cursor += needed;
        self.stats.add_bytes_served(needed as u64);
        Ok(())
    }

    fn refill(&mut self) -> Result<()> {
        if let Err(e) = self.source.fill(&mut self.bytes[..]) {
            // a failed fill may have written part of the buffer
            self.cursor = BUFFER_SIZE;
            return Err(e);
        }
        self.cursor = 0;
        self.stats.increment_refills();
        tracing::debug!(source = self.source.name(), bytes = BUFFER_SIZE, "Random buffer refilled");
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn remaining(&self) -> usize {
        BUFFER_SIZE - self.cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KeyspaceError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Writes 0, 1, 2, ... and counts fills
    struct Counter {
        next: u8,
        fills: Arc<AtomicUsize>,
    }

    impl EntropySource for Counter {
        fn fill(&mut self, dest: &mut [u8]) -> Result<()> {
            self.fills.fetch_add(1, Ordering::SeqCst);
            for b in dest.iter_mut() {
                *b = self.next;
                self.next = self.next.wrapping_add(1);
            }
            Ok(())
        }
    }

    struct Broken;

    impl EntropySource for Broken {
        fn fill(&mut self, _dest: &mut [u8]) -> Result<()> {
            Err(KeyspaceError::entropy("device unavailable"))
        }
    }

    fn counter_buffer() -> (SecureBuffer, Arc<AtomicUsize>, Arc<SamplerStats>) {
        let fills = Arc::new(AtomicUsize::new(0));
        let stats = Arc::new(SamplerStats::new());
        let source = Counter {
            next: 0,
            fills: Arc::clone(&fills),
        };
        (SecureBuffer::new(Box::new(source), Arc::clone(&stats)), fills, stats)
    }

    #[test]
    fn test_sequential_reads_share_one_refill() {
        let (mut buffer, fills, stats) = counter_buffer();
        let mut out = [0u8; 4];
        buffer.read(&mut out).unwrap();
        assert_eq!(out, [0, 1, 2, 3]);
        buffer.read(&mut out).unwrap();
        assert_eq!(out, [4, 5, 6, 7]);
        assert_eq!(fills.load(Ordering::SeqCst), 1);
        assert_eq!(buffer.remaining(), BUFFER_SIZE - 8);
        assert_eq!(stats.snapshot().bytes_served, 8);
    }

    #[test]
    fn test_refill_when_exhausted() {
        let (mut buffer, fills, stats) = counter_buffer();
        let mut out = [0u8; 256];
        for _ in 0..4 {
            buffer.read(&mut out).unwrap();
        }
        assert_eq!(fills.load(Ordering::SeqCst), 1);
        assert_eq!(buffer.remaining(), 0);

        let mut one = [0u8; 1];
        buffer.read(&mut one).unwrap();
        assert_eq!(fills.load(Ordering::SeqCst), 2);
        // the second fill continues the counter: 1024 % 256 == 0
        assert_eq!(one, [0]);
        assert_eq!(stats.snapshot().refills, 2);
    }

    #[test]
    fn test_large_reads_bypass_buffer() {
        let (mut buffer, fills, stats) = counter_buffer();
        let mut big = vec![0u8; BYPASS_THRESHOLD + 1];
        buffer.read(&mut big).unwrap();
        assert_eq!(fills.load(Ordering::SeqCst), 1);
        assert_eq!(buffer.remaining(), 0);
        assert_eq!(stats.snapshot().bypass_reads, 1);
        assert_eq!(stats.snapshot().refills, 0);
    }

    #[test]
    fn test_failure_is_reported_and_buffer_stays_exhausted() {
        let stats = Arc::new(SamplerStats::new());
        let mut buffer = SecureBuffer::new(Box::new(Broken), stats);
        let mut out = [0u8; 8];
        let err = buffer.read(&mut out).unwrap_err();
        assert!(matches!(err, KeyspaceError::EntropySourceFailure { .. }));
        assert_eq!(buffer.remaining(), 0);
    }
}
