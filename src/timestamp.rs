//! Arrival-time correlation for the receive stream.
//!
//! Every byte accepted into a channel's RX ring extends the current run.
//! The first byte of a run samples the clock; the marker byte closes the run
//! and yields a [`TimestampRecord`] whose `length` counts every byte of the
//! run, marker included. A consumer pops the record and then exactly
//! `length` bytes from the RX ring to recover one timed frame.
//!
//! A record that finds the timestamp ring full is lost, but its bytes are
//! still buffered. The correlator remembers how many such bytes precede the
//! next stored record so the reader can skip them and stay paired.

use core::cell::UnsafeCell;

use crate::clock::Clock;

/// One closed run of the receive stream.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimestampRecord {
    /// RX ring write index right after the marker was stored. Diagnostic only.
    pub position: usize,
    /// Clock reading taken on the first byte of the run.
    pub timestamp: u64,
    /// Bytes in the run, including the marker.
    pub length: u32,
}

/// A timed frame copied out of the RX ring.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimestampedFrame<const M: usize> {
    pub timestamp: u64,
    pub data: heapless::Vec<u8, M>,
}

impl<const M: usize> TimestampedFrame<M> {
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Timestamp ring entry: a record plus the orphaned bytes queued ahead of it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Stamp {
    pub(crate) record: TimestampRecord,
    pub(crate) skip: u32,
}

#[derive(Copy, Clone, Default)]
struct Run {
    start: u64,
    length: u32,
    orphaned: u32,
}

/// Run accumulator owned by the interrupt handler of one channel.
pub(crate) struct Correlator {
    run: UnsafeCell<Run>,
}

// SAFETY: `run` is only touched from the channel's interrupt handler, whose
// single-context contract is documented on `Channel::on_interrupt`, or from
// `reset` while that handler cannot fire (inside `init`).
unsafe impl Sync for Correlator {}

impl Correlator {
    pub(crate) const fn new() -> Self {
        Self {
            run: UnsafeCell::new(Run {
                start: 0,
                length: 0,
                orphaned: 0,
            }),
        }
    }

    pub(crate) fn reset(&self) {
        unsafe { *self.run.get() = Run::default() };
    }

    /// Account for one buffered byte. Returns the closed run when `byte` is the marker.
    #[inline]
    pub(crate) fn observe<C: Clock>(
        &self,
        byte: u8,
        marker: u8,
        position: usize,
        clock: &C,
    ) -> Option<TimestampRecord> {
        let run = unsafe { &mut *self.run.get() };
        if run.length == 0 {
            run.start = clock.now_ms();
        }
        run.length = run.length.saturating_add(1);

        if byte != marker {
            return None;
        }

        let record = TimestampRecord {
            position,
            timestamp: run.start,
            length: run.length,
        };
        run.length = 0;
        Some(record)
    }

    /// Wrap a closed run for the timestamp ring, claiming the orphaned bytes.
    #[inline]
    pub(crate) fn stamp(&self, record: TimestampRecord) -> Stamp {
        let run = unsafe { &mut *self.run.get() };
        let skip = core::mem::take(&mut run.orphaned);
        Stamp { record, skip }
    }

    /// Hand back a stamp the timestamp ring refused. Its bytes, and the ones
    /// it was skipping, now precede the next stamp.
    #[inline]
    pub(crate) fn orphan(&self, stamp: Stamp) {
        let run = unsafe { &mut *self.run.get() };
        run.orphaned = run
            .orphaned
            .saturating_add(stamp.skip)
            .saturating_add(stamp.record.length);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    const MARKER: u8 = 0x7E;

    #[test]
    fn marker_closes_run_and_counts_itself() {
        let correlator = Correlator::new();
        let clock = || 100u64;

        assert_eq!(correlator.observe(b'A', MARKER, 1, &clock), None);
        assert_eq!(correlator.observe(b'B', MARKER, 2, &clock), None);
        let record = correlator.observe(MARKER, MARKER, 3, &clock).unwrap();

        assert_eq!(record.length, 3);
        assert_eq!(record.timestamp, 100);
        assert_eq!(record.position, 3);
    }

    #[test]
    fn run_start_is_sampled_once_per_run() {
        let correlator = Correlator::new();
        let now = Cell::new(10u64);
        let reads = Cell::new(0u32);
        let clock = || {
            reads.set(reads.get() + 1);
            now.get()
        };

        correlator.observe(1, MARKER, 0, &clock);
        now.set(20);
        correlator.observe(2, MARKER, 0, &clock);
        let first = correlator.observe(MARKER, MARKER, 0, &clock).unwrap();
        assert_eq!(first.timestamp, 10);
        assert_eq!(reads.get(), 1);

        now.set(30);
        let second = correlator.observe(MARKER, MARKER, 0, &clock).unwrap();
        assert_eq!(second.timestamp, 30);
        assert_eq!(second.length, 1);
        assert_eq!(reads.get(), 2);
    }

    #[test]
    fn clock_reading_zero_still_starts_a_run() {
        let correlator = Correlator::new();
        let clock = || 0u64;
        correlator.observe(1, MARKER, 0, &clock);
        let record = correlator.observe(MARKER, MARKER, 0, &clock).unwrap();
        assert_eq!(record.length, 2);
        assert_eq!(record.timestamp, 0);
    }

    #[test]
    fn reset_discards_partial_run() {
        let correlator = Correlator::new();
        let clock = || 5u64;
        correlator.observe(1, MARKER, 0, &clock);
        correlator.observe(2, MARKER, 0, &clock);
        correlator.reset();
        let record = correlator.observe(MARKER, MARKER, 0, &clock).unwrap();
        assert_eq!(record.length, 1);
    }

    #[test]
    fn refused_stamps_accumulate_into_the_next_skip() {
        let correlator = Correlator::new();
        let clock = || 0u64;

        let first = correlator.observe(MARKER, MARKER, 0, &clock).unwrap();
        let first = correlator.stamp(first);
        assert_eq!(first.skip, 0);
        correlator.orphan(first);

        correlator.observe(1, MARKER, 0, &clock);
        let second = correlator.observe(MARKER, MARKER, 0, &clock).unwrap();
        let second = correlator.stamp(second);
        assert_eq!(second.skip, 1);
        correlator.orphan(second);

        let third = correlator.observe(MARKER, MARKER, 0, &clock).unwrap();
        let third = correlator.stamp(third);
        assert_eq!(third.skip, 3);
        assert_eq!(third.record.length, 1);
        assert_eq!(correlator.stamp(third.record).skip, 0);
    }
}
