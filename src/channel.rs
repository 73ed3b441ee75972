//! One serial link: RX/TX rings, timestamp side channel and lifecycle.
//!
//! # Roles
//! - RX ring: the interrupt handler produces, the foreground consumes.
//! - TX ring: the foreground produces, the interrupt handler consumes.
//! - Timestamp ring: the interrupt handler produces, the foreground consumes.
//!
//! Foreground methods never block. The interrupt handler
//! ([`Channel::on_interrupt`]) moves at most one byte per direction, never
//! allocates and never calls foreground-only operations.
//!
//! # Transmitter arming
//! `tx_armed` mirrors whether the transmit path and interrupt are enabled.
//! The foreground arms on the idle-to-busy edge after queueing data; the
//! interrupt handler disarms when it finds the TX ring empty. Each edge
//! touches the driver exactly once.

use crate::clock::Clock;
use crate::config::{ChannelConfig, RxPolicy};
use crate::error::{Error, InitError, Result};
use crate::peripheral::{SerialPeripheral, StatusFlags};
use crate::ring::Ring;
use crate::sync::{AtomicBool, AtomicU8, AtomicU16, AtomicU32, Ordering};
use crate::timestamp::{Correlator, Stamp, TimestampRecord, TimestampedFrame};

const NO_MARKER: u16 = u16::MAX;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ChannelState {
    Uninitialized = 0,
    Ready = 1,
    /// The last `init` attempt was refused; `init` may be retried.
    InitError = 2,
    /// Terminal for this channel until reset.
    Fault = 3,
}

impl ChannelState {
    const fn from_u8(raw: u8) -> Self {
        match raw {
            1 => ChannelState::Ready,
            2 => ChannelState::InitError,
            3 => ChannelState::Fault,
            _ => ChannelState::Uninitialized,
        }
    }
}

/// Counters the interrupt handler bumps instead of failing.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelStats {
    /// Received bytes discarded because the RX ring was full.
    pub rx_overflows: u32,
    /// Timestamp records discarded because the timestamp ring was full.
    pub timestamp_overflows: u32,
    /// Interrupts that reported overrun, framing or parity errors.
    pub line_errors: u32,
}

pub struct Channel<P, const RX: usize, const TX: usize, const TS: usize> {
    peripheral: P,
    state: AtomicU8,
    rx_policy: AtomicU8,
    marker: AtomicU16,
    tx_armed: AtomicBool,
    rx: Ring<u8, RX>,
    tx: Ring<u8, TX>,
    stamps: Ring<Stamp, TS>,
    correlator: Correlator,
    rx_overflows: AtomicU32,
    timestamp_overflows: AtomicU32,
    line_errors: AtomicU32,
}

impl<P: SerialPeripheral, const RX: usize, const TX: usize, const TS: usize>
    Channel<P, RX, TX, TS>
{
    pub const fn new(peripheral: P) -> Self {
        Self {
            peripheral,
            state: AtomicU8::new(ChannelState::Uninitialized as u8),
            rx_policy: AtomicU8::new(RxPolicy::AlwaysDrain as u8),
            marker: AtomicU16::new(NO_MARKER),
            tx_armed: AtomicBool::new(false),
            rx: Ring::new(),
            tx: Ring::new(),
            stamps: Ring::new(),
            correlator: Correlator::new(),
            rx_overflows: AtomicU32::new(0),
            timestamp_overflows: AtomicU32::new(0),
            line_errors: AtomicU32::new(0),
        }
    }

    #[inline]
    pub fn peripheral(&self) -> &P {
        &self.peripheral
    }

    #[inline]
    pub fn state(&self) -> ChannelState {
        ChannelState::from_u8(self.state.load(Ordering::Acquire))
    }

    #[inline]
    pub fn rx_policy(&self) -> RxPolicy {
        RxPolicy::from_u8(self.rx_policy.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn timestamp_marker(&self) -> Option<u8> {
        match self.marker.load(Ordering::Relaxed) {
            NO_MARKER => None,
            raw => Some(raw as u8),
        }
    }

    /// Configure the peripheral and bring the channel to `Ready`.
    ///
    /// Runs inside a critical section so the interrupt handler never sees a
    /// half-configured channel. Only `Uninitialized` and `InitError`
    /// channels accept `init`.
    pub fn init(&self, config: &ChannelConfig) -> Result<()> {
        critical_section::with(|_| -> Result<()> {
            match self.state() {
                ChannelState::Ready => {
                    warn!("init refused: channel already ready");
                    return Err(InitError::AlreadyInitialized.into());
                }
                ChannelState::Fault => return Err(Error::Fault),
                ChannelState::Uninitialized | ChannelState::InitError => {}
            }

            if config.rx_policy == RxPolicy::DrainWhenEmpty
                && !self.peripheral.tolerates_undrained_rx()
            {
                warn!("init refused: drain-when-empty needs a tolerant peripheral");
                self.set_state(ChannelState::InitError);
                return Err(InitError::UndrainedRxUnsupported.into());
            }

            let clock_hz = self.peripheral.peripheral_clock_hz();
            if let Err(e) = self.peripheral.configure(&config.line, clock_hz) {
                warn!("peripheral rejected line settings: {}", e);
                self.set_state(ChannelState::InitError);
                return Err(InitError::Rejected(e).into());
            }

            self.rx_policy.store(config.rx_policy as u8, Ordering::Relaxed);
            self.marker.store(
                config.timestamp_marker.map_or(NO_MARKER, u16::from),
                Ordering::Relaxed,
            );
            self.correlator.reset();
            self.set_state(ChannelState::Ready);

            self.peripheral.enable_receive_interrupt();
            self.peripheral.unmask_interrupt();
            info!("channel ready at {} baud", config.line.baud);
            Ok(())
        })
    }

    /// Move the channel to `Fault` and silence its transmitter.
    pub fn report_fault(&self) {
        critical_section::with(|_| {
            self.set_state(ChannelState::Fault);
            if self.tx_armed.swap(false, Ordering::AcqRel) {
                self.peripheral.disable_transmit_interrupt();
                self.peripheral.disable_transmit_path();
            }
        });
        error!("channel moved to fault state");
    }

    #[inline]
    fn set_state(&self, state: ChannelState) {
        self.state.store(state as u8, Ordering::Release);
    }

    #[inline]
    fn ensure_ready(&self) -> Result<()> {
        match self.state() {
            ChannelState::Ready => Ok(()),
            ChannelState::Fault => Err(Error::Fault),
            ChannelState::Uninitialized | ChannelState::InitError => Err(Error::NotReady),
        }
    }

    /// Enable the transmitter if it was idle.
    #[inline]
    fn arm_transmitter(&self) {
        if !self.tx_armed.swap(true, Ordering::AcqRel) {
            self.peripheral.enable_transmit_path();
            self.peripheral.enable_transmit_interrupt();
        }
    }

    pub fn send_byte(&self, byte: u8) -> Result<()> {
        self.ensure_ready()?;
        if !self.tx.producer().push(byte) {
            return Err(Error::BufferFull);
        }
        self.arm_transmitter();
        Ok(())
    }

    /// Queue every byte of `bytes`, or none of them.
    pub fn send_bytes(&self, bytes: &[u8]) -> Result<()> {
        self.ensure_ready()?;
        if bytes.is_empty() {
            return Ok(());
        }
        if !self.tx.producer().push_bulk(bytes) {
            return Err(Error::BufferFull);
        }
        self.arm_transmitter();
        Ok(())
    }

    /// Bytes waiting in the RX ring.
    #[inline]
    pub fn available(&self) -> usize {
        self.rx.len()
    }

    /// Bytes still queued for transmission.
    #[inline]
    pub fn pending_tx(&self) -> usize {
        self.tx.len()
    }

    pub fn read_byte(&self) -> Result<u8> {
        self.ensure_ready()?;
        self.rx.consumer().pop().ok_or(Error::BufferEmpty)
    }

    /// Fill `out` completely from the RX ring, or read nothing.
    pub fn read_bytes(&self, out: &mut [u8]) -> Result<()> {
        self.ensure_ready()?;
        if self.rx.consumer().pop_bulk(out) {
            Ok(())
        } else {
            Err(Error::Underflow {
                requested: out.len(),
                available: self.rx.len(),
            })
        }
    }

    #[inline]
    pub fn timestamp_available(&self) -> bool {
        !self.stamps.is_empty()
    }

    #[inline]
    pub fn timestamp_pending(&self) -> usize {
        self.stamps.len()
    }

    /// Pop the oldest timestamp record and its `length` bytes into `out`.
    ///
    /// Bytes of runs whose records were lost to a full timestamp ring are
    /// skipped first. Nothing is consumed when `out` is too small. If the
    /// caller already drained the run's bytes with `read_byte`/`read_bytes`,
    /// the record is dropped and `Underflow` is returned.
    pub fn timestamp_read_into(&self, out: &mut [u8]) -> Result<TimestampRecord> {
        self.ensure_ready()?;
        let stamps = self.stamps.consumer();
        let Stamp { record, skip } = stamps.peek().ok_or(Error::TimestampUnavailable)?;
        let needed = record.length as usize;
        if needed > out.len() {
            return Err(Error::ScratchTooSmall {
                needed,
                provided: out.len(),
            });
        }

        let _ = stamps.pop();
        let rx = self.rx.consumer();
        let available = self.rx.len();
        let skip = skip as usize;
        if available < skip + needed {
            return Err(Error::Underflow {
                requested: skip + needed,
                available,
            });
        }
        if skip > 0 {
            debug!("skipping {} bytes of unrecorded runs", skip);
        }
        if rx.discard(skip) && rx.pop_bulk(&mut out[..needed]) {
            Ok(record)
        } else {
            Err(Error::Underflow {
                requested: skip + needed,
                available: self.rx.len(),
            })
        }
    }

    /// Like [`timestamp_read_into`](Self::timestamp_read_into), returning an
    /// owned frame of at most `M` bytes. Dropping the frame releases it.
    pub fn timestamp_read<const M: usize>(&self) -> Result<TimestampedFrame<M>> {
        self.ensure_ready()?;
        let Stamp { record, .. } = self
            .stamps
            .consumer()
            .peek()
            .ok_or(Error::TimestampUnavailable)?;
        let mut data = heapless::Vec::<u8, M>::new();
        data.resize(record.length as usize, 0)
            .map_err(|_| Error::ScratchTooSmall {
                needed: record.length as usize,
                provided: M,
            })?;

        let record = self.timestamp_read_into(&mut data)?;
        Ok(TimestampedFrame {
            timestamp: record.timestamp,
            data,
        })
    }

    pub fn stats(&self) -> ChannelStats {
        ChannelStats {
            rx_overflows: self.rx_overflows.load(Ordering::Relaxed),
            timestamp_overflows: self.timestamp_overflows.load(Ordering::Relaxed),
            line_errors: self.line_errors.load(Ordering::Relaxed),
        }
    }

    /// Return and clear the RX overflow count.
    pub fn take_overflows(&self) -> u32 {
        let dropped = self.rx_overflows.swap(0, Ordering::Relaxed);
        if dropped > 0 {
            warn!("{} received bytes dropped on a full ring", dropped);
        }
        dropped
    }

    /// `Err(Overflow)` if received bytes were dropped since the last check.
    pub fn check_overflow(&self) -> Result<()> {
        match self.take_overflows() {
            0 => Ok(()),
            dropped => Err(Error::Overflow { dropped }),
        }
    }

    /// Interrupt entry point for this channel's peripheral.
    ///
    /// # Safety
    /// Must only run from one context at a time: the interrupt vector of this
    /// channel's peripheral, which does not preempt itself. Concurrent calls
    /// race on the RX and timestamp producers and on the run accumulator.
    pub fn on_interrupt<C: Clock>(&self, clock: &C) {
        let status = self.peripheral.read_status_flags();

        if status.intersects(StatusFlags::LINE_ERRORS) {
            self.line_errors.fetch_add(1, Ordering::Relaxed);
            self.peripheral.acknowledge_errors();
        }

        // TX_READY stays set while idle; only an armed transmitter owns it.
        if status.intersects(StatusFlags::TX_REQUEST) && self.tx_armed.load(Ordering::Acquire) {
            match self.tx.consumer().pop() {
                Some(byte) => self.peripheral.write_data_register(byte),
                None => {
                    self.peripheral.disable_transmit_interrupt();
                    self.peripheral.disable_transmit_path();
                    self.tx_armed.store(false, Ordering::Release);
                }
            }
        }

        if status.contains(StatusFlags::RX_READY) {
            self.receive(clock);
        }
    }

    #[inline]
    fn receive<C: Clock>(&self, clock: &C) {
        let rx = self.rx.producer();
        match self.rx_policy() {
            RxPolicy::AlwaysDrain => {
                let byte = self.peripheral.read_data_register();
                if rx.push(byte) {
                    self.correlate(byte, rx.write_index(), clock);
                } else {
                    self.rx_overflows.fetch_add(1, Ordering::Relaxed);
                }
            }
            RxPolicy::DrainWhenEmpty => {
                // Leaving RX_READY set holds the sender off in hardware.
                if self.rx.is_empty() {
                    let byte = self.peripheral.read_data_register();
                    if rx.push(byte) {
                        self.correlate(byte, rx.write_index(), clock);
                    }
                }
            }
        }
    }

    #[inline]
    fn correlate<C: Clock>(&self, byte: u8, position: usize, clock: &C) {
        let Some(marker) = self.timestamp_marker() else {
            return;
        };
        if let Some(record) = self.correlator.observe(byte, marker, position, clock) {
            let stamp = self.correlator.stamp(record);
            if !self.stamps.producer().push(stamp) {
                self.correlator.orphan(stamp);
                self.timestamp_overflows.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}
