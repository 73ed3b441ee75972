//! In-memory peripheral for host tests.
//!
//! Records every driver call and models just enough hardware: a receive
//! FIFO fed by [`MockPeripheral::inject`], a transmitter that completes
//! instantly while its path is enabled, and latched line errors.

use core::cell::RefCell;

use critical_section::Mutex;
use heapless::{Deque, Vec};

use crate::config::LineSettings;
use crate::error::ConfigError;
use crate::peripheral::{SerialPeripheral, StatusFlags};
use crate::sync::{AtomicBool, AtomicU32, Ordering};

pub const MOCK_RX_DEPTH: usize = 64;
pub const MOCK_TX_LOG: usize = 256;
pub const MOCK_CLOCK_HZ: u32 = 150_000_000;

pub struct MockPeripheral {
    incoming: Mutex<RefCell<Deque<u8, MOCK_RX_DEPTH>>>,
    transmitted: Mutex<RefCell<Vec<u8, MOCK_TX_LOG>>>,
    last_line: Mutex<RefCell<Option<LineSettings>>>,
    reject: Mutex<RefCell<Option<ConfigError>>>,
    latched_errors: AtomicU32,
    undrained_rx_ok: bool,

    rx_irq: AtomicBool,
    tx_irq: AtomicBool,
    tx_path: AtomicBool,
    unmasked: AtomicBool,

    configure_calls: AtomicU32,
    tx_irq_enables: AtomicU32,
    tx_irq_disables: AtomicU32,
    tx_path_enables: AtomicU32,
    tx_path_disables: AtomicU32,
    error_acks: AtomicU32,
}

impl Default for MockPeripheral {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPeripheral {
    pub const fn new() -> Self {
        Self {
            incoming: Mutex::new(RefCell::new(Deque::new())),
            transmitted: Mutex::new(RefCell::new(Vec::new())),
            last_line: Mutex::new(RefCell::new(None)),
            reject: Mutex::new(RefCell::new(None)),
            latched_errors: AtomicU32::new(0),
            undrained_rx_ok: false,
            rx_irq: AtomicBool::new(false),
            tx_irq: AtomicBool::new(false),
            tx_path: AtomicBool::new(false),
            unmasked: AtomicBool::new(false),
            configure_calls: AtomicU32::new(0),
            tx_irq_enables: AtomicU32::new(0),
            tx_irq_disables: AtomicU32::new(0),
            tx_path_enables: AtomicU32::new(0),
            tx_path_disables: AtomicU32::new(0),
            error_acks: AtomicU32::new(0),
        }
    }

    /// Model hardware that tolerates a set receive flag.
    pub const fn tolerating_undrained_rx(mut self) -> Self {
        self.undrained_rx_ok = true;
        self
    }

    /// Make the next `configure` calls fail with `error` (or succeed with `None`).
    pub fn reject_with(&self, error: Option<ConfigError>) {
        critical_section::with(|cs| *self.reject.borrow(cs).borrow_mut() = error);
    }

    /// Queue bytes as if they arrived on the line. Bytes beyond the FIFO depth are lost.
    pub fn inject(&self, bytes: &[u8]) {
        critical_section::with(|cs| {
            let mut incoming = self.incoming.borrow(cs).borrow_mut();
            for &b in bytes {
                let _ = incoming.push_back(b);
            }
        });
    }

    /// Latch line error flags until the next `acknowledge_errors`.
    pub fn raise(&self, errors: StatusFlags) {
        self.latched_errors
            .fetch_or((errors & StatusFlags::LINE_ERRORS).bits(), Ordering::Relaxed);
    }

    /// Whether the interrupt line of this peripheral would be asserted.
    pub fn interrupt_pending(&self) -> bool {
        if !self.unmasked.load(Ordering::Relaxed) {
            return false;
        }
        let rx = self.rx_irq.load(Ordering::Relaxed)
            && (self.pending_rx() > 0 || self.latched_errors.load(Ordering::Relaxed) != 0);
        let tx = self.tx_irq.load(Ordering::Relaxed) && self.tx_path.load(Ordering::Relaxed);
        rx || tx
    }

    pub fn pending_rx(&self) -> usize {
        critical_section::with(|cs| self.incoming.borrow(cs).borrow().len())
    }

    pub fn transmitted(&self) -> Vec<u8, MOCK_TX_LOG> {
        critical_section::with(|cs| self.transmitted.borrow(cs).borrow().clone())
    }

    pub fn last_line(&self) -> Option<LineSettings> {
        critical_section::with(|cs| *self.last_line.borrow(cs).borrow())
    }

    pub fn rx_interrupt_enabled(&self) -> bool {
        self.rx_irq.load(Ordering::Relaxed)
    }

    pub fn tx_interrupt_enabled(&self) -> bool {
        self.tx_irq.load(Ordering::Relaxed)
    }

    pub fn tx_path_enabled(&self) -> bool {
        self.tx_path.load(Ordering::Relaxed)
    }

    pub fn interrupt_unmasked(&self) -> bool {
        self.unmasked.load(Ordering::Relaxed)
    }

    pub fn configure_calls(&self) -> u32 {
        self.configure_calls.load(Ordering::Relaxed)
    }

    pub fn tx_interrupt_enables(&self) -> u32 {
        self.tx_irq_enables.load(Ordering::Relaxed)
    }

    pub fn tx_interrupt_disables(&self) -> u32 {
        self.tx_irq_disables.load(Ordering::Relaxed)
    }

    pub fn tx_path_enables(&self) -> u32 {
        self.tx_path_enables.load(Ordering::Relaxed)
    }

    pub fn tx_path_disables(&self) -> u32 {
        self.tx_path_disables.load(Ordering::Relaxed)
    }

    pub fn error_acks(&self) -> u32 {
        self.error_acks.load(Ordering::Relaxed)
    }
}

impl SerialPeripheral for MockPeripheral {
    fn configure(&self, line: &LineSettings, _clock_hz: u32) -> Result<(), ConfigError> {
        self.configure_calls.fetch_add(1, Ordering::Relaxed);
        critical_section::with(|cs| {
            if let Some(error) = *self.reject.borrow(cs).borrow() {
                return Err(error);
            }
            *self.last_line.borrow(cs).borrow_mut() = Some(*line);
            Ok(())
        })
    }

    fn peripheral_clock_hz(&self) -> u32 {
        MOCK_CLOCK_HZ
    }

    fn enable_receive_interrupt(&self) {
        self.rx_irq.store(true, Ordering::Relaxed);
    }

    fn enable_transmit_path(&self) {
        self.tx_path_enables.fetch_add(1, Ordering::Relaxed);
        self.tx_path.store(true, Ordering::Relaxed);
    }

    fn disable_transmit_path(&self) {
        self.tx_path_disables.fetch_add(1, Ordering::Relaxed);
        self.tx_path.store(false, Ordering::Relaxed);
    }

    fn enable_transmit_interrupt(&self) {
        self.tx_irq_enables.fetch_add(1, Ordering::Relaxed);
        self.tx_irq.store(true, Ordering::Relaxed);
    }

    fn disable_transmit_interrupt(&self) {
        self.tx_irq_disables.fetch_add(1, Ordering::Relaxed);
        self.tx_irq.store(false, Ordering::Relaxed);
    }

    fn unmask_interrupt(&self) {
        self.unmasked.store(true, Ordering::Relaxed);
    }

    fn read_status_flags(&self) -> StatusFlags {
        let latched = self.latched_errors.load(Ordering::Relaxed);
        let mut status = StatusFlags::from_bits_truncate(latched);
        if self.pending_rx() > 0 {
            status |= StatusFlags::RX_READY;
        }
        if self.tx_path.load(Ordering::Relaxed) {
            status |= StatusFlags::TX_REQUEST;
        }
        status
    }

    fn read_data_register(&self) -> u8 {
        critical_section::with(|cs| self.incoming.borrow(cs).borrow_mut().pop_front())
            .unwrap_or(0)
    }

    fn write_data_register(&self, byte: u8) {
        critical_section::with(|cs| {
            let _ = self.transmitted.borrow(cs).borrow_mut().push(byte);
        });
    }

    fn acknowledge_errors(&self) {
        self.error_acks.fetch_add(1, Ordering::Relaxed);
        self.latched_errors.store(0, Ordering::Relaxed);
    }

    fn tolerates_undrained_rx(&self) -> bool {
        self.undrained_rx_ok
    }
}
