//! Contract between the channel engine and a serial peripheral driver.
//!
//! Register programming, clock gating and interrupt-controller priorities
//! belong to the driver. The engine only needs the handful of operations
//! below. Every method takes `&self`: drivers wrap memory-mapped registers
//! and are called from both the interrupt handler and the foreground.

use crate::config::LineSettings;
use crate::error::ConfigError;

bitflags::bitflags! {
    /// Status word as read by the interrupt handler.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct StatusFlags: u32 {
        /// A received character waits in the data register.
        const RX_READY = 1 << 0;
        /// The transmit holding register can take a character.
        const TX_READY = 1 << 1;
        const OVERRUN  = 1 << 5;
        const FRAMING  = 1 << 6;
        const PARITY   = 1 << 7;
        /// Shift register and holding register are both empty.
        const TX_EMPTY = 1 << 9;

        const LINE_ERRORS = Self::OVERRUN.bits() | Self::FRAMING.bits() | Self::PARITY.bits();
        const TX_REQUEST = Self::TX_READY.bits() | Self::TX_EMPTY.bits();
    }
}

pub trait SerialPeripheral {
    /// Program the line format. Called once from `init`, before any
    /// interrupt source of this peripheral is enabled.
    fn configure(&self, line: &LineSettings, clock_hz: u32) -> Result<(), ConfigError>;

    /// Input clock of the peripheral, used for baud generation.
    fn peripheral_clock_hz(&self) -> u32;

    fn enable_receive_interrupt(&self);

    fn enable_transmit_path(&self);

    fn disable_transmit_path(&self);

    fn enable_transmit_interrupt(&self);

    fn disable_transmit_interrupt(&self);

    /// Clear pending and enable this peripheral's interrupt vector.
    fn unmask_interrupt(&self);

    fn read_status_flags(&self) -> StatusFlags;

    fn read_data_register(&self) -> u8;

    fn write_data_register(&self, byte: u8);

    /// Clear latched overrun/framing/parity errors.
    fn acknowledge_errors(&self) {}

    /// Whether the hardware may be left with `RX_READY` set without raising
    /// an overrun fault or re-entering the interrupt continuously.
    /// [`RxPolicy::DrainWhenEmpty`](crate::RxPolicy::DrainWhenEmpty) is
    /// refused at `init` unless this returns `true`.
    fn tolerates_undrained_rx(&self) -> bool {
        false
    }
}
