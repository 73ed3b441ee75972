//! Interrupt-driven serial channels for no-std embedded targets.
//!
//! # Highlights
//! - One RX ring, one TX ring and an optional timestamp ring per peripheral.
//! - Lock-free SPSC rings: interrupt handlers and foreground code never wait on each other.
//! - No allocation, no dynamic dispatch; tables are `const`-constructible for `static` placement.
//! - Bulk reads and writes are all-or-nothing, so fixed-size frames never tear.
//!
//! # Quick start
//! ```
//! use ph_serial::{ChannelConfig, ChannelTable, LineSettings, Port, SerialPeripheral};
//! # use ph_serial::{ConfigError, StatusFlags};
//! # struct Uart;
//! # impl SerialPeripheral for Uart {
//! #     fn configure(&self, _: &LineSettings, _: u32) -> Result<(), ConfigError> { Ok(()) }
//! #     fn peripheral_clock_hz(&self) -> u32 { 150_000_000 }
//! #     fn enable_receive_interrupt(&self) {}
//! #     fn enable_transmit_path(&self) {}
//! #     fn disable_transmit_path(&self) {}
//! #     fn enable_transmit_interrupt(&self) {}
//! #     fn disable_transmit_interrupt(&self) {}
//! #     fn unmask_interrupt(&self) {}
//! #     fn read_status_flags(&self) -> StatusFlags { StatusFlags::empty() }
//! #     fn read_data_register(&self) -> u8 { 0 }
//! #     fn write_data_register(&self, _: u8) {}
//! # }
//!
//! let serial: ChannelTable<Uart, 1, 64, 64, 4> = ChannelTable::from_peripherals([Uart]);
//!
//! let config = ChannelConfig::new(LineSettings::new(115_200)).with_timestamp_marker(b'\n');
//! serial.init(Port::Uart0, &config).unwrap();
//! serial.send_bytes(Port::Uart0, b"AT\r\n").unwrap();
//!
//! // Interrupt vector: serial.on_interrupt(Port::Uart0, &clock);
//! assert_eq!(serial.available(Port::Uart0), 0);
//! ```
//!
//! # Safety and concurrency
//! Each ring has exactly one producer and one consumer: the interrupt handler of the
//! channel's peripheral and the foreground code. Calling foreground operations of one
//! channel from several contexts at once, or `on_interrupt` from anywhere but that
//! peripheral's vector, breaks the SPSC contract.
//!
//! # Semantics
//! - A full ring rejects new data; received bytes that find the RX ring full are
//!   dropped and counted (see [`Channel::check_overflow`]).
//! - The transmitter is armed on the first queued byte and disarmed by the interrupt
//!   handler once the TX ring runs dry.
//! - With a timestamp marker configured, each marker closes a run and records the
//!   arrival time of the run's first byte together with its length (marker included).
#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;
mod sync;

pub mod channel;
pub mod clock;
pub mod config;
pub mod error;
pub mod peripheral;
pub mod port;
pub mod ring;
pub mod table;
pub mod timestamp;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use channel::{Channel, ChannelState, ChannelStats};
#[cfg(any(
    target_has_atomic = "64",
    feature = "portable-atomic-unsafe-assume-single-core",
    feature = "portable-atomic-critical-section",
))]
pub use clock::TickClock;
pub use clock::Clock;
pub use config::{
    CharLength, ChannelConfig, DEFAULT_BUFFER_SIZE, DEFAULT_TIMESTAMP_SLOTS, LineSettings,
    Parity, RxPolicy, StopBits,
};
pub use error::{ConfigError, Error, InitError, Result};
pub use peripheral::{SerialPeripheral, StatusFlags};
pub use port::Port;
pub use ring::{Consumer, Producer, Ring};
pub use table::ChannelTable;
pub use timestamp::{TimestampRecord, TimestampedFrame};

/// Eight-port table of the reference board with default buffer sizes.
pub type SerialTable<P> = ChannelTable<
    P,
    { Port::COUNT },
    DEFAULT_BUFFER_SIZE,
    DEFAULT_BUFFER_SIZE,
    DEFAULT_TIMESTAMP_SLOTS,
>;
