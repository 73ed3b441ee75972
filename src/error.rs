//! Error types returned by the foreground API.

/// Reasons a peripheral driver refuses a line configuration.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    #[error("baud rate cannot be generated from the peripheral clock")]
    UnsupportedBaud,
    #[error("character format is not supported by this peripheral")]
    UnsupportedFormat,
    #[error("peripheral clock is not available")]
    ClockUnavailable,
}

/// Why `init` did not bring a channel to `Ready`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InitError {
    #[error("channel is already initialized")]
    AlreadyInitialized,
    #[error("peripheral rejected configuration: {0}")]
    Rejected(ConfigError),
    #[error("peripheral cannot leave its receive flag undrained")]
    UndrainedRxUnsupported,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    #[error(transparent)]
    Init(#[from] InitError),
    #[error("channel is not initialized")]
    NotReady,
    #[error("channel is in the fault state")]
    Fault,
    #[error("port has no channel in this table")]
    UnknownPort,
    #[error("transmit buffer has no room")]
    BufferFull,
    #[error("receive buffer is empty")]
    BufferEmpty,
    #[error("requested {requested} bytes but only {available} are buffered")]
    Underflow { requested: usize, available: usize },
    #[error("{dropped} received bytes were discarded on a full buffer")]
    Overflow { dropped: u32 },
    #[error("no timestamp record is pending")]
    TimestampUnavailable,
    #[error("frame needs {needed} bytes but the buffer holds {provided}")]
    ScratchTooSmall { needed: usize, provided: usize },
}

pub type Result<T> = core::result::Result<T, Error>;
