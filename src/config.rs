//! Line settings and per-channel options chosen at `init`.

/// Buffer size used by [`SerialTable`](crate::SerialTable) for both RX and TX rings.
pub const DEFAULT_BUFFER_SIZE: usize = 256;

/// Timestamp records kept per channel by [`SerialTable`](crate::SerialTable).
pub const DEFAULT_TIMESTAMP_SLOTS: usize = 32;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CharLength {
    Five,
    Six,
    Seven,
    Eight,
    Nine,
}

impl CharLength {
    pub const fn bits(self) -> u8 {
        match self {
            CharLength::Five => 5,
            CharLength::Six => 6,
            CharLength::Seven => 7,
            CharLength::Eight => 8,
            CharLength::Nine => 9,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    None,
    Even,
    Odd,
    /// Parity bit forced to 0.
    Space,
    /// Parity bit forced to 1.
    Mark,
    Multidrop,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBits {
    One,
    OneAndHalf,
    Two,
}

/// Character framing handed to the peripheral driver.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LineSettings {
    pub baud: u32,
    pub char_length: CharLength,
    pub parity: Parity,
    pub stop_bits: StopBits,
}

impl LineSettings {
    /// 8N1 at the given baud rate.
    pub const fn new(baud: u32) -> Self {
        Self {
            baud,
            char_length: CharLength::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }

    pub const fn with_char_length(mut self, char_length: CharLength) -> Self {
        self.char_length = char_length;
        self
    }

    pub const fn with_parity(mut self, parity: Parity) -> Self {
        self.parity = parity;
        self
    }

    pub const fn with_stop_bits(mut self, stop_bits: StopBits) -> Self {
        self.stop_bits = stop_bits;
        self
    }
}

impl Default for LineSettings {
    fn default() -> Self {
        Self::new(115_200)
    }
}

/// How the interrupt handler treats a received byte.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum RxPolicy {
    /// Always read the data register; a byte that finds the ring full is
    /// discarded and counted as an overflow.
    #[default]
    AlwaysDrain = 0,
    /// Read the data register only while the ring is empty, otherwise leave
    /// the receive flag set in hardware. Only valid on peripherals whose
    /// driver reports [`tolerates_undrained_rx`].
    ///
    /// [`tolerates_undrained_rx`]: crate::SerialPeripheral::tolerates_undrained_rx
    DrainWhenEmpty = 1,
}

impl RxPolicy {
    pub(crate) const fn from_u8(raw: u8) -> Self {
        match raw {
            1 => RxPolicy::DrainWhenEmpty,
            _ => RxPolicy::AlwaysDrain,
        }
    }
}

/// Everything `init` needs to bring one channel up.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelConfig {
    pub line: LineSettings,
    pub rx_policy: RxPolicy,
    /// Byte that closes a timing run. `None` disables timestamp recording.
    pub timestamp_marker: Option<u8>,
}

impl ChannelConfig {
    pub const fn new(line: LineSettings) -> Self {
        Self {
            line,
            rx_policy: RxPolicy::AlwaysDrain,
            timestamp_marker: None,
        }
    }

    pub const fn with_rx_policy(mut self, rx_policy: RxPolicy) -> Self {
        self.rx_policy = rx_policy;
        self
    }

    pub const fn with_timestamp_marker(mut self, marker: u8) -> Self {
        self.timestamp_marker = Some(marker);
        self
    }
}
