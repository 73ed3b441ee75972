//! Fixed registry of channels keyed by [`Port`].
//!
//! The table is built once, typically in a `static`, and never resized.
//! Lookup is a direct index by the port discriminant. Channels share no
//! state, so nothing here takes a lock.
//!
//! ```ignore
//! use ph_serial::{Channel, ChannelConfig, ChannelTable, Port, TickClock};
//!
//! static CLOCK: TickClock = TickClock::new();
//! static SERIAL: ChannelTable<Sam70Uart, 2, 256, 256, 16> = ChannelTable::new([
//!     Channel::new(Sam70Uart::UART0),
//!     Channel::new(Sam70Uart::UART1),
//! ]);
//!
//! SERIAL.init(Port::Uart0, &ChannelConfig::default())?;
//! SERIAL.send_bytes(Port::Uart0, b"hello")?;
//!
//! #[interrupt]
//! fn UART0() {
//!     SERIAL.on_interrupt(Port::Uart0, &CLOCK);
//! }
//! ```

use crate::channel::{Channel, ChannelState, ChannelStats};
use crate::clock::Clock;
use crate::config::ChannelConfig;
use crate::error::{Error, Result};
use crate::peripheral::SerialPeripheral;
use crate::port::Port;
use crate::timestamp::{TimestampRecord, TimestampedFrame};

pub struct ChannelTable<P, const CH: usize, const RX: usize, const TX: usize, const TS: usize> {
    channels: [Channel<P, RX, TX, TS>; CH],
}

impl<P: SerialPeripheral, const CH: usize, const RX: usize, const TX: usize, const TS: usize>
    ChannelTable<P, CH, RX, TX, TS>
{
    /// Slot `i` serves `Port::from_index(i)`.
    pub const fn new(channels: [Channel<P, RX, TX, TS>; CH]) -> Self {
        assert!(CH <= Port::COUNT);
        Self { channels }
    }

    pub fn from_peripherals(peripherals: [P; CH]) -> Self {
        Self::new(peripherals.map(Channel::new))
    }

    #[inline]
    pub fn channel(&self, port: Port) -> Result<&Channel<P, RX, TX, TS>> {
        self.channels.get(port.index()).ok_or(Error::UnknownPort)
    }

    /// Wired ports with their channels, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Port, &Channel<P, RX, TX, TS>)> {
        Port::ALL.into_iter().zip(self.channels.iter())
    }

    pub fn init(&self, port: Port, config: &ChannelConfig) -> Result<()> {
        debug!("init {}", port.name());
        self.channel(port)?.init(config)
    }

    pub fn state(&self, port: Port) -> Result<ChannelState> {
        Ok(self.channel(port)?.state())
    }

    pub fn send_byte(&self, port: Port, byte: u8) -> Result<()> {
        self.channel(port)?.send_byte(byte)
    }

    pub fn send_bytes(&self, port: Port, bytes: &[u8]) -> Result<()> {
        self.channel(port)?.send_bytes(bytes)
    }

    /// Buffered RX bytes; `0` for a port outside the table.
    pub fn available(&self, port: Port) -> usize {
        self.channel(port).map_or(0, Channel::available)
    }

    pub fn read_byte(&self, port: Port) -> Result<u8> {
        self.channel(port)?.read_byte()
    }

    pub fn read_bytes(&self, port: Port, out: &mut [u8]) -> Result<()> {
        self.channel(port)?.read_bytes(out)
    }

    pub fn timestamp_available(&self, port: Port) -> bool {
        self.channel(port).is_ok_and(Channel::timestamp_available)
    }

    /// One flag per table slot.
    pub fn timestamp_available_all(&self) -> [bool; CH] {
        core::array::from_fn(|i| self.channels[i].timestamp_available())
    }

    pub fn timestamp_read_into(&self, port: Port, out: &mut [u8]) -> Result<TimestampRecord> {
        self.channel(port)?.timestamp_read_into(out)
    }

    pub fn timestamp_read<const M: usize>(&self, port: Port) -> Result<TimestampedFrame<M>> {
        self.channel(port)?.timestamp_read::<M>()
    }

    pub fn stats(&self, port: Port) -> Result<ChannelStats> {
        Ok(self.channel(port)?.stats())
    }

    pub fn check_overflow(&self, port: Port) -> Result<()> {
        self.channel(port)?.check_overflow()
    }

    pub fn report_fault(&self, port: Port) -> Result<()> {
        self.channel(port)?.report_fault();
        Ok(())
    }

    /// Interrupt entry point. Call from the vector of `port`.
    ///
    /// # Safety
    /// Must only run from that vector, never from two contexts at once for
    /// the same port. See [`Channel::on_interrupt`].
    #[inline]
    pub fn on_interrupt<C: Clock>(&self, port: Port, clock: &C) {
        if let Some(channel) = self.channels.get(port.index()) {
            channel.on_interrupt(clock);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LineSettings;
    use crate::error::InitError;
    use crate::mock::MockPeripheral;

    type Table = ChannelTable<MockPeripheral, 8, 8, 16, 4>;

    fn table() -> Table {
        Table::from_peripherals(core::array::from_fn(|_| MockPeripheral::new()))
    }

    fn service(table: &Table, port: Port) {
        let clock = || 42u64;
        for _ in 0..256 {
            match table.channel(port) {
                Ok(ch) if ch.peripheral().interrupt_pending() => table.on_interrupt(port, &clock),
                _ => return,
            }
        }
    }

    #[test]
    fn init_once_per_port() {
        let table = table();
        let config = ChannelConfig::new(LineSettings::new(115_200));

        assert_eq!(table.init(Port::Uart0, &config), Ok(()));
        assert_eq!(
            table.init(Port::Uart0, &config),
            Err(Error::Init(InitError::AlreadyInitialized))
        );
        assert_eq!(table.init(Port::Usart2, &config), Ok(()));
        assert_eq!(table.state(Port::Uart1), Ok(ChannelState::Uninitialized));
    }

    #[test]
    fn ports_outside_a_small_table_are_unknown() {
        let table: ChannelTable<MockPeripheral, 2, 8, 8, 2> =
            ChannelTable::from_peripherals([MockPeripheral::new(), MockPeripheral::new()]);

        assert_eq!(
            table.init(Port::Uart2, &ChannelConfig::default()),
            Err(Error::UnknownPort)
        );
        assert_eq!(table.available(Port::Usart0), 0);
        assert!(!table.timestamp_available(Port::Usart0));
        table.on_interrupt(Port::Usart2, &|| 0u64);
        assert_eq!(table.iter().count(), 2);
    }

    #[test]
    fn channels_are_independent() {
        let table = table();
        for port in [Port::Uart1, Port::Usart0] {
            table.init(port, &ChannelConfig::default()).unwrap();
        }

        table.channel(Port::Uart1).unwrap().peripheral().inject(b"one");
        table.channel(Port::Usart0).unwrap().peripheral().inject(b"three");
        service(&table, Port::Uart1);
        service(&table, Port::Usart0);

        assert_eq!(table.available(Port::Uart1), 3);
        assert_eq!(table.available(Port::Usart0), 5);
        assert_eq!(table.available(Port::Uart0), 0);

        table.send_bytes(Port::Usart0, b"ok").unwrap();
        service(&table, Port::Usart0);
        let usart0 = table.channel(Port::Usart0).unwrap().peripheral();
        let uart1 = table.channel(Port::Uart1).unwrap().peripheral();
        assert_eq!(usart0.transmitted().as_slice(), b"ok");
        assert!(uart1.transmitted().is_empty());
    }

    #[test]
    fn timestamp_flags_cover_every_slot() {
        let table = table();
        let config = ChannelConfig::default().with_timestamp_marker(b'\n');
        table.init(Port::Uart2, &config).unwrap();
        table.init(Port::Uart3, &config).unwrap();

        table.channel(Port::Uart3).unwrap().peripheral().inject(b"ping\n");
        service(&table, Port::Uart3);

        let flags = table.timestamp_available_all();
        assert_eq!(flags.iter().filter(|f| **f).count(), 1);
        assert!(flags[Port::Uart3.index()]);

        let frame = table.timestamp_read::<16>(Port::Uart3).unwrap();
        assert_eq!(frame.timestamp, 42);
        assert_eq!(frame.data.as_slice(), b"ping\n");
        assert_eq!(
            table.timestamp_read::<16>(Port::Uart2),
            Err(Error::TimestampUnavailable)
        );
    }

    #[test]
    fn overflow_is_observable_through_the_table() {
        let table = table();
        table.init(Port::Uart4, &ChannelConfig::default()).unwrap();
        table
            .channel(Port::Uart4)
            .unwrap()
            .peripheral()
            .inject(&[0; 9]);
        service(&table, Port::Uart4);

        assert_eq!(table.available(Port::Uart4), 8);
        assert_eq!(table.stats(Port::Uart4).unwrap().rx_overflows, 1);
        assert_eq!(
            table.check_overflow(Port::Uart4),
            Err(Error::Overflow { dropped: 1 })
        );
        assert_eq!(table.check_overflow(Port::Uart4), Ok(()));
    }

    #[test]
    fn fault_is_per_channel() {
        let table = table();
        table.init(Port::Uart0, &ChannelConfig::default()).unwrap();
        table.init(Port::Uart1, &ChannelConfig::default()).unwrap();

        table.report_fault(Port::Uart0).unwrap();
        assert_eq!(table.send_byte(Port::Uart0, 1), Err(Error::Fault));
        assert_eq!(table.send_byte(Port::Uart1, 1), Ok(()));
    }
}
