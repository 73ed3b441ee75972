//! Physical port identities of the reference board.

/// One serial peripheral. The discriminant is the channel table slot.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Port {
    Uart0 = 0,
    Uart1 = 1,
    Uart2 = 2,
    Uart3 = 3,
    Uart4 = 4,
    Usart0 = 5,
    Usart1 = 6,
    Usart2 = 7,
}

impl Port {
    pub const COUNT: usize = 8;

    pub const ALL: [Port; Port::COUNT] = [
        Port::Uart0,
        Port::Uart1,
        Port::Uart2,
        Port::Uart3,
        Port::Uart4,
        Port::Usart0,
        Port::Usart1,
        Port::Usart2,
    ];

    #[inline(always)]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn from_index(index: usize) -> Option<Port> {
        if index < Self::COUNT {
            Some(Self::ALL[index])
        } else {
            None
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Port::Uart0 => "UART0",
            Port::Uart1 => "UART1",
            Port::Uart2 => "UART2",
            Port::Uart3 => "UART3",
            Port::Uart4 => "UART4",
            Port::Usart0 => "USART0",
            Port::Usart1 => "USART1",
            Port::Usart2 => "USART2",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Port;

    #[test]
    fn index_matches_position_in_all() {
        for (i, port) in Port::ALL.iter().enumerate() {
            assert_eq!(port.index(), i);
            assert_eq!(Port::from_index(i), Some(*port));
        }
        assert_eq!(Port::from_index(Port::COUNT), None);
    }

    #[test]
    fn names_follow_peripheral_family() {
        assert_eq!(Port::Uart4.name(), "UART4");
        assert_eq!(Port::Usart0.name(), "USART0");
    }
}
