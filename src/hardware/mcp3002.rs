/// The maximum SPI clock speed when V<sub>DD</sub> is 5V.
pub const MAX_CLOCK_AT_5V: u32 = 3_200_000;
/// The maximum SPI clock speed when V<sub>DD</sub> is 2.7V.
pub const MAX_CLOCK_AT_2_7V: u32 = 1_200_000;

/// Input channel of the two-channel MCP3002, read in single-ended mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdcChannel {
    Zero = 0,
    One = 1,
}

/// A full-duplex transfer of one 3-byte frame.
///
/// Implemented for the Raspberry Pi SPI bus, and by fakes in tests.
pub trait DuplexTransfer {
    type Error;

    fn transfer(&mut self, command: [u8; 3]) -> Result<[u8; 3], Self::Error>;
}

impl DuplexTransfer for rppal::spi::Spi {
    type Error = rppal::spi::Error;

    fn transfer(&mut self, command: [u8; 3]) -> Result<[u8; 3], Self::Error> {
        let mut reply = [0u8; 3];
        rppal::spi::Spi::transfer(self, &mut reply, &command)?;
        Ok(reply)
    }
}

/// Builds the request frame for a single-ended read.
///
/// The request looks like `0000 000S | DC00 0000 | 0000 0000`, where:
///   S: start bit, always 1
///   D: single-ended (1) or differential (0) mode
///   C: channel select
///
/// So channel 0 sends `[0x01, 0x80, 0x00]` and channel 1 sends `[0x01, 0xC0, 0x00]`.
pub fn command_frame(channel: AdcChannel) -> [u8; 3] {
    [0x01, (2 + channel as u8) << 6, 0x00]
}

/// Extracts the conversion result from the reply frame.
///
/// The reply looks like `XXXX XXXX | XXXD DDDD | DDDD DDXX`. The low five bits of the
/// second byte are the high bits of the result, the top six bits of the third byte the
/// low bits. The mask lets through one bit more than the 10-bit resolution; nothing
/// checks it, so a noisy line can read above 1023.
pub fn decode_reply(reply: [u8; 3]) -> u16 {
    (((reply[1] & 0b1_1111) as u16) << 6) + (reply[2] >> 2) as u16
}

/// MCP3002 on a duplex bus.
#[derive(Debug)]
pub struct Mcp3002<TBus> {
    bus: TBus,
}

impl<TBus: DuplexTransfer> Mcp3002<TBus> {
    pub fn new(bus: TBus) -> Self {
        Mcp3002 { bus }
    }

    /// Reads one raw conversion from the given channel.
    ///
    /// The bus should be configured for 8 bits per word, most-significant bit first,
    /// SPI mode 0, and no faster than [`MAX_CLOCK_AT_5V`] (or [`MAX_CLOCK_AT_2_7V`] on
    /// a 3.3V supply).
    pub fn read(&mut self, channel: AdcChannel) -> Result<u16, TBus::Error> {
        let reply = self.bus.transfer(command_frame(channel))?;
        Ok(decode_reply(reply))
    }

    pub fn release(self) -> TBus {
        self.bus
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeBus {
        reply: [u8; 3],
        written: Vec<[u8; 3]>,
    }

    impl DuplexTransfer for FakeBus {
        type Error = ();

        fn transfer(&mut self, command: [u8; 3]) -> Result<[u8; 3], ()> {
            self.written.push(command);
            Ok(self.reply)
        }
    }

    struct FailingBus;

    impl DuplexTransfer for FailingBus {
        type Error = &'static str;

        fn transfer(&mut self, _command: [u8; 3]) -> Result<[u8; 3], &'static str> {
            Err("bus closed")
        }
    }

    macro_rules! test_decode {
        ($name:ident, $reply:expr, $expected:expr) => {
            #[test]
            fn $name() {
                assert_eq!(decode_reply($reply), $expected);
            }
        };
    }

    test_decode!(decode_zero, [0x00, 0x00, 0x00], 0);
    test_decode!(decode_full_scale, [0x00, 0b0000_1111, 0b1111_1100], 1023);
    test_decode!(decode_midscale, [0x00, 0b0000_1000, 0b0000_0000], 512);
    test_decode!(decode_golden_vector, [0x00, 0b0001_1111, 0b1100_0000], 2032);
    test_decode!(decode_ignores_noise, [0xFF, 0b1110_0001, 0b0000_0111], 65);

    #[test]
    fn frames_for_both_channels() {
        assert_eq!(command_frame(AdcChannel::Zero), [0x01, 0x80, 0x00]);
        assert_eq!(command_frame(AdcChannel::One), [0x01, 0xC0, 0x00]);
    }

    #[test]
    fn read_sends_frame_and_decodes_reply() {
        let mut adc = Mcp3002::new(FakeBus {
            reply: [0x00, 0b0000_0111, 0b1101_0000],
            written: Vec::new(),
        });

        assert_eq!(adc.read(AdcChannel::One), Ok(500));
        assert_eq!(adc.release().written, vec![[0x01, 0xC0, 0x00]]);
    }

    #[test]
    fn read_propagates_bus_errors() {
        let mut adc = Mcp3002::new(FailingBus);
        assert_eq!(adc.read(AdcChannel::Zero), Err("bus closed"));
    }
}
