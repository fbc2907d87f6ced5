use log::debug;
use rppal::gpio::{Bias, IoPin, Level, Mode};
use std::fmt;
use std::thread;
use std::time::{Duration, Instant};

/// How long the host holds the line low to wake the sensor.
const START_PULSE: Duration = Duration::from_millis(18);
/// Upper bound for any single level on the line; the longest legal one is ~80us.
const LEVEL_TIMEOUT: Duration = Duration::from_micros(200);
/// High pulses longer than this encode a 1 bit (~70us), shorter a 0 bit (~27us).
const ONE_BIT_THRESHOLD_US: u32 = 50;

const DATA_BITS: usize = 40;

#[derive(Debug, PartialEq)]
pub enum Error {
    /// The sensor never acknowledged the start pulse.
    NoResponse,
    /// The line stopped toggling part-way through the data.
    Timeout,
    /// The checksum did not match, or the values are out of range.
    BadData,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NoResponse => write!(f, "DHT11 did not respond"),
            Error::Timeout => write!(f, "DHT11 timed out while sending data"),
            Error::BadData => write!(f, "DHT11 sent invalid data"),
        }
    }
}

impl std::error::Error for Error {}

/// Data read from the DHT11.
#[derive(Debug, PartialEq)]
pub struct Dht11Response {
    pub humidity: u8,
    pub humidity_decimal: u8,
    pub temperature: u8,
    pub temperature_decimal: u8,
}

impl Dht11Response {
    fn from_raw_bytes(bytes: [u8; 4]) -> Dht11Response {
        Dht11Response {
            humidity: bytes[0],
            humidity_decimal: bytes[1],
            temperature: bytes[2],
            temperature_decimal: bytes[3],
        }
    }

    pub fn get_humidity(&self) -> f64 {
        self.humidity as f64 + (self.humidity_decimal as f64 * 0.1)
    }

    pub fn get_temperature(&self) -> f64 {
        self.temperature as f64 + (self.temperature_decimal as f64 * 0.1)
    }

    fn is_valid(&self) -> bool {
        // DHT11 sensors should only be able to read temperatures from 0-50 degrees Celsius.
        // Validate that + 50% for some wiggle-room in case some sensors can go beyond this.
        ((self.humidity < 100 && self.humidity_decimal < 10)
            || (self.humidity == 100 && self.humidity_decimal == 0))
            && ((self.temperature < 75 && self.temperature_decimal < 10)
                || (self.temperature == 75 && self.temperature_decimal == 0))
    }
}

/// Options to modify the retry behavior of [`Dht11::read_retry`].
#[derive(Clone, Copy, Debug)]
pub struct Options {
    /// The maximum number of read attempts.
    pub max_attempts: u8,
    /// Pause between attempts. The DHT11 needs at least a second between reads.
    pub retry_delay: Duration,
}

pub const DEFAULT_OPTIONS: Options = Options {
    max_attempts: 15,
    retry_delay: Duration::from_secs(2),
};

/// DHT11 bit-banged over a single GPIO line.
#[derive(Debug)]
pub struct Dht11 {
    pin: IoPin,
    options: Options,
}

impl Dht11 {
    pub fn new(mut pin: IoPin, options: Options) -> Dht11 {
        pin.set_bias(Bias::PullUp);
        pin.set_mode(Mode::Output);
        pin.set_high();
        Dht11 { pin, options }
    }

    /// Reads until a valid response arrives or the attempts run out.
    ///
    /// Returns `None` when every attempt failed, leaving the caller to decide what a
    /// missing reading means.
    pub async fn read_retry(&mut self) -> Option<Dht11Response> {
        for attempt in 1..=self.options.max_attempts {
            match self.read() {
                Ok(response) => return Some(response),
                Err(e) => debug!("DHT11 attempt {} failed: {}", attempt, e),
            }
            if attempt < self.options.max_attempts {
                tokio::time::sleep(self.options.retry_delay).await;
            }
        }
        None
    }

    /// Performs a single blocking read.
    ///
    /// The data phase takes about 4ms of busy-waiting; the OS scheduler can still
    /// interrupt it, which is why [`Dht11::read_retry`] exists.
    pub fn read(&mut self) -> Result<Dht11Response, Error> {
        self.pin.set_low();
        thread::sleep(START_PULSE);
        self.pin.set_high();

        self.pin.set_mode(Mode::Input);
        let pulses = self.receive_pulses();
        self.pin.set_mode(Mode::Output);
        self.pin.set_high();

        let bytes = decode_pulses(&pulses?)?;
        let response = Dht11Response::from_raw_bytes(bytes);
        if !response.is_valid() {
            return Err(Error::BadData);
        }
        Ok(response)
    }

    fn receive_pulses(&self) -> Result<[u32; DATA_BITS], Error> {
        // Ack: the sensor pulls low, then high, for ~80us each.
        self.wait_while(Level::High).map_err(|_| Error::NoResponse)?;
        self.wait_while(Level::Low).map_err(|_| Error::NoResponse)?;
        self.wait_while(Level::High).map_err(|_| Error::NoResponse)?;

        let mut pulses = [0u32; DATA_BITS];
        for pulse in pulses.iter_mut() {
            self.wait_while(Level::Low)?;
            *pulse = self.wait_while(Level::High)?;
        }
        Ok(pulses)
    }

    /// Busy-waits until the line leaves `level`, returning the elapsed microseconds.
    fn wait_while(&self, level: Level) -> Result<u32, Error> {
        let start = Instant::now();
        while self.pin.read() == level {
            if start.elapsed() > LEVEL_TIMEOUT {
                return Err(Error::Timeout);
            }
        }
        Ok(start.elapsed().as_micros() as u32)
    }
}

/// Turns 40 high-pulse lengths into the four data bytes, checking the parity byte.
pub fn decode_pulses(pulses: &[u32; DATA_BITS]) -> Result<[u8; 4], Error> {
    let mut bytes = [0u8; 5];
    for (i, pulse) in pulses.iter().enumerate() {
        bytes[i / 8] <<= 1;
        if *pulse > ONE_BIT_THRESHOLD_US {
            bytes[i / 8] |= 1;
        }
    }

    // The last 8 bits should match the low byte of the sum.
    let sum = bytes[..4].iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
    if sum != bytes[4] {
        return Err(Error::BadData);
    }
    Ok([bytes[0], bytes[1], bytes[2], bytes[3]])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pulses_for(bytes: [u8; 5]) -> [u32; DATA_BITS] {
        let mut pulses = [0u32; DATA_BITS];
        for (i, pulse) in pulses.iter_mut().enumerate() {
            let bit = (bytes[i / 8] >> (7 - i % 8)) & 1;
            *pulse = if bit == 1 { 70 } else { 27 };
        }
        pulses
    }

    #[test]
    fn decodes_valid_frame() {
        let pulses = pulses_for([32, 1, 21, 3, 57]);
        assert_eq!(decode_pulses(&pulses), Ok([32, 1, 21, 3]));
    }

    #[test]
    fn rejects_bad_checksum() {
        let pulses = pulses_for([32, 1, 21, 3, 58]);
        assert_eq!(decode_pulses(&pulses), Err(Error::BadData));
    }

    #[test]
    fn checksum_wraps() {
        let pulses = pulses_for([200, 0, 100, 0, 44]);
        assert_eq!(decode_pulses(&pulses), Ok([200, 0, 100, 0]));
    }

    #[test]
    fn response_converts_decimals() {
        let response = Dht11Response::from_raw_bytes([32, 1, 21, 3]);
        assert!((response.get_humidity() - 32.1).abs() < 1e-9);
        assert!((response.get_temperature() - 21.3).abs() < 1e-9);
        assert!(response.is_valid());
    }

    #[test]
    fn response_out_of_range_is_invalid() {
        assert!(!Dht11Response::from_raw_bytes([101, 0, 20, 0]).is_valid());
        assert!(!Dht11Response::from_raw_bytes([50, 0, 76, 0]).is_valid());
        assert!(!Dht11Response::from_raw_bytes([50, 10, 20, 0]).is_valid());
    }
}
