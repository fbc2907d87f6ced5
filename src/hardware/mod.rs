//! Capability interface for the poller's peripherals.
//!
//! [`RpiHardware`] drives the real MCP3002, selector pins and DHT11;
//! [`StubHardware`] returns fixed readings for dry runs. One of the two is
//! chosen at startup and handed to the poller.
pub mod dht11;
pub mod mcp3002;
pub mod rpi;
pub mod stub;

pub use mcp3002::AdcChannel;
pub use rpi::RpiHardware;
pub use stub::StubHardware;

use crate::models::WeatherReading;

/// Raw access to the analog-to-digital converter
pub trait Adc {
    fn read(&mut self, channel: AdcChannel) -> Result<u16, Box<dyn std::error::Error>>;
}

/// The two binary selector lines that route one soil sensor to the ADC
pub trait SensorSelector {
    fn select_lines(&mut self, low: bool, high: bool) -> Result<(), Box<dyn std::error::Error>>;
}

/// Humidity/temperature sensor with driver-internal retry
#[allow(async_fn_in_trait)]
pub trait WeatherSensor {
    /// Returns [`WeatherReading::MISSING`] when the driver gives up.
    async fn read_weather(&mut self) -> WeatherReading;
}

/// Everything one poll cycle needs
pub trait Hardware: Adc + SensorSelector + WeatherSensor {}

impl<T: Adc + SensorSelector + WeatherSensor> Hardware for T {}
