use log::debug;

use super::{Adc, AdcChannel, SensorSelector, WeatherSensor};
use crate::models::WeatherReading;

pub const STUB_SOIL_READING: u16 = 500;
pub const STUB_HUMIDITY: f64 = 32.1;
pub const STUB_TEMPERATURE: f64 = 69.3;

/// Fixed readings for dry runs on a machine without the sensors attached.
#[derive(Debug, Clone, Default)]
pub struct StubHardware;

impl Adc for StubHardware {
    fn read(&mut self, channel: AdcChannel) -> Result<u16, Box<dyn std::error::Error>> {
        debug!("Stub ADC read on {:?}", channel);
        Ok(STUB_SOIL_READING)
    }
}

impl SensorSelector for StubHardware {
    fn select_lines(&mut self, low: bool, high: bool) -> Result<(), Box<dyn std::error::Error>> {
        debug!("Stub selector set to low={} high={}", low, high);
        Ok(())
    }
}

impl WeatherSensor for StubHardware {
    async fn read_weather(&mut self) -> WeatherReading {
        WeatherReading::new(STUB_HUMIDITY, STUB_TEMPERATURE)
    }
}
