use log::{info, warn};
use rppal::gpio::{Gpio, Level, Mode, OutputPin};
use rppal::spi::{Bus, Mode as SpiMode, SlaveSelect, Spi};

use super::dht11::{self, Dht11};
use super::mcp3002::{self, Mcp3002};
use super::{Adc, AdcChannel, SensorSelector, WeatherSensor};
use crate::config::PollerConfig;
use crate::models::WeatherReading;

/// Peripherals of the garden Pi, owned for the length of one poll.
///
/// Every field releases its pin or bus when dropped, so a failure part-way through
/// [`RpiHardware::new`] hands back whatever was already claimed.
#[derive(Debug)]
pub struct RpiHardware {
    adc: Mcp3002<Spi>,
    selector: [OutputPin; 2],
    dht: Dht11,
}

impl RpiHardware {
    pub fn new(config: &PollerConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let spi = Spi::new(
            Bus::Spi0,
            SlaveSelect::Ss0,
            mcp3002::MAX_CLOCK_AT_2_7V,
            SpiMode::Mode0,
        )?;
        let gpio = Gpio::new()?;

        let low = gpio.get(config.selector_pins[0])?.into_output_low();
        let high = gpio.get(config.selector_pins[1])?.into_output_low();
        let weather = gpio.get(config.weather_pin)?.into_io(Mode::Output);

        info!(
            "Hardware ready: SPI0/CE0, selector pins {:?}, DHT11 on GPIO{}",
            config.selector_pins, config.weather_pin
        );

        Ok(RpiHardware {
            adc: Mcp3002::new(spi),
            selector: [low, high],
            dht: Dht11::new(weather, dht11::DEFAULT_OPTIONS),
        })
    }
}

impl Adc for RpiHardware {
    fn read(&mut self, channel: AdcChannel) -> Result<u16, Box<dyn std::error::Error>> {
        Ok(self.adc.read(channel)?)
    }
}

impl SensorSelector for RpiHardware {
    fn select_lines(&mut self, low: bool, high: bool) -> Result<(), Box<dyn std::error::Error>> {
        for (pin, on) in self.selector.iter_mut().zip([low, high]) {
            pin.write(if on { Level::High } else { Level::Low });
        }
        Ok(())
    }
}

impl WeatherSensor for RpiHardware {
    async fn read_weather(&mut self) -> WeatherReading {
        match self.dht.read_retry().await {
            Some(response) => {
                WeatherReading::new(response.get_humidity(), response.get_temperature())
            }
            None => {
                warn!("DHT11 gave up after all attempts, reporting no weather data");
                WeatherReading::MISSING
            }
        }
    }
}
