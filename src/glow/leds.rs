use log::{info, warn};
use rppal::gpio::{Gpio, OutputPin};

/// Three PWM channels driving the red, green and blue legs of an LED
pub trait LedChannels {
    /// Set each channel's duty cycle, in percent
    fn set_duty_cycles(&mut self, duty: [u8; 3]) -> Result<(), Box<dyn std::error::Error>>;

    /// Turn every channel off and stop the PWM
    fn stop(&mut self) -> Result<(), Box<dyn std::error::Error>>;
}

/// RGB LED on three GPIO pins using rppal's software PWM.
///
/// Channels start at 0% and are stopped again when dropped, so the pins are
/// released on every exit path.
#[derive(Debug)]
pub struct RgbLeds {
    pins: Vec<OutputPin>,
    frequency: f64,
    stopped: bool,
}

impl RgbLeds {
    pub fn new(pins: [u8; 3], frequency: f64) -> Result<Self, Box<dyn std::error::Error>> {
        let gpio = Gpio::new()?;

        let mut outputs = Vec::with_capacity(pins.len());
        for pin in pins {
            let mut output = gpio.get(pin)?.into_output_low();
            output.set_pwm_frequency(frequency, 0.0)?;
            outputs.push(output);
        }

        info!("LED PWM started on GPIO {:?} at {} Hz", pins, frequency);

        Ok(RgbLeds {
            pins: outputs,
            frequency,
            stopped: false,
        })
    }
}

impl LedChannels for RgbLeds {
    fn set_duty_cycles(&mut self, duty: [u8; 3]) -> Result<(), Box<dyn std::error::Error>> {
        for (pin, percent) in self.pins.iter_mut().zip(duty) {
            let fraction = percent.min(super::DUTY_CYCLE) as f64 / 100.0;
            pin.set_pwm_frequency(self.frequency, fraction)?;
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if self.stopped {
            return Ok(());
        }
        for pin in self.pins.iter_mut() {
            pin.clear_pwm()?;
            pin.set_low();
        }
        self.stopped = true;
        Ok(())
    }
}

impl Drop for RgbLeds {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!("Failed to stop LED PWM: {}", e);
        }
    }
}
