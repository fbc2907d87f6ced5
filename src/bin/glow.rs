use log::{error, info};

use garden_pi::config::GlowConfig;
use garden_pi::glow::{animate, LedChannels, RgbLeds};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp_secs()
        .init();

    let config = match GlowConfig::new() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e);
        }
    };

    let mut leds = match RgbLeds::new(config.led_pins, config.pwm_frequency) {
        Ok(leds) => leds,
        Err(e) => {
            error!("Failed to set up LED pins: {}", e);
            return Err(e);
        }
    };
    let mut rng = rand::thread_rng();

    info!("Press CTRL+C to terminate program");

    // Run the animation until it fails or the user interrupts
    let result = tokio::select! {
        result = animate(&mut leds, &mut rng) => result,
        signal = tokio::signal::ctrl_c() => {
            match signal {
                Ok(()) => info!("Program terminated by user. Exiting gracefully."),
                Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
            }
            Ok(())
        }
    };

    if let Err(e) = leds.stop() {
        error!("Failed to stop LED PWM: {}", e);
    }

    if let Err(e) = &result {
        error!("Animation failed: {}", e);
    }
    result
}
