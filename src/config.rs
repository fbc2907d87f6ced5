use log::{debug, info};
use std::env;
use url::Url;

use crate::sampling::SamplingConfig;
use crate::thingspeak::BackoffPolicy;

const DEFAULT_THINGSPEAK_URL: &str = "http://api.thingspeak.com/update";
const DEFAULT_SELECTOR_PINS: [u8; 2] = [23, 24];
const DEFAULT_WEATHER_PIN: u8 = 25;
const DEFAULT_SENSOR_READINGS: usize = 9;
const DEFAULT_HTTP_TRIES: u32 = 4;

const DEFAULT_LED_PINS: [u8; 3] = [23, 24, 25];
const DEFAULT_PWM_FREQUENCY: f64 = 100.0;

/// Flag that swaps the hardware for fixed stub readings
pub const DRY_RUN_FLAG: &str = "-n";

/// Settings for one run of the soil/weather poller
#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub api_key: String,
    pub endpoint: Url,
    /// Low bit first, then high bit
    pub selector_pins: [u8; 2],
    pub weather_pin: u8,
    pub sensor_readings: usize,
    pub http_tries: u32,
    pub backoff: BackoffPolicy,
    pub dry_run: bool,
}

impl PollerConfig {
    pub fn new(dry_run: bool) -> Result<Self, Box<dyn std::error::Error>> {
        // Load environment variables
        dotenv::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok(), dry_run)
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// `new` uses the process environment; tests pass a closure over a map.
    pub fn from_lookup<F>(lookup: F, dry_run: bool) -> Result<Self, Box<dyn std::error::Error>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("THINGSPEAK_API_KEY")
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or("THINGSPEAK_API_KEY environment variable not set")?;

        let endpoint = match lookup("THINGSPEAK_URL") {
            Some(raw) => Url::parse(raw.trim())
                .map_err(|e| format!("Invalid THINGSPEAK_URL '{}': {}", raw, e))?,
            None => Url::parse(DEFAULT_THINGSPEAK_URL)?,
        };
        // The HTTP client is built without TLS
        if endpoint.scheme() != "http" {
            return Err(format!(
                "THINGSPEAK_URL must use http://, got '{}'",
                endpoint
            )
            .into());
        }

        let selector_pins = match lookup("SENSOR_SELECTOR_PINS") {
            Some(raw) => {
                let pins = parse_pins(&raw)?;
                <[u8; 2]>::try_from(pins.as_slice()).map_err(|_| {
                    format!(
                        "SENSOR_SELECTOR_PINS needs exactly 2 pins, got '{}'",
                        raw
                    )
                })?
            }
            None => DEFAULT_SELECTOR_PINS,
        };

        let weather_pin = parse_or(&lookup, "WEATHER_PIN", DEFAULT_WEATHER_PIN)?;

        let sensor_readings = parse_or(&lookup, "SENSOR_READINGS", DEFAULT_SENSOR_READINGS)?;
        if sensor_readings < 3 {
            return Err(format!(
                "SENSOR_READINGS must be at least 3 to trim the extremes, got {}",
                sensor_readings
            )
            .into());
        }

        let http_tries = parse_or(&lookup, "HTTP_TRIES", DEFAULT_HTTP_TRIES)?;
        if http_tries == 0 {
            return Err("HTTP_TRIES must be at least 1".into());
        }

        let backoff = match lookup("RETRY_BACKOFF") {
            Some(raw) => raw.parse::<BackoffPolicy>()?,
            None => BackoffPolicy::default(),
        };

        let config = PollerConfig {
            api_key,
            endpoint,
            selector_pins,
            weather_pin,
            sensor_readings,
            http_tries,
            backoff,
            dry_run,
        };

        info!(
            "Poller configured: endpoint={}, selector pins={:?}, weather pin={}, readings={}, tries={}, backoff={:?}",
            config.endpoint,
            config.selector_pins,
            config.weather_pin,
            config.sensor_readings,
            config.http_tries,
            config.backoff
        );

        Ok(config)
    }

    pub fn sampling(&self) -> SamplingConfig {
        SamplingConfig {
            readings: self.sensor_readings,
            ..SamplingConfig::default()
        }
    }
}

/// Settings for the LED glow animator
#[derive(Debug, Clone)]
pub struct GlowConfig {
    /// Red, green and blue pins in that order
    pub led_pins: [u8; 3],
    pub pwm_frequency: f64,
}

impl GlowConfig {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        dotenv::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, Box<dyn std::error::Error>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let led_pins = match lookup("LED_PINS") {
            Some(raw) => {
                let pins = parse_pins(&raw)?;
                <[u8; 3]>::try_from(pins.as_slice())
                    .map_err(|_| format!("LED_PINS needs exactly 3 pins, got '{}'", raw))?
            }
            None => DEFAULT_LED_PINS,
        };

        let pwm_frequency = parse_or(&lookup, "PWM_FREQUENCY", DEFAULT_PWM_FREQUENCY)?;
        if !pwm_frequency.is_finite() || pwm_frequency <= 0.0 {
            return Err(format!("PWM_FREQUENCY must be positive, got {}", pwm_frequency).into());
        }

        Ok(GlowConfig {
            led_pins,
            pwm_frequency,
        })
    }
}

/// Scan the command line for the dry-run flag, rejecting anything else
pub fn dry_run_requested<I>(args: I) -> Result<bool, String>
where
    I: IntoIterator<Item = String>,
{
    let mut dry_run = false;
    for arg in args {
        if arg == DRY_RUN_FLAG {
            dry_run = true;
        } else {
            return Err(format!("Unknown argument '{}' (usage: soil [-n])", arg));
        }
    }
    Ok(dry_run)
}

/// Parse a comma separated list of BCM pin numbers, e.g. `23, 24`
fn parse_pins(raw: &str) -> Result<Vec<u8>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|pin| !pin.is_empty())
        .map(|pin| {
            debug!("Processing pin: '{}'", pin);
            pin.parse::<u8>()
                .map_err(|e| format!("Invalid pin number '{}': {}", pin, e))
        })
        .collect()
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, String>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| format!("Invalid {} '{}': {}", key, raw, e)),
        None => Ok(default),
    }
}
