/// Number of soil moisture sensors behind the selector multiplexer
pub const SOIL_SENSORS: usize = 4;

/// Humidity and temperature as returned by the weather sensor driver.
///
/// Both values are `None` when the driver exhausted its retries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeatherReading {
    pub humidity: Option<f64>,
    pub temperature: Option<f64>,
}

impl WeatherReading {
    pub const MISSING: WeatherReading = WeatherReading {
        humidity: None,
        temperature: None,
    };

    pub fn new(humidity: f64, temperature: f64) -> Self {
        WeatherReading {
            humidity: Some(humidity),
            temperature: Some(temperature),
        }
    }

    pub fn is_missing(&self) -> bool {
        self.humidity.is_none() || self.temperature.is_none()
    }
}

/// One poll cycle worth of readings, uploaded as a single update
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryReport {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub soil: [f64; SOIL_SENSORS],
}

impl TelemetryReport {
    pub fn new(weather: WeatherReading, soil: [f64; SOIL_SENSORS]) -> Self {
        TelemetryReport {
            temperature: weather.temperature,
            humidity: weather.humidity,
            soil,
        }
    }
}
