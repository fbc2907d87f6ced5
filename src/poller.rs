/// One full poll cycle: weather, soil sensors, upload
use log::{info, warn};
use time::OffsetDateTime;

use crate::hardware::Hardware;
use crate::models::{TelemetryReport, SOIL_SENSORS};
use crate::sampling::{read_soil, SamplingConfig};
use crate::thingspeak::{SubmitOutcome, Submitter, Transport};
use crate::utils::{format_datetime, format_report};

/// Read the weather sensor and then every soil sensor, strictly in order
pub async fn read_report<H: Hardware>(
    hardware: &mut H,
    sampling: &SamplingConfig,
) -> Result<TelemetryReport, Box<dyn std::error::Error>> {
    let weather = hardware.read_weather().await;
    if weather.is_missing() {
        warn!("No weather data this cycle, uploading empty temperature/humidity");
    }

    let mut soil = [0.0; SOIL_SENSORS];
    for (sensor, value) in soil.iter_mut().enumerate() {
        *value = read_soil(hardware, sensor, sampling).await?;
    }

    Ok(TelemetryReport::new(weather, soil))
}

/// Run a single cycle and hand the report to the submitter
///
/// Sensor errors abort the cycle before anything is sent. Upload failures do
/// not: they are retried inside the submitter and come back as the outcome.
pub async fn poll_once<H, T>(
    hardware: &mut H,
    submitter: &Submitter<T>,
    sampling: &SamplingConfig,
) -> Result<(TelemetryReport, SubmitOutcome), Box<dyn std::error::Error>>
where
    H: Hardware,
    T: Transport,
{
    info!(
        "Reading at {}",
        format_datetime(&OffsetDateTime::now_utc())
    );

    let report = read_report(hardware, sampling).await?;
    info!("  {}", format_report(&report));

    let outcome = submitter.submit(&report).await;
    Ok((report, outcome))
}
