/// Soil sensor sampling: multiplexer selection and outlier-trimmed averaging
use log::debug;
use std::time::Duration;
use tokio::time::sleep;

use crate::hardware::{Adc, AdcChannel, SensorSelector};
use crate::models::SOIL_SENSORS;

const SETTLE_TIME: Duration = Duration::from_millis(500);
const READ_INTERVAL: Duration = Duration::from_millis(100);
const SENSOR_READINGS: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingConfig {
    /// Raw reads per sensor, including the two that get trimmed
    pub readings: usize,
    /// Wait after switching the multiplexer before the first read
    pub settle_time: Duration,
    /// Wait after each raw read
    pub read_interval: Duration,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        SamplingConfig {
            readings: SENSOR_READINGS,
            settle_time: SETTLE_TIME,
            read_interval: READ_INTERVAL,
        }
    }
}

/// Average of the samples without one lowest and one highest value
///
/// Samples are scanned in order; the first one equal to the minimum is dropped,
/// then the first one equal to the maximum. Duplicates of either extreme after
/// that are averaged like any other value. Returns `None` when nothing is left
/// to average, which happens with fewer than three samples.
pub fn trimmed_mean(samples: &[u16]) -> Option<f64> {
    let mut value_min = samples.iter().min().copied();
    let mut value_max = samples.iter().max().copied();

    let mut sum = 0u64;
    let mut count = 0u64;
    for &value in samples {
        if Some(value) == value_min {
            value_min = None;
        } else if Some(value) == value_max {
            value_max = None;
        } else {
            sum += value as u64;
            count += 1;
        }
    }

    if count == 0 {
        return None;
    }
    Some(sum as f64 / count as f64)
}

/// Route soil sensor `index` to the ADC and return its trimmed mean
///
/// The sensor index is encoded on the selector lines in binary: the low line
/// carries `index % 2`, the high line `index / 2`. The ADC is always read on
/// channel 0 since the multiplexer sits in front of it.
pub async fn read_soil<H>(
    hardware: &mut H,
    index: usize,
    config: &SamplingConfig,
) -> Result<f64, Box<dyn std::error::Error>>
where
    H: Adc + SensorSelector,
{
    if index >= SOIL_SENSORS {
        return Err(format!(
            "Soil sensor index {} out of range (0-{})",
            index,
            SOIL_SENSORS - 1
        )
        .into());
    }

    hardware.select_lines(index % 2 == 1, index / 2 == 1)?;

    // Allow time for the sensor to settle
    sleep(config.settle_time).await;

    let mut values = Vec::with_capacity(config.readings);
    for reading in 0..config.readings {
        let value = hardware.read(AdcChannel::Zero)?;
        debug!("    Sensor {} reading #{}: {}", index, reading, value);
        values.push(value);
        sleep(config.read_interval).await;
    }

    trimmed_mean(&values).ok_or_else(|| {
        format!(
            "Sensor {}: {} readings are not enough to trim the extremes",
            index, config.readings
        )
        .into()
    })
}
