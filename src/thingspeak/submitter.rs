/// Report submission with bounded retry
use log::{error, info, warn};
use std::str::FromStr;
use std::time::Duration;
use tokio::time::sleep;

use super::transport::Transport;
use crate::config::PollerConfig;
use crate::models::TelemetryReport;

const BACKOFF_BASE_SECS: u64 = 9;
const BACKOFF_RATE: u64 = 10;

/// How long to wait between delivery attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackoffPolicy {
    /// `9 + (10 XOR attempt)` seconds: 19, 20, 17, 18, ...
    ///
    /// Matches the timing the poller has always had in the field.
    #[default]
    Literal,
    /// `9 + 10^attempt` seconds: 10, 19, 109, ...
    Exponential,
}

impl BackoffPolicy {
    /// Delay after the failed attempt with zero-based index `attempt`
    pub fn delay(&self, attempt: u32) -> Duration {
        let extra = match self {
            BackoffPolicy::Literal => BACKOFF_RATE ^ attempt as u64,
            BackoffPolicy::Exponential => BACKOFF_RATE.saturating_pow(attempt),
        };
        Duration::from_secs(BACKOFF_BASE_SECS.saturating_add(extra))
    }
}

impl FromStr for BackoffPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "literal" => Ok(BackoffPolicy::Literal),
            "exponential" => Ok(BackoffPolicy::Exponential),
            other => Err(format!(
                "Unknown RETRY_BACKOFF '{}' (expected 'literal' or 'exponential')",
                other
            )),
        }
    }
}

/// What became of a submitted report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The endpoint answered 200 on attempt number `attempts`
    Delivered { attempts: u32 },
    /// Every attempt failed; the report is gone
    Dropped { attempts: u32 },
}

impl SubmitOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, SubmitOutcome::Delivered { .. })
    }
}

/// Form body for a ThingSpeak channel update
///
/// Fields 1-6 are temperature, humidity and the four soil sensors. A missing
/// weather value is sent as an empty field.
pub fn form_fields(api_key: &str, report: &TelemetryReport) -> Vec<(&'static str, String)> {
    let optional = |value: Option<f64>| value.map(|v| v.to_string()).unwrap_or_default();

    vec![
        ("key", api_key.to_string()),
        ("field1", optional(report.temperature)),
        ("field2", optional(report.humidity)),
        ("field3", report.soil[0].to_string()),
        ("field4", report.soil[1].to_string()),
        ("field5", report.soil[2].to_string()),
        ("field6", report.soil[3].to_string()),
    ]
}

/// Posts reports through a [`Transport`], retrying failed attempts
#[derive(Debug, Clone)]
pub struct Submitter<T> {
    transport: T,
    api_key: String,
    tries: u32,
    backoff: BackoffPolicy,
}

impl<T: Transport> Submitter<T> {
    pub fn new(transport: T, api_key: &str, tries: u32, backoff: BackoffPolicy) -> Self {
        Submitter {
            transport,
            api_key: api_key.to_string(),
            tries: tries.max(1),
            backoff,
        }
    }

    pub fn from_config(transport: T, config: &PollerConfig) -> Self {
        Self::new(transport, &config.api_key, config.http_tries, config.backoff)
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Attempt delivery until the endpoint answers 200 or the tries run out.
    ///
    /// A transport error and a non-200 status both count as a failed attempt.
    /// The wait between attempts comes from the [`BackoffPolicy`]; there is no
    /// wait after the last one. A report that never gets through is logged and
    /// dropped, nothing is queued for later.
    pub async fn submit(&self, report: &TelemetryReport) -> SubmitOutcome {
        let form = form_fields(&self.api_key, report);

        for attempt in 0..self.tries {
            info!("  About to post to ThingSpeak (attempt {})", attempt + 1);

            match self.transport.post_form(&form).await {
                Ok(200) => {
                    return SubmitOutcome::Delivered {
                        attempts: attempt + 1,
                    }
                }
                Ok(status) => warn!("ThingSpeak rejected the update with status {}", status),
                Err(e) => error!("Connection to ThingSpeak failed: {}", e),
            }

            if attempt + 1 < self.tries {
                let delay = self.backoff.delay(attempt);
                info!("  Retrying in {} seconds", delay.as_secs());
                sleep(delay).await;
            }
        }

        warn!(
            "Giving up on ThingSpeak after {} attempts, report dropped",
            self.tries
        );
        SubmitOutcome::Dropped {
            attempts: self.tries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WeatherReading;

    #[test]
    fn literal_backoff_uses_xor() {
        let delays: Vec<u64> = (0..4)
            .map(|i| BackoffPolicy::Literal.delay(i).as_secs())
            .collect();
        assert_eq!(delays, vec![19, 20, 17, 18]);
    }

    #[test]
    fn exponential_backoff_uses_powers_of_ten() {
        let delays: Vec<u64> = (0..3)
            .map(|i| BackoffPolicy::Exponential.delay(i).as_secs())
            .collect();
        assert_eq!(delays, vec![10, 19, 109]);
    }

    #[test]
    fn exponential_backoff_saturates() {
        assert_eq!(
            BackoffPolicy::Exponential.delay(40),
            Duration::from_secs(u64::MAX)
        );
    }

    #[test]
    fn parses_policy_names() {
        assert_eq!("literal".parse::<BackoffPolicy>(), Ok(BackoffPolicy::Literal));
        assert_eq!(" Exponential ".parse::<BackoffPolicy>(), Ok(BackoffPolicy::Exponential));
        assert!("linear".parse::<BackoffPolicy>().is_err());
    }

    #[test]
    fn form_fields_in_channel_order() {
        let report = TelemetryReport::new(
            WeatherReading::new(32.1, 69.3),
            [500.0, 480.5, 12.0, 1000.25],
        );

        assert_eq!(
            form_fields("SECRET", &report),
            vec![
                ("key", "SECRET".to_string()),
                ("field1", "69.3".to_string()),
                ("field2", "32.1".to_string()),
                ("field3", "500".to_string()),
                ("field4", "480.5".to_string()),
                ("field5", "12".to_string()),
                ("field6", "1000.25".to_string()),
            ]
        );
    }

    #[test]
    fn form_fields_leave_missing_weather_empty() {
        let report = TelemetryReport::new(WeatherReading::MISSING, [1.0; 4]);
        let form = form_fields("SECRET", &report);

        assert_eq!(form[1], ("field1", String::new()));
        assert_eq!(form[2], ("field2", String::new()));
    }
}
