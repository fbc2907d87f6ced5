use log::{error, info};
use std::env;

use garden_pi::config::{self, PollerConfig};
use garden_pi::hardware::{RpiHardware, StubHardware};
use garden_pi::poller::poll_once;
use garden_pi::thingspeak::{HttpTransport, SubmitOutcome, Submitter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp_secs()
        .init();

    let dry_run = match config::dry_run_requested(env::args().skip(1)) {
        Ok(dry_run) => dry_run,
        Err(e) => {
            error!("{}", e);
            return Err(e.into());
        }
    };

    // Load configuration
    let config = match PollerConfig::new(dry_run) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e);
        }
    };

    let submitter = Submitter::from_config(HttpTransport::new(config.endpoint.clone())?, &config);
    let sampling = config.sampling();

    // Hardware is dropped, and its pins and bus released, at the end of each arm
    let result = if config.dry_run {
        info!("Dry run: hardware disabled, using stub readings");
        let mut hardware = StubHardware;
        poll_once(&mut hardware, &submitter, &sampling).await
    } else {
        let mut hardware = match RpiHardware::new(&config) {
            Ok(hardware) => hardware,
            Err(e) => {
                error!("Failed to initialise hardware: {}", e);
                return Err(e);
            }
        };
        poll_once(&mut hardware, &submitter, &sampling).await
    };

    match result {
        Ok((_, SubmitOutcome::Delivered { attempts })) => {
            info!("Report delivered after {} attempt(s)", attempts);
            Ok(())
        }
        // The submitter already logged the drop
        Ok((_, SubmitOutcome::Dropped { .. })) => Ok(()),
        Err(e) => {
            error!("Poll failed: {}", e);
            Err(e)
        }
    }
}
