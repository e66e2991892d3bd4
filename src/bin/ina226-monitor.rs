use ina226::config::JsonFileConfig;
use ina226::publish::JsonLinesPublisher;
use ina226::{INA226Driver, Scheduler};
use linux_embedded_hal::{Delay, I2cdev};
use log::{error, info};
use std::error::Error;
use std::io;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

const DEFAULT_I2C_DEVICE: &str = "/dev/i2c-1";
const DEFAULT_CONFIG_PATH: &str = "config.json";

// usage: ina226-monitor [I2C_DEVICE] [CONFIG_JSON]
fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let mut args = std::env::args().skip(1);
    let device = args.next().unwrap_or_else(|| DEFAULT_I2C_DEVICE.to_owned());
    let config_path = args.next().unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_owned());

    info!(
        "ina226-monitor {} starting on {} (config {})",
        env!("CARGO_PKG_VERSION"),
        device,
        config_path
    );

    let running = Arc::new(AtomicBool::new(true));
    let handler_flag = Arc::clone(&running);
    ctrlc::set_handler(move || {
        info!("Termination requested, stopping at next tick boundary");
        handler_flag.store(false, Ordering::SeqCst);
    })?;

    let i2c = I2cdev::new(&device)?;
    let driver = INA226Driver::new(i2c)?;
    info!("INA226 initialized at 0x{:02X}", driver.address());

    let mut scheduler = Scheduler::new(
        driver,
        JsonFileConfig::new(config_path),
        JsonLinesPublisher::new(io::stdout()),
        Delay,
    );
    scheduler.run_while(|| running.load(Ordering::SeqCst))?;

    // Dropping the scheduler closes the bus.
    info!("Stopped");
    Ok(())
}
