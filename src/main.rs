use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing::debug;

use memgpio::config::{Config, PATH_DEV_MEM};
use memgpio::gpio::{Gpio, Mode, Status};
use memgpio::logging;

/// Read or drive a single i.MX8M GPIO pin through /dev/mem.
///
/// Without VALUE, prints the pin's current level as `gpio <PIN>=<0|1>`.
/// With VALUE, configures the pin as an output and drives it low (0) or
/// high (any other value).
#[derive(Parser, Debug)]
#[command(name = "memgpio", version)]
struct Cli {
    /// GPIO pin number (port * 32 + bit)
    pin: u32,
    /// Level to drive the pin to
    #[arg(allow_negative_numbers = true)]
    value: Option<i64>,
    /// Physical memory access device
    #[arg(long, env = "MEMGPIO_DEVICE", default_value = PATH_DEV_MEM)]
    device: PathBuf,
    /// Hold an exclusive advisory lock on the device while accessing registers
    #[arg(long, env = "MEMGPIO_LOCK")]
    lock: bool,
}

impl Cli {
    fn config(&self) -> Config {
        Config::new()
            .set_device(&self.device)
            .set_lock(self.lock)
    }
}

fn main() {
    if let Err(e) = logging::init() {
        eprintln!("Error: Can't initialize logging ({})", e);
        process::exit(1);
    }

    let cli = Cli::parse();
    let gpio = Gpio::new(cli.config());

    match gpio.run(cli.pin, Mode::from(cli.value)) {
        Ok(status @ Status::Read { .. }) => println!("{}", status),
        Ok(Status::Written { .. }) => {}
        Err(e) => {
            debug!(pin = cli.pin, error = ?e, "operation failed");
            eprintln!("Error: {}", e);
            process::exit(e.exit_code());
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use clap::error::ErrorKind;

    use super::*;

    #[test]
    fn read_mode() {
        let cli = Cli::try_parse_from(["memgpio", "0"]).unwrap();

        assert_eq!(cli.pin, 0);
        assert_eq!(Mode::from(cli.value), Mode::Read);
    }

    #[test]
    fn write_mode() {
        let cli = Cli::try_parse_from(["memgpio", "33", "1"]).unwrap();

        assert_eq!(cli.pin, 33);
        assert_eq!(cli.value, Some(1));
        assert!(matches!(Mode::from(cli.value), Mode::Write(_)));
    }

    #[test]
    fn negative_value() {
        let cli = Cli::try_parse_from(["memgpio", "5", "-1"]).unwrap();

        assert_eq!(cli.value, Some(-1));
    }

    #[test]
    fn missing_pin_is_usage_error() {
        let err = Cli::try_parse_from(["memgpio"]).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn non_numeric_pin() {
        let err = Cli::try_parse_from(["memgpio", "abc"]).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }

    #[test]
    fn device_and_lock() {
        let cli =
            Cli::try_parse_from(["memgpio", "--device", "/tmp/mem", "--lock", "7"]).unwrap();
        let config = cli.config();

        assert_eq!(config.device(), Path::new("/tmp/mem"));
        assert!(config.lock());
    }

    #[test]
    fn invalid_pin_exit_code() {
        let gpio = Gpio::new(Config::new().set_device("/nonexistent/memgpio"));

        let err = gpio.run(200, Mode::Read).unwrap_err();

        assert_eq!(err.exit_code(), 3);
        assert_eq!(err.to_string(), "invalid GPIO pin number 200");
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
