//! Interface for the i.MX8M GPIO controller.
//!
//! memgpio controls the GPIO controller by directly accessing its registers
//! through `/dev/mem`. The controller has five ports of 32 pins each. Pins are
//! numbered consecutively across ports, so pin `n` is bit `n % 32` of port
//! `n / 32` (GPIO1_IO00 is pin 0, GPIO2_IO01 is pin 33).
//!
//! ## Operations
//!
//! Every call to [`Gpio::read`] or [`Gpio::write`] is self-contained: the pin
//! number is validated, the owning port's register block is mapped, a single
//! read or read-modify-write is performed, and the block is unmapped again
//! before the call returns. Nothing is cached between calls.
//!
//! [`Gpio::write`] first configures the pin as an output by setting its bit in
//! the direction register, and then sets or clears its bit in the data register.
//! [`Gpio::read`] reports the pin's bit in the data register and leaves its
//! direction untouched.
//!
//! ## Concurrent access
//!
//! The register updates are not atomic. Other processes, kernel drivers and the
//! hardware can change the same registers at any time, and such a change can be
//! silently overwritten. Cooperating memgpio processes can serialize their
//! accesses with [`Config::set_lock`], but that doesn't protect against anyone
//! else. If that matters, serialize access to the GPIO controller externally.
//!
//! ## Examples
//!
//! ```no_run
//! use memgpio::config::Config;
//! use memgpio::gpio::{Gpio, Level};
//!
//! # fn main() -> memgpio::gpio::Result<()> {
//! let gpio = Gpio::new(Config::default());
//!
//! gpio.write(33, Level::High)?;
//! assert_eq!(gpio.read(33)?, Level::High);
//! # Ok(())
//! # }
//! ```
//!
//! ## Troubleshooting
//!
//! ### Permission denied
//!
//! `/dev/mem` is normally only accessible to root. Run the program with `sudo`.
//!
//! ### Operation not permitted
//!
//! Kernels built with `CONFIG_STRICT_DEVMEM` or `CONFIG_IO_STRICT_DEVMEM` refuse
//! to map device memory that's claimed by a driver, which fails with
//! [`Error::Map`]. Unbind the GPIO driver or boot with `iomem=relaxed`.
//!
//! [`Config::set_lock`]: crate::config::Config::set_lock

use std::fmt;
use std::io;
use std::ops::Not;
use std::path::PathBuf;
use std::result;

use thiserror::Error;
use tracing::debug;

mod address;
#[cfg(feature = "hal")]
mod hal;
mod mem;
pub mod registers;

use crate::config::{Config, PortAddressTable};

pub use self::address::{resolve, PinAddress};
pub use self::mem::{DevMem, GpioMem, Mapper};
pub use self::registers::{Direction, GpioRegisters, Register};

/// Errors that can occur when accessing the GPIO controller.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid GPIO pin number.
    ///
    /// The GPIO controller doesn't have a pin with the specified number.
    /// Valid pins are `0..`[`TOTAL_PINS`](crate::config::TOTAL_PINS).
    #[error("invalid GPIO pin number {0}")]
    InvalidPin(u32),
    /// The physical memory access device couldn't be opened for read/write access.
    ///
    /// `/dev/mem` usually requires superuser privileges.
    #[error("can't open {}: {source}", .path.display())]
    DeviceOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The port's register block couldn't be mapped.
    #[error("can't map register block at {base:#010x}: {source}")]
    Map {
        base: u64,
        #[source]
        source: io::Error,
    },
    /// The advisory lock on the device couldn't be acquired.
    #[error("can't lock {}: {source}", .path.display())]
    Lock {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Returns the process exit status associated with the error.
    ///
    /// Status `2` is reserved for command line usage errors.
    pub fn exit_code(&self) -> i32 {
        match *self {
            Error::InvalidPin(_) => 3,
            Error::DeviceOpen { .. } => 4,
            Error::Map { .. } => 5,
            Error::Lock { .. } => 6,
        }
    }
}

/// Result type returned from methods that can have `memgpio::gpio::Error`s.
pub type Result<T> = result::Result<T, Error>;

/// Pin logic levels.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
#[repr(u8)]
pub enum Level {
    Low = 0,
    High = 1,
}

impl From<bool> for Level {
    fn from(e: bool) -> Level {
        if e {
            Level::High
        } else {
            Level::Low
        }
    }
}

impl From<i64> for Level {
    fn from(value: i64) -> Level {
        Level::from(value != 0)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Level::Low => write!(f, "Low"),
            Level::High => write!(f, "High"),
        }
    }
}

impl Not for Level {
    type Output = Level;

    fn not(self) -> Level {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }
}

/// Operation modes.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Mode {
    /// Report the pin's current logic level.
    Read,
    /// Configure the pin as an output and drive it to the specified level.
    Write(Level),
}

impl From<Option<i64>> for Mode {
    fn from(value: Option<i64>) -> Mode {
        match value {
            Some(value) => Mode::Write(Level::from(value)),
            None => Mode::Read,
        }
    }
}

/// Outcome of a completed operation.
///
/// Displays as `gpio <pin>=<bit>`.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Status {
    /// The pin was read.
    Read { pin: u32, level: Level },
    /// The pin was driven.
    Written { pin: u32, level: Level },
}

impl Status {
    /// Returns the pin number.
    pub fn pin(&self) -> u32 {
        match *self {
            Status::Read { pin, .. } | Status::Written { pin, .. } => pin,
        }
    }

    /// Returns the level that was read or written.
    pub fn level(&self) -> Level {
        match *self {
            Status::Read { level, .. } | Status::Written { level, .. } => level,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gpio {}={}", self.pin(), self.level() as u8)
    }
}

/// Provides access to the GPIO controller.
///
/// `Gpio` holds no mapping between calls. Each operation maps the register
/// block it needs through `M`, and releases it before returning.
#[derive(Debug)]
pub struct Gpio<M: Mapper = DevMem> {
    ports: PortAddressTable,
    mapper: M,
}

impl Gpio<DevMem> {
    /// Constructs a new `Gpio` that maps registers through the configured device.
    ///
    /// No device is opened until the first operation.
    pub fn new(config: Config) -> Gpio<DevMem> {
        Gpio {
            ports: *config.ports(),
            mapper: DevMem::new(config.device(), config.lock()),
        }
    }
}

impl<M: Mapper> Gpio<M> {
    /// Constructs a new `Gpio` that maps registers through `mapper`.
    pub fn with_mapper(ports: PortAddressTable, mapper: M) -> Gpio<M> {
        Gpio { ports, mapper }
    }

    /// Returns the port address table.
    pub fn ports(&self) -> &PortAddressTable {
        &self.ports
    }

    /// Returns the mapper.
    pub fn mapper(&self) -> &M {
        &self.mapper
    }

    /// Returns a handle to `pin`.
    ///
    /// Returns `Err(`[`Error::InvalidPin`]`)` if the pin doesn't exist.
    pub fn get(&self, pin: u32) -> Result<Pin<'_, M>> {
        resolve(pin, &self.ports)?;

        Ok(Pin { gpio: self, pin })
    }

    /// Performs a single read or write operation on `pin`.
    pub fn run(&self, pin: u32, mode: Mode) -> Result<Status> {
        debug!(pin, ?mode, "starting operation");

        self.with_registers(pin, |regs, offset| match mode {
            Mode::Read => Status::Read {
                pin,
                level: registers::level(regs, offset),
            },
            Mode::Write(level) => {
                registers::drive(regs, offset, level);
                Status::Written { pin, level }
            }
        })
    }

    /// Returns the logic level of `pin` as stored in the data register.
    pub fn read(&self, pin: u32) -> Result<Level> {
        self.run(pin, Mode::Read).map(|status| status.level())
    }

    /// Configures `pin` as an output and drives it to `level`.
    pub fn write(&self, pin: u32, level: Level) -> Result<()> {
        self.run(pin, Mode::Write(level)).map(|_| ())
    }

    /// Returns the direction `pin` is configured for.
    pub fn direction(&self, pin: u32) -> Result<Direction> {
        self.with_registers(pin, |regs, offset| registers::direction(regs, offset))
    }

    /// Returns the level reported by the pad status register for `pin`.
    pub fn pad_status(&self, pin: u32) -> Result<Level> {
        self.with_registers(pin, |regs, offset| registers::pad_status(regs, offset))
    }

    fn with_registers<T, F>(&self, pin: u32, f: F) -> Result<T>
    where
        F: FnOnce(&M::Registers, u32) -> T,
    {
        // Validate before touching any hardware
        let address = resolve(pin, &self.ports)?;
        let regs = self.mapper.map(address.base())?;

        let value = f(&regs, address.offset());

        // Unmap before reporting the result
        drop(regs);

        Ok(value)
    }
}

/// A single GPIO pin.
///
/// Every method performs a complete operation through the owning [`Gpio`].
#[derive(Debug)]
pub struct Pin<'a, M: Mapper = DevMem> {
    gpio: &'a Gpio<M>,
    pin: u32,
}

impl<M: Mapper> Pin<'_, M> {
    /// Returns the pin number.
    pub fn pin(&self) -> u32 {
        self.pin
    }

    /// Reads the pin's logic level.
    pub fn read(&self) -> Result<Level> {
        self.gpio.read(self.pin)
    }

    /// Drives the pin to `level`.
    pub fn write(&self, level: Level) -> Result<()> {
        self.gpio.write(self.pin, level)
    }

    /// Drives the pin high.
    pub fn set_high(&self) -> Result<()> {
        self.write(Level::High)
    }

    /// Drives the pin low.
    pub fn set_low(&self) -> Result<()> {
        self.write(Level::Low)
    }

    /// Returns the pin's direction.
    pub fn direction(&self) -> Result<Direction> {
        self.gpio.direction(self.pin)
    }
}
