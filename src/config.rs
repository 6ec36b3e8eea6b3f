//! GPIO controller layout and runtime options.
//!
//! The i.MX8M GPIO controller exposes five ports of 32 pins. Each port has its
//! own register block, which starts at a fixed physical address and fits in a
//! single 4 KiB page. [`PortAddressTable::IMX8M`] holds those addresses and is
//! used unless a different table is supplied through [`Config::set_ports`].

use std::path::{Path, PathBuf};

/// Number of GPIO ports.
pub const PORTS: usize = 5;
/// Number of pins controlled by each port's registers.
pub const PINS_PER_PORT: u32 = 32;
/// Total number of addressable pins. Valid pin numbers are `0..TOTAL_PINS`.
pub const TOTAL_PINS: u32 = PORTS as u32 * PINS_PER_PORT;
/// Size of the mapping created for a single port register block.
pub const PAGE_SIZE: usize = 4096;

/// Default physical memory access device.
pub const PATH_DEV_MEM: &str = "/dev/mem";

/// Physical base address of each port's register block, indexed by port.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct PortAddressTable([u64; PORTS]);

impl PortAddressTable {
    /// GPIO1-GPIO5 on the i.MX8M family.
    pub const IMX8M: PortAddressTable = PortAddressTable([
        0x3020_0000,
        0x3021_0000,
        0x3022_0000,
        0x3023_0000,
        0x3024_0000,
    ]);

    /// Constructs a table from custom base addresses.
    pub const fn new(bases: [u64; PORTS]) -> PortAddressTable {
        PortAddressTable(bases)
    }

    /// Returns the base address for `port`, or `None` if the port doesn't exist.
    pub fn base(&self, port: usize) -> Option<u64> {
        self.0.get(port).copied()
    }

    // Callers validate the pin number first, which bounds `port` below PORTS.
    pub(crate) fn port_base(&self, port: usize) -> u64 {
        self.0[port]
    }

    /// Returns all base addresses in port order.
    pub fn bases(&self) -> &[u64; PORTS] {
        &self.0
    }
}

impl Default for PortAddressTable {
    fn default() -> PortAddressTable {
        PortAddressTable::IMX8M
    }
}

/// Runtime options for [`Gpio`](crate::gpio::Gpio).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    device: PathBuf,
    ports: PortAddressTable,
    lock: bool,
}

impl Config {
    /// Constructs a `Config` with the default device, the i.MX8M address table
    /// and advisory locking disabled.
    pub fn new() -> Config {
        Config {
            device: PathBuf::from(PATH_DEV_MEM),
            ports: PortAddressTable::IMX8M,
            lock: false,
        }
    }

    /// Returns the physical memory access device.
    pub fn device(&self) -> &Path {
        &self.device
    }

    /// Sets the physical memory access device.
    ///
    /// Any file that can be memory-mapped at the configured base addresses can be
    /// used, which is mostly useful for testing.
    pub fn set_device<P: Into<PathBuf>>(mut self, device: P) -> Config {
        self.device = device.into();
        self
    }

    /// Returns the port address table.
    pub fn ports(&self) -> &PortAddressTable {
        &self.ports
    }

    /// Replaces the port address table.
    pub fn set_ports(mut self, ports: PortAddressTable) -> Config {
        self.ports = ports;
        self
    }

    /// Returns `true` if an exclusive advisory lock is taken on the device.
    pub fn lock(&self) -> bool {
        self.lock
    }

    /// Enables or disables the exclusive advisory lock on the device.
    ///
    /// The lock is only honored by other processes that request it as well.
    /// Kernel drivers and other tools accessing the same registers ignore it.
    pub fn set_lock(mut self, lock: bool) -> Config {
        self.lock = lock;
        self
    }
}

impl Default for Config {
    fn default() -> Config {
        Config::new()
    }
}
