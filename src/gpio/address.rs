use tracing::debug;

use crate::config::{PortAddressTable, PINS_PER_PORT, TOTAL_PINS};
use crate::gpio::{Error, Result};

/// Location of a pin's control bit within the GPIO controller.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct PinAddress {
    pin: u32,
    port: usize,
    offset: u32,
    base: u64,
}

impl PinAddress {
    /// Returns the pin number.
    pub fn pin(&self) -> u32 {
        self.pin
    }

    /// Returns the index of the port that owns the pin.
    pub fn port(&self) -> usize {
        self.port
    }

    /// Returns the pin's bit offset within the port's registers (0-31).
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Returns the physical base address of the port's register block.
    pub fn base(&self) -> u64 {
        self.base
    }
}

/// Resolves `pin` to its port, bit offset and register block address.
///
/// Returns `Err(`[`Error::InvalidPin`]`)` for pins at or beyond [`TOTAL_PINS`].
pub fn resolve(pin: u32, ports: &PortAddressTable) -> Result<PinAddress> {
    if pin >= TOTAL_PINS {
        return Err(Error::InvalidPin(pin));
    }

    let port = (pin / PINS_PER_PORT) as usize;
    let offset = pin % PINS_PER_PORT;
    let base = ports.port_base(port);

    debug!(pin, port, offset, base = format_args!("{:#010x}", base), "resolved pin");

    Ok(PinAddress {
        pin,
        port,
        offset,
        base,
    })
}
