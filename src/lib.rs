//! memgpio reads or drives a single GPIO pin on NXP i.MX8M SoCs by mapping the
//! GPIO controller's registers through `/dev/mem`, bypassing the kernel's GPIO
//! drivers entirely.
//!
//! Every operation is a single pass: the pin number is resolved to a port
//! register block, one page of physical memory is mapped, the data and
//! direction registers are read or updated, and the mapping is released again.
//!
//! memgpio requires a Linux kernel that exposes `/dev/mem` (no
//! `CONFIG_STRICT_DEVMEM` restriction on the GPIO range) and superuser
//! privileges.

#[macro_use]
mod macros;

pub mod config;
pub mod gpio;
pub mod logging;
