//! Bit-level access to a port's register block.
//!
//! Each port has three consecutive 32-bit registers. Registers are addressed by
//! byte offset from the start of the block:
//!
//! | Offset | Register   | Access                                  |
//! |--------|------------|-----------------------------------------|
//! | `0x00` | DR         | data, one bit per pin                   |
//! | `0x04` | GDIR       | direction, `1` = output, `0` = input    |
//! | `0x08` | PSR        | pad status, read-only                   |
//!
//! All updates are plain read-modify-write sequences. Nothing prevents another
//! process, a kernel driver or the hardware itself from changing a register
//! between the read and the write, in which case that change is lost.

use std::fmt;

use tracing::trace;

use crate::gpio::Level;

// Each register contains 32 bits
pub(crate) const REG_SIZE: usize = std::mem::size_of::<u32>();

/// Registers within a port's register block.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
#[repr(usize)]
pub enum Register {
    /// Data register.
    Data = 0x00,
    /// Direction register.
    Direction = 0x04,
    /// Pad status register.
    PadStatus = 0x08,
}

impl Register {
    /// Returns the register's byte offset from the start of the block.
    pub const fn offset(self) -> usize {
        self as usize
    }

    /// Returns the register's offset in 32-bit words.
    pub const fn index(self) -> usize {
        self.offset() / REG_SIZE
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Register::Data => write!(f, "DR"),
            Register::Direction => write!(f, "GDIR"),
            Register::PadStatus => write!(f, "PSR"),
        }
    }
}

/// Raw 32-bit access to a single port's register block.
pub trait GpioRegisters {
    fn read(&self, reg: Register) -> u32;
    fn write(&self, reg: Register, value: u32);
}

/// Pin directions, as configured in the direction register.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
#[repr(u8)]
pub enum Direction {
    Input = 0,
    Output = 1,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Direction::Input => write!(f, "In"),
            Direction::Output => write!(f, "Out"),
        }
    }
}

#[inline(always)]
fn bit<R: GpioRegisters + ?Sized>(regs: &R, reg: Register, offset: u32) -> bool {
    let reg_value = regs.read(reg);
    trace!(%reg, value = format_args!("{:#010x}", reg_value), "read");

    (reg_value >> offset) & 0b1 != 0
}

/// Returns the logic level of the pin at bit `offset` in the data register.
pub fn level<R: GpioRegisters + ?Sized>(regs: &R, offset: u32) -> Level {
    Level::from(bit(regs, Register::Data, offset))
}

/// Configures the pin at bit `offset` as an output, and drives it to `level`.
///
/// The direction bit is set before the data bit is updated. Bits belonging to
/// other pins are written back unchanged.
pub fn drive<R: GpioRegisters + ?Sized>(regs: &R, offset: u32, level: Level) {
    let mask = 1u32 << offset;

    let dir = regs.read(Register::Direction);
    regs.write(Register::Direction, dir | mask);
    trace!(
        old = format_args!("{:#010x}", dir),
        new = format_args!("{:#010x}", dir | mask),
        "GDIR"
    );

    let data = regs.read(Register::Data);
    let new_data = match level {
        Level::High => data | mask,
        Level::Low => data & !mask,
    };
    regs.write(Register::Data, new_data);
    trace!(
        old = format_args!("{:#010x}", data),
        new = format_args!("{:#010x}", new_data),
        "DR"
    );
}

/// Returns the direction of the pin at bit `offset`.
pub fn direction<R: GpioRegisters + ?Sized>(regs: &R, offset: u32) -> Direction {
    if bit(regs, Register::Direction, offset) {
        Direction::Output
    } else {
        Direction::Input
    }
}

/// Returns the pad level of the pin at bit `offset` from the pad status register.
pub fn pad_status<R: GpioRegisters + ?Sized>(regs: &R, offset: u32) -> Level {
    Level::from(bit(regs, Register::PadStatus, offset))
}
