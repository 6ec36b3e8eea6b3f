use std::fmt;
use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::ptr;

use libc::{self, c_void, off_t, size_t, LOCK_EX, MAP_FAILED, MAP_SHARED, O_SYNC, PROT_READ, PROT_WRITE};
use tracing::debug;

use crate::config::PAGE_SIZE;
use crate::gpio::registers::{GpioRegisters, Register};
use crate::gpio::{Error, Result};

/// Maps a port's register block into the process address space.
///
/// The returned registers stay mapped until they're dropped.
pub trait Mapper {
    type Registers: GpioRegisters;

    fn map(&self, base: u64) -> Result<Self::Registers>;
}

/// Maps register blocks through a physical memory access device, usually `/dev/mem`.
#[derive(Debug, Clone)]
pub struct DevMem {
    path: PathBuf,
    lock: bool,
}

impl DevMem {
    /// Constructs a new `DevMem` for the device at `path`.
    ///
    /// If `lock` is `true`, an exclusive advisory lock is held on the device
    /// while a register block is mapped.
    pub fn new<P: Into<PathBuf>>(path: P, lock: bool) -> DevMem {
        DevMem {
            path: path.into(),
            lock,
        }
    }

    /// Returns the device path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> Result<File> {
        // Open the device with read/write/sync flags. This fails if the device
        // doesn't exist, or if the current user isn't allowed to access it,
        // which for /dev/mem usually means the process isn't running as root.
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(O_SYNC)
            .open(&self.path)
            .map_err(|source| Error::DeviceOpen {
                path: self.path.clone(),
                source,
            })?;

        debug!(path = %self.path.display(), "opened device");

        if self.lock {
            parse_retval!(unsafe { libc::flock(file.as_raw_fd(), LOCK_EX) }).map_err(
                |source| Error::Lock {
                    path: self.path.clone(),
                    source,
                },
            )?;

            debug!(path = %self.path.display(), "acquired advisory lock");
        }

        Ok(file)
    }
}

impl Default for DevMem {
    fn default() -> DevMem {
        DevMem::new(crate::config::PATH_DEV_MEM, false)
    }
}

impl Mapper for DevMem {
    type Registers = GpioMem;

    fn map(&self, base: u64) -> Result<GpioMem> {
        // Any failure past this point drops `file`, which closes the device.
        let file = self.open()?;

        let offset = checked_offset(base).map_err(|source| Error::Map { base, source })?;

        // Memory-map a single page at the port's base address
        let mem_ptr = unsafe {
            libc::mmap(
                ptr::null_mut(),
                PAGE_SIZE,
                PROT_READ | PROT_WRITE,
                MAP_SHARED,
                file.as_raw_fd(),
                offset,
            )
        };

        if mem_ptr == MAP_FAILED {
            return Err(Error::Map {
                base,
                source: io::Error::last_os_error(),
            });
        }

        debug!(base = format_args!("{:#010x}", base), "mapped register block");

        Ok(GpioMem {
            mem_ptr: mem_ptr as *mut u32,
            base,
            _file: file,
        })
    }
}

// mmap requires the offset to be a multiple of the system page size.
fn checked_offset(base: u64) -> io::Result<off_t> {
    let page_size = match unsafe { libc::sysconf(libc::_SC_PAGESIZE) } {
        size if size > 0 => size as u64,
        _ => PAGE_SIZE as u64,
    };

    if base % page_size != 0 {
        return Err(io::Error::from_raw_os_error(libc::EINVAL));
    }

    off_t::try_from(base).map_err(|_| io::Error::from_raw_os_error(libc::EOVERFLOW))
}

/// A mapped register block.
///
/// Unmaps the block and closes the device when dropped.
pub struct GpioMem {
    mem_ptr: *mut u32,
    base: u64,
    _file: File,
}

impl GpioMem {
    /// Returns the physical base address of the mapped block.
    pub fn base(&self) -> u64 {
        self.base
    }
}

impl fmt::Debug for GpioMem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpioMem")
            .field("mem_ptr", &self.mem_ptr)
            .field("base", &format_args!("{:#010x}", self.base))
            .finish()
    }
}

impl GpioRegisters for GpioMem {
    #[inline(always)]
    fn read(&self, reg: Register) -> u32 {
        unsafe { ptr::read_volatile(self.mem_ptr.add(reg.index())) }
    }

    #[inline(always)]
    fn write(&self, reg: Register, value: u32) {
        unsafe {
            ptr::write_volatile(self.mem_ptr.add(reg.index()), value);
        }
    }
}

impl Drop for GpioMem {
    fn drop(&mut self) {
        unsafe {
            libc::munmap(self.mem_ptr as *mut c_void, PAGE_SIZE as size_t);
        }

        debug!(base = format_args!("{:#010x}", self.base), "unmapped register block");
    }
}

// Required because of the raw pointer to our memory-mapped file. Register
// updates are read-modify-write sequences, so GpioMem isn't Sync.
unsafe impl Send for GpioMem {}
