// Exercises the /dev/mem mapper against a regular file standing in for
// physical memory. Port blocks are spaced 64 KiB apart, which keeps every base
// address aligned for 4K, 16K and 64K page kernels.

use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom, Write};
use std::os::unix::io::AsRawFd;
use std::path::Path;

use tempfile::NamedTempFile;

use memgpio::config::{Config, PortAddressTable, PORTS};
use memgpio::gpio::{DevMem, Direction, Error, Gpio, GpioRegisters, Level, Mapper, Mode, Register};

const STRIDE: u64 = 0x1_0000;

fn table() -> PortAddressTable {
    PortAddressTable::new([0, STRIDE, 2 * STRIDE, 3 * STRIDE, 4 * STRIDE])
}

fn fake_mem() -> NamedTempFile {
    let file = NamedTempFile::new().unwrap();
    file.as_file().set_len(PORTS as u64 * STRIDE).unwrap();
    file
}

fn gpio(mem: &NamedTempFile) -> Gpio {
    Gpio::new(Config::new().set_device(mem.path()).set_ports(table()))
}

fn word(path: &Path, address: u64) -> u32 {
    let mut file = File::open(path).unwrap();
    let mut buf = [0u8; 4];
    file.seek(SeekFrom::Start(address)).unwrap();
    file.read_exact(&mut buf).unwrap();
    u32::from_ne_bytes(buf)
}

fn set_word(path: &Path, address: u64, value: u32) {
    let mut file = fs::OpenOptions::new().write(true).open(path).unwrap();
    file.seek(SeekFrom::Start(address)).unwrap();
    file.write_all(&value.to_ne_bytes()).unwrap();
}

// Number of descriptors this process holds open on `path`.
fn open_handles(path: &Path) -> usize {
    let target = fs::canonicalize(path).unwrap();

    fs::read_dir("/proc/self/fd")
        .unwrap()
        .filter_map(|entry| fs::read_link(entry.ok()?.path()).ok())
        .filter(|link| *link == target)
        .count()
}

// Attempts a non-blocking exclusive lock through a separate open file description.
fn lock_available(path: &Path) -> bool {
    let file = File::open(path).unwrap();

    unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) == 0 }
}

#[test]
fn read_zeroed_pin() {
    let mem = fake_mem();

    let status = gpio(&mem).run(0, Mode::Read).unwrap();

    assert_eq!(status.to_string(), "gpio 0=0");
}

#[test]
fn write_pin_33() {
    let mem = fake_mem();
    let gpio = gpio(&mem);

    gpio.run(33, Mode::Write(Level::High)).unwrap();

    assert_eq!(word(mem.path(), STRIDE), 0b10);
    assert_eq!(word(mem.path(), STRIDE + 4), 0b10);
    assert_eq!(gpio.run(33, Mode::Read).unwrap().to_string(), "gpio 33=1");
}

#[test]
fn round_trip_across_mappings() {
    let mem = fake_mem();
    let gpio = gpio(&mem);

    for pin in [0, 31, 64, 127, 159] {
        gpio.write(pin, Level::High).unwrap();
        assert_eq!(gpio.read(pin).unwrap(), Level::High);
        assert_eq!(gpio.direction(pin).unwrap(), Direction::Output);

        gpio.write(pin, Level::Low).unwrap();
        assert_eq!(gpio.read(pin).unwrap(), Level::Low);
    }
}

#[test]
fn other_bits_preserved() {
    let mem = fake_mem();
    set_word(mem.path(), 2 * STRIDE, 0x1234_5670);
    set_word(mem.path(), 2 * STRIDE + 4, 0x8000_0000);
    set_word(mem.path(), 2 * STRIDE + 8, 0xffff_ffff);

    gpio(&mem).write(64 + 3, Level::High).unwrap();

    assert_eq!(word(mem.path(), 2 * STRIDE), 0x1234_5678);
    assert_eq!(word(mem.path(), 2 * STRIDE + 4), 0x8000_0008);
    assert_eq!(word(mem.path(), 2 * STRIDE + 8), 0xffff_ffff);
}

#[test]
fn pad_status() {
    let mem = fake_mem();
    set_word(mem.path(), 4 * STRIDE + 8, 1 << 31);

    assert_eq!(gpio(&mem).pad_status(159).unwrap(), Level::High);
    assert_eq!(gpio(&mem).pad_status(158).unwrap(), Level::Low);
}

#[test]
fn writes_visible_to_next_mapping() {
    let mem = fake_mem();
    let mapper = DevMem::new(mem.path(), false);

    {
        let regs = mapper.map(STRIDE).unwrap();
        assert_eq!(regs.base(), STRIDE);
        regs.write(Register::Data, 0xcafe_f00d);
    }

    assert_eq!(word(mem.path(), STRIDE), 0xcafe_f00d);

    let regs = mapper.map(STRIDE).unwrap();
    assert_eq!(regs.read(Register::Data), 0xcafe_f00d);
}

#[test]
fn missing_device() {
    let gpio = Gpio::new(Config::new().set_device("/nonexistent/memgpio-mem"));

    let err = gpio.read(0).unwrap_err();

    assert!(matches!(err, Error::DeviceOpen { .. }));
    assert_eq!(err.exit_code(), 4);
}

#[test]
fn invalid_pin_opens_nothing() {
    let gpio = Gpio::new(Config::new().set_device("/nonexistent/memgpio-mem"));

    assert!(matches!(gpio.read(200), Err(Error::InvalidPin(200))));
}

#[test]
fn unaligned_base() {
    let mem = fake_mem();
    let mapper = DevMem::new(mem.path(), false);

    match mapper.map(STRIDE + 4) {
        Err(Error::Map { base, source }) => {
            assert_eq!(base, STRIDE + 4);
            assert_eq!(source.raw_os_error(), Some(libc::EINVAL));
        }
        other => panic!("expected Map error, got {:?}", other),
    }
}

#[test]
fn advisory_lock() {
    let mem = fake_mem();
    let gpio = Gpio::new(
        Config::new()
            .set_device(mem.path())
            .set_ports(table())
            .set_lock(true),
    );

    gpio.write(5, Level::High).unwrap();
    assert_eq!(gpio.read(5).unwrap(), Level::High);
}

#[test]
fn failed_map_closes_device() {
    let mem = fake_mem();
    let mapper = DevMem::new(mem.path(), true);
    let before = open_handles(mem.path());

    for _ in 0..8 {
        assert!(matches!(mapper.map(STRIDE + 4), Err(Error::Map { .. })));
    }

    assert_eq!(open_handles(mem.path()), before);
    assert!(lock_available(mem.path()));
}

#[test]
fn lock_held_while_mapped() {
    let mem = fake_mem();
    let mapper = DevMem::new(mem.path(), true);
    let before = open_handles(mem.path());

    let regs = mapper.map(STRIDE).unwrap();
    assert_eq!(open_handles(mem.path()), before + 1);
    assert!(!lock_available(mem.path()));

    drop(regs);
    assert_eq!(open_handles(mem.path()), before);
    assert!(lock_available(mem.path()));
}
