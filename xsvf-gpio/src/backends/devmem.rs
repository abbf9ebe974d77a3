//! # `/dev/mem` backend
//!
//! Maps the GPIO block of the SoC into the process. Requires root, or at least read/write
//! access to `/dev/mem`.
//!
//! ## Example Usage
//!
//! ```ignore
//! use xsvf_gpio::backends::devmem::DevMem;
//! use xsvf_gpio::gpio::{DEFAULT_PERI_BASE, Gpio};
//!
//! let gpio = Gpio::new(DevMem::open(DEFAULT_PERI_BASE)?);
//! ```
use std::{
    fs::OpenOptions,
    io,
    num::NonZero,
    os::unix::fs::OpenOptionsExt,
    ptr::{NonNull, read_volatile, write_volatile},
};

use nix::{
    fcntl::OFlag,
    sys::mman::{MapFlags, ProtFlags, mmap, munmap},
};

use crate::gpio::{BLOCK_SIZE, BLOCK_WORDS, GPIO_OFFSET, RegisterAccess};

const DEV_MEM: &str = "/dev/mem";

/// The GPIO register block mapped from physical memory.
///
/// The mapping is released when the value is dropped.
#[derive(Debug)]
pub struct DevMem {
    regs: NonNull<u32>,
}

impl DevMem {
    /// Map the GPIO block of the SoC whose peripherals start at `peri_base`.
    pub fn open(peri_base: u64) -> io::Result<DevMem> {
        let base = peri_base + GPIO_OFFSET;
        log::debug!("Opening {}", DEV_MEM);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(OFlag::O_SYNC.bits())
            .open(DEV_MEM)?;
        let offset = nix::libc::off_t::try_from(base)
            .map_err(|_| io::Error::other(format!("Address 0x{:x} out of range", base)))?;

        // SAFETY: The mapping is a fresh shared mapping of device memory, nothing else in the
        // process aliases it. It stays valid until munmap in Drop.
        let regs = unsafe {
            log::debug!("Mapping GPIO block at 0x{:x} (size=0x{:x})", base, BLOCK_SIZE);
            mmap(
                None,
                NonZero::new(BLOCK_SIZE).ok_or_else(|| io::Error::other("Empty mapping"))?,
                ProtFlags::PROT_READ | ProtFlags::PROT_WRITE,
                MapFlags::MAP_SHARED,
                &file,
                offset,
            )?
        };
        log::info!("GPIO block at 0x{:x} mapped successfully", base);
        Ok(DevMem { regs: regs.cast() })
    }
}

impl RegisterAccess for DevMem {
    fn read(&self, word: usize) -> u32 {
        assert!(word < BLOCK_WORDS, "register word {} outside the window", word);
        // SAFETY: word is inside the mapped window.
        unsafe { read_volatile(self.regs.as_ptr().add(word)) }
    }

    fn write(&self, word: usize, value: u32) {
        assert!(word < BLOCK_WORDS, "register word {} outside the window", word);
        // SAFETY: word is inside the mapped window.
        unsafe { write_volatile(self.regs.as_ptr().add(word), value) }
    }
}

impl Drop for DevMem {
    fn drop(&mut self) {
        log::debug!("Unmapping GPIO block");
        // SAFETY: regs was returned by mmap with BLOCK_SIZE and is not used after this.
        unsafe {
            let _ = munmap(self.regs.cast(), BLOCK_SIZE);
        }
    }
}
