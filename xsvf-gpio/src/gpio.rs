//! # BCM283x GPIO register block
//!
//! Typed access to the GPIO peripheral of the BCM2835/6/7. The block consists of 32 bit
//! registers; the ones used here are
//!
//! | word    | register  | purpose                                      |
//! |---------|-----------|----------------------------------------------|
//! | 0 - 5   | GPFSEL0-5 | function select, 3 bits per pin, 10 per word |
//! | 7, 8    | GPSET0-1  | writing a 1 drives the pin high              |
//! | 10, 11  | GPCLR0-1  | writing a 1 drives the pin low               |
//! | 13, 14  | GPLEV0-1  | current pin levels                           |
//!
//! Pins are driven exclusively through GPSET/GPCLR, so changing one pin never needs a
//! read-modify-write that could race with other users of the block.

/// Offset of the GPIO block from the peripheral base.
pub const GPIO_OFFSET: u64 = 0x20_0000;

/// Peripheral base of the BCM2836/7 (Raspberry Pi 2 and 3).
pub const DEFAULT_PERI_BASE: u64 = 0x3F00_0000;

/// Size of the mapped register window in bytes.
pub const BLOCK_SIZE: usize = 4 * 1024;

/// Number of 32 bit registers in the window.
pub const BLOCK_WORDS: usize = BLOCK_SIZE / 4;

/// Number of GPIO lines of the block.
pub const NUM_PINS: u8 = 54;

const FSEL_BITS: u32 = 3;
const FSEL_MASK: u32 = 0b111;
const FSEL_OUTPUT: u32 = 0b001;

/// Word level access to a register window.
///
/// Accesses take `&self`, since they are volatile operations on device memory rather than
/// on Rust-owned data.
pub trait RegisterAccess {
    fn read(&self, word: usize) -> u32;
    fn write(&self, word: usize, value: u32);
}

/// The registers of the GPIO block.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Register {
    FunctionSelect(u8),
    Set(u8),
    Clear(u8),
    Level(u8),
}

impl Register {
    /// Index of the register in the window, in 32 bit words.
    pub fn word(self) -> usize {
        match self {
            Register::FunctionSelect(n) => n as usize,
            Register::Set(bank) => 7 + bank as usize,
            Register::Clear(bank) => 10 + bank as usize,
            Register::Level(bank) => 13 + bank as usize,
        }
    }
}

/// A GPIO line number, validated against [`NUM_PINS`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Pin(u8);

impl Pin {
    pub const fn new(number: u8) -> Option<Pin> {
        if number < NUM_PINS {
            Some(Pin(number))
        } else {
            None
        }
    }

    pub fn number(self) -> u8 {
        self.0
    }

    /// Function select register and the shift of this pin's 3 bit field in it.
    fn function_select(self) -> (Register, u32) {
        (
            Register::FunctionSelect(self.0 / 10),
            (self.0 % 10) as u32 * FSEL_BITS,
        )
    }

    /// Bank (0 or 1) of the set/clear/level registers and the mask of this pin in it.
    fn bank_mask(self) -> (u8, u32) {
        (self.0 / 32, 1 << (self.0 % 32))
    }
}

/// The GPIO block on top of some register window.
#[derive(Debug)]
pub struct Gpio<R> {
    regs: R,
}

impl<R: RegisterAccess> Gpio<R> {
    pub fn new(regs: R) -> Gpio<R> {
        Gpio { regs }
    }

    pub fn registers(&self) -> &R {
        &self.regs
    }

    fn read(&self, reg: Register) -> u32 {
        self.regs.read(reg.word())
    }

    fn write(&self, reg: Register, value: u32) {
        self.regs.write(reg.word(), value)
    }

    /// Configure `pin` as input. Leaves the other pins of the register untouched.
    pub fn configure_input(&self, pin: Pin) {
        let (reg, shift) = pin.function_select();
        let value = self.read(reg) & !(FSEL_MASK << shift);
        self.write(reg, value);
    }

    /// Configure `pin` as output. Leaves the other pins of the register untouched.
    pub fn configure_output(&self, pin: Pin) {
        // Clear the field first, alternate functions would otherwise survive.
        self.configure_input(pin);
        let (reg, shift) = pin.function_select();
        let value = self.read(reg) | (FSEL_OUTPUT << shift);
        self.write(reg, value);
    }

    /// Drive `pin` high.
    pub fn set(&self, pin: Pin) {
        let (bank, mask) = pin.bank_mask();
        self.write(Register::Set(bank), mask);
    }

    /// Drive `pin` low.
    pub fn clear(&self, pin: Pin) {
        let (bank, mask) = pin.bank_mask();
        self.write(Register::Clear(bank), mask);
    }

    /// Drive `pin` to `level`.
    pub fn write_pin(&self, pin: Pin, level: bool) {
        if level { self.set(pin) } else { self.clear(pin) }
    }

    /// Current level of `pin`.
    pub fn read_input(&self, pin: Pin) -> bool {
        let (bank, mask) = pin.bank_mask();
        self.read(Register::Level(bank)) & mask != 0
    }
}
