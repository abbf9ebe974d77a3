//! JTAG signals on top of the GPIO block.
use xsvf_host::Trst;

use crate::gpio::{Gpio, Pin, RegisterAccess};

const fn pin(number: u8) -> Pin {
    match Pin::new(number) {
        Some(pin) => pin,
        None => panic!("GPIO number out of range"),
    }
}

/// Which GPIO carries which JTAG signal.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PinAssignment {
    pub tdi: Pin,
    pub tms: Pin,
    pub tck: Pin,
    pub tdo: Pin,
}

impl PinAssignment {
    /// TDI on GPIO24, TMS on GPIO25, TCK on GPIO22 and TDO on GPIO23 (header pins 18, 22, 15
    /// and 16).
    pub const DEFAULT: PinAssignment = PinAssignment {
        tdi: pin(24),
        tms: pin(25),
        tck: pin(22),
        tdo: pin(23),
    };
}

impl Default for PinAssignment {
    fn default() -> Self {
        PinAssignment::DEFAULT
    }
}

/// The four JTAG lines, plus the SCK and TRST lines which are not wired on this adapter.
#[derive(Debug)]
pub struct JtagSignals<R> {
    gpio: Gpio<R>,
    pins: PinAssignment,
}

impl<R: RegisterAccess> JtagSignals<R> {
    pub fn new(gpio: Gpio<R>, pins: PinAssignment) -> JtagSignals<R> {
        JtagSignals { gpio, pins }
    }

    pub fn gpio(&self) -> &Gpio<R> {
        &self.gpio
    }

    pub fn pins(&self) -> PinAssignment {
        self.pins
    }

    /// TDI, TMS and TCK as outputs, TDO as input.
    pub fn configure(&self) {
        self.gpio.configure_output(self.pins.tdi);
        self.gpio.configure_output(self.pins.tms);
        self.gpio.configure_output(self.pins.tck);
        self.gpio.configure_input(self.pins.tdo);
        log::debug!(
            "JTAG pins configured: tdi={}, tms={}, tck={}, tdo={}",
            self.pins.tdi.number(),
            self.pins.tms.number(),
            self.pins.tck.number(),
            self.pins.tdo.number()
        );
    }

    pub fn drive_tms(&self, level: bool) {
        self.gpio.write_pin(self.pins.tms, level);
    }

    pub fn drive_tdi(&self, level: bool) {
        self.gpio.write_pin(self.pins.tdi, level);
    }

    pub fn drive_tck(&self, level: bool) {
        self.gpio.write_pin(self.pins.tck, level);
    }

    /// One TCK cycle, low then high. TDO is valid after this returns.
    pub fn cycle_tck(&self) {
        self.drive_tck(false);
        self.drive_tck(true);
    }

    pub fn read_tdo(&self) -> bool {
        self.gpio.read_input(self.pins.tdo)
    }

    /// Not available.
    pub fn drive_sck(&self, _level: bool) {}

    /// Not available.
    pub fn drive_trst(&self, _trst: Trst) {}
}
