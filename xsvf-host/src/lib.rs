//! # XSVF Host Interface
//!
//! This crate defines the boundary between a generic SVF/XSVF playback engine and the
//! hardware that actually wiggles the JTAG lines.
//!
//! ## Overview
//!
//! A playback engine decodes test vectors into primitive JTAG operations (clock pulses,
//! run-test delays, TAP state changes) and needs somebody to carry them out. That somebody
//! is a *host*: a type implementing [`XsvfHost`]. The engine never touches hardware itself,
//! it only calls into the host.
//!
//! ## Architecture
//!
//! - **[`XsvfHost`] Trait**: the callback contract. Hosts implement clocking, delays,
//!   byte input, diagnostics and buffer management.
//! - **[`tap`]**: IEEE 1149.1 TAP states and a [`tap::TapController`] that walks the TAP
//!   through the contract.
//! - **[`scan`]**: enumerates the devices on a JTAG chain using only the contract.
//! - **[`mem`]**: the buffer categories an engine asks the host to allocate.
//!
//! ## Basic Usage
//!
//! ```ignore
//! use xsvf_host::{XsvfHost, scan::scan_chain};
//!
//! let mut host = MyHost::new();
//! let devices = scan_chain(&mut host)?;
//! println!("{} devices on the chain", devices);
//! ```
//!
//! ## Argument conventions
//!
//! Engines traditionally encode "don't drive TDI" and "don't compare TDO" as negative
//! integers. Here these are `None`. The result of a clock pulse is a [`PulseStatus`], whose
//! [`PulseStatus::code`] gives back the classic integer encoding where a mismatch (`-1`)
//! takes priority over the sampled bit.
//!
//! ## Logging
//!
//! This crate uses the `log` crate. TAP walks are reported at trace level.
pub mod error;
pub mod mem;
pub mod scan;
pub mod tap;

pub use error::HostError;
pub use mem::MemKind;
pub use tap::TapState;

/// Outcome of a single TCK pulse.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PulseStatus {
    /// The level sampled on TDO after the rising edge.
    Tdo(bool),
    /// An expected TDO level was given and the sampled level differs from it.
    Mismatch,
}

impl PulseStatus {
    /// The integer encoding used by C playback engines: `0`/`1` for the sampled bit,
    /// `-1` for a mismatch.
    pub fn code(self) -> i32 {
        match self {
            PulseStatus::Tdo(bit) => bit as i32,
            PulseStatus::Mismatch => -1,
        }
    }

    pub fn is_mismatch(self) -> bool {
        self == PulseStatus::Mismatch
    }
}

/// Requested level of the optional TRST line.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Trst {
    /// Reset asserted
    On,
    /// Reset released
    Off,
    /// Line tri-stated
    HighZ,
    /// The vectors declare that TRST is not connected
    Absent,
}

/// Trait that hosts must implement to play SVF/XSVF vectors.
///
/// Every method maps one-to-one onto an engine callback. All calls are synchronous: when a
/// method returns, its effect on the JTAG lines has happened.
pub trait XsvfHost {
    /// Acquire the hardware and configure the JTAG lines.
    ///
    /// Called once before any other JTAG operation of a playback run.
    fn setup(&mut self) -> Result<(), HostError>;

    /// Release the hardware acquired by [`XsvfHost::setup`].
    fn shutdown(&mut self) -> Result<(), HostError>;

    /// Wait `usecs` microseconds while holding TMS at `tms`, generating `num_tck` clock
    /// cycles within that time.
    ///
    /// The time spent clocking counts against the requested delay.
    fn udelay(&mut self, usecs: i64, tms: bool, num_tck: i64);

    /// Next byte of the vector file, or `None` at the end of the input.
    fn next_byte(&mut self) -> Option<u8>;

    /// Perform one TCK cycle.
    ///
    /// # Arguments
    ///
    /// * `tms` - TMS level for this cycle
    /// * `tdi` - TDI level, `None` leaves TDI untouched
    /// * `tdo` - expected TDO level, `None` disables the comparison
    /// * `rmask` - capture the sampled TDO bit into the host's result buffer
    /// * `sync` - the engine requests the operation to be flushed to hardware
    ///
    /// # Returns
    ///
    /// [`PulseStatus::Mismatch`] if `tdo` was given and differs from the sampled level,
    /// otherwise the sampled level.
    fn pulse_tck(
        &mut self,
        tms: bool,
        tdi: Option<bool>,
        tdo: Option<bool>,
        rmask: bool,
        sync: bool,
    ) -> PulseStatus;

    /// Pulse the system clock line once.
    fn pulse_sck(&mut self);

    /// Drive the TRST line.
    fn set_trst(&mut self, trst: Trst);

    /// Request a TCK frequency in Hz.
    fn set_frequency(&mut self, hz: u32) -> Result<(), HostError>;

    /// The engine moved the TAP into `state`.
    fn report_tapstate(&mut self, state: TapState);

    /// A device with the given 32 bit identification code was found.
    fn report_device(&mut self, idcode: u32);

    /// Free-form progress message from the engine.
    fn report_status(&mut self, message: &str);

    /// Error detected by the engine at `file:line`.
    fn report_error(&mut self, file: &str, line: u32, message: &str);

    /// Resize a working buffer of category `which` to `size` bytes.
    ///
    /// Follows `realloc` semantics: growing keeps the existing content, a `size` of zero
    /// releases the buffer.
    fn realloc(&mut self, buf: Vec<u8>, size: usize, which: MemKind) -> Vec<u8>;
}
