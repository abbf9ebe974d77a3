//! # XSVF host for Raspberry Pi GPIO
//!
//! Plays JTAG through four GPIO lines of a BCM283x based board by writing the memory-mapped
//! GPIO registers directly.
//!
//! ## Overview
//!
//! The crate implements the [`xsvf_host::XsvfHost`] contract, so any engine speaking that
//! contract can drive a JTAG chain wired to the header:
//!
//! | signal | GPIO | header pin |
//! |--------|------|------------|
//! | TCK    | 22   | 15         |
//! | TDO    | 23   | 16         |
//! | TDI    | 24   | 18         |
//! | TMS    | 25   | 22         |
//!
//! ## Layers
//!
//! - [`gpio`]: typed access to the register block, on top of a [`gpio::RegisterAccess`]
//!   window from [`backends`]
//! - [`signals`]: named JTAG lines
//! - [`timing`]: run-test delays that account for the time spent clocking
//! - [`host`]: the [`xsvf_host::XsvfHost`] implementation and per run session state
//! - [`rmask`]: capture and formatting of RMASK selected TDO bits
//! - [`profile`]: buffer size profiling and static allocator generation
//!
//! ## Permissions
//!
//! Mapping `/dev/mem` needs root. Without hardware, [`backends::sim::SimulatedGpio`] provides
//! an in-memory register block.
pub mod backends;
pub mod gpio;
pub mod host;
pub mod idcode;
pub mod profile;
pub mod rmask;
pub mod signals;
pub mod timing;

pub use host::{Builder, Config, GpioHost};
