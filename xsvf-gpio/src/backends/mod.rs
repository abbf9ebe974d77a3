//! Register windows the GPIO block can live in.
//!
//! - [`devmem::DevMem`] maps the real peripheral through `/dev/mem`.
//! - [`sim::SimulatedGpio`] keeps the registers in memory, for dry runs and tests.
pub mod devmem;
pub mod sim;
