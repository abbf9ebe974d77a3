//! Shared fixtures for the integration tests.
use xsvf_gpio::{Builder, GpioHost, backends::sim::SimulatedGpio, signals::PinAssignment};

/// TCK cycles from an unknown TAP state to Shift-DR: five to reset, four to Shift-DR.
pub const CYCLES_TO_DRSHIFT: usize = 9;

/// A host on a simulated chain whose TDO idles at `idle_tdo`.
pub fn simulated_host(idle_tdo: bool, verbosity: u8) -> (SimulatedGpio, GpioHost<SimulatedGpio>) {
    let pins = PinAssignment::DEFAULT;
    let sim = SimulatedGpio::with_chain(pins.tck, pins.tdo, idle_tdo);
    let host = Builder::new()
        .verbosity(verbosity)
        .build_simulated(sim.clone());
    (sim, host)
}

/// TDO levels of an IDCODE shifted out LSB first.
pub fn idcode_levels(idcode: u32) -> impl Iterator<Item = bool> {
    (0..32).map(move |bit| (idcode >> bit) & 1 == 1)
}
