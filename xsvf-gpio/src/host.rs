//! # GPIO host
//!
//! [`GpioHost`] implements the [`XsvfHost`] contract by bit-banging the JTAG lines through the
//! GPIO block. Every call is a synchronous hardware transaction, nothing is queued.
//!
//! ## Example Usage
//!
//! ```ignore
//! use xsvf_gpio::host::Builder;
//! use xsvf_host::scan::scan_chain;
//!
//! let mut host = Builder::new().verbosity(2).build();
//! scan_chain(&mut host)?;
//! for device in host.session().devices() {
//!     println!("{}", device);
//! }
//! ```
//!
//! ## Diagnostics
//!
//! Besides the log level, diagnostics are gated by the session verbosity:
//!
//! - 2: setup, shutdown and status messages
//! - 3: delays, TAP states and buffer resizes
//! - 4: every TCK, SCK and TRST operation
//!
//! Errors reported by the engine and ignored frequency requests are always logged.
use std::{
    fs::File,
    io::{self, BufReader, ErrorKind, Read},
    path::Path,
    time::Duration,
};

use xsvf_host::{HostError, MemKind, PulseStatus, TapState, Trst, XsvfHost};

use crate::{
    backends::{devmem::DevMem, sim::SimulatedGpio},
    gpio::{DEFAULT_PERI_BASE, Gpio, RegisterAccess},
    idcode::IdCode,
    profile::MemoryProfile,
    rmask::CaptureBuffer,
    signals::{JtagSignals, PinAssignment},
    timing::{Clock, SystemClock, compensated_delay},
};

#[derive(Debug, Clone)]
pub struct Config {
    /// Physical address of the SoC peripherals
    pub peri_base: u64,
    pub pins: PinAssignment,
    pub verbosity: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            peri_base: DEFAULT_PERI_BASE,
            pins: PinAssignment::DEFAULT,
            verbosity: 0,
        }
    }
}

/// Builder to create a [GpioHost] and modify configuration options
///
/// # Example
///
/// ```ignore
/// use xsvf_gpio::host::Builder;
///
/// let host = Builder::new()
///     .peri_base(0xFE00_0000)
///     .verbosity(3)
///     .build();
/// ```
#[derive(Default)]
pub struct Builder {
    config: Config,
}

impl Builder {
    pub fn new() -> Builder {
        Builder::default()
    }

    /// Set the physical base address of the peripherals, which differs between SoC generations.
    pub fn peri_base(mut self, peri_base: u64) -> Self {
        self.config.peri_base = peri_base;
        self
    }

    pub fn pins(mut self, pins: PinAssignment) -> Self {
        self.config.pins = pins;
        self
    }

    pub fn verbosity(mut self, verbosity: u8) -> Self {
        self.config.verbosity = verbosity;
        self
    }

    /// Build a host that maps the GPIO block from `/dev/mem` on setup
    pub fn build(self) -> GpioHost<DevMem> {
        GpioHost::devmem(self.config)
    }

    /// Build a host on top of a simulated GPIO block
    pub fn build_simulated(self, sim: SimulatedGpio) -> GpioHost<SimulatedGpio> {
        GpioHost::simulated(self.config, sim)
    }
}

/// Per run state of a host.
pub struct Session {
    source: Option<BufReader<Box<dyn Read>>>,
    verbosity: u8,
    clock_count: u64,
    tdi_bits: u64,
    tdo_bits: u64,
    captured: CaptureBuffer,
    devices: Vec<IdCode>,
}

impl Session {
    fn new(verbosity: u8) -> Session {
        Session {
            source: None,
            verbosity,
            clock_count: 0,
            tdi_bits: 0,
            tdo_bits: 0,
            captured: CaptureBuffer::new(),
            devices: Vec::new(),
        }
    }

    /// Read vector bytes from `reader` from now on.
    pub fn set_source(&mut self, reader: impl Read + 'static) {
        self.source = Some(BufReader::new(Box::new(reader)));
    }

    /// Read vector bytes from the file at `path`, or from stdin if `path` is `-`.
    pub fn open_source(&mut self, path: impl AsRef<Path>) -> Result<(), HostError> {
        let path = path.as_ref();
        if path == Path::new("-") {
            self.set_source(io::stdin());
            return Ok(());
        }
        let file = File::open(path).map_err(|error| HostError::Source {
            path: path.to_path_buf(),
            error,
        })?;
        log::debug!("Opened vector file {}", path.display());
        self.set_source(file);
        Ok(())
    }

    /// Drop the current byte source.
    pub fn close_source(&mut self) {
        self.source = None;
    }

    pub fn verbosity(&self) -> u8 {
        self.verbosity
    }

    /// TCK cycles issued through `pulse_tck`
    pub fn clock_count(&self) -> u64 {
        self.clock_count
    }

    /// Cycles with a driven TDI level
    pub fn tdi_bits(&self) -> u64 {
        self.tdi_bits
    }

    /// Cycles with a compared TDO level
    pub fn tdo_bits(&self) -> u64 {
        self.tdo_bits
    }

    pub fn captured(&self) -> &CaptureBuffer {
        &self.captured
    }

    /// Devices reported by the engine so far
    pub fn devices(&self) -> &[IdCode] {
        &self.devices
    }

    /// Forget the reported devices, returning them.
    pub fn take_devices(&mut self) -> Vec<IdCode> {
        std::mem::take(&mut self.devices)
    }
}

type Connector<R> = Box<dyn FnMut() -> io::Result<R>>;

/// [`XsvfHost`] driving JTAG through a GPIO register block of type `R`.
pub struct GpioHost<R, C = SystemClock> {
    connect: Connector<R>,
    pins: PinAssignment,
    signals: Option<JtagSignals<R>>,
    clock: C,
    session: Session,
    profile: MemoryProfile,
}

impl GpioHost<DevMem> {
    /// Host on the real GPIO block, mapped on setup.
    pub fn devmem(config: Config) -> GpioHost<DevMem> {
        let peri_base = config.peri_base;
        GpioHost::new(config, move || DevMem::open(peri_base))
    }
}

impl GpioHost<SimulatedGpio> {
    /// Host on a simulated block. `sim` can be kept to inspect the lines.
    pub fn simulated(config: Config, sim: SimulatedGpio) -> GpioHost<SimulatedGpio> {
        GpioHost::new(config, move || Ok(sim.clone()))
    }
}

impl<R: RegisterAccess> GpioHost<R> {
    /// Host whose register window is obtained from `connect` on every setup.
    pub fn new(config: Config, connect: impl FnMut() -> io::Result<R> + 'static) -> GpioHost<R> {
        GpioHost {
            connect: Box::new(connect),
            pins: config.pins,
            signals: None,
            clock: SystemClock::default(),
            session: Session::new(config.verbosity),
            profile: MemoryProfile::new(),
        }
    }
}

impl<R: RegisterAccess, C: Clock> GpioHost<R, C> {
    /// Replace the time source used for delays.
    pub fn with_clock<D: Clock>(self, clock: D) -> GpioHost<R, D> {
        GpioHost {
            connect: self.connect,
            pins: self.pins,
            signals: self.signals,
            clock,
            session: self.session,
            profile: self.profile,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn profile(&self) -> &MemoryProfile {
        &self.profile
    }

    pub fn is_set_up(&self) -> bool {
        self.signals.is_some()
    }

    fn verbose(&self, level: u8) -> bool {
        self.session.verbosity >= level
    }
}

impl<R: RegisterAccess, C: Clock> XsvfHost for GpioHost<R, C> {
    fn setup(&mut self) -> Result<(), HostError> {
        if self.verbose(2) {
            log::info!("[SETUP]");
        }
        // Release a previous mapping before creating a new one.
        self.signals = None;
        let regs = (self.connect)().map_err(HostError::Hardware)?;
        let signals = JtagSignals::new(Gpio::new(regs), self.pins);
        signals.configure();
        self.signals = Some(signals);
        Ok(())
    }

    fn shutdown(&mut self) -> Result<(), HostError> {
        if self.verbose(2) {
            log::info!("[SHUTDOWN]");
        }
        self.signals = None;
        Ok(())
    }

    fn udelay(&mut self, usecs: i64, tms: bool, num_tck: i64) {
        if self.verbose(3) {
            log::debug!("[DELAY:{}, TMS:{}, NUM_TCK:{}]", usecs, tms as u8, num_tck);
        }
        match &self.signals {
            Some(signals) => {
                let slept = compensated_delay(signals, &self.clock, usecs, tms, num_tck);
                if num_tck > 0 && self.verbose(3) {
                    log::debug!("[DELAY_AFTER_TCK:{}]", slept.as_micros());
                }
            }
            None => {
                log::error!("{}: {} TCK cycles dropped", HostError::NotSetUp, num_tck.max(0));
                if usecs > 0 {
                    self.clock.sleep(Duration::from_micros(usecs as u64));
                }
            }
        }
    }

    fn next_byte(&mut self) -> Option<u8> {
        let source = self.session.source.as_mut()?;
        let mut byte = [0u8];
        match source.read_exact(&mut byte) {
            Ok(()) => Some(byte[0]),
            Err(err) if err.kind() == ErrorKind::UnexpectedEof => None,
            Err(err) => {
                log::error!("Error reading vector input: {}", err);
                None
            }
        }
    }

    fn pulse_tck(
        &mut self,
        tms: bool,
        tdi: Option<bool>,
        tdo: Option<bool>,
        rmask: bool,
        _sync: bool,
    ) -> PulseStatus {
        let Some(signals) = &self.signals else {
            log::error!("{}: TCK pulse dropped", HostError::NotSetUp);
            return PulseStatus::Tdo(false);
        };

        signals.drive_tms(tms);
        if let Some(tdi) = tdi {
            self.session.tdi_bits += 1;
            signals.drive_tdi(tdi);
        }
        signals.cycle_tck();
        let line_tdo = signals.read_tdo();

        if rmask {
            // Bits beyond the capture capacity are dropped.
            self.session.captured.push(line_tdo);
        }

        let mut status = PulseStatus::Tdo(line_tdo);
        if let Some(expected) = tdo {
            self.session.tdo_bits += 1;
            if expected != line_tdo {
                status = PulseStatus::Mismatch;
            }
        }

        if self.verbose(4) {
            log::trace!(
                "[TMS:{}, TDI:{}, TDO_ARG:{}, TDO_LINE:{}, RMASK:{}, RC:{}]",
                tms as u8,
                tdi.map_or(-1, i32::from),
                tdo.map_or(-1, i32::from),
                line_tdo as u8,
                rmask as u8,
                status.code()
            );
        }

        self.session.clock_count += 1;
        status
    }

    fn pulse_sck(&mut self) {
        if self.verbose(4) {
            log::trace!("[SCK]");
        }
        if let Some(signals) = &self.signals {
            signals.drive_sck(false);
            signals.drive_sck(true);
        }
    }

    fn set_trst(&mut self, trst: Trst) {
        if self.verbose(4) {
            log::trace!("[TRST:{:?}]", trst);
        }
        if let Some(signals) = &self.signals {
            signals.drive_trst(trst);
        }
    }

    fn set_frequency(&mut self, hz: u32) -> Result<(), HostError> {
        log::warn!("Setting JTAG clock frequency to {} ignored!", hz);
        Ok(())
    }

    fn report_tapstate(&mut self, state: TapState) {
        if self.verbose(3) {
            log::debug!("[{}]", state);
        }
    }

    fn report_device(&mut self, idcode: u32) {
        let idcode = IdCode(idcode);
        log::debug!("Found device: {}", idcode);
        self.session.devices.push(idcode);
    }

    fn report_status(&mut self, message: &str) {
        if self.verbose(2) {
            log::info!("[STATUS] {}", message);
        }
    }

    fn report_error(&mut self, file: &str, line: u32, message: &str) {
        log::error!("[{}:{}] {}", file, line, message);
    }

    fn realloc(&mut self, mut buf: Vec<u8>, size: usize, which: MemKind) -> Vec<u8> {
        self.profile.record(which, size);
        if self.verbose(3) {
            log::debug!("[REALLOC:{}:{}]", which, size);
        }
        if size == 0 {
            return Vec::new();
        }
        buf.resize(size, 0);
        buf.shrink_to_fit();
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rmask::CAPTURE_CAPACITY;
    use std::{
        cell::{Cell, RefCell},
        io::Cursor,
        rc::Rc,
    };

    /// Advances by `step` on every reading and records sleeps. Clones share their state.
    #[derive(Clone, Default)]
    struct StepClock {
        step: Duration,
        now: Rc<Cell<Duration>>,
        sleeps: Rc<RefCell<Vec<Duration>>>,
    }

    impl StepClock {
        fn new(step: Duration) -> StepClock {
            StepClock {
                step,
                ..Default::default()
            }
        }

        fn sleeps(&self) -> Vec<Duration> {
            self.sleeps.borrow().clone()
        }
    }

    impl Clock for StepClock {
        fn now(&self) -> Duration {
            let now = self.now.get() + self.step;
            self.now.set(now);
            now
        }

        fn sleep(&self, duration: Duration) {
            self.sleeps.borrow_mut().push(duration);
        }
    }

    fn host() -> (SimulatedGpio, GpioHost<SimulatedGpio>) {
        let pins = PinAssignment::DEFAULT;
        let sim = SimulatedGpio::with_chain(pins.tck, pins.tdo, false);
        let mut host = Builder::new().build_simulated(sim.clone());
        host.setup().unwrap();
        (sim, host)
    }

    #[test]
    fn setup_configures_and_shutdown_releases() {
        let (_, mut host) = host();
        assert!(host.is_set_up());
        host.shutdown().unwrap();
        assert!(!host.is_set_up());
    }

    #[test]
    fn failing_hardware_is_reported() {
        let mut host: GpioHost<SimulatedGpio> = GpioHost::new(Config::default(), || {
            Err(io::Error::from(ErrorKind::PermissionDenied))
        });
        let err = host.setup().unwrap_err();
        assert!(err.is_fatal());
        assert!(!host.is_set_up());
    }

    #[test]
    fn undriven_tdi_is_not_counted() {
        let (sim, mut host) = host();
        for tms in [false, true] {
            for tdo in [None, Some(false), Some(true)] {
                host.pulse_tck(tms, None, tdo, false, false);
            }
        }
        assert_eq!(host.session().tdi_bits(), 0);
        assert_eq!(host.session().clock_count(), 6);
        assert_eq!(sim.tck_edges(), 6);
    }

    #[test]
    fn driven_tdi_is_counted_and_applied() {
        let (sim, mut host) = host();
        host.pulse_tck(false, Some(true), None, false, false);
        host.pulse_tck(true, Some(false), None, false, false);
        assert_eq!(host.session().tdi_bits(), 2);
        let pins = PinAssignment::DEFAULT;
        assert_eq!(sim.levels_at_edges(pins.tdi), vec![true, false]);
        assert_eq!(sim.levels_at_edges(pins.tms), vec![false, true]);
    }

    #[test]
    fn matching_tdo_is_not_a_mismatch() {
        let (sim, mut host) = host();
        sim.script_tdo([true, false]);
        assert_eq!(
            host.pulse_tck(false, None, Some(true), false, false),
            PulseStatus::Tdo(true)
        );
        assert_eq!(
            host.pulse_tck(false, None, Some(false), false, false),
            PulseStatus::Tdo(false)
        );
        assert_eq!(host.session().tdo_bits(), 2);
    }

    #[test]
    fn differing_tdo_is_a_mismatch_and_counted() {
        let (sim, mut host) = host();
        sim.script_tdo([true, false]);
        let first = host.pulse_tck(false, None, Some(false), false, false);
        assert_eq!(first, PulseStatus::Mismatch);
        assert_eq!(first.code(), -1);
        assert_eq!(
            host.pulse_tck(false, None, Some(true), false, false),
            PulseStatus::Mismatch
        );
        assert_eq!(host.session().tdo_bits(), 2);
    }

    #[test]
    fn unchecked_tdo_is_returned() {
        let (sim, mut host) = host();
        sim.script_tdo([true]);
        assert_eq!(host.pulse_tck(false, None, None, false, false).code(), 1);
        assert_eq!(host.pulse_tck(false, None, None, false, false).code(), 0);
        assert_eq!(host.session().tdo_bits(), 0);
    }

    #[test]
    fn capture_stops_at_capacity() {
        let (sim, mut host) = host();
        sim.script_tdo((0..CAPTURE_CAPACITY).map(|i| i % 3 == 0));
        for _ in 0..CAPTURE_CAPACITY {
            host.pulse_tck(false, None, None, true, false);
        }
        assert_eq!(host.session().captured().len(), CAPTURE_CAPACITY);

        let status = host.pulse_tck(false, None, Some(false), true, false);
        assert_eq!(status, PulseStatus::Tdo(false));
        assert_eq!(host.session().captured().len(), CAPTURE_CAPACITY);
        assert_eq!(host.session().clock_count(), CAPTURE_CAPACITY as u64 + 1);
        assert_eq!(host.session().captured().as_slice()[3], 1);
    }

    #[test]
    fn only_rmask_pulses_capture() {
        let (sim, mut host) = host();
        sim.script_tdo([true, false, true]);
        host.pulse_tck(false, None, None, true, false);
        host.pulse_tck(false, None, None, false, false);
        host.pulse_tck(false, None, None, true, false);
        assert_eq!(host.session().captured().as_slice(), &[1, 1]);
    }

    #[test]
    fn pulses_before_setup_do_nothing() {
        let pins = PinAssignment::DEFAULT;
        let sim = SimulatedGpio::with_chain(pins.tck, pins.tdo, true);
        let mut host = Builder::new().build_simulated(sim.clone());
        assert_eq!(
            host.pulse_tck(true, Some(true), None, true, false),
            PulseStatus::Tdo(false)
        );
        assert_eq!(sim.tck_edges(), 0);
        assert_eq!(host.session().clock_count(), 0);
    }

    #[test]
    fn delay_clocks_requested_cycles() {
        let (sim, mut host) = host();
        host.udelay(0, true, 5);
        assert_eq!(sim.tck_edges(), 5);
        // delays do not count as pulses
        assert_eq!(host.session().clock_count(), 0);
    }

    #[test]
    fn delay_deducts_clocking_time() {
        let pins = PinAssignment::DEFAULT;
        let sim = SimulatedGpio::with_chain(pins.tck, pins.tdo, false);
        let clock = StepClock::new(Duration::from_micros(100));
        let mut host = Builder::new()
            .verbosity(3)
            .build_simulated(sim.clone())
            .with_clock(clock.clone());
        host.setup().unwrap();

        host.udelay(1000, true, 4);
        assert_eq!(sim.tck_edges(), 4);
        assert_eq!(sim.levels_at_edges(pins.tms), vec![true; 4]);
        assert_eq!(clock.sleeps(), vec![Duration::from_micros(900)]);

        host.udelay(50, false, 0);
        assert_eq!(clock.sleeps()[1], Duration::from_micros(50));
    }

    #[test]
    fn delay_before_setup_still_waits() {
        let pins = PinAssignment::DEFAULT;
        let sim = SimulatedGpio::with_chain(pins.tck, pins.tdo, false);
        let clock = StepClock::new(Duration::from_micros(100));
        let mut host = Builder::new()
            .build_simulated(sim.clone())
            .with_clock(clock.clone());

        host.udelay(10_000, false, 3);
        host.udelay(0, true, 2);
        host.udelay(-20, true, 0);
        assert_eq!(clock.sleeps(), vec![Duration::from_micros(10_000)]);
        assert_eq!(sim.tck_edges(), 0);
        assert!(!host.is_set_up());
    }

    #[test]
    fn bytes_come_from_the_source() {
        let (_, mut host) = host();
        assert_eq!(host.next_byte(), None);
        host.session_mut().set_source(Cursor::new(vec![0x07, 0x20]));
        assert_eq!(host.next_byte(), Some(0x07));
        assert_eq!(host.next_byte(), Some(0x20));
        assert_eq!(host.next_byte(), None);
        host.session_mut().close_source();
        assert_eq!(host.next_byte(), None);
    }

    #[test]
    fn missing_source_file_is_recoverable() {
        let (_, mut host) = host();
        let err = host
            .session_mut()
            .open_source("/nonexistent/vectors.xsvf")
            .unwrap_err();
        assert!(matches!(err, HostError::Source { .. }));
        assert!(!err.is_fatal());
    }

    #[test]
    fn frequency_requests_are_accepted() {
        let (_, mut host) = host();
        assert!(host.set_frequency(1_000_000).is_ok());
    }

    #[test]
    fn devices_are_decoded() {
        let (_, mut host) = host();
        host.report_device(0x1234_5678);
        let device = host.session().devices()[0];
        assert_eq!(device.manufacturer(), 0x33c);
        assert_eq!(device.part(), 0x2345);
        assert_eq!(device.revision(), 1);
        assert_eq!(host.session_mut().take_devices().len(), 1);
        assert!(host.session().devices().is_empty());
    }

    #[test]
    fn realloc_tracks_maximum_and_resizes() {
        let (_, mut host) = host();
        let buf = host.realloc(Vec::new(), 10, MemKind::SvfCommandBuf);
        assert_eq!(buf.len(), 10);
        let mut buf = host.realloc(buf, 30, MemKind::SvfCommandBuf);
        assert_eq!(buf.len(), 30);
        buf[0] = 0xaa;
        let buf = host.realloc(buf, 5, MemKind::SvfCommandBuf);
        assert_eq!(buf, vec![0xaa, 0, 0, 0, 0]);
        let buf = host.realloc(buf, 0, MemKind::SvfCommandBuf);
        assert!(buf.is_empty());
        assert_eq!(host.profile().max(MemKind::SvfCommandBuf), 30);
    }

    #[test]
    fn unavailable_lines_are_harmless() {
        let (sim, mut host) = host();
        host.pulse_sck();
        host.set_trst(Trst::On);
        assert_eq!(sim.tck_edges(), 0);
    }
}
