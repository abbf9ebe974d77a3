use std::{
    error::Error,
    io::{self, Write},
    process::ExitCode,
};

use clap::{ArgAction, CommandFactory, Parser};
use clap_num::maybe_hex;
use env_logger::Env;
use xsvf_gpio::{
    Builder, GpioHost,
    backends::sim::SimulatedGpio,
    gpio::{DEFAULT_PERI_BASE, RegisterAccess},
    rmask::{self, RmaskFormat},
    signals::PinAssignment,
};
use xsvf_host::scan::scan_chain;

#[derive(Parser)]
#[command(
    name = "xsvftool-gpio",
    version,
    about = "JTAG through the GPIO header of a Raspberry Pi",
    long_about = None
)]
struct Args {
    /// Dump C code for a pseudo-allocator sized by the buffers used in this run
    #[arg(short = 'r', value_name = "FUNCNAME")]
    realloc_name: Option<String>,

    /// Verbose, more verbose and even more verbose (up to -vvvv)
    #[arg(short, action = ArgAction::Count)]
    verbose: u8,

    /// Print RMASK bits as little endian hex value
    #[arg(short = 'L', overrides_with = "big_endian")]
    little_endian: bool,

    /// Print RMASK bits as big endian hex value
    #[arg(short = 'B', overrides_with = "little_endian")]
    big_endian: bool,

    /// List devices in JTAG chain, may be repeated
    #[arg(short = 'c', action = ArgAction::Count)]
    scan: u8,

    /// Physical base address of the SoC peripherals
    #[arg(long, value_parser = maybe_hex::<u64>, default_value = "0x3F000000")]
    peri_base: u64,

    /// Use a simulated GPIO block instead of /dev/mem
    #[arg(long)]
    simulate: bool,
}

impl Args {
    fn rmask_format(&self) -> RmaskFormat {
        if self.big_endian {
            RmaskFormat::HexBigEndian
        } else if self.little_endian {
            RmaskFormat::HexLittleEndian
        } else {
            RmaskFormat::Decimal
        }
    }

    fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 | 2 => "info",
            3 => "debug",
            _ => "trace",
        }
    }
}

fn main() -> Result<ExitCode, Box<dyn Error>> {
    let args = Args::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or(args.log_level())).init();

    if args.scan == 0 {
        eprint!("{}", Args::command().render_help());
        return Ok(ExitCode::FAILURE);
    }
    log::info!("xsvftool-gpio {}", env!("CARGO_PKG_VERSION"));

    let builder = Builder::new()
        .peri_base(args.peri_base)
        .verbosity(args.verbose);
    if args.simulate {
        let pins = PinAssignment::DEFAULT;
        log::info!("Using a simulated GPIO block");
        let mut host = builder.build_simulated(SimulatedGpio::with_chain(pins.tck, pins.tdo, true));
        run(&mut host, &args)
    } else {
        log::debug!("Peripheral base: 0x{:x}", args.peri_base);
        let mut host = builder.build();
        run(&mut host, &args)
    }
}

fn run<R: RegisterAccess>(
    host: &mut GpioHost<R>,
    args: &Args,
) -> Result<ExitCode, Box<dyn Error>> {
    let mut out = io::stdout().lock();
    let mut failed = false;

    for _ in 0..args.scan {
        match scan_chain(host) {
            Ok(devices) => log::info!("Found {} devices", devices),
            Err(e) if e.is_fatal() => {
                log::error!("{}", e);
                log::error!("Did you forget to run as root?");
                return Ok(ExitCode::FAILURE);
            }
            Err(e) => {
                log::error!("Error while scanning JTAG chain: {}", e);
                failed = true;
            }
        }
        for device in host.session_mut().take_devices() {
            writeln!(out, "{}", device)?;
        }
    }

    let session = host.session();
    if args.verbose > 0 {
        log::info!("Total number of clock cycles: {}", session.clock_count());
        log::info!("Number of significant TDI bits: {}", session.tdi_bits());
        log::info!("Number of significant TDO bits: {}", session.tdo_bits());
        if failed {
            log::info!("Finished with errors!");
        } else {
            log::info!("Finished without errors.");
        }
    }

    if !session.captured().is_empty() {
        writeln!(
            out,
            "{}",
            rmask::encode(session.captured(), args.rmask_format())
        )?;
    }

    if let Some(name) = &args.realloc_name {
        host.profile().write_allocator(name, &mut out)?;
    }

    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
