//! JTAG chain enumeration through the host contract.
use crate::{
    HostError, PulseStatus, XsvfHost,
    tap::{TapController, TapState},
};

/// Upper bound on the number of devices examined on one chain.
pub const MAX_DEVICES: usize = 256;

/// Scan the chain and report every device through [`XsvfHost::report_device`].
///
/// After Test-Logic-Reset, every device with an IDCODE register selects it and devices without
/// one select BYPASS. Shifting the data registers out then yields a `1` followed by 31 more
/// IDCODE bits for the former and a single `0` for the latter, which is reported as device
/// `0`. An all-ones IDCODE marks the end of the chain, since TDI is held high.
///
/// Returns the number of devices reported. The host is set up before and shut down after
/// the scan.
pub fn scan_chain<H: XsvfHost + ?Sized>(host: &mut H) -> Result<usize, HostError> {
    host.setup()?;
    let result = scan_devices(host);
    host.shutdown()?;
    result
}

fn scan_devices<H: XsvfHost + ?Sized>(host: &mut H) -> Result<usize, HostError> {
    let mut tap = TapController::new();
    tap.walk(host, TapState::Reset);
    tap.walk(host, TapState::DrShift);

    let mut devices = 0;
    for _ in 0..MAX_DEVICES {
        if !shift_bit(host)? {
            log::debug!("Device {} is in BYPASS", devices);
            host.report_device(0);
            devices += 1;
            continue;
        }

        let mut idcode: u32 = 1;
        for bit in 1..32 {
            idcode |= (shift_bit(host)? as u32) << bit;
        }
        if idcode == 0xffff_ffff {
            break;
        }
        log::debug!("Device {} has idcode 0x{:08x}", devices, idcode);
        host.report_device(idcode);
        devices += 1;
    }
    Ok(devices)
}

fn shift_bit<H: XsvfHost + ?Sized>(host: &mut H) -> Result<bool, HostError> {
    match host.pulse_tck(false, Some(true), None, false, false) {
        PulseStatus::Tdo(bit) => Ok(bit),
        PulseStatus::Mismatch => Err(HostError::Protocol(
            "TDO mismatch reported without an expected value".to_string(),
        )),
    }
}
