//! IEEE 1149.1 TAP controller states and a walker that moves the TAP through the
//! [`XsvfHost`] contract.
use std::{collections::VecDeque, fmt::Display};

use crate::XsvfHost;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum TapState {
    Reset = 0,
    Idle = 1,
    DrSelect = 2,
    DrCapture = 3,
    DrShift = 4,
    DrExit1 = 5,
    DrPause = 6,
    DrExit2 = 7,
    DrUpdate = 8,
    IrSelect = 9,
    IrCapture = 10,
    IrShift = 11,
    IrExit1 = 12,
    IrPause = 13,
    IrExit2 = 14,
    IrUpdate = 15,
}

impl TapState {
    pub const ALL: [TapState; 16] = [
        TapState::Reset,
        TapState::Idle,
        TapState::DrSelect,
        TapState::DrCapture,
        TapState::DrShift,
        TapState::DrExit1,
        TapState::DrPause,
        TapState::DrExit2,
        TapState::DrUpdate,
        TapState::IrSelect,
        TapState::IrCapture,
        TapState::IrShift,
        TapState::IrExit1,
        TapState::IrPause,
        TapState::IrExit2,
        TapState::IrUpdate,
    ];

    /// The state the TAP enters on a rising TCK edge with TMS at `tms`.
    pub fn next(self, tms: bool) -> TapState {
        use TapState::*;
        match (self, tms) {
            (Reset, false) => Idle,
            (Reset, true) => Reset,
            (Idle, false) => Idle,
            (Idle, true) => DrSelect,
            (DrSelect, false) => DrCapture,
            (DrSelect, true) => IrSelect,
            (DrCapture, false) | (DrShift, false) | (DrExit2, false) => DrShift,
            (DrCapture, true) | (DrShift, true) => DrExit1,
            (DrExit1, false) | (DrPause, false) => DrPause,
            (DrExit1, true) | (DrExit2, true) => DrUpdate,
            (DrPause, true) => DrExit2,
            (DrUpdate, false) | (IrUpdate, false) => Idle,
            (DrUpdate, true) | (IrUpdate, true) => DrSelect,
            (IrSelect, false) => IrCapture,
            (IrSelect, true) => Reset,
            (IrCapture, false) | (IrShift, false) | (IrExit2, false) => IrShift,
            (IrCapture, true) | (IrShift, true) => IrExit1,
            (IrExit1, false) | (IrPause, false) => IrPause,
            (IrExit1, true) | (IrExit2, true) => IrUpdate,
            (IrPause, true) => IrExit2,
        }
    }

    /// Name of the state as used in SVF files
    pub fn name(self) -> &'static str {
        match self {
            TapState::Reset => "RESET",
            TapState::Idle => "IDLE",
            TapState::DrSelect => "DRSELECT",
            TapState::DrCapture => "DRCAPTURE",
            TapState::DrShift => "DRSHIFT",
            TapState::DrExit1 => "DREXIT1",
            TapState::DrPause => "DRPAUSE",
            TapState::DrExit2 => "DREXIT2",
            TapState::DrUpdate => "DRUPDATE",
            TapState::IrSelect => "IRSELECT",
            TapState::IrCapture => "IRCAPTURE",
            TapState::IrShift => "IRSHIFT",
            TapState::IrExit1 => "IREXIT1",
            TapState::IrPause => "IRPAUSE",
            TapState::IrExit2 => "IREXIT2",
            TapState::IrUpdate => "IRUPDATE",
        }
    }

    /// Shortest TMS sequence leading from `self` to `target`.
    ///
    /// Breadth first over the state graph, trying TMS low before TMS high at every step.
    pub fn path_to(self, target: TapState) -> Vec<bool> {
        let mut visited = [false; 16];
        let mut queue = VecDeque::new();
        visited[self as usize] = true;
        queue.push_back((self, Vec::new()));

        while let Some((state, path)) = queue.pop_front() {
            if state == target {
                return path;
            }
            for tms in [false, true] {
                let next = state.next(tms);
                if !visited[next as usize] {
                    visited[next as usize] = true;
                    let mut next_path = path.clone();
                    next_path.push(tms);
                    queue.push_back((next, next_path));
                }
            }
        }
        unreachable!("every TAP state is reachable from every other state")
    }
}

impl Display for TapState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Tracks the TAP state of the chain while moving it with TMS pulses.
#[derive(Debug, Clone)]
pub struct TapController {
    state: TapState,
}

impl Default for TapController {
    fn default() -> Self {
        Self::new()
    }
}

impl TapController {
    /// The real state is unknown until the first walk to [`TapState::Reset`].
    pub fn new() -> TapController {
        TapController {
            state: TapState::Reset,
        }
    }

    pub fn state(&self) -> TapState {
        self.state
    }

    /// Account for a TCK cycle issued outside of [`TapController::walk`], such as the last bit
    /// of a shift which leaves Shift-xR.
    pub fn advance(&mut self, tms: bool) -> TapState {
        self.state = self.state.next(tms);
        self.state
    }

    /// Move the TAP to `target`, reporting every state passed through.
    ///
    /// Walking to [`TapState::Reset`] always clocks five cycles with TMS high, which reaches
    /// Test-Logic-Reset from any state.
    pub fn walk<H: XsvfHost + ?Sized>(&mut self, host: &mut H, target: TapState) {
        if target == TapState::Reset {
            log::trace!("TAP reset from {}", self.state);
            for _ in 0..5 {
                host.pulse_tck(true, None, None, false, false);
            }
            self.state = TapState::Reset;
            host.report_tapstate(self.state);
            return;
        }

        let path = self.state.path_to(target);
        log::trace!("TAP walk {} -> {}: {:?}", self.state, target, path);
        for tms in path {
            host.pulse_tck(tms, None, None, false, false);
            self.state = self.state.next(tms);
            host.report_tapstate(self.state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn five_tms_high_reach_reset_from_anywhere() {
        for start in TapState::ALL {
            let mut state = start;
            for _ in 0..5 {
                state = state.next(true);
            }
            assert_eq!(state, TapState::Reset, "starting from {}", start);
        }
    }

    #[test]
    fn reset_to_drshift() {
        assert_eq!(
            TapState::Reset.path_to(TapState::DrShift),
            vec![false, true, false, false]
        );
    }

    #[test]
    fn reset_to_irshift() {
        assert_eq!(
            TapState::Reset.path_to(TapState::IrShift),
            vec![false, true, true, false, false]
        );
    }

    #[test]
    fn pause_to_shift_uses_exit2() {
        assert_eq!(
            TapState::DrPause.path_to(TapState::DrShift),
            vec![true, false]
        );
    }

    #[test]
    fn advance_follows_transitions() {
        let mut tap = TapController::new();
        assert_eq!(tap.advance(false), TapState::Idle);
        assert_eq!(tap.advance(true), TapState::DrSelect);
        assert_eq!(tap.state(), TapState::DrSelect);
    }

    #[test]
    fn path_to_self_is_empty() {
        assert!(TapState::Idle.path_to(TapState::Idle).is_empty());
    }

    #[test]
    fn every_path_arrives() {
        for from in TapState::ALL {
            for to in TapState::ALL {
                let end = from
                    .path_to(to)
                    .into_iter()
                    .fold(from, |state, tms| state.next(tms));
                assert_eq!(end, to);
            }
        }
    }
}
