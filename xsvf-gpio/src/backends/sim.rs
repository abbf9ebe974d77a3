//! # Simulated GPIO block
//!
//! An in-memory register file with the write semantics of the real block: writes to GPSET and
//! GPCLR update the level registers, everything else behaves like plain memory.
//!
//! Optionally a simulated JTAG chain is attached: on every rising TCK edge the level of the
//! other pins is recorded and the next scripted TDO level is presented. Once the script is
//! exhausted TDO idles at a fixed level.
//!
//! Clones share the same registers, so a test can keep a handle while a host owns another.
use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    rc::Rc,
};

use crate::gpio::{BLOCK_WORDS, Pin, Register, RegisterAccess};

#[derive(Debug)]
struct JtagLines {
    tck: Pin,
    tdo: Pin,
    script: VecDeque<bool>,
    idle_tdo: bool,
    edges: Vec<[u32; 2]>,
}

#[derive(Debug)]
struct SimState {
    words: Vec<Cell<u32>>,
    last_writes: Vec<Cell<Option<u32>>>,
    jtag: RefCell<Option<JtagLines>>,
}

#[derive(Debug, Clone)]
pub struct SimulatedGpio {
    state: Rc<SimState>,
}

impl Default for SimulatedGpio {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedGpio {
    /// All registers zero, no chain attached.
    pub fn new() -> SimulatedGpio {
        SimulatedGpio {
            state: Rc::new(SimState {
                words: (0..BLOCK_WORDS).map(|_| Cell::new(0)).collect(),
                last_writes: (0..BLOCK_WORDS).map(|_| Cell::new(None)).collect(),
                jtag: RefCell::new(None),
            }),
        }
    }

    /// Attach a simulated chain clocked by `tck` that answers on `tdo`.
    pub fn with_chain(tck: Pin, tdo: Pin, idle_tdo: bool) -> SimulatedGpio {
        let sim = SimulatedGpio::new();
        sim.state.jtag.replace(Some(JtagLines {
            tck,
            tdo,
            script: VecDeque::new(),
            idle_tdo,
            edges: Vec::new(),
        }));
        sim.present_tdo(idle_tdo);
        sim
    }

    /// Queue TDO levels, one per rising TCK edge.
    pub fn script_tdo(&self, levels: impl IntoIterator<Item = bool>) {
        if let Some(jtag) = self.state.jtag.borrow_mut().as_mut() {
            jtag.script.extend(levels);
        }
    }

    /// Number of rising TCK edges seen so far.
    pub fn tck_edges(&self) -> usize {
        self.state
            .jtag
            .borrow()
            .as_ref()
            .map_or(0, |jtag| jtag.edges.len())
    }

    /// Level of `pin` at each rising TCK edge.
    pub fn levels_at_edges(&self, pin: Pin) -> Vec<bool> {
        let (bank, bit) = (pin.number() as usize / 32, pin.number() % 32);
        self.state
            .jtag
            .borrow()
            .as_ref()
            .map_or_else(Vec::new, |jtag| {
                jtag.edges
                    .iter()
                    .map(|levels| levels[bank] & (1 << bit) != 0)
                    .collect()
            })
    }

    /// Raw register content, bypassing the set/clear semantics.
    pub fn peek(&self, word: usize) -> u32 {
        self.state.words[word].get()
    }

    /// Overwrite a register, bypassing the set/clear semantics.
    pub fn poke(&self, word: usize, value: u32) {
        self.state.words[word].set(value)
    }

    /// Value most recently written to `word` through [`RegisterAccess::write`].
    pub fn last_write(&self, word: usize) -> Option<u32> {
        self.state.last_writes[word].get()
    }

    fn level(&self, bank: u8) -> &Cell<u32> {
        &self.state.words[Register::Level(bank).word()]
    }

    fn present_tdo(&self, level: bool) {
        let tdo = match self.state.jtag.borrow().as_ref() {
            Some(jtag) => jtag.tdo,
            None => return,
        };
        let (bank, mask) = (tdo.number() / 32, 1 << (tdo.number() % 32));
        let cell = self.level(bank);
        if level {
            cell.set(cell.get() | mask);
        } else {
            cell.set(cell.get() & !mask);
        }
    }

    fn set_bits(&self, bank: u8, mask: u32) {
        let level = self.level(bank);
        let before = level.get();
        level.set(before | mask);

        let next_tdo = match self.state.jtag.borrow_mut().as_mut() {
            Some(jtag) => {
                let tck = jtag.tck.number();
                let tck_mask = 1 << (tck % 32);
                if tck / 32 == bank && mask & tck_mask != 0 && before & tck_mask == 0 {
                    jtag.edges.push([self.level(0).get(), self.level(1).get()]);
                    Some(jtag.script.pop_front().unwrap_or(jtag.idle_tdo))
                } else {
                    None
                }
            }
            None => None,
        };
        if let Some(tdo) = next_tdo {
            self.present_tdo(tdo);
        }
    }
}

impl RegisterAccess for SimulatedGpio {
    fn read(&self, word: usize) -> u32 {
        match word {
            // write-only
            7 | 8 | 10 | 11 => 0,
            _ => self.state.words[word].get(),
        }
    }

    fn write(&self, word: usize, value: u32) {
        self.state.last_writes[word].set(Some(value));
        match word {
            7 | 8 => self.set_bits(word as u8 - 7, value),
            10 | 11 => {
                let level = self.level(word as u8 - 10);
                level.set(level.get() & !value);
            }
            _ => self.state.words[word].set(value),
        }
    }
}
