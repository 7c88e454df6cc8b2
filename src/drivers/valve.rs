//! Zone valve: one bit of the register's one-hot valve field.

use log::info;

use crate::app::ports::IoBoard;
use crate::drivers::register::RegisterBus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Valve {
    mask: u8,
}

impl Valve {
    /// Valve of zone `zone` (0-based), driving valve bit `zone`.
    pub const fn for_zone(zone: usize) -> Self {
        Self {
            mask: 1 << (zone as u8),
        }
    }

    pub const fn mask(&self) -> u8 {
        self.mask
    }

    /// Open this valve.  Any other open valve is closed in the same latch.
    pub fn open<B: IoBoard>(&self, bus: &mut RegisterBus<B>) {
        if bus.set_valves(self.mask) {
            info!("valve 0b{:04b}: open", self.mask);
        }
    }

    /// Close this valve, leaving the others alone.
    pub fn close<B: IoBoard>(&self, bus: &mut RegisterBus<B>) {
        let valves = bus.valves() & !self.mask;
        if bus.set_valves(valves) {
            info!("valve 0b{:04b}: closed", self.mask);
        }
    }

    pub fn is_open<B: IoBoard>(&self, bus: &RegisterBus<B>) -> bool {
        bus.valves() & self.mask != 0
    }
}
