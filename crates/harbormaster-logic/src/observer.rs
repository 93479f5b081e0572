//! Read-only hooks into the tower loop.
//!
//! The tower calls [`HarborObserver::on_admitted`] once per vessel that makes
//! it onto the surface and [`HarborObserver::on_cycle`] once per cycle, after
//! planning and before the planned moves are applied. Observers only ever
//! get shared references, so they cannot change the simulation.

use std::collections::VecDeque;
use std::io::Write;

use serde::Serialize;

use crate::harbor::Harbor;
use crate::tower::PlannedMove;
use crate::vessel::{Modifier, Vessel, VesselKind};

/// Which loop produced a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    Arrival,
    Drain,
}

/// Snapshot handed to observers each cycle.
pub struct CycleView<'a> {
    pub phase: Phase,
    pub cycle: u64,
    pub harbor: &'a Harbor,
    pub queue: &'a VecDeque<Vessel>,
    /// Moves planned this cycle, not yet applied.
    pub planned: &'a [PlannedMove],
}

pub trait HarborObserver {
    fn on_admitted(&mut self, _vessel: &Vessel) {}

    fn on_cycle(&mut self, _view: &CycleView<'_>) {}

    /// Called once after the drain, for observers that buffer output.
    fn on_finished(&mut self) {}
}

/// One line of the fleet export.
#[derive(Debug, Clone, Serialize)]
pub struct FleetRecord<'a> {
    pub name: &'a str,
    pub kind: VesselKind,
    pub label: &'static str,
    pub priority: u8,
    pub failure_probability: f64,
    pub speed: u32,
    pub engine_base: u32,
    pub boosters: &'a [Modifier],
    pub hull: u32,
    pub hull_base: u32,
    pub platings: &'a [Modifier],
}

impl<'a> FleetRecord<'a> {
    pub fn from_vessel(vessel: &'a Vessel) -> Self {
        Self {
            name: vessel.name(),
            kind: vessel.kind(),
            label: vessel.kind().traits().label,
            priority: vessel.priority(),
            failure_probability: vessel.failure_probability(),
            speed: vessel.speed(),
            engine_base: vessel.propulsion_rating().base(),
            boosters: vessel.propulsion_rating().modifiers(),
            hull: vessel.hull(),
            hull_base: vessel.hull_rating().base(),
            platings: vessel.hull_rating().modifiers(),
        }
    }
}

/// Writes one JSON object per admitted vessel.
///
/// Write failures are logged and counted; they never stop the simulation.
pub struct FleetExport<W: Write> {
    out: W,
    written: usize,
    failed: usize,
}

impl<W: Write> FleetExport<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            written: 0,
            failed: 0,
        }
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> HarborObserver for FleetExport<W> {
    fn on_admitted(&mut self, vessel: &Vessel) {
        let record = FleetRecord::from_vessel(vessel);
        let result = serde_json::to_writer(&mut self.out, &record)
            .map_err(std::io::Error::from)
            .and_then(|_| self.out.write_all(b"\n"));
        match result {
            Ok(()) => self.written += 1,
            Err(e) => {
                self.failed += 1;
                log::warn!("Fleet export failed for {}: {}", vessel.name(), e);
            }
        }
    }

    fn on_finished(&mut self) {
        if let Err(e) = self.out.flush() {
            log::warn!("Could not flush fleet export: {}", e);
        }
        log::info!("Fleet export wrote {} records ({} failed)", self.written, self.failed);
    }
}
