//! The control tower: arrivals, dock assignment, movement and drain.
//!
//! A [`Tower`] owns the [`Harbor`], the random source and the arrival queue.
//! Each main cycle it:
//!
//! 1. waits out the pacing delay (skipped when zero),
//! 2. plans up to `speed` sub-steps for every resident vessel against the
//!    unchanged pre-cycle harbor,
//! 3. shows the plan to observers,
//! 4. applies the planned moves in order, re-validating each one,
//! 5. handles at most one arrival (a new vessel or the queue head).
//!
//! The main loop runs until no dock is free and nobody needed to move in the
//! previous cycle. The drain loop then walks residents one at a time to the
//! nearest entry point and removes them there, until the surface is empty.
//! Both loops stop at `max_cycles`.

use std::collections::VecDeque;
use std::thread;
use std::time::Duration;

use serde::Serialize;

use crate::config::{SimConfig, DEFAULT_ARRIVAL_PERCENT, DEFAULT_MAX_CYCLES};
use crate::dice::{Dice, SeededDice};
use crate::error::{AdmissionError, HarborError};
use crate::geometry::{manhattan_distance, Direction, Point};
use crate::harbor::{DockId, Harbor, MoveOutcome};
use crate::observer::{CycleView, HarborObserver, Phase};
use crate::vessel::{Manufactory, Vessel, VesselKind};

/// Loop parameters, usually built with [`SimConfig::tower_settings`].
///
/// [`SimConfig::tower_settings`]: crate::config::SimConfig::tower_settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TowerSettings {
    /// Chance (0–100) of a new arrival per cycle.
    pub arrival_percent: u8,
    pub cycle_delay: Duration,
    pub max_cycles: u64,
}

impl Default for TowerSettings {
    /// Default arrival rate and cap, no pacing.
    fn default() -> Self {
        Self {
            arrival_percent: DEFAULT_ARRIVAL_PERCENT,
            cycle_delay: Duration::ZERO,
            max_cycles: DEFAULT_MAX_CYCLES,
        }
    }
}

/// One planned sub-step. Only meaningful within the cycle that planned it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMove {
    pub vessel: String,
    pub from: Point,
    pub to: Point,
}

/// Counters for one run of the main or drain loop.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub cycles: u64,
    /// Vessels that entered the harbor and got a dock.
    pub admitted: u64,
    /// Vessels sent to the arrival queue. A queue head that goes straight
    /// back is not counted again.
    pub queued: u64,
    /// Vessels dropped on an entry point for lack of an acceptable dock.
    pub stranded: u64,
    /// Vessels turned away because their name was already in the harbor.
    pub rejected: u64,
    pub preemptions: u64,
    pub collisions: u64,
    /// Vessels that left through an entry point during the drain.
    pub drained: u64,
    /// Vessels removed because the loop hit `max_cycles`.
    pub evicted: u64,
    pub hit_cap: bool,
}

impl RunReport {
    /// Every vessel that left the harbor other than through an exit.
    pub fn destroyed(&self) -> u64 {
        self.stranded + self.rejected + self.preemptions + self.collisions + self.evicted
    }
}

pub struct Tower<D: Dice = SeededDice> {
    harbor: Harbor,
    dice: D,
    settings: TowerSettings,
    queue: VecDeque<Vessel>,
    planned: Vec<PlannedMove>,
    observers: Vec<Box<dyn HarborObserver>>,
    cycle: u64,
    serial: u32,
    drain_target: Option<String>,
    report: RunReport,
}

impl<D: Dice> Tower<D> {
    pub fn new(harbor: Harbor, dice: D, settings: TowerSettings) -> Self {
        Self {
            harbor,
            dice,
            settings,
            queue: VecDeque::new(),
            planned: Vec::new(),
            observers: Vec::new(),
            cycle: 0,
            serial: 0,
            drain_target: None,
            report: RunReport::default(),
        }
    }

    /// Build the harbor from `config` (shuffling docks with `dice` when
    /// asked) and hand both to a new tower.
    pub fn from_config(config: &SimConfig, mut dice: D) -> Self {
        let harbor = Harbor::new(config.width, config.height, config.shuffle_docks, &mut dice);
        Self::new(harbor, dice, config.tower_settings())
    }

    pub fn add_observer(&mut self, observer: Box<dyn HarborObserver>) {
        self.observers.push(observer);
    }

    pub fn harbor(&self) -> &Harbor {
        &self.harbor
    }

    pub fn harbor_mut(&mut self) -> &mut Harbor {
        &mut self.harbor
    }

    pub fn queue(&self) -> &VecDeque<Vessel> {
        &self.queue
    }

    pub fn planned(&self) -> &[PlannedMove] {
        &self.planned
    }

    pub fn settings(&self) -> &TowerSettings {
        &self.settings
    }

    /// Cycles run so far, across both loops.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Counters of the loop in progress (or the last one started).
    pub fn report(&self) -> &RunReport {
        &self.report
    }

    /// Put a vessel at the back of the arrival queue.
    pub fn enqueue(&mut self, vessel: Vessel) {
        log::info!(
            "{} joined the waiting queue (queue size is now {})",
            vessel.name(),
            self.queue.len() + 1
        );
        self.report.queued += 1;
        self.queue.push_back(vessel);
    }

    // ========================================================================
    // ROUTE PLANNING
    // ========================================================================

    /// Plan up to `speed` sub-steps for the vessel at `source`.
    ///
    /// Each sub-step heads along the dominant axis of the remaining offset.
    /// An engine failure costs the sub-step. A cell held by a strictly
    /// stronger hull stops the vessel for that sub-step; anything weaker or
    /// equal is planned through and left to the apply phase to settle.
    ///
    /// Returns whether the vessel needed to move this cycle.
    pub fn trace_route(&mut self, source: Point, destination: Point) -> bool {
        if source == destination {
            return false;
        }
        let Some(vessel) = self.harbor.vessel_at(source) else {
            log::warn!(
                "Cannot trace route from {} to {}: no vessel at {}",
                source,
                destination,
                source
            );
            return false;
        };

        log::debug!("Roadmap for {} toward {}:", vessel.name(), destination);
        let mut cursor = source;
        for step in 1..=vessel.speed() {
            if cursor == destination {
                break;
            }
            let next = cursor + Direction::dominant(destination - cursor);

            if self.dice.roll_real(0.0, 1.0) < vessel.failure_probability() {
                log::debug!("\t{}: [ENGINE FAILURE] {}", step, cursor);
            } else if self
                .harbor
                .vessel_at(next)
                .map_or(true, |other| other.hull() <= vessel.hull())
            {
                log::debug!("\t{}: {} -> {}", step, cursor, next);
                self.planned.push(PlannedMove {
                    vessel: vessel.name().to_string(),
                    from: cursor,
                    to: next,
                });
                cursor = next;
            } else {
                log::debug!("\t{}: [STAY PUT] {}", step, cursor);
            }
        }
        true
    }

    /// Plan this cycle's moves for every resident. Returns `true` when
    /// nobody needed to move.
    pub fn plan_movements(&mut self) -> bool {
        self.planned.clear();

        let mut routes = Vec::with_capacity(self.harbor.vessel_count());
        for (point, vessel) in self.harbor.surface() {
            match self
                .harbor
                .reserved_dock(vessel.name())
                .and_then(|dock| self.harbor.dock_position(dock))
            {
                Some(dock) => routes.push((point, dock)),
                None => log::error!(
                    "[CRITICAL] {} at {} holds no dock; skipping it this cycle",
                    vessel.name(),
                    point
                ),
            }
        }

        let mut all_reached = true;
        for (source, destination) in routes {
            all_reached &= !self.trace_route(source, destination);
        }
        all_reached
    }

    /// Apply the planned moves in order. A move whose vessel is no longer
    /// where the plan expects it is skipped.
    pub fn apply_planned_movements(&mut self) {
        for step in std::mem::take(&mut self.planned) {
            let in_place = self
                .harbor
                .vessel_at(step.from)
                .is_some_and(|v| v.name() == step.vessel);
            if !in_place {
                log::debug!("Dropping stale move of {} from {}", step.vessel, step.from);
                continue;
            }
            match self.harbor.move_vessel(step.from, step.to) {
                Ok(MoveOutcome::Moved) => {}
                Ok(MoveOutcome::Rammed { wreck }) => {
                    self.report.collisions += 1;
                    log::info!("{} sank at {}", wreck.name(), step.to);
                }
                Err(_) => {}
            }
        }
    }

    // ========================================================================
    // DOCKS AND ADMISSIONS
    // ========================================================================

    /// Find a dock for the resident vessel `name`: a free dock it accepts
    /// first, otherwise the dock of the first weaker-claim resident (in
    /// row-major order) whose dock it accepts. The preempted vessel is
    /// dropped.
    pub fn assign_dock(&mut self, name: &str) -> bool {
        let Some(requester) = self
            .harbor
            .vessel_position(name)
            .and_then(|p| self.harbor.vessel_at(p))
        else {
            log::warn!("Cannot assign a dock to {}: not on the surface", name);
            return false;
        };

        let free = self
            .harbor
            .free_docks()
            .iter()
            .copied()
            .find(|&dock| requester.accepts(dock));
        if let Some(dock) = free {
            return self.harbor.reserve_dock(dock, name).is_ok();
        }

        let incumbent: Option<(String, DockId)> = self.harbor.surface().find_map(|(_, other)| {
            if other.name() == name || !requester.outranks(other) {
                return None;
            }
            self.harbor
                .reserved_dock(other.name())
                .filter(|&dock| requester.accepts(dock))
                .map(|dock| (other.name().to_string(), dock))
        });
        let Some((incumbent, dock)) = incumbent else {
            return false;
        };

        log::info!("[PREEMPTION] {} takes dock {} from {}", name, dock, incumbent);
        if let Err(err) = self.harbor.remove_vessel(&incumbent) {
            log::error!("Failed to remove {} while preempting: {}", incumbent, err);
            return false;
        }
        self.report.preemptions += 1;
        match self.harbor.reserve_dock(dock, name) {
            Ok(()) => true,
            Err(err) => {
                log::error!("Failed to reserve freed dock {} for {}: {}", dock, name, err);
                false
            }
        }
    }

    /// Put `vessel` on the first free entry point and find it a dock.
    ///
    /// With no free entry point the vessel waits in the queue. A vessel that
    /// made it onto an entry point but found no dock is dropped there so it
    /// does not block later admissions.
    pub fn insert_vessel(&mut self, vessel: Vessel) {
        self.admit(vessel, false);
    }

    /// `from_queue` marks a vessel just popped off the queue head, which
    /// goes back to the tail without being counted as a new arrival.
    fn admit(&mut self, vessel: Vessel, from_queue: bool) {
        let Some(entry) = self.harbor.free_entry_point() else {
            self.wait(vessel, from_queue);
            return;
        };

        let name = vessel.name().to_string();
        if let Err(AdmissionError { reason, vessel }) = self.harbor.add_vessel(vessel, entry) {
            match reason {
                HarborError::DuplicateVessel(_) => {
                    log::warn!("Dropping {}: name already in use", vessel.name());
                    self.report.rejected += 1;
                }
                _ => self.wait(vessel, from_queue),
            }
            return;
        }

        if self.assign_dock(&name) {
            self.report.admitted += 1;
            if let Some(vessel) = self.harbor.vessel_at(entry) {
                for observer in &mut self.observers {
                    observer.on_admitted(vessel);
                }
            }
            return;
        }

        log::warn!("No suitable dock for {}; it will be scrapped", name);
        if self.harbor.remove_vessel(&name).is_ok() {
            self.report.stranded += 1;
        }
    }

    fn wait(&mut self, vessel: Vessel, from_queue: bool) {
        if !from_queue {
            self.enqueue(vessel);
            return;
        }
        log::info!(
            "{} went back to the waiting queue (queue size is now {})",
            vessel.name(),
            self.queue.len() + 1
        );
        self.queue.push_back(vessel);
    }

    /// Build a new vessel from a random manufactory and kind.
    pub fn create_vessel(&mut self) -> Vessel {
        let manufactory = Manufactory::from_roll(self.dice.roll_int(1, 2));
        let kind = VesselKind::from_roll(self.dice.roll_int(1, 4));
        self.serial += 1;
        let name = format!("{}-{:04}", kind.traits().code, self.serial);
        log::info!("{:?} manufactory builds {} ({})", manufactory, name, kind.traits().label);
        Vessel::manufacture(name, kind, manufactory, &mut self.dice)
    }

    /// At most one admission per cycle: a new arrival when the roll hits and
    /// free docks outnumber queued vessels, otherwise the queue head.
    pub fn manage_new_vessels(&mut self) {
        let roll = self.dice.roll_int(1, 100);
        let arrival = roll <= i32::from(self.settings.arrival_percent)
            && self.harbor.free_docks().len() > self.queue.len();

        if arrival {
            let vessel = self.create_vessel();
            self.admit(vessel, false);
        } else if let Some(vessel) = self.queue.pop_front() {
            log::info!(
                "{} left the waiting queue (queue size is now {})",
                vessel.name(),
                self.queue.len()
            );
            self.admit(vessel, true);
        }
    }

    // ========================================================================
    // MAIN CYCLE
    // ========================================================================

    /// One main-loop cycle. Returns whether every resident was already on
    /// its dock at planning time.
    pub fn step(&mut self) -> bool {
        self.pace();
        self.cycle += 1;
        self.report.cycles += 1;

        let all_reached = self.plan_movements();
        self.notify_cycle(Phase::Arrival);
        self.apply_planned_movements();
        self.manage_new_vessels();
        all_reached
    }

    /// Run main cycles until every dock is taken and nobody needed to move.
    pub fn run_cycle(&mut self) -> RunReport {
        self.report = RunReport::default();
        let mut all_reached = false;

        while !self.harbor.free_docks().is_empty() || !all_reached {
            if self.report.cycles >= self.settings.max_cycles {
                log::warn!(
                    "Main cycle stopped after {} cycles with {} free docks",
                    self.report.cycles,
                    self.harbor.free_docks().len()
                );
                self.report.hit_cap = true;
                break;
            }
            all_reached = self.step();
        }

        let report = std::mem::take(&mut self.report);
        log::info!("Main cycle finished: {:?}", report);
        report
    }

    // ========================================================================
    // DRAIN
    // ========================================================================

    /// Entry point nearest to `source`; ties go to the first in row-major
    /// order.
    pub fn choose_exit(&self, source: Point) -> Option<Point> {
        self.harbor
            .entry_points()
            .iter()
            .copied()
            .min_by_key(|&exit| manhattan_distance(source, exit))
    }

    /// Remove every vessel sitting on an entry point. Returns how many left.
    pub fn clean_exit(&mut self) -> usize {
        let leaving: Vec<Point> = self
            .harbor
            .entry_points()
            .iter()
            .copied()
            .filter(|&p| self.harbor.vessel_at(p).is_some())
            .collect();

        let mut count = 0;
        for exit in leaving {
            if let Ok(vessel) = self.harbor.remove_vessel_at(exit) {
                log::info!("{} left the harbor through {}", vessel.name(), exit);
                count += 1;
            }
        }
        self.report.drained += count as u64;
        count
    }

    /// One drain cycle: route the tracked vessel toward its nearest exit,
    /// clear the exits, then apply the route.
    pub fn drain_step(&mut self) {
        self.pace();
        self.cycle += 1;
        self.report.cycles += 1;
        self.planned.clear();

        let tracked_present = self
            .drain_target
            .as_deref()
            .is_some_and(|name| self.harbor.contains_vessel(name));
        if !tracked_present {
            self.drain_target = self
                .harbor
                .surface()
                .next()
                .map(|(_, vessel)| vessel.name().to_string());
        }

        let route = self
            .drain_target
            .as_deref()
            .and_then(|name| self.harbor.vessel_position(name))
            .and_then(|source| self.choose_exit(source).map(|exit| (source, exit)));
        if let Some((source, exit)) = route {
            self.trace_route(source, exit);
        }

        self.notify_cycle(Phase::Drain);
        self.clean_exit();

        let gone = self
            .drain_target
            .as_deref()
            .is_some_and(|name| !self.harbor.contains_vessel(name));
        if gone {
            self.drain_target = None;
        }
        self.apply_planned_movements();
    }

    /// Run drain cycles until the surface is empty. At the cycle cap the
    /// remaining residents are evicted.
    pub fn run_drain(&mut self) -> RunReport {
        self.report = RunReport::default();
        self.drain_target = None;

        while !self.harbor.is_empty() {
            if self.report.cycles >= self.settings.max_cycles {
                log::warn!(
                    "Drain stopped after {} cycles; evicting {} vessels",
                    self.report.cycles,
                    self.harbor.vessel_count()
                );
                self.report.hit_cap = true;
                self.evict_all();
                break;
            }
            self.drain_step();
        }

        let report = std::mem::take(&mut self.report);
        log::info!("Drain finished: {:?}", report);
        report
    }

    /// Let observers flush whatever they buffer.
    pub fn finish(&mut self) {
        for observer in &mut self.observers {
            observer.on_finished();
        }
    }

    fn evict_all(&mut self) {
        let names: Vec<String> = self
            .harbor
            .surface()
            .map(|(_, vessel)| vessel.name().to_string())
            .collect();
        for name in names {
            if self.harbor.remove_vessel(&name).is_ok() {
                self.report.evicted += 1;
            }
        }
        self.planned.clear();
        self.drain_target = None;
    }

    fn pace(&self) {
        if !self.settings.cycle_delay.is_zero() {
            thread::sleep(self.settings.cycle_delay);
        }
    }

    fn notify_cycle(&mut self, phase: Phase) {
        let view = CycleView {
            phase,
            cycle: self.cycle,
            harbor: &self.harbor,
            queue: &self.queue,
            planned: &self.planned,
        };
        for observer in &mut self.observers {
            observer.on_cycle(&view);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::ScriptedDice;
    use crate::vessel::Rating;

    fn settings(arrival_percent: u8) -> TowerSettings {
        TowerSettings {
            arrival_percent,
            cycle_delay: Duration::ZERO,
            max_cycles: 50,
        }
    }

    fn tower(width: u32, height: u32) -> Tower<ScriptedDice> {
        Tower::new(
            Harbor::with_ordered_docks(width, height),
            ScriptedDice::new(),
            settings(0),
        )
    }

    fn vessel(name: &str, kind: VesselKind, speed: u32, hull: u32) -> Vessel {
        Vessel::new(name, kind, Rating::plain(speed), Rating::plain(hull))
            .with_failure_probability(0.0)
    }

    /// Put `v` on `entry`, reserve `dock` and walk it onto the dock cell.
    fn park(tower: &mut Tower<ScriptedDice>, v: Vessel, entry: Point, dock: DockId) {
        let name = v.name().to_string();
        let harbor = tower.harbor_mut();
        harbor.add_vessel(v, entry).unwrap();
        harbor.reserve_dock(dock, &name).unwrap();
        let target = harbor.dock_position(dock).unwrap();
        let mut at = entry;
        while at != target {
            let next = at + Direction::dominant(target - at);
            harbor.move_vessel(at, next).unwrap();
            at = next;
        }
    }

    #[test]
    fn test_free_dock_in_ascending_order() {
        let mut t = tower(4, 2);
        t.insert_vessel(vessel("PC-0001", VesselKind::PleasureCraft, 1, 1));
        assert_eq!(t.harbor().reserved_dock("PC-0001"), Some(1));
        assert_eq!(t.harbor().vessel_position("PC-0001"), Some(Point::new(1, 0)));
        assert_eq!(t.report().admitted, 1);
    }

    #[test]
    fn test_preemption_by_stronger_claim() {
        let mut t = tower(4, 1);
        park(&mut t, vessel("FB-0001", VesselKind::FishingBoat, 1, 1), Point::new(1, 0), 1);
        park(&mut t, vessel("FB-0002", VesselKind::FishingBoat, 1, 1), Point::new(2, 0), 2);
        assert!(t.harbor().free_docks().is_empty());

        t.insert_vessel(vessel("PS-0003", VesselKind::PassengerShip, 1, 1));

        assert!(!t.harbor().contains_vessel("FB-0001"));
        assert_eq!(t.harbor().reserved_dock("PS-0003"), Some(1));
        assert_eq!(t.harbor().reserved_dock("FB-0002"), Some(2));
        assert!(t.harbor().free_docks().is_empty());
        assert_eq!(t.report().preemptions, 1);
        assert!(t.harbor().audit().is_empty());
    }

    #[test]
    fn test_no_preemption_by_weaker_claim() {
        let mut t = tower(4, 1);
        park(&mut t, vessel("PS-0001", VesselKind::PassengerShip, 1, 1), Point::new(1, 0), 1);
        park(&mut t, vessel("PS-0002", VesselKind::PassengerShip, 1, 1), Point::new(2, 0), 2);

        t.insert_vessel(vessel("FB-0003", VesselKind::FishingBoat, 1, 1));

        assert!(t.harbor().contains_vessel("PS-0001"));
        assert!(t.harbor().contains_vessel("PS-0002"));
        // stranded on the entry point, so scrapped rather than queued
        assert!(!t.harbor().contains_vessel("FB-0003"));
        assert!(t.queue().is_empty());
        assert_eq!(t.report().preemptions, 0);
        assert_eq!(t.report().stranded, 1);
        assert!(t.harbor().is_entry_point(Point::new(1, 0)));
        assert!(t.harbor().vessel_at(Point::new(1, 0)).is_none());
    }

    #[test]
    fn test_preemption_respects_acceptance() {
        // Passenger outranks the fishing boat but dock 12 is out of its range
        let mut t = tower(4, 6);
        for dock in 1..=12 {
            let name = format!("HOLD-{dock}");
            t.harbor_mut().reserve_dock(dock, &name).unwrap();
        }
        t.harbor_mut().remove_reservation("HOLD-12");
        park(&mut t, vessel("FB-0001", VesselKind::FishingBoat, 1, 1), Point::new(2, 0), 12);

        t.insert_vessel(vessel("PS-0002", VesselKind::PassengerShip, 1, 1));
        assert!(t.harbor().contains_vessel("FB-0001"));
        assert!(!t.harbor().contains_vessel("PS-0002"));
        assert_eq!(t.report().preemptions, 0);
    }

    #[test]
    fn test_military_never_takes_low_dock() {
        let mut t = tower(4, 1);
        t.insert_vessel(vessel("MS-0001", VesselKind::MilitaryShip, 1, 1));
        assert_eq!(t.harbor().reserved_dock("MS-0001"), None);
        assert!(!t.harbor().contains_vessel("MS-0001"));
        assert_eq!(t.harbor().free_docks().len(), 2);

        let mut t = tower(4, 11);
        t.insert_vessel(vessel("MS-0002", VesselKind::MilitaryShip, 1, 1));
        assert_eq!(t.harbor().reserved_dock("MS-0002"), Some(21));
    }

    #[test]
    fn test_full_entries_send_arrivals_to_queue() {
        let mut t = tower(4, 2);
        t.insert_vessel(vessel("PC-0001", VesselKind::PleasureCraft, 1, 1));
        t.insert_vessel(vessel("PC-0002", VesselKind::PleasureCraft, 1, 1));
        t.insert_vessel(vessel("PC-0003", VesselKind::PleasureCraft, 1, 1));
        assert_eq!(t.queue().len(), 1);
        assert_eq!(t.queue()[0].name(), "PC-0003");
        assert_eq!(t.report().queued, 1);
        assert!(t.harbor().reserved_dock("PC-0003").is_none());
    }

    #[test]
    fn test_queue_head_admitted_when_no_arrival() {
        let mut t = tower(4, 2);
        t.enqueue(vessel("PC-0001", VesselKind::PleasureCraft, 1, 1));
        t.enqueue(vessel("PC-0002", VesselKind::PleasureCraft, 1, 1));
        t.manage_new_vessels();
        assert!(t.harbor().contains_vessel("PC-0001"));
        assert_eq!(t.queue().len(), 1);
        assert_eq!(t.queue()[0].name(), "PC-0002");
    }

    #[test]
    fn test_requeued_head_counts_once() {
        let mut t = tower(4, 2);
        t.harbor_mut()
            .add_vessel(vessel("PC-0001", VesselKind::PleasureCraft, 1, 1), Point::new(1, 0))
            .unwrap();
        t.harbor_mut()
            .add_vessel(vessel("PC-0002", VesselKind::PleasureCraft, 1, 1), Point::new(2, 0))
            .unwrap();
        t.enqueue(vessel("PC-0003", VesselKind::PleasureCraft, 1, 1));
        t.enqueue(vessel("PC-0004", VesselKind::PleasureCraft, 1, 1));

        // both entry points are taken, so the head goes back to the tail
        t.manage_new_vessels();
        t.manage_new_vessels();
        let names: Vec<&str> = t.queue().iter().map(Vessel::name).collect();
        assert_eq!(names, ["PC-0003", "PC-0004"]);
        assert_eq!(t.report().queued, 2);
        assert_eq!(t.report().admitted, 0);
    }

    #[test]
    fn test_duplicate_name_is_rejected() {
        let mut t = tower(4, 2);
        t.insert_vessel(vessel("PC-0001", VesselKind::PleasureCraft, 1, 1));
        t.insert_vessel(vessel("PC-0001", VesselKind::FishingBoat, 1, 1));

        assert_eq!(t.harbor().vessel_count(), 1);
        assert_eq!(t.harbor().vessel_position("PC-0001"), Some(Point::new(1, 0)));
        assert!(t.queue().is_empty());
        assert_eq!(t.report().admitted, 1);
        assert_eq!(t.report().rejected, 1);
        assert_eq!(t.report().queued, 0);
        assert_eq!(t.report().destroyed(), 1);
    }

    #[test]
    fn test_no_arrival_when_queue_covers_free_docks() {
        let mut t = Tower::new(
            Harbor::with_ordered_docks(4, 1),
            ScriptedDice::new().with_ints([1]),
            settings(100),
        );
        t.enqueue(vessel("PC-0001", VesselKind::PleasureCraft, 1, 1));
        t.enqueue(vessel("PC-0002", VesselKind::PleasureCraft, 1, 1));
        t.manage_new_vessels();
        // queue head went in, no new vessel was built
        assert!(t.harbor().contains_vessel("PC-0001"));
        assert_eq!(t.harbor().vessel_count(), 1);
        assert_eq!(t.queue().len(), 1);
    }

    #[test]
    fn test_create_vessel_names_and_ratings() {
        // manufactory, kind, engine d6, hull d6
        let dice = ScriptedDice::new().with_ints([1, 2, 6, 6, 2, 4, 1, 1]);
        let mut t = Tower::new(Harbor::with_ordered_docks(4, 1), dice, settings(0));

        let first = t.create_vessel();
        assert_eq!(first.name(), "MS-0001");
        assert_eq!(first.speed(), 4);
        assert_eq!(first.hull(), 7);

        let second = t.create_vessel();
        assert_eq!(second.name(), "FB-0002");
        assert_eq!(second.speed(), 1);
        assert_eq!(second.hull(), 1);
    }

    #[test]
    fn test_engine_failure_costs_a_sub_step() {
        let dice = ScriptedDice::new().with_reals([0.1, 0.9]);
        let mut t = Tower::new(Harbor::with_ordered_docks(4, 2), dice, settings(0));
        let v = vessel("PS-0001", VesselKind::PassengerShip, 2, 1).with_failure_probability(0.5);
        t.harbor_mut().add_vessel(v, Point::new(1, 0)).unwrap();

        assert!(t.trace_route(Point::new(1, 0), Point::new(0, 1)));
        assert_eq!(
            t.planned(),
            &[PlannedMove {
                vessel: "PS-0001".into(),
                from: Point::new(1, 0),
                to: Point::new(1, 1),
            }]
        );
    }

    #[test]
    fn test_stronger_hull_ahead_stops_planning() {
        let mut t = tower(4, 2);
        t.harbor_mut()
            .add_vessel(vessel("PC-0001", VesselKind::PleasureCraft, 2, 1), Point::new(1, 0))
            .unwrap();
        t.harbor_mut()
            .add_vessel(vessel("PC-0002", VesselKind::PleasureCraft, 1, 9), Point::new(2, 0))
            .unwrap();
        t.harbor_mut().move_vessel(Point::new(2, 0), Point::new(2, 1)).unwrap();
        t.harbor_mut().move_vessel(Point::new(2, 1), Point::new(1, 1)).unwrap();

        assert!(t.trace_route(Point::new(1, 0), Point::new(1, 1)));
        assert!(t.planned().is_empty());
        assert!(!t.trace_route(Point::new(1, 1), Point::new(1, 1)));
    }

    #[test]
    fn test_resident_reaches_dock_in_one_cycle() {
        let mut t = tower(4, 2);
        // dock 4 sits at (3, 1), three cells from entry (1, 0)
        for dock in 1..=3 {
            t.harbor_mut().reserve_dock(dock, &format!("HOLD-{dock}")).unwrap();
        }
        t.insert_vessel(vessel("PC-0001", VesselKind::PleasureCraft, 3, 1));
        assert_eq!(t.harbor().reserved_dock("PC-0001"), Some(4));

        assert!(!t.step());
        assert_eq!(t.harbor().vessel_position("PC-0001"), Some(Point::new(3, 1)));
        assert!(t.step());
        assert!(t.harbor().audit().is_empty());
    }

    #[test]
    fn test_resident_without_dock_is_skipped() {
        let mut t = tower(4, 2);
        t.harbor_mut()
            .add_vessel(vessel("PC-0001", VesselKind::PleasureCraft, 2, 1), Point::new(1, 0))
            .unwrap();
        assert!(t.plan_movements());
        assert!(t.planned().is_empty());
    }

    #[test]
    fn test_blocked_first_step_drops_the_rest() {
        let mut t = tower(4, 2);
        t.harbor_mut()
            .add_vessel(vessel("PC-0001", VesselKind::PleasureCraft, 2, 5), Point::new(1, 0))
            .unwrap();
        t.harbor_mut()
            .add_vessel(vessel("PC-0002", VesselKind::PleasureCraft, 1, 5), Point::new(2, 0))
            .unwrap();

        // equal hulls are planned through, then refused when applied
        assert!(t.trace_route(Point::new(1, 0), Point::new(3, 0)));
        assert_eq!(t.planned().len(), 2);
        assert_eq!(t.planned()[1].from, Point::new(2, 0));

        t.apply_planned_movements();
        assert_eq!(t.harbor().vessel_position("PC-0001"), Some(Point::new(1, 0)));
        assert_eq!(t.harbor().vessel_position("PC-0002"), Some(Point::new(2, 0)));
        assert!(t.harbor().vessel_at(Point::new(3, 0)).is_none());
        assert_eq!(t.report().collisions, 0);
        assert!(t.planned().is_empty());
        assert!(t.harbor().audit().is_empty());
    }

    #[test]
    fn test_choose_exit_prefers_nearest() {
        let t = tower(6, 3);
        // entry points are (2, 0) and (3, 0)
        assert_eq!(t.choose_exit(Point::new(0, 2)), Some(Point::new(2, 0)));
        assert_eq!(t.choose_exit(Point::new(5, 2)), Some(Point::new(3, 0)));
    }

    #[test]
    fn test_drain_removes_vessel_on_entry_point() {
        let mut t = tower(4, 2);
        t.insert_vessel(vessel("PC-0001", VesselKind::PleasureCraft, 1, 1));
        assert!(t.harbor().is_entry_point(t.harbor().vessel_position("PC-0001").unwrap()));

        t.drain_step();
        assert!(t.harbor().is_empty());
        assert_eq!(t.report().drained, 1);
        assert_eq!(t.harbor().free_docks().len(), 4);
    }

    #[test]
    fn test_drain_walks_resident_out() {
        let mut t = tower(4, 2);
        park(&mut t, vessel("PC-0001", VesselKind::PleasureCraft, 1, 1), Point::new(1, 0), 2);
        let report = t.run_drain();
        assert!(t.harbor().is_empty());
        assert_eq!(report.drained, 1);
        assert!(!report.hit_cap);
        assert!(report.cycles >= 3);
    }

    #[test]
    fn test_drain_evicts_at_cap() {
        let mut t = tower(4, 2);
        // no engine, never reaches an exit
        park(&mut t, vessel("PC-0001", VesselKind::PleasureCraft, 0, 1), Point::new(1, 0), 2);

        let report = t.run_drain();
        assert!(report.hit_cap);
        assert_eq!(report.evicted, 1);
        assert_eq!(report.cycles, 50);
        assert!(t.harbor().is_empty());
    }

    #[test]
    fn test_from_config_survives_huge_dimensions() {
        let json = r#"{ "height": 3000000000, "shuffle_docks": false, "max_cycles": 7 }"#;
        let config = SimConfig::from_json_str(json).unwrap().sanitized();
        let t = Tower::from_config(&config, ScriptedDice::new());
        assert_eq!(t.harbor().height(), crate::config::DEFAULT_HEIGHT);
        assert_eq!(t.harbor().dock_count(), 2 * crate::config::DEFAULT_HEIGHT as usize);
        assert_eq!(t.settings().max_cycles, 7);
        assert_eq!(t.settings().arrival_percent, DEFAULT_ARRIVAL_PERCENT);

        // an unsanitized config is still cut down by the harbor itself
        let raw = SimConfig::from_json_str(json).unwrap();
        let t = Tower::from_config(&raw, ScriptedDice::new());
        assert_eq!(t.harbor().height(), crate::harbor::MAX_SIDE);
    }

    #[test]
    fn test_main_cycle_cap() {
        let mut t = tower(4, 2);
        let report = t.run_cycle();
        assert!(report.hit_cap);
        assert_eq!(report.cycles, 50);
        assert_eq!(report.admitted, 0);
    }

    #[derive(Default)]
    struct Tally {
        admitted: Vec<String>,
        cycles: Vec<(Phase, u64)>,
    }

    struct Shared(std::rc::Rc<std::cell::RefCell<Tally>>);

    impl HarborObserver for Shared {
        fn on_admitted(&mut self, vessel: &Vessel) {
            self.0.borrow_mut().admitted.push(vessel.name().to_string());
        }

        fn on_cycle(&mut self, view: &CycleView<'_>) {
            self.0.borrow_mut().cycles.push((view.phase, view.cycle));
        }
    }

    #[test]
    fn test_observers_see_admissions_and_cycles() {
        let tally = std::rc::Rc::new(std::cell::RefCell::new(Tally::default()));
        let mut t = tower(4, 2);
        t.add_observer(Box::new(Shared(tally.clone())));

        t.insert_vessel(vessel("PC-0001", VesselKind::PleasureCraft, 1, 1));
        t.step();
        t.run_drain();

        let tally = tally.borrow();
        assert_eq!(tally.admitted, vec!["PC-0001".to_string()]);
        assert_eq!(tally.cycles[0], (Phase::Arrival, 1));
        assert!(tally.cycles[1..].iter().all(|(phase, _)| *phase == Phase::Drain));
    }
}
