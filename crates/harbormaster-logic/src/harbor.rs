//! The harbor surface: grid occupancy plus the dock reservation ledger.
//!
//! `Harbor` is the single source of truth for where every vessel is and
//! which dock it holds. It keeps four structures in lockstep:
//!
//! | Structure      | Maps                | Invariant                              |
//! |----------------|---------------------|----------------------------------------|
//! | `surface`      | Point → Vessel      | one vessel per cell                    |
//! | `positions`    | name → Point        | exact inverse of `surface`             |
//! | `reservations` | name → DockId       | one dock per vessel, one vessel per dock |
//! | `free_docks`   | {DockId}            | disjoint complement of reserved ids    |
//!
//! Every mutation goes through a method here, so the invariants hold at
//! every call boundary. Removing a vessel hands the value back; the caller
//! decides whether it is dropped or kept.

use std::collections::{BTreeMap, BTreeSet};

use crate::dice::{self, Dice};
use crate::error::{AdmissionError, HarborError};
use crate::geometry::Point;
use crate::vessel::Vessel;

/// Dock identifier, `1..=2·height`.
pub type DockId = u32;

/// Largest accepted width or height. Keeps `2·height` and grid coordinates
/// well inside `i32` and bounds the dock ledger.
pub const MAX_SIDE: u32 = 1000;

/// What a successful move did.
#[derive(Debug, Clone, PartialEq)]
pub enum MoveOutcome {
    /// The mover relocated into an empty cell.
    Moved,
    /// The mover crushed a weaker occupant and took its cell. The wreck has
    /// already lost its reservation.
    Rammed { wreck: Vessel },
}

#[derive(Debug, Clone)]
pub struct Harbor {
    width: u32,
    height: u32,
    surface: BTreeMap<Point, Vessel>,
    positions: BTreeMap<String, Point>,
    entry_points: BTreeSet<Point>,
    docks: BTreeMap<DockId, Point>,
    dock_ids: BTreeMap<Point, DockId>,
    reservations: BTreeMap<String, DockId>,
    free_docks: BTreeSet<DockId>,
}

impl Harbor {
    /// Build an empty harbor. Dock ids are shuffled across both edges when
    /// `shuffle_docks` is set, otherwise ids `1..=height` run down the left
    /// edge and the rest down the right edge.
    ///
    /// Widths below 2 and heights below 1 are raised to those minimums so
    /// the two dock edges never overlap. Either side above [`MAX_SIDE`] is
    /// cut down to it.
    pub fn new(width: u32, height: u32, shuffle_docks: bool, dice: &mut dyn Dice) -> Self {
        let (w, h) = (width.clamp(2, MAX_SIDE), height.clamp(1, MAX_SIDE));
        if (w, h) != (width, height) {
            log::warn!("Harbor {}x{} is out of range, using {}x{}", width, height, w, h);
        }
        let (width, height) = (w, h);

        let mut entry_points = BTreeSet::new();
        entry_points.insert(Point::new((width / 2) as i32, 0));
        if width % 2 == 0 {
            entry_points.insert(Point::new((width / 2 - 1) as i32, 0));
        }

        let mut ids: Vec<DockId> = (1..=2 * height).collect();
        if shuffle_docks {
            dice::shuffle(dice, &mut ids);
        }

        let mut docks = BTreeMap::new();
        let mut dock_ids = BTreeMap::new();
        for row in 0..height {
            let left = Point::new(0, row as i32);
            let right = Point::new(width as i32 - 1, row as i32);
            let left_id = ids[row as usize];
            let right_id = ids[(row + height) as usize];
            docks.insert(left_id, left);
            docks.insert(right_id, right);
            dock_ids.insert(left, left_id);
            dock_ids.insert(right, right_id);
        }

        log::debug!(
            "Harbor {}x{} ready: {} entry points, {} docks",
            width,
            height,
            entry_points.len(),
            docks.len()
        );

        Self {
            width,
            height,
            surface: BTreeMap::new(),
            positions: BTreeMap::new(),
            entry_points,
            free_docks: ids.into_iter().collect(),
            docks,
            dock_ids,
            reservations: BTreeMap::new(),
        }
    }

    /// Harbor with clockwise-ordered docks; needs no random source.
    pub fn with_ordered_docks(width: u32, height: u32) -> Self {
        Self::new(width, height, false, &mut dice::ScriptedDice::new())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    // ========================================================================
    // SURFACE
    // ========================================================================

    pub fn entry_points(&self) -> &BTreeSet<Point> {
        &self.entry_points
    }

    pub fn is_entry_point(&self, point: Point) -> bool {
        self.entry_points.contains(&point)
    }

    /// First entry point (row-major) with nobody on it.
    pub fn free_entry_point(&self) -> Option<Point> {
        self.entry_points
            .iter()
            .copied()
            .find(|p| !self.surface.contains_key(p))
    }

    /// Place `vessel` on an entry point.
    ///
    /// Refused (with the vessel handed back) when `at` is not an entry
    /// point, when it is occupied, or when a vessel with the same name is
    /// already on the surface.
    pub fn add_vessel(&mut self, vessel: Vessel, at: Point) -> Result<(), AdmissionError> {
        let refusal = if !self.entry_points.contains(&at) {
            Some(HarborError::NotAnEntryPoint(at))
        } else if let Some(occupant) = self.surface.get(&at) {
            Some(HarborError::EntryOccupied {
                point: at,
                occupant: occupant.name().to_string(),
            })
        } else if self.positions.contains_key(vessel.name()) {
            Some(HarborError::DuplicateVessel(vessel.name().to_string()))
        } else {
            None
        };

        if let Some(reason) = refusal {
            log::warn!("{}", reason);
            return Err(AdmissionError { reason, vessel });
        }

        log::info!("Added vessel {} at {}", vessel.name(), at);
        self.positions.insert(vessel.name().to_string(), at);
        self.surface.insert(at, vessel);
        Ok(())
    }

    pub fn vessel_at(&self, point: Point) -> Option<&Vessel> {
        self.surface.get(&point)
    }

    /// Where the named vessel sits, `None` when it is off the grid.
    pub fn vessel_position(&self, name: &str) -> Option<Point> {
        self.positions.get(name).copied()
    }

    pub fn contains_vessel(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    /// Move the vessel at `source` one cell to `destination`.
    ///
    /// When the destination is occupied the hulls are compared: only a
    /// strictly stronger mover crushes the occupant and takes the cell,
    /// otherwise the move is refused with [`HarborError::Blocked`].
    pub fn move_vessel(
        &mut self,
        source: Point,
        destination: Point,
    ) -> Result<MoveOutcome, HarborError> {
        if !destination.within(self.width, self.height) {
            let err = HarborError::OutOfBounds(destination);
            log::warn!("{}", err);
            return Err(err);
        }

        let Some(mover) = self.surface.get(&source) else {
            let err = HarborError::NoVesselAt(source);
            log::warn!("{}", err);
            return Err(err);
        };

        let mut outcome = MoveOutcome::Moved;
        if let Some(occupant) = self.surface.get(&destination) {
            if mover.hull() <= occupant.hull() {
                let err = HarborError::Blocked {
                    mover: mover.name().to_string(),
                    occupant: occupant.name().to_string(),
                    at: destination,
                };
                log::debug!("{}", err);
                return Err(err);
            }

            log::info!(
                "[COLLISION] {} (hull {}) crushed {} (hull {}) at {}",
                mover.name(),
                mover.hull(),
                occupant.name(),
                occupant.hull(),
                destination
            );
            let wreck = self.take(destination)?;
            outcome = MoveOutcome::Rammed { wreck };
        }

        let vessel = self.surface.remove(&source).ok_or(HarborError::NoVesselAt(source))?;
        log::debug!("Moved {} from {} to {}", vessel.name(), source, destination);
        self.positions.insert(vessel.name().to_string(), destination);
        self.surface.insert(destination, vessel);
        Ok(outcome)
    }

    /// Take the vessel at `point` off the surface, releasing its dock.
    pub fn remove_vessel_at(&mut self, point: Point) -> Result<Vessel, HarborError> {
        let taken = self.take(point);
        if let Err(err) = &taken {
            log::warn!("{}", err);
        }
        taken
    }

    /// Take the named vessel off the surface, releasing its dock.
    pub fn remove_vessel(&mut self, name: &str) -> Result<Vessel, HarborError> {
        let Some(point) = self.positions.get(name).copied() else {
            let err = HarborError::UnknownVessel(name.to_string());
            log::warn!("{}", err);
            return Err(err);
        };
        self.remove_vessel_at(point)
    }

    fn take(&mut self, point: Point) -> Result<Vessel, HarborError> {
        let vessel = self
            .surface
            .remove(&point)
            .ok_or(HarborError::NoVesselAt(point))?;
        self.positions.remove(vessel.name());
        self.remove_reservation(vessel.name());
        Ok(vessel)
    }

    /// Occupied cells in row-major order.
    pub fn surface(&self) -> impl Iterator<Item = (Point, &Vessel)> + '_ {
        self.surface.iter().map(|(p, v)| (*p, v))
    }

    pub fn vessel_count(&self) -> usize {
        self.surface.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surface.is_empty()
    }

    // ========================================================================
    // DOCKS
    // ========================================================================

    pub fn dock_position(&self, dock: DockId) -> Option<Point> {
        self.docks.get(&dock).copied()
    }

    /// Dock id at `point`, if that cell is a dock.
    pub fn dock_at(&self, point: Point) -> Option<DockId> {
        self.dock_ids.get(&point).copied()
    }

    pub fn docks(&self) -> &BTreeMap<DockId, Point> {
        &self.docks
    }

    pub fn dock_count(&self) -> usize {
        self.docks.len()
    }

    /// Docks nobody holds, in ascending id order.
    pub fn free_docks(&self) -> &BTreeSet<DockId> {
        &self.free_docks
    }

    pub fn reservations(&self) -> &BTreeMap<String, DockId> {
        &self.reservations
    }

    /// Reserve `dock` for the vessel called `name`.
    pub fn reserve_dock(&mut self, dock: DockId, name: &str) -> Result<(), HarborError> {
        if let Some(&held) = self.reservations.get(name) {
            let err = HarborError::AlreadyReserved {
                name: name.to_string(),
                dock: held,
            };
            log::warn!("{}", err);
            return Err(err);
        }
        if !self.free_docks.remove(&dock) {
            let err = HarborError::DockUnavailable(dock);
            log::warn!("{}", err);
            return Err(err);
        }
        self.reservations.insert(name.to_string(), dock);
        log::info!("Reserved dock {} for {}", dock, name);
        Ok(())
    }

    /// Release whatever dock `name` holds. Returns whether there was one.
    pub fn remove_reservation(&mut self, name: &str) -> bool {
        match self.reservations.remove(name) {
            Some(dock) => {
                self.free_docks.insert(dock);
                log::debug!("Released dock {} held by {}", dock, name);
                true
            }
            None => false,
        }
    }

    pub fn reserved_dock(&self, name: &str) -> Option<DockId> {
        self.reservations.get(name).copied()
    }

    /// List every broken invariant. Empty means the harbor is consistent.
    pub fn audit(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.surface.len() != self.positions.len() {
            problems.push(format!(
                "surface holds {} vessels but {} positions are tracked",
                self.surface.len(),
                self.positions.len()
            ));
        }
        for (point, vessel) in &self.surface {
            if self.positions.get(vessel.name()) != Some(point) {
                problems.push(format!("{} at {} is not tracked there", vessel.name(), point));
            }
        }
        for (name, point) in &self.positions {
            if self.surface.get(point).map(Vessel::name) != Some(name.as_str()) {
                problems.push(format!("{} is tracked at {} but not there", name, point));
            }
        }

        let reserved: BTreeSet<DockId> = self.reservations.values().copied().collect();
        if reserved.len() != self.reservations.len() {
            problems.push("a dock is reserved twice".to_string());
        }
        if let Some(dock) = reserved.intersection(&self.free_docks).next() {
            problems.push(format!("dock {} is both free and reserved", dock));
        }
        let known: BTreeSet<DockId> = self.docks.keys().copied().collect();
        let accounted: BTreeSet<DockId> = reserved.union(&self.free_docks).copied().collect();
        if accounted != known {
            problems.push("free and reserved docks do not cover every dock".to_string());
        }

        problems
    }
}
