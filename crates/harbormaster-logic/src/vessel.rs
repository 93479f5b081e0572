//! Vessel kinds, capability ratings and manufactories.
//!
//! A vessel's speed and hull strength are [`Rating`]s: a base value plus an
//! ordered list of [`Modifier`]s (boosters, platings), folded once when the
//! rating is built. Kind-specific behaviour (priority, failure rate, which
//! docks it will take) is a fixed table on [`VesselKind`].

use serde::{Deserialize, Serialize};

use crate::dice::Dice;
use crate::harbor::DockId;

// ============================================================================
// KINDS
// ============================================================================

/// Which dock ids a vessel kind is willing to moor at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DockPolicy {
    Any,
    /// Ids `<= n`.
    AtMost(DockId),
    /// Ids `> n`.
    Above(DockId),
}

impl DockPolicy {
    pub fn accepts(self, dock: DockId) -> bool {
        match self {
            Self::Any => true,
            Self::AtMost(n) => dock <= n,
            Self::Above(n) => dock > n,
        }
    }
}

/// Per-kind constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KindTraits {
    pub label: &'static str,
    /// Two-letter code used in vessel names.
    pub code: &'static str,
    /// Single character used by grid renderers.
    pub glyph: char,
    /// Lower is the stronger claim on a dock.
    pub priority: u8,
    pub failure_probability: f64,
    pub dock_policy: DockPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum VesselKind {
    PassengerShip = 1,
    MilitaryShip = 2,
    PleasureCraft = 3,
    FishingBoat = 4,
}

impl VesselKind {
    pub fn traits(&self) -> KindTraits {
        match self {
            Self::MilitaryShip => KindTraits {
                label: "Military Ship",
                code: "MS",
                glyph: 'M',
                priority: 0,
                failure_probability: 0.5,
                dock_policy: DockPolicy::Above(20),
            },
            Self::PassengerShip => KindTraits {
                label: "Passenger Ship",
                code: "PS",
                glyph: 'P',
                priority: 1,
                failure_probability: 0.1,
                dock_policy: DockPolicy::AtMost(10),
            },
            Self::PleasureCraft => KindTraits {
                label: "Pleasure Craft",
                code: "PC",
                glyph: 'C',
                priority: 2,
                failure_probability: 0.05,
                dock_policy: DockPolicy::Any,
            },
            Self::FishingBoat => KindTraits {
                label: "Fishing Boat",
                code: "FB",
                glyph: 'F',
                priority: 3,
                failure_probability: 0.2,
                dock_policy: DockPolicy::AtMost(20),
            },
        }
    }

    pub fn all() -> &'static [VesselKind] {
        &[
            Self::PassengerShip,
            Self::MilitaryShip,
            Self::PleasureCraft,
            Self::FishingBoat,
        ]
    }

    /// Map a `1..=4` roll to a kind. Out-of-range rolls fall back to the
    /// passenger ship.
    pub fn from_roll(roll: i32) -> Self {
        match roll {
            2 => Self::MilitaryShip,
            3 => Self::PleasureCraft,
            4 => Self::FishingBoat,
            _ => Self::PassengerShip,
        }
    }
}

// ============================================================================
// RATINGS
// ============================================================================

/// Upgrade applied on top of a base engine or hull.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Modifier {
    /// Engine booster, `s + 1`.
    Turbocharger,
    /// Engine booster, `s + s²/2`.
    NuclearReactor,
    /// Hull plating, `h + 1`.
    GoldPlating,
    /// Hull plating, `h · 2`.
    TitaniumPlating,
}

impl Modifier {
    pub fn apply(self, value: u32) -> u32 {
        match self {
            Self::Turbocharger => value.saturating_add(1),
            Self::NuclearReactor => value.saturating_add(value.saturating_mul(value) / 2),
            Self::GoldPlating => value.saturating_add(1),
            Self::TitaniumPlating => value.saturating_mul(2),
        }
    }
}

/// Base engines.
pub const CHEAP_ENGINE: u32 = 1;
pub const EXPENSIVE_ENGINE: u32 = 2;

/// Base hulls.
pub const CHEAP_HULL: u32 = 1;
pub const EXPENSIVE_HULL: u32 = 3;

/// A capability value: base plus ordered modifiers, folded at construction.
///
/// Modifiers are listed innermost first, so `[Titanium, Gold]` on an
/// expensive hull is `gold(titanium(expensive))`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
    base: u32,
    modifiers: Vec<Modifier>,
    value: u32,
}

impl Rating {
    pub fn new(base: u32, modifiers: Vec<Modifier>) -> Self {
        let value = modifiers.iter().fold(base, |acc, m| m.apply(acc));
        Self {
            base,
            modifiers,
            value,
        }
    }

    /// A rating with no modifiers.
    pub fn plain(base: u32) -> Self {
        Self::new(base, Vec::new())
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    pub fn modifiers(&self) -> &[Modifier] {
        &self.modifiers
    }
}

// ============================================================================
// MANUFACTORIES
// ============================================================================

/// Shipyards that turn d6 rolls into engine and hull ratings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Manufactory {
    Prestigious,
    LowCost,
}

impl Manufactory {
    /// Map a `1..=2` roll to a manufactory.
    pub fn from_roll(roll: i32) -> Self {
        if roll == 2 {
            Self::LowCost
        } else {
            Self::Prestigious
        }
    }

    pub fn propulsion(self, dice: &mut dyn Dice) -> Rating {
        use Modifier::*;
        let roll = dice.roll_int(1, 6);
        match (self, roll) {
            (Self::Prestigious, 6) => Rating::new(EXPENSIVE_ENGINE, vec![NuclearReactor]),
            (Self::Prestigious, 4 | 5) => Rating::new(EXPENSIVE_ENGINE, vec![Turbocharger]),
            (Self::Prestigious, _) => Rating::plain(EXPENSIVE_ENGINE),
            (Self::LowCost, 6) => Rating::plain(EXPENSIVE_ENGINE),
            (Self::LowCost, 4 | 5) => Rating::new(CHEAP_ENGINE, vec![Turbocharger]),
            (Self::LowCost, _) => Rating::plain(CHEAP_ENGINE),
        }
    }

    pub fn hull(self, dice: &mut dyn Dice) -> Rating {
        use Modifier::*;
        let roll = dice.roll_int(1, 6);
        match (self, roll) {
            (Self::Prestigious, 6) => {
                Rating::new(EXPENSIVE_HULL, vec![TitaniumPlating, GoldPlating])
            }
            (Self::Prestigious, 5) => Rating::new(EXPENSIVE_HULL, vec![TitaniumPlating]),
            (Self::Prestigious, 4) => Rating::new(EXPENSIVE_HULL, vec![GoldPlating]),
            (Self::Prestigious, _) => Rating::plain(EXPENSIVE_HULL),
            (Self::LowCost, 6) => Rating::plain(EXPENSIVE_HULL),
            (Self::LowCost, 5) => Rating::new(CHEAP_HULL, vec![GoldPlating, GoldPlating]),
            (Self::LowCost, 4) => Rating::new(CHEAP_HULL, vec![GoldPlating]),
            (Self::LowCost, _) => Rating::plain(CHEAP_HULL),
        }
    }
}

// ============================================================================
// VESSEL
// ============================================================================

/// A vessel known to the tower: queued, on the harbor surface, or about to
/// be dropped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Vessel {
    name: String,
    kind: VesselKind,
    propulsion: Rating,
    hull: Rating,
    failure_probability: f64,
}

impl Vessel {
    pub fn new(
        name: impl Into<String>,
        kind: VesselKind,
        propulsion: Rating,
        hull: Rating,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            propulsion,
            hull,
            failure_probability: kind.traits().failure_probability,
        }
    }

    /// Build a vessel from a manufactory. Rolls the engine first, then the
    /// hull.
    pub fn manufacture(
        name: impl Into<String>,
        kind: VesselKind,
        manufactory: Manufactory,
        dice: &mut dyn Dice,
    ) -> Self {
        let propulsion = manufactory.propulsion(dice);
        let hull = manufactory.hull(dice);
        Self::new(name, kind, propulsion, hull)
    }

    /// Override the kind's engine failure probability (clamped to `0..=1`).
    pub fn with_failure_probability(mut self, probability: f64) -> Self {
        self.failure_probability = probability.clamp(0.0, 1.0);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> VesselKind {
        self.kind
    }

    /// Sub-steps per cycle.
    pub fn speed(&self) -> u32 {
        self.propulsion.value()
    }

    /// Hull strength, compared on collision.
    pub fn hull(&self) -> u32 {
        self.hull.value()
    }

    pub fn propulsion_rating(&self) -> &Rating {
        &self.propulsion
    }

    pub fn hull_rating(&self) -> &Rating {
        &self.hull
    }

    pub fn failure_probability(&self) -> f64 {
        self.failure_probability
    }

    pub fn priority(&self) -> u8 {
        self.kind.traits().priority
    }

    /// Whether this vessel is willing to moor at `dock`.
    pub fn accepts(&self, dock: DockId) -> bool {
        self.kind.traits().dock_policy.accepts(dock)
    }

    /// Whether this vessel's claim beats `other`'s.
    pub fn outranks(&self, other: &Vessel) -> bool {
        self.priority() < other.priority()
    }

    pub fn glyph(&self) -> char {
        self.kind.traits().glyph
    }
}
