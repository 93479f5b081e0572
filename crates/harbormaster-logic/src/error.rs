//! Error types for harbor operations and configuration loading.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::geometry::Point;
use crate::harbor::DockId;
use crate::vessel::Vessel;

/// A refused harbor operation. None of these are fatal: the harbor state is
/// left untouched and the caller decides what to do next.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HarborError {
    #[error("{0} is not a valid entry point")]
    NotAnEntryPoint(Point),
    #[error("entry point {point} is already held by {occupant}")]
    EntryOccupied { point: Point, occupant: String },
    #[error("a vessel named {0} is already on the surface")]
    DuplicateVessel(String),
    #[error("{0} is out of the harbor's boundaries")]
    OutOfBounds(Point),
    #[error("there is no vessel at {0}")]
    NoVesselAt(Point),
    #[error("vessel {0} is not on the harbor surface")]
    UnknownVessel(String),
    #[error("vessel {name} already holds dock {dock}")]
    AlreadyReserved { name: String, dock: DockId },
    #[error("dock {0} is invalid or already reserved")]
    DockUnavailable(DockId),
    #[error("{mover} cannot push past {occupant} at {at}")]
    Blocked {
        mover: String,
        occupant: String,
        at: Point,
    },
}

/// An admission that did not happen. The vessel is handed back so the
/// caller keeps ownership.
#[derive(Debug, Error)]
#[error("could not admit {}: {reason}", .vessel.name())]
pub struct AdmissionError {
    #[source]
    pub reason: HarborError,
    pub vessel: Vessel,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse harbor config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read harbor config from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
