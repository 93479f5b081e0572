//! Pure harbor simulation logic for Harbormaster.
//!
//! This crate contains the harbor state, the control tower loop and the
//! vessel model. It does no terminal or file I/O of its own: rendering,
//! flag parsing and logger setup live in the `harbormaster-sim` binary and
//! reach in through [`observer::HarborObserver`] and the [`dice::Dice`] port.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | Simulation settings with documented defaults, JSON loading |
//! | [`dice`] | Random source port, seeded and scripted implementations |
//! | [`error`] | Harbor refusals, admission and config errors |
//! | [`geometry`] | Grid points, cardinal directions, Manhattan distance |
//! | [`harbor`] | Grid occupancy and the dock reservation ledger |
//! | [`observer`] | Read-only cycle hooks, JSON-lines fleet export |
//! | [`tower`] | Route planning, dock assignment and preemption, cycle and drain |
//! | [`vessel`] | Vessel kinds, engine/hull ratings, manufactories |

pub mod config;
pub mod dice;
pub mod error;
pub mod geometry;
pub mod harbor;
pub mod observer;
pub mod tower;
pub mod vessel;
