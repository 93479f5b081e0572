//! Random source for the simulation.
//!
//! Everything random in the harbor (arrivals, manufactory rolls, engine
//! failures, dock shuffling) goes through the [`Dice`] trait so a run can be
//! replayed from a seed, or scripted outright in tests.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Uniform sampling over inclusive ranges.
pub trait Dice {
    /// Uniform integer in `min..=max`.
    fn roll_int(&mut self, min: i32, max: i32) -> i32;

    /// Uniform real in `min..=max`.
    fn roll_real(&mut self, min: f64, max: f64) -> f64;
}

impl<D: Dice + ?Sized> Dice for &mut D {
    fn roll_int(&mut self, min: i32, max: i32) -> i32 {
        (**self).roll_int(min, max)
    }

    fn roll_real(&mut self, min: f64, max: f64) -> f64 {
        (**self).roll_real(min, max)
    }
}

/// Fisher–Yates shuffle driven by a [`Dice`].
pub fn shuffle<T, D: Dice + ?Sized>(dice: &mut D, items: &mut [T]) {
    for i in (1..items.len()).rev() {
        let j = dice.roll_int(0, i as i32) as usize;
        items.swap(i, j);
    }
}

/// `rand`-backed dice: deterministic when seeded, entropy-seeded otherwise.
pub struct SeededDice {
    rng: StdRng,
}

impl SeededDice {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Seeded when `seed` is given, entropy otherwise.
    pub fn new(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::from_seed(seed),
            None => Self::from_entropy(),
        }
    }
}

impl Dice for SeededDice {
    fn roll_int(&mut self, min: i32, max: i32) -> i32 {
        if min >= max {
            return min;
        }
        self.rng.gen_range(min..=max)
    }

    fn roll_real(&mut self, min: f64, max: f64) -> f64 {
        if min >= max {
            return min;
        }
        self.rng.gen_range(min..=max)
    }
}

/// Replays pre-recorded rolls, for tests.
///
/// Values are clamped into the requested range. Once the script runs dry,
/// integer rolls return `min` and real rolls return `max` (so a drained
/// script never triggers an engine failure).
#[derive(Debug, Default, Clone)]
pub struct ScriptedDice {
    ints: VecDeque<i32>,
    reals: VecDeque<f64>,
}

impl ScriptedDice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ints(mut self, ints: impl IntoIterator<Item = i32>) -> Self {
        self.ints.extend(ints);
        self
    }

    pub fn with_reals(mut self, reals: impl IntoIterator<Item = f64>) -> Self {
        self.reals.extend(reals);
        self
    }

    pub fn push_int(&mut self, value: i32) {
        self.ints.push_back(value);
    }

    pub fn push_real(&mut self, value: f64) {
        self.reals.push_back(value);
    }

    /// Rolls still waiting to be replayed, `(ints, reals)`.
    pub fn remaining(&self) -> (usize, usize) {
        (self.ints.len(), self.reals.len())
    }
}

impl Dice for ScriptedDice {
    fn roll_int(&mut self, min: i32, max: i32) -> i32 {
        match self.ints.pop_front() {
            Some(v) => v.clamp(min, max.max(min)),
            None => min,
        }
    }

    fn roll_real(&mut self, min: f64, max: f64) -> f64 {
        match self.reals.pop_front() {
            Some(v) => v.clamp(min, max.max(min)),
            None => max,
        }
    }
}
