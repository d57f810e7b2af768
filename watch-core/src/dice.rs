//! Die rolls for skill checks and oppressive condition tables.

use rand::rngs::ThreadRng;
use rand::{Rng, RngCore};

pub const D6: u32 = 6;
pub const D12: u32 = 12;
pub const D20: u32 = 20;

/// Source of die rolls.
pub trait Dice {
    /// Roll a single die, returning a value in `1..=faces`.
    fn roll(&mut self, faces: u32) -> u32;

    /// Pick an index in `0..len` with equal odds.
    fn pick(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        self.roll(len as u32) as usize - 1
    }
}

/// Dice backed by any `rand` generator.
///
/// A uniform real in `[0, 1)` is scaled by the face count and floored.
#[derive(Debug, Clone)]
pub struct RngDice<R> {
    rng: R,
}

impl<R: RngCore> RngDice<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngDice<ThreadRng> {
    pub fn thread() -> Self {
        Self::new(rand::thread_rng())
    }
}

impl<R: RngCore> Dice for RngDice<R> {
    fn roll(&mut self, faces: u32) -> u32 {
        let faces = faces.max(1);
        let unit: f64 = self.rng.gen();
        // Guards against float rounding landing exactly on `faces`.
        ((unit * faces as f64).floor() as u32).min(faces - 1) + 1
    }
}
