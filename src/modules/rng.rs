use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of uniform choices for every random decision the engine makes.
pub trait Chooser {
    /// Returns an index in `0..len`. Callers never pass `len == 0`.
    fn choose(&mut self, len: usize) -> usize;
}

impl<R: Rng + ?Sized> Chooser for R {
    fn choose(&mut self, len: usize) -> usize {
        self.gen_range(0..len)
    }
}

/// Deterministic chooser that always takes the first candidate.
///
/// Random empty cells become the lowest empty index and the direction search
/// tries right, down, left, up in that order.
#[derive(Clone, Copy, Debug, Default)]
pub struct FirstChoice;

impl Chooser for FirstChoice {
    fn choose(&mut self, _len: usize) -> usize {
        0
    }
}

pub fn seeded(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Fisher-Yates shuffle driven by a [`Chooser`]. `FirstChoice` keeps the order.
///
/// `rand::seq::SliceRandom::shuffle` needs an `Rng`, so it cannot be driven by
/// the deterministic `FirstChoice` stub.
pub fn shuffle<T, C: Chooser + ?Sized>(items: &mut [T], chooser: &mut C) {
    let len = items.len();
    for i in 0..len.saturating_sub(1) {
        let j = i + chooser.choose(len - i);
        items.swap(i, j);
    }
}
