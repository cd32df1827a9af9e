//! Injectable random sources.
//!
//! Every decision point (customer disobedience draw, uncontrolled pick,
//! company pick) draws through [`RandomSource`], so runs can be seeded and
//! tests can script exact draws.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Thread-safe source of uniform draws.
pub trait RandomSource: Send + Sync {
    /// Uniform integer in `[0, upper)`. Returns 0 when `upper` is 0.
    fn next_below(&self, upper: usize) -> usize;
}

/// Pick one element uniformly. Consumes a draw only when `items` is non-empty.
pub fn choose<'a, T>(rng: &dyn RandomSource, items: &'a [T]) -> Option<&'a T> {
    if items.is_empty() {
        return None;
    }
    items.get(rng.next_below(items.len()))
}

/// A single `StdRng` shared behind a mutex.
///
/// Draws are valid and independent but not globally ordered: with many
/// actors drawing concurrently a fixed seed does not fix the interleaving.
pub struct SharedRng {
    inner: Mutex<StdRng>,
}

impl SharedRng {
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            inner: Mutex::new(StdRng::from_entropy()),
        }
    }

    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            inner: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Seeded when `seed` is given, otherwise from OS entropy.
    #[must_use]
    pub fn from_seed_option(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::from_entropy, Self::seeded)
    }
}

impl std::fmt::Debug for SharedRng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedRng").finish_non_exhaustive()
    }
}

impl RandomSource for SharedRng {
    fn next_below(&self, upper: usize) -> usize {
        if upper == 0 {
            return 0;
        }
        self.inner.lock().gen_range(0..upper)
    }
}

/// Replays a fixed queue of draws, each reduced modulo `upper`.
///
/// Once the script is exhausted every draw returns `fallback % upper`.
#[derive(Debug)]
pub struct ScriptedRandom {
    draws: Mutex<VecDeque<usize>>,
    fallback: usize,
    taken: AtomicUsize,
}

impl ScriptedRandom {
    pub fn new(draws: impl IntoIterator<Item = usize>) -> Self {
        Self {
            draws: Mutex::new(draws.into_iter().collect()),
            fallback: 0,
            taken: AtomicUsize::new(0),
        }
    }

    /// Always returns `value % upper`.
    #[must_use]
    pub fn constant(value: usize) -> Self {
        Self {
            draws: Mutex::new(VecDeque::new()),
            fallback: value,
            taken: AtomicUsize::new(0),
        }
    }

    /// Number of draws consumed so far.
    #[must_use]
    pub fn draws_taken(&self) -> usize {
        self.taken.load(Ordering::SeqCst)
    }
}

impl RandomSource for ScriptedRandom {
    fn next_below(&self, upper: usize) -> usize {
        self.taken.fetch_add(1, Ordering::SeqCst);
        if upper == 0 {
            return 0;
        }
        let raw = self.draws.lock().pop_front().unwrap_or(self.fallback);
        raw % upper
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_rng_stays_in_range() {
        let rng = SharedRng::seeded(7);
        assert!((0..1_000).all(|_| rng.next_below(3) < 3));
        assert_eq!(rng.next_below(0), 0);
    }

    #[test]
    fn same_seed_same_sequence_single_threaded() {
        let a = SharedRng::seeded(42);
        let b = SharedRng::seeded(42);
        let xs: Vec<usize> = (0..20).map(|_| a.next_below(100)).collect();
        let ys: Vec<usize> = (0..20).map(|_| b.next_below(100)).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn scripted_draws_replay_in_order() {
        let rng = ScriptedRandom::new([5, 1, 7]);
        assert_eq!(rng.next_below(10), 5);
        assert_eq!(rng.next_below(10), 1);
        assert_eq!(rng.next_below(4), 3);
        assert_eq!(rng.next_below(10), 0);
        assert_eq!(rng.draws_taken(), 4);
    }

    #[test]
    fn choose_skips_draw_on_empty_slice() {
        let rng = ScriptedRandom::constant(1);
        let empty: [u8; 0] = [];
        assert!(choose(&rng, &empty).is_none());
        assert_eq!(rng.draws_taken(), 0);

        assert_eq!(choose(&rng, &['a', 'b', 'c']), Some(&'b'));
        assert_eq!(rng.draws_taken(), 1);
    }
}
