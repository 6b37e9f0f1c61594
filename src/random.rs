use rand::rngs::{StdRng, ThreadRng};
use rand::Rng;
use std::collections::VecDeque;

/// Source of uniform random indices for corpus selection.
pub trait RandomSource {
    /// A value in `0..bound`. `bound` is always at least 1.
    fn next_int(&mut self, bound: usize) -> usize;
}

impl RandomSource for ThreadRng {
    fn next_int(&mut self, bound: usize) -> usize {
        self.gen_range(0..bound.max(1))
    }
}

impl RandomSource for StdRng {
    fn next_int(&mut self, bound: usize) -> usize {
        self.gen_range(0..bound.max(1))
    }
}

impl<R: RandomSource + ?Sized> RandomSource for Box<R> {
    fn next_int(&mut self, bound: usize) -> usize {
        (**self).next_int(bound)
    }
}

/// Replays a fixed script of values, each reduced modulo the bound.
///
/// Once the script runs out it keeps returning 0.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRandom {
    values: VecDeque<usize>,
}

impl ScriptedRandom {
    pub fn new(values: impl IntoIterator<Item = usize>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }

    /// Always 0: first language, first block, first line.
    pub fn zeros() -> Self {
        Self::default()
    }
}

impl RandomSource for ScriptedRandom {
    fn next_int(&mut self, bound: usize) -> usize {
        self.values.pop_front().unwrap_or(0) % bound.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_scripted_values_wrap_to_bound() {
        let mut rng = ScriptedRandom::new([1, 7, 2]);

        assert_eq!(rng.next_int(5), 1);
        assert_eq!(rng.next_int(5), 2);
        assert_eq!(rng.next_int(1), 0);
        assert_eq!(rng.next_int(3), 0);
    }

    #[test]
    fn test_std_rng_stays_in_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        for bound in 1..20 {
            assert!(rng.next_int(bound) < bound);
        }
        assert_eq!(rng.next_int(0), 0);
    }
}
