//! Per-level challenge generation
//!
//! A challenge is a target sum plus two shuffled sets of 12 numbers. Each
//! set hides one half of a solving pair among random distractors whose range
//! grows with the level.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::consts::SEGMENT_COUNT;

/// One level's puzzle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    /// Value both selections must add up to
    pub target_sum: u32,
    /// Values on the first reel
    pub numbers1: Vec<u32>,
    /// Values on the second reel
    pub numbers2: Vec<u32>,
    /// The planted pair (numbers1 side, numbers2 side)
    pub solution: (u32, u32),
}

impl Challenge {
    /// Inclusive-exclusive range `target_sum` is drawn from
    pub fn target_range(level: u32) -> std::ops::Range<u32> {
        (10 + 2 * level)..(25 + 4 * level)
    }

    /// Exclusive upper bound for distractor values
    pub fn distractor_range(level: u32, target_sum: u32) -> u32 {
        target_sum + 15 + 5 * level
    }

    /// Whether `a + b` solves this challenge
    pub fn is_solution(&self, a: u32, b: u32) -> bool {
        a.checked_add(b) == Some(self.target_sum)
    }

    /// All index pairs `(i, j)` with `numbers1[i] + numbers2[j] == target_sum`
    pub fn solving_pairs(&self) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        for (i, &a) in self.numbers1.iter().enumerate() {
            for (j, &b) in self.numbers2.iter().enumerate() {
                if self.is_solution(a, b) {
                    pairs.push((i, j));
                }
            }
        }
        pairs
    }
}

/// Generate the challenge for `level` (levels start at 1)
pub fn generate<R: Rng + ?Sized>(level: u32, rng: &mut R) -> Challenge {
    let level = if level == 0 {
        log::warn!("Challenge requested for level 0, using level 1");
        1
    } else {
        level
    };

    let target_sum = rng.random_range(Challenge::target_range(level));

    // Both halves positive and strictly below the target
    let solution1 = rng.random_range(1..=target_sum - 2);
    let solution2 = target_sum - solution1;

    let distractors = Challenge::distractor_range(level, target_sum);
    let numbers1 = number_set(solution1, distractors, rng);
    let numbers2 = number_set(solution2, distractors, rng);

    log::debug!(
        "Level {} challenge: target {} ({} + {})",
        level,
        target_sum,
        solution1,
        solution2
    );

    Challenge {
        target_sum,
        numbers1,
        numbers2,
        solution: (solution1, solution2),
    }
}

/// Build a shuffled set of `SEGMENT_COUNT` distinct values containing `seed`
fn number_set<R: Rng + ?Sized>(seed: u32, range: u32, rng: &mut R) -> Vec<u32> {
    let mut values = Vec::with_capacity(SEGMENT_COUNT);
    values.push(seed);
    while values.len() < SEGMENT_COUNT {
        let candidate = rng.random_range(0..range);
        if !values.contains(&candidate) {
            values.push(candidate);
        }
    }
    values.shuffle(rng);
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn assert_valid(challenge: &Challenge, level: u32) {
        for numbers in [&challenge.numbers1, &challenge.numbers2] {
            assert_eq!(numbers.len(), SEGMENT_COUNT);
            let mut sorted = numbers.clone();
            sorted.sort_unstable();
            sorted.dedup();
            assert_eq!(sorted.len(), SEGMENT_COUNT, "duplicate values in {:?}", numbers);
        }
        assert!(Challenge::target_range(level).contains(&challenge.target_sum));
        assert!(!challenge.solving_pairs().is_empty());
    }

    #[test]
    fn test_level_one_ranges() {
        let mut rng = Pcg32::seed_from_u64(1);
        for _ in 0..200 {
            let challenge = generate(1, &mut rng);
            assert_valid(&challenge, 1);
            assert!((12..29).contains(&challenge.target_sum));
            let (a, b) = challenge.solution;
            assert!(a >= 1 && b >= 1);
            assert!(a < challenge.target_sum && b < challenge.target_sum);
            assert!(challenge.numbers1.contains(&a));
            assert!(challenge.numbers2.contains(&b));
        }
    }

    #[test]
    fn test_distractors_stay_in_range() {
        let mut rng = Pcg32::seed_from_u64(99);
        for level in 1..20 {
            let challenge = generate(level, &mut rng);
            let bound = Challenge::distractor_range(level, challenge.target_sum);
            assert!(challenge.numbers1.iter().all(|&n| n < bound));
            assert!(challenge.numbers2.iter().all(|&n| n < bound));
        }
    }

    #[test]
    fn test_level_zero_is_clamped() {
        let mut rng = Pcg32::seed_from_u64(5);
        let challenge = generate(0, &mut rng);
        assert_valid(&challenge, 1);
    }

    #[test]
    fn test_same_seed_same_challenge() {
        let a = generate(3, &mut Pcg32::seed_from_u64(1234));
        let b = generate(3, &mut Pcg32::seed_from_u64(1234));
        assert_eq!(a, b);
    }

    #[test]
    fn test_is_solution() {
        let challenge = Challenge {
            target_sum: 20,
            numbers1: vec![8],
            numbers2: vec![12],
            solution: (8, 12),
        };
        assert!(challenge.is_solution(8, 12));
        assert!(!challenge.is_solution(8, 11));
        assert!(!challenge.is_solution(u32::MAX, 21));
    }

    proptest! {
        #[test]
        fn generated_challenges_are_solvable(level in 1u32..500, seed in any::<u64>()) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let challenge = generate(level, &mut rng);
            assert_valid(&challenge, level);
        }
    }
}
