// Permutation Sampler - Draws unit orders that have not been used yet in a session

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::{ReshuffleError, ReshuffleResult};

/// Requested version count was larger than the number of distinct orders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityWarning {
    pub requested: usize,
    pub available: usize,
}

impl std::fmt::Display for CapacityWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "requested {} versions but only {} distinct orders exist",
            self.requested, self.available
        )
    }
}

/// Number of distinct valid orders: `(U-2)!` with fixed endpoints, `U!` otherwise
///
/// Saturates at `u128::MAX`.
pub fn max_distinct_permutations(unit_count: usize, preserve_endpoints: bool) -> u128 {
    let free = if preserve_endpoints && unit_count > 2 {
        unit_count - 2
    } else {
        unit_count
    };
    (2..=free as u128).fold(1u128, |acc, n| acc.saturating_mul(n))
}

/// Draw an order not present in `used`, retrying at most `max_attempts` times
///
/// With `preserve_endpoints` only slots `1..U-1` are shuffled.
pub fn sample_order<R: Rng>(
    unit_count: usize,
    preserve_endpoints: bool,
    used: &HashSet<Vec<usize>>,
    max_attempts: usize,
    rng: &mut R,
) -> ReshuffleResult<Vec<usize>> {
    for _ in 0..max_attempts {
        let mut order: Vec<usize> = (0..unit_count).collect();
        if preserve_endpoints && unit_count > 2 {
            order[1..unit_count - 1].shuffle(rng);
        } else {
            order.shuffle(rng);
        }
        if !used.contains(&order) {
            return Ok(order);
        }
    }

    Err(ReshuffleError::ExhaustedPermutations {
        attempts: max_attempts,
    })
}

/// Session-scoped sampler that remembers every order it has handed out
#[derive(Debug, Clone)]
pub struct PermutationSampler {
    unit_count: usize,
    preserve_endpoints: bool,
    max_attempts: usize,
    used: HashSet<Vec<usize>>,
}

impl PermutationSampler {
    /// Fails when no meaningful shuffle exists for `unit_count` units
    pub fn new(unit_count: usize, preserve_endpoints: bool, max_attempts: usize) -> ReshuffleResult<Self> {
        if unit_count < 2 {
            return Err(ReshuffleError::InsufficientData(format!(
                "{} unit(s) cannot be reordered",
                unit_count
            )));
        }
        if preserve_endpoints && unit_count <= 2 {
            return Err(ReshuffleError::InsufficientData(format!(
                "No meaningful shuffle possible: {} units with fixed endpoints",
                unit_count
            )));
        }

        Ok(PermutationSampler {
            unit_count,
            preserve_endpoints,
            max_attempts,
            used: HashSet::new(),
        })
    }

    pub fn capacity(&self) -> u128 {
        max_distinct_permutations(self.unit_count, self.preserve_endpoints)
    }

    /// Cap a requested version count to the number of distinct orders
    pub fn cap_request(&self, requested: usize) -> (usize, Option<CapacityWarning>) {
        let capacity = self.capacity();
        if requested as u128 <= capacity {
            return (requested, None);
        }

        let available = capacity as usize;
        (
            available,
            Some(CapacityWarning {
                requested,
                available,
            }),
        )
    }

    /// Next unused order; it is recorded as used
    pub fn sample<R: Rng>(&mut self, rng: &mut R) -> ReshuffleResult<Vec<usize>> {
        let order = sample_order(
            self.unit_count,
            self.preserve_endpoints,
            &self.used,
            self.max_attempts,
            rng,
        )?;
        self.used.insert(order.clone());
        Ok(order)
    }

    pub fn used(&self) -> &HashSet<Vec<usize>> {
        &self.used
    }
}
