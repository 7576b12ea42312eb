//! Single-pass uniform reservoir sampling

use rand::Rng;

use crate::DataError;

/// Fixed-capacity uniform sample over a stream of unknown length.
///
/// Item `i` (0-based, in offer order) goes straight into slot `i` while the
/// reservoir is filling. After that one integer `j` is drawn uniformly from
/// `[0, i]` per item, and the item replaces slot `j` when `j < k`. Every item
/// of an `n`-item stream ends up in the sample with probability `k / n`.
///
/// The sampler never sees batch boundaries, so the draws made for a given
/// item index depend only on the random source and the item order.
#[derive(Debug)]
pub struct ReservoirSampler<T, R> {
    /// Kept items
    items: Vec<T>,

    /// Capacity `k`
    capacity: usize,

    /// Items offered so far
    seen: u64,

    /// Random source
    rng: R,
}

/// Frozen reservoir contents
#[derive(Debug, Clone, PartialEq)]
pub struct Reservoir<T> {
    pub items: Vec<T>,
    pub total_seen: u64,
    pub was_sampled: bool,
}

impl<T, R: Rng> ReservoirSampler<T, R> {
    /// Create a sampler with capacity `k`, failing when `k` is zero
    pub fn new(capacity: usize, rng: R) -> Result<Self, DataError> {
        if capacity == 0 {
            return Err(DataError::InvalidCapacity(0));
        }

        Ok(Self {
            // Large capacities are reached lazily
            items: Vec::with_capacity(capacity.min(1 << 16)),
            capacity,
            seen: 0,
            rng,
        })
    }

    /// Offer the next item of the stream
    pub fn offer(&mut self, item: T) {
        let i = self.seen;
        self.seen += 1;

        if i < self.capacity as u64 {
            self.items.push(item);
            return;
        }

        let j = self.rng.gen_range(0..=i);
        if j < self.capacity as u64 {
            self.items[j as usize] = item;
        }
    }

    /// Items offered so far
    pub fn seen(&self) -> u64 {
        self.seen
    }

    /// Items currently kept
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Stop sampling and hand back the kept items
    pub fn finalize(self) -> Reservoir<T> {
        Reservoir {
            was_sampled: self.seen > self.capacity as u64,
            total_seen: self.seen,
            items: self.items,
        }
    }
}
