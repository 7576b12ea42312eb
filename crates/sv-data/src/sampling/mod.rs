//! Row collection for a pass: reservoir sampling or keep-everything

pub mod reservoir;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub use reservoir::{Reservoir, ReservoirSampler};

/// Build the sampler's random source from an optional seed
pub fn sampler_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Destination for the rows of one pass
pub enum RowSink<T, R> {
    /// Bounded uniform sample
    Reservoir(ReservoirSampler<T, R>),
    /// Every row, unbounded
    All(Vec<T>),
}

impl<T, R: Rng> RowSink<T, R> {
    /// Offer the next row
    pub fn offer(&mut self, item: T) {
        match self {
            RowSink::Reservoir(sampler) => sampler.offer(item),
            RowSink::All(items) => items.push(item),
        }
    }

    /// Rows offered so far
    pub fn seen(&self) -> u64 {
        match self {
            RowSink::Reservoir(sampler) => sampler.seen(),
            RowSink::All(items) => items.len() as u64,
        }
    }

    /// Freeze the collected rows
    pub fn finalize(self) -> Reservoir<T> {
        match self {
            RowSink::Reservoir(sampler) => sampler.finalize(),
            RowSink::All(items) => Reservoir {
                total_seen: items.len() as u64,
                was_sampled: false,
                items,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keep_all_never_samples() {
        let mut sink: RowSink<u32, StdRng> = RowSink::All(Vec::new());
        for i in 0..100 {
            sink.offer(i);
        }
        assert_eq!(sink.seen(), 100);

        let reservoir = sink.finalize();
        assert_eq!(reservoir.items.len(), 100);
        assert!(!reservoir.was_sampled);
    }

    #[test]
    fn test_seeded_rng_is_deterministic() {
        let a: Vec<u32> = (0..5).map({
            let mut rng = sampler_rng(Some(9));
            move |_| rng.gen()
        }).collect();
        let b: Vec<u32> = (0..5).map({
            let mut rng = sampler_rng(Some(9));
            move |_| rng.gen()
        }).collect();
        assert_eq!(a, b);
    }
}
