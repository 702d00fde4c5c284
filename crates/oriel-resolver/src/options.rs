use oriel_symbols::MatchWeights;
use serde::{Deserialize, Serialize};
use std::thread;

/// Knobs of a resolution run. Deserializable so a driver can read them
/// from its configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveOptions {
    /// Process the units of a pass on worker threads.
    pub parallel: bool,
    /// Upper bound on worker threads per pass.
    pub max_workers: usize,
    pub weights: MatchWeights,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            max_workers: thread::available_parallelism().map_or(1, |n| n.get()),
            weights: MatchWeights::default(),
        }
    }
}

impl ResolveOptions {
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Self::default()
        }
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    pub fn with_weights(mut self, weights: MatchWeights) -> Self {
        self.weights = weights;
        self
    }

    /// How many threads to use for `units` units.
    pub fn workers_for(&self, units: usize) -> usize {
        if self.parallel {
            self.max_workers.clamp(1, units.max(1))
        } else {
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workers_are_bounded() {
        let options = ResolveOptions::default().with_max_workers(4);

        assert_eq!(options.workers_for(20), 4);
        assert_eq!(options.workers_for(2), 2);
        assert_eq!(options.workers_for(0), 1);
        assert_eq!(ResolveOptions::sequential().workers_for(20), 1);
    }
}
