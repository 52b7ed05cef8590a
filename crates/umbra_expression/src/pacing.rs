use std::time::Duration;
use umbra_core::config::CycleConfig;
use umbra_core::RandomSource;

/// Randomized gap between cycles, so activity has no fixed period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CyclePacer {
    min_secs: u64,
    max_secs: u64,
}

impl CyclePacer {
    /// Bounds are inclusive; reversed bounds are swapped.
    pub fn new(min_secs: u64, max_secs: u64) -> Self {
        Self {
            min_secs: min_secs.min(max_secs),
            max_secs: min_secs.max(max_secs),
        }
    }

    pub fn from_config(config: &CycleConfig) -> Self {
        Self::new(config.interval_min_secs, config.interval_max_secs)
    }

    /// Whole seconds drawn uniformly from `[min, max]`.
    pub fn next_delay(&self, rng: &mut dyn RandomSource) -> Duration {
        let span = (self.max_secs - self.min_secs).saturating_add(1);
        let offset = ((rng.next_unit() * span as f64).floor() as u64).min(span - 1);
        Duration::from_secs(self.min_secs + offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use umbra_core::{FixedSequence, SeededRandom};

    #[test]
    fn test_bounds_inclusive() {
        let pacer = CyclePacer::new(300, 900);
        assert_eq!(pacer.next_delay(&mut FixedSequence::new(vec![0.0])), Duration::from_secs(300));
        assert_eq!(pacer.next_delay(&mut FixedSequence::new(vec![0.9999999])), Duration::from_secs(900));
        assert_eq!(pacer.next_delay(&mut FixedSequence::new(vec![0.5])), Duration::from_secs(600));
    }

    #[test]
    fn test_fixed_interval() {
        let pacer = CyclePacer::new(60, 60);
        assert_eq!(pacer.next_delay(&mut FixedSequence::new(vec![0.7])), Duration::from_secs(60));
    }

    #[test]
    fn test_reversed_bounds_swapped() {
        assert_eq!(CyclePacer::new(900, 300), CyclePacer::new(300, 900));
    }

    #[test]
    fn test_full_range_does_not_overflow() {
        let pacer = CyclePacer::new(0, u64::MAX);
        assert_eq!(pacer.next_delay(&mut FixedSequence::new(vec![0.0])), Duration::from_secs(0));
        let top = pacer.next_delay(&mut FixedSequence::new(vec![0.9999999]));
        assert!(top.as_secs() > u64::MAX / 2);

        let pinned = CyclePacer::new(u64::MAX, u64::MAX);
        assert_eq!(pinned.next_delay(&mut FixedSequence::new(vec![0.5])), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn test_delays_have_variation() {
        let pacer = CyclePacer::from_config(&CycleConfig::default());
        let mut rng = SeededRandom::new(7);
        let delays: Vec<_> = (0..20).map(|_| pacer.next_delay(&mut rng)).collect();
        assert!(delays.iter().all(|d| (300..=900).contains(&d.as_secs())));
        assert!(delays.windows(2).any(|w| w[0] != w[1]), "Delays should vary");
    }
}
