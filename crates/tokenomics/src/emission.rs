// tokenomics/src/emission.rs

use crate::TokenomicsResult;
use chain_core::keys::HALVING_INFO_KEY;
use chain_core::params::Params;
use chain_core::store::{get_typed, set_typed, StateStore};
use chain_core::BlockHeight;
use serde::{Deserialize, Serialize};

/// Singleton record tracking the halving schedule position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HalvingInfo {
    pub last_halving_height: BlockHeight,
    pub halving_interval: BlockHeight,
    pub next_halving_height: BlockHeight,
}

impl HalvingInfo {
    pub fn with_interval(interval: BlockHeight) -> Self {
        Self {
            last_halving_height: 0,
            halving_interval: interval,
            next_halving_height: interval,
        }
    }
}

/// Halving-based base-reward calculator.
///
/// The per-block emission starts at `base_reward` and halves every
/// `halving_interval` blocks, with integer division throughout. The value
/// saturates to zero for very large heights and never goes negative.
#[derive(Debug, Clone, Copy)]
pub struct EmissionScheduler {
    base_reward: u64,
    halving_interval: BlockHeight,
}

impl EmissionScheduler {
    pub fn new(base_reward: u64, halving_interval: BlockHeight) -> Self {
        Self {
            base_reward,
            halving_interval,
        }
    }

    pub fn from_params(params: &Params) -> Self {
        Self::new(params.base_block_reward, params.halving_interval)
    }

    /// Base reward in effect at the given height
    pub fn base_reward(&self, height: BlockHeight) -> u64 {
        let halvings = height / self.halving_interval;
        if halvings >= 64 {
            return 0;
        }
        self.base_reward >> halvings
    }

    /// Read the halving record, initializing it lazily from the configured
    /// interval on first access
    pub fn halving_info<S: StateStore + ?Sized>(&self, store: &S) -> TokenomicsResult<HalvingInfo> {
        Ok(get_typed(store, HALVING_INFO_KEY)?
            .unwrap_or_else(|| HalvingInfo::with_interval(self.halving_interval)))
    }

    pub fn set_halving_info<S: StateStore + ?Sized>(
        store: &mut S,
        info: &HalvingInfo,
    ) -> TokenomicsResult<()> {
        set_typed(store, HALVING_INFO_KEY, info)?;
        Ok(())
    }

    /// Advance the halving record once the height crosses the stored
    /// threshold. Calling again before the next threshold is a no-op.
    pub fn process_halving<S: StateStore + ?Sized>(
        &self,
        store: &mut S,
        height: BlockHeight,
    ) -> TokenomicsResult<HalvingInfo> {
        let mut info = self.halving_info(store)?;
        if height >= info.next_halving_height {
            info.last_halving_height = info.next_halving_height;
            info.next_halving_height += info.halving_interval;
            Self::set_halving_info(store, &info)?;
            tracing::info!(
                height,
                last_halving_height = info.last_halving_height,
                next_halving_height = info.next_halving_height,
                "halving processed"
            );
        }
        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chain_core::MemoryStore;
    use proptest::prelude::*;

    fn scheduler() -> EmissionScheduler {
        EmissionScheduler::from_params(&Params::default())
    }

    #[test]
    fn test_base_reward_halving_schedule() {
        let scheduler = scheduler();
        assert_eq!(scheduler.base_reward(0), 50_000_000);
        assert_eq!(scheduler.base_reward(209_999), 50_000_000);
        assert_eq!(scheduler.base_reward(210_000), 25_000_000);
        assert_eq!(scheduler.base_reward(420_000), 12_500_000);
        assert_eq!(scheduler.base_reward(630_000), 6_250_000);
    }

    #[test]
    fn test_base_reward_saturates_to_zero() {
        let scheduler = scheduler();
        assert_eq!(scheduler.base_reward(210_000 * 64), 0);
        assert_eq!(scheduler.base_reward(u64::MAX), 0);
    }

    #[test]
    fn test_halving_info_defaults() {
        let store = MemoryStore::new();
        let info = scheduler().halving_info(&store).unwrap();
        assert_eq!(info.last_halving_height, 0);
        assert_eq!(info.halving_interval, 210_000);
        assert_eq!(info.next_halving_height, 210_000);
    }

    #[test]
    fn test_process_halving_at_threshold() {
        let mut store = MemoryStore::new();
        let scheduler = scheduler();

        let info = scheduler.process_halving(&mut store, 210_000).unwrap();
        assert_eq!(info.last_halving_height, 210_000);
        assert_eq!(info.next_halving_height, 420_000);
    }

    #[test]
    fn test_process_halving_idempotent_below_threshold() {
        let mut store = MemoryStore::new();
        let scheduler = scheduler();

        scheduler.process_halving(&mut store, 210_000).unwrap();
        // Re-invoking before the next threshold leaves the record unchanged
        let info = scheduler.process_halving(&mut store, 300_000).unwrap();
        assert_eq!(info.last_halving_height, 210_000);
        assert_eq!(info.next_halving_height, 420_000);
    }

    #[test]
    fn test_process_halving_before_first_threshold() {
        let mut store = MemoryStore::new();
        let info = scheduler().process_halving(&mut store, 1000).unwrap();
        assert_eq!(info.last_halving_height, 0);
        assert_eq!(info.next_halving_height, 210_000);
    }

    proptest! {
        #[test]
        fn prop_base_reward_monotone_non_increasing(a in 0u64..10_000_000_000, b in 0u64..10_000_000_000) {
            let scheduler = scheduler();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(scheduler.base_reward(lo) >= scheduler.base_reward(hi));
        }
    }
}
