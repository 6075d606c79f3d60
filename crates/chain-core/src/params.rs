// chain-core/src/params.rs

use crate::keys::PARAMS_KEY;
use crate::store::{get_typed, set_typed, StateStore};
use crate::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Module parameters, persisted under the `Params` singleton key.
///
/// Governance-adjustable knobs for block timing, emission, MOA penalties
/// and housekeeping windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Params {
    /// Target block time before activity adjustment
    pub base_block_time: Duration,
    /// Activity score at or above which blocks speed up the most
    pub high_activity_threshold: u64,
    /// Activity score below which no speedup applies
    pub low_activity_threshold: u64,
    /// Smallest accepted burn, in micro-ANT
    pub min_burn_amount: u64,
    /// Largest accepted burn, in micro-ANT
    pub max_burn_amount: u64,
    /// Denomination of the minted reward token
    pub reward_denom: String,
    /// Emission at height zero, in micro-WRT per block
    pub base_block_reward: u64,
    /// Blocks between emission halvings
    pub halving_interval: u64,
    /// MOA compliance at or above this gets the full reward
    pub moa_penalty_threshold_high: f64,
    pub moa_penalty_threshold_warning: f64,
    pub moa_penalty_threshold_medium: f64,
    /// Below this threshold the reward is zeroed out
    pub moa_penalty_threshold_low: f64,
    pub moa_penalty_multiplier_warning: f64,
    pub moa_penalty_multiplier_medium: f64,
    pub moa_penalty_multiplier_low: f64,
    /// Block-time scale factor applied at high activity
    pub activity_factor_high: f64,
    pub activity_factor_medium: f64,
    pub activity_factor_normal: f64,
    /// Number of recent block-time samples kept for averaging
    pub average_block_time_window_size: u64,
    /// Auctions older than this many blocks are pruned
    pub auction_history_blocks: u64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            base_block_time: Duration::from_secs(5),
            high_activity_threshold: 1000,
            low_activity_threshold: 100,
            min_burn_amount: 1_000_000,
            max_burn_amount: 1_000_000_000,
            reward_denom: "uwrt".to_string(),
            base_block_reward: 50_000_000,
            halving_interval: 210_000,
            moa_penalty_threshold_high: 1.0,
            moa_penalty_threshold_warning: 0.9,
            moa_penalty_threshold_medium: 0.7,
            moa_penalty_threshold_low: 0.5,
            moa_penalty_multiplier_warning: 0.9,
            moa_penalty_multiplier_medium: 0.75,
            moa_penalty_multiplier_low: 0.5,
            activity_factor_high: 0.5,
            activity_factor_medium: 0.75,
            activity_factor_normal: 1.0,
            average_block_time_window_size: 100,
            auction_history_blocks: 1000,
        }
    }
}

impl Params {
    pub fn validate(&self) -> CoreResult<()> {
        if self.base_block_time.is_zero() {
            return Err(CoreError::InvalidParams("base block time is zero".into()));
        }
        if self.halving_interval == 0 {
            return Err(CoreError::InvalidParams("halving interval is zero".into()));
        }
        if self.reward_denom.is_empty() {
            return Err(CoreError::InvalidParams("empty reward denom".into()));
        }
        if self.min_burn_amount > self.max_burn_amount {
            return Err(CoreError::InvalidParams(
                "min burn amount exceeds max burn amount".into(),
            ));
        }
        let thresholds = [
            self.moa_penalty_threshold_low,
            self.moa_penalty_threshold_medium,
            self.moa_penalty_threshold_warning,
            self.moa_penalty_threshold_high,
        ];
        if thresholds.iter().any(|t| !(0.0..=1.0).contains(t)) {
            return Err(CoreError::InvalidParams(
                "MOA penalty thresholds must be within [0, 1]".into(),
            ));
        }
        if thresholds.windows(2).any(|w| w[0] >= w[1]) {
            return Err(CoreError::InvalidParams(
                "MOA penalty thresholds must be strictly ascending".into(),
            ));
        }
        let multipliers = [
            self.moa_penalty_multiplier_warning,
            self.moa_penalty_multiplier_medium,
            self.moa_penalty_multiplier_low,
        ];
        if multipliers.iter().any(|m| !(0.0..=1.0).contains(m)) {
            return Err(CoreError::InvalidParams(
                "MOA penalty multipliers must be within [0, 1]".into(),
            ));
        }
        let factors = [
            self.activity_factor_high,
            self.activity_factor_medium,
            self.activity_factor_normal,
        ];
        if factors.iter().any(|f| *f <= 0.0 || *f > 10.0) {
            return Err(CoreError::InvalidParams(
                "activity factors must be within (0, 10]".into(),
            ));
        }
        if self.average_block_time_window_size < 2 {
            return Err(CoreError::InvalidParams(
                "block time window must hold at least two samples".into(),
            ));
        }
        Ok(())
    }
}

/// Read params from the store, falling back to defaults when unset
pub fn get_params<S: StateStore + ?Sized>(store: &S) -> CoreResult<Params> {
    Ok(get_typed(store, PARAMS_KEY)?.unwrap_or_default())
}

/// Validate and persist params
pub fn set_params<S: StateStore + ?Sized>(store: &mut S, params: &Params) -> CoreResult<()> {
    params.validate()?;
    set_typed(store, PARAMS_KEY, params)
}
