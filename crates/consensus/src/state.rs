// consensus/src/state.rs

use crate::{ConsensusError, ConsensusResult};
use chain_core::keys;
use chain_core::params::Params;
use chain_core::store::{get_typed, set_typed, StateStore};
use chain_core::{BlockContext, BlockHeight, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Singleton summary of the chain's consensus position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusState {
    pub current_height: BlockHeight,
    pub total_ant_burned: String,
    pub last_block_time: Timestamp,
    pub active_validators: Vec<String>,
}

impl Default for ConsensusState {
    fn default() -> Self {
        Self {
            current_height: 0,
            total_ant_burned: "0".to_string(),
            last_block_time: 0,
            active_validators: Vec::new(),
        }
    }
}

/// Governance-settable weight override, independent of activity scores
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorWeight {
    pub validator: String,
    pub weight: String,
}

/// One block-time observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockTimeSample {
    pub height: BlockHeight,
    pub recorded_at: Timestamp,
}

/// Maintains the consensus-state singleton, the rolling block-time window
/// and the validator weight table.
#[derive(Debug, Default)]
pub struct ConsensusStateTracker;

impl ConsensusStateTracker {
    pub fn consensus_state<S: StateStore + ?Sized>(store: &S) -> ConsensusResult<ConsensusState> {
        Ok(get_typed(store, keys::CONSENSUS_STATE_KEY)?.unwrap_or_default())
    }

    pub fn set_consensus_state<S: StateStore + ?Sized>(
        store: &mut S,
        state: &ConsensusState,
    ) -> ConsensusResult<()> {
        set_typed(store, keys::CONSENSUS_STATE_KEY, state)?;
        Ok(())
    }

    /// Replace the snapshot fields wholesale; the burned total must parse
    /// as a decimal amount
    pub fn update_consensus_state<S: StateStore + ?Sized>(
        store: &mut S,
        ctx: &BlockContext,
        current_height: BlockHeight,
        total_ant_burned: &str,
        active_validators: Vec<String>,
    ) -> ConsensusResult<()> {
        let burned = Decimal::from_str(total_ant_burned)
            .map_err(|_| ConsensusError::InvalidAntAmount(total_ant_burned.to_string()))?;
        if burned.is_sign_negative() {
            return Err(ConsensusError::InvalidAntAmount(total_ant_burned.to_string()));
        }
        let state = ConsensusState {
            current_height,
            total_ant_burned: total_ant_burned.to_string(),
            last_block_time: ctx.timestamp(),
            active_validators,
        };
        Self::set_consensus_state(store, &state)
    }

    /// Append this block's time sample to the rolling window
    pub fn record_block_time<S: StateStore + ?Sized>(
        store: &mut S,
        ctx: &BlockContext,
    ) -> ConsensusResult<()> {
        let sample = BlockTimeSample {
            height: ctx.height,
            recorded_at: ctx.timestamp(),
        };
        set_typed(store, &keys::block_time_key(ctx.height), &sample)?;
        Ok(())
    }

    /// Mean delta between consecutive samples in the window. Fails until
    /// at least two samples exist.
    pub fn average_block_time<S: StateStore + ?Sized>(store: &S) -> ConsensusResult<Duration> {
        let mut samples = Vec::new();
        for (key, bytes) in store.prefix_scan(keys::BLOCK_TIME_PREFIX)? {
            match bincode::deserialize::<BlockTimeSample>(&bytes) {
                Ok(sample) => samples.push(sample),
                Err(err) => {
                    tracing::warn!(?key, %err, "skipping malformed block time sample");
                }
            }
        }
        if samples.len() < 2 {
            return Err(ConsensusError::InsufficientSamples);
        }

        let total_millis: i64 = samples
            .windows(2)
            .map(|pair| (pair[1].recorded_at - pair[0].recorded_at).max(0))
            .sum();
        let mean = total_millis as u64 / (samples.len() as u64 - 1);
        Ok(Duration::from_millis(mean))
    }

    /// Drop samples that fell out of the rolling window
    pub fn prune_block_times<S: StateStore + ?Sized>(
        store: &mut S,
        current_height: BlockHeight,
        window: u64,
    ) -> ConsensusResult<()> {
        let cutoff_key = keys::block_time_key(current_height.saturating_sub(window));
        let stale: Vec<Vec<u8>> = store
            .prefix_scan(keys::BLOCK_TIME_PREFIX)?
            .into_iter()
            .map(|(key, _)| key)
            .take_while(|key| key < &cutoff_key)
            .collect();
        for key in &stale {
            store.delete(key)?;
        }
        Ok(())
    }

    /// Map a burned ANT amount to the target block time. Rejects zero and
    /// non-numeric input.
    pub fn calculate_block_time(params: &Params, ant_amount: &str) -> ConsensusResult<Duration> {
        let amount: u64 = ant_amount
            .parse()
            .map_err(|_| ConsensusError::InvalidAntAmount(ant_amount.to_string()))?;
        if amount == 0 {
            return Err(ConsensusError::InvalidAntAmount(ant_amount.to_string()));
        }

        let factor = if amount >= params.high_activity_threshold {
            params.activity_factor_high
        } else if amount >= params.low_activity_threshold {
            params.activity_factor_medium
        } else {
            params.activity_factor_normal
        };
        Ok(params.base_block_time.mul_f64(factor))
    }

    /// Weight override for a validator; "0" until one is set
    pub fn validator_weight<S: StateStore + ?Sized>(
        store: &S,
        validator: &str,
    ) -> ConsensusResult<String> {
        if validator.is_empty() {
            return Err(ConsensusError::EmptyValidatorAddress);
        }
        let weight: Option<ValidatorWeight> =
            get_typed(store, &keys::validator_weight_key(validator))?;
        Ok(weight.map(|w| w.weight).unwrap_or_else(|| "0".to_string()))
    }

    pub fn set_validator_weight<S: StateStore + ?Sized>(
        store: &mut S,
        validator: &str,
        weight: &str,
    ) -> ConsensusResult<()> {
        if validator.is_empty() {
            return Err(ConsensusError::EmptyValidatorAddress);
        }
        let parsed = Decimal::from_str(weight)
            .map_err(|_| ConsensusError::InvalidWeight(weight.to_string()))?;
        if parsed.is_sign_negative() {
            return Err(ConsensusError::InvalidWeight(weight.to_string()));
        }
        let record = ValidatorWeight {
            validator: validator.to_string(),
            weight: weight.to_string(),
        };
        set_typed(store, &keys::validator_weight_key(validator), &record)?;
        Ok(())
    }

    /// All weight overrides in ascending validator order
    pub fn all_validator_weights<S: StateStore + ?Sized>(
        store: &S,
    ) -> ConsensusResult<Vec<ValidatorWeight>> {
        let mut weights = Vec::new();
        for (key, bytes) in store.prefix_scan(keys::VALIDATOR_WEIGHT_PREFIX)? {
            match bincode::deserialize::<ValidatorWeight>(&bytes) {
                Ok(weight) => weights.push(weight),
                Err(err) => {
                    tracing::warn!(?key, %err, "skipping malformed validator weight");
                }
            }
        }
        Ok(weights)
    }
}
