// consensus/src/validator.rs

use crate::{ConsensusError, ConsensusResult};
use chain_core::keys;
use chain_core::params::get_params;
use chain_core::store::{get_typed, set_typed, StateStore};
use chain_core::{BlockHeight, Timestamp};
use serde::{Deserialize, Serialize};

/// Validator status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidatorStatus {
    /// Active and eligible for block creation
    Active,
    /// Temporarily out of rotation
    Inactive,
    /// Removed from rotation for misbehavior
    Jailed,
}

/// One validator record, keyed by address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    pub address: String,
    /// Locked ANT balance in micro units
    pub ant_balance: u64,
    /// String mirror of the most recently computed activity score
    pub activity_score: String,
    pub status: ValidatorStatus,
    pub last_active: Timestamp,
    pub total_blocks_created: u64,
    pub transactions_processed: u64,
}

impl Validator {
    pub fn new(address: impl Into<String>, ant_balance: u64) -> Self {
        Self {
            address: address.into(),
            ant_balance,
            activity_score: "0".to_string(),
            status: ValidatorStatus::Active,
            last_active: 0,
            total_blocks_created: 0,
            transactions_processed: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.status, ValidatorStatus::Active)
    }
}

/// Immutable audit record of who was selected for a height and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockCreator {
    pub validator: String,
    /// Locked balance snapshot taken at selection time
    pub ant_balance: u64,
    /// Activity score snapshot taken at selection time
    pub activity_score: u64,
    pub burn_amount: String,
    pub block_height: BlockHeight,
    pub selected_at: Timestamp,
}

/// Per-validator burn audit entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnProof {
    pub validator: String,
    pub amount: String,
    pub block_height: BlockHeight,
    pub recorded_at: Timestamp,
}

pub fn set_validator<S: StateStore + ?Sized>(
    store: &mut S,
    validator: &Validator,
) -> ConsensusResult<()> {
    if validator.address.is_empty() {
        return Err(ConsensusError::EmptyValidatorAddress);
    }
    set_typed(store, &keys::validator_key(&validator.address), validator)?;
    Ok(())
}

pub fn get_validator<S: StateStore + ?Sized>(
    store: &S,
    address: &str,
) -> ConsensusResult<Option<Validator>> {
    if address.is_empty() {
        return Err(ConsensusError::EmptyValidatorAddress);
    }
    Ok(get_typed(store, &keys::validator_key(address))?)
}

/// All validator records in ascending address order
pub fn all_validators<S: StateStore + ?Sized>(store: &S) -> ConsensusResult<Vec<Validator>> {
    let mut validators = Vec::new();
    for (key, bytes) in store.prefix_scan(keys::VALIDATOR_PREFIX)? {
        match bincode::deserialize::<Validator>(&bytes) {
            Ok(validator) => validators.push(validator),
            Err(err) => {
                tracing::warn!(?key, %err, "skipping malformed validator record");
            }
        }
    }
    Ok(validators)
}

/// Active validators in ascending address order
pub fn active_validators<S: StateStore + ?Sized>(store: &S) -> ConsensusResult<Vec<Validator>> {
    Ok(all_validators(store)?
        .into_iter()
        .filter(|v| v.is_active())
        .collect())
}

pub fn set_block_creator<S: StateStore + ?Sized>(
    store: &mut S,
    creator: &BlockCreator,
) -> ConsensusResult<()> {
    set_typed(store, &keys::block_creator_key(creator.block_height), creator)?;
    Ok(())
}

pub fn get_block_creator<S: StateStore + ?Sized>(
    store: &S,
    height: BlockHeight,
) -> ConsensusResult<Option<BlockCreator>> {
    Ok(get_typed(store, &keys::block_creator_key(height))?)
}

/// Record a burn proof after checking the amount against the configured
/// burn bounds
pub fn set_burn_proof<S: StateStore + ?Sized>(
    store: &mut S,
    proof: &BurnProof,
) -> ConsensusResult<()> {
    if proof.validator.is_empty() {
        return Err(ConsensusError::EmptyValidatorAddress);
    }
    let amount: u64 = proof
        .amount
        .parse()
        .map_err(|_| ConsensusError::InvalidAntAmount(proof.amount.clone()))?;
    let params = get_params(store)?;
    if amount < params.min_burn_amount || amount > params.max_burn_amount {
        return Err(ConsensusError::BurnAmountOutOfRange {
            amount,
            min: params.min_burn_amount,
            max: params.max_burn_amount,
        });
    }
    set_typed(store, &keys::burn_proof_key(&proof.validator), proof)?;
    Ok(())
}

pub fn get_burn_proof<S: StateStore + ?Sized>(
    store: &S,
    validator: &str,
) -> ConsensusResult<Option<BurnProof>> {
    Ok(get_typed(store, &keys::burn_proof_key(validator))?)
}
