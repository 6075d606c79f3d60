// tokenomics/src/lib.rs

//! PoVB Emission and Reward Distribution
//!
//! This crate implements the monetary side of block processing:
//! - Halving-based base-reward emission schedule
//! - Stake-proportional reward distribution with MOA compliance penalties
//! - Narrow collaborator interfaces for the bank ledger and the external
//!   stake-activation service

pub mod emission;
pub mod rewards;

pub use emission::{EmissionScheduler, HalvingInfo};
pub use rewards::{
    ActivatedStake, BankLedger, RewardDistributor, StakeActivation, ValidatorRewardInfo,
};

use chain_core::CoreError;

/// Result type for tokenomics operations
pub type TokenomicsResult<T> = Result<T, TokenomicsError>;

/// Errors that can occur in tokenomics operations
#[derive(Debug, thiserror::Error)]
pub enum TokenomicsError {
    #[error("Reward distribution error: {0}")]
    Distribution(String),

    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}
