// tokenomics/src/rewards.rs

use crate::emission::EmissionScheduler;
use crate::TokenomicsResult;
use chain_core::events::{
    ATTR_KEY_BASE_REWARD, ATTR_KEY_BLOCK_HEIGHT, ATTR_KEY_PENALTY_MULTIPLIER,
    ATTR_KEY_REWARD_AMOUNT, ATTR_KEY_VALIDATOR, EVENT_TYPE_REWARD_DISTRIBUTED,
};
use chain_core::params::{get_params, Params};
use chain_core::store::StateStore;
use chain_core::{BlockContext, BlockHeight, Coin, Event, MODULE_NAME};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One validator's activated stake as reported by the activation service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivatedStake {
    pub validator: String,
    pub amount: u64,
}

/// Bank ledger operations consumed by reward distribution.
///
/// Failures here are tolerated per validator: a failed mint or transfer is
/// logged and the loop moves on.
pub trait BankLedger {
    fn mint_coins(&mut self, module: &str, coin: &Coin) -> anyhow::Result<()>;

    fn send_coins_from_module_to_account(
        &mut self,
        module: &str,
        recipient: &str,
        coin: &Coin,
    ) -> anyhow::Result<()>;
}

/// External stake-activation service consulted for reward eligibility
pub trait StakeActivation {
    fn all_activated_stake(&self) -> anyhow::Result<Vec<ActivatedStake>>;

    /// MOA compliance ratio in [0, 1]; implementations return 1.0 when no
    /// record exists for the validator
    fn moa_compliance(&self, validator: &str) -> anyhow::Result<f64>;

    #[allow(clippy::too_many_arguments)]
    fn update_reward_stats(
        &mut self,
        validator: &str,
        reward_amount: u64,
        block_height: BlockHeight,
        moa_compliance: f64,
        penalty_multiplier: f64,
        base_reward: u64,
    ) -> anyhow::Result<()>;
}

/// Per-validator outcome of one distribution pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorRewardInfo {
    pub validator: String,
    pub activated_stake: u64,
    pub reward_share: f64,
    pub moa_compliance: f64,
    pub penalty_multiplier: f64,
    pub final_reward_amount: u64,
}

/// Distributes each block's base reward across validators in proportion to
/// their activated stake, scaled down by the MOA compliance penalty.
#[derive(Debug, Default)]
pub struct RewardDistributor;

impl RewardDistributor {
    pub fn new() -> Self {
        Self
    }

    /// Step function mapping MOA compliance to a reward multiplier
    pub fn penalty_multiplier(params: &Params, compliance: f64) -> f64 {
        if compliance >= params.moa_penalty_threshold_high {
            1.0
        } else if compliance >= params.moa_penalty_threshold_warning {
            params.moa_penalty_multiplier_warning
        } else if compliance >= params.moa_penalty_threshold_medium {
            params.moa_penalty_multiplier_medium
        } else if compliance >= params.moa_penalty_threshold_low {
            params.moa_penalty_multiplier_low
        } else {
            0.0
        }
    }

    /// Compute the per-validator split of `base_reward`.
    ///
    /// Returns the reward infos in validator-address order together with
    /// the pre-penalty total, which always equals `base_reward` up to floor
    /// rounding. Compliance lookups that fail fall back to full compliance.
    pub fn calculate_distribution(
        &self,
        params: &Params,
        stake_activation: &dyn StakeActivation,
        base_reward: u64,
        stakes: &BTreeMap<String, u64>,
    ) -> TokenomicsResult<(Vec<ValidatorRewardInfo>, u64)> {
        let total_stake: u64 = stakes.values().sum();
        if total_stake == 0 {
            return Ok((Vec::new(), 0));
        }

        let mut infos = Vec::with_capacity(stakes.len());
        let mut total_distributed = 0u64;

        for (validator, amount) in stakes {
            let reward_share = *amount as f64 / total_stake as f64;
            let raw_reward = (base_reward as f64 * reward_share).floor() as u64;

            let moa_compliance = stake_activation.moa_compliance(validator).unwrap_or(1.0);
            let penalty_multiplier = Self::penalty_multiplier(params, moa_compliance);
            let final_reward_amount = (raw_reward as f64 * penalty_multiplier).floor() as u64;

            total_distributed += raw_reward;
            infos.push(ValidatorRewardInfo {
                validator: validator.clone(),
                activated_stake: *amount,
                reward_share,
                moa_compliance,
                penalty_multiplier,
                final_reward_amount,
            });
        }

        Ok((infos, total_distributed))
    }

    /// Run one block's reward distribution.
    ///
    /// Distribution is best-effort: a missing collaborator or an empty
    /// activated-stake set is a successful no-op, and a failed mint or
    /// transfer for one validator never blocks the others.
    pub fn distribute_base_rewards<S: StateStore + ?Sized>(
        &self,
        store: &mut S,
        ctx: &mut BlockContext,
        bank: Option<&mut (dyn BankLedger + 'static)>,
        stake_activation: Option<&mut (dyn StakeActivation + 'static)>,
        height: BlockHeight,
    ) -> TokenomicsResult<Vec<ValidatorRewardInfo>> {
        let Some(stake_activation) = stake_activation else {
            tracing::debug!(height, "no stake activation service, skipping reward distribution");
            return Ok(Vec::new());
        };
        let Some(bank) = bank else {
            tracing::debug!(height, "no bank ledger, skipping reward distribution");
            return Ok(Vec::new());
        };

        let activated = match stake_activation.all_activated_stake() {
            Ok(activated) => activated,
            Err(err) => {
                tracing::warn!(height, %err, "failed to load activated stake, skipping distribution");
                return Ok(Vec::new());
            }
        };

        let stakes: BTreeMap<String, u64> = activated
            .into_iter()
            .filter(|s| s.amount > 0)
            .map(|s| (s.validator, s.amount))
            .collect();
        if stakes.is_empty() {
            tracing::debug!(height, "no activated stake, skipping reward distribution");
            return Ok(Vec::new());
        }

        let params = get_params(store)?;
        let base_reward = EmissionScheduler::from_params(&params).base_reward(height);
        let (infos, total_distributed) =
            self.calculate_distribution(&params, &*stake_activation, base_reward, &stakes)?;

        tracing::debug!(
            height,
            base_reward,
            total_distributed,
            validators = infos.len(),
            "distributing base rewards"
        );

        for info in &infos {
            if info.final_reward_amount == 0 {
                continue;
            }
            let coin = Coin::new(params.reward_denom.clone(), info.final_reward_amount);

            if let Err(err) = bank.mint_coins(MODULE_NAME, &coin) {
                tracing::warn!(validator = %info.validator, %err, "mint failed, skipping validator");
                continue;
            }
            if let Err(err) =
                bank.send_coins_from_module_to_account(MODULE_NAME, &info.validator, &coin)
            {
                tracing::warn!(validator = %info.validator, %err, "transfer failed, skipping validator");
                continue;
            }

            ctx.events.emit(
                Event::new(EVENT_TYPE_REWARD_DISTRIBUTED)
                    .attr(ATTR_KEY_VALIDATOR, info.validator.clone())
                    .attr(ATTR_KEY_REWARD_AMOUNT, info.final_reward_amount.to_string())
                    .attr(ATTR_KEY_BLOCK_HEIGHT, height.to_string())
                    .attr(
                        ATTR_KEY_PENALTY_MULTIPLIER,
                        info.penalty_multiplier.to_string(),
                    )
                    .attr(ATTR_KEY_BASE_REWARD, base_reward.to_string()),
            );

            if let Err(err) = stake_activation.update_reward_stats(
                &info.validator,
                info.final_reward_amount,
                height,
                info.moa_compliance,
                info.penalty_multiplier,
                base_reward,
            ) {
                tracing::warn!(validator = %info.validator, %err, "reward stats update failed");
            }
        }

        Ok(infos)
    }
}
