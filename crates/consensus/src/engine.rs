// consensus/src/engine.rs

use crate::auction::{BalanceSource, BlindAuction, BlindAuctionEngine};
use crate::scoring::ActivityScorer;
use crate::selection::SelectionLottery;
use crate::state::{ConsensusState, ConsensusStateTracker};
use crate::validator::{self, BlockCreator, Validator};
use crate::{ConsensusError, ConsensusResult};
use chain_core::params::{self, Params};
use chain_core::store::StateStore;
use chain_core::{BlockContext, BlockHeight};
use std::time::Duration;
use tokenomics::{
    BankLedger, EmissionScheduler, HalvingInfo, RewardDistributor, StakeActivation,
    ValidatorRewardInfo,
};

/// PoVB engine facade.
///
/// Owns the store handle and the optional external collaborators, and
/// exposes the per-block hooks plus the authority-gated message surface.
/// All state flows through the explicit store handle; there are no hidden
/// singletons.
pub struct PovbEngine<S: StateStore> {
    store: S,
    authority: String,
    distributor: RewardDistributor,
    bank: Option<Box<dyn BankLedger>>,
    stake_activation: Option<Box<dyn StakeActivation>>,
    balance_source: Option<Box<dyn BalanceSource>>,
}

impl<S: StateStore> PovbEngine<S> {
    pub fn new(store: S, authority: impl Into<String>) -> Self {
        Self {
            store,
            authority: authority.into(),
            distributor: RewardDistributor::new(),
            bank: None,
            stake_activation: None,
            balance_source: None,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn set_bank_ledger(&mut self, bank: Option<Box<dyn BankLedger>>) {
        self.bank = bank;
    }

    pub fn set_stake_activation(&mut self, stake_activation: Option<Box<dyn StakeActivation>>) {
        self.stake_activation = stake_activation;
    }

    pub fn set_balance_source(&mut self, balance_source: Option<Box<dyn BalanceSource>>) {
        self.balance_source = balance_source;
    }

    fn ensure_authority(&self, authority: &str) -> ConsensusResult<()> {
        if authority != self.authority {
            return Err(ConsensusError::Unauthorized);
        }
        Ok(())
    }

    // ==================== BLOCK HOOKS ====================

    /// Per-block entry hook: record timing, refresh the consensus-state
    /// snapshot and activity scores, then pick the creator for the next
    /// height. A chain without active validators cannot progress, so the
    /// selection failure propagates.
    pub fn begin_block(&mut self, ctx: &mut BlockContext) -> ConsensusResult<BlockCreator> {
        ConsensusStateTracker::record_block_time(&mut self.store, ctx)?;

        let active = validator::active_validators(&self.store)?;
        let mut state = ConsensusStateTracker::consensus_state(&self.store)?;
        state.current_height = ctx.height;
        state.last_block_time = ctx.timestamp();
        state.active_validators = active.iter().map(|v| v.address.clone()).collect();
        ConsensusStateTracker::set_consensus_state(&mut self.store, &state)?;

        let scores = ActivityScorer::refresh(&mut self.store, ctx)?;
        SelectionLottery::select_and_record(&mut self.store, ctx, &scores)
    }

    /// Per-block exit hook: advance the halving schedule, distribute the
    /// block's rewards and run housekeeping on bounded histories.
    pub fn end_block(&mut self, ctx: &mut BlockContext) -> ConsensusResult<Vec<ValidatorRewardInfo>> {
        let params = self.params()?;
        let scheduler = EmissionScheduler::from_params(&params);
        scheduler.process_halving(&mut self.store, ctx.height)?;

        let height = ctx.height;
        let rewards = self.distributor.distribute_base_rewards(
            &mut self.store,
            ctx,
            self.bank.as_deref_mut(),
            self.stake_activation.as_deref_mut(),
            height,
        )?;

        BlindAuctionEngine::prune(&mut self.store, height, params.auction_history_blocks)?;
        ConsensusStateTracker::prune_block_times(
            &mut self.store,
            height,
            params.average_block_time_window_size,
        )?;

        Ok(rewards)
    }

    // ==================== MESSAGES ====================

    pub fn handle_update_consensus_state(
        &mut self,
        ctx: &BlockContext,
        authority: &str,
        current_height: BlockHeight,
        total_ant_burned: &str,
        active_validators: Vec<String>,
    ) -> ConsensusResult<()> {
        self.ensure_authority(authority)?;
        ConsensusStateTracker::update_consensus_state(
            &mut self.store,
            ctx,
            current_height,
            total_ant_burned,
            active_validators,
        )
    }

    pub fn handle_set_validator_weight(
        &mut self,
        authority: &str,
        validator: &str,
        weight: &str,
    ) -> ConsensusResult<()> {
        self.ensure_authority(authority)?;
        ConsensusStateTracker::set_validator_weight(&mut self.store, validator, weight)
    }

    pub fn handle_process_halving(
        &mut self,
        ctx: &BlockContext,
        authority: &str,
    ) -> ConsensusResult<HalvingInfo> {
        self.ensure_authority(authority)?;
        let params = self.params()?;
        let scheduler = EmissionScheduler::from_params(&params);
        Ok(scheduler.process_halving(&mut self.store, ctx.height)?)
    }

    /// Weighted selection over a caller-supplied validator list, using
    /// stored activity scores as weights
    pub fn handle_select_block_producer(
        &self,
        ctx: &BlockContext,
        authority: &str,
        validators: &[String],
    ) -> ConsensusResult<String> {
        self.ensure_authority(authority)?;
        if validators.is_empty() {
            return Err(ConsensusError::NoValidators);
        }

        let mut candidates = Vec::with_capacity(validators.len());
        for address in validators {
            let score = ActivityScorer::activity_score(&self.store, address)?
                .map(|s| s.score)
                .unwrap_or(0);
            candidates.push((address.clone(), score));
        }
        candidates.sort();
        SelectionLottery::select(ctx, &candidates)
    }

    pub fn handle_calculate_block_time(
        &self,
        authority: &str,
        ant_amount: &str,
    ) -> ConsensusResult<Duration> {
        self.ensure_authority(authority)?;
        let params = self.params()?;
        ConsensusStateTracker::calculate_block_time(&params, ant_amount)
    }

    /// Commit a sealed bid. A zero height resolves to the context height.
    pub fn handle_commit_bid(
        &mut self,
        ctx: &mut BlockContext,
        validator: &str,
        commit_hash: &str,
        height: BlockHeight,
    ) -> ConsensusResult<()> {
        let height = if height == 0 { ctx.height } else { height };
        BlindAuctionEngine::commit(&mut self.store, ctx, validator, commit_hash, height)
    }

    /// Reveal a bid. A zero height resolves to the context height.
    pub fn handle_reveal_bid(
        &mut self,
        ctx: &mut BlockContext,
        validator: &str,
        nonce: &str,
        bid_amount: &str,
        height: BlockHeight,
    ) -> ConsensusResult<()> {
        let height = if height == 0 { ctx.height } else { height };
        BlindAuctionEngine::reveal(
            &mut self.store,
            ctx,
            self.balance_source.as_deref(),
            validator,
            nonce,
            bid_amount,
            height,
        )
    }

    pub fn create_blind_auction(&mut self, height: BlockHeight) -> ConsensusResult<BlindAuction> {
        BlindAuctionEngine::create(&mut self.store, height)
    }

    pub fn transition_auction_phase(
        &mut self,
        height: BlockHeight,
    ) -> ConsensusResult<BlindAuction> {
        BlindAuctionEngine::transition_phase(&mut self.store, height)
    }

    // ==================== QUERIES ====================

    pub fn params(&self) -> ConsensusResult<Params> {
        Ok(params::get_params(&self.store)?)
    }

    pub fn set_params(&mut self, new_params: &Params) -> ConsensusResult<()> {
        Ok(params::set_params(&mut self.store, new_params)?)
    }

    pub fn validators(&self) -> ConsensusResult<Vec<Validator>> {
        validator::all_validators(&self.store)
    }

    pub fn block_creator(&self, height: BlockHeight) -> ConsensusResult<Option<BlockCreator>> {
        validator::get_block_creator(&self.store, height)
    }

    pub fn blind_auction(&self, height: BlockHeight) -> ConsensusResult<Option<BlindAuction>> {
        BlindAuctionEngine::get(&self.store, height)
    }

    pub fn consensus_state(&self) -> ConsensusResult<ConsensusState> {
        ConsensusStateTracker::consensus_state(&self.store)
    }

    pub fn halving_info(&self) -> ConsensusResult<HalvingInfo> {
        let params = self.params()?;
        Ok(EmissionScheduler::from_params(&params).halving_info(&self.store)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auction::hash_commit;
    use crate::validator::set_validator;
    use chain_core::events::EVENT_TYPE_BLOCK_CREATOR_SELECTED;
    use chain_core::MemoryStore;
    use chrono::{TimeZone, Utc};
    use tokenomics::ActivatedStake;

    const AUTHORITY: &str = "cosmos1authority";

    fn test_ctx(height: u64) -> BlockContext {
        let time = Utc.timestamp_opt(1_700_000_000 + height as i64 * 5, 0).unwrap();
        BlockContext::new(height, time, [4u8; 32])
    }

    fn engine_with_validator() -> PovbEngine<MemoryStore> {
        let mut engine = PovbEngine::new(MemoryStore::new(), AUTHORITY);
        let mut validator = Validator::new("cosmos1validator", 1_000_000);
        validator.total_blocks_created = 3;
        set_validator(engine.store_mut(), &validator).unwrap();
        engine
    }

    #[derive(Default)]
    struct RecordingBank {
        minted: Vec<chain_core::Coin>,
    }

    impl BankLedger for RecordingBank {
        fn mint_coins(&mut self, _module: &str, coin: &chain_core::Coin) -> anyhow::Result<()> {
            self.minted.push(coin.clone());
            Ok(())
        }

        fn send_coins_from_module_to_account(
            &mut self,
            _module: &str,
            _recipient: &str,
            _coin: &chain_core::Coin,
        ) -> anyhow::Result<()> {
            Ok(())
        }
    }

    struct FixedStakes(Vec<ActivatedStake>);

    impl StakeActivation for FixedStakes {
        fn all_activated_stake(&self) -> anyhow::Result<Vec<ActivatedStake>> {
            Ok(self.0.clone())
        }

        fn moa_compliance(&self, _validator: &str) -> anyhow::Result<f64> {
            Ok(1.0)
        }

        fn update_reward_stats(
            &mut self,
            _validator: &str,
            _reward_amount: u64,
            _block_height: u64,
            _moa_compliance: f64,
            _penalty_multiplier: f64,
            _base_reward: u64,
        ) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_begin_block_selects_creator() {
        let mut engine = engine_with_validator();
        let mut ctx = test_ctx(10);

        let creator = engine.begin_block(&mut ctx).unwrap();
        assert_eq!(creator.validator, "cosmos1validator");
        assert_eq!(creator.block_height, 11);

        let stored = engine.block_creator(11).unwrap().unwrap();
        assert_eq!(stored.validator, "cosmos1validator");
        assert!(ctx.events.find(EVENT_TYPE_BLOCK_CREATOR_SELECTED).is_some());

        let state = engine.consensus_state().unwrap();
        assert_eq!(state.current_height, 10);
        assert_eq!(state.active_validators, vec!["cosmos1validator".to_string()]);
    }

    #[test]
    fn test_begin_block_fails_without_validators() {
        let mut engine = PovbEngine::new(MemoryStore::new(), AUTHORITY);
        let result = engine.begin_block(&mut test_ctx(1));
        assert!(matches!(result, Err(ConsensusError::NoActiveValidators)));
    }

    #[test]
    fn test_end_block_distributes_and_halves() {
        let mut engine = engine_with_validator();
        engine.set_bank_ledger(Some(Box::new(RecordingBank::default())));
        engine.set_stake_activation(Some(Box::new(FixedStakes(vec![ActivatedStake {
            validator: "cosmos1validator".to_string(),
            amount: 1_000_000,
        }]))));

        let mut ctx = test_ctx(210_000);
        let rewards = engine.end_block(&mut ctx).unwrap();
        assert_eq!(rewards.len(), 1);
        assert_eq!(rewards[0].final_reward_amount, 25_000_000);

        let info = engine.halving_info().unwrap();
        assert_eq!(info.last_halving_height, 210_000);
        assert_eq!(info.next_halving_height, 420_000);
    }

    #[test]
    fn test_end_block_without_collaborators() {
        let mut engine = engine_with_validator();
        let rewards = engine.end_block(&mut test_ctx(5)).unwrap();
        assert!(rewards.is_empty());
    }

    #[test]
    fn test_authority_gating() {
        let mut engine = engine_with_validator();
        let ctx = test_ctx(1);

        assert!(matches!(
            engine.handle_update_consensus_state(&ctx, "cosmos1stranger", 1, "0", Vec::new()),
            Err(ConsensusError::Unauthorized)
        ));
        assert!(matches!(
            engine.handle_set_validator_weight("cosmos1stranger", "cosmos1validator", "1"),
            Err(ConsensusError::Unauthorized)
        ));
        assert!(matches!(
            engine.handle_process_halving(&ctx, "cosmos1stranger"),
            Err(ConsensusError::Unauthorized)
        ));
        assert!(matches!(
            engine.handle_select_block_producer(&ctx, "cosmos1stranger", &[]),
            Err(ConsensusError::Unauthorized)
        ));
        assert!(matches!(
            engine.handle_calculate_block_time("cosmos1stranger", "1000"),
            Err(ConsensusError::Unauthorized)
        ));
    }

    #[test]
    fn test_update_consensus_state_message() {
        let mut engine = engine_with_validator();
        let ctx = test_ctx(1);

        engine
            .handle_update_consensus_state(
                &ctx,
                AUTHORITY,
                1000,
                "1000000",
                vec!["cosmos1validator".to_string()],
            )
            .unwrap();

        let state = engine.consensus_state().unwrap();
        assert_eq!(state.current_height, 1000);
        assert_eq!(state.total_ant_burned, "1000000");
    }

    #[test]
    fn test_select_block_producer_message() {
        let mut engine = engine_with_validator();
        let ctx = test_ctx(3);

        let validators = vec![
            "cosmos1validator".to_string(),
            "cosmos1other".to_string(),
        ];
        let producer = engine
            .handle_select_block_producer(&ctx, AUTHORITY, &validators)
            .unwrap();
        assert!(validators.contains(&producer));

        // Deterministic for the same context
        let again = engine
            .handle_select_block_producer(&ctx, AUTHORITY, &validators)
            .unwrap();
        assert_eq!(producer, again);

        assert!(matches!(
            engine.handle_select_block_producer(&ctx, AUTHORITY, &[]),
            Err(ConsensusError::NoValidators)
        ));
    }

    #[test]
    fn test_commit_and_reveal_with_zero_height() {
        let mut engine = engine_with_validator();
        let mut ctx = test_ctx(42);
        let hash = hash_commit("nonce", "1000000");

        engine
            .handle_commit_bid(&mut ctx, "cosmos1validator", &hash, 0)
            .unwrap();
        let auction = engine.blind_auction(42).unwrap().unwrap();
        assert_eq!(auction.commits.len(), 1);

        engine.transition_auction_phase(42).unwrap();
        engine
            .handle_reveal_bid(&mut ctx, "cosmos1validator", "nonce", "1000000", 0)
            .unwrap();
        let auction = engine.blind_auction(42).unwrap().unwrap();
        assert_eq!(auction.reveals.len(), 1);
    }

    #[test]
    fn test_params_round_trip() {
        let mut engine = engine_with_validator();
        assert_eq!(engine.params().unwrap(), Params::default());

        let mut params = Params::default();
        params.base_block_time = Duration::from_secs(10);
        engine.set_params(&params).unwrap();
        assert_eq!(engine.params().unwrap(), params);
    }
}
