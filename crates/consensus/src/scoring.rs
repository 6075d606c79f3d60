// consensus/src/scoring.rs

use crate::validator::{active_validators, set_validator, Validator};
use crate::ConsensusResult;
use chain_core::keys;
use chain_core::store::{get_typed, set_typed, StateStore};
use chain_core::{BlockContext, Timestamp};
use serde::{Deserialize, Serialize};

/// Floor applied to every computed activity score
pub const MIN_ACTIVITY_SCORE: u64 = 100;

/// Snapshot of one scoring pass for a validator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityScore {
    pub validator: String,
    pub score: u64,
    pub ant_balance: u64,
    pub blocks_created: u64,
    pub transactions_processed: u64,
    pub last_update: Timestamp,
}

/// Derives activity scores from locked balance, block history and
/// transaction throughput.
///
/// `score = balance / 1000 + blocks * 10 + transactions / 100`, floored at
/// [`MIN_ACTIVITY_SCORE`] so every validator keeps a nonzero lottery
/// weight.
#[derive(Debug, Default)]
pub struct ActivityScorer;

impl ActivityScorer {
    pub fn score_of(validator: &Validator) -> u64 {
        let score = validator.ant_balance / 1000
            + validator.total_blocks_created * 10
            + validator.transactions_processed / 100;
        score.max(MIN_ACTIVITY_SCORE)
    }

    /// Rescore all active validators, persisting each score onto the
    /// validator record and its `ActivityScore` snapshot.
    ///
    /// Returns `(address, score)` pairs in ascending address order; an
    /// empty validator set yields an empty list.
    pub fn refresh<S: StateStore + ?Sized>(
        store: &mut S,
        ctx: &BlockContext,
    ) -> ConsensusResult<Vec<(String, u64)>> {
        let mut scores = Vec::new();
        for mut validator in active_validators(store)? {
            let score = Self::score_of(&validator);

            validator.activity_score = score.to_string();
            validator.last_active = ctx.timestamp();
            set_validator(store, &validator)?;

            let snapshot = ActivityScore {
                validator: validator.address.clone(),
                score,
                ant_balance: validator.ant_balance,
                blocks_created: validator.total_blocks_created,
                transactions_processed: validator.transactions_processed,
                last_update: ctx.timestamp(),
            };
            set_typed(store, &keys::activity_score_key(&validator.address), &snapshot)?;

            scores.push((validator.address, score));
        }
        Ok(scores)
    }

    pub fn activity_score<S: StateStore + ?Sized>(
        store: &S,
        validator: &str,
    ) -> ConsensusResult<Option<ActivityScore>> {
        Ok(get_typed(store, &keys::activity_score_key(validator))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::get_validator;
    use chain_core::MemoryStore;
    use chrono::{TimeZone, Utc};

    fn test_ctx(height: u64) -> BlockContext {
        let time = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        BlockContext::new(height, time, [0u8; 32])
    }

    #[test]
    fn test_score_formula() {
        let mut validator = Validator::new("cosmos1validator", 500_000);
        validator.total_blocks_created = 12;
        validator.transactions_processed = 950;

        // 500_000/1000 + 12*10 + 950/100 = 500 + 120 + 9
        assert_eq!(ActivityScorer::score_of(&validator), 629);
    }

    #[test]
    fn test_score_floor() {
        let validator = Validator::new("cosmos1validator", 0);
        assert_eq!(ActivityScorer::score_of(&validator), MIN_ACTIVITY_SCORE);

        let small = Validator::new("cosmos1validator", 50_000);
        assert_eq!(ActivityScorer::score_of(&small), MIN_ACTIVITY_SCORE);
    }

    #[test]
    fn test_refresh_persists_scores() {
        let mut store = MemoryStore::new();
        let mut validator = Validator::new("cosmos1validator", 2_000_000);
        validator.total_blocks_created = 5;
        set_validator(&mut store, &validator).unwrap();

        let ctx = test_ctx(10);
        let scores = ActivityScorer::refresh(&mut store, &ctx).unwrap();
        assert_eq!(scores, vec![("cosmos1validator".to_string(), 2050)]);

        let stored = get_validator(&store, "cosmos1validator").unwrap().unwrap();
        assert_eq!(stored.activity_score, "2050");
        assert_eq!(stored.last_active, ctx.timestamp());

        let snapshot = ActivityScorer::activity_score(&store, "cosmos1validator")
            .unwrap()
            .unwrap();
        assert_eq!(snapshot.score, 2050);
        assert_eq!(snapshot.ant_balance, 2_000_000);
        assert_eq!(snapshot.blocks_created, 5);
    }

    #[test]
    fn test_refresh_empty_set() {
        let mut store = MemoryStore::new();
        let scores = ActivityScorer::refresh(&mut store, &test_ctx(1)).unwrap();
        assert!(scores.is_empty());
    }

    #[test]
    fn test_refresh_orders_by_address() {
        let mut store = MemoryStore::new();
        set_validator(&mut store, &Validator::new("cosmos1bravo", 1_000_000)).unwrap();
        set_validator(&mut store, &Validator::new("cosmos1alpha", 3_000_000)).unwrap();

        let scores = ActivityScorer::refresh(&mut store, &test_ctx(1)).unwrap();
        assert_eq!(scores[0].0, "cosmos1alpha");
        assert_eq!(scores[1].0, "cosmos1bravo");
    }
}
