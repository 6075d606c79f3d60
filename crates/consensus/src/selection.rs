// consensus/src/selection.rs

use crate::validator::{get_burn_proof, get_validator, set_block_creator, BlockCreator};
use crate::{ConsensusError, ConsensusResult};
use chain_core::events::{
    ATTR_KEY_ACTIVITY_SCORE, ATTR_KEY_BLOCK_HEIGHT, ATTR_KEY_VALIDATOR,
    EVENT_TYPE_BLOCK_CREATOR_SELECTED,
};
use chain_core::store::StateStore;
use chain_core::{BlockContext, BlockHeight, Event};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};

/// Weighted-random block-creator selection.
///
/// The draw is seeded from the consensus-derived block seed and the
/// height, so every validating node reproduces the same choice. Candidates
/// must be supplied in ascending address order; the roulette walk breaks
/// ties toward the first candidate reaching the cumulative threshold.
#[derive(Debug, Default)]
pub struct SelectionLottery;

impl SelectionLottery {
    /// Deterministic RNG for one height's draw
    fn draw_rng(seed: &[u8; 32], height: BlockHeight) -> StdRng {
        let mut hasher = Sha256::new();
        hasher.update(seed);
        hasher.update(height.to_be_bytes());
        let digest = hasher.finalize();

        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        StdRng::seed_from_u64(u64::from_be_bytes(bytes))
    }

    /// Pick one candidate by score weight.
    ///
    /// A zero total weight falls back to a uniform draw over the same
    /// seeded RNG, so the fallback is just as reproducible.
    pub fn select(ctx: &BlockContext, candidates: &[(String, u64)]) -> ConsensusResult<String> {
        if candidates.is_empty() {
            return Err(ConsensusError::NoActiveValidators);
        }

        let mut rng = Self::draw_rng(&ctx.seed, ctx.height);
        let total_weight: u64 = candidates.iter().map(|(_, score)| score).sum();

        if total_weight == 0 {
            let index = rng.gen_range(0..candidates.len());
            return Ok(candidates[index].0.clone());
        }

        let mut selection = rng.gen_range(0..total_weight);
        for (address, score) in candidates {
            if selection < *score {
                return Ok(address.clone());
            }
            selection -= score;
        }

        // Unreachable: selection < total_weight
        Ok(candidates[0].0.clone())
    }

    /// Run the lottery and persist the outcome as the [`BlockCreator`]
    /// record for the next height, snapshotting the winner's balance,
    /// score and burn amount. Emits `block_creator_selected`.
    pub fn select_and_record<S: StateStore + ?Sized>(
        store: &mut S,
        ctx: &mut BlockContext,
        candidates: &[(String, u64)],
    ) -> ConsensusResult<BlockCreator> {
        let selected = Self::select(ctx, candidates)?;
        let score = candidates
            .iter()
            .find(|(address, _)| *address == selected)
            .map(|(_, score)| *score)
            .unwrap_or_default();

        let validator = get_validator(store, &selected)?
            .ok_or_else(|| ConsensusError::ValidatorNotFound(selected.clone()))?;
        let burn_amount = get_burn_proof(store, &selected)?
            .map(|proof| proof.amount)
            .unwrap_or_else(|| "0".to_string());

        let creator = BlockCreator {
            validator: selected,
            ant_balance: validator.ant_balance,
            activity_score: score,
            burn_amount,
            block_height: ctx.height + 1,
            selected_at: ctx.timestamp(),
        };
        set_block_creator(store, &creator)?;

        ctx.events.emit(
            Event::new(EVENT_TYPE_BLOCK_CREATOR_SELECTED)
                .attr(ATTR_KEY_VALIDATOR, creator.validator.clone())
                .attr(ATTR_KEY_BLOCK_HEIGHT, creator.block_height.to_string())
                .attr(ATTR_KEY_ACTIVITY_SCORE, creator.activity_score.to_string()),
        );
        tracing::debug!(
            validator = %creator.validator,
            height = creator.block_height,
            score = creator.activity_score,
            "block creator selected"
        );

        Ok(creator)
    }
}
