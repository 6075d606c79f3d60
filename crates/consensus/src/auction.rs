// consensus/src/auction.rs

use crate::{ConsensusError, ConsensusResult};
use chain_core::events::{
    ATTR_KEY_BID_AMOUNT, ATTR_KEY_BLOCK_HEIGHT, ATTR_KEY_COMMIT_HASH, ATTR_KEY_VALIDATOR,
    EVENT_TYPE_BID_COMMITTED, EVENT_TYPE_BID_REVEALED,
};
use chain_core::keys;
use chain_core::store::{get_typed, set_typed, StateStore};
use chain_core::{BlockContext, BlockHeight, Event};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Length of a well-formed commit hash (SHA-256, lowercase hex)
const COMMIT_HASH_LEN: usize = 64;

/// Auction phase. Transitions are driven by height-based triggers outside
/// the engine, never by internal timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuctionPhase {
    Commit,
    Reveal,
}

/// A sealed bid: the hash commits to `(nonce, bid_amount)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedBid {
    pub validator: String,
    pub commit_hash: String,
    pub block_height: BlockHeight,
}

/// A disclosed bid, stored only after its commit hash verified
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidReveal {
    pub validator: String,
    pub bid_amount: String,
    pub nonce: String,
    pub block_height: BlockHeight,
}

/// One blind auction per block height
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlindAuction {
    pub block_height: BlockHeight,
    pub phase: AuctionPhase,
    pub commits: Vec<EncryptedBid>,
    pub reveals: Vec<BidReveal>,
}

impl BlindAuction {
    fn new(block_height: BlockHeight) -> Self {
        Self {
            block_height,
            phase: AuctionPhase::Commit,
            commits: Vec::new(),
            reveals: Vec::new(),
        }
    }

    pub fn commit_of(&self, validator: &str) -> Option<&EncryptedBid> {
        self.commits.iter().find(|c| c.validator == validator)
    }

    pub fn reveal_of(&self, validator: &str) -> Option<&BidReveal> {
        self.reveals.iter().find(|r| r.validator == validator)
    }
}

/// Trading-position view consulted during reveal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPosition {
    pub owner: String,
    pub ant_balance: u64,
}

/// External balance service. An absent position is treated as sufficient;
/// only a known balance below the bid rejects the reveal.
pub trait BalanceSource {
    fn user_position(&self, owner: &str) -> anyhow::Result<Option<UserPosition>>;
}

/// Commitment digest: `sha256(nonce ":" bid_amount)` as lowercase hex
pub fn hash_commit(nonce: &str, bid_amount: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(nonce.as_bytes());
    hasher.update(b":");
    hasher.update(bid_amount.as_bytes());
    hex::encode(hasher.finalize())
}

/// Check a stored commitment against disclosed values
pub fn verify_commit(commit_hash: &str, nonce: &str, bid_amount: &str) -> bool {
    hash_commit(nonce, bid_amount) == commit_hash
}

fn validate_commit_hash(commit_hash: &str) -> ConsensusResult<()> {
    let well_formed = commit_hash.len() == COMMIT_HASH_LEN
        && commit_hash
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
    if !well_formed {
        return Err(ConsensusError::InvalidCommitHash(commit_hash.to_string()));
    }
    Ok(())
}

/// Per-height commit-reveal state machine.
///
/// The commit phase hides bid amounts so no validator can react to
/// another's bid; correctness rests on exact hash comparison and on the
/// one-commit-one-reveal-per-validator invariants enforced here.
#[derive(Debug, Default)]
pub struct BlindAuctionEngine;

impl BlindAuctionEngine {
    pub fn get<S: StateStore + ?Sized>(
        store: &S,
        height: BlockHeight,
    ) -> ConsensusResult<Option<BlindAuction>> {
        Ok(get_typed(store, &keys::blind_auction_key(height))?)
    }

    pub fn set<S: StateStore + ?Sized>(
        store: &mut S,
        auction: &BlindAuction,
    ) -> ConsensusResult<()> {
        set_typed(store, &keys::blind_auction_key(auction.block_height), auction)?;
        Ok(())
    }

    /// Create the auction for `height`, or return the existing one
    pub fn create<S: StateStore + ?Sized>(
        store: &mut S,
        height: BlockHeight,
    ) -> ConsensusResult<BlindAuction> {
        if let Some(auction) = Self::get(store, height)? {
            return Ok(auction);
        }
        let auction = BlindAuction::new(height);
        Self::set(store, &auction)?;
        Ok(auction)
    }

    /// Move the auction at `height` into the reveal phase. Already-revealed
    /// auctions are left unchanged.
    pub fn transition_phase<S: StateStore + ?Sized>(
        store: &mut S,
        height: BlockHeight,
    ) -> ConsensusResult<BlindAuction> {
        let mut auction =
            Self::get(store, height)?.ok_or(ConsensusError::AuctionNotFound(height))?;
        if auction.phase == AuctionPhase::Commit {
            auction.phase = AuctionPhase::Reveal;
            Self::set(store, &auction)?;
        }
        Ok(auction)
    }

    /// Record a sealed bid, auto-creating the auction if needed
    pub fn commit<S: StateStore + ?Sized>(
        store: &mut S,
        ctx: &mut BlockContext,
        validator: &str,
        commit_hash: &str,
        height: BlockHeight,
    ) -> ConsensusResult<()> {
        if validator.is_empty() {
            return Err(ConsensusError::EmptyValidatorAddress);
        }
        validate_commit_hash(commit_hash)?;

        let mut auction = Self::create(store, height)?;
        if auction.commit_of(validator).is_some() {
            return Err(ConsensusError::AlreadyCommitted {
                validator: validator.to_string(),
                height,
            });
        }

        auction.commits.push(EncryptedBid {
            validator: validator.to_string(),
            commit_hash: commit_hash.to_string(),
            block_height: height,
        });
        Self::set(store, &auction)?;

        ctx.events.emit(
            Event::new(EVENT_TYPE_BID_COMMITTED)
                .attr(ATTR_KEY_VALIDATOR, validator)
                .attr(ATTR_KEY_COMMIT_HASH, commit_hash)
                .attr(ATTR_KEY_BLOCK_HEIGHT, height.to_string()),
        );
        Ok(())
    }

    /// Disclose a bid and verify it against the stored commitment
    pub fn reveal<S: StateStore + ?Sized>(
        store: &mut S,
        ctx: &mut BlockContext,
        balance_source: Option<&dyn BalanceSource>,
        validator: &str,
        nonce: &str,
        bid_amount: &str,
        height: BlockHeight,
    ) -> ConsensusResult<()> {
        if validator.is_empty() {
            return Err(ConsensusError::EmptyValidatorAddress);
        }
        if nonce.is_empty() {
            return Err(ConsensusError::EmptyNonce);
        }
        if bid_amount.is_empty() {
            return Err(ConsensusError::InvalidBidAmount(bid_amount.to_string()));
        }

        let mut auction =
            Self::get(store, height)?.ok_or(ConsensusError::AuctionNotFound(height))?;
        if auction.phase != AuctionPhase::Reveal {
            return Err(ConsensusError::AuctionNotInRevealPhase(height));
        }

        let commit = auction
            .commit_of(validator)
            .ok_or(ConsensusError::BidNotCommitted)?;
        if auction.reveal_of(validator).is_some() {
            return Err(ConsensusError::BidAlreadyRevealed);
        }
        if !verify_commit(&commit.commit_hash, nonce, bid_amount) {
            return Err(ConsensusError::CommitHashMismatch);
        }

        let bid: u64 = bid_amount
            .parse()
            .map_err(|_| ConsensusError::InvalidBidAmount(bid_amount.to_string()))?;
        if let Some(source) = balance_source {
            match source.user_position(validator) {
                Ok(Some(position)) if position.ant_balance < bid => {
                    return Err(ConsensusError::InsufficientBidBalance {
                        bid,
                        balance: position.ant_balance,
                    });
                }
                Ok(_) => {}
                Err(err) => {
                    // Unknown balance is treated as sufficient
                    tracing::warn!(validator, %err, "balance lookup failed during reveal");
                }
            }
        }

        auction.reveals.push(BidReveal {
            validator: validator.to_string(),
            bid_amount: bid_amount.to_string(),
            nonce: nonce.to_string(),
            block_height: height,
        });
        Self::set(store, &auction)?;

        ctx.events.emit(
            Event::new(EVENT_TYPE_BID_REVEALED)
                .attr(ATTR_KEY_VALIDATOR, validator)
                .attr(ATTR_KEY_BID_AMOUNT, bid_amount)
                .attr(ATTR_KEY_BLOCK_HEIGHT, height.to_string()),
        );
        Ok(())
    }

    /// Delete auctions older than `history_blocks` behind `current_height`
    pub fn prune<S: StateStore + ?Sized>(
        store: &mut S,
        current_height: BlockHeight,
        history_blocks: u64,
    ) -> ConsensusResult<usize> {
        let cutoff = current_height.saturating_sub(history_blocks);
        let mut stale = Vec::new();
        for (key, bytes) in store.prefix_scan(keys::BLIND_AUCTION_PREFIX)? {
            match bincode::deserialize::<BlindAuction>(&bytes) {
                Ok(auction) if auction.block_height < cutoff => stale.push(key),
                Ok(_) => break, // keys ascend with height
                Err(err) => {
                    tracing::warn!(?key, %err, "skipping malformed auction record");
                }
            }
        }
        for key in &stale {
            store.delete(key)?;
        }
        Ok(stale.len())
    }
}
