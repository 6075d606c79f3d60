// chain-core/src/keys.rs

//! Store key layout.
//!
//! One flat byte-keyed namespace; every entity gets its own prefix.
//! Height-indexed entries use big-endian encoding so lexicographic key
//! order matches numeric height order.

use crate::types::BlockHeight;

pub const VALIDATOR_PREFIX: &[u8] = b"Validator|";
pub const BLOCK_CREATOR_PREFIX: &[u8] = b"BlockCreator|";
pub const BURN_PROOF_PREFIX: &[u8] = b"BurnProof|";
pub const ACTIVITY_SCORE_PREFIX: &[u8] = b"ActivityScore|";
pub const VALIDATOR_WEIGHT_PREFIX: &[u8] = b"ValidatorWeight|";
pub const BLIND_AUCTION_PREFIX: &[u8] = b"BlindAuction|";
pub const BLOCK_TIME_PREFIX: &[u8] = b"BlockTime|";

pub const PARAMS_KEY: &[u8] = b"Params";
pub const HALVING_INFO_KEY: &[u8] = b"HalvingInfo";
pub const CONSENSUS_STATE_KEY: &[u8] = b"ConsensusState";

fn address_key(prefix: &[u8], address: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(prefix.len() + address.len());
    key.extend_from_slice(prefix);
    key.extend_from_slice(address.as_bytes());
    key
}

fn height_key(prefix: &[u8], height: BlockHeight) -> Vec<u8> {
    let mut key = Vec::with_capacity(prefix.len() + 8);
    key.extend_from_slice(prefix);
    key.extend_from_slice(&height.to_be_bytes());
    key
}

pub fn validator_key(address: &str) -> Vec<u8> {
    address_key(VALIDATOR_PREFIX, address)
}

pub fn block_creator_key(height: BlockHeight) -> Vec<u8> {
    height_key(BLOCK_CREATOR_PREFIX, height)
}

pub fn burn_proof_key(address: &str) -> Vec<u8> {
    address_key(BURN_PROOF_PREFIX, address)
}

pub fn activity_score_key(address: &str) -> Vec<u8> {
    address_key(ACTIVITY_SCORE_PREFIX, address)
}

pub fn validator_weight_key(address: &str) -> Vec<u8> {
    address_key(VALIDATOR_WEIGHT_PREFIX, address)
}

pub fn blind_auction_key(height: BlockHeight) -> Vec<u8> {
    height_key(BLIND_AUCTION_PREFIX, height)
}

pub fn block_time_key(height: BlockHeight) -> Vec<u8> {
    height_key(BLOCK_TIME_PREFIX, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_keys_embed_address() {
        assert_eq!(validator_key("val1"), b"Validator|val1".to_vec());
        assert_eq!(validator_weight_key("val1"), b"ValidatorWeight|val1".to_vec());
    }

    #[test]
    fn test_height_keys_order_numerically() {
        // Big-endian keys must sort in height order
        assert!(block_creator_key(2) < block_creator_key(10));
        assert!(blind_auction_key(255) < blind_auction_key(256));
        assert!(block_time_key(999) < block_time_key(1000));
    }
}
