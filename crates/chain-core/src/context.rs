// chain-core/src/context.rs

use crate::events::EventManager;
use crate::types::{BlockHeight, Timestamp};
use chrono::{DateTime, Utc};

/// Execution context for one block.
///
/// Everything the modules are allowed to observe about "now" lives here:
/// the height, the block time agreed by consensus, and a seed derived from
/// the block header. Modules must never reach for the wall clock or
/// process-local entropy, so that every node computes identical results.
pub struct BlockContext {
    pub height: BlockHeight,
    pub block_time: DateTime<Utc>,
    /// Consensus-derived randomness seed (e.g. block header hash)
    pub seed: [u8; 32],
    pub events: EventManager,
}

impl BlockContext {
    pub fn new(height: BlockHeight, block_time: DateTime<Utc>, seed: [u8; 32]) -> Self {
        Self {
            height,
            block_time,
            seed,
            events: EventManager::new(),
        }
    }

    /// Block time as Unix epoch milliseconds
    pub fn timestamp(&self) -> Timestamp {
        self.block_time.timestamp_millis()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamp_millis() {
        let time = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let ctx = BlockContext::new(42, time, [0u8; 32]);
        assert_eq!(ctx.height, 42);
        assert_eq!(ctx.timestamp(), 1_700_000_000_000);
    }
}
