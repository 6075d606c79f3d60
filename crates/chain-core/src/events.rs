// chain-core/src/events.rs

use serde::{Deserialize, Serialize};

// Event types emitted by the consensus modules
pub const EVENT_TYPE_BLOCK_CREATOR_SELECTED: &str = "block_creator_selected";
pub const EVENT_TYPE_BID_COMMITTED: &str = "bid_committed";
pub const EVENT_TYPE_BID_REVEALED: &str = "bid_revealed";
pub const EVENT_TYPE_REWARD_DISTRIBUTED: &str = "reward_distributed";

// Attribute keys
pub const ATTR_KEY_VALIDATOR: &str = "validator";
pub const ATTR_KEY_BLOCK_HEIGHT: &str = "block_height";
pub const ATTR_KEY_ACTIVITY_SCORE: &str = "activity_score";
pub const ATTR_KEY_COMMIT_HASH: &str = "commit_hash";
pub const ATTR_KEY_BID_AMOUNT: &str = "bid_amount";
pub const ATTR_KEY_REWARD_AMOUNT: &str = "reward_amount";
pub const ATTR_KEY_PENALTY_MULTIPLIER: &str = "penalty_multiplier";
pub const ATTR_KEY_BASE_REWARD: &str = "base_reward";

/// A single event attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventAttribute {
    pub key: String,
    pub value: String,
}

/// An observability event emitted during block processing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub kind: String,
    pub attributes: Vec<EventAttribute>,
}

impl Event {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            attributes: Vec::new(),
        }
    }

    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(EventAttribute {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    /// Look up an attribute value by key
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.key == key)
            .map(|a| a.value.as_str())
    }
}

/// Collects events emitted during one block's processing
#[derive(Debug, Default)]
pub struct EventManager {
    events: Vec<Event>,
}

impl EventManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Drain all collected events
    pub fn take(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// First event of the given kind, if any
    pub fn find(&self, kind: &str) -> Option<&Event> {
        self.events.iter().find(|e| e.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_and_find() {
        let mut manager = EventManager::new();
        manager.emit(
            Event::new(EVENT_TYPE_BID_COMMITTED)
                .attr(ATTR_KEY_VALIDATOR, "val1")
                .attr(ATTR_KEY_COMMIT_HASH, "abc"),
        );

        let event = manager.find(EVENT_TYPE_BID_COMMITTED).unwrap();
        assert_eq!(event.attribute(ATTR_KEY_VALIDATOR), Some("val1"));
        assert_eq!(event.attribute(ATTR_KEY_COMMIT_HASH), Some("abc"));
        assert!(manager.find(EVENT_TYPE_BID_REVEALED).is_none());
    }

    #[test]
    fn test_take_drains() {
        let mut manager = EventManager::new();
        manager.emit(Event::new(EVENT_TYPE_REWARD_DISTRIBUTED));

        let drained = manager.take();
        assert_eq!(drained.len(), 1);
        assert!(manager.events().is_empty());
    }
}
