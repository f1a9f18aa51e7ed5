//! State types for tracking sync progress
//!
//! These types are serialized to JSON and persisted between runs.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Complete state for a connector
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct State {
    /// Per-stream state
    #[serde(default)]
    pub streams: HashMap<String, StreamState>,
}

impl State {
    /// Create a new empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the bookmark for a stream, epoch-milliseconds
    pub fn get_bookmark(&self, stream: &str) -> Option<i64> {
        self.streams.get(stream)?.bookmark
    }

    /// Set the bookmark for a stream unconditionally
    pub fn set_bookmark(&mut self, stream: &str, bookmark: i64) {
        self.streams.entry(stream.to_string()).or_default().bookmark = Some(bookmark);
    }

    /// Advance the bookmark for a stream; a candidate below the current
    /// bookmark is ignored so replication never moves backwards.
    pub fn advance_bookmark(&mut self, stream: &str, candidate: i64) {
        let entry = self.streams.entry(stream.to_string()).or_default();
        if entry.bookmark.is_none_or(|current| candidate > current) {
            entry.bookmark = Some(candidate);
        }
    }
}

/// State for a single stream
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamState {
    /// High-water mark of the replication key, epoch-milliseconds
    #[serde(default)]
    pub bookmark: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_default() {
        let state = State::new();
        assert!(state.streams.is_empty());
        assert!(state.get_bookmark("anything").is_none());
    }

    #[test]
    fn test_advance_bookmark_is_monotonic() {
        let mut state = State::new();

        state.advance_bookmark("audits_responses_list", 100);
        assert_eq!(state.get_bookmark("audits_responses_list"), Some(100));

        state.advance_bookmark("audits_responses_list", 50);
        assert_eq!(state.get_bookmark("audits_responses_list"), Some(100));

        state.advance_bookmark("audits_responses_list", 200);
        assert_eq!(state.get_bookmark("audits_responses_list"), Some(200));
    }

    #[test]
    fn test_state_serialization() {
        let mut state = State::new();
        state.set_bookmark("audits_responses_list", 1_700_000_000_000);

        let json = serde_json::to_string(&state).unwrap();
        let restored: State = serde_json::from_str(&json).unwrap();

        assert_eq!(
            restored.get_bookmark("audits_responses_list"),
            Some(1_700_000_000_000)
        );
    }
}
