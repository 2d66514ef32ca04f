//! Result Board
//!
//! Holds the sentiment records currently on display. A successful extraction
//! replaces the whole set and bumps the revision; a failed one leaves the set
//! and revision untouched, so the last good results stay visible (or the
//! board stays empty if nothing has succeeded yet).

use std::sync::Arc;

use tracing::{info, warn};

use crate::extractor::ExtractError;
use crate::sentiment::SentimentRecord;

/// The currently displayed result set
#[derive(Clone, Debug)]
pub struct ResultBoard {
    records: Arc<[SentimentRecord]>,
    revision: u64,
    last_failure: Option<String>,
}

impl Default for ResultBoard {
    fn default() -> Self {
        Self {
            records: Arc::from(Vec::new()),
            revision: 0,
            last_failure: None,
        }
    }
}

impl ResultBoard {
    /// Create an empty board
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records on display, in model order
    #[must_use]
    pub fn records(&self) -> &Arc<[SentimentRecord]> {
        &self.records
    }

    /// Number of successful replacements so far
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Description of the most recent failed extraction, cleared on success
    #[must_use]
    pub fn last_failure(&self) -> Option<&str> {
        self.last_failure.as_deref()
    }

    /// Apply an extraction outcome
    ///
    /// Returns true when the records were replaced.
    pub fn apply(&mut self, outcome: Result<Vec<SentimentRecord>, ExtractError>) -> bool {
        match outcome {
            Ok(records) => {
                info!(count = records.len(), "Sentiment results replaced");
                self.records = Arc::from(records);
                self.revision += 1;
                self.last_failure = None;
                true
            }
            Err(e) => {
                warn!(
                    error = %e,
                    kept = self.records.len(),
                    "Failed to extract sentiment records, keeping previous results"
                );
                self.last_failure = Some(e.to_string());
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::parse_records;
    use crate::sentiment::{Emotion, Polarity};

    fn record(reasoning: &str) -> SentimentRecord {
        SentimentRecord::new(Polarity::Positive, Emotion::Joy, 0.9, reasoning).unwrap()
    }

    #[test]
    fn test_failure_on_first_attempt_leaves_board_empty() {
        let mut board = ResultBoard::new();
        assert!(!board.apply(parse_records("not json")));

        assert!(board.records().is_empty());
        assert_eq!(board.revision(), 0);
        assert!(board.last_failure().is_some());
    }

    #[test]
    fn test_failure_keeps_previous_results() {
        let mut board = ResultBoard::new();
        assert!(board.apply(Ok(vec![record("kept")])));
        let before = Arc::clone(board.records());

        assert!(!board.apply(parse_records("[{\"polarity\":\"Positive\",}]")));

        assert!(Arc::ptr_eq(board.records(), &before));
        assert_eq!(board.records()[0].reasoning(), "kept");
        assert_eq!(board.revision(), 1);
    }

    #[test]
    fn test_success_replaces_wholesale() {
        let mut board = ResultBoard::new();
        board.apply(Ok(vec![record("a"), record("b")]));
        board.apply(Ok(vec![record("c")]));

        assert_eq!(board.records().len(), 1);
        assert_eq!(board.records()[0].reasoning(), "c");
        assert_eq!(board.revision(), 2);
        assert_eq!(board.last_failure(), None);
    }
}
