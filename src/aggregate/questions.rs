//! Question-ranking model for Q&A sessions
//!
//! Ranking is always derived from the entry set and never written back to an
//! entry. Both orders use a stable sort, so questions with equal votes keep
//! their submission order.

use std::cmp::Reverse;

use serde::{Deserialize, Serialize};

use crate::model::Entry;

/// Which audience the ranking is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankView {
    /// Unanswered questions first, then by votes
    Presenter,
    /// By votes only, answered and unanswered interleaved
    Participant,
}

/// Both rankings of a Q&A session's questions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionBoard {
    pub presenter: Vec<Entry>,
    pub participant: Vec<Entry>,
}

impl QuestionBoard {
    /// Rank the complete entry set for both views
    pub fn from_entries(entries: &[Entry]) -> Self {
        Self {
            presenter: rank(entries, RankView::Presenter),
            participant: rank(entries, RankView::Participant),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.participant.is_empty()
    }

    /// Questions still waiting for an answer
    pub fn pending(&self) -> usize {
        self.presenter.iter().filter(|e| !e.is_answered()).count()
    }
}

/// Order entries for the given view
pub fn rank(entries: &[Entry], view: RankView) -> Vec<Entry> {
    let mut ranked = entries.to_vec();
    match view {
        RankView::Presenter => {
            ranked.sort_by_key(|e| (e.is_answered(), Reverse(e.upvotes)));
        }
        RankView::Participant => {
            ranked.sort_by_key(|e| Reverse(e.upvotes));
        }
    }
    ranked
}
