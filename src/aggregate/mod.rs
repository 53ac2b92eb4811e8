//! Derived views over a session's entries
//!
//! Each session type maps to exactly one model:
//!
//! | Session type | Model                                  | Output          |
//! |--------------|----------------------------------------|-----------------|
//! | `WORD_CLOUD` | [`word_frequencies`]                   | [`WordCloud`]   |
//! | `Q_AND_A`    | [`rank`] for presenter and participant | [`QuestionBoard`] |
//!
//! Models hold no state of their own. The aggregate can always be rebuilt
//! from the entry store, which is what happens whenever a live session is
//! (re)opened.

pub mod questions;
pub mod wordcloud;

use serde::{Deserialize, Serialize};

use crate::model::{Entry, SessionType};

pub use questions::{rank, QuestionBoard, RankView};
pub use wordcloud::{tokenize, word_frequencies, StopWords, TermCount, WordCloud};

/// The current aggregate of one session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Aggregate {
    WordCloud(WordCloud),
    Questions(QuestionBoard),
}

impl Aggregate {
    pub fn as_word_cloud(&self) -> Option<&WordCloud> {
        match self {
            Aggregate::WordCloud(cloud) => Some(cloud),
            Aggregate::Questions(_) => None,
        }
    }

    pub fn as_questions(&self) -> Option<&QuestionBoard> {
        match self {
            Aggregate::Questions(board) => Some(board),
            Aggregate::WordCloud(_) => None,
        }
    }
}

/// Session-type dispatch to the right model
#[derive(Debug, Clone)]
pub enum AggregateModel {
    WordCloud { stop_words: StopWords },
    Questions,
}

impl AggregateModel {
    /// Pick the model for a session type
    pub fn for_session(session_type: SessionType, stop_words: &StopWords) -> Self {
        match session_type {
            SessionType::WordCloud => AggregateModel::WordCloud {
                stop_words: stop_words.clone(),
            },
            SessionType::QAndA => AggregateModel::Questions,
        }
    }

    /// Rebuild the aggregate from the complete entry set
    pub fn recompute(&self, entries: &[Entry]) -> Aggregate {
        match self {
            AggregateModel::WordCloud { stop_words } => {
                Aggregate::WordCloud(word_frequencies(entries, stop_words))
            }
            AggregateModel::Questions => Aggregate::Questions(QuestionBoard::from_entries(entries)),
        }
    }
}
