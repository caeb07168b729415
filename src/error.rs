//! Error types for segment parsing and project loading.

use thiserror::Error;

/// Why a single input record was rejected by the segment parser.
///
/// A rejected record produces no partial output; the caller decides whether
/// the rest of the track is still worth drawing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SegmentError {
    #[error("note arrays differ in length (note_seq: {note_seq}, note_dur: {note_dur}, note_slur: {note_slur})")]
    NoteCountMismatch {
        note_seq: usize,
        note_dur: usize,
        note_slur: usize,
    },
    #[error("{text} lyric tokens but {ph_num} phoneme groups")]
    LyricCountMismatch { text: usize, ph_num: usize },
    #[error("phoneme groups sum to {ph_num_sum} but ph_seq has {ph_seq} tokens and ph_dur has {ph_dur} values")]
    PhonemeCountMismatch {
        ph_num_sum: usize,
        ph_seq: usize,
        ph_dur: usize,
    },
    #[error("{non_slur} non-slur notes but {ph_num} phoneme groups")]
    SlurGroupMismatch { non_slur: usize, ph_num: usize },
    #[error("invalid value '{token}' in field {field}")]
    InvalidToken { field: &'static str, token: String },
}

impl SegmentError {
    pub(crate) fn invalid_token(field: &'static str, token: impl Into<String>) -> Self {
        Self::InvalidToken {
            field,
            token: token.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("I/O error while {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON error while {context}: {source}")]
    Json {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("segment {index} rejected: {source}")]
    Rejected {
        index: usize,
        #[source]
        source: SegmentError,
    },
}

impl ProjectError {
    pub(crate) fn io(context: &'static str, source: std::io::Error) -> Self {
        Self::Io { context, source }
    }

    pub(crate) fn json(context: &'static str, source: serde_json::Error) -> Self {
        Self::Json { context, source }
    }

    pub(crate) fn rejected(index: usize, source: SegmentError) -> Self {
        Self::Rejected { index, source }
    }
}
