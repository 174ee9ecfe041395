//! Core data models for bibliographic records and resolution verdicts.

mod record;
mod search;
mod verdict;

pub use record::{
    CandidateRecord, RecordBuilder, RetractionNotice, SourceType, UpdateNotice, UpdateRelation,
};
pub use search::SearchQuery;
pub use verdict::{DebugCandidate, MatchMethod, MatchOutcome, MatchVerdict, MissReason};
