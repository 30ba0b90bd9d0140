pub mod client;
pub mod error;
#[cfg(test)]
pub mod fake;
pub mod types;

pub use client::{Backend, HttpBackend};
pub use error::ApiError;
pub use types::{
    ConversationDetail, ConversationPage, ConversationSummary, Direction, FacetCounts, FacetItem,
    HANDOFF_ACTIVE_LABEL, Level, Message, RLHF_NOT_VALIDATED_LABEL, RLHF_VALIDATED_LABEL,
    SessionInfo, Stats, display_timestamp, informed, percent,
};
