//! Streaming chat with the fitness coach.
//!
//! [`CoachClient::consume`] sends one turn and returns the reply as a
//! stream of text deltas decoded from the endpoint's Server-Sent
//! Events. [`CoachSession`] applies those deltas to a transcript and
//! decides what the user sees when a turn fails.
pub mod client;
pub mod error;
pub mod models;
pub mod offline;
pub mod ranking;
pub mod session;
pub mod sse;
pub mod stream;

pub use client::CoachClient;
pub use error::{CoachError, FALLBACK_REPLY};
pub use models::{
    CoachRequest, Intensity, Message, Role, Transcript, UserProfile, Workout, WorkoutType,
};
pub use ranking::{RANK_TIERS, RankTier};
pub use session::{Backend, CoachSession, TurnOutcome, apply_deltas};
pub use sse::{DONE_SENTINEL, SseDecoder};
pub use stream::{DeltaStream, assemble_deltas};
