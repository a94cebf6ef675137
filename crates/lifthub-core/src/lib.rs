//! Core domain types for the lifthub competition hub.
//!
//! This crate provides the fundamental types shared across the hub:
//! - `CompetitionSnapshot`: full competition database, replaced wholesale
//! - `FopUpdate`: per-platform live state (timer, decision, athlete lists)
//! - Session/derivation helpers: pure functions mapping raw update state to
//!   display-oriented state (timer, decision, visibility)

pub mod error;
pub mod session;
pub mod types;

pub use error::{CoreError, Result};
pub use session::{
    break_timer_state, current_attempt, decision_state, display_mode, session_status, timer_state,
    visibility, AttemptStatus, CurrentAttempt, DecisionState, DerivedTimer, DisplayMode,
    ScoreboardData, Visibility,
};
pub use types::{
    Athlete, BreakKind, CompetitionInfo, CompetitionSnapshot, DecisionPayload, FopState, FopUpdate,
    Group, SessionStatus, TimerPayload, TimerState,
};
