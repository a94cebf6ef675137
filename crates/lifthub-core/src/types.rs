//! Competition data types.
//!
//! Contains the full competition snapshot (athletes, groups, metadata) and
//! the per-platform update message pushed by the scoring engine.
//!
//! Both are replace-only: a snapshot supersedes the previous snapshot in
//! full, and an update supersedes the previous update for its platform in
//! full. No field-level patching exists anywhere in the hub.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a field of play (platform).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FopState {
    /// No session running on this platform.
    #[default]
    Inactive,
    /// A session is running and athletes are lifting.
    Active,
    /// A session is running but paused (introduction, changeover, jury...).
    Break,
}

impl std::fmt::Display for FopState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inactive => write!(f, "INACTIVE"),
            Self::Active => write!(f, "ACTIVE"),
            Self::Break => write!(f, "BREAK"),
        }
    }
}

/// Kind of break in progress, carried with `FopState::Break`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BreakKind {
    /// Before athlete introduction.
    BeforeIntroduction,
    /// During athlete introduction.
    Introduction,
    /// Before the first snatch attempt.
    FirstSnatch,
    /// Changeover between snatch and clean & jerk.
    FirstCj,
    /// Technical pause (loader, equipment).
    Technical,
    /// Jury deliberation.
    Jury,
    /// The session has finished.
    GroupDone,
}

/// State of a countdown timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimerState {
    /// Timer is counting down.
    Running,
    /// Timer is stopped but retains its value.
    Stopped,
    /// Timer has been set but never started.
    Set,
}

/// Athlete or break timer payload as sent by the scoring engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerPayload {
    /// Remaining time in milliseconds.
    pub milliseconds: i64,
    /// Timer state.
    pub state: TimerState,
}

/// Referee decision payload.
///
/// Individual decisions use `Some(true)` for a good lift (white) and
/// `Some(false)` for no-lift (red); `None` means not yet entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionPayload {
    #[serde(default)]
    pub d1: Option<bool>,
    #[serde(default)]
    pub d2: Option<bool>,
    #[serde(default)]
    pub d3: Option<bool>,
    /// Whether the decision lights may be shown to the public.
    #[serde(default)]
    pub decisions_visible: bool,
    /// Down signal (majority reached, bar may be lowered).
    #[serde(default)]
    pub down_signal: bool,
}

/// One athlete as carried in snapshots and updates.
///
/// The engine sends more fields than the hub cares about; unknown fields are
/// ignored and every field defaults so partial payloads still decode.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Athlete {
    pub full_name: String,
    pub team: String,
    pub category: String,
    pub start_number: u32,
    pub lot_number: u32,
    /// Next requested weight in kg, formatted by the engine.
    pub requested_weight: Option<String>,
    /// Attempt number (1-3 within the current lift).
    pub attempt_number: Option<u8>,
    /// Snatch + clean & jerk total, once established.
    pub total: Option<i32>,
    /// Whether this athlete is the one called to the bar.
    pub current: bool,
}

/// Session (group) descriptor within a snapshot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Group {
    pub name: String,
    pub description: Option<String>,
    pub platform: Option<String>,
    pub done: bool,
}

/// Competition-level metadata within a snapshot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompetitionInfo {
    pub name: String,
    pub federation: Option<String>,
    pub venue: Option<String>,
}

/// Full competition database, replaced wholesale on each resync.
///
/// Consumers must treat a snapshot reference as immutable once published;
/// the hub hands out `Arc<CompetitionSnapshot>` and never mutates one.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompetitionSnapshot {
    pub competition: CompetitionInfo,
    pub athletes: Vec<Athlete>,
    pub groups: Vec<Group>,
    /// When the hub received this snapshot.
    #[serde(skip)]
    pub received_at: Option<DateTime<Utc>>,
}

impl CompetitionSnapshot {
    /// Number of athletes in the database.
    pub fn athletes_count(&self) -> usize {
        self.athletes.len()
    }

    /// Whether the database carries any data at all.
    pub fn is_loaded(&self) -> bool {
        !self.athletes.is_empty()
    }
}

/// Per-platform live state, replaced wholesale on each update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FopUpdate {
    /// Platform (field of play) name.
    pub fop: String,
    /// Lifecycle state.
    #[serde(default)]
    pub fop_state: FopState,
    /// Current session name, if any.
    #[serde(default)]
    pub group: Option<String>,
    /// Human-readable session info line.
    #[serde(default)]
    pub group_info: Option<String>,
    /// Kind of break, when `fop_state` is `Break`.
    #[serde(default)]
    pub break_kind: Option<BreakKind>,
    /// Athlete clock.
    #[serde(default)]
    pub athlete_timer: Option<TimerPayload>,
    /// Break clock.
    #[serde(default)]
    pub break_timer: Option<TimerPayload>,
    /// Referee decision lights.
    #[serde(default)]
    pub decision: Option<DecisionPayload>,
    /// Athlete currently called to the bar.
    #[serde(default)]
    pub current_athlete: Option<Athlete>,
    /// Best athletes of the category so far.
    #[serde(default)]
    pub leaders: Vec<Athlete>,
    /// Remaining lifting order.
    #[serde(default)]
    pub start_order: Vec<Athlete>,
    /// Engine timestamp of this update, Unix milliseconds.
    #[serde(default)]
    pub last_update_ms: i64,
}

impl FopUpdate {
    /// Whether a session is attached to this platform.
    pub fn has_session(&self) -> bool {
        self.group.as_deref().is_some_and(|g| !g.is_empty())
    }

    /// The current athlete, from the dedicated field or the `current` flag
    /// in the start order.
    pub fn current(&self) -> Option<&Athlete> {
        self.current_athlete
            .as_ref()
            .or_else(|| self.start_order.iter().find(|a| a.current))
    }

    /// Age of this update relative to `now_ms`, in milliseconds.
    pub fn age_ms(&self, now_ms: i64) -> i64 {
        now_ms.saturating_sub(self.last_update_ms)
    }
}

/// Derived session status, computed on demand from a `FopUpdate`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    /// Whether the session has finished (or no session is running).
    pub done: bool,
    /// Completion or info message, when available.
    pub message: Option<String>,
}
