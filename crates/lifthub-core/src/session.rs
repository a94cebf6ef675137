//! Session/derivation helpers.
//!
//! Pure, side-effect-free functions over a `FopUpdate` producing display
//! oriented state: timer state, decision state, display mode, visibility
//! classification, and the current-attempt projection consumers branch on.
//!
//! Same update in, same derived value out. None of these functions read the
//! clock or touch the stores, so plugins can call them on every render.

use crate::types::{
    Athlete, BreakKind, DecisionPayload, FopState, FopUpdate, SessionStatus, TimerPayload,
    TimerState,
};
use serde::Serialize;

/// Derived timer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum DerivedTimer {
    /// No timer payload present.
    NotSet,
    /// Timer set but never started.
    Set { milliseconds: i64 },
    /// Timer counting down.
    Running { milliseconds: i64 },
    /// Timer stopped with time remaining.
    Stopped { milliseconds: i64 },
}

impl DerivedTimer {
    fn from_payload(payload: Option<&TimerPayload>) -> Self {
        match payload {
            None => Self::NotSet,
            Some(t) => match t.state {
                TimerState::Set => Self::Set {
                    milliseconds: t.milliseconds,
                },
                TimerState::Running => Self::Running {
                    milliseconds: t.milliseconds,
                },
                TimerState::Stopped => Self::Stopped {
                    milliseconds: t.milliseconds,
                },
            },
        }
    }
}

/// Derived referee decision state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DecisionState {
    /// No decision in flight. A missing payload signals "none", never an error.
    None,
    /// Down signal given, lights not yet public.
    DownSignal,
    /// Decision lights shown to the public.
    Visible { white: u8, red: u8 },
}

/// What a scoreboard should render for this platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DisplayMode {
    /// Normal lifting display.
    Lifting,
    /// Break display (countdown, introduction, jury...).
    Break,
    /// Nothing running on this platform.
    Inactive,
}

/// Visibility classification for "waiting" vs "active" rendering.
///
/// Downstream plugins branch on the serialized string of this value, so the
/// three strings are part of the hub's contract and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Visibility {
    #[serde(rename = "show")]
    Show,
    #[serde(rename = "hide-because-null-session")]
    HideNullSession,
    #[serde(rename = "waiting")]
    Waiting,
}

impl Visibility {
    /// Contract string seen by plugins.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Show => "show",
            Self::HideNullSession => "hide-because-null-session",
            Self::Waiting => "waiting",
        }
    }
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derive the athlete timer state.
pub fn timer_state(update: &FopUpdate) -> DerivedTimer {
    DerivedTimer::from_payload(update.athlete_timer.as_ref())
}

/// Derive the break timer state.
pub fn break_timer_state(update: &FopUpdate) -> DerivedTimer {
    DerivedTimer::from_payload(update.break_timer.as_ref())
}

/// Derive the decision state.
pub fn decision_state(update: &FopUpdate) -> DecisionState {
    match update.decision {
        None => DecisionState::None,
        Some(DecisionPayload {
            decisions_visible: true,
            d1,
            d2,
            d3,
            ..
        }) => {
            let white = [d1, d2, d3].iter().filter(|d| **d == Some(true)).count() as u8;
            let red = [d1, d2, d3].iter().filter(|d| **d == Some(false)).count() as u8;
            DecisionState::Visible { white, red }
        }
        Some(DecisionPayload {
            down_signal: true, ..
        }) => DecisionState::DownSignal,
        Some(_) => DecisionState::None,
    }
}

/// Derive the display mode.
pub fn display_mode(update: &FopUpdate) -> DisplayMode {
    match update.fop_state {
        FopState::Inactive => DisplayMode::Inactive,
        FopState::Break => DisplayMode::Break,
        FopState::Active => DisplayMode::Lifting,
    }
}

/// Visibility decision table over
/// {session present, fop state, break in progress, current athlete present}.
///
/// | update | session | state    | current athlete | result                    |
/// |--------|---------|----------|-----------------|---------------------------|
/// | none   | -       | -        | -               | waiting                   |
/// | some   | none    | any      | any             | hide-because-null-session |
/// | some   | some    | inactive | any             | waiting                   |
/// | some   | some    | break    | any             | show                      |
/// | some   | some    | active   | none            | waiting                   |
/// | some   | some    | active   | some            | show                      |
pub fn visibility(update: Option<&FopUpdate>) -> Visibility {
    let Some(update) = update else {
        return Visibility::Waiting;
    };

    if !update.has_session() {
        return Visibility::HideNullSession;
    }

    match update.fop_state {
        FopState::Inactive => Visibility::Waiting,
        FopState::Break => Visibility::Show,
        FopState::Active => {
            if update.current().is_some() {
                Visibility::Show
            } else {
                Visibility::Waiting
            }
        }
    }
}

/// Derive the session status (done-flag plus completion message).
pub fn session_status(update: Option<&FopUpdate>) -> SessionStatus {
    let Some(update) = update else {
        return SessionStatus::default();
    };

    let done = update.fop_state == FopState::Inactive
        || update.break_kind == Some(BreakKind::GroupDone);

    SessionStatus {
        done,
        message: update.group_info.clone(),
    }
}

/// Status string of the current-attempt projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AttemptStatus {
    Ready,
    Waiting,
}

/// Current-attempt card fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentAttempt {
    pub full_name: String,
    pub team: String,
    pub category: String,
    pub start_number: u32,
    pub attempt_number: Option<u8>,
    pub requested_weight: Option<String>,
}

impl From<&Athlete> for CurrentAttempt {
    fn from(a: &Athlete) -> Self {
        Self {
            full_name: a.full_name.clone(),
            team: a.team.clone(),
            category: a.category.clone(),
            start_number: a.start_number,
            attempt_number: a.attempt_number,
            requested_weight: a.requested_weight.clone(),
        }
    }
}

/// Consumer-facing projection of the current attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreboardData {
    pub status: AttemptStatus,
    pub current_attempt: Option<CurrentAttempt>,
}

/// Build the current-attempt projection.
///
/// `ready` with populated fields when a current athlete is visible, `waiting`
/// with a null attempt otherwise. Never fails, even with no data at all.
pub fn current_attempt(update: Option<&FopUpdate>) -> ScoreboardData {
    if visibility(update) == Visibility::Show {
        if let Some(athlete) = update.and_then(|u| u.current()) {
            return ScoreboardData {
                status: AttemptStatus::Ready,
                current_attempt: Some(CurrentAttempt::from(athlete)),
            };
        }
    }

    ScoreboardData {
        status: AttemptStatus::Waiting,
        current_attempt: None,
    }
}
