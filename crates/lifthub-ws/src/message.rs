//! Engine message types.
//!
//! The scoring engine tags every frame with a `type` field and carries the
//! payload under `data`. Anything that does not match a known tag is a
//! decode error at the connection boundary and never reaches the state
//! store.

use crate::error::WsResult;
use lifthub_core::{CompetitionSnapshot, FopUpdate};
use serde::Deserialize;

/// Bootstrap frame sent right after connecting, before accepting
/// incremental updates.
pub const REQUEST_SNAPSHOT_FRAME: &str = r#"{"type":"requestSnapshot"}"#;

/// Inbound frame from the scoring engine.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum EngineMessage {
    /// Full competition database push.
    Snapshot(CompetitionSnapshot),
    /// Per-platform incremental update.
    Update(FopUpdate),
    /// Configuration bundle push.
    Config(serde_json::Value),
}

impl EngineMessage {
    /// Message kind label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Snapshot(_) => "snapshot",
            Self::Update(_) => "update",
            Self::Config(_) => "config",
        }
    }
}

/// Decode one text frame into an engine message.
///
/// Decoding happens into a local value; callers only commit a successfully
/// decoded message, so a malformed frame can never corrupt committed state.
pub fn decode_frame(text: &str) -> WsResult<EngineMessage> {
    Ok(serde_json::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lifthub_core::FopState;

    #[test]
    fn test_decode_snapshot_frame() {
        let frame = r#"{
            "type": "snapshot",
            "data": {
                "competition": {"name": "Nationals"},
                "athletes": [{"fullName": "DOE John"}],
                "groups": [{"name": "M1"}]
            }
        }"#;

        let msg = decode_frame(frame).unwrap();
        match msg {
            EngineMessage::Snapshot(snapshot) => {
                assert_eq!(snapshot.competition.name, "Nationals");
                assert_eq!(snapshot.athletes_count(), 1);
            }
            other => panic!("Expected snapshot, got {}", other.kind()),
        }
    }

    #[test]
    fn test_decode_update_frame() {
        let frame = r#"{
            "type": "update",
            "data": {"fop": "A", "fopState": "ACTIVE", "group": "M1"}
        }"#;

        let msg = decode_frame(frame).unwrap();
        match msg {
            EngineMessage::Update(update) => {
                assert_eq!(update.fop, "A");
                assert_eq!(update.fop_state, FopState::Active);
            }
            other => panic!("Expected update, got {}", other.kind()),
        }
    }

    #[test]
    fn test_decode_config_frame() {
        let frame = r#"{"type": "config", "data": {"translations": {"en": {}}}}"#;

        let msg = decode_frame(frame).unwrap();
        assert_eq!(msg.kind(), "config");
    }

    #[test]
    fn test_unknown_tag_is_rejected() {
        let frame = r#"{"type": "surprise", "data": {}}"#;
        assert!(decode_frame(frame).is_err());
    }

    #[test]
    fn test_malformed_json_is_rejected() {
        assert!(decode_frame("{not json").is_err());
        assert!(decode_frame(r#"{"data": {}}"#).is_err());
    }
}
