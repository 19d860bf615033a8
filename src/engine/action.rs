//! Action protocol: one typed record per player move, tagged by `BaseGameAction`.
//!
//! Records arrive as JSON objects carrying a `kind` tag and camelCase fields.
//! The tag is resolved through a fixed table; nothing here inspects type names.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::engine::error::ProtocolError;
use crate::engine::models::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BaseGameAction {
    PlayAssistantCard,
    MoveStudentFromEntranceToIsland,
    MoveStudentFromEntranceToDining,
    MoveMotherNature,
    SelectCloudTile,
    PlayCharacterCard,
    CharacterCardAction,
    EndTurn,
}

const ACTION_TAGS: [(&str, BaseGameAction); 8] = [
    ("PLAY_ASSISTANT_CARD", BaseGameAction::PlayAssistantCard),
    (
        "MOVE_STUDENT_FROM_ENTRANCE_TO_ISLAND",
        BaseGameAction::MoveStudentFromEntranceToIsland,
    ),
    (
        "MOVE_STUDENT_FROM_ENTRANCE_TO_DINING",
        BaseGameAction::MoveStudentFromEntranceToDining,
    ),
    ("MOVE_MOTHER_NATURE", BaseGameAction::MoveMotherNature),
    ("SELECT_CLOUD_TILE", BaseGameAction::SelectCloudTile),
    ("PLAY_CHARACTER_CARD", BaseGameAction::PlayCharacterCard),
    ("CHARACTER_CARD_ACTION", BaseGameAction::CharacterCardAction),
    ("END_TURN", BaseGameAction::EndTurn),
];

static TAG_LOOKUP: Lazy<HashMap<&'static str, BaseGameAction>> =
    Lazy::new(|| ACTION_TAGS.iter().copied().collect());

impl BaseGameAction {
    pub const ALL: [BaseGameAction; 8] = [
        BaseGameAction::PlayAssistantCard,
        BaseGameAction::MoveStudentFromEntranceToIsland,
        BaseGameAction::MoveStudentFromEntranceToDining,
        BaseGameAction::MoveMotherNature,
        BaseGameAction::SelectCloudTile,
        BaseGameAction::PlayCharacterCard,
        BaseGameAction::CharacterCardAction,
        BaseGameAction::EndTurn,
    ];

    pub fn from_tag(tag: &str) -> Option<BaseGameAction> {
        TAG_LOOKUP.get(tag).copied()
    }

    pub fn tag(self) -> &'static str {
        ACTION_TAGS[self as usize].0
    }

    /// Side actions a player may interleave at any point of their own turn.
    pub fn is_character_card(self) -> bool {
        matches!(
            self,
            BaseGameAction::PlayCharacterCard | BaseGameAction::CharacterCardAction
        )
    }

    pub fn is_student_move(self) -> bool {
        matches!(
            self,
            BaseGameAction::MoveStudentFromEntranceToIsland
                | BaseGameAction::MoveStudentFromEntranceToDining
        )
    }
}

impl fmt::Display for BaseGameAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Effect step requested on the currently active character card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CharacterCardStep {
    PlaceNoEntryTile,
    ExcludeColor,
}

/// A decoded player move. Selections are optional because a client may send
/// a move before choosing; the rule engine reports the missing selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE", rename_all_fields = "camelCase")]
pub enum ActionRecord {
    PlayAssistantCard {
        #[serde(default)]
        selected_card: Option<usize>,
    },
    MoveStudentFromEntranceToIsland {
        #[serde(default)]
        selected_colors: Vec<Color>,
        #[serde(default)]
        selected_island: Option<usize>,
    },
    MoveStudentFromEntranceToDining {
        #[serde(default)]
        selected_color: Option<Color>,
    },
    MoveMotherNature {
        #[serde(default)]
        selected_island: Option<usize>,
    },
    SelectCloudTile {
        #[serde(default)]
        selected_cloud_tile: Option<usize>,
    },
    PlayCharacterCard {
        #[serde(default)]
        selected_character_card: Option<usize>,
    },
    CharacterCardAction {
        character_card_action: CharacterCardStep,
        #[serde(default)]
        selected_island: Option<usize>,
        #[serde(default)]
        selected_colors: Vec<Color>,
    },
    EndTurn,
}

impl ActionRecord {
    pub fn kind(&self) -> BaseGameAction {
        match self {
            ActionRecord::PlayAssistantCard { .. } => BaseGameAction::PlayAssistantCard,
            ActionRecord::MoveStudentFromEntranceToIsland { .. } => {
                BaseGameAction::MoveStudentFromEntranceToIsland
            }
            ActionRecord::MoveStudentFromEntranceToDining { .. } => {
                BaseGameAction::MoveStudentFromEntranceToDining
            }
            ActionRecord::MoveMotherNature { .. } => BaseGameAction::MoveMotherNature,
            ActionRecord::SelectCloudTile { .. } => BaseGameAction::SelectCloudTile,
            ActionRecord::PlayCharacterCard { .. } => BaseGameAction::PlayCharacterCard,
            ActionRecord::CharacterCardAction { .. } => BaseGameAction::CharacterCardAction,
            ActionRecord::EndTurn => BaseGameAction::EndTurn,
        }
    }

    pub fn play_assistant_card(card: usize) -> Self {
        ActionRecord::PlayAssistantCard {
            selected_card: Some(card),
        }
    }

    pub fn move_to_island(color: Color, island: usize) -> Self {
        ActionRecord::MoveStudentFromEntranceToIsland {
            selected_colors: vec![color],
            selected_island: Some(island),
        }
    }

    pub fn move_to_dining(color: Color) -> Self {
        ActionRecord::MoveStudentFromEntranceToDining {
            selected_color: Some(color),
        }
    }

    pub fn move_mother_nature(island: usize) -> Self {
        ActionRecord::MoveMotherNature {
            selected_island: Some(island),
        }
    }

    pub fn select_cloud_tile(cloud: usize) -> Self {
        ActionRecord::SelectCloudTile {
            selected_cloud_tile: Some(cloud),
        }
    }

    pub fn play_character_card(card: usize) -> Self {
        ActionRecord::PlayCharacterCard {
            selected_character_card: Some(card),
        }
    }

    /// Decode an inbound JSON message. The `kind` tag must be one of the
    /// fixed action tags; the payload is then parsed for that variant.
    pub fn decode(message: &serde_json::Value) -> Result<Self, ProtocolError> {
        let tag = message
            .get("kind")
            .and_then(|v| v.as_str())
            .ok_or(ProtocolError::MissingKind)?;
        if BaseGameAction::from_tag(tag).is_none() {
            return Err(ProtocolError::UnknownKind(tag.to_string()));
        }
        serde_json::from_value(message.clone())
            .map_err(|e| ProtocolError::InvalidPayload(e.to_string()))
    }

    pub fn encode(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_table_round_trips_every_kind() {
        for kind in BaseGameAction::ALL {
            assert_eq!(BaseGameAction::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(BaseGameAction::from_tag("PLAY_ASSISTANT"), None);
    }

    #[test]
    fn test_decode_camel_case_payload() {
        let msg = serde_json::json!({
            "kind": "MOVE_STUDENT_FROM_ENTRANCE_TO_ISLAND",
            "selectedColors": ["RED"],
            "selectedIsland": 4,
        });
        let record = ActionRecord::decode(&msg).unwrap();
        assert_eq!(record, ActionRecord::move_to_island(Color::Red, 4));
        assert_eq!(record.kind(), BaseGameAction::MoveStudentFromEntranceToIsland);
    }

    #[test]
    fn test_decode_missing_selection_is_not_a_protocol_error() {
        let msg = serde_json::json!({"kind": "MOVE_MOTHER_NATURE"});
        let record = ActionRecord::decode(&msg).unwrap();
        assert_eq!(
            record,
            ActionRecord::MoveMotherNature {
                selected_island: None
            }
        );
    }

    #[test]
    fn test_decode_rejects_unknown_kind() {
        let msg = serde_json::json!({"kind": "STEAL_PROFESSOR"});
        assert_eq!(
            ActionRecord::decode(&msg),
            Err(ProtocolError::UnknownKind("STEAL_PROFESSOR".into()))
        );
        assert_eq!(
            ActionRecord::decode(&serde_json::json!({})),
            Err(ProtocolError::MissingKind)
        );
    }

    #[test]
    fn test_encode_uses_wire_tag() {
        let encoded = ActionRecord::EndTurn.encode();
        assert_eq!(encoded["kind"], "END_TURN");
        let encoded = ActionRecord::select_cloud_tile(1).encode();
        assert_eq!(encoded["selectedCloudTile"], 1);
    }

    #[test]
    fn test_character_card_kinds() {
        assert!(BaseGameAction::PlayCharacterCard.is_character_card());
        assert!(BaseGameAction::CharacterCardAction.is_character_card());
        assert!(!BaseGameAction::EndTurn.is_character_card());
    }
}
