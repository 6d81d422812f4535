//! Wire contract between the session and the websocket transport.
//!
//! Every frame is a JSON object tagged by `type` (kebab-case) with camelCase
//! fields, e.g. `{"type":"confirm-team","team":["alice","bob"]}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::game::GamePhase;
use super::role::{Alignment, Role};
use crate::error::ErrorKind;

/// A `y`/`n` answer: approve/reject for team votes, success/fail for quests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum YesNo {
    #[serde(rename = "y")]
    Yes,
    #[serde(rename = "n")]
    No,
}

impl YesNo {
    pub fn is_yes(self) -> bool {
        self == YesNo::Yes
    }
}

impl From<bool> for YesNo {
    fn from(value: bool) -> Self {
        if value {
            YesNo::Yes
        } else {
            YesNo::No
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    AddUser {
        name: String,
    },
    GetUsers,
    NewMessage {
        message: String,
    },
    Typing,
    StopTyping,
    RoleSelectionChanged {
        draft_index: usize,
        name: String,
        /// Empty string clears the entry.
        role: String,
    },
    AddRoleDraft,
    DeleteRoleDraft {
        #[serde(default)]
        draft_index: Option<usize>,
    },
    AssignRoles {
        #[serde(default)]
        selected_roles: Option<Vec<Role>>,
        #[serde(default)]
        players: Option<Vec<String>>,
    },
    ConfirmTeam {
        team: Vec<String>,
    },
    SubmitVote {
        vote: YesNo,
    },
    SubmitQuestVote {
        vote: YesNo,
    },
    SubmitAssassinGuess {
        guess: String,
    },
}

/// Phase tag attached to a waiting-status projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WaitingContext {
    Lobby,
    TeamProposal,
    TeamVote,
    QuestVote,
    Assassination,
    GameOver,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitingStatus {
    pub waiting_on: Option<Vec<String>>,
    pub context: WaitingContext,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    Login {
        num_users: usize,
    },
    UserJoined {
        name: String,
        num_users: usize,
    },
    UserLeft {
        name: String,
        num_users: usize,
    },
    UserList {
        users: Vec<String>,
        leader: Option<String>,
    },
    NewMessage {
        name: String,
        message: String,
        sent_at: DateTime<Utc>,
    },
    Typing {
        name: String,
    },
    StopTyping {
        name: String,
    },
    RoleDraftsUpdated {
        drafts: Vec<BTreeMap<String, String>>,
    },
    RoleAssigned {
        role: String,
        reveal: String,
    },
    PhaseChanged {
        from: GamePhase,
        to: GamePhase,
    },
    RequestTeamSelection {
        quest_index: u8,
        required_team_size: usize,
    },
    TeamSelected {
        leader: String,
        team: Vec<String>,
        vote_track: u8,
        quest_index: u8,
    },
    RequestVote {
        leader: String,
        team: Vec<String>,
        vote_track: u8,
        quest_index: u8,
    },
    VoteResult {
        approved: bool,
        approve_voters: Vec<String>,
        reject_voters: Vec<String>,
        approve_count: usize,
        reject_count: usize,
        vote_track: u8,
    },
    RequestQuestVote {
        quest_index: u8,
        team: Vec<String>,
    },
    QuestResult {
        quest_index: u8,
        success_count: usize,
        fail_count: usize,
        quest_succeeded: bool,
        successful_quests: usize,
        vote_track: u8,
    },
    AssassinPhaseStarted {
        assassin: String,
        requires_all: bool,
        target_count: usize,
    },
    RequestAssassinGuess {
        candidates: Vec<String>,
        remaining_targets: usize,
    },
    AssassinGuessPartial {
        guess: String,
        remaining_targets: usize,
    },
    GameOver {
        winner: Alignment,
        reason: String,
        roles: BTreeMap<String, String>,
    },
    WaitingStatus(WaitingStatus),
    Error {
        kind: ErrorKind,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    All,
    AllExcept(String),
    Player(String),
    Players(Vec<String>),
}

/// A message paired with who should receive it.
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub to: Recipient,
    pub message: ServerMessage,
}

impl Outbound {
    pub fn all(message: ServerMessage) -> Self {
        Self {
            to: Recipient::All,
            message,
        }
    }

    pub fn to(name: impl Into<String>, message: ServerMessage) -> Self {
        Self {
            to: Recipient::Player(name.into()),
            message,
        }
    }

    pub fn to_many(names: Vec<String>, message: ServerMessage) -> Self {
        Self {
            to: Recipient::Players(names),
            message,
        }
    }

    pub fn all_except(name: impl Into<String>, message: ServerMessage) -> Self {
        Self {
            to: Recipient::AllExcept(name.into()),
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tagged_commands() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"confirm-team","team":["a","b"]}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::ConfirmTeam {
                team: vec!["a".to_string(), "b".to_string()]
            }
        );

        let msg: ClientMessage = serde_json::from_str(r#"{"type":"submit-vote","vote":"n"}"#).unwrap();
        assert_eq!(msg, ClientMessage::SubmitVote { vote: YesNo::No });

        let msg: ClientMessage = serde_json::from_str(r#"{"type":"get-users"}"#).unwrap();
        assert_eq!(msg, ClientMessage::GetUsers);
    }

    #[test]
    fn assign_roles_fields_are_optional() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"assign-roles"}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::AssignRoles {
                selected_roles: None,
                players: None
            }
        );

        let msg: ClientMessage = serde_json::from_str(
            r#"{"type":"assign-roles","selectedRoles":["Merlin Pure","Minion"],"players":["a"]}"#,
        )
        .unwrap();
        assert_eq!(
            msg,
            ClientMessage::AssignRoles {
                selected_roles: Some(vec![Role::MerlinPure, Role::Minion]),
                players: Some(vec!["a".to_string()])
            }
        );
    }

    #[test]
    fn unknown_roles_fail_to_parse() {
        let parsed = serde_json::from_str::<ClientMessage>(
            r#"{"type":"assign-roles","selectedRoles":["Lancelot"]}"#,
        );
        assert!(parsed.is_err());
    }

    #[test]
    fn server_messages_use_camel_case_fields() {
        let value = serde_json::to_value(ServerMessage::RequestTeamSelection {
            quest_index: 2,
            required_team_size: 3,
        })
        .unwrap();
        assert_eq!(value["type"], "request-team-selection");
        assert_eq!(value["questIndex"], 2);
        assert_eq!(value["requiredTeamSize"], 3);

        let value = serde_json::to_value(ServerMessage::WaitingStatus(WaitingStatus {
            waiting_on: None,
            context: WaitingContext::Lobby,
        }))
        .unwrap();
        assert_eq!(value["type"], "waiting-status");
        assert!(value["waitingOn"].is_null());
        assert_eq!(value["context"], "lobby");
    }
}
