use serde::Serialize;
use thiserror::Error;

use crate::models::game::GamePhase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    /// Bad command shape or a command for another phase.
    Validation,
    /// Well-formed command that the rules forbid.
    PolicyViolation,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("malformed command: {0}")]
    Malformed(String),
    #[error("join the game with add-user first")]
    NotJoined,
    #[error("this connection has already joined")]
    AlreadyJoined,
    #[error("name must not be empty")]
    EmptyName,
    #[error("name {0} is already taken")]
    NameTaken(String),
    #[error("command not allowed during {0:?}")]
    WrongPhase(GamePhase),
    #[error("unknown player {0}")]
    UnknownPlayer(String),
    #[error("{0} appears more than once in the team")]
    DuplicateTeamMember(String),
    #[error("unknown role {0}")]
    UnknownRole(String),
    #[error("role draft {0} does not exist")]
    DraftNotFound(usize),
    #[error("no roles selected")]
    NoRolesSelected,
    #[error("none of the listed players are connected")]
    NoEligiblePlayers,
    #[error("an Assassin requires Merlin or Merlin Pure in play")]
    InvalidComposition,
    #[error("{seated} seated players cannot fill a team of {required}")]
    NotEnoughPlayers { seated: usize, required: usize },
    #[error("only the leader {leader} may propose a team")]
    WrongLeader { leader: String },
    #[error("quest needs a team of {expected}, got {actual}")]
    WrongTeamSize { expected: usize, actual: usize },
    #[error("{0} is not playing this game")]
    NotInGame(String),
    #[error("{0} is not on the quest team")]
    NotOnTeam(String),
    #[error("only the assassin may make a guess")]
    WrongActor,
    #[error("{0} is not a valid assassination target")]
    InvalidTarget(String),
}

impl GameError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GameError::Malformed(_)
            | GameError::NotJoined
            | GameError::AlreadyJoined
            | GameError::EmptyName
            | GameError::WrongPhase(_)
            | GameError::UnknownPlayer(_)
            | GameError::DuplicateTeamMember(_)
            | GameError::UnknownRole(_)
            | GameError::DraftNotFound(_)
            | GameError::NoRolesSelected
            | GameError::NoEligiblePlayers => ErrorKind::Validation,
            GameError::NameTaken(_)
            | GameError::InvalidComposition
            | GameError::NotEnoughPlayers { .. }
            | GameError::WrongLeader { .. }
            | GameError::WrongTeamSize { .. }
            | GameError::NotInGame(_)
            | GameError::NotOnTeam(_)
            | GameError::WrongActor
            | GameError::InvalidTarget(_) => ErrorKind::PolicyViolation,
        }
    }
}
