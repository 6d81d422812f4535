use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::role::Alignment;

pub const MIN_PLAYERS: usize = 5;
pub const MAX_PLAYERS: usize = 10;
pub const QUEST_COUNT: u8 = 5;
pub const QUESTS_TO_WIN: usize = 3;
pub const MAX_VOTE_TRACK: u8 = 5;

/// Team size per quest, one row per player count from 5 to 10.
const QUEST_SIZES: [[usize; QUEST_COUNT as usize]; MAX_PLAYERS - MIN_PLAYERS + 1] = [
    [2, 3, 2, 3, 3],
    [2, 3, 4, 3, 4],
    [2, 3, 3, 4, 4],
    [3, 4, 4, 5, 5],
    [3, 4, 4, 5, 5],
    [3, 4, 4, 5, 5],
];

/// Clamps a headcount into the range covered by the quest table.
pub fn normalize_player_count(count: usize) -> usize {
    count.clamp(MIN_PLAYERS, MAX_PLAYERS)
}

/// Raw table lookup. Unknown keys give 0.
pub fn quest_size(quest_index: u8, player_count: usize) -> usize {
    if !(1..=QUEST_COUNT).contains(&quest_index)
        || !(MIN_PLAYERS..=MAX_PLAYERS).contains(&player_count)
    {
        return 0;
    }
    QUEST_SIZES[player_count - MIN_PLAYERS][usize::from(quest_index - 1)]
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GamePhase {
    Lobby,
    RolesAssigned,
    TeamProposal,
    TeamVote,
    QuestVote,
    Assassination,
    GameOver,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestResult {
    Success,
    Fail,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamProposal {
    pub leader: String,
    /// Empty until the leader confirms a team.
    pub team: Vec<String>,
    /// name -> approve
    pub ballots: BTreeMap<String, bool>,
}

impl TeamProposal {
    pub fn new(leader: String) -> Self {
        Self {
            leader,
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestBallot {
    pub team: Vec<String>,
    /// name -> success
    pub ballots: BTreeMap<String, bool>,
}

impl QuestBallot {
    pub fn new(team: Vec<String>) -> Self {
        Self {
            team,
            ballots: BTreeMap::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssassinInfo {
    pub assassin: String,
    pub targets: BTreeSet<String>,
    pub requires_all: bool,
    pub confirmed: BTreeSet<String>,
    /// Good-aligned players when the phase opened; departures do not shrink it.
    pub good_players: BTreeSet<String>,
}

impl AssassinInfo {
    pub fn remaining(&self) -> usize {
        self.targets.difference(&self.confirmed).count()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GameOutcome {
    pub winner: Alignment,
    pub reason: String,
}

/// The single mutable session record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub phase: GamePhase,
    pub quest_index: u8,
    pub vote_track: u8,
    pub quest_results: BTreeMap<u8, QuestResult>,
    pub team_proposal: Option<TeamProposal>,
    pub quest_ballot: Option<QuestBallot>,
    pub assassin_info: Option<AssassinInfo>,
    pub outcome: Option<GameOutcome>,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            phase: GamePhase::Lobby,
            quest_index: 1,
            vote_track: 1,
            quest_results: BTreeMap::new(),
            team_proposal: None,
            quest_ballot: None,
            assassin_info: None,
            outcome: None,
        }
    }
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn count(&self, result: QuestResult) -> usize {
        self.quest_results.values().filter(|r| **r == result).count()
    }

    pub fn successful_quests(&self) -> usize {
        self.count(QuestResult::Success)
    }

    pub fn failed_quests(&self) -> usize {
        self.count(QuestResult::Fail)
    }

    pub fn in_progress(&self) -> bool {
        !matches!(self.phase, GamePhase::Lobby | GamePhase::GameOver)
    }

    /// Ends the game and closes every open ballot.
    pub fn finish(&mut self, winner: Alignment, reason: impl Into<String>) {
        self.phase = GamePhase::GameOver;
        self.team_proposal = None;
        self.quest_ballot = None;
        self.assassin_info = None;
        self.outcome = Some(GameOutcome {
            winner,
            reason: reason.into(),
        });
    }
}
