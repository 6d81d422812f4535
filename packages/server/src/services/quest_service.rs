use crate::error::GameError;
use crate::models::game::{
    GamePhase, GameState, QuestBallot, QuestResult, QUESTS_TO_WIN, QUEST_COUNT,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestOutcome {
    pub quest_index: u8,
    pub success_count: usize,
    pub fail_count: usize,
    pub succeeded: bool,
    pub successful_quests: usize,
    pub failed_quests: usize,
    pub vote_track: u8,
}

impl QuestOutcome {
    pub fn good_reached_goal(&self) -> bool {
        self.successful_quests >= QUESTS_TO_WIN
    }

    pub fn evil_reached_goal(&self) -> bool {
        self.failed_quests >= QUESTS_TO_WIN
    }
}

/// A single fail ballot sinks the mission.
pub fn quest_fails(fail_count: usize) -> bool {
    fail_count >= 1
}

pub fn open_quest(state: &mut GameState, team: Vec<String>) {
    state.phase = GamePhase::QuestVote;
    state.team_proposal = None;
    state.assassin_info = None;
    state.quest_ballot = Some(QuestBallot::new(team));
}

pub fn cast_quest_vote(
    state: &mut GameState,
    voter: &str,
    success: bool,
) -> Result<Option<QuestOutcome>, GameError> {
    if state.phase != GamePhase::QuestVote {
        return Err(GameError::WrongPhase(state.phase));
    }
    let ballot = state
        .quest_ballot
        .as_mut()
        .ok_or(GameError::WrongPhase(state.phase))?;
    if !ballot.team.iter().any(|name| name == voter) {
        return Err(GameError::NotOnTeam(voter.to_string()));
    }
    ballot.ballots.insert(voter.to_string(), success);
    Ok(try_resolve(state))
}

/// Drops a departed player from the quest quorum. A ballot they already cast stands.
pub fn remove_member(state: &mut GameState, name: &str) {
    if let Some(ballot) = state.quest_ballot.as_mut() {
        if !ballot.ballots.contains_key(name) {
            ballot.team.retain(|member| member != name);
        }
    }
}

/// Records the mission once every team member has voted.
///
/// The vote track resets and the quest index advances unless either faction
/// has just reached three missions.
pub fn try_resolve(state: &mut GameState) -> Option<QuestOutcome> {
    if state.phase != GamePhase::QuestVote {
        return None;
    }
    let ballot = state.quest_ballot.as_ref()?;
    if !ballot.team.iter().all(|name| ballot.ballots.contains_key(name)) {
        return None;
    }

    let fail_count = ballot.ballots.values().filter(|success| !**success).count();
    let success_count = ballot.team.len() - fail_count;
    let succeeded = !quest_fails(fail_count);
    let quest_index = state.quest_index;

    state.quest_results.insert(
        quest_index,
        if succeeded { QuestResult::Success } else { QuestResult::Fail },
    );
    state.vote_track = 1;
    state.quest_ballot = None;

    let outcome = QuestOutcome {
        quest_index,
        success_count,
        fail_count,
        succeeded,
        successful_quests: state.successful_quests(),
        failed_quests: state.failed_quests(),
        vote_track: state.vote_track,
    };
    if !outcome.good_reached_goal() && !outcome.evil_reached_goal() && quest_index < QUEST_COUNT {
        state.quest_index += 1;
    }
    Some(outcome)
}
