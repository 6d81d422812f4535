use crate::error::GameError;
use crate::models::game::{GamePhase, GameState, TeamProposal, MAX_VOTE_TRACK};

/// Outcome of a fully cast team ballot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteTally {
    pub approved: bool,
    pub approve_voters: Vec<String>,
    pub reject_voters: Vec<String>,
    pub vote_track: u8,
    /// The rejection landed on the last vote-track slot.
    pub track_exhausted: bool,
}

/// Strict majority of cast votes; ties reject.
pub fn is_approved(approve_count: usize, total_votes: usize) -> bool {
    approve_count * 2 > total_votes
}

pub fn open_proposal(state: &mut GameState, leader: String) {
    state.phase = GamePhase::TeamProposal;
    state.quest_ballot = None;
    state.assassin_info = None;
    state.team_proposal = Some(TeamProposal::new(leader));
}

/// Validates and records the leader's team, opening the roster-wide ballot.
pub fn propose_team(
    state: &mut GameState,
    proposer: &str,
    team: Vec<String>,
    seated: &[String],
    required_size: usize,
) -> Result<(), GameError> {
    if state.phase != GamePhase::TeamProposal {
        return Err(GameError::WrongPhase(state.phase));
    }
    let proposal = state
        .team_proposal
        .as_mut()
        .ok_or(GameError::WrongPhase(state.phase))?;
    if proposal.leader != proposer {
        return Err(GameError::WrongLeader {
            leader: proposal.leader.clone(),
        });
    }
    if team.len() != required_size {
        return Err(GameError::WrongTeamSize {
            expected: required_size,
            actual: team.len(),
        });
    }
    for (i, member) in team.iter().enumerate() {
        if !seated.contains(member) {
            return Err(GameError::UnknownPlayer(member.clone()));
        }
        if team[..i].contains(member) {
            return Err(GameError::DuplicateTeamMember(member.clone()));
        }
    }

    proposal.team = team;
    proposal.ballots.clear();
    state.phase = GamePhase::TeamVote;
    Ok(())
}

/// Records a ballot. Resubmitting overwrites the earlier one.
pub fn cast_vote(
    state: &mut GameState,
    voter: &str,
    approve: bool,
    electorate: &[String],
) -> Result<Option<VoteTally>, GameError> {
    if state.phase != GamePhase::TeamVote {
        return Err(GameError::WrongPhase(state.phase));
    }
    if !electorate.iter().any(|name| name == voter) {
        return Err(GameError::NotInGame(voter.to_string()));
    }
    let proposal = state
        .team_proposal
        .as_mut()
        .ok_or(GameError::WrongPhase(state.phase))?;
    proposal.ballots.insert(voter.to_string(), approve);
    Ok(try_resolve(state, electorate))
}

/// Resolves the ballot once every member of `electorate` has voted.
///
/// Ballots already cast by players who have since left still count. On
/// rejection the vote track advances; a rejection on the last slot is reported
/// through `track_exhausted` and leaves the track at its cap.
pub fn try_resolve(state: &mut GameState, electorate: &[String]) -> Option<VoteTally> {
    if state.phase != GamePhase::TeamVote {
        return None;
    }
    let proposal = state.team_proposal.as_ref()?;
    if electorate.is_empty() || !electorate.iter().all(|name| proposal.ballots.contains_key(name)) {
        return None;
    }

    let (approve_voters, reject_voters): (Vec<_>, Vec<_>) =
        proposal.ballots.iter().partition(|(_, approve)| **approve);
    let approve_voters: Vec<String> = approve_voters.into_iter().map(|(n, _)| n.clone()).collect();
    let reject_voters: Vec<String> = reject_voters.into_iter().map(|(n, _)| n.clone()).collect();
    let approved = is_approved(approve_voters.len(), proposal.ballots.len());

    let mut track_exhausted = false;
    if !approved {
        if state.vote_track >= MAX_VOTE_TRACK {
            track_exhausted = true;
        } else {
            state.vote_track += 1;
        }
    }

    Some(VoteTally {
        approved,
        approve_voters,
        reject_voters,
        vote_track: state.vote_track,
        track_exhausted,
    })
}
