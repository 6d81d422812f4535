use chrono::Utc;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use uuid::Uuid;

use crate::error::GameError;
use crate::models::game::{normalize_player_count, quest_size, GamePhase, GameState};
use crate::models::message::{
    ClientMessage, Outbound, ServerMessage, WaitingContext, WaitingStatus,
};
use crate::models::role::{Alignment, Role, RoleAssignment};
use crate::models::role_set::RoleDrafts;
use crate::models::roster::Roster;
use crate::services::assassination::{self, GuessOutcome};
use crate::services::quest_service::{self, QuestOutcome};
use crate::services::vote_service::{self, VoteTally};
use crate::services::assignment;

pub const VOTE_TRACK_EXHAUSTED: &str = "vote track exhausted";
pub const THREE_QUESTS_FAILED: &str = "three quests failed";
const NO_SEATED_PLAYERS: &str = "no seated players left";
const TOO_FEW_PLAYERS: &str = "too few seated players to fill the quest";

/// The one game session: roster, drafts, role table and game state.
///
/// Every command runs to completion and returns the messages it produced in
/// send order; the caller delivers them before handling the next command.
#[derive(Clone)]
pub struct Session {
    roster: Roster,
    drafts: RoleDrafts,
    assignment: RoleAssignment,
    game: GameState,
    rng: StdRng,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(rng: StdRng) -> Self {
        Session {
            roster: Roster::new(),
            drafts: RoleDrafts::new(),
            assignment: RoleAssignment::default(),
            game: GameState::new(),
            rng,
        }
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn drafts(&self) -> &RoleDrafts {
        &self.drafts
    }

    pub fn assignment(&self) -> &RoleAssignment {
        &self.assignment
    }

    pub fn game(&self) -> &GameState {
        &self.game
    }

    pub fn phase(&self) -> GamePhase {
        self.game.phase
    }

    /// Roster members holding a role, in seating order.
    pub fn seated(&self) -> Vec<String> {
        self.roster
            .names()
            .into_iter()
            .filter(|name| self.assignment.contains_player(name))
            .collect()
    }

    /// First seated player in seating order; outside a game, the roster head.
    pub fn leader(&self) -> Option<String> {
        if self.assignment.is_empty() {
            self.roster.head().map(str::to_string)
        } else {
            self.seated().into_iter().next()
        }
    }

    pub fn required_team_size(&self) -> usize {
        quest_size(
            self.game.quest_index,
            normalize_player_count(self.seated().len()),
        )
    }

    /// No legal team exists for the current quest.
    fn short_handed(&self) -> bool {
        self.seated().len() < self.required_team_size()
    }

    /// Who the game is waiting on. Always derived from scratch.
    pub fn waiting_status(&self) -> WaitingStatus {
        let (waiting_on, context) = match self.game.phase {
            GamePhase::Lobby => (None, WaitingContext::Lobby),
            GamePhase::GameOver => (None, WaitingContext::GameOver),
            GamePhase::RolesAssigned | GamePhase::TeamProposal => (
                self.game
                    .team_proposal
                    .as_ref()
                    .map(|p| vec![p.leader.clone()]),
                WaitingContext::TeamProposal,
            ),
            GamePhase::TeamVote => {
                let voted = self.game.team_proposal.as_ref().map(|p| &p.ballots);
                let pending = self
                    .seated()
                    .into_iter()
                    .filter(|name| !voted.is_some_and(|b| b.contains_key(name)))
                    .collect();
                (Some(pending), WaitingContext::TeamVote)
            }
            GamePhase::QuestVote => (
                self.game.quest_ballot.as_ref().map(|ballot| {
                    ballot
                        .team
                        .iter()
                        .filter(|name| !ballot.ballots.contains_key(*name))
                        .cloned()
                        .collect()
                }),
                WaitingContext::QuestVote,
            ),
            GamePhase::Assassination => (
                self.game
                    .assassin_info
                    .as_ref()
                    .map(|info| vec![info.assassin.clone()]),
                WaitingContext::Assassination,
            ),
        };
        WaitingStatus {
            waiting_on,
            context,
        }
    }

    pub fn connection_of(&self, name: &str) -> Option<Uuid> {
        self.roster.connection_of(name)
    }

    pub fn join(&mut self, id: Uuid, name: &str) -> Result<Vec<Outbound>, GameError> {
        let num_users = self.roster.join(id, name)?;
        let name = name.trim().to_string();
        info!("{} joined ({} connected)", name, num_users);

        let mut out = vec![
            Outbound::to(name.clone(), ServerMessage::Login { num_users }),
            Outbound::all_except(
                name.clone(),
                ServerMessage::UserJoined {
                    name: name.clone(),
                    num_users,
                },
            ),
            self.user_list(),
            self.drafts_updated(),
        ];
        out.push(Outbound::to(name, self.waiting_message()));
        Ok(out)
    }

    /// Removes a participant and repairs any ballot that was waiting on them.
    pub fn leave(&mut self, name: &str) -> Vec<Outbound> {
        if self.roster.leave(name).is_none() {
            return Vec::new();
        }
        info!("{} left ({} connected)", name, self.roster.size());
        self.drafts.remove_player(name);
        let was_seated = self.assignment.remove(name).is_some();

        let mut out = vec![
            Outbound::all(ServerMessage::UserLeft {
                name: name.to_string(),
                num_users: self.roster.size(),
            }),
            self.user_list(),
            self.drafts_updated(),
        ];
        if was_seated && self.game.in_progress() {
            self.repair_after_departure(name, &mut out);
        }
        out.push(Outbound::all(self.waiting_message()));
        out
    }

    /// Dispatches one command from a joined participant.
    pub fn handle(
        &mut self,
        sender: &str,
        command: ClientMessage,
    ) -> Result<Vec<Outbound>, GameError> {
        let result = self.dispatch(sender, command);
        if let Err(e) = &result {
            debug!("rejected command from {}: {}", sender, e);
        }
        result
    }

    fn dispatch(
        &mut self,
        sender: &str,
        command: ClientMessage,
    ) -> Result<Vec<Outbound>, GameError> {
        if !self.roster.contains(sender) {
            return Err(GameError::NotJoined);
        }
        match command {
            ClientMessage::AddUser { .. } => Err(GameError::AlreadyJoined),
            ClientMessage::GetUsers => Ok(vec![
                Outbound::to(sender, self.user_list().message),
                Outbound::to(sender, self.drafts_updated().message),
                Outbound::to(sender, self.waiting_message()),
            ]),
            ClientMessage::NewMessage { message } => Ok(vec![Outbound::all_except(
                sender,
                ServerMessage::NewMessage {
                    name: sender.to_string(),
                    message,
                    sent_at: Utc::now(),
                },
            )]),
            ClientMessage::Typing => Ok(vec![Outbound::all_except(
                sender,
                ServerMessage::Typing {
                    name: sender.to_string(),
                },
            )]),
            ClientMessage::StopTyping => Ok(vec![Outbound::all_except(
                sender,
                ServerMessage::StopTyping {
                    name: sender.to_string(),
                },
            )]),
            ClientMessage::RoleSelectionChanged {
                draft_index,
                name,
                role,
            } => self.edit_draft(draft_index, &name, &role),
            ClientMessage::AddRoleDraft => {
                self.ensure_drafts_editable()?;
                self.drafts.add();
                Ok(vec![self.drafts_updated()])
            }
            ClientMessage::DeleteRoleDraft { draft_index } => {
                self.ensure_drafts_editable()?;
                self.drafts.delete(draft_index)?;
                Ok(vec![self.drafts_updated()])
            }
            ClientMessage::AssignRoles {
                selected_roles,
                players,
            } => self.assign_roles(selected_roles, players),
            ClientMessage::ConfirmTeam { team } => self.confirm_team(sender, team),
            ClientMessage::SubmitVote { vote } => self.submit_vote(sender, vote.is_yes()),
            ClientMessage::SubmitQuestVote { vote } => {
                self.submit_quest_vote(sender, vote.is_yes())
            }
            ClientMessage::SubmitAssassinGuess { guess } => self.submit_guess(sender, &guess),
        }
    }

    fn ensure_drafts_editable(&self) -> Result<(), GameError> {
        match self.game.phase {
            GamePhase::Lobby | GamePhase::GameOver => Ok(()),
            phase => Err(GameError::WrongPhase(phase)),
        }
    }

    fn edit_draft(
        &mut self,
        index: usize,
        name: &str,
        role: &str,
    ) -> Result<Vec<Outbound>, GameError> {
        self.ensure_drafts_editable()?;
        if !self.roster.contains(name) {
            return Err(GameError::UnknownPlayer(name.to_string()));
        }
        let role = if role.trim().is_empty() {
            None
        } else {
            Some(role.parse::<Role>()?)
        };
        self.drafts.set(index, name, role)?;
        Ok(vec![self.drafts_updated()])
    }

    /// Picks the role list either from the command or from a random non-empty draft.
    fn assign_roles(
        &mut self,
        selected_roles: Option<Vec<Role>>,
        players: Option<Vec<String>>,
    ) -> Result<Vec<Outbound>, GameError> {
        let (roles, eligible) = match selected_roles {
            Some(roles) if !roles.is_empty() => {
                (roles, players.unwrap_or_else(|| self.roster.names()))
            }
            _ => {
                let draft = self
                    .drafts
                    .non_empty()
                    .choose(&mut self.rng)
                    .map(|draft| (*draft).clone())
                    .ok_or(GameError::NoRolesSelected)?;
                let roles = self
                    .roster
                    .names()
                    .iter()
                    .filter_map(|name| draft.get(name).copied())
                    .collect();
                let eligible = match players {
                    Some(players) => players
                        .into_iter()
                        .filter(|name| draft.contains_key(name))
                        .collect(),
                    None => draft.keys().cloned().collect(),
                };
                (roles, eligible)
            }
        };

        let assignment =
            assignment::assign(&roles, &self.roster.names(), &eligible, &mut self.rng)?;
        let required = quest_size(1, normalize_player_count(assignment.len()));
        if assignment.len() < required {
            return Err(GameError::NotEnoughPlayers {
                seated: assignment.len(),
                required,
            });
        }
        info!(
            "assigned {} roles to {} players",
            roles.len(),
            assignment.len()
        );

        let from = self.game.phase;
        self.assignment = assignment;
        self.game.reset();
        self.game.phase = GamePhase::RolesAssigned;

        let mut out = vec![Outbound::all(ServerMessage::PhaseChanged {
            from,
            to: GamePhase::RolesAssigned,
        })];
        for name in self.seated() {
            out.push(Outbound::to(
                name.clone(),
                ServerMessage::RoleAssigned {
                    role: self.assignment.label_for(&name).unwrap_or_default(),
                    reveal: assignment::reveal_for(&name, &self.assignment),
                },
            ));
        }
        self.start_proposal(&mut out);
        out.push(Outbound::all(self.waiting_message()));
        Ok(out)
    }

    fn confirm_team(&mut self, sender: &str, team: Vec<String>) -> Result<Vec<Outbound>, GameError> {
        let required = self.required_team_size();
        let seated = self.seated();
        vote_service::propose_team(&mut self.game, sender, team.clone(), &seated, required)?;
        info!("{} proposed {:?} for quest {}", sender, team, self.game.quest_index);

        let mut out = vec![self.transition(GamePhase::TeamProposal, GamePhase::TeamVote)];
        let selected = ServerMessage::TeamSelected {
            leader: sender.to_string(),
            team: team.clone(),
            vote_track: self.game.vote_track,
            quest_index: self.game.quest_index,
        };
        out.push(Outbound::all(selected));
        out.push(Outbound::to_many(
            seated,
            ServerMessage::RequestVote {
                leader: sender.to_string(),
                team,
                vote_track: self.game.vote_track,
                quest_index: self.game.quest_index,
            },
        ));
        out.push(Outbound::all(self.waiting_message()));
        Ok(out)
    }

    fn submit_vote(&mut self, sender: &str, approve: bool) -> Result<Vec<Outbound>, GameError> {
        let seated = self.seated();
        let tally = vote_service::cast_vote(&mut self.game, sender, approve, &seated)?;
        let mut out = Vec::new();
        if let Some(tally) = tally {
            self.finish_team_vote(tally, &mut out);
        }
        out.push(Outbound::all(self.waiting_message()));
        Ok(out)
    }

    fn submit_quest_vote(&mut self, sender: &str, success: bool) -> Result<Vec<Outbound>, GameError> {
        let outcome = quest_service::cast_quest_vote(&mut self.game, sender, success)?;
        let mut out = Vec::new();
        if let Some(outcome) = outcome {
            self.finish_quest(outcome, &mut out);
        }
        out.push(Outbound::all(self.waiting_message()));
        Ok(out)
    }

    fn submit_guess(&mut self, sender: &str, guessed: &str) -> Result<Vec<Outbound>, GameError> {
        let outcome = assassination::guess(&mut self.game, sender, guessed)?;
        info!("assassin {} guessed {}: {:?}", sender, guessed, outcome);

        let mut out = Vec::new();
        match outcome {
            GuessOutcome::Hit => {
                self.end_game(Alignment::Evil, "the assassin found their target", &mut out)
            }
            GuessOutcome::Miss => self.end_game(
                Alignment::Good,
                format!("the assassin named {}, who was not a target", guessed),
                &mut out,
            ),
            GuessOutcome::Partial { remaining } => {
                out.push(Outbound::all(ServerMessage::AssassinGuessPartial {
                    guess: guessed.to_string(),
                    remaining_targets: remaining,
                }));
                self.prompt_assassin(&mut out);
            }
        }
        out.push(Outbound::all(self.waiting_message()));
        Ok(out)
    }

    fn finish_team_vote(&mut self, tally: VoteTally, out: &mut Vec<Outbound>) {
        info!(
            "team vote {} ({} approve, {} reject), vote track {}",
            if tally.approved { "approved" } else { "rejected" },
            tally.approve_voters.len(),
            tally.reject_voters.len(),
            tally.vote_track
        );
        let leader = self
            .game
            .team_proposal
            .as_ref()
            .map(|p| p.leader.clone());
        out.push(Outbound::all(ServerMessage::VoteResult {
            approved: tally.approved,
            approve_count: tally.approve_voters.len(),
            reject_count: tally.reject_voters.len(),
            approve_voters: tally.approve_voters,
            reject_voters: tally.reject_voters,
            vote_track: tally.vote_track,
        }));
        if let Some(leader) = leader {
            self.advance_leader(&leader);
        }
        out.push(self.user_list());

        if tally.track_exhausted {
            self.end_game(Alignment::Evil, VOTE_TRACK_EXHAUSTED, out);
            return;
        }
        if tally.approved {
            let seated = self.seated();
            let mut team = self
                .game
                .team_proposal
                .as_ref()
                .map(|p| p.team.clone())
                .unwrap_or_default();
            team.retain(|member| seated.contains(member));
            quest_service::open_quest(&mut self.game, team.clone());
            out.push(self.transition(GamePhase::TeamVote, GamePhase::QuestVote));
            out.push(Outbound::to_many(
                team.clone(),
                ServerMessage::RequestQuestVote {
                    quest_index: self.game.quest_index,
                    team,
                },
            ));
            // 全員が抜けたチームは即座に判定する
            if let Some(outcome) = quest_service::try_resolve(&mut self.game) {
                self.finish_quest(outcome, out);
            }
        } else {
            self.start_proposal(out);
        }
    }

    fn finish_quest(&mut self, outcome: QuestOutcome, out: &mut Vec<Outbound>) {
        info!(
            "quest {} {} ({} success, {} fail)",
            outcome.quest_index,
            if outcome.succeeded { "succeeded" } else { "failed" },
            outcome.success_count,
            outcome.fail_count
        );
        out.push(Outbound::all(ServerMessage::QuestResult {
            quest_index: outcome.quest_index,
            success_count: outcome.success_count,
            fail_count: outcome.fail_count,
            quest_succeeded: outcome.succeeded,
            successful_quests: outcome.successful_quests,
            vote_track: outcome.vote_track,
        }));

        if outcome.good_reached_goal() {
            self.begin_assassination(out);
        } else if outcome.evil_reached_goal() {
            self.end_game(Alignment::Evil, THREE_QUESTS_FAILED, out);
        } else {
            self.start_proposal(out);
        }
    }

    fn begin_assassination(&mut self, out: &mut Vec<Outbound>) {
        let from = self.game.phase;
        match assassination::begin(&mut self.game, &self.assignment, &mut self.rng) {
            Some(info) => {
                info!("assassination phase: {} hunts {} target(s)", info.assassin, info.targets.len());
                out.push(Outbound::all(ServerMessage::PhaseChanged {
                    from,
                    to: GamePhase::Assassination,
                }));
                self.announce_assassin(out);
            }
            None => self.end_game(Alignment::Good, "three quests succeeded", out),
        }
    }

    fn announce_assassin(&self, out: &mut Vec<Outbound>) {
        if let Some(info) = &self.game.assassin_info {
            out.push(Outbound::all(ServerMessage::AssassinPhaseStarted {
                assassin: info.assassin.clone(),
                requires_all: info.requires_all,
                target_count: info.targets.len(),
            }));
        }
        self.prompt_assassin(out);
    }

    fn prompt_assassin(&self, out: &mut Vec<Outbound>) {
        if let Some(info) = &self.game.assassin_info {
            out.push(Outbound::to(
                info.assassin.clone(),
                ServerMessage::RequestAssassinGuess {
                    candidates: assassination::candidates(&self.game),
                    remaining_targets: info.remaining(),
                },
            ));
        }
    }

    /// Opens a fresh proposal under the current leader for the current quest.
    fn start_proposal(&mut self, out: &mut Vec<Outbound>) {
        let Some(leader) = self.leader() else {
            self.return_to_lobby(NO_SEATED_PLAYERS, out);
            return;
        };
        if self.short_handed() {
            self.return_to_lobby(TOO_FEW_PLAYERS, out);
            return;
        }
        let from = self.game.phase;
        vote_service::open_proposal(&mut self.game, leader.clone());
        if from != GamePhase::TeamProposal {
            out.push(self.transition(from, GamePhase::TeamProposal));
        }
        out.push(Outbound::to(
            leader,
            ServerMessage::RequestTeamSelection {
                quest_index: self.game.quest_index,
                required_team_size: self.required_team_size(),
            },
        ));
    }

    /// Rotates the seating so the player after `leader` takes the lead.
    fn advance_leader(&mut self, leader: &str) {
        if !self.roster.contains(leader) {
            return;
        }
        while self.roster.head() != Some(leader) {
            self.roster.rotate_leader();
        }
        self.roster.rotate_leader();
    }

    fn repair_after_departure(&mut self, name: &str, out: &mut Vec<Outbound>) {
        if self.seated().is_empty() {
            self.return_to_lobby(NO_SEATED_PLAYERS, out);
            return;
        }
        match self.game.phase {
            // 人数が変わると必要なチーム人数も変わるので提案をやり直す
            GamePhase::RolesAssigned | GamePhase::TeamProposal => self.start_proposal(out),
            GamePhase::TeamVote if self.short_handed() => {
                self.return_to_lobby(TOO_FEW_PLAYERS, out)
            }
            GamePhase::TeamVote => {
                let seated = self.seated();
                if let Some(tally) = vote_service::try_resolve(&mut self.game, &seated) {
                    self.finish_team_vote(tally, out);
                }
            }
            GamePhase::QuestVote => {
                quest_service::remove_member(&mut self.game, name);
                if let Some(outcome) = quest_service::try_resolve(&mut self.game) {
                    self.finish_quest(outcome, out);
                }
            }
            GamePhase::Assassination => {
                let was_assassin = self
                    .game
                    .assassin_info
                    .as_ref()
                    .is_some_and(|info| info.assassin == name);
                if was_assassin {
                    match assassination::choose_assassin(&self.assignment, &mut self.rng) {
                        Some(next) => {
                            info!("assassin {} left, {} takes over", name, next);
                            if let Some(info) = self.game.assassin_info.as_mut() {
                                info.assassin = next;
                            }
                            self.announce_assassin(out);
                        }
                        None => self.end_game(Alignment::Good, "no evil player remains to assassinate", out),
                    }
                }
            }
            GamePhase::Lobby | GamePhase::GameOver => {}
        }
    }

    fn end_game(&mut self, winner: Alignment, reason: impl Into<String>, out: &mut Vec<Outbound>) {
        let reason = reason.into();
        info!("game over: {:?} wins ({})", winner, reason);
        let from = self.game.phase;
        self.game.finish(winner, reason.clone());
        out.push(self.transition(from, GamePhase::GameOver));
        out.push(Outbound::all(ServerMessage::GameOver {
            winner,
            reason,
            roles: self.assignment.labels(),
        }));
    }

    fn return_to_lobby(&mut self, reason: &str, out: &mut Vec<Outbound>) {
        let from = self.game.phase;
        info!("{}, back to the lobby", reason);
        self.assignment.clear();
        self.game.reset();
        out.push(self.transition(from, GamePhase::Lobby));
    }

    fn transition(&self, from: GamePhase, to: GamePhase) -> Outbound {
        debug!("phase {:?} -> {:?}", from, to);
        Outbound::all(ServerMessage::PhaseChanged { from, to })
    }

    fn user_list(&self) -> Outbound {
        Outbound::all(ServerMessage::UserList {
            users: self.roster.names(),
            leader: self.leader(),
        })
    }

    fn drafts_updated(&self) -> Outbound {
        Outbound::all(ServerMessage::RoleDraftsUpdated {
            drafts: self.drafts.to_wire(),
        })
    }

    fn waiting_message(&self) -> ServerMessage {
        ServerMessage::WaitingStatus(self.waiting_status())
    }
}
