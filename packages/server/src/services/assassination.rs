use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeSet;

use crate::error::GameError;
use crate::models::game::{AssassinInfo, GamePhase, GameState};
use crate::models::role::{Alignment, Role, RoleAssignment};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuessOutcome {
    /// Every target found.
    Hit,
    /// Wrong name.
    Miss,
    /// One of several required targets found.
    Partial { remaining: usize },
}

/// Target set and whether every target must be named.
pub fn targets_for(assignment: &RoleAssignment) -> Option<(BTreeSet<String>, bool)> {
    if assignment.contains(Role::Merlin) {
        Some((assignment.holders(Role::Merlin).into_iter().collect(), false))
    } else if assignment.contains(Role::MerlinPure) {
        Some((assignment.holders(Role::MerlinPure).into_iter().collect(), false))
    } else if assignment.contains(Role::Tristan) && assignment.contains(Role::Isolde) {
        let mut targets: BTreeSet<String> = assignment.holders(Role::Tristan).into_iter().collect();
        targets.extend(assignment.holders(Role::Isolde));
        Some((targets, true))
    } else {
        None
    }
}

/// Draws an assassin from the evil players, Oberon included.
pub fn choose_assassin<R: Rng + ?Sized>(
    assignment: &RoleAssignment,
    rng: &mut R,
) -> Option<String> {
    assignment.names_with(Alignment::Evil).choose(rng).cloned()
}

/// Opens the assassination phase. Returns `None` when no evil player or no
/// target exists, in which case good simply wins.
pub fn begin<R: Rng + ?Sized>(
    state: &mut GameState,
    assignment: &RoleAssignment,
    rng: &mut R,
) -> Option<AssassinInfo> {
    let (targets, requires_all) = targets_for(assignment)?;
    let assassin = choose_assassin(assignment, rng)?;
    let info = AssassinInfo {
        assassin,
        targets,
        requires_all,
        confirmed: BTreeSet::new(),
        good_players: assignment.names_with(Alignment::Good).into_iter().collect(),
    };
    state.phase = GamePhase::Assassination;
    state.team_proposal = None;
    state.quest_ballot = None;
    state.assassin_info = Some(info.clone());
    Some(info)
}

/// Good-aligned names the assassin may still pick, departed players included.
pub fn candidates(state: &GameState) -> Vec<String> {
    state
        .assassin_info
        .as_ref()
        .map(|info| info.good_players.difference(&info.confirmed).cloned().collect())
        .unwrap_or_default()
}

pub fn guess(
    state: &mut GameState,
    actor: &str,
    guessed: &str,
) -> Result<GuessOutcome, GameError> {
    if state.phase != GamePhase::Assassination {
        return Err(GameError::WrongPhase(state.phase));
    }
    let info = state
        .assassin_info
        .as_mut()
        .ok_or(GameError::WrongPhase(GamePhase::Assassination))?;
    if info.assassin != actor {
        return Err(GameError::WrongActor);
    }
    if !info.good_players.contains(guessed) || info.confirmed.contains(guessed) {
        return Err(GameError::InvalidTarget(guessed.to_string()));
    }

    if !info.targets.contains(guessed) {
        return Ok(GuessOutcome::Miss);
    }
    if !info.requires_all {
        return Ok(GuessOutcome::Hit);
    }
    info.confirmed.insert(guessed.to_string());
    match info.remaining() {
        0 => Ok(GuessOutcome::Hit),
        remaining => Ok(GuessOutcome::Partial { remaining }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn table(entries: &[(&str, Role)]) -> RoleAssignment {
        RoleAssignment::new(
            entries
                .iter()
                .map(|(name, role)| (name.to_string(), *role))
                .collect(),
        )
    }

    fn set(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn target_priority() {
        let both = table(&[
            ("a", Role::Merlin),
            ("b", Role::MerlinPure),
            ("c", Role::Tristan),
            ("d", Role::Isolde),
        ]);
        assert_eq!(targets_for(&both), Some((set(&["a"]), false)));

        let pure = table(&[("b", Role::MerlinPure), ("c", Role::Tristan), ("d", Role::Isolde)]);
        assert_eq!(targets_for(&pure), Some((set(&["b"]), false)));

        let lovers = table(&[("c", Role::Tristan), ("d", Role::Isolde)]);
        assert_eq!(targets_for(&lovers), Some((set(&["c", "d"]), true)));

        let lonely = table(&[("c", Role::Tristan), ("e", Role::Minion)]);
        assert_eq!(targets_for(&lonely), None);
    }

    #[test]
    fn assassin_is_drawn_from_evil_including_oberon() {
        let t = table(&[("a", Role::Merlin), ("o", Role::Oberon)]);
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..10 {
            assert_eq!(choose_assassin(&t, &mut rng).as_deref(), Some("o"));
        }
    }

    fn started(t: &RoleAssignment) -> GameState {
        let mut state = GameState::new();
        let mut rng = StdRng::seed_from_u64(11);
        begin(&mut state, t, &mut rng).unwrap();
        state
    }

    #[test]
    fn single_target_mode() {
        let t = table(&[("m", Role::Merlin), ("s", Role::Servant), ("x", Role::Minion)]);
        let mut state = started(&t);
        assert_eq!(state.phase, GamePhase::Assassination);

        assert_eq!(guess(&mut state, "s", "m"), Err(GameError::WrongActor));
        assert_eq!(
            guess(&mut state, "x", "x"),
            Err(GameError::InvalidTarget("x".to_string()))
        );
        assert_eq!(guess(&mut state, "x", "s"), Ok(GuessOutcome::Miss));
        assert_eq!(guess(&mut state, "x", "m"), Ok(GuessOutcome::Hit));
    }

    #[test]
    fn both_required_mode() {
        let t = table(&[
            ("t", Role::Tristan),
            ("i", Role::Isolde),
            ("s", Role::Servant),
            ("x", Role::Minion),
        ]);
        let mut state = started(&t);
        assert_eq!(guess(&mut state, "x", "t"), Ok(GuessOutcome::Partial { remaining: 1 }));
        assert_eq!(
            guess(&mut state, "x", "t"),
            Err(GameError::InvalidTarget("t".to_string()))
        );
        assert_eq!(candidates(&state), vec!["i".to_string(), "s".to_string()]);
        assert_eq!(guess(&mut state, "x", "i"), Ok(GuessOutcome::Hit));
    }

    #[test]
    fn departed_targets_stay_nameable() {
        let mut t = table(&[("m", Role::Merlin), ("s", Role::Servant), ("x", Role::Minion)]);
        let mut state = started(&t);
        t.remove("m");
        assert_eq!(candidates(&state), vec!["m".to_string(), "s".to_string()]);
        assert_eq!(guess(&mut state, "x", "m"), Ok(GuessOutcome::Hit));
    }
}
