use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeMap;

use crate::error::GameError;
use crate::models::role::{Role, RoleAssignment};

pub const KNOW_NOTHING: &str = "you know nothing, good luck";

/// An Assassin with nobody to kill is not a legal composition.
pub fn validate_composition(roles: &[Role]) -> Result<(), GameError> {
    if roles.is_empty() {
        return Err(GameError::NoRolesSelected);
    }
    let has_assassin = roles.contains(&Role::Assassin);
    let has_merlin = roles.contains(&Role::Merlin) || roles.contains(&Role::MerlinPure);
    if has_assassin && !has_merlin {
        return Err(GameError::InvalidComposition);
    }
    Ok(())
}

/// Deals `roles` over the connected players listed in `eligible`.
///
/// Roles and players are shuffled independently and paired by position.
/// Players past the end of the shuffled role list get nothing and sit out.
pub fn assign<R: Rng + ?Sized>(
    roles: &[Role],
    connected: &[String],
    eligible: &[String],
    rng: &mut R,
) -> Result<RoleAssignment, GameError> {
    validate_composition(roles)?;

    let mut players: Vec<String> = connected
        .iter()
        .filter(|name| eligible.contains(name))
        .cloned()
        .collect();
    if players.is_empty() {
        return Err(GameError::NoEligiblePlayers);
    }

    let mut roles = roles.to_vec();
    roles.shuffle(rng);
    players.shuffle(rng);

    let table: BTreeMap<String, Role> = players.into_iter().zip(roles).collect();
    Ok(RoleAssignment::new(table))
}

fn sees(viewer: Role, other: Role) -> bool {
    match viewer {
        Role::Minion | Role::Morgana | Role::Assassin | Role::Brute | Role::Mordred => {
            other.is_evil() && other != Role::Oberon
        }
        Role::Merlin => other.is_evil() && other != Role::Mordred,
        Role::MerlinPure => true,
        Role::Oberon
        | Role::Servant
        | Role::Percival
        | Role::Tristan
        | Role::Isolde => false,
    }
}

fn listing(title: &str, names: &[String]) -> Option<String> {
    if names.is_empty() {
        None
    } else {
        Some(format!("{}: {}", title, names.join(", ")))
    }
}

fn others_seen(viewer: &str, role: Role, assignment: &RoleAssignment) -> Vec<String> {
    assignment
        .iter()
        .filter(|(name, other)| *name != viewer && sees(role, *other))
        .map(|(name, _)| name.to_string())
        .collect()
}

/// The private knowledge text for `name` under `assignment`.
pub fn reveal_for(name: &str, assignment: &RoleAssignment) -> String {
    let Some(role) = assignment.role_of(name) else {
        return KNOW_NOTHING.to_string();
    };

    let text = match role {
        Role::Minion | Role::Morgana | Role::Assassin | Role::Brute | Role::Mordred | Role::Merlin => {
            listing("Minions of Mordred", &others_seen(name, role, assignment))
        }
        Role::MerlinPure => {
            let entries: Vec<String> = assignment
                .iter()
                .filter(|(other, _)| *other != name)
                .map(|(other, role)| format!("{} is {}", other, role))
                .collect();
            if entries.is_empty() {
                None
            } else {
                Some(entries.join("; "))
            }
        }
        Role::Percival => {
            let wizard = if !assignment.contains(Role::Merlin) && assignment.contains(Role::MerlinPure) {
                Role::MerlinPure
            } else {
                Role::Merlin
            };
            let mut pair = assignment.holders(wizard);
            pair.extend(assignment.holders(Role::Morgana));
            pair.sort();
            pair.retain(|other| other != name);
            listing(&format!("{} or {}", wizard, Role::Morgana), &pair)
        }
        Role::Tristan => listing("Isolde", &assignment.holders(Role::Isolde)),
        Role::Isolde => listing("Tristan", &assignment.holders(Role::Tristan)),
        Role::Servant | Role::Oberon => None,
    };

    match text {
        Some(text) => assignment.apply_alias(&text),
        None => KNOW_NOTHING.to_string(),
    }
}
