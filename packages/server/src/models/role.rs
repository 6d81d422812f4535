use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::GameError;

/// Cosmetic alias shown instead of "Servant" when exactly one Servant is in play.
pub const SERVANT_ALIAS: &str = "Norman";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    Servant,
    Merlin,
    #[serde(rename = "Merlin Pure")]
    MerlinPure,
    Percival,
    Tristan,
    Isolde,
    Minion,
    Morgana,
    Assassin,
    Brute,
    Mordred,
    Oberon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Good,
    Evil,
}

impl Role {
    pub const ALL: [Role; 12] = [
        Role::Servant,
        Role::Merlin,
        Role::MerlinPure,
        Role::Percival,
        Role::Tristan,
        Role::Isolde,
        Role::Minion,
        Role::Morgana,
        Role::Assassin,
        Role::Brute,
        Role::Mordred,
        Role::Oberon,
    ];

    pub fn alignment(self) -> Alignment {
        match self {
            Role::Servant
            | Role::Merlin
            | Role::MerlinPure
            | Role::Percival
            | Role::Tristan
            | Role::Isolde => Alignment::Good,
            Role::Minion
            | Role::Morgana
            | Role::Assassin
            | Role::Brute
            | Role::Mordred
            | Role::Oberon => Alignment::Evil,
        }
    }

    pub fn is_evil(self) -> bool {
        self.alignment() == Alignment::Evil
    }

    pub fn name(self) -> &'static str {
        match self {
            Role::Servant => "Servant",
            Role::Merlin => "Merlin",
            Role::MerlinPure => "Merlin Pure",
            Role::Percival => "Percival",
            Role::Tristan => "Tristan",
            Role::Isolde => "Isolde",
            Role::Minion => "Minion",
            Role::Morgana => "Morgana",
            Role::Assassin => "Assassin",
            Role::Brute => "Brute",
            Role::Mordred => "Mordred",
            Role::Oberon => "Oberon",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Role {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .iter()
            .copied()
            .find(|role| role.name() == s.trim())
            .ok_or_else(|| GameError::UnknownRole(s.to_string()))
    }
}

/// The authoritative name -> role table for one play-through.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    roles: BTreeMap<String, Role>,
}

impl RoleAssignment {
    pub fn new(roles: BTreeMap<String, Role>) -> Self {
        Self { roles }
    }

    pub fn role_of(&self, name: &str) -> Option<Role> {
        self.roles.get(name).copied()
    }

    pub fn contains_player(&self, name: &str) -> bool {
        self.roles.contains_key(name)
    }

    pub fn contains(&self, role: Role) -> bool {
        self.roles.values().any(|r| *r == role)
    }

    /// Names holding `role`, alphabetically.
    pub fn holders(&self, role: Role) -> Vec<String> {
        self.roles
            .iter()
            .filter(|(_, r)| **r == role)
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn names_with(&self, alignment: Alignment) -> Vec<String> {
        self.roles
            .iter()
            .filter(|(_, r)| r.alignment() == alignment)
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Role)> {
        self.roles.iter().map(|(name, role)| (name.as_str(), *role))
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    pub fn remove(&mut self, name: &str) -> Option<Role> {
        self.roles.remove(name)
    }

    pub fn clear(&mut self) {
        self.roles.clear();
    }

    /// Recomputed from the live table every time; the alias must never be cached.
    pub fn uses_servant_alias(&self) -> bool {
        self.roles.values().filter(|r| **r == Role::Servant).count() == 1
    }

    pub fn apply_alias(&self, text: &str) -> String {
        if self.uses_servant_alias() {
            text.replace(Role::Servant.name(), SERVANT_ALIAS)
        } else {
            text.to_string()
        }
    }

    /// Role label as shown to players.
    pub fn label_for(&self, name: &str) -> Option<String> {
        self.role_of(name).map(|role| self.apply_alias(role.name()))
    }

    pub fn labels(&self) -> BTreeMap<String, String> {
        self.roles
            .iter()
            .map(|(name, role)| (name.clone(), self.apply_alias(role.name())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: &[(&str, Role)]) -> RoleAssignment {
        RoleAssignment::new(
            entries
                .iter()
                .map(|(name, role)| (name.to_string(), *role))
                .collect(),
        )
    }

    #[test]
    fn parses_every_role_name() {
        for role in Role::ALL {
            assert_eq!(role.name().parse::<Role>().unwrap(), role);
        }
        assert!(matches!(
            "Lancelot".parse::<Role>(),
            Err(GameError::UnknownRole(_))
        ));
    }

    #[test]
    fn merlin_pure_uses_spaced_wire_name() {
        let json = serde_json::to_string(&Role::MerlinPure).unwrap();
        assert_eq!(json, "\"Merlin Pure\"");
    }

    #[test]
    fn alias_only_with_a_single_servant() {
        let one = table(&[("a", Role::Servant), ("b", Role::Minion)]);
        assert_eq!(one.label_for("a").as_deref(), Some("Norman"));

        let two = table(&[
            ("a", Role::Servant),
            ("b", Role::Servant),
            ("c", Role::Minion),
        ]);
        assert_eq!(two.label_for("a").as_deref(), Some("Servant"));

        let none = table(&[("a", Role::Merlin), ("b", Role::Minion)]);
        assert_eq!(none.apply_alias("Servant"), "Servant");
    }

    #[test]
    fn oberon_is_evil() {
        assert_eq!(Role::Oberon.alignment(), Alignment::Evil);
        assert_eq!(Role::Percival.alignment(), Alignment::Good);
    }
}
