use serde::Serialize;
use uuid::Uuid;

use super::player::Participant;
use crate::error::GameError;

/// Connected participants in seating order. The head is the mission leader.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Roster {
    participants: Vec<Participant>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a participant and returns the new headcount.
    pub fn join(&mut self, id: Uuid, name: &str) -> Result<usize, GameError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(GameError::EmptyName);
        }
        if self.contains(name) {
            return Err(GameError::NameTaken(name.to_string()));
        }
        self.participants
            .push(Participant::new(id, name.to_string()));
        Ok(self.participants.len())
    }

    pub fn leave(&mut self, name: &str) -> Option<Participant> {
        let index = self.participants.iter().position(|p| p.name == name)?;
        Some(self.participants.remove(index))
    }

    /// Moves the head to the tail.
    pub fn rotate_leader(&mut self) {
        if self.participants.len() >= 2 {
            self.participants.rotate_left(1);
        }
    }

    pub fn head(&self) -> Option<&str> {
        self.participants.first().map(|p| p.name.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.participants.iter().any(|p| p.name == name)
    }

    pub fn connection_of(&self, name: &str) -> Option<Uuid> {
        self.participants
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.id)
    }

    pub fn names(&self) -> Vec<String> {
        self.participants.iter().map(|p| p.name.clone()).collect()
    }

    pub fn size(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster(names: &[&str]) -> Roster {
        let mut roster = Roster::new();
        for name in names {
            roster.join(Uuid::new_v4(), name).unwrap();
        }
        roster
    }

    #[test]
    fn join_rejects_duplicate_names() {
        let mut roster = roster(&["alice"]);
        assert_eq!(
            roster.join(Uuid::new_v4(), "alice"),
            Err(GameError::NameTaken("alice".to_string()))
        );
        assert_eq!(roster.join(Uuid::new_v4(), "bob"), Ok(2));
        assert_eq!(roster.join(Uuid::new_v4(), "   "), Err(GameError::EmptyName));
    }

    #[test]
    fn rotation_moves_head_to_tail() {
        let mut roster = roster(&["a", "b", "c"]);
        roster.rotate_leader();
        assert_eq!(roster.names(), vec!["b", "c", "a"]);
        assert_eq!(roster.head(), Some("b"));
    }

    #[test]
    fn rotation_is_noop_for_single_participant() {
        let mut roster = roster(&["solo"]);
        roster.rotate_leader();
        assert_eq!(roster.head(), Some("solo"));
    }

    #[test]
    fn leave_removes_participant() {
        let mut roster = roster(&["a", "b"]);
        assert!(roster.leave("a").is_some());
        assert!(roster.leave("a").is_none());
        assert_eq!(roster.names(), vec!["b"]);
    }
}
