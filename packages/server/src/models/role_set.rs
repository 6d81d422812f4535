use serde::Serialize;
use std::collections::BTreeMap;

use super::role::Role;
use crate::error::GameError;

/// One collaboratively edited candidate name -> role mapping.
pub type RoleSet = BTreeMap<String, Role>;

/// Every draft currently being edited. Never empty.
#[derive(Clone, Debug, Serialize)]
pub struct RoleDrafts {
    drafts: Vec<RoleSet>,
}

impl Default for RoleDrafts {
    fn default() -> Self {
        Self {
            drafts: vec![RoleSet::new()],
        }
    }
}

impl RoleDrafts {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` clears the player's entry in that draft.
    pub fn set(&mut self, index: usize, name: &str, role: Option<Role>) -> Result<(), GameError> {
        let draft = self
            .drafts
            .get_mut(index)
            .ok_or(GameError::DraftNotFound(index))?;
        match role {
            Some(role) => {
                draft.insert(name.to_string(), role);
            }
            None => {
                draft.remove(name);
            }
        }
        Ok(())
    }

    pub fn add(&mut self) -> usize {
        self.drafts.push(RoleSet::new());
        self.drafts.len() - 1
    }

    /// Removes a draft (the last one when `index` is `None`).
    pub fn delete(&mut self, index: Option<usize>) -> Result<(), GameError> {
        let index = index.unwrap_or(self.drafts.len() - 1);
        if index >= self.drafts.len() {
            return Err(GameError::DraftNotFound(index));
        }
        self.drafts.remove(index);
        if self.drafts.is_empty() {
            self.drafts.push(RoleSet::new());
        }
        Ok(())
    }

    pub fn remove_player(&mut self, name: &str) {
        for draft in &mut self.drafts {
            draft.remove(name);
        }
    }

    pub fn non_empty(&self) -> Vec<&RoleSet> {
        self.drafts.iter().filter(|d| !d.is_empty()).collect()
    }

    pub fn len(&self) -> usize {
        self.drafts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }

    /// Wire form: each draft as name -> role label.
    pub fn to_wire(&self) -> Vec<BTreeMap<String, String>> {
        self.drafts
            .iter()
            .map(|draft| {
                draft
                    .iter()
                    .map(|(name, role)| (name.clone(), role.to_string()))
                    .collect()
            })
            .collect()
    }
}
