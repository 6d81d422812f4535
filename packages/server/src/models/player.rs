use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A connected participant. `id` only routes messages; game logic goes by `name`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: Uuid,
    pub name: String,
}

impl Participant {
    pub fn new(id: Uuid, name: String) -> Self {
        Self { id, name }
    }
}
