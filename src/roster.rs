use serde::Serialize;

use crate::pokemon::BattleEntity;

pub const ROSTER_CAPACITY: usize = 6;

/// Members needed before a roster can enter a duel.
pub const MIN_BATTLE_SIZE: usize = 2;

/// Ordered, id-unique selection of up to six battle entities.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Roster {
    members: Vec<BattleEntity>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `entity`. Returns `false`, leaving the roster unchanged, when
    /// the id is already present or the roster is full.
    pub fn add(&mut self, entity: BattleEntity) -> bool {
        if self.contains(entity.id) || self.is_full() {
            return false;
        }
        self.members.push(entity);
        true
    }

    pub fn remove(&mut self, id: u32) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m.id != id);
        self.members.len() != before
    }

    pub fn clear(&mut self) {
        self.members.clear();
    }

    pub fn contains(&self, id: u32) -> bool {
        self.members.iter().any(|m| m.id == id)
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= ROSTER_CAPACITY
    }

    pub fn can_enter_battle(&self) -> bool {
        self.members.len() >= MIN_BATTLE_SIZE
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> &[BattleEntity] {
        &self.members
    }

    pub fn total_power(&self) -> u32 {
        self.members.iter().map(|m| m.total_power).sum()
    }
}
