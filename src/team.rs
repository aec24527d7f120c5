//! Named teams built from battle entities, kept for the lifetime of the process.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::pokemon::BattleEntity;
use crate::roster::Roster;

/// Members each team needs before it may fight another team.
pub const MIN_TEAM_BATTLE_SIZE: usize = 3;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Team {
    pub id: String,
    pub name: String,
    pub members: Roster,
    pub created_at: DateTime<Utc>,
}

impl Team {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            members: Roster::new(),
            created_at: Utc::now(),
        }
    }

    pub fn is_battle_ready(&self) -> bool {
        self.members.len() >= MIN_TEAM_BATTLE_SIZE
    }

    pub fn strengths(&self) -> TeamStrengths {
        let members = self.members.members();
        if members.is_empty() {
            return TeamStrengths::default();
        }

        let count = members.len() as f64;
        let average = |pick: fn(&BattleEntity) -> u32| -> u32 {
            let sum: u32 = members.iter().map(pick).sum();
            (sum as f64 / count).round() as u32
        };

        let mut type_distribution = BTreeMap::new();
        for member in members {
            for t in &member.types {
                *type_distribution.entry(t.clone()).or_insert(0) += 1;
            }
        }

        TeamStrengths {
            total_power: self.members.total_power(),
            average_stats: AverageStats {
                hp: average(|m| m.stats.hp),
                attack: average(|m| m.stats.attack),
                defense: average(|m| m.stats.defense),
                speed: average(|m| m.stats.speed),
            },
            type_distribution,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct AverageStats {
    pub hp: u32,
    pub attack: u32,
    pub defense: u32,
    pub speed: u32,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct TeamStrengths {
    pub total_power: u32,
    pub average_stats: AverageStats,
    pub type_distribution: BTreeMap<String, u32>,
}

/// All teams, in creation order.
#[derive(Debug, Clone, Default)]
pub struct TeamBook {
    teams: Vec<Team>,
}

impl TeamBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty team at the end of the book.
    pub fn create(&mut self, name: impl Into<String>) -> &Team {
        let team = Team::new(name);
        tracing::debug!(team = %team.id, name = %team.name, "Created team");
        self.teams.push(team);
        &self.teams[self.teams.len() - 1]
    }

    pub fn get(&self, id: &str) -> Option<&Team> {
        self.teams.iter().find(|t| t.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Team> {
        self.teams.iter_mut().find(|t| t.id == id)
    }

    /// `None` when the team does not exist; otherwise whether the member was added.
    pub fn add_member(&mut self, team_id: &str, entity: BattleEntity) -> Option<bool> {
        self.get_mut(team_id).map(|team| team.members.add(entity))
    }

    pub fn remove_member(&mut self, team_id: &str, entity_id: u32) -> Option<bool> {
        self.get_mut(team_id).map(|team| team.members.remove(entity_id))
    }

    pub fn rename(&mut self, team_id: &str, name: impl Into<String>) -> bool {
        match self.get_mut(team_id) {
            Some(team) => {
                team.name = name.into();
                true
            }
            None => false,
        }
    }

    pub fn delete(&mut self, team_id: &str) -> bool {
        let before = self.teams.len();
        self.teams.retain(|t| t.id != team_id);
        self.teams.len() != before
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn battle_ready(&self) -> impl Iterator<Item = &Team> {
        self.teams.iter().filter(|t| t.is_battle_ready())
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pokemon::fixtures::{entity, fighter};

    #[test]
    fn create_starts_empty_with_unique_ids() {
        let mut book = TeamBook::new();
        let a = book.create("Kanto").id.clone();
        let b = book.create("Johto").id.clone();

        assert_ne!(a, b);
        assert_eq!(book.len(), 2);
        assert!(book.get(&a).unwrap().members.is_empty());
        assert_eq!(book.get(&b).unwrap().name, "Johto");
    }

    #[test]
    fn members_follow_roster_rules() {
        let mut book = TeamBook::new();
        let id = book.create("Kanto").id.clone();

        assert_eq!(book.add_member(&id, fighter(1, 100)), Some(true));
        assert_eq!(book.add_member(&id, fighter(1, 100)), Some(false));
        for n in 2..=7 {
            book.add_member(&id, fighter(n, 100));
        }
        assert_eq!(book.get(&id).unwrap().members.len(), 6);

        assert_eq!(book.remove_member(&id, 3), Some(true));
        assert_eq!(book.get(&id).unwrap().members.len(), 5);
        assert_eq!(book.add_member("missing", fighter(9, 1)), None);
    }

    #[test]
    fn rename_and_delete() {
        let mut book = TeamBook::new();
        let id = book.create("Kanto").id.clone();

        assert!(book.rename(&id, "Elite Four"));
        assert_eq!(book.get(&id).unwrap().name, "Elite Four");
        assert!(!book.rename("missing", "x"));

        assert!(book.delete(&id));
        assert!(!book.delete(&id));
        assert!(book.is_empty());
    }

    #[test]
    fn strengths_average_and_count_types() {
        let mut team = Team::new("mixed");
        let bulbasaur = entity(1, "bulbasaur", &["grass", "poison"], [45, 49, 49, 65, 65, 45]);
        let charmander = entity(4, "charmander", &["fire"], [39, 52, 43, 60, 50, 65]);
        team.members.add((&bulbasaur).into());
        team.members.add((&charmander).into());

        let strengths = team.strengths();
        assert_eq!(strengths.total_power, 318 + 309);
        assert_eq!(strengths.average_stats.hp, 42);
        assert_eq!(strengths.average_stats.attack, 51);
        assert_eq!(strengths.average_stats.defense, 46);
        assert_eq!(strengths.average_stats.speed, 55);
        assert_eq!(strengths.type_distribution.get("grass"), Some(&1));
        assert_eq!(strengths.type_distribution.get("fire"), Some(&1));
        assert_eq!(strengths.type_distribution.len(), 3);
    }

    #[test]
    fn empty_team_has_zero_strengths() {
        assert_eq!(Team::new("empty").strengths(), TeamStrengths::default());
    }

    #[test]
    fn battle_ready_needs_three_members() {
        let mut book = TeamBook::new();
        let id = book.create("Kanto").id.clone();
        book.add_member(&id, fighter(1, 100));
        book.add_member(&id, fighter(2, 100));
        assert_eq!(book.battle_ready().count(), 0);
        book.add_member(&id, fighter(3, 100));
        assert_eq!(book.battle_ready().count(), 1);
    }
}
