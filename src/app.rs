//! Application context: the single owner of the collection, the battle
//! roster, the team book and the random source.

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::aggregator::Aggregator;
use crate::config::Config;
use crate::error::FetchError;
use crate::filter::{self, ListingFilter};
use crate::pokemon::{BattleEntity, Entity, EntityDetail};
use crate::roster::Roster;
use crate::scoring::ScoringEngine;
use crate::source::PokemonSource;
use crate::team::{Team, TeamBook, TeamStrengths};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DuelResult {
    pub winner: BattleEntity,
    pub loser: BattleEntity,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TeamBattleResult {
    pub winner: Team,
    pub loser: Team,
    pub winner_power: u64,
    pub loser_power: u64,
}

pub struct AppContext {
    source: Arc<dyn PokemonSource>,
    aggregator: Aggregator,
    roster: Mutex<Roster>,
    teams: Mutex<TeamBook>,
    engine: ScoringEngine,
    rng: Mutex<StdRng>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| {
        tracing::error!("State lock was poisoned, recovering");
        poisoned.into_inner()
    })
}

impl AppContext {
    pub fn new(config: &Config, source: Arc<dyn PokemonSource>) -> Self {
        let rng = match config.scoring.seed {
            Some(seed) => {
                tracing::info!(seed, "Using seeded battle randomness");
                StdRng::seed_from_u64(seed)
            }
            None => StdRng::from_os_rng(),
        };

        Self {
            aggregator: Aggregator::new(Arc::clone(&source), config.pokemon.page_size),
            source,
            roster: Mutex::new(Roster::new()),
            teams: Mutex::new(TeamBook::new()),
            engine: ScoringEngine::from_config(&config.scoring),
            rng: Mutex::new(rng),
        }
    }

    pub fn collection(&self) -> &Aggregator {
        &self.aggregator
    }

    pub fn filtered(&self, filter: &ListingFilter) -> Vec<Entity> {
        let entities = self.aggregator.entities();
        filter.apply(&entities).into_iter().cloned().collect()
    }

    pub fn surprise_me(&self) -> Option<Entity> {
        let entities = self.aggregator.entities();
        let mut rng = lock(&self.rng);
        filter::surprise_me(&entities, &mut *rng).cloned()
    }

    /// Collection copy when loaded, otherwise the detail endpoint.
    pub async fn entity(&self, id: u32) -> Result<Entity, FetchError> {
        match self.aggregator.find(id) {
            Some(entity) => Ok(entity),
            None => self.source.entity_by_id(id).await,
        }
    }

    pub async fn detail(&self, id: u32) -> Result<EntityDetail, FetchError> {
        let entity = self.source.entity_by_id(id).await?;
        let generation = self.source.generation(&entity.species_url).await?;
        Ok(EntityDetail {
            display_id: entity.display_id(),
            entity,
            generation,
        })
    }

    pub fn roster(&self) -> Roster {
        lock(&self.roster).clone()
    }

    /// Adds the entity with `id` to the roster; `Ok(false)` when it was
    /// already there or the roster is full.
    pub async fn add_to_roster(&self, id: u32) -> Result<bool, FetchError> {
        let entity = self.entity(id).await?;
        Ok(lock(&self.roster).add(BattleEntity::from(&entity)))
    }

    pub fn remove_from_roster(&self, id: u32) -> bool {
        lock(&self.roster).remove(id)
    }

    pub fn clear_roster(&self) {
        lock(&self.roster).clear();
    }

    /// Flat duel over the current roster, `None` below two members.
    pub fn battle_roster(&self) -> Option<DuelResult> {
        let roster = self.roster();
        let mut rng = lock(&self.rng);
        self.engine
            .score(roster.members(), &mut *rng)
            .map(|duel| DuelResult {
                winner: duel.winner.clone(),
                loser: duel.loser.clone(),
            })
    }

    pub fn teams(&self) -> Vec<Team> {
        lock(&self.teams).teams().to_vec()
    }

    /// Teams with enough members to enter a team battle.
    pub fn battle_ready_teams(&self) -> Vec<Team> {
        lock(&self.teams).battle_ready().cloned().collect()
    }

    pub fn team(&self, id: &str) -> Option<Team> {
        lock(&self.teams).get(id).cloned()
    }

    pub fn create_team(&self, name: &str) -> Team {
        lock(&self.teams).create(name).clone()
    }

    pub fn rename_team(&self, id: &str, name: &str) -> bool {
        lock(&self.teams).rename(id, name)
    }

    pub fn delete_team(&self, id: &str) -> bool {
        lock(&self.teams).delete(id)
    }

    /// `Ok(None)` when the team does not exist.
    pub async fn add_to_team(&self, team_id: &str, id: u32) -> Result<Option<bool>, FetchError> {
        if self.team(team_id).is_none() {
            return Ok(None);
        }
        let entity = self.entity(id).await?;
        Ok(lock(&self.teams).add_member(team_id, BattleEntity::from(&entity)))
    }

    pub fn remove_from_team(&self, team_id: &str, id: u32) -> Option<bool> {
        lock(&self.teams).remove_member(team_id, id)
    }

    pub fn team_strengths(&self, id: &str) -> Option<TeamStrengths> {
        lock(&self.teams).get(id).map(Team::strengths)
    }

    /// Replaces the roster with the team's members. `false` for an unknown team.
    pub fn send_team_to_roster(&self, id: &str) -> bool {
        let Some(team) = self.team(id) else {
            return false;
        };
        let mut roster = lock(&self.roster);
        roster.clear();
        for member in team.members.members() {
            roster.add(member.clone());
        }
        true
    }

    /// `None` when either team is missing or has fewer than three members.
    pub fn battle_teams(&self, first: &str, second: &str) -> Option<TeamBattleResult> {
        let teams = lock(&self.teams);
        let (first, second) = (teams.get(first)?, teams.get(second)?);
        let mut rng = lock(&self.rng);
        self.engine
            .team_score(first, second, &mut *rng)
            .map(|result| TeamBattleResult {
                winner: result.winner.clone(),
                loser: result.loser.clone(),
                winner_power: result.winner_power,
                loser_power: result.loser_power,
            })
    }
}
