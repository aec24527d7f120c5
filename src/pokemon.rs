// pokemon.rs
// Wire shapes of the PokeAPI responses and the domain records built from them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Deserialize, Clone)]
pub struct ListResponse {
    pub count: u32,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<ListingEntry>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub name: String,
    pub url: String,
}

impl ListingEntry {
    /// Numeric id taken from the trailing path segment, e.g. `.../pokemon/25/`.
    pub fn id(&self) -> Option<u32> {
        self.url.trim_end_matches('/').rsplit('/').next()?.parse().ok()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NamedAPIResource {
    pub name: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PokemonRecord {
    pub id: u32,
    pub name: String,
    pub sprites: Sprites,
    pub types: Vec<PokemonType>,
    pub stats: Vec<PokemonStat>,
    pub height: u32,
    pub weight: u32,
    #[serde(default)]
    pub abilities: Vec<PokemonAbility>,
    #[serde(default)]
    pub moves: Vec<PokemonMove>,
    pub species: NamedAPIResource,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Sprites {
    pub front_default: Option<String>,
    #[serde(default)]
    pub other: OtherSprites,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct OtherSprites {
    #[serde(rename = "official-artwork", default)]
    pub official_artwork: Artwork,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Artwork {
    pub front_default: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PokemonType {
    pub slot: u32,
    pub r#type: NamedAPIResource,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PokemonStat {
    pub base_stat: u32,
    pub stat: NamedAPIResource,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PokemonAbility {
    pub ability: NamedAPIResource,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PokemonMove {
    pub r#move: NamedAPIResource,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SpeciesRecord {
    pub generation: NamedAPIResource,
}

/// A fetched Pokémon. Immutable once built; `id` is its identity.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Entity {
    pub id: u32,
    pub name: String,
    pub sprite_url: String,
    pub types: Vec<String>,
    pub stats: BTreeMap<String, u32>,
    pub height: u32,
    pub weight: u32,
    pub abilities: Vec<String>,
    pub moves: Vec<String>,
    pub species_url: String,
}

impl Entity {
    /// `#025` style label.
    pub fn display_id(&self) -> String {
        format!("#{:03}", self.id)
    }

    pub fn has_type(&self, type_name: &str) -> bool {
        self.types.iter().any(|t| t == type_name)
    }
}

impl From<PokemonRecord> for Entity {
    fn from(record: PokemonRecord) -> Self {
        let sprite_url = record
            .sprites
            .other
            .official_artwork
            .front_default
            .filter(|url| !url.is_empty())
            .or(record.sprites.front_default)
            .unwrap_or_default();

        Self {
            id: record.id,
            name: record.name,
            sprite_url,
            types: record.types.into_iter().map(|t| t.r#type.name).collect(),
            stats: record
                .stats
                .into_iter()
                .map(|s| (s.stat.name, s.base_stat))
                .collect(),
            height: record.height,
            weight: record.weight,
            abilities: record.abilities.into_iter().map(|a| a.ability.name).collect(),
            moves: record.moves.into_iter().map(|m| m.r#move.name).collect(),
            species_url: record.species.url,
        }
    }
}

/// Detail view: the entity plus the generation name from its species record.
#[derive(Debug, Serialize, Clone)]
pub struct EntityDetail {
    #[serde(flatten)]
    pub entity: Entity,
    pub display_id: String,
    pub generation: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatBlock {
    pub hp: u32,
    pub attack: u32,
    pub defense: u32,
    pub special_attack: u32,
    pub special_defense: u32,
    pub speed: u32,
}

impl StatBlock {
    pub fn from_stats(stats: &BTreeMap<String, u32>) -> Self {
        let get = |name: &str| stats.get(name).copied().unwrap_or(0);
        Self {
            hp: get("hp"),
            attack: get("attack"),
            defense: get("defense"),
            special_attack: get("special-attack"),
            special_defense: get("special-defense"),
            speed: get("speed"),
        }
    }

    pub fn total(&self) -> u32 {
        self.hp
            + self.attack
            + self.defense
            + self.special_attack
            + self.special_defense
            + self.speed
    }
}

/// Snapshot of an [`Entity`] taken when it is picked for a battle.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct BattleEntity {
    pub id: u32,
    pub name: String,
    pub sprite_url: String,
    pub types: Vec<String>,
    pub stats: StatBlock,
    pub total_power: u32,
}

impl From<&Entity> for BattleEntity {
    fn from(entity: &Entity) -> Self {
        let stats = StatBlock::from_stats(&entity.stats);
        Self {
            id: entity.id,
            name: entity.name.clone(),
            sprite_url: entity.sprite_url.clone(),
            types: entity.types.clone(),
            total_power: stats.total(),
            stats,
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn entity(id: u32, name: &str, types: &[&str], stats: [u32; 6]) -> Entity {
        let names = [
            "hp",
            "attack",
            "defense",
            "special-attack",
            "special-defense",
            "speed",
        ];
        Entity {
            id,
            name: name.to_string(),
            sprite_url: format!("https://img.example/{id}.png"),
            types: types.iter().map(|t| t.to_string()).collect(),
            stats: names
                .iter()
                .zip(stats)
                .map(|(n, v)| (n.to_string(), v))
                .collect(),
            height: 7,
            weight: 69,
            abilities: vec!["overgrow".to_string()],
            moves: vec!["tackle".to_string()],
            species_url: format!("https://pokeapi.co/api/v2/pokemon-species/{id}/"),
        }
    }

    /// Battle entity whose total power is exactly `power` (all of it in hp).
    pub fn fighter(id: u32, power: u32) -> BattleEntity {
        BattleEntity::from(&entity(id, &format!("mon-{id}"), &["normal"], [power, 0, 0, 0, 0, 0]))
    }
}
