use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::str::FromStr;

use crate::pokemon::Entity;

/// Pokédex generations, matched by national-dex id range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Generation {
    GenerationI,
    GenerationIi,
    GenerationIii,
    GenerationIv,
    GenerationV,
    GenerationVi,
    GenerationVii,
    GenerationViii,
}

impl Generation {
    pub const ALL: [Generation; 8] = [
        Generation::GenerationI,
        Generation::GenerationIi,
        Generation::GenerationIii,
        Generation::GenerationIv,
        Generation::GenerationV,
        Generation::GenerationVi,
        Generation::GenerationVii,
        Generation::GenerationViii,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Generation::GenerationI => "generation-i",
            Generation::GenerationIi => "generation-ii",
            Generation::GenerationIii => "generation-iii",
            Generation::GenerationIv => "generation-iv",
            Generation::GenerationV => "generation-v",
            Generation::GenerationVi => "generation-vi",
            Generation::GenerationVii => "generation-vii",
            Generation::GenerationViii => "generation-viii",
        }
    }

    pub fn id_range(&self) -> RangeInclusive<u32> {
        match self {
            Generation::GenerationI => 1..=151,
            Generation::GenerationIi => 152..=251,
            Generation::GenerationIii => 252..=386,
            Generation::GenerationIv => 387..=493,
            Generation::GenerationV => 494..=649,
            Generation::GenerationVi => 650..=721,
            Generation::GenerationVii => 722..=809,
            Generation::GenerationViii => 810..=905,
        }
    }
}

impl FromStr for Generation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Generation::ALL
            .into_iter()
            .find(|g| g.name() == s)
            .ok_or_else(|| format!("unknown generation: {s}"))
    }
}

/// Search, type and generation filters over the accumulated collection.
/// An empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingFilter {
    pub search: String,
    pub types: Vec<String>,
    pub generation: Option<Generation>,
}

impl ListingFilter {
    pub fn matches(&self, entity: &Entity) -> bool {
        self.matches_search(entity) && self.matches_types(entity) && self.matches_generation(entity)
    }

    /// Case-insensitive name substring, or substring of the decimal id.
    fn matches_search(&self, entity: &Entity) -> bool {
        let needle = self.search.trim().to_lowercase();
        needle.is_empty()
            || entity.name.to_lowercase().contains(&needle)
            || entity.id.to_string().contains(&needle)
    }

    /// Any of the selected types.
    fn matches_types(&self, entity: &Entity) -> bool {
        self.types.is_empty() || self.types.iter().any(|t| entity.has_type(t))
    }

    fn matches_generation(&self, entity: &Entity) -> bool {
        self.generation.is_none_or(|g| g.id_range().contains(&entity.id))
    }

    pub fn apply<'a>(&self, entities: &'a [Entity]) -> Vec<&'a Entity> {
        entities.iter().filter(|e| self.matches(e)).collect()
    }
}

/// Uniformly random pick, `None` for an empty slice.
pub fn surprise_me<'a, R: Rng>(entities: &'a [Entity], rng: &mut R) -> Option<&'a Entity> {
    entities.choose(rng)
}
