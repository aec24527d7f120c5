//! Read-only access to the remote Pokémon API.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::cache::{CacheStats, TtlCache};
use crate::config::{CacheConfig, PokemonConfig};
use crate::error::FetchError;
use crate::pokemon::{Entity, ListResponse, ListingEntry, PokemonRecord, SpeciesRecord};

#[async_trait]
pub trait PokemonSource: Send + Sync {
    /// One page of the list endpoint.
    async fn list_page(&self, limit: u32, offset: u32) -> Result<ListResponse, FetchError>;

    /// Resolves a listing entry to its detail record.
    async fn entity(&self, entry: &ListingEntry) -> Result<Entity, FetchError>;

    async fn entity_by_id(&self, id: u32) -> Result<Entity, FetchError>;

    /// Generation name (e.g. `generation-i`) from a species URL.
    async fn generation(&self, species_url: &str) -> Result<String, FetchError>;
}

struct SourceCaches {
    entities: TtlCache<u32, Entity>,
    generations: TtlCache<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceCacheStats {
    pub entities: CacheStats,
    pub generations: CacheStats,
}

/// [`PokemonSource`] backed by the PokeAPI over reqwest.
pub struct HttpSource {
    client: reqwest::Client,
    api_url: String,
    caches: Option<SourceCaches>,
}

impl HttpSource {
    pub fn new(config: &PokemonConfig, cache: &CacheConfig) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        let caches = config.cache_enabled.then(|| SourceCaches {
            entities: TtlCache::new(cache),
            generations: TtlCache::new(cache),
        });

        Ok(Self {
            client: builder.build()?,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            caches,
        })
    }

    /// Periodically drops expired cache entries. Runs until the task is aborted.
    pub async fn sweep_caches(&self, every: Duration) {
        let Some(caches) = &self.caches else {
            return;
        };
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            tracing::debug!("Starting periodic cache cleanup");
            let removed = caches.entities.sweep_expired() + caches.generations.sweep_expired();
            if let Some(stats) = self.cache_stats() {
                tracing::info!(
                    removed,
                    entity_hit_rate = stats.entities.hit_rate(),
                    generation_hit_rate = stats.generations.hit_rate(),
                    evictions = stats.entities.evictions + stats.generations.evictions,
                    "Cache sweep finished"
                );
            }
        }
    }

    /// Counters of both caches, `None` when caching is disabled.
    pub fn cache_stats(&self) -> Option<SourceCacheStats> {
        self.caches.as_ref().map(|caches| SourceCacheStats {
            entities: caches.entities.stats(),
            generations: caches.generations.stats(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, String> {
        tracing::debug!("Fetching {}", url);
        let response = self.client.get(url).send().await.map_err(|e| {
            tracing::error!("Failed to make HTTP request to {}: {}", url, e);
            e.to_string()
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!("API request to {} failed with status: {}", url, status);
            return Err(format!("status {status}"));
        }

        response.json::<T>().await.map_err(|e| {
            tracing::error!("Failed to parse JSON response from {}: {}", url, e);
            format!("JSON parsing failed: {e}")
        })
    }

    async fn fetch_entity(&self, id: Option<u32>, url: &str) -> Result<Entity, FetchError> {
        if let (Some(id), Some(caches)) = (id, &self.caches) {
            if let Some(entity) = caches.entities.get(&id) {
                return Ok(entity);
            }
        }

        let record: PokemonRecord = self.get_json(url).await.map_err(|reason| FetchError::Detail {
            url: url.to_string(),
            reason,
        })?;
        let entity = Entity::from(record);
        tracing::debug!("Fetched Pokemon: {} (ID: {})", entity.name, entity.id);

        if let Some(caches) = &self.caches {
            caches.entities.insert(entity.id, entity.clone());
        }
        Ok(entity)
    }
}

#[async_trait]
impl PokemonSource for HttpSource {
    async fn list_page(&self, limit: u32, offset: u32) -> Result<ListResponse, FetchError> {
        let url = format!("{}/pokemon?limit={}&offset={}", self.api_url, limit, offset);
        self.get_json(&url)
            .await
            .map_err(|reason| FetchError::List { offset, reason })
    }

    async fn entity(&self, entry: &ListingEntry) -> Result<Entity, FetchError> {
        self.fetch_entity(entry.id(), &entry.url).await
    }

    async fn entity_by_id(&self, id: u32) -> Result<Entity, FetchError> {
        let url = format!("{}/pokemon/{}", self.api_url, id);
        self.fetch_entity(Some(id), &url).await
    }

    async fn generation(&self, species_url: &str) -> Result<String, FetchError> {
        if let Some(caches) = &self.caches {
            if let Some(name) = caches.generations.get(&species_url.to_string()) {
                return Ok(name);
            }
        }

        let species: SpeciesRecord = self.get_json(species_url).await.map_err(|reason| {
            FetchError::Species {
                url: species_url.to_string(),
                reason,
            }
        })?;

        let name = species.generation.name;
        if let Some(caches) = &self.caches {
            caches.generations.insert(species_url.to_string(), name.clone());
        }
        Ok(name)
    }
}
