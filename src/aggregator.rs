//! Paged fetching of the Pokémon list into one growing collection.
//!
//! Each page is a list request followed by a concurrent fan-out of detail
//! requests; the page only counts once every detail has arrived. A failed
//! page leaves the collection exactly as it was and records a sticky error
//! message until the next successful load.
//!
//! Entities are not deduplicated across pages. Upstream pagination hands
//! out disjoint id ranges and the collection trusts that.

use futures::future::try_join_all;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::FetchError;
use crate::pokemon::Entity;
use crate::source::PokemonSource;

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub entities: Vec<Entity>,
    pub has_more: bool,
}

/// What a load request ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded { added: usize },
    Failed,
    /// Nothing was applied: `load_more` found a page already in flight or
    /// nothing left, or a reload superseded the page while it was fetched.
    Skipped,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CollectionStatus {
    pub len: usize,
    pub cursor: Option<u32>,
    pub has_more: bool,
    pub loading: bool,
    pub loading_more: bool,
    pub error: Option<String>,
}

#[derive(Debug, Default)]
struct CollectionState {
    entities: Vec<Entity>,
    cursor: Option<u32>,
    has_more: bool,
    loading: bool,
    loading_more: bool,
    error: Option<String>,
    /// Bumped by every offset-0 load; pages started under an older epoch are dropped.
    epoch: u64,
}

/// A page fetch claimed under the state lock.
#[derive(Debug, Clone, Copy)]
struct Ticket {
    offset: u32,
    epoch: u64,
}

impl CollectionState {
    fn claim(&mut self, offset: u32) -> Ticket {
        if offset == 0 {
            self.epoch += 1;
            self.loading = true;
        } else {
            self.loading_more = true;
        }
        Ticket {
            offset,
            epoch: self.epoch,
        }
    }
}

pub struct Aggregator {
    source: Arc<dyn PokemonSource>,
    page_size: u32,
    state: Mutex<CollectionState>,
}

impl Aggregator {
    pub fn new(source: Arc<dyn PokemonSource>, page_size: u32) -> Self {
        Self {
            source,
            page_size,
            state: Mutex::new(CollectionState {
                has_more: true,
                ..CollectionState::default()
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, CollectionState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Fetches one page without touching the accumulated collection.
    pub async fn fetch_page(&self, offset: u32) -> Result<Page, FetchError> {
        let listing = self.source.list_page(self.page_size, offset).await?;
        tracing::debug!(
            offset,
            entries = listing.results.len(),
            total = listing.count,
            "Fetched listing page"
        );

        let details = listing.results.iter().map(|entry| self.source.entity(entry));
        let entities = try_join_all(details).await?;

        Ok(Page {
            entities,
            has_more: listing.next.is_some(),
        })
    }

    /// Fetches offset 0 and replaces the collection with it.
    pub async fn reload(&self) -> LoadOutcome {
        let ticket = self.state().claim(0);
        self.complete(ticket).await
    }

    /// Requests the page after the cursor, unless any page is already in
    /// flight or the last page said there is nothing more. Before any page
    /// has been applied this is a reload.
    pub async fn load_more(&self) -> LoadOutcome {
        let ticket = {
            let mut state = self.state();
            if state.loading || state.loading_more || !state.has_more {
                return LoadOutcome::Skipped;
            }
            let next = state.cursor.map_or(0, |cursor| cursor + self.page_size);
            state.claim(next)
        };
        self.complete(ticket).await
    }

    /// Fetches the claimed page and folds it in under a single lock:
    /// offset 0 replaces the collection, any other offset appends.
    async fn complete(&self, ticket: Ticket) -> LoadOutcome {
        let Ticket { offset, epoch } = ticket;
        let result = self.fetch_page(offset).await;

        let mut state = self.state();
        let current = state.epoch == epoch;
        if offset != 0 {
            state.loading_more = false;
        } else if current {
            state.loading = false;
        }
        if !current {
            tracing::debug!(offset, "Dropping page superseded by a reload");
            return LoadOutcome::Skipped;
        }

        match result {
            Ok(page) => {
                let added = page.entities.len();
                if offset == 0 {
                    state.entities = page.entities;
                } else {
                    state.entities.extend(page.entities);
                }
                state.cursor = Some(offset);
                state.has_more = page.has_more;
                state.error = None;
                tracing::info!(offset, added, total = state.entities.len(), "Loaded page");
                LoadOutcome::Loaded { added }
            }
            Err(e) => {
                tracing::error!(offset, "Page fetch failed: {}", e);
                state.error = Some(e.user_message().to_string());
                LoadOutcome::Failed
            }
        }
    }

    pub fn entities(&self) -> Vec<Entity> {
        self.state().entities.clone()
    }

    pub fn find(&self, id: u32) -> Option<Entity> {
        self.state().entities.iter().find(|e| e.id == id).cloned()
    }

    pub fn status(&self) -> CollectionStatus {
        let state = self.state();
        CollectionStatus {
            len: state.entities.len(),
            cursor: state.cursor,
            has_more: state.has_more,
            loading: state.loading,
            loading_more: state.loading_more,
            error: state.error.clone(),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fake::FakeSource;
    use super::*;
    use crate::error::FETCH_FAILED_MESSAGE;
    use std::collections::HashSet;

    fn aggregator(source: Arc<FakeSource>) -> Aggregator {
        Aggregator::new(source, 30)
    }

    #[tokio::test]
    async fn fetch_page_resolves_every_listing_entry() {
        let agg = aggregator(Arc::new(FakeSource::with_total(100)));
        let page = agg.fetch_page(30).await.unwrap();

        assert_eq!(page.entities.len(), 30);
        assert!(page.has_more);
        let ids: HashSet<u32> = page.entities.iter().map(|e| e.id).collect();
        assert_eq!(ids, (31..=60).collect());
    }

    #[tokio::test]
    async fn consecutive_pages_accumulate_without_duplicates() {
        let agg = aggregator(Arc::new(FakeSource::with_total(100)));

        assert_eq!(agg.reload().await, LoadOutcome::Loaded { added: 30 });
        assert_eq!(agg.load_more().await, LoadOutcome::Loaded { added: 30 });

        let entities = agg.entities();
        assert_eq!(entities.len(), 60);
        let ids: HashSet<u32> = entities.iter().map(|e| e.id).collect();
        assert_eq!(ids.len(), entities.len());
        assert_eq!(agg.status().cursor, Some(30));
    }

    #[tokio::test]
    async fn last_page_clears_has_more_and_stops_load_more() {
        let source = Arc::new(FakeSource::with_total(45));
        let agg = aggregator(source.clone());

        agg.reload().await;
        assert!(agg.status().has_more);
        assert_eq!(agg.load_more().await, LoadOutcome::Loaded { added: 15 });
        assert!(!agg.status().has_more);

        let calls = source.list_calls.load(std::sync::atomic::Ordering::SeqCst);
        assert_eq!(agg.load_more().await, LoadOutcome::Skipped);
        assert_eq!(source.list_calls.load(std::sync::atomic::Ordering::SeqCst), calls);
        assert_eq!(agg.entities().len(), 45);
    }

    #[tokio::test]
    async fn failed_second_page_keeps_first_page() {
        let source = Arc::new(FakeSource::with_total(100));
        source.fail_offset(30);
        let agg = aggregator(source.clone());

        agg.reload().await;
        assert_eq!(agg.load_more().await, LoadOutcome::Failed);

        let status = agg.status();
        assert_eq!(status.len, 30);
        assert_eq!(status.error.as_deref(), Some(FETCH_FAILED_MESSAGE));
        assert_eq!(status.cursor, Some(0));
        assert!(!status.loading_more);

        // retrying asks for the same page again and clears the error
        source.heal_offset(30);
        assert_eq!(agg.load_more().await, LoadOutcome::Loaded { added: 30 });
        assert_eq!(agg.status().error, None);
        assert_eq!(agg.entities().len(), 60);
    }

    #[tokio::test]
    async fn one_failed_detail_fails_the_whole_page() {
        let source = Arc::new(FakeSource::with_total(100));
        source.fail_id(42);
        let agg = aggregator(source);

        agg.reload().await;
        assert_eq!(agg.load_more().await, LoadOutcome::Failed);
        assert_eq!(agg.entities().len(), 30);
        assert!(agg.find(41).is_none());
    }

    #[tokio::test]
    async fn reload_replaces_the_collection() {
        let agg = aggregator(Arc::new(FakeSource::with_total(100)));
        agg.reload().await;
        agg.load_more().await;
        assert_eq!(agg.entities().len(), 60);

        agg.reload().await;
        assert_eq!(agg.entities().len(), 30);
        assert_eq!(agg.status().cursor, Some(0));
        assert!(agg.find(1).is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_load_more_never_repeats_a_page() {
        for _ in 0..10 {
            let agg = Arc::new(Aggregator::new(Arc::new(FakeSource::with_total(1_000_000)), 1));
            agg.reload().await;

            let workers: Vec<_> = (0..6)
                .map(|_| {
                    let agg = Arc::clone(&agg);
                    tokio::spawn(async move {
                        for _ in 0..300 {
                            agg.load_more().await;
                        }
                    })
                })
                .collect();
            for worker in workers {
                worker.await.unwrap();
            }

            let ids: Vec<u32> = agg.entities().iter().map(|e| e.id).collect();
            let expected: Vec<u32> = (1..=ids.len() as u32).collect();
            assert_eq!(ids, expected);
            let status = agg.status();
            assert_eq!(status.cursor, Some(ids.len() as u32 - 1));
            assert!(!status.loading_more);
        }
    }

    #[tokio::test]
    async fn load_more_is_skipped_while_a_page_is_in_flight() {
        let source = Arc::new(FakeSource::with_total(100));
        let agg = Arc::new(aggregator(source.clone()));
        agg.reload().await;

        source.hold_offset(30);
        let pending = tokio::spawn({
            let agg = Arc::clone(&agg);
            async move { agg.load_more().await }
        });
        while !agg.status().loading_more {
            tokio::task::yield_now().await;
        }

        assert_eq!(agg.load_more().await, LoadOutcome::Skipped);
        source.release.notify_one();
        assert_eq!(pending.await.unwrap(), LoadOutcome::Loaded { added: 30 });
        assert_eq!(agg.entities().len(), 60);
    }

    #[tokio::test]
    async fn reload_drops_a_page_that_was_in_flight() {
        let source = Arc::new(FakeSource::with_total(100));
        let agg = Arc::new(aggregator(source.clone()));
        agg.reload().await;

        source.hold_offset(30);
        let pending = tokio::spawn({
            let agg = Arc::clone(&agg);
            async move { agg.load_more().await }
        });
        while !agg.status().loading_more {
            tokio::task::yield_now().await;
        }

        assert_eq!(agg.reload().await, LoadOutcome::Loaded { added: 30 });
        source.release.notify_one();
        assert_eq!(pending.await.unwrap(), LoadOutcome::Skipped);

        let status = agg.status();
        assert_eq!(status.len, 30);
        assert_eq!(status.cursor, Some(0));
        assert!(!status.loading_more);
    }

    #[tokio::test]
    async fn failed_first_load_sets_error_on_empty_collection() {
        let source = Arc::new(FakeSource::with_total(100));
        source.fail_offset(0);
        let agg = aggregator(source);

        assert_eq!(agg.reload().await, LoadOutcome::Failed);
        let status = agg.status();
        assert_eq!(status.len, 0);
        assert!(status.error.is_some());
        assert!(!status.loading);
    }
}
