// Wallmix - State container
// Owns the session state the front end reads. Only the action methods here
// mutate it; observers subscribe to StateEvent instead of polling fields.
// The secondary browse tier finishes on its own task and announces itself
// with BackgroundReady; observers then call poll_background to merge it.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{broadcast, mpsc};
use tokio::task::{AbortHandle, JoinHandle};

use crate::aggregator::Aggregator;
use crate::category::Category;
use crate::collections::CollectionStore;
use crate::config::Config;
use crate::constants::STATE_EVENT_CAPACITY;
use crate::error::Result;
use crate::models::{Collection, Provider, WallpaperRecord};
use crate::providers::default_adapters;
use crate::storage::{KeyValueStore, SqliteStore};
use crate::transport::Fetcher;

/// Change notifications for observers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StateEvent {
    /// Secondary providers for `page` have settled; `poll_background` merges them
    BackgroundReady { page: u32 },
    /// Background providers appended `added` wallpapers
    WallpapersUpdated { added: usize },
    LoadingChanged { loading: bool },
    BackgroundLoadingChanged { loading: bool },
    CollectionsUpdated,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub wallpapers: Vec<WallpaperRecord>,
    pub loading: bool,
    pub collections: Vec<Collection>,
    pub is_background_loading: bool,
}

/// Secondary-tier results sent back by the relay task
struct BackgroundBatch {
    generation: u64,
    records: Vec<WallpaperRecord>,
}

/// The outstanding secondary tier of the latest browse
struct PendingTier {
    generation: u64,
    fetch: AbortHandle,
    relay: JoinHandle<()>,
}

impl PendingTier {
    fn abort(&self) {
        self.fetch.abort();
        self.relay.abort();
    }
}

pub struct StateContainer {
    state: AppState,
    aggregator: Aggregator,
    collections: CollectionStore,
    events: broadcast::Sender<StateEvent>,
    /// (provider, id) of everything shown since the list was last replaced
    seen: HashSet<(Provider, String)>,
    pending: Option<PendingTier>,
    /// Bumped per tier; batches from a replaced tier are dropped
    generation: u64,
    batch_tx: mpsc::UnboundedSender<BackgroundBatch>,
    batch_rx: mpsc::UnboundedReceiver<BackgroundBatch>,
}

impl StateContainer {
    pub fn new(aggregator: Aggregator, store: Arc<dyn KeyValueStore>) -> Self {
        let (events, _) = broadcast::channel(STATE_EVENT_CAPACITY);
        let (batch_tx, batch_rx) = mpsc::unbounded_channel();
        Self {
            state: AppState::default(),
            aggregator,
            collections: CollectionStore::new(store),
            events,
            seen: HashSet::new(),
            pending: None,
            generation: 0,
            batch_tx,
            batch_rx,
        }
    }

    /// Real providers over HTTP and the SQLite store under the data dir.
    pub fn from_config(config: &Config) -> Result<Self> {
        let fetcher = Fetcher::from_config(config)?;
        let aggregator = Aggregator::new(default_adapters(&fetcher, config));
        let store = SqliteStore::open(config.db_path())?;
        Ok(Self::new(aggregator, Arc::new(store)))
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StateEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: StateEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    // ----- Wallpapers -----

    /// Browse one page. Page 1 replaces the list, later pages append.
    /// Returns the primary provider's records. The remaining providers keep
    /// running; `BackgroundReady` is broadcast when they settle.
    pub async fn fetch_wallpapers(
        &mut self,
        page: u32,
        category: Option<Category>,
    ) -> Vec<WallpaperRecord> {
        let page = page.max(1);

        if page == 1 {
            self.cancel_background();
        } else {
            // Keep append order: finish the previous page's tier first
            self.complete_background().await;
        }

        let tiered = self.aggregator.browse_tiered(page, category).await;

        if page == 1 {
            self.seen.clear();
            self.state.wallpapers.clear();
        }
        let primary = tiered.primary;
        self.append_unseen(primary.clone());

        match tiered.background {
            Some(handle) => self.start_background(page, handle),
            None => self.set_background_loading(false),
        }

        primary
    }

    /// Merge the background tier if it has already settled, without waiting.
    /// Returns the number of wallpapers appended, or `None` if nothing was ready.
    pub fn poll_background(&mut self) -> Option<usize> {
        let generation = self.pending.as_ref()?.generation;
        while let Ok(batch) = self.batch_rx.try_recv() {
            if batch.generation == generation {
                return Some(self.merge_background(batch.records));
            }
        }
        None
    }

    /// Wait for the background tier and merge it. Returns the number appended.
    pub async fn complete_background(&mut self) -> usize {
        let Some(generation) = self.pending.as_ref().map(|tier| tier.generation) else {
            return 0;
        };
        while let Some(batch) = self.batch_rx.recv().await {
            if batch.generation == generation {
                return self.merge_background(batch.records);
            }
        }
        0
    }

    fn start_background(&mut self, page: u32, handle: JoinHandle<Vec<WallpaperRecord>>) {
        self.generation += 1;
        let generation = self.generation;
        let fetch = handle.abort_handle();
        let batches = self.batch_tx.clone();
        let events = self.events.clone();

        let relay = tokio::spawn(async move {
            let records = match handle.await {
                Ok(records) => records,
                Err(e) => {
                    log::error!("Background provider fetch did not complete: {}", e);
                    Vec::new()
                }
            };
            if batches.send(BackgroundBatch { generation, records }).is_ok() {
                let _ = events.send(StateEvent::BackgroundReady { page });
            }
        });

        self.pending = Some(PendingTier {
            generation,
            fetch,
            relay,
        });
        self.set_background_loading(true);
    }

    fn cancel_background(&mut self) {
        if let Some(tier) = self.pending.take() {
            tier.abort();
            log::debug!("Dropped background tier from a previous browse");
        }
        self.set_background_loading(false);
    }

    fn merge_background(&mut self, records: Vec<WallpaperRecord>) -> usize {
        self.pending = None;
        let added = self.append_unseen(records);
        self.set_background_loading(false);
        self.emit(StateEvent::WallpapersUpdated { added });
        added
    }

    /// Search every provider. Replaces the displayed list.
    pub async fn search_wallpapers(&mut self, query: &str) -> Vec<WallpaperRecord> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        self.set_loading(true);
        let results = self.aggregator.search(query).await;

        self.cancel_background();
        self.seen.clear();
        self.state.wallpapers.clear();
        self.append_unseen(results.clone());

        self.set_loading(false);
        results
    }

    pub async fn fetch_random_wallpaper(&self) -> Result<WallpaperRecord> {
        self.aggregator.random_one().await
    }

    fn append_unseen(&mut self, batch: Vec<WallpaperRecord>) -> usize {
        let before = self.state.wallpapers.len();
        for record in batch {
            if self.seen.insert((record.provider, record.id.clone())) {
                self.state.wallpapers.push(record);
            }
        }
        self.state.wallpapers.len() - before
    }

    fn set_loading(&mut self, loading: bool) {
        if self.state.loading != loading {
            self.state.loading = loading;
            self.emit(StateEvent::LoadingChanged { loading });
        }
    }

    fn set_background_loading(&mut self, loading: bool) {
        if self.state.is_background_loading != loading {
            self.state.is_background_loading = loading;
            self.emit(StateEvent::BackgroundLoadingChanged { loading });
        }
    }

    // ----- Collections -----

    /// Re-read collections from storage into state.
    pub fn fetch_collections(&mut self) -> Result<Vec<Collection>> {
        let collections = self.collections.reload()?.to_vec();
        self.state.collections = collections.clone();
        Ok(collections)
    }

    pub fn get_collection(&mut self, id: &str) -> Result<Collection> {
        self.collections.get(id)
    }

    pub fn create_collection(&mut self, name: &str) -> Result<Collection> {
        let created = self.collections.create(name)?;
        self.sync_collections()?;
        Ok(created)
    }

    pub fn add_to_collection(
        &mut self,
        collection_id: &str,
        wallpapers: Vec<WallpaperRecord>,
    ) -> Result<Collection> {
        let updated = self.collections.add_wallpapers(collection_id, wallpapers)?;
        self.sync_collections()?;
        Ok(updated)
    }

    pub fn remove_from_collection(
        &mut self,
        collection_id: &str,
        wallpaper_id: &str,
    ) -> Result<Collection> {
        let updated = self.collections.remove_wallpaper(collection_id, wallpaper_id)?;
        self.sync_collections()?;
        Ok(updated)
    }

    pub fn rename_collection(&mut self, id: &str, name: &str) -> Result<Collection> {
        let updated = self.collections.rename(id, name)?;
        self.sync_collections()?;
        Ok(updated)
    }

    pub fn delete_collection(&mut self, id: &str) -> Result<()> {
        self.collections.delete(id)?;
        self.sync_collections()
    }

    fn sync_collections(&mut self) -> Result<()> {
        self.state.collections = self.collections.list()?.to_vec();
        self.emit(StateEvent::CollectionsUpdated);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use super::*;
    use crate::error::WallmixError;
    use crate::providers::ProviderAdapter;
    use crate::storage::MemoryStore;

    /// Returns a fixed set of ids per page, prefixed by provider.
    struct PagedAdapter {
        provider: Provider,
        ids_per_page: Vec<Vec<&'static str>>,
    }

    #[async_trait]
    impl ProviderAdapter for PagedAdapter {
        fn provider(&self) -> Provider {
            self.provider
        }

        async fn fetch_page(&self, page: u32, _category: Option<Category>) -> Vec<WallpaperRecord> {
            self.ids_per_page
                .get(page as usize - 1)
                .map(|ids| ids.iter().map(|id| record(self.provider, id)).collect())
                .unwrap_or_default()
        }

        fn supports_search(&self) -> bool {
            true
        }

        async fn search(&self, query: &str) -> Vec<WallpaperRecord> {
            vec![record(self.provider, &format!("{}-hit", query))]
        }
    }

    /// Holds its page back until the gate is opened.
    struct GatedAdapter {
        provider: Provider,
        gate: Arc<Notify>,
        ids: Vec<&'static str>,
    }

    #[async_trait]
    impl ProviderAdapter for GatedAdapter {
        fn provider(&self) -> Provider {
            self.provider
        }

        async fn fetch_page(
            &self,
            _page: u32,
            _category: Option<Category>,
        ) -> Vec<WallpaperRecord> {
            self.gate.notified().await;
            self.ids.iter().map(|id| record(self.provider, id)).collect()
        }
    }

    fn record(provider: Provider, id: &str) -> WallpaperRecord {
        WallpaperRecord::new(provider, id, "t", "thumb", format!("https://full/{}", id), "HD")
    }

    fn container() -> StateContainer {
        let aggregator = Aggregator::new(vec![
            Arc::new(PagedAdapter {
                provider: Provider::Wallhaven,
                ids_per_page: vec![vec!["w1", "w2"], vec!["w2", "w3"]],
            }),
            Arc::new(PagedAdapter {
                provider: Provider::Unsplash,
                ids_per_page: vec![vec!["u1"], vec!["u1", "u2"]],
            }),
        ]);
        StateContainer::new(aggregator, Arc::new(MemoryStore::new()))
    }

    fn gated_container(gate: Arc<Notify>) -> StateContainer {
        let adapters: Vec<Arc<dyn ProviderAdapter>> = vec![
            Arc::new(PagedAdapter {
                provider: Provider::Wallhaven,
                ids_per_page: vec![vec!["w1"]],
            }),
            Arc::new(GatedAdapter {
                provider: Provider::Unsplash,
                gate,
                ids: vec!["u1", "u2"],
            }),
        ];
        StateContainer::new(Aggregator::new(adapters), Arc::new(MemoryStore::new()))
    }

    /// Wait (bounded) for the next BackgroundReady and return its page.
    async fn next_ready(events: &mut broadcast::Receiver<StateEvent>) -> u32 {
        loop {
            let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
                .await
                .expect("no BackgroundReady within 5s")
                .unwrap();
            if let StateEvent::BackgroundReady { page } = event {
                return page;
            }
        }
    }

    fn ids(state: &AppState) -> Vec<String> {
        state.wallpapers.iter().map(|w| w.id.clone()).collect()
    }

    #[tokio::test]
    async fn test_fetch_wallpapers_primary_then_background() {
        let mut container = container();
        let mut events = container.subscribe();

        let primary = container.fetch_wallpapers(1, None).await;
        assert_eq!(primary.len(), 2);
        assert!(container.state().is_background_loading);
        assert_eq!(ids(container.state()), vec!["w1", "w2"]);

        let added = container.complete_background().await;
        assert_eq!(added, 1);
        assert!(!container.state().is_background_loading);
        assert_eq!(ids(container.state()), vec!["w1", "w2", "u1"]);

        let mut saw_update = false;
        while let Ok(event) = events.try_recv() {
            if event == (StateEvent::WallpapersUpdated { added: 1 }) {
                saw_update = true;
            }
        }
        assert!(saw_update);
    }

    #[tokio::test]
    async fn test_background_ready_is_broadcast_without_polling() {
        let mut container = container();
        let mut events = container.subscribe();

        container.fetch_wallpapers(1, None).await;
        assert_eq!(next_ready(&mut events).await, 1);

        assert_eq!(container.poll_background(), Some(1));
        assert_eq!(ids(container.state()), vec!["w1", "w2", "u1"]);
        assert!(!container.state().is_background_loading);

        let mut updates = Vec::new();
        while let Ok(event) = events.try_recv() {
            if let StateEvent::WallpapersUpdated { added } = event {
                updates.push(added);
            }
        }
        assert_eq!(updates, vec![1]);
    }

    #[tokio::test]
    async fn test_poll_before_tier_settles_is_none() {
        let gate = Arc::new(Notify::new());
        let mut container = gated_container(gate.clone());
        let mut events = container.subscribe();

        assert_eq!(container.poll_background(), None);
        container.fetch_wallpapers(1, None).await;
        tokio::task::yield_now().await;

        assert_eq!(container.poll_background(), None);
        assert_eq!(ids(container.state()), vec!["w1"]);
        assert!(container.state().is_background_loading);

        gate.notify_one();
        assert_eq!(next_ready(&mut events).await, 1);
        assert_eq!(container.poll_background(), Some(2));
        assert_eq!(ids(container.state()), vec!["w1", "u1", "u2"]);

        // Merged once only
        assert_eq!(container.poll_background(), None);
    }

    #[tokio::test]
    async fn test_replaced_tier_is_discarded() {
        let mut container = container();
        let mut events = container.subscribe();

        container.fetch_wallpapers(1, None).await;
        next_ready(&mut events).await;

        // The settled tier belongs to a list the search replaced
        container.search_wallpapers("fog").await;
        assert_eq!(container.poll_background(), None);
        assert_eq!(container.state().wallpapers.len(), 2);

        container.fetch_wallpapers(1, None).await;
        assert_eq!(container.complete_background().await, 1);
        assert_eq!(ids(container.state()), vec!["w1", "w2", "u1"]);
    }

    #[tokio::test]
    async fn test_later_pages_append_without_repeats() {
        let mut container = container();
        container.fetch_wallpapers(1, None).await;
        container.fetch_wallpapers(2, None).await;
        container.complete_background().await;

        assert_eq!(ids(container.state()), vec!["w1", "w2", "u1", "w3", "u2"]);
    }

    #[tokio::test]
    async fn test_page_one_replaces_list() {
        let mut container = container();
        container.fetch_wallpapers(1, None).await;
        container.fetch_wallpapers(2, None).await;
        container.complete_background().await;

        container.fetch_wallpapers(1, None).await;
        container.complete_background().await;
        assert_eq!(ids(container.state()), vec!["w1", "w2", "u1"]);
    }

    #[tokio::test]
    async fn test_search_toggles_loading_and_replaces() {
        let mut container = container();
        let mut events = container.subscribe();
        container.fetch_wallpapers(1, None).await;

        let results = container.search_wallpapers("fog").await;
        assert_eq!(results.len(), 2);
        assert!(!container.state().loading);
        assert!(!container.state().is_background_loading);
        assert_eq!(container.state().wallpapers.len(), 2);

        let mut loading_events = Vec::new();
        while let Ok(event) = events.try_recv() {
            if let StateEvent::LoadingChanged { loading } = event {
                loading_events.push(loading);
            }
        }
        assert_eq!(loading_events, vec![true, false]);
    }

    #[tokio::test]
    async fn test_blank_search_is_empty() {
        let mut container = container();
        assert!(container.search_wallpapers("   ").await.is_empty());
        assert!(!container.state().loading);
    }

    #[tokio::test]
    async fn test_random_without_random_support_fails() {
        let container = container();
        let err = container.fetch_random_wallpaper().await.unwrap_err();
        assert!(matches!(err, WallmixError::AllProvidersFailed(_)));
    }

    #[test]
    fn test_collection_actions_mirror_state() {
        let mut container = container();
        let mut events = container.subscribe();

        let created = container.create_collection("Favorites").unwrap();
        assert_eq!(container.state().collections.len(), 1);

        container
            .add_to_collection(&created.id, vec![record(Provider::Wallhaven, "w1")])
            .unwrap();
        container.rename_collection(&created.id, "Best").unwrap();
        assert_eq!(container.state().collections[0].name, "Best");
        assert_eq!(container.state().collections[0].wallpapers.len(), 1);

        container.remove_from_collection(&created.id, "w1").unwrap();
        assert!(container.state().collections[0].wallpapers.is_empty());

        container.delete_collection(&created.id).unwrap();
        assert!(container.state().collections.is_empty());

        let mut updates = 0;
        while let Ok(event) = events.try_recv() {
            if event == StateEvent::CollectionsUpdated {
                updates += 1;
            }
        }
        assert_eq!(updates, 5);
    }

    #[test]
    fn test_collection_errors_surface() {
        let mut container = container();
        assert!(container.delete_collection("missing").unwrap_err().is_not_found());
        assert!(container.rename_collection("missing", "x").unwrap_err().is_not_found());
        assert!(container.add_to_collection("missing", Vec::new()).unwrap_err().is_not_found());
    }

    #[test]
    fn test_fetch_collections_reads_storage() {
        let store = Arc::new(MemoryStore::new());
        let mut first = StateContainer::new(Aggregator::new(Vec::new()), store.clone());
        first.create_collection("Shared").unwrap();

        let mut second = StateContainer::new(Aggregator::new(Vec::new()), store);
        let collections = second.fetch_collections().unwrap();
        assert_eq!(collections.len(), 1);
        assert_eq!(second.state().collections[0].name, "Shared");
    }
}
