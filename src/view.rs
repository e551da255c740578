use crate::clipboard::Clipboard;
use crate::context::{AuthSnapshot, ListingRoute};
use crate::errors::ListingError;
use crate::models::{Listing, LISTINGS_COLLECTION};
use crate::render;
use crate::store::DocumentStore;
use anyhow::Result;
use maud::Markup;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

pub const DEFAULT_SHARE_RESET: Duration = Duration::from_millis(2000);
pub const DEFAULT_MAP_ZOOM: u8 = 13;

#[derive(Debug, Clone, PartialEq)]
pub enum LoadPhase {
    Loading,
    Found(Listing),
    NotFound,
    Error(String),
}

impl LoadPhase {
    pub fn listing(&self) -> Option<&Listing> {
        match self {
            LoadPhase::Found(listing) => Some(listing),
            _ => None,
        }
    }
}

/// Everything the page shows for the route it currently points at
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub route: ListingRoute,
    pub phase: LoadPhase,
    pub share_link_copied: bool,
    pub slider_active: bool,
}

impl ViewState {
    fn fresh(route: ListingRoute) -> Self {
        Self {
            route,
            phase: LoadPhase::Loading,
            share_link_copied: false,
            slider_active: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ViewOptions {
    pub share_reset: Duration,
    pub map_zoom: u8,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            share_reset: DEFAULT_SHARE_RESET,
            map_zoom: DEFAULT_MAP_ZOOM,
        }
    }
}

/// View model for a single listing page.
///
/// Loads are tagged with a generation number; only the most recently
/// requested load may write its result into the state.
#[derive(Clone)]
pub struct ListingView {
    store: Arc<dyn DocumentStore>,
    clipboard: Arc<dyn Clipboard>,
    auth: AuthSnapshot,
    options: ViewOptions,
    state: Arc<Mutex<ViewState>>,
    generation: Arc<AtomicU64>,
    share_reset: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl ListingView {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        clipboard: Arc<dyn Clipboard>,
        auth: AuthSnapshot,
        route: ListingRoute,
        options: ViewOptions,
    ) -> Self {
        Self {
            store,
            clipboard,
            auth,
            options,
            state: Arc::new(Mutex::new(ViewState::fresh(route))),
            generation: Arc::new(AtomicU64::new(0)),
            share_reset: Arc::new(Mutex::new(None)),
        }
    }

    pub async fn snapshot(&self) -> ViewState {
        self.state.lock().await.clone()
    }

    /// Loads the route the view was created with
    pub async fn mount(&self) -> bool {
        let route = self.state.lock().await.route.clone();
        self.load(route).await
    }

    /// Resolves the route's listing and commits the outcome.
    ///
    /// Returns `false` when a newer load superseded this one and the
    /// result was dropped.
    pub async fn load(&self, route: ListingRoute) -> bool {
        let generation = self.next_generation();
        self.run_load(route, generation).await
    }

    /// Starts a load for a new route without waiting for it to settle
    pub fn navigate(&self, route: ListingRoute) -> JoinHandle<bool> {
        let generation = self.next_generation();
        let view = self.clone();
        tokio::spawn(async move { view.run_load(route, generation).await })
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    async fn run_load(&self, route: ListingRoute, generation: u64) -> bool {
        {
            // Same order as copy_share_link: pending reset first, then state
            let mut pending = self.share_reset.lock().await;
            let mut state = self.state.lock().await;
            if !self.is_current(generation) {
                return false;
            }
            if let Some(handle) = pending.take() {
                handle.abort();
            }
            *state = ViewState::fresh(route.clone());
        }

        tracing::debug!("Loading listing {} (generation {})", route.listing_id, generation);

        let phase = match self.fetch_listing(&route.listing_id).await {
            Ok(listing) => LoadPhase::Found(listing),
            Err(ListingError::NotFound(id)) => {
                tracing::info!("Listing {} does not exist", id);
                LoadPhase::NotFound
            }
            Err(e) => {
                tracing::warn!("Failed to load listing {}: {}", route.listing_id, e);
                LoadPhase::Error(e.to_string())
            }
        };

        let mut state = self.state.lock().await;
        if !self.is_current(generation) {
            tracing::debug!(
                "Dropping stale result for listing {} (generation {})",
                route.listing_id, generation
            );
            return false;
        }
        state.phase = phase;
        true
    }

    async fn fetch_listing(&self, listing_id: &str) -> Result<Listing, ListingError> {
        if listing_id.trim().is_empty() {
            return Err(ListingError::EmptyIdentifier);
        }

        let document = self.store
            .get(LISTINGS_COLLECTION, listing_id)
            .await?
            .ok_or_else(|| ListingError::NotFound(listing_id.to_string()))?;

        Listing::from_document(document)
    }

    /// Flips between cropped and letterboxed slide display
    pub async fn toggle_slider(&self) -> bool {
        let mut state = self.state.lock().await;
        state.slider_active = !state.slider_active;
        state.slider_active
    }

    /// Carousel slide-change notification; `false` when the index has no image
    pub async fn slide_changed(&self, index: usize) -> bool {
        let state = self.state.lock().await;
        let slides = state.phase.listing().map_or(0, |listing| listing.img_urls.len());
        if index >= slides {
            tracing::warn!("Carousel has no slide {} ({} slides)", index, slides);
            return false;
        }
        tracing::debug!("Carousel moved to slide {}", index);
        true
    }

    /// Copies the page address and shows the "Link Copied!" banner.
    ///
    /// A pending reset from an earlier click is cancelled, so the banner
    /// stays up until the window after the last click has elapsed.
    pub async fn copy_share_link(&self) -> Result<()> {
        let page_url = self.state.lock().await.route.page_url.clone();
        self.clipboard.write_text(&page_url).await?;

        let mut pending = self.share_reset.lock().await;
        if let Some(handle) = pending.take() {
            handle.abort();
        }

        self.state.lock().await.share_link_copied = true;
        tracing::debug!("Copied share link {}", page_url);

        let state = self.state.clone();
        let window = self.options.share_reset;
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(window).await;
            state.lock().await.share_link_copied = false;
        }));

        Ok(())
    }

    /// Renders the current state as a complete HTML document
    pub async fn render(&self) -> Markup {
        let state = self.snapshot().await;
        render::render_document(&state, &self.auth, self.options.map_zoom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::MemoryClipboard;
    use crate::database::Database;
    use crate::models::tests::{sample_document, sample_listing};
    use crate::store::SqliteStore;
    use anyhow::bail;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::atomic::AtomicUsize;

    /// Serves documents after a per-key delay and counts lookups
    #[derive(Default)]
    struct ScriptedStore {
        documents: HashMap<String, (Duration, Option<Value>)>,
        calls: AtomicUsize,
    }

    impl ScriptedStore {
        fn with(mut self, key: &str, delay_ms: u64, document: Option<Value>) -> Self {
            self.documents.insert(key.to_string(), (Duration::from_millis(delay_ms), document));
            self
        }
    }

    #[async_trait]
    impl DocumentStore for ScriptedStore {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn get(&self, _collection: &str, key: &str) -> Result<Option<Value>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.documents.get(key) {
                Some((delay, document)) => {
                    tokio::time::sleep(*delay).await;
                    Ok(document.clone())
                }
                None => Ok(None),
            }
        }
    }

    struct FailingStore;

    /// Holds every write until the test opens the gate
    #[derive(Default)]
    struct GatedClipboard {
        gate: tokio::sync::Notify,
    }

    #[async_trait]
    impl Clipboard for GatedClipboard {
        async fn write_text(&self, _text: &str) -> Result<()> {
            self.gate.notified().await;
            Ok(())
        }
    }

    #[async_trait]
    impl DocumentStore for FailingStore {
        fn name(&self) -> &str {
            "failing"
        }

        async fn get(&self, _collection: &str, _key: &str) -> Result<Option<Value>> {
            bail!("connection reset")
        }
    }

    fn route(id: &str) -> ListingRoute {
        ListingRoute::new("https://homes.example", "rent", id)
    }

    fn view_with(store: Arc<dyn DocumentStore>, clipboard: Arc<MemoryClipboard>, id: &str) -> ListingView {
        ListingView::new(store, clipboard, AuthSnapshot::anonymous(), route(id), ViewOptions::default())
    }

    fn sqlite_store_with_sample() -> Arc<dyn DocumentStore> {
        let db = Database::in_memory().unwrap();
        db.put_document(LISTINGS_COLLECTION, "abc", &sample_document()).unwrap();
        Arc::new(SqliteStore::new(Arc::new(Mutex::new(db))))
    }

    #[tokio::test]
    async fn test_starts_in_loading_state() {
        let view = view_with(sqlite_store_with_sample(), Arc::new(MemoryClipboard::new()), "abc");
        let state = view.snapshot().await;

        assert_eq!(state.phase, LoadPhase::Loading);
        assert!(!state.share_link_copied);
        assert!(!state.slider_active);
    }

    #[tokio::test]
    async fn test_existing_listing_is_found() {
        let view = view_with(sqlite_store_with_sample(), Arc::new(MemoryClipboard::new()), "abc");

        assert!(view.mount().await);
        assert_eq!(view.snapshot().await.phase, LoadPhase::Found(sample_listing()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_fetches_once_and_settles_once() {
        let store = Arc::new(ScriptedStore::default().with("abc", 300, Some(sample_document())));
        let view = view_with(store.clone(), Arc::new(MemoryClipboard::new()), "abc");

        let handle = view.navigate(route("abc"));
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(view.snapshot().await.phase, LoadPhase::Loading);

        assert!(handle.await.unwrap());
        assert_eq!(view.snapshot().await.phase, LoadPhase::Found(sample_listing()));
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_listing_reaches_not_found() {
        let view = view_with(sqlite_store_with_sample(), Arc::new(MemoryClipboard::new()), "missing");

        assert!(view.mount().await);
        let phase = view.snapshot().await.phase;
        assert_eq!(phase, LoadPhase::NotFound);
    }

    #[tokio::test]
    async fn test_store_failure_reaches_error() {
        let view = view_with(Arc::new(FailingStore), Arc::new(MemoryClipboard::new()), "abc");

        view.mount().await;
        match view.snapshot().await.phase {
            LoadPhase::Error(reason) => assert!(reason.contains("connection reset")),
            other => panic!("expected error phase, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_listing_data_reaches_error() {
        let mut document = sample_document();
        document["regularPrice"] = json!(-5);
        let store = Arc::new(ScriptedStore::default().with("abc", 0, Some(document)));
        let view = view_with(store, Arc::new(MemoryClipboard::new()), "abc");

        view.mount().await;
        match view.snapshot().await.phase {
            LoadPhase::Error(reason) => assert!(reason.contains("Invalid listing data")),
            other => panic!("expected error phase, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_identifier_skips_fetch() {
        let store = Arc::new(ScriptedStore::default());
        let view = view_with(store.clone(), Arc::new(MemoryClipboard::new()), "  ");

        view.mount().await;
        assert!(matches!(view.snapshot().await.phase, LoadPhase::Error(_)));
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_fetch_does_not_overwrite_newer_route() {
        let mut newer = sample_document();
        newer["name"] = json!("Mountain Cabin");
        let store = Arc::new(
            ScriptedStore::default()
                .with("slow", 500, Some(sample_document()))
                .with("fast", 100, Some(newer)),
        );
        let view = view_with(store, Arc::new(MemoryClipboard::new()), "slow");

        let first = view.navigate(route("slow"));
        // Let the first fetch get in flight before the route changes
        tokio::time::sleep(Duration::from_millis(10)).await;
        let second = view.navigate(route("fast"));

        assert!(second.await.unwrap());
        assert!(!first.await.unwrap());

        let state = view.snapshot().await;
        assert_eq!(state.route.listing_id, "fast");
        assert_eq!(state.phase.listing().map(|l| l.name.as_str()), Some("Mountain Cabin"));
    }

    #[tokio::test]
    async fn test_route_change_starts_fresh_state() {
        let view = view_with(sqlite_store_with_sample(), Arc::new(MemoryClipboard::new()), "abc");
        view.mount().await;
        view.toggle_slider().await;

        view.load(route("missing")).await;
        let state = view.snapshot().await;
        assert_eq!(state.phase, LoadPhase::NotFound);
        assert!(!state.slider_active);
        assert_eq!(state.route.listing_id, "missing");
    }

    #[tokio::test]
    async fn test_render_reflects_phase() {
        let view = view_with(sqlite_store_with_sample(), Arc::new(MemoryClipboard::new()), "abc");
        assert!(view.render().await.into_string().contains("loadingSpinner"));

        view.mount().await;
        let html = view.render().await.into_string();
        assert!(html.contains("Beachfront Condo - $1,500"));
        assert!(html.contains("Contact Landlord"));
    }

    #[tokio::test]
    async fn test_toggle_slider_twice_restores_value() {
        let view = view_with(sqlite_store_with_sample(), Arc::new(MemoryClipboard::new()), "abc");
        let original = view.snapshot().await.slider_active;

        assert_eq!(view.toggle_slider().await, !original);
        assert_eq!(view.toggle_slider().await, original);
        assert_eq!(view.snapshot().await.slider_active, original);
    }

    #[tokio::test(start_paused = true)]
    async fn test_copy_share_link_resets_after_window() {
        let clipboard = Arc::new(MemoryClipboard::new());
        let view = view_with(sqlite_store_with_sample(), clipboard.clone(), "abc");

        view.copy_share_link().await.unwrap();
        assert!(view.snapshot().await.share_link_copied);
        assert_eq!(
            clipboard.contents().await.as_deref(),
            Some("https://homes.example/category/rent/abc")
        );

        tokio::time::sleep(Duration::from_millis(1999)).await;
        assert!(view.snapshot().await.share_link_copied);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(!view.snapshot().await.share_link_copied);
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_copy_extends_banner() {
        let view = view_with(sqlite_store_with_sample(), Arc::new(MemoryClipboard::new()), "abc");

        view.copy_share_link().await.unwrap();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        view.copy_share_link().await.unwrap();

        // The first click's window has passed, the second one's has not
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert!(view.snapshot().await.share_link_copied);

        tokio::time::sleep(Duration::from_millis(1001)).await;
        assert!(!view.snapshot().await.share_link_copied);
    }

    #[tokio::test(start_paused = true)]
    async fn test_copy_during_route_change_still_resets() {
        let clipboard = Arc::new(GatedClipboard::default());
        let view = ListingView::new(
            sqlite_store_with_sample(),
            clipboard.clone(),
            AuthSnapshot::anonymous(),
            route("abc"),
            ViewOptions::default(),
        );
        view.mount().await;

        // The click reads the page address, then waits on the clipboard
        let clicker = view.clone();
        let click = tokio::spawn(async move { clicker.copy_share_link().await });
        tokio::task::yield_now().await;

        // The route change starts while the click is still in flight
        let guard = view.state.lock().await;
        let load = view.navigate(route("abc"));
        tokio::task::yield_now().await;
        clipboard.gate.notify_one();
        tokio::task::yield_now().await;
        drop(guard);

        assert!(load.await.unwrap());
        click.await.unwrap().unwrap();

        tokio::time::sleep(Duration::from_millis(2001)).await;
        assert!(!view.snapshot().await.share_link_copied);
    }

    #[tokio::test]
    async fn test_slide_changed_checks_index() {
        let view = view_with(sqlite_store_with_sample(), Arc::new(MemoryClipboard::new()), "abc");
        assert!(!view.slide_changed(0).await);

        view.mount().await;
        assert!(view.slide_changed(0).await);
        assert!(view.slide_changed(1).await);
        assert!(!view.slide_changed(2).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_route_change_cancels_pending_reset() {
        let view = view_with(sqlite_store_with_sample(), Arc::new(MemoryClipboard::new()), "abc");
        view.mount().await;
        view.copy_share_link().await.unwrap();

        view.load(route("abc")).await;
        assert!(!view.snapshot().await.share_link_copied);
        assert!(view.share_reset.lock().await.is_none());
    }
}
