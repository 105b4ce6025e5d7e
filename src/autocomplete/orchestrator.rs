//! Query orchestration: debounce, cache, cancellable fetch, observable state

use super::debounce::{DebounceGate, Schedule, DEFAULT_DEBOUNCE, MIN_QUERY_LEN};
use super::fetch::{CancellableFetch, HttpLocationSource, LocationSource};
use crate::cache::{query_cache_key, SuggestionCache};
use crate::config::AutocompleteSettings;
use crate::locations::{LocationType, Suggestion};
use crate::network::HttpClient;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Where the current query is in its lifecycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchPhase {
    #[default]
    Idle,
    Debouncing,
    Fetching,
    Succeeded,
    Failed,
}

/// Observable state of one autocomplete widget
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    pub phase: SearchPhase,
    pub suggestions: Arc<Vec<Suggestion>>,
    pub loading: bool,
    pub error: Option<String>,
}

impl SearchState {
    fn reset(&mut self) {
        self.phase = SearchPhase::Idle;
        self.suggestions = Arc::default();
        self.loading = false;
        self.error = None;
    }
}

/// Tuning for a [`LocationSearch`]
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub debounce: Duration,
    pub min_query_len: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            min_query_len: MIN_QUERY_LEN,
        }
    }
}

impl From<&AutocompleteSettings> for SearchOptions {
    fn from(settings: &AutocompleteSettings) -> Self {
        Self {
            debounce: settings.debounce(),
            min_query_len: settings.min_query_len,
        }
    }
}

struct Inner {
    cache: SuggestionCache,
    fetch: CancellableFetch,
    state: watch::Sender<SearchState>,
    disposed: AtomicBool,
}

impl Inner {
    /// Runs once the debounce timer fires
    ///
    /// `ticket` was claimed when the timer fired; clearing, a short query or
    /// teardown since then makes it stale and nothing is sent or applied.
    async fn run(&self, ticket: u64, query: String, location_type: LocationType) {
        let key = query_cache_key(&query, location_type);

        if let Some(cached) = self.cache.get(&key).await {
            debug!("Cache hit for {}", key);
            self.apply(ticket, |state| {
                state.phase = SearchPhase::Succeeded;
                state.suggestions = cached;
                state.loading = false;
                state.error = None;
            });
            return;
        }

        let Some(pending) = self.fetch.issue_if_current(ticket, &query, location_type) else {
            debug!("Dropping search for {:?}, cleared before dispatch", query);
            return;
        };
        let generation = pending.generation();
        self.apply(generation, |state| {
            state.phase = SearchPhase::Fetching;
            state.loading = true;
            state.error = None;
        });

        match pending.wait().await {
            Ok(suggestions) => {
                info!("Found {} locations for {:?}", suggestions.len(), query);
                let suggestions = Arc::new(suggestions);
                self.cache.put(key, suggestions.clone()).await;
                self.apply(generation, |state| {
                    state.phase = SearchPhase::Succeeded;
                    state.suggestions = suggestions;
                    state.loading = false;
                    state.error = None;
                });
            }
            Err(e) if e.is_cancelled() => {
                debug!("Discarding superseded request #{}", generation);
            }
            Err(e) => {
                warn!("Location search for {:?} failed: {}", query, e);
                self.apply(generation, |state| {
                    state.phase = SearchPhase::Failed;
                    state.suggestions = Arc::default();
                    state.loading = false;
                    state.error = Some(e.to_string());
                });
            }
        }
    }

    /// Mutate observable state only if `generation` is still the latest
    fn apply(&self, generation: u64, update: impl FnOnce(&mut SearchState)) {
        self.state.send_if_modified(|state| {
            if self.disposed.load(Ordering::SeqCst) || !self.fetch.is_current(generation) {
                return false;
            }
            update(state);
            true
        });
    }

    fn cancel_in_flight(&self) {
        self.fetch.supersede();
    }
}

/// Location autocomplete for one widget
///
/// Owns its debounce timer and in-flight request; shares the suggestion cache.
/// Results are delivered through [`subscribe`](Self::subscribe) and
/// [`state`](Self::state). Must be used from within a tokio runtime.
pub struct LocationSearch {
    inner: Arc<Inner>,
    gate: DebounceGate,
}

impl LocationSearch {
    pub fn new(source: Arc<dyn LocationSource>, cache: SuggestionCache, options: SearchOptions) -> Self {
        let (state, _) = watch::channel(SearchState::default());
        Self {
            inner: Arc::new(Inner {
                cache,
                fetch: CancellableFetch::new(source),
                state,
                disposed: AtomicBool::new(false),
            }),
            gate: DebounceGate::new(options.debounce, options.min_query_len),
        }
    }

    /// Default options, process-wide cache
    pub fn with_shared_cache(source: Arc<dyn LocationSource>) -> Self {
        Self::new(source, SuggestionCache::shared(), SearchOptions::default())
    }

    /// HTTP-backed search configured from settings
    pub fn from_settings(client: HttpClient, settings: &AutocompleteSettings) -> Self {
        let source = HttpLocationSource::new(client, settings.endpoint.clone());
        let cache = SuggestionCache::shared_with(settings.cache_ttl(), settings.cache_max_entries);
        Self::new(Arc::new(source), cache, SearchOptions::from(settings))
    }

    /// Handle a keystroke; results arrive through the observable state
    pub fn search_locations(&self, query: &str, location_type: LocationType) {
        let inner = self.inner.clone();
        let outcome = self.gate.schedule(query, location_type, move |query, location_type| {
            let ticket = inner.fetch.supersede();
            tokio::spawn(async move { inner.run(ticket, query, location_type).await });
        });

        match outcome {
            Schedule::Skipped => {
                self.inner.cancel_in_flight();
                self.inner.state.send_modify(SearchState::reset);
            }
            Schedule::Armed => {
                self.inner.state.send_modify(|state| state.phase = SearchPhase::Debouncing);
            }
        }
    }

    /// Empty the state and cancel any pending timer or request
    pub fn clear_suggestions(&self) {
        self.gate.cancel();
        self.inner.cancel_in_flight();
        self.inner.state.send_modify(SearchState::reset);
    }

    /// Receiver notified on every visible state change
    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.inner.state.subscribe()
    }

    /// Snapshot of the current state
    pub fn state(&self) -> SearchState {
        self.inner.state.borrow().clone()
    }
}

impl Drop for LocationSearch {
    fn drop(&mut self) {
        self.inner.disposed.store(true, Ordering::SeqCst);
        self.gate.cancel();
        self.inner.cancel_in_flight();
    }
}

#[cfg(test)]
mod tests {
    use super::super::fetch::tests::FakeSource;
    use super::*;
    use crate::locations::SearchError;

    const SETTLE: Duration = Duration::from_millis(400);

    fn search_with(source: FakeSource) -> (LocationSearch, Arc<FakeSource>) {
        let source = Arc::new(source);
        let search = LocationSearch::new(
            source.clone(),
            SuggestionCache::new(Duration::from_secs(300), 100),
            SearchOptions::default(),
        );
        (search, source)
    }

    fn ids(state: &SearchState) -> Vec<String> {
        state.suggestions.iter().map(|s| s.id.clone()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_settles_with_suggestions() {
        let (search, source) = search_with(FakeSource::default());

        search.search_locations("rome", LocationType::City);
        assert_eq!(search.state().phase, SearchPhase::Debouncing);
        tokio::time::sleep(SETTLE).await;

        let state = search.state();
        assert_eq!(state.phase, SearchPhase::Succeeded);
        assert_eq!(ids(&state), vec!["ROME"]);
        assert!(!state.loading);
        assert!(state.error.is_none());
        assert_eq!(source.calls(), vec![("rome".to_string(), LocationType::City)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_query_clears_without_network() {
        let (search, source) = search_with(
            FakeSource::default()
                .with_failure("oops", SearchError::Upstream("Location search failed".to_string())),
        );

        search.search_locations("oops", LocationType::Any);
        tokio::time::sleep(SETTLE).await;
        assert!(search.state().error.is_some());

        search.search_locations("o", LocationType::Any);
        let state = search.state();
        assert_eq!(state.phase, SearchPhase::Idle);
        assert!(state.suggestions.is_empty());
        assert!(state.error.is_none());

        search.search_locations("", LocationType::Any);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(source.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_query_discards_in_flight_result() {
        let (search, _source) =
            search_with(FakeSource::default().with_delay("rome", Duration::from_millis(500)));

        search.search_locations("rome", LocationType::Any);
        tokio::time::sleep(SETTLE).await;
        assert!(search.state().loading);

        search.search_locations("r", LocationType::Any);
        tokio::time::sleep(Duration::from_secs(1)).await;

        let state = search.state();
        assert_eq!(state.phase, SearchPhase::Idle);
        assert!(state.suggestions.is_empty());
        assert!(!state.loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeat_query_served_from_cache() {
        let (search, source) = search_with(FakeSource::default());

        search.search_locations("rome", LocationType::Any);
        tokio::time::sleep(SETTLE).await;
        let first = search.state();

        search.search_locations("  ROME ", LocationType::Any);
        tokio::time::sleep(SETTLE).await;
        let second = search.state();

        assert_eq!(source.calls().len(), 1);
        assert_eq!(first.suggestions, second.suggestions);
        assert!(Arc::ptr_eq(&first.suggestions, &second.suggestions));

        search.search_locations("rome", LocationType::Airport);
        tokio::time::sleep(SETTLE).await;
        assert_eq!(source.calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_shared_between_widgets() {
        let source = Arc::new(FakeSource::default());
        let cache = SuggestionCache::new(Duration::from_secs(300), 100);
        let first = LocationSearch::new(source.clone(), cache.clone(), SearchOptions::default());
        let second = LocationSearch::new(source.clone(), cache, SearchOptions::default());

        first.search_locations("oslo", LocationType::Any);
        tokio::time::sleep(SETTLE).await;
        second.search_locations("oslo", LocationType::Any);
        tokio::time::sleep(SETTLE).await;

        assert_eq!(source.calls().len(), 1);
        assert_eq!(ids(&second.state()), vec!["OSLO"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_keystroke_burst_dispatches_last_query() {
        let (search, source) = search_with(FakeSource::default());

        for query in ["p", "pa", "par", "pari", "paris"] {
            search.search_locations(query, LocationType::Any);
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        tokio::time::sleep(SETTLE).await;

        assert_eq!(source.calls(), vec![("paris".to_string(), LocationType::Any)]);
        assert_eq!(ids(&search.state()), vec!["PARIS"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_response_never_applied() {
        let (search, source) = search_with(
            FakeSource::default()
                .with_delay("paris", Duration::from_millis(500))
                .with_delay("london", Duration::from_millis(50)),
        );

        search.search_locations("paris", LocationType::Any);
        tokio::time::sleep(Duration::from_millis(350)).await;
        assert_eq!(search.state().phase, SearchPhase::Fetching);

        search.search_locations("london", LocationType::Any);
        tokio::time::sleep(SETTLE).await;
        assert_eq!(ids(&search.state()), vec!["LONDON"]);

        tokio::time::sleep(Duration::from_secs(2)).await;
        let state = search.state();
        assert_eq!(ids(&state), vec!["LONDON"]);
        assert_eq!(state.phase, SearchPhase::Succeeded);
        assert_eq!(source.calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_upstream_error_exposed() {
        let (search, _source) = search_with(
            FakeSource::default()
                .with_failure("boom", SearchError::Upstream("Location search failed".to_string())),
        );

        search.search_locations("rome", LocationType::Any);
        tokio::time::sleep(SETTLE).await;
        assert!(!search.state().suggestions.is_empty());

        search.search_locations("boom", LocationType::Any);
        tokio::time::sleep(SETTLE).await;

        let state = search.state();
        assert_eq!(state.phase, SearchPhase::Failed);
        assert_eq!(state.error.as_deref(), Some("Location search failed"));
        assert!(state.suggestions.is_empty());
        assert!(!state.loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_are_not_cached() {
        let (search, source) = search_with(
            FakeSource::default().with_failure("boom", SearchError::Network("refused".to_string())),
        );

        search.search_locations("boom", LocationType::Any);
        tokio::time::sleep(SETTLE).await;
        search.search_locations("boom", LocationType::Any);
        tokio::time::sleep(SETTLE).await;

        assert_eq!(source.calls().len(), 2);
        assert_eq!(search.state().error.as_deref(), Some("refused"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_loading_while_fetching() {
        let (search, _source) =
            search_with(FakeSource::default().with_delay("rome", Duration::from_millis(200)));
        let mut updates = search.subscribe();

        search.search_locations("rome", LocationType::Any);
        tokio::time::sleep(Duration::from_millis(350)).await;
        let state = search.state();
        assert!(state.loading);
        assert_eq!(state.phase, SearchPhase::Fetching);

        tokio::time::sleep(SETTLE).await;
        assert!(updates.has_changed().unwrap());
        let state = updates.borrow_and_update().clone();
        assert!(!state.loading);
        assert_eq!(ids(&state), vec!["ROME"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_cancels_pending_timer() {
        let (search, source) = search_with(FakeSource::default());

        search.search_locations("rome", LocationType::Any);
        tokio::time::sleep(Duration::from_millis(100)).await;
        search.clear_suggestions();
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(source.calls().is_empty());
        assert_eq!(search.state(), SearchState::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_discards_in_flight_result() {
        let (search, _source) =
            search_with(FakeSource::default().with_delay("rome", Duration::from_millis(500)));

        search.search_locations("rome", LocationType::Any);
        tokio::time::sleep(SETTLE).await;
        search.clear_suggestions();
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(search.state(), SearchState::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_as_timer_fires_sends_nothing() {
        let (search, source) = search_with(FakeSource::default());
        let search = Arc::new(search);

        search.search_locations("rome", LocationType::Any);
        let clearing = search.clone();
        tokio::spawn(async move {
            tokio::time::sleep(DEFAULT_DEBOUNCE).await;
            clearing.clear_suggestions();
        });
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(source.calls().is_empty());
        assert_eq!(search.state(), SearchState::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_query_as_timer_fires_sends_nothing() {
        let (search, source) = search_with(FakeSource::default());
        let search = Arc::new(search);

        search.search_locations("rome", LocationType::Any);
        let typing = search.clone();
        tokio::spawn(async move {
            tokio::time::sleep(DEFAULT_DEBOUNCE).await;
            typing.search_locations("r", LocationType::Any);
        });
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(source.calls().is_empty());
        let state = search.state();
        assert_eq!(state.phase, SearchPhase::Idle);
        assert!(state.suggestions.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_as_timer_fires_skips_cached_result() {
        let source = Arc::new(FakeSource::default());
        let cache = SuggestionCache::new(Duration::from_secs(300), 100);
        let warm = LocationSearch::new(source.clone(), cache.clone(), SearchOptions::default());
        warm.search_locations("rome", LocationType::Any);
        tokio::time::sleep(SETTLE).await;
        assert_eq!(source.calls().len(), 1);

        let search = Arc::new(LocationSearch::new(source.clone(), cache, SearchOptions::default()));
        search.search_locations("rome", LocationType::Any);
        let clearing = search.clone();
        tokio::spawn(async move {
            tokio::time::sleep(DEFAULT_DEBOUNCE).await;
            clearing.clear_suggestions();
        });
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(source.calls().len(), 1);
        assert_eq!(search.state(), SearchState::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_as_timer_fires_sends_nothing() {
        let (search, source) = search_with(FakeSource::default());
        let updates = search.subscribe();

        search.search_locations("rome", LocationType::Any);
        tokio::spawn(async move {
            tokio::time::sleep(DEFAULT_DEBOUNCE).await;
            drop(search);
        });
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(source.calls().is_empty());
        assert!(updates.borrow().suggestions.is_empty());
    }

    #[tokio::test]
    async fn test_from_settings_queries_endpoint() {
        use wiremock::matchers::{method, path, query_param};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/locations"))
            .and(query_param("query", "zagreb"))
            .and(query_param("type", "CITY"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "data": [
                    { "id": "CZAG", "name": "ZAGREB", "subType": "CITY",
                      "address": { "cityName": "ZAGREB", "countryName": "CROATIA" } }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let settings = AutocompleteSettings {
            endpoint: format!("{}/locations", server.uri()),
            debounce_ms: 20,
            ..Default::default()
        };
        let search = LocationSearch::from_settings(HttpClient::new().unwrap(), &settings);
        let mut updates = search.subscribe();

        search.search_locations("zagreb", LocationType::City);
        let settled = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                updates.changed().await.unwrap();
                let state = updates.borrow_and_update().clone();
                if state.phase == SearchPhase::Succeeded {
                    return state;
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(settled.suggestions[0].display_name, "Zagreb, Croatia");
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_timer_and_request() {
        let (search, source) = search_with(FakeSource::default());
        let updates = search.subscribe();

        search.search_locations("rome", LocationType::Any);
        drop(search);
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(source.calls().is_empty());
        assert!(updates.borrow().suggestions.is_empty());
    }
}
