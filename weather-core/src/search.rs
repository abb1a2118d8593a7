//! Search-as-you-type state for the location box.
//!
//! Keystrokes go through [`SearchController::set_query`], which debounces and
//! runs a best-effort suggestion lookup. [`SearchController::manual_search`]
//! skips the debounce and surfaces failures. Observers follow the state via
//! [`SearchController::subscribe`].
//!
//! Every committed lookup gets a sequence number. Results are applied only
//! while their number is still the latest, so a slow older request can never
//! overwrite a newer one.

use std::{sync::Arc, time::Duration};

use tokio::{sync::watch, task::JoinHandle};

use crate::{
    error::SearchError,
    geocode::{Geocoder, validate},
    model::Place,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSettings {
    pub debounce: Duration,
    pub min_query_len: usize,
    pub max_results: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self { debounce: Duration::from_millis(300), min_query_len: 3, max_results: 10 }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    /// Raw text as typed.
    pub query: String,
    /// Text of the last lookup that made it through the debounce.
    pub debounced_query: String,
    pub results: Vec<Place>,
    pub error: Option<SearchError>,
    pub loading: bool,
    lookup_seq: u64,
}

#[derive(Debug)]
pub struct SearchController {
    geocoder: Arc<dyn Geocoder>,
    settings: SearchSettings,
    state: Arc<watch::Sender<SearchState>>,
    pending: Option<JoinHandle<()>>,
}

impl SearchController {
    pub fn new(geocoder: Arc<dyn Geocoder>, settings: SearchSettings) -> Self {
        let (state, _) = watch::channel(SearchState::default());
        Self { geocoder, settings, state: Arc::new(state), pending: None }
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    pub fn state(&self) -> SearchState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.subscribe()
    }

    /// Record a keystroke. Must be called from within a tokio runtime.
    pub fn set_query(&mut self, text: impl Into<String>) {
        let text = text.into();
        let long_enough = text.trim().chars().count() >= self.settings.min_query_len;

        self.cancel_pending();

        self.state.send_modify(|s| {
            s.query = text.clone();
            s.error = None;
            if !long_enough {
                s.debounced_query.clear();
                s.results.clear();
                s.loading = false;
                s.lookup_seq += 1;
            }
        });

        if long_enough {
            self.schedule(text);
        }
    }

    /// Search right away, bypassing the debounce. Invalid input never reaches the network.
    pub async fn manual_search(&mut self, text: &str) -> Result<Vec<Place>, SearchError> {
        self.cancel_pending();

        let query = match validate(Some(text)) {
            Ok(q) => q.to_owned(),
            Err(err) => {
                self.state.send_modify(|s| {
                    s.error = Some(err.clone());
                    s.loading = false;
                });
                return Err(err);
            }
        };

        let mut seq = 0;
        self.state.send_modify(|s| {
            s.lookup_seq += 1;
            seq = s.lookup_seq;
            s.error = None;
            s.loading = true;
        });

        let max_results = self.settings.max_results;
        let outcome = self.geocoder.search(&query).await.map(|mut places| {
            places.truncate(max_results);
            places
        });

        self.state.send_if_modified(|s| {
            if s.lookup_seq != seq {
                return false;
            }
            s.loading = false;
            match &outcome {
                Ok(places) => s.results = places.clone(),
                Err(err) => {
                    s.results.clear();
                    s.error = Some(err.clone());
                }
            }
            true
        });

        outcome
    }

    /// One-off suggestion lookup, capped at `max_results`. Leaves the state alone.
    pub async fn suggest_now(&self, text: &str) -> Vec<Place> {
        let mut places = self.geocoder.suggest(text).await;
        places.truncate(self.settings.max_results);
        places
    }

    /// Reset to an empty search and drop anything still pending.
    pub fn clear(&mut self) {
        self.cancel_pending();
        self.state.send_modify(|s| {
            s.query.clear();
            s.debounced_query.clear();
            s.results.clear();
            s.error = None;
            s.loading = false;
            s.lookup_seq += 1;
        });
    }

    pub fn has_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }

    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    fn schedule(&mut self, text: String) {
        let state = Arc::clone(&self.state);
        let geocoder = Arc::clone(&self.geocoder);
        let delay = self.settings.debounce;
        let max_results = self.settings.max_results;

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let mut seq = 0;
            state.send_modify(|s| {
                s.lookup_seq += 1;
                seq = s.lookup_seq;
                s.debounced_query = text.clone();
                s.loading = true;
            });

            // Detached so that aborting the next timer leaves an in-flight lookup alone.
            tokio::spawn(run_suggestion(state, geocoder, text, seq, max_results));
        }));
    }
}

impl Drop for SearchController {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

async fn run_suggestion(
    state: Arc<watch::Sender<SearchState>>,
    geocoder: Arc<dyn Geocoder>,
    text: String,
    seq: u64,
    max_results: usize,
) {
    let mut places = geocoder.suggest(&text).await;
    places.truncate(max_results);

    let applied = state.send_if_modified(|s| {
        if s.lookup_seq != seq {
            return false;
        }
        s.results = places;
        s.loading = false;
        true
    });

    if !applied {
        tracing::debug!(query = %text, "discarding stale suggestions");
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, sync::Mutex};

    use async_trait::async_trait;

    use super::*;
    use crate::error::SearchErrorKind;

    #[derive(Debug, Default)]
    struct FakeGeocoder {
        calls: Mutex<Vec<String>>,
        responses: HashMap<String, (Duration, Result<Vec<Place>, SearchError>)>,
    }

    impl FakeGeocoder {
        fn respond(
            mut self,
            query: &str,
            delay_ms: u64,
            outcome: Result<Vec<Place>, SearchError>,
        ) -> Self {
            let delay = Duration::from_millis(delay_ms);
            self.responses.insert(query.to_string(), (delay, outcome));
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        async fn lookup(&self, text: &str) -> Result<Vec<Place>, SearchError> {
            match self.responses.get(text) {
                Some((delay, outcome)) => {
                    tokio::time::sleep(*delay).await;
                    outcome.clone()
                }
                None => Err(SearchError::NoResults(format!("No locations found for \"{text}\""))),
            }
        }
    }

    #[async_trait]
    impl Geocoder for FakeGeocoder {
        async fn search(&self, text: &str) -> Result<Vec<Place>, SearchError> {
            self.calls.lock().unwrap().push(format!("search:{text}"));
            self.lookup(text).await
        }

        async fn suggest(&self, text: &str) -> Vec<Place> {
            self.calls.lock().unwrap().push(format!("suggest:{text}"));
            self.lookup(text).await.unwrap_or_default()
        }
    }

    fn place(name: &str, lat: f64) -> Place {
        Place::new(name, "", "Testland", lat, 0.0)
    }

    fn controller(fake: FakeGeocoder) -> (SearchController, Arc<FakeGeocoder>) {
        let fake = Arc::new(fake);
        let geocoder: Arc<dyn Geocoder> = fake.clone();
        (SearchController::new(geocoder, SearchSettings::default()), fake)
    }

    /// Let the paused clock run forward and spawned tasks catch up.
    async fn settle(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn burst_of_keystrokes_triggers_one_lookup_with_latest_text() {
        let fake = FakeGeocoder::default()
            .respond("Lon", 0, Ok(vec![place("Long Beach", 1.0)]))
            .respond("Lond", 0, Ok(vec![place("London", 2.0)]));
        let (mut ctl, fake) = controller(fake);

        ctl.set_query("Lon");
        settle(50).await;
        ctl.set_query("Lond");
        assert!(fake.calls().is_empty());

        settle(400).await;

        assert_eq!(fake.calls(), ["suggest:Lond"]);
        let state = ctl.state();
        assert_eq!(state.debounced_query, "Lond");
        assert_eq!(state.results, vec![place("London", 2.0)]);
        assert!(!state.loading);
    }

    #[tokio::test(start_paused = true)]
    async fn nothing_fires_before_the_delay() {
        let (mut ctl, fake) = controller(FakeGeocoder::default());

        ctl.set_query("Madrid");
        settle(299).await;
        assert!(fake.calls().is_empty());
        assert!(ctl.has_pending());
        assert_eq!(ctl.state().query, "Madrid");
        assert_eq!(ctl.state().debounced_query, "");

        settle(10).await;
        assert_eq!(fake.calls(), ["suggest:Madrid"]);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_older_lookup_does_not_clobber_newer_results() {
        let fake = FakeGeocoder::default()
            .respond("Lon", 1_000, Ok(vec![place("London", 1.0)]))
            .respond("Par", 10, Ok(vec![place("Paris", 2.0)]));
        let (mut ctl, fake) = controller(fake);

        ctl.set_query("Lon");
        settle(350).await;
        assert!(ctl.state().loading);

        ctl.set_query("Par");
        settle(400).await;
        assert_eq!(ctl.state().results, vec![place("Paris", 2.0)]);

        settle(1_000).await;
        assert_eq!(fake.calls(), ["suggest:Lon", "suggest:Par"]);
        let state = ctl.state();
        assert_eq!(state.debounced_query, "Par");
        assert_eq!(state.results, vec![place("Paris", 2.0)]);
        assert!(!state.loading);
    }

    #[tokio::test(start_paused = true)]
    async fn short_query_cancels_pending_lookup_and_clears_results() {
        let fake = FakeGeocoder::default().respond("Berlin", 0, Ok(vec![place("Berlin", 1.0)]));
        let (mut ctl, fake) = controller(fake);

        ctl.set_query("Berlin");
        settle(400).await;
        assert_eq!(ctl.state().results.len(), 1);

        ctl.set_query("Berl");
        ctl.set_query("Be");
        let state = ctl.state();
        assert_eq!(state.query, "Be");
        assert_eq!(state.debounced_query, "");
        assert!(state.results.is_empty());
        assert!(!ctl.has_pending());

        settle(400).await;
        assert_eq!(fake.calls(), ["suggest:Berlin"]);
    }

    #[tokio::test(start_paused = true)]
    async fn results_are_truncated_to_max() {
        let many: Vec<_> =
            (0..15_i32).map(|i| place(&format!("Springfield {i}"), f64::from(i))).collect();
        let fake = FakeGeocoder::default().respond("Springfield", 0, Ok(many));
        let (mut ctl, _fake) = controller(fake);

        ctl.set_query("Springfield");
        settle(400).await;
        assert_eq!(ctl.state().results.len(), 10);

        let manual = ctl.manual_search("Springfield").await.unwrap();
        assert_eq!(manual.len(), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn suggest_now_is_capped_and_leaves_state_alone() {
        let many: Vec<_> =
            (0..12_i32).map(|i| place(&format!("Portland {i}"), f64::from(i))).collect();
        let fake = FakeGeocoder::default().respond("Portland", 0, Ok(many));
        let (ctl, fake) = controller(fake);

        let places = ctl.suggest_now("Portland").await;

        assert_eq!(places.len(), 10);
        assert_eq!(fake.calls(), ["suggest:Portland"]);
        assert_eq!(ctl.state(), SearchState::default());
    }

    #[tokio::test(start_paused = true)]
    async fn manual_search_skips_the_debounce() {
        let fake = FakeGeocoder::default().respond("Rome", 0, Ok(vec![place("Rome", 1.0)]));
        let (mut ctl, fake) = controller(fake);
        let started = tokio::time::Instant::now();

        ctl.set_query("Rome");
        let places = ctl.manual_search("Rome").await.unwrap();

        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(places, vec![place("Rome", 1.0)]);
        assert_eq!(fake.calls(), ["search:Rome"]);
        assert_eq!(ctl.state().results, places);

        // The keystroke's timer was dropped along the way.
        settle(400).await;
        assert_eq!(fake.calls(), ["search:Rome"]);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_search_rejects_invalid_input_without_network() {
        let (mut ctl, fake) = controller(FakeGeocoder::default());

        let err = ctl.manual_search("<script>alert(1)</script>").await.unwrap_err();
        assert_eq!(err.kind(), SearchErrorKind::InvalidInput);
        assert_eq!(ctl.state().error, Some(err));
        assert!(fake.calls().is_empty());

        let err = ctl.manual_search(" x ").await.unwrap_err();
        assert_eq!(err.kind(), SearchErrorKind::InvalidInput);
        assert!(fake.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn manual_search_records_and_returns_failures() {
        let rate_limited =
            SearchError::Api("API rate limit exceeded. Please try again later.".into());
        let fake = FakeGeocoder::default().respond("Quito", 0, Err(rate_limited));
        let (mut ctl, _fake) = controller(fake);

        let err = ctl.manual_search("Quito").await.unwrap_err();
        assert_eq!(err.kind(), SearchErrorKind::Api);

        let state = ctl.state();
        assert_eq!(state.error, Some(err));
        assert!(!state.loading);

        // Typing again clears the failure.
        ctl.set_query("Quit");
        assert_eq!(ctl.state().error, None);
    }

    #[tokio::test(start_paused = true)]
    async fn suggestion_failures_never_surface() {
        let fake = FakeGeocoder::default()
            .respond("Nowhere", 0, Err(SearchError::Network("connection refused".into())));
        let (mut ctl, fake) = controller(fake);

        ctl.set_query("Nowhere");
        settle(400).await;

        assert_eq!(fake.calls(), ["suggest:Nowhere"]);
        let state = ctl.state();
        assert!(state.results.is_empty());
        assert_eq!(state.error, None);
    }

    #[tokio::test(start_paused = true)]
    async fn short_query_discards_lookup_in_flight() {
        let fake = FakeGeocoder::default().respond("London", 1_000, Ok(vec![place("London", 1.0)]));
        let (mut ctl, fake) = controller(fake);

        ctl.set_query("London");
        settle(350).await;
        assert_eq!(fake.calls(), ["suggest:London"]);
        assert!(ctl.state().loading);

        ctl.set_query("Lo");
        settle(1_500).await;

        let state = ctl.state();
        assert_eq!(state.query, "Lo");
        assert_eq!(state.debounced_query, "");
        assert!(state.results.is_empty());
        assert!(!state.loading);
    }

    #[tokio::test(start_paused = true)]
    async fn clear_discards_lookup_in_flight() {
        let fake = FakeGeocoder::default().respond("Lisbon", 1_000, Ok(vec![place("Lisbon", 1.0)]));
        let (mut ctl, fake) = controller(fake);

        ctl.set_query("Lisbon");
        settle(350).await;
        assert_eq!(fake.calls(), ["suggest:Lisbon"]);
        assert!(ctl.state().loading);

        ctl.clear();
        settle(1_500).await;

        let state = ctl.state();
        assert_eq!(state.query, "");
        assert_eq!(state.debounced_query, "");
        assert!(state.results.is_empty());
        assert!(!state.loading);
    }

    #[tokio::test(start_paused = true)]
    async fn clear_resets_state_and_cancels_timer() {
        let fake = FakeGeocoder::default().respond("Lima", 0, Ok(vec![place("Lima", 1.0)]));
        let (mut ctl, fake) = controller(fake);

        ctl.set_query("Lima");
        settle(400).await;
        ctl.set_query("Limassol");
        ctl.clear();

        let state = ctl.state();
        assert_eq!(state.query, "");
        assert_eq!(state.debounced_query, "");
        assert!(state.results.is_empty());
        assert_eq!(state.error, None);

        settle(400).await;
        assert_eq!(fake.calls(), ["suggest:Lima"]);
    }

    #[tokio::test(start_paused = true)]
    async fn subscribers_see_committed_results() {
        let fake = FakeGeocoder::default().respond("Oslo", 0, Ok(vec![place("Oslo", 1.0)]));
        let (mut ctl, _fake) = controller(fake);
        let mut rx = ctl.subscribe();

        ctl.set_query("Oslo");
        let state = rx
            .wait_for(|s| !s.loading && !s.results.is_empty())
            .await
            .unwrap()
            .clone();

        assert_eq!(state.debounced_query, "Oslo");
        assert_eq!(state.results[0].name(), "Oslo");
    }
}
