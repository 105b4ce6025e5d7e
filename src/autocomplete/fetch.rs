//! Cancellable fetch against the location search endpoint

use crate::locations::{normalize_all, LocationType, RawRecord, SearchError, Suggestion};
use crate::network::HttpClient;
use async_trait::async_trait;
use futures::future::{AbortHandle, AbortRegistration, Abortable, BoxFuture, FutureExt};
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

/// Message used when the endpoint fails without saying why
pub const DEFAULT_UPSTREAM_ERROR: &str = "Failed to search locations";

/// Trait for location search endpoints
#[async_trait]
pub trait LocationSource: Send + Sync {
    /// Fetch raw records for a query
    async fn search(
        &self,
        query: &str,
        location_type: LocationType,
    ) -> Result<Vec<RawRecord>, SearchError>;
}

/// Search endpoint reached over HTTP
///
/// `GET <endpoint>?query=<text>&type=<ANY|CITY|AIRPORT>`, answering
/// `{ "success": bool, "data": [...] }`.
pub struct HttpLocationSource {
    client: HttpClient,
    endpoint: String,
}

impl HttpLocationSource {
    pub fn new(client: HttpClient, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchBody {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<Vec<RawRecord>>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

#[async_trait]
impl LocationSource for HttpLocationSource {
    async fn search(
        &self,
        query: &str,
        location_type: LocationType,
    ) -> Result<Vec<RawRecord>, SearchError> {
        let response = self
            .client
            .get_with_params(
                &self.endpoint,
                &[("query", query), ("type", location_type.as_str())],
            )
            .await
            .map_err(|e| SearchError::Network(e.to_string()))?;

        if !response.is_success() {
            let message = response
                .json::<ErrorBody>()
                .ok()
                .and_then(|body| body.error)
                .unwrap_or_else(|| DEFAULT_UPSTREAM_ERROR.to_string());
            warn!("Location search returned {}: {}", response.status, message);
            return Err(SearchError::Upstream(message));
        }

        let body: SearchBody = response
            .json()
            .map_err(|e| SearchError::Upstream(format!("Malformed search response: {}", e)))?;

        match body.data {
            Some(data) if body.success => Ok(data),
            _ => Ok(vec![]),
        }
    }
}

/// Handle to one issued request
#[derive(Debug, Clone)]
pub struct RequestHandle {
    generation: u64,
    abort: AbortHandle,
}

impl RequestHandle {
    /// Issue order of this request; higher is newer
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Abort the request; its result will be discarded
    pub fn cancel(&self) {
        self.abort.abort();
    }

    pub fn is_cancelled(&self) -> bool {
        self.abort.is_aborted()
    }
}

#[derive(Default)]
struct Tracker {
    latest: AtomicU64,
    in_flight: Mutex<Option<RequestHandle>>,
}

impl Tracker {
    /// Cancel the tracked request and advance the latest marker
    fn advance(&self, next: Option<AbortHandle>) -> u64 {
        let mut in_flight = self.lock();
        self.advance_locked(&mut in_flight, next)
    }

    /// Like [`advance`](Self::advance), but only while `expected` is still the latest
    fn advance_from(&self, expected: u64, next: AbortHandle) -> Option<u64> {
        let mut in_flight = self.lock();
        if !self.is_current(expected) {
            return None;
        }
        Some(self.advance_locked(&mut in_flight, Some(next)))
    }

    fn advance_locked(&self, in_flight: &mut Option<RequestHandle>, next: Option<AbortHandle>) -> u64 {
        if let Some(previous) = in_flight.take() {
            debug!("Cancelling superseded request #{}", previous.generation);
            previous.cancel();
        }
        let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        *in_flight = next.map(|abort| RequestHandle { generation, abort });
        generation
    }

    fn lock(&self) -> MutexGuard<'_, Option<RequestHandle>> {
        self.in_flight.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn finish(&self, generation: u64) {
        let mut in_flight = self.lock();
        if in_flight.as_ref().map(|h| h.generation) == Some(generation) {
            *in_flight = None;
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == generation
    }
}

/// Issues searches, tracking exactly one in-flight request
pub struct CancellableFetch {
    source: Arc<dyn LocationSource>,
    tracker: Arc<Tracker>,
}

impl CancellableFetch {
    pub fn new(source: Arc<dyn LocationSource>) -> Self {
        Self {
            source,
            tracker: Arc::new(Tracker::default()),
        }
    }

    /// Cancel the in-flight request (if any) and issue a new one
    ///
    /// Nothing is sent until the returned [`PendingFetch`] is awaited.
    pub fn issue(&self, query: &str, location_type: LocationType) -> PendingFetch {
        let (abort, registration) = AbortHandle::new_pair();
        let generation = self.tracker.advance(Some(abort.clone()));
        self.pending(generation, abort, registration, query, location_type)
    }

    /// Issue a request only if nothing has superseded `ticket`
    ///
    /// `ticket` is a marker from [`supersede`](Self::supersede). Returns
    /// `None`, sending nothing, once a newer marker or request exists.
    pub fn issue_if_current(
        &self,
        ticket: u64,
        query: &str,
        location_type: LocationType,
    ) -> Option<PendingFetch> {
        let (abort, registration) = AbortHandle::new_pair();
        let generation = self.tracker.advance_from(ticket, abort.clone())?;
        Some(self.pending(generation, abort, registration, query, location_type))
    }

    fn pending(
        &self,
        generation: u64,
        abort: AbortHandle,
        registration: AbortRegistration,
        query: &str,
        location_type: LocationType,
    ) -> PendingFetch {
        debug!("Issuing request #{} for {:?} ({})", generation, query, location_type);

        let source = self.source.clone();
        let query = query.to_string();
        let future = async move {
            let records = source.search(&query, location_type).await?;
            Ok(normalize_all(&records))
        }
        .boxed();

        PendingFetch {
            handle: RequestHandle { generation, abort },
            future: Abortable::new(future, registration),
            tracker: self.tracker.clone(),
        }
    }

    /// Cancel the in-flight request without issuing a new one
    ///
    /// Returns the new latest generation; anything issued earlier is stale.
    pub fn supersede(&self) -> u64 {
        self.tracker.advance(None)
    }

    /// Whether `generation` is the most recently issued marker
    pub fn is_current(&self, generation: u64) -> bool {
        self.tracker.is_current(generation)
    }

    /// Whether a request is outstanding
    pub fn in_flight(&self) -> bool {
        self.tracker.lock().is_some()
    }
}

/// A request that has been issued but not yet settled
pub struct PendingFetch {
    handle: RequestHandle,
    future: Abortable<BoxFuture<'static, Result<Vec<Suggestion>, SearchError>>>,
    tracker: Arc<Tracker>,
}

impl PendingFetch {
    pub fn handle(&self) -> &RequestHandle {
        &self.handle
    }

    pub fn generation(&self) -> u64 {
        self.handle.generation
    }

    /// Drive the request to completion
    ///
    /// Fails with [`SearchError::Cancelled`] if it was aborted or a newer
    /// request was issued before it settled.
    pub async fn wait(self) -> Result<Vec<Suggestion>, SearchError> {
        let generation = self.handle.generation;
        let outcome = self.future.await;
        self.tracker.finish(generation);

        match outcome {
            Err(_aborted) => Err(SearchError::Cancelled),
            Ok(_) if !self.tracker.is_current(generation) => Err(SearchError::Cancelled),
            Ok(result) => result,
        }
    }
}
