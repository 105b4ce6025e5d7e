//! Debounce gate for keystroke-driven queries

use crate::locations::LocationType;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// Default quiet interval before a query is dispatched
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Queries shorter than this (in characters) are never dispatched
pub const MIN_QUERY_LEN: usize = 2;

/// Outcome of [`DebounceGate::schedule`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// A timer is armed and will fire unless superseded
    Armed,
    /// Query too short; any pending timer was cancelled and nothing was armed
    Skipped,
}

#[derive(Default)]
struct Slot {
    timer: Option<JoinHandle<()>>,
    armed: u64,
}

impl Slot {
    /// Abort the pending timer and invalidate it if it already woke up
    fn disarm(&mut self) -> bool {
        self.armed += 1;
        match self.timer.take() {
            Some(timer) => {
                let waiting = !timer.is_finished();
                timer.abort();
                waiting
            }
            None => false,
        }
    }
}

/// Collapses bursts of queries into a single dispatch
///
/// Holds at most one pending timer. Must be used from within a tokio runtime.
pub struct DebounceGate {
    delay: Duration,
    min_query_len: usize,
    slot: Arc<Mutex<Slot>>,
}

impl DebounceGate {
    pub fn new(delay: Duration, min_query_len: usize) -> Self {
        Self {
            delay,
            min_query_len,
            slot: Arc::default(),
        }
    }

    /// Cancel any pending timer and arm a new one for `query`
    ///
    /// `fire` runs exactly once, after the quiet interval, unless another
    /// call to `schedule` or [`cancel`](Self::cancel) happens first. It runs
    /// under the gate lock, so a `cancel` that returns has either prevented
    /// it or happened strictly after it.
    pub fn schedule<F>(&self, query: &str, location_type: LocationType, fire: F) -> Schedule
    where
        F: FnOnce(String, LocationType) + Send + 'static,
    {
        let mut slot = lock(&self.slot);
        slot.disarm();

        if query.chars().count() < self.min_query_len {
            debug!("Query {:?} below minimum length, not scheduling", query);
            return Schedule::Skipped;
        }

        let armed = slot.armed;
        let delay = self.delay;
        let query = query.to_string();
        let shared = self.slot.clone();
        slot.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut slot = lock(&shared);
            if slot.armed != armed {
                return;
            }
            slot.timer = None;
            debug!("Debounce elapsed for {:?} ({})", query, location_type);
            fire(query, location_type);
        }));

        Schedule::Armed
    }

    /// Cancel the pending timer, returning whether one was still waiting
    pub fn cancel(&self) -> bool {
        lock(&self.slot).disarm()
    }

    /// Whether a timer is armed and has not fired yet
    pub fn is_pending(&self) -> bool {
        lock(&self.slot)
            .timer
            .as_ref()
            .map(|timer| !timer.is_finished())
            .unwrap_or(false)
    }
}

fn lock(slot: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
    slot.lock().unwrap_or_else(|e| e.into_inner())
}

impl Default for DebounceGate {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE, MIN_QUERY_LEN)
    }
}

impl Drop for DebounceGate {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Fired = Arc<Mutex<Vec<(String, LocationType)>>>;

    fn recorder(fired: &Fired) -> impl FnOnce(String, LocationType) + Send + 'static {
        let fired = fired.clone();
        move |query, location_type| fired.lock().unwrap().push((query, location_type))
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_once_after_quiet_interval() {
        let gate = DebounceGate::default();
        let fired = Fired::default();

        assert_eq!(gate.schedule("rome", LocationType::Any, recorder(&fired)), Schedule::Armed);
        assert!(gate.is_pending());

        tokio::time::sleep(Duration::from_millis(299)).await;
        assert!(fired.lock().unwrap().is_empty());

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(*fired.lock().unwrap(), vec![("rome".to_string(), LocationType::Any)]);
        assert!(!gate.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_collapses_to_last_query() {
        let gate = DebounceGate::default();
        let fired = Fired::default();

        for query in ["pa", "par", "pari", "paris"] {
            gate.schedule(query, LocationType::City, recorder(&fired));
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        tokio::time::sleep(Duration::from_millis(500)).await;

        assert_eq!(*fired.lock().unwrap(), vec![("paris".to_string(), LocationType::City)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_query_cancels_pending_timer() {
        let gate = DebounceGate::default();
        let fired = Fired::default();

        gate.schedule("rome", LocationType::Any, recorder(&fired));
        assert_eq!(gate.schedule("r", LocationType::Any, recorder(&fired)), Schedule::Skipped);
        assert_eq!(gate.schedule("", LocationType::Any, recorder(&fired)), Schedule::Skipped);
        assert!(!gate.is_pending());

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(fired.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_and_drop() {
        let gate = DebounceGate::default();
        let fired = Fired::default();

        gate.schedule("rome", LocationType::Any, recorder(&fired));
        assert!(gate.cancel());
        assert!(!gate.cancel());

        let dropped = DebounceGate::default();
        dropped.schedule("oslo", LocationType::Any, recorder(&fired));
        drop(dropped);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(fired.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_after_fire_reports_nothing_pending() {
        let gate = DebounceGate::default();
        let fired = Fired::default();

        gate.schedule("rome", LocationType::Any, recorder(&fired));
        tokio::time::sleep(Duration::from_millis(400)).await;

        assert!(!gate.cancel());
        assert_eq!(fired.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_min_length_counts_characters() {
        let gate = DebounceGate::default();
        let fired = Fired::default();

        assert_eq!(gate.schedule("é", LocationType::Any, recorder(&fired)), Schedule::Skipped);
        assert_eq!(gate.schedule("ré", LocationType::Any, recorder(&fired)), Schedule::Armed);
    }
}
