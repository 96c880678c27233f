// Content refresh scheduling.
//
// Panning and zooming fire refresh requests far faster than the
// backend should see them. Three rules keep that in check:
//
// 1. Until the minimum app-load window completes, requests are not
//    dropped — the same request is re-armed on a short poll timer, and
//    only the latest pending timer survives, so the first refresh is
//    guaranteed to fire exactly once when load finishes.
// 2. After load, at most one search per cool-down window unless the
//    caller overrides the throttle (e.g. an explicit recenter).
// 3. Search failures are logged and dropped; the next window retries
//    naturally.
//
// Shared across tasks via Clone (Arc'd interior), like the API rate
// limiter this is modeled on.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{debug, info, warn};

use super::service::{ContentSearchService, OwnerScope, SearchQuery};
use crate::content::GeofencedContent;
use crate::geo::GeoPoint;
use crate::throttle::ThrottleWindow;

/// Default minimum time between backend searches.
pub const DEFAULT_REFRESH_COOLDOWN: Duration = Duration::from_secs(30);

/// How long to wait before re-checking whether the minimum app-load
/// window has completed.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Default page size for the connections layer.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Default page size for the caller's own layer.
pub const DEFAULT_ME_PAGE_SIZE: u32 = 50;

/// A map-driven request to re-search nearby content.
#[derive(Debug, Clone, Copy)]
pub struct RefreshRequest {
    /// Bypass the cool-down (the search still records a firing).
    pub override_throttle: bool,
    pub center: GeoPoint,
    pub radius_meters: f64,
    /// When true, search every active layer; otherwise only the
    /// caller's own content.
    pub search_all_layers: bool,
}

/// One layer's worth of search results, forwarded to the content cache.
#[derive(Debug)]
pub struct SearchResults {
    pub scope: OwnerScope,
    pub items: Vec<GeofencedContent>,
}

struct SchedulerInner {
    min_load_complete: bool,
    window: ThrottleWindow,
    pending: Option<JoinHandle<()>>,
}

/// Rate-limits and defers nearby-content searches.
#[derive(Clone)]
pub struct RefreshScheduler {
    inner: Arc<Mutex<SchedulerInner>>,
    search: Arc<dyn ContentSearchService>,
    results: mpsc::UnboundedSender<SearchResults>,
    poll_interval: Duration,
    page_size: u32,
    me_page_size: u32,
}

impl RefreshScheduler {
    pub fn new(
        search: Arc<dyn ContentSearchService>,
        results: mpsc::UnboundedSender<SearchResults>,
        cooldown: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SchedulerInner {
                min_load_complete: false,
                window: ThrottleWindow::new(cooldown),
                pending: None,
            })),
            search,
            results,
            poll_interval: DEFAULT_POLL_INTERVAL,
            page_size: DEFAULT_PAGE_SIZE,
            me_page_size: DEFAULT_ME_PAGE_SIZE,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_page_sizes(mut self, page_size: u32, me_page_size: u32) -> Self {
        self.page_size = page_size;
        self.me_page_size = me_page_size;
        self
    }

    /// Mark the minimum app-load window complete. Any pending
    /// reschedule timer will observe this on its next tick.
    pub fn mark_load_complete(&self) {
        self.inner.lock().unwrap().min_load_complete = true;
    }

    /// Request a refresh of nearby content.
    ///
    /// Never blocks: the search itself runs on a spawned task. During
    /// the load window the request is re-armed rather than dropped;
    /// concurrent re-arms coalesce so only the latest survives.
    pub fn request_refresh(&self, request: RefreshRequest) {
        let mut inner = self.inner.lock().unwrap();

        // Only the latest pending reschedule survives.
        if let Some(pending) = inner.pending.take() {
            pending.abort();
        }

        if !inner.min_load_complete {
            let scheduler = self.clone();
            inner.pending = Some(tokio::spawn(async move {
                tokio::time::sleep(scheduler.poll_interval).await;
                scheduler.request_refresh(request);
            }));
            return;
        }

        if request.override_throttle {
            inner.window.fire();
        } else if !inner.window.try_fire() {
            debug!("refresh suppressed by cooldown");
            return;
        }
        drop(inner);

        let scheduler = self.clone();
        tokio::spawn(async move {
            scheduler.run_search(request).await;
        });
    }

    /// Cancel any pending reschedule timer. Call on teardown so no
    /// timer fires against a disposed screen.
    pub fn dispose(&self) {
        if let Some(pending) = self.inner.lock().unwrap().pending.take() {
            pending.abort();
        }
    }

    async fn run_search(&self, request: RefreshRequest) {
        let scopes: &[OwnerScope] = if request.search_all_layers {
            &[OwnerScope::Me, OwnerScope::Connections]
        } else {
            &[OwnerScope::Me]
        };

        for &scope in scopes {
            let page_size = match scope {
                OwnerScope::Me => self.me_page_size,
                OwnerScope::Connections => self.page_size,
            };
            let query = SearchQuery {
                scope,
                center: request.center,
                radius_meters: request.radius_meters,
                page: 1,
                page_size,
            };
            match self.search.search(query).await {
                Ok(items) => {
                    info!(?scope, count = items.len(), "content search resolved");
                    let _ = self.results.send(SearchResults { scope, items });
                }
                Err(err) => {
                    warn!(?scope, error = %err, "content search failed, will retry next window");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Default)]
    struct CountingSearch {
        calls: AtomicU32,
        fail: bool,
    }

    #[async_trait]
    impl ContentSearchService for CountingSearch {
        async fn search(&self, _query: SearchQuery) -> Result<Vec<GeofencedContent>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("search backend down");
            }
            Ok(vec![])
        }
    }

    fn request(override_throttle: bool) -> RefreshRequest {
        RefreshRequest {
            override_throttle,
            center: GeoPoint::new(0.0, 0.0),
            radius_meters: 1_100.0,
            search_all_layers: false,
        }
    }

    fn scheduler(
        search: Arc<CountingSearch>,
    ) -> (
        RefreshScheduler,
        mpsc::UnboundedReceiver<SearchResults>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            RefreshScheduler::new(search, tx, Duration::from_secs(30)),
            rx,
        )
    }

    async fn settle() {
        // Let spawned search/reschedule tasks run (paused time advances
        // through their sleeps automatically).
        tokio::time::sleep(Duration::from_millis(200)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_deferred_until_load_completes() {
        let search = Arc::new(CountingSearch::default());
        let (scheduler, _rx) = scheduler(search.clone());

        scheduler.request_refresh(request(false));
        settle().await;
        assert_eq!(search.calls.load(Ordering::SeqCst), 0, "load not complete");

        scheduler.mark_load_complete();
        settle().await;
        assert_eq!(search.calls.load(Ordering::SeqCst), 1, "fires once after load");
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_during_load_coalesces_to_one_search() {
        let search = Arc::new(CountingSearch::default());
        let (scheduler, _rx) = scheduler(search.clone());

        // Three requests within the load window: only the latest
        // pending timer survives.
        scheduler.request_refresh(request(false));
        scheduler.request_refresh(request(false));
        scheduler.request_refresh(request(false));

        scheduler.mark_load_complete();
        settle().await;
        assert_eq!(search.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cooldown_suppresses_repeat_refresh() {
        let search = Arc::new(CountingSearch::default());
        let (scheduler, _rx) = scheduler(search.clone());
        scheduler.mark_load_complete();

        scheduler.request_refresh(request(false));
        settle().await;
        scheduler.request_refresh(request(false));
        settle().await;
        assert_eq!(search.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_override_bypasses_cooldown() {
        let search = Arc::new(CountingSearch::default());
        let (scheduler, _rx) = scheduler(search.clone());
        scheduler.mark_load_complete();

        scheduler.request_refresh(request(false));
        settle().await;
        scheduler.request_refresh(request(true));
        settle().await;
        assert_eq!(search.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_allowed_after_cooldown() {
        let search = Arc::new(CountingSearch::default());
        let (scheduler, _rx) = scheduler(search.clone());
        scheduler.mark_load_complete();

        scheduler.request_refresh(request(false));
        settle().await;
        tokio::time::advance(Duration::from_secs(31)).await;
        scheduler.request_refresh(request(false));
        settle().await;
        assert_eq!(search.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_layers_searches_both_scopes() {
        let search = Arc::new(CountingSearch::default());
        let (scheduler, mut rx) = scheduler(search.clone());
        scheduler.mark_load_complete();

        let mut req = request(false);
        req.search_all_layers = true;
        scheduler.request_refresh(req);
        settle().await;

        assert_eq!(search.calls.load(Ordering::SeqCst), 2);
        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.scope, OwnerScope::Me);
        assert_eq!(second.scope, OwnerScope::Connections);
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_failure_is_silent_and_window_still_advances() {
        let search = Arc::new(CountingSearch {
            calls: AtomicU32::new(0),
            fail: true,
        });
        let (scheduler, _rx) = scheduler(search.clone());
        scheduler.mark_load_complete();

        scheduler.request_refresh(request(false));
        settle().await;
        // Failed search still consumed this window.
        scheduler.request_refresh(request(false));
        settle().await;
        assert_eq!(search.calls.load(Ordering::SeqCst), 1);

        // The next window retries naturally.
        tokio::time::advance(Duration::from_secs(31)).await;
        scheduler.request_refresh(request(false));
        settle().await;
        assert_eq!(search.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispose_cancels_pending_timer() {
        let search = Arc::new(CountingSearch::default());
        let (scheduler, _rx) = scheduler(search.clone());

        scheduler.request_refresh(request(false));
        scheduler.dispose();
        scheduler.mark_load_complete();
        settle().await;
        assert_eq!(
            search.calls.load(Ordering::SeqCst),
            0,
            "disposed timer must not fire"
        );
    }
}
