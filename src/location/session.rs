// Live location session: the glue from provider to filtered stream.
//
// A session acquires its first fix with the dual-source race, then
// drives a fresh watch subscription through the sample filter and the
// report throttle. Teardown is a single dispose() call; after it, no
// further samples are surfaced and the watch subscription is released.

use tracing::{debug, info};

use super::filter::SampleFilter;
use super::fix::first_fix;
use super::provider::{PositionError, PositionProvider, PositionWatch};
use super::report::LocationReporter;
use crate::geo::GeoPoint;

/// A live position session in the `Live` state (construction runs the
/// `AwaitingFirstFix` race to completion).
pub struct LocationSession {
    watch: Option<PositionWatch>,
    filter: SampleFilter,
    reporter: LocationReporter,
    current: GeoPoint,
}

impl LocationSession {
    /// Race both acquisition sources for a first fix, report it, and
    /// open the live watch.
    ///
    /// The first fix is reported immediately (subject to the reporter's
    /// cooldown) so a brand-new user posts a position and receives
    /// initial content without waiting to move.
    pub async fn start(
        provider: &dyn PositionProvider,
        mut filter: SampleFilter,
        mut reporter: LocationReporter,
    ) -> Result<Self, PositionError> {
        let fix = first_fix(provider).await?;
        info!(
            latitude = fix.coords.latitude,
            longitude = fix.coords.longitude,
            "first fix acquired"
        );

        filter.offer(fix);
        reporter.offer(fix.coords).await;

        let watch = provider.watch()?;
        Ok(Self {
            watch: Some(watch),
            filter,
            reporter,
            current: fix.coords,
        })
    }

    /// The most recent known position (first fix or last accepted
    /// sample).
    pub fn position(&self) -> GeoPoint {
        self.current
    }

    /// Wait for the next accepted position. Rejected samples are
    /// consumed silently; watch timeouts are ignored (the subscription
    /// stays live); any other provider error surfaces. `None` once the
    /// session is disposed or the provider shuts down.
    pub async fn next_position(&mut self) -> Option<Result<GeoPoint, PositionError>> {
        loop {
            let watch = self.watch.as_mut()?;
            match watch.next().await {
                Some(Ok(sample)) => {
                    if self.filter.offer(sample).is_accepted() {
                        self.current = sample.coords;
                        self.reporter.offer(sample.coords).await;
                        return Some(Ok(sample.coords));
                    }
                }
                Some(Err(PositionError::Timeout)) => {
                    debug!("watch timeout, keeping subscription alive");
                }
                Some(Err(err)) => return Some(Err(err)),
                None => {
                    self.watch = None;
                    return None;
                }
            }
        }
    }

    /// Tear the session down: stop the watch and discard anything
    /// still in flight. Idempotent.
    pub fn dispose(&mut self) {
        if let Some(mut watch) = self.watch.take() {
            watch.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::filter::SpeedFilterMode;
    use crate::location::provider::UserPositionSample;
    use crate::location::telemetry::{LocationTelemetryService, LocationUpdate};
    use anyhow::Result;
    use async_trait::async_trait;
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tokio::sync::{mpsc, oneshot};
    use tokio::time::Duration;

    #[derive(Default)]
    struct CountingTelemetry {
        posts: AtomicU32,
    }

    #[async_trait]
    impl LocationTelemetryService for CountingTelemetry {
        async fn post_location(&self, _update: LocationUpdate) -> Result<()> {
            self.posts.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Provider whose one-shot resolves instantly and whose watch is
    /// fed by the test through a channel.
    struct ChannelProvider {
        fix: UserPositionSample,
        feed: std::sync::Mutex<Vec<mpsc::Sender<Result<UserPositionSample, PositionError>>>>,
    }

    impl ChannelProvider {
        fn new(fix: UserPositionSample) -> Self {
            Self {
                fix,
                feed: std::sync::Mutex::new(Vec::new()),
            }
        }

        /// Sender for the most recently opened watch.
        fn live_sender(&self) -> mpsc::Sender<Result<UserPositionSample, PositionError>> {
            self.feed.lock().unwrap().last().unwrap().clone()
        }
    }

    #[async_trait]
    impl PositionProvider for ChannelProvider {
        async fn get_once(&self) -> Result<UserPositionSample, PositionError> {
            Ok(self.fix)
        }

        fn watch(&self) -> Result<PositionWatch, PositionError> {
            let (tx, rx) = mpsc::channel(16);
            let (stop_tx, _stop_rx) = oneshot::channel();
            self.feed.lock().unwrap().push(tx);
            Ok(PositionWatch::new(rx, stop_tx))
        }
    }

    fn sample_at(meters_north: f64, seconds: i64) -> UserPositionSample {
        let t0 = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        UserPositionSample::new(
            GeoPoint::new(meters_north / 111_195.0, 0.0),
            t0 + ChronoDuration::seconds(seconds),
        )
    }

    fn reporter(telemetry: Arc<CountingTelemetry>) -> LocationReporter {
        LocationReporter::new(telemetry, Duration::from_secs(30))
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_reports_first_fix() {
        let telemetry = Arc::new(CountingTelemetry::default());
        let provider = ChannelProvider::new(sample_at(0.0, 0));

        let session = LocationSession::start(
            &provider,
            SampleFilter::default(),
            reporter(telemetry.clone()),
        )
        .await
        .unwrap();

        assert_eq!(session.position().latitude, 0.0);
        assert_eq!(telemetry.posts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_live_samples_flow_through_filter() {
        let telemetry = Arc::new(CountingTelemetry::default());
        let provider = ChannelProvider::new(sample_at(0.0, 0));
        let mut session = LocationSession::start(
            &provider,
            SampleFilter::new(5.0, 15.0, SpeedFilterMode::Corrected),
            reporter(telemetry.clone()),
        )
        .await
        .unwrap();

        let tx = provider.live_sender();
        // Jitter (2 m), teleport (500 m in 1 s from the fix), then a walk.
        tx.send(Ok(sample_at(2.0, 10))).await.unwrap();
        tx.send(Ok(sample_at(500.0, 11))).await.unwrap();
        tx.send(Ok(sample_at(100.0, 60))).await.unwrap();

        let accepted = session.next_position().await.unwrap().unwrap();
        assert!(
            (accepted.latitude - 100.0 / 111_195.0).abs() < 1e-9,
            "only the walking-pace sample should surface"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_timeout_keeps_session_alive() {
        let telemetry = Arc::new(CountingTelemetry::default());
        let provider = ChannelProvider::new(sample_at(0.0, 0));
        let mut session = LocationSession::start(
            &provider,
            SampleFilter::default(),
            reporter(telemetry),
        )
        .await
        .unwrap();

        let tx = provider.live_sender();
        tx.send(Err(PositionError::Timeout)).await.unwrap();
        tx.send(Ok(sample_at(100.0, 60))).await.unwrap();

        assert!(session.next_position().await.unwrap().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_hard_error_surfaces() {
        let telemetry = Arc::new(CountingTelemetry::default());
        let provider = ChannelProvider::new(sample_at(0.0, 0));
        let mut session = LocationSession::start(
            &provider,
            SampleFilter::default(),
            reporter(telemetry),
        )
        .await
        .unwrap();

        provider
            .live_sender()
            .send(Err(PositionError::PermissionDenied))
            .await
            .unwrap();

        assert_eq!(
            session.next_position().await.unwrap().unwrap_err(),
            PositionError::PermissionDenied
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispose_discards_outstanding_samples() {
        let telemetry = Arc::new(CountingTelemetry::default());
        let provider = ChannelProvider::new(sample_at(0.0, 0));
        let mut session = LocationSession::start(
            &provider,
            SampleFilter::default(),
            reporter(telemetry),
        )
        .await
        .unwrap();

        let tx = provider.live_sender();
        tx.send(Ok(sample_at(100.0, 60))).await.unwrap();

        session.dispose();
        session.dispose(); // idempotent
        assert!(session.next_position().await.is_none());
    }
}
