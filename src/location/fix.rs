// First-fix acquisition: race the one-shot fetch against the watch.
//
// A one-shot fetch can be slow when nothing is cached, and sometimes
// the watch delivers first, so both run concurrently and the first
// result wins. The combinator owns cancellation: whichever source
// loses is stopped exactly once (the watch via its stop signal, the
// one-shot by dropping its future), so there is no shared "resolved"
// flag and no double-cancellation path.

use tracing::debug;

use super::provider::{PositionError, PositionProvider, UserPositionSample};

/// Acquire the first position fix, first-result-wins.
///
/// A `Timeout` from either source is non-fatal while the other is
/// still pending; both timing out fails with `Timeout`. Any other
/// error (permission denial, provider failure) fails immediately.
/// Both sources are stopped before this returns, whatever the
/// outcome.
pub async fn first_fix(
    provider: &dyn PositionProvider,
) -> Result<UserPositionSample, PositionError> {
    let mut watch = provider.watch()?;
    let once = provider.get_once();
    tokio::pin!(once);

    let mut once_pending = true;
    let mut watch_pending = true;

    loop {
        tokio::select! {
            result = &mut once, if once_pending => {
                once_pending = false;
                match result {
                    Ok(sample) => {
                        debug!("one-shot fetch won the first-fix race");
                        watch.stop();
                        return Ok(sample);
                    }
                    Err(PositionError::Timeout) if watch_pending => {
                        debug!("one-shot fetch timed out, still waiting on watch");
                    }
                    Err(err) => {
                        watch.stop();
                        return Err(err);
                    }
                }
            }
            item = watch.next(), if watch_pending => {
                match item {
                    Some(Ok(sample)) => {
                        debug!("watch won the first-fix race");
                        watch.stop();
                        return Ok(sample);
                    }
                    Some(Err(PositionError::Timeout)) if once_pending => {
                        debug!("watch timed out, still waiting on one-shot fetch");
                    }
                    Some(Err(err)) => {
                        watch.stop();
                        return Err(err);
                    }
                    None => {
                        watch_pending = false;
                        if !once_pending {
                            return Err(PositionError::Timeout);
                        }
                    }
                }
            }
            else => return Err(PositionError::Timeout),
        }
    }
}
