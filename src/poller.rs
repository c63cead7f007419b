use std::future::Future;
use std::time::Duration;

use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::client::ScanApi;
use crate::error::{ClientError, Result};
use crate::types::ScanSnapshot;

/// Follow a scan until the backend reports a terminal status.
///
/// - Fetches immediately, then once per `every`.
/// - Every snapshot received is handed to `on_update`, the terminal one included.
/// - Returns the first terminal snapshot; no request is issued after it.
/// - A failed poll is logged and skipped; the next tick tries again.
/// - Cancelling `cancel` ends the watch with [`ClientError::Cancelled`].
pub async fn watch_scan<A, F>(
    api: &A,
    scan_id: &str,
    every: Duration,
    cancel: &CancellationToken,
    mut on_update: F,
) -> Result<ScanSnapshot>
where
    A: ScanApi + ?Sized,
    F: FnMut(&ScanSnapshot),
{
    // interval() panics on a zero period.
    let mut ticker = time::interval(every.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut polls: u64 = 0;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ClientError::Cancelled),
            _ = ticker.tick() => {}
        }

        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ClientError::Cancelled),
            res = api.get_scan(scan_id) => res,
        };
        polls += 1;

        match fetched {
            Ok(snapshot) => {
                on_update(&snapshot);
                if snapshot.status.is_terminal() {
                    info!(
                        scan_id,
                        status = %snapshot.status,
                        open = snapshot.open_ports.len(),
                        polls,
                        "scan finished"
                    );
                    return Ok(snapshot);
                }
            }
            Err(e) => {
                warn!(scan_id, error = %e, "status poll failed; retrying on next tick");
            }
        }
    }
}

/// Run `fut` to completion unless `cancel` fires first, in which case the
/// future is dropped and [`ClientError::Cancelled`] is returned.
pub async fn until_cancelled<F>(cancel: &CancellationToken, fut: F) -> Result<F::Output>
where
    F: Future,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ClientError::Cancelled),
        out = fut => Ok(out),
    }
}
