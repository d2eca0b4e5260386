use std::sync::Arc;

use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, trace};

use crate::{common::Shutdown, session::Inner};

/// Records a history snapshot once changes stop arriving for the debounce
/// period. A change inside the period restarts it.
pub(super) async fn history(
    inner: Arc<Inner>,
    shutdown: Shutdown,
) {
    let debounce = inner.config.history.debounce();

    loop {
        tokio::select! {
            _ = shutdown.wait() => break,
            signal = inner.changes.next_async() => {
                if signal.is_none() {
                    break;
                }

                loop {
                    tokio::select! {
                        _ = shutdown.wait() => return,
                        _ = time::sleep(debounce) => break,
                        next = inner.changes.next_async() => {
                            if next.is_none() {
                                return;
                            }
                            trace!("worker::history: quiet period restarted");
                        }
                    }
                }

                if inner.record_history() {
                    trace!("worker::history: snapshot recorded");
                }
            }
        }
    }
    debug!("worker::history: stopped");
}

/// Fires every autosave interval, first one interval after start.
pub(super) async fn autosave(
    inner: Arc<Inner>,
    shutdown: Shutdown,
) {
    let period = inner.config.autosave.interval();
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown.wait() => break,
            _ = ticker.tick() => {
                tokio::select! {
                    _ = shutdown.wait() => break,
                    _ = inner.autosave() => {}
                }
            }
        }
    }
    debug!("worker::autosave: stopped");
}
