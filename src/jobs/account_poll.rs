//! Background job: periodically re-read the current user's profile so the
//! reconciler can spot a role upgrade or a deactivated account.
//!
//! Besides the fixed interval, the poll wakes early whenever `recheck` is
//! notified (a pushed role notification).

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Notify};
use tokio::time;

use super::JobHandle;
use crate::api::ApiClient;
use crate::reconcile::FeedEvent;

pub fn spawn(
    client: ApiClient,
    every: Duration,
    recheck: Arc<Notify>,
    tx: mpsc::Sender<FeedEvent>,
) -> JobHandle {
    let task = tokio::spawn(async move {
        let mut interval = time::interval(every);
        interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = recheck.notified() => {
                    tracing::debug!("account recheck requested");
                    interval.reset();
                }
            }

            match client.current_user().await {
                Ok(profile) => {
                    if tx.send(FeedEvent::Account(profile)).await.is_err() {
                        break;
                    }
                }
                Err(e) if e.is_unauthorized() => {
                    tracing::error!(error = %e, "account poll rejected, session is no longer valid");
                }
                Err(e) => tracing::warn!(error = %e, "account poll failed"),
            }
        }
    });
    JobHandle::new("account_poll", task)
}
