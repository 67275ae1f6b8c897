//! Background job: poll the notification list on a fixed interval and feed
//! it to the reconciler. The first poll runs immediately.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time;

use super::JobHandle;
use crate::api::ApiClient;
use crate::reconcile::FeedEvent;

/// Spawn the notification poll. Stops by itself once the reconciler is gone.
pub fn spawn(client: ApiClient, every: Duration, tx: mpsc::Sender<FeedEvent>) -> JobHandle {
    let task = tokio::spawn(async move {
        let mut interval = time::interval(every);
        interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            match client.notifications().await {
                Ok(items) => {
                    tracing::debug!(count = items.len(), "notification poll");
                    if tx.send(FeedEvent::Polled(items)).await.is_err() {
                        break;
                    }
                }
                Err(e) => tracing::warn!(error = %e, "notification poll failed"),
            }
        }
    });
    JobHandle::new("notification_poll", task)
}
