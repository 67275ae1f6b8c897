//! Reconciling the notification feed and the user's account state.
//!
//! Two independent producers (the periodic polls in [`crate::jobs`] and the
//! push hub in [`crate::notification::hub`]) send [`FeedEvent`]s into one
//! channel. A single [`Reconciler`] owns the feed and applies every event
//! through the same deduplicating merge, so a notification delivered by
//! both paths shows up once.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};

use crate::models::{NotificationItem, Role, UserProfile};

/// Input to the reconciler.
#[derive(Debug, Clone)]
pub enum FeedEvent {
    /// Full notification list from a poll.
    Polled(Vec<NotificationItem>),
    /// One notification delivered by the push hub.
    Pushed(NotificationItem),
    /// Fresh profile from the account poll.
    Account(UserProfile),
}

/// Output of the reconciler, in the order changes were detected.
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    NewNotifications(Vec<NotificationItem>),
    Account(AccountChange),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountChange {
    RoleUpgraded { from: Role, to: Role },
    RoleChanged { from: Role, to: Role },
    Deactivated,
    Reactivated,
}

fn newest_first(a: &NotificationItem, b: &NotificationItem) -> Ordering {
    // items without a timestamp sink to the end
    match (a.created_at, b.created_at) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.id.cmp(&b.id))
}

/// Merge `incoming` into `existing`, keyed by notification id.
///
/// Returns the items that were not known before. A known id is never
/// duplicated; its read flag can only move from unread to read. Items
/// without an id cannot be keyed and are dropped. `existing` ends up
/// sorted newest first.
pub fn merge_notifications(
    existing: &mut Vec<NotificationItem>,
    incoming: impl IntoIterator<Item = NotificationItem>,
) -> Vec<NotificationItem> {
    let mut known: HashSet<String> = existing.iter().map(|n| n.id.clone()).collect();
    let mut added = Vec::new();

    for item in incoming {
        if item.id.is_empty() {
            tracing::debug!(title = %item.title, "dropping notification without id");
            continue;
        }
        if known.contains(&item.id) {
            if item.is_read {
                if let Some(current) = existing.iter_mut().find(|n| n.id == item.id) {
                    current.is_read = true;
                }
            }
            continue;
        }
        known.insert(item.id.clone());
        added.push(item.clone());
        existing.push(item);
    }

    existing.sort_by(newest_first);
    added.sort_by(newest_first);
    added
}

/// Local view of the user's notifications.
#[derive(Debug, Default, Clone)]
pub struct NotificationFeed {
    items: Vec<NotificationItem>,
}

impl NotificationFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[NotificationItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn unread_count(&self) -> usize {
        self.items.iter().filter(|n| !n.is_read).count()
    }

    pub fn merge(&mut self, incoming: impl IntoIterator<Item = NotificationItem>) -> Vec<NotificationItem> {
        merge_notifications(&mut self.items, incoming)
    }

    /// Returns false when the id is unknown.
    pub fn mark_as_read(&mut self, id: &str) -> bool {
        match self.items.iter_mut().find(|n| n.id == id) {
            Some(n) => {
                n.is_read = true;
                true
            }
            None => false,
        }
    }

    pub fn mark_all_read(&mut self) -> usize {
        let mut changed = 0;
        for n in self.items.iter_mut().filter(|n| !n.is_read) {
            n.is_read = true;
            changed += 1;
        }
        changed
    }

    pub fn remove(&mut self, id: &str) -> Option<NotificationItem> {
        let pos = self.items.iter().position(|n| n.id == id)?;
        Some(self.items.remove(pos))
    }
}

/// Tracks role and active flag across account polls.
#[derive(Debug, Default, Clone)]
pub struct AccountWatch {
    role: Option<Role>,
    is_active: Option<bool>,
}

impl AccountWatch {
    /// Start from a known role (usually the session's), so the first poll
    /// can already report an upgrade.
    pub fn with_role(role: Option<Role>) -> Self {
        Self { role, is_active: None }
    }

    pub fn role(&self) -> Option<Role> {
        self.role
    }

    /// Compare a fresh profile with the last one seen.
    pub fn observe(&mut self, profile: &UserProfile) -> Vec<AccountChange> {
        let mut changes = Vec::new();

        // Unknown(0) means the profile carried no role at all
        if profile.role != Role::Unknown(0) {
            if let Some(prev) = self.role {
                if prev != profile.role {
                    if prev.is_upgrade_to(profile.role) {
                        changes.push(AccountChange::RoleUpgraded { from: prev, to: profile.role });
                    } else {
                        changes.push(AccountChange::RoleChanged { from: prev, to: profile.role });
                    }
                }
            }
            self.role = Some(profile.role);
        }

        match (self.is_active, profile.is_active) {
            (Some(true), false) | (None, false) => changes.push(AccountChange::Deactivated),
            (Some(false), true) => changes.push(AccountChange::Reactivated),
            _ => {}
        }
        self.is_active = Some(profile.is_active);

        changes
    }
}

/// Single consumer of [`FeedEvent`]s.
pub struct Reconciler {
    pub feed: NotificationFeed,
    pub account: AccountWatch,
    recheck: Option<Arc<Notify>>,
}

impl Reconciler {
    pub fn new(feed: NotificationFeed, account: AccountWatch) -> Self {
        Self {
            feed,
            account,
            recheck: None,
        }
    }

    /// Wake the account poll early when a pushed notification announces a
    /// role change.
    pub fn with_recheck(mut self, recheck: Arc<Notify>) -> Self {
        self.recheck = Some(recheck);
        self
    }

    /// Apply one event and report what changed.
    pub fn apply(&mut self, event: FeedEvent) -> Vec<Update> {
        match event {
            FeedEvent::Polled(items) => self.merge(items),
            FeedEvent::Pushed(item) => {
                if item.is_role_upgrade() {
                    if let Some(recheck) = &self.recheck {
                        tracing::debug!(id = %item.id, "role notification pushed, rechecking account");
                        recheck.notify_one();
                    }
                }
                self.merge(vec![item])
            }
            FeedEvent::Account(profile) => self
                .account
                .observe(&profile)
                .into_iter()
                .map(Update::Account)
                .collect(),
        }
    }

    fn merge(&mut self, items: Vec<NotificationItem>) -> Vec<Update> {
        let added = self.feed.merge(items);
        if added.is_empty() {
            Vec::new()
        } else {
            tracing::info!(count = added.len(), unread = self.feed.unread_count(), "new notifications");
            vec![Update::NewNotifications(added)]
        }
    }

    /// Consume events until every producer has hung up.
    pub async fn run<F>(mut self, mut rx: mpsc::Receiver<FeedEvent>, mut on_update: F) -> Self
    where
        F: FnMut(Update),
    {
        while let Some(event) = rx.recv().await {
            for update in self.apply(event) {
                on_update(update);
            }
        }
        self
    }
}
