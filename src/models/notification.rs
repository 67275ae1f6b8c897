use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::normalize::{Fields, Keys, Normalize};

mod keys {
    use super::Keys;

    pub const ID: Keys = &["id", "Id", "notificationId", "NotificationId"];
    pub const TITLE: Keys = &["title", "Title"];
    pub const MESSAGE: Keys = &["message", "Message", "content", "Content", "body", "Body"];
    pub const CREATED_AT: Keys = &["createdAt", "CreatedAt", "createdDate", "CreatedDate"];
    pub const IS_READ: Keys = &["isRead", "IsRead", "read", "Read"];
    pub const KIND: Keys = &["type", "Type", "notificationType", "NotificationType"];
    pub const COUNT: Keys = &["count", "Count", "unreadCount", "UnreadCount"];
}

/// Notification kinds that announce a role change for the current user.
const ROLE_UPGRADE_KINDS: &[&str] = &["roleupgrade", "role_upgrade", "upgradeapproved", "upgrade_approved"];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationItem {
    pub id: String,
    pub title: String,
    pub message: String,
    pub created_at: Option<DateTime<Utc>>,
    pub is_read: bool,
    pub kind: Option<String>,
}

impl NotificationItem {
    pub fn is_role_upgrade(&self) -> bool {
        self.kind.as_deref().is_some_and(|k| {
            let k = k.to_ascii_lowercase();
            ROLE_UPGRADE_KINDS.contains(&k.as_str())
        })
    }
}

impl Normalize for NotificationItem {
    fn normalize(value: &Value) -> Self {
        let f = Fields::new(value);
        Self {
            id: f.string(keys::ID),
            title: f.string(keys::TITLE),
            message: f.string(keys::MESSAGE),
            created_at: f.datetime(keys::CREATED_AT),
            is_read: f.bool(keys::IS_READ),
            kind: f.opt_string(keys::KIND),
        }
    }
}

/// `GET /api/notifications/unread-count` answers either a bare number or
/// `{ count: n }` in some casing.
pub fn unread_count(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n.as_i64().unwrap_or(0),
        other => Fields::new(crate::normalize::unwrap_envelope(other)).i64(keys::COUNT),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dual_cased_notification() {
        let a = NotificationItem::normalize(&json!({
            "Id": 3, "Title": "Booking", "Message": "New booking", "IsRead": false,
            "CreatedAt": "2024-06-01T08:00:00"
        }));
        let b = NotificationItem::normalize(&json!({
            "id": "3", "title": "Booking", "message": "New booking", "isRead": false,
            "createdAt": "2024-06-01T08:00:00Z"
        }));
        assert_eq!(a, b);
    }

    #[test]
    fn test_role_upgrade_kind() {
        let n = NotificationItem::normalize(&json!({"id": 1, "Type": "RoleUpgrade"}));
        assert!(n.is_role_upgrade());
        let n = NotificationItem::normalize(&json!({"id": 1, "type": "booking"}));
        assert!(!n.is_role_upgrade());
    }

    #[test]
    fn test_unread_count_shapes() {
        assert_eq!(unread_count(&json!(4)), 4);
        assert_eq!(unread_count(&json!({"UnreadCount": 2})), 2);
        assert_eq!(unread_count(&json!({"data": {"count": 9}})), 9);
        assert_eq!(unread_count(&json!(null)), 0);
    }
}
