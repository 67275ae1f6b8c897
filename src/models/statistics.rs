use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use crate::normalize::{Fields, Keys, Normalize};

mod keys {
    use super::Keys;

    pub const TOTAL_USERS: Keys = &["totalUsers", "TotalUsers"];
    pub const TOTAL_HOSTS: Keys = &["totalHosts", "TotalHosts"];
    pub const TOTAL_TOURS: Keys = &["totalTours", "TotalTours"];
    pub const TOTAL_BOOKINGS: Keys = &["totalBookings", "TotalBookings"];
    pub const TOTAL_REVENUE: Keys = &["totalRevenue", "TotalRevenue"];
    pub const NEW_USERS: Keys = &["newUsers", "NewUsers", "newUsersInPeriod", "NewUsersInPeriod"];
    pub const ACTIVE_TOURS: Keys = &["activeTours", "ActiveTours"];
    pub const PENDING_BOOKINGS: Keys = &["pendingBookings", "PendingBookings"];

    pub const PENDING_HOST_REQUESTS: Keys = &[
        "pendingHostRequests",
        "PendingHostRequests",
        "pendingUpgradeRequests",
        "PendingUpgradeRequests",
    ];
    pub const PENDING_TOURS: Keys = &["pendingTours", "PendingTours"];
    pub const PENDING_REPORTS: Keys = &["pendingReports", "PendingReports"];
    pub const PENDING_PAYMENTS: Keys = &["pendingPayments", "PendingPayments"];

    pub const TOTAL_POSTS: Keys = &["totalPosts", "TotalPosts"];
    pub const TOTAL_COMMENTS: Keys = &["totalComments", "TotalComments"];
    pub const TOTAL_REACTIONS: Keys = &["totalReactions", "TotalReactions"];
    pub const PENDING_POSTS: Keys = &["pendingPosts", "PendingPosts"];

    pub const HOST_ID: Keys = &["hostId", "HostId", "id", "Id"];
    pub const HOST_NAME: Keys = &["hostName", "HostName", "fullName", "FullName", "name", "Name"];
    pub const RATING: Keys = &["rating", "Rating", "averageRating", "AverageRating"];
}

/// Headline numbers for the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_users: i64,
    pub total_hosts: i64,
    pub total_tours: i64,
    pub total_bookings: i64,
    pub total_revenue: Decimal,
    pub new_users: i64,
    pub active_tours: i64,
    pub pending_bookings: i64,
}

impl Normalize for DashboardStats {
    fn normalize(value: &Value) -> Self {
        let f = Fields::new(value);
        Self {
            total_users: f.i64(keys::TOTAL_USERS),
            total_hosts: f.i64(keys::TOTAL_HOSTS),
            total_tours: f.i64(keys::TOTAL_TOURS),
            total_bookings: f.i64(keys::TOTAL_BOOKINGS),
            total_revenue: f.decimal(keys::TOTAL_REVENUE),
            new_users: f.i64(keys::NEW_USERS),
            active_tours: f.i64(keys::ACTIVE_TOURS),
            pending_bookings: f.i64(keys::PENDING_BOOKINGS),
        }
    }
}

/// Counts of pending administrative items.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Badges {
    pub pending_host_requests: i64,
    pub pending_tours: i64,
    pub pending_reports: i64,
    pub pending_payments: i64,
}

impl Badges {
    pub fn total(&self) -> i64 {
        self.pending_host_requests + self.pending_tours + self.pending_reports + self.pending_payments
    }
}

impl Normalize for Badges {
    fn normalize(value: &Value) -> Self {
        let f = Fields::new(value);
        Self {
            pending_host_requests: f.i64(keys::PENDING_HOST_REQUESTS),
            pending_tours: f.i64(keys::PENDING_TOURS),
            pending_reports: f.i64(keys::PENDING_REPORTS),
            pending_payments: f.i64(keys::PENDING_PAYMENTS),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostStats {
    pub total_posts: i64,
    pub total_comments: i64,
    pub total_reactions: i64,
    pub pending_posts: i64,
}

impl Normalize for PostStats {
    fn normalize(value: &Value) -> Self {
        let f = Fields::new(value);
        Self {
            total_posts: f.i64(keys::TOTAL_POSTS),
            total_comments: f.i64(keys::TOTAL_COMMENTS),
            total_reactions: f.i64(keys::TOTAL_REACTIONS),
            pending_posts: f.i64(keys::PENDING_POSTS),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopHost {
    pub host_id: String,
    pub name: String,
    pub total_bookings: i64,
    pub total_revenue: Decimal,
    pub rating: f64,
}

impl Normalize for TopHost {
    fn normalize(value: &Value) -> Self {
        let f = Fields::new(value);
        Self {
            host_id: f.string(keys::HOST_ID),
            name: f.string(keys::HOST_NAME),
            total_bookings: f.i64(keys::TOTAL_BOOKINGS),
            total_revenue: f.decimal(keys::TOTAL_REVENUE),
            rating: f.f64(keys::RATING),
        }
    }
}

/// Everything the dashboard view shows. Only `stats` is required; the
/// secondary parts fall back to their defaults when their fetch fails.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardOverview {
    pub stats: DashboardStats,
    pub badges: Badges,
    pub post_stats: PostStats,
    pub top_hosts: Vec<TopHost>,
    /// Names of the secondary fetches that failed and were defaulted.
    pub degraded: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pascal_and_camel_normalize_identically() {
        let a = DashboardStats::normalize(&json!({"TotalUsers": 5}));
        let b = DashboardStats::normalize(&json!({"totalUsers": 5}));
        assert_eq!(a.total_users, 5);
        assert_eq!(a, b);

        let out = serde_json::to_value(&a).unwrap();
        assert_eq!(out["totalUsers"], 5);
    }

    #[test]
    fn test_missing_fields_default() {
        let stats = DashboardStats::normalize(&json!({}));
        assert_eq!(stats, DashboardStats::default());

        let hosts: Vec<TopHost> = crate::normalize::normalize_list(&json!({"Data": null}));
        assert!(hosts.is_empty());
    }

    #[test]
    fn test_mixed_casing_within_one_response() {
        let stats = DashboardStats::normalize(&json!({
            "totalUsers": 120,
            "TotalHosts": 14,
            "TotalRevenue": "15250000.50",
            "activeTours": 33
        }));
        assert_eq!(stats.total_users, 120);
        assert_eq!(stats.total_hosts, 14);
        assert_eq!(stats.active_tours, 33);
        assert_eq!(stats.total_revenue.to_string(), "15250000.50");
    }

    #[test]
    fn test_badges_total() {
        let badges = Badges::normalize(&json!({
            "PendingUpgradeRequests": 2, "pendingTours": 3, "PendingReports": 1
        }));
        assert_eq!(badges.pending_host_requests, 2);
        assert_eq!(badges.total(), 6);
    }
}
