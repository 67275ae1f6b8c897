//! Integration tests for the REST wrappers against a mock backend.
//!
//! These tests verify:
//! 1. Every request carries the session's bearer token
//! 2. Non-2xx answers become an `ApiError` with the best available message
//! 3. Mixed-casing payloads come back normalized
//! 4. The dashboard still loads when a secondary fetch fails

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tourdash::api::{ApiClient, StatsQuery};
use tourdash::errors::ApiError;
use tourdash::models::Role;
use tourdash::session::Session;
use url::Url;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> ApiClient {
    ApiClient::new(
        Url::parse(&server.uri()).unwrap(),
        Arc::new(Session::new("test-token")),
        Duration::from_secs(5),
    )
    .unwrap()
}

mod error_mapping {
    use super::*;

    #[tokio::test]
    async fn test_404_message_is_exact() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/payment/host/99"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "not found"})))
            .expect(1)
            .mount(&server)
            .await;

        let err = client_for(&server).host_payment("99").await.unwrap_err();
        assert_eq!(err.to_string(), "not found");
        assert_eq!(err.status().map(|s| s.as_u16()), Some(404));
    }

    #[tokio::test]
    async fn test_error_field_is_used() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/statistics/badges"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({"error": "admins only"})))
            .mount(&server)
            .await;

        let err = client_for(&server).badges().await.unwrap_err();
        assert_eq!(err.message(), "admins only");
        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn test_plain_text_body_is_the_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/notifications"))
            .respond_with(ResponseTemplate::new(502).set_body_string("upstream unavailable"))
            .mount(&server)
            .await;

        let err = client_for(&server).notifications().await.unwrap_err();
        assert_eq!(err.message(), "upstream unavailable");
    }

    #[tokio::test]
    async fn test_empty_error_body_uses_fixed_message() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/notifications/5"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = client_for(&server).remove_notification("5").await.unwrap_err();
        assert_eq!(err.message(), "Request failed with status 500");
    }

    #[tokio::test]
    async fn test_malformed_success_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/users/me"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
            .mount(&server)
            .await;

        let err = client_for(&server).current_user().await.unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let client = ApiClient::new(
            Url::parse("http://127.0.0.1:1").unwrap(),
            Arc::new(Session::new("t")),
            Duration::from_secs(2),
        )
        .unwrap();

        let err = client.badges().await.unwrap_err();
        assert!(matches!(err, ApiError::Network(_)), "got {:?}", err);
        assert!(err.status().is_none());
    }
}

mod requests {
    use super::*;

    #[tokio::test]
    async fn test_bearer_token_and_query_are_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/statistics/dashboard"))
            .and(header("authorization", "Bearer test-token"))
            .and(query_param("period", "month"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"TotalUsers": 5})))
            .expect(1)
            .mount(&server)
            .await;

        let stats = client_for(&server)
            .dashboard_stats(&StatsQuery::period("month"))
            .await
            .unwrap();
        assert_eq!(stats.total_users, 5);
        assert_eq!(stats.total_tours, 0);
    }

    #[tokio::test]
    async fn test_enveloped_list_is_normalized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/notifications"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "Data": [
                    {"Id": 1, "Title": "Booking confirmed", "IsRead": true},
                    {"id": 2, "title": "New review", "isRead": false}
                ]
            })))
            .mount(&server)
            .await;

        let items = client_for(&server).notifications().await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "1");
        assert!(items[0].is_read);
        assert_eq!(items[1].title, "New review");
    }

    #[tokio::test]
    async fn test_mark_read_accepts_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/notifications/42/read"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server).mark_notification_read("42").await.unwrap();
    }

    #[tokio::test]
    async fn test_upgrade_request_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/payment/upgrade"))
            .and(body_json(json!({"targetRoleId": 2})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "RequestId": "up-1",
                "Status": "Pending",
                "Amount": 500000,
                "PaymentUrl": "https://pay.example.com/checkout/up-1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let req = client_for(&server).request_upgrade(Role::Host, None).await.unwrap();
        assert_eq!(req.id, "up-1");
        assert!(!req.is_approved());
        assert_eq!(req.payment_url.as_deref(), Some("https://pay.example.com/checkout/up-1"));
    }

    #[tokio::test]
    async fn test_messages_keep_arrival_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/chat/conversations/c%201/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"Id": 10, "SenderId": "a", "Content": "first", "CreatedAtMs": 2000},
                {"Id": 3, "SenderId": "a", "Content": "second", "CreatedAtMs": 1000}
            ])))
            .mount(&server)
            .await;

        let msgs = client_for(&server).messages("c 1").await.unwrap();
        assert_eq!(msgs.iter().map(|m| m.id.as_str()).collect::<Vec<_>>(), vec!["10", "3"]);
    }
}

mod dashboard {
    use super::*;

    async fn mount_ok(server: &MockServer, p: &str, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(p))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_all_parts_load() {
        let server = MockServer::start().await;
        mount_ok(&server, "/api/statistics/dashboard", json!({"totalUsers": 10, "TotalBookings": 4})).await;
        mount_ok(&server, "/api/statistics/badges", json!({"PendingTours": 2})).await;
        mount_ok(&server, "/api/statistics/posts", json!({"totalPosts": 8})).await;
        mount_ok(&server, "/api/statistics/top-hosts", json!([{"HostId": 1, "FullName": "Saigon Walks"}])).await;

        let overview = client_for(&server)
            .load_dashboard(&StatsQuery::default(), 5)
            .await
            .unwrap();
        assert_eq!(overview.stats.total_users, 10);
        assert_eq!(overview.stats.total_bookings, 4);
        assert_eq!(overview.badges.pending_tours, 2);
        assert_eq!(overview.post_stats.total_posts, 8);
        assert_eq!(overview.top_hosts[0].name, "Saigon Walks");
        assert!(overview.degraded.is_empty());
    }

    #[tokio::test]
    async fn test_secondary_failure_degrades() {
        let server = MockServer::start().await;
        mount_ok(&server, "/api/statistics/dashboard", json!({"TotalUsers": 5})).await;
        mount_ok(&server, "/api/statistics/badges", json!({"pendingReports": 1})).await;
        mount_ok(&server, "/api/statistics/posts", json!({})).await;
        Mock::given(method("GET"))
            .and(path("/api/statistics/top-hosts"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "boom"})))
            .mount(&server)
            .await;

        let overview = client_for(&server)
            .load_dashboard(&StatsQuery::default(), 5)
            .await
            .unwrap();
        assert_eq!(overview.stats.total_users, 5);
        assert_eq!(overview.badges.pending_reports, 1);
        assert!(overview.top_hosts.is_empty());
        assert_eq!(overview.degraded, vec!["top_hosts".to_string()]);
    }

    #[tokio::test]
    async fn test_primary_failure_fails_the_view() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/statistics/dashboard"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "token expired"})))
            .mount(&server)
            .await;
        mount_ok(&server, "/api/statistics/badges", json!({})).await;
        mount_ok(&server, "/api/statistics/posts", json!({})).await;
        mount_ok(&server, "/api/statistics/top-hosts", json!([])).await;

        let err = client_for(&server)
            .load_dashboard(&StatsQuery::default(), 5)
            .await
            .unwrap_err();
        assert_eq!(err.message(), "token expired");
    }
}
