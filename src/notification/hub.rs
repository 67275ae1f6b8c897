//! Push channel: SignalR-style JSON hub over WebSocket.
//!
//! Frame format: each record is a JSON object terminated by `0x1E`. After
//! the handshake record the server sends invocations (type 1), pings
//! (type 6) and a close record (type 7). Notification invocations are
//! normalized and forwarded to the reconciler as [`FeedEvent::Pushed`].
//!
//! The connection is re-established with backoff until the job is
//! cancelled.

use futures::{SinkExt, StreamExt};
use rand::Rng;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

use crate::jobs::JobHandle;
use crate::models::NotificationItem;
use crate::normalize::Normalize;
use crate::reconcile::FeedEvent;
use crate::session::Session;

pub const RECORD_SEPARATOR: char = '\u{1e}';

/// Hub methods the server invokes to deliver a notification.
const NOTIFICATION_TARGETS: &[&str] = &["ReceiveNotification", "NewNotification"];

/// Reconnect delays; the last one repeats.
const BACKOFF_SECS: &[u64] = &[1, 2, 5, 10, 30];

const KEEPALIVE: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, PartialEq)]
pub enum HubMessage {
    /// Empty handshake answer, or one carrying an error.
    Handshake { error: Option<String> },
    Invocation { target: String, arguments: Vec<Value> },
    Ping,
    Close { error: Option<String> },
    /// Record types this client does not act on.
    Other(u64),
}

/// Append the record separator to one JSON record.
pub fn encode_record(record: &Value) -> String {
    let mut s = record.to_string();
    s.push(RECORD_SEPARATOR);
    s
}

pub fn handshake_record() -> String {
    encode_record(&json!({"protocol": "json", "version": 1}))
}

/// Split one WebSocket text frame into hub messages. Unparsable records
/// are skipped.
pub fn parse_frame(frame: &str) -> Vec<HubMessage> {
    frame
        .split(RECORD_SEPARATOR)
        .filter(|r| !r.trim().is_empty())
        .filter_map(|r| match serde_json::from_str::<Value>(r) {
            Ok(v) => Some(classify(v)),
            Err(e) => {
                tracing::debug!(error = %e, "skipping malformed hub record");
                None
            }
        })
        .collect()
}

fn classify(v: Value) -> HubMessage {
    let error = v.get("error").and_then(Value::as_str).map(String::from);
    match v.get("type").and_then(Value::as_u64) {
        None => HubMessage::Handshake { error },
        Some(1) => HubMessage::Invocation {
            target: v.get("target").and_then(Value::as_str).unwrap_or_default().to_string(),
            arguments: v
                .get("arguments")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default(),
        },
        Some(6) => HubMessage::Ping,
        Some(7) => HubMessage::Close { error },
        Some(other) => HubMessage::Other(other),
    }
}

/// The notification carried by an invocation, if it is one.
pub fn notification_from(msg: &HubMessage) -> Option<NotificationItem> {
    match msg {
        HubMessage::Invocation { target, arguments }
            if NOTIFICATION_TARGETS.iter().any(|t| t.eq_ignore_ascii_case(target)) =>
        {
            arguments.first().map(NotificationItem::normalize)
        }
        _ => None,
    }
}

/// Hub URL with the bearer token in `access_token`, as browsers send it.
pub fn connect_url(hub: &Url, session: &Session) -> Url {
    let mut url = hub.clone();
    url.query_pairs_mut().append_pair("access_token", session.token());
    url
}

fn backoff(attempt: usize) -> Duration {
    let secs = BACKOFF_SECS[attempt.min(BACKOFF_SECS.len() - 1)];
    let jitter = rand::thread_rng().gen_range(0..=500);
    Duration::from_secs(secs) + Duration::from_millis(jitter)
}

enum SessionEnd {
    /// Reconciler went away; stop for good.
    ConsumerGone,
    /// Connection dropped or was closed by the server.
    Disconnected(String),
}

/// Spawn the push listener.
pub fn spawn(hub: Url, session: Arc<Session>, tx: mpsc::Sender<FeedEvent>) -> JobHandle {
    let task = tokio::spawn(async move {
        let mut attempt = 0usize;
        loop {
            match run_session(&hub, &session, &tx, &mut attempt).await {
                SessionEnd::ConsumerGone => break,
                SessionEnd::Disconnected(reason) => {
                    let delay = backoff(attempt);
                    tracing::warn!(
                        hub = %hub,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        reason = %reason,
                        "push channel disconnected, reconnecting"
                    );
                    attempt += 1;
                    tokio::time::sleep(delay).await;
                }
            }
        }
    });
    JobHandle::new("push_hub", task)
}

async fn run_session(
    hub: &Url,
    session: &Session,
    tx: &mpsc::Sender<FeedEvent>,
    attempt: &mut usize,
) -> SessionEnd {
    let url = connect_url(hub, session);
    let (mut ws, _) = match tokio_tungstenite::connect_async(url.as_str()).await {
        Ok(conn) => conn,
        Err(e) => return SessionEnd::Disconnected(format!("connect failed: {}", e)),
    };

    if let Err(e) = ws.send(Message::Text(handshake_record())).await {
        return SessionEnd::Disconnected(format!("handshake send failed: {}", e));
    }

    let mut keepalive = tokio::time::interval(KEEPALIVE);
    keepalive.tick().await;
    let ping = encode_record(&json!({"type": 6}));

    loop {
        tokio::select! {
            _ = keepalive.tick() => {
                if let Err(e) = ws.send(Message::Text(ping.clone())).await {
                    return SessionEnd::Disconnected(format!("keepalive failed: {}", e));
                }
            }
            frame = ws.next() => {
                let text = match frame {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Binary(bytes))) => String::from_utf8_lossy(&bytes).into_owned(),
                    Some(Ok(Message::Close(_))) | None => {
                        return SessionEnd::Disconnected("socket closed".into());
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => return SessionEnd::Disconnected(format!("read failed: {}", e)),
                };

                for msg in parse_frame(&text) {
                    match &msg {
                        HubMessage::Handshake { error: Some(err) } => {
                            return SessionEnd::Disconnected(format!("handshake rejected: {}", err));
                        }
                        HubMessage::Handshake { error: None } => {
                            tracing::info!(hub = %hub, "push channel connected");
                            *attempt = 0;
                        }
                        HubMessage::Close { error } => {
                            return SessionEnd::Disconnected(
                                error.clone().unwrap_or_else(|| "server closed the hub".into()),
                            );
                        }
                        HubMessage::Ping | HubMessage::Other(_) => {}
                        HubMessage::Invocation { target, .. } => match notification_from(&msg) {
                            Some(item) => {
                                tracing::debug!(id = %item.id, "notification pushed");
                                if tx.send(FeedEvent::Pushed(item)).await.is_err() {
                                    return SessionEnd::ConsumerGone;
                                }
                            }
                            None => tracing::trace!(method = %target, "ignoring hub invocation"),
                        },
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handshake_record_is_terminated() {
        let rec = handshake_record();
        assert!(rec.ends_with(RECORD_SEPARATOR));
        let parsed: Value = serde_json::from_str(rec.trim_end_matches(RECORD_SEPARATOR)).unwrap();
        assert_eq!(parsed["protocol"], "json");
        assert_eq!(parsed["version"], 1);
    }

    #[test]
    fn test_parse_frame_with_several_records() {
        let frame = "{}\u{1e}{\"type\":6}\u{1e}{\"type\":1,\"target\":\"ReceiveNotification\",\"arguments\":[{\"Id\":5,\"Title\":\"Hi\"}]}\u{1e}";
        let msgs = parse_frame(frame);
        assert_eq!(msgs.len(), 3);
        assert_eq!(msgs[0], HubMessage::Handshake { error: None });
        assert_eq!(msgs[1], HubMessage::Ping);

        let item = notification_from(&msgs[2]).unwrap();
        assert_eq!(item.id, "5");
        assert_eq!(item.title, "Hi");
    }

    #[test]
    fn test_close_and_handshake_errors() {
        let msgs = parse_frame("{\"error\":\"bad protocol\"}\u{1e}{\"type\":7,\"error\":\"bye\"}\u{1e}");
        assert_eq!(msgs[0], HubMessage::Handshake { error: Some("bad protocol".into()) });
        assert_eq!(msgs[1], HubMessage::Close { error: Some("bye".into()) });
    }

    #[test]
    fn test_malformed_and_foreign_records() {
        let msgs = parse_frame("not json\u{1e}{\"type\":3,\"invocationId\":\"1\"}\u{1e}");
        assert_eq!(msgs, vec![HubMessage::Other(3)]);

        let other = HubMessage::Invocation {
            target: "UserTyping".into(),
            arguments: vec![json!({"id": 1})],
        };
        assert!(notification_from(&other).is_none());
    }

    #[test]
    fn test_connect_url_carries_token() {
        let hub = Url::parse("wss://api.example.com/hubs/notification").unwrap();
        let url = connect_url(&hub, &Session::new("abc.def"));
        assert_eq!(url.as_str(), "wss://api.example.com/hubs/notification?access_token=abc.def");
    }

    #[test]
    fn test_backoff_is_capped() {
        let d = backoff(50);
        assert!(d >= Duration::from_secs(30));
        assert!(d <= Duration::from_millis(30_500));
    }
}
