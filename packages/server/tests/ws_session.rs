//! Integration tests driving the production router over real WebSockets.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use irori_server::ai::{AiAnswer, AiError, AiProvider};
use irori_server::build_router;
use irori_server::rate_limit::RateLimitConfig;
use irori_server::state::AppState;
use irori_shared::protocol::Outbound;
use irori_shared::time::{SystemClock, now_ms};

struct NoAi;

#[async_trait]
impl AiProvider for NoAi {
    fn is_enabled(&self) -> bool {
        false
    }

    fn model(&self) -> Option<String> {
        None
    }

    async fn ask(&self, _prompt: &str) -> Result<AiAnswer, AiError> {
        Err(AiError::Disabled)
    }
}

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Boot the real router on an ephemeral port.
async fn start_server(chat_limit: RateLimitConfig) -> SocketAddr {
    let state = Arc::new(AppState::new(
        chat_limit,
        Arc::new(NoAi),
        5,
        Arc::new(SystemClock),
    ));
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });
    addr
}

async fn connect(addr: SocketAddr) -> WsStream {
    let (stream, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    stream
}

async fn send_json(ws: &mut WsStream, json: &str) {
    ws.send(Message::Text(json.into())).await.unwrap();
}

async fn next_frame(ws: &mut WsStream) -> Outbound {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out waiting for frame")
            .expect("stream ended")
            .expect("transport error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).expect("valid frame");
        }
    }
}

/// Skip interleaved frames (join/leave announcements and the like) until one
/// of the wanted kind arrives.
async fn next_frame_of_kind(ws: &mut WsStream, kind: &str) -> Outbound {
    loop {
        let frame = next_frame(ws).await;
        if frame.kind() == kind {
            return frame;
        }
    }
}

async fn guest_name(ws: &mut WsStream) -> String {
    match next_frame_of_kind(ws, "ackName").await {
        Outbound::AckName { name, .. } => name,
        _ => unreachable!(),
    }
}

#[tokio::test]
async fn test_join_assigns_guest_name_and_announces_to_peers() {
    // given:
    let addr = start_server(RateLimitConfig::disabled()).await;
    let mut a = connect(addr).await;

    // when:
    let a_name = guest_name(&mut a).await;
    let mut b = connect(addr).await;
    let b_name = guest_name(&mut b).await;

    // then: guest names look like guest-xxxxxx and the join is announced to
    // the existing connection only
    assert!(a_name.starts_with("guest-"));
    assert_eq!(a_name.len(), "guest-".len() + 6);
    assert_ne!(a_name, b_name);
    let Outbound::System { text, .. } = next_frame_of_kind(&mut a, "system").await else {
        unreachable!()
    };
    assert_eq!(text, format!("{b_name} joined the chat."));
}

#[tokio::test]
async fn test_chat_reaches_sender_and_peer() {
    // given:
    let addr = start_server(RateLimitConfig::disabled()).await;
    let mut a = connect(addr).await;
    let a_name = guest_name(&mut a).await;
    let mut b = connect(addr).await;
    let _b_name = guest_name(&mut b).await;

    // when:
    let sent_at = now_ms();
    send_json(&mut a, r#"{"type":"chat","text":"hi"}"#).await;

    // then: both connections receive the same attributed frame
    for ws in [&mut a, &mut b] {
        let Outbound::Chat { from, text, at } = next_frame_of_kind(ws, "chat").await else {
            unreachable!()
        };
        assert_eq!(from, a_name);
        assert_eq!(text, "hi");
        assert!(at >= sent_at);
    }
}

#[tokio::test]
async fn test_rename_is_acked_announced_and_applied() {
    // given:
    let addr = start_server(RateLimitConfig::disabled()).await;
    let mut a = connect(addr).await;
    let a_name = guest_name(&mut a).await;
    let mut b = connect(addr).await;
    let _b_name = guest_name(&mut b).await;

    // when:
    send_json(&mut a, r#"{"type":"setName","name":"alice"}"#).await;

    // then:
    let Outbound::AckName { name, .. } = next_frame_of_kind(&mut a, "ackName").await else {
        unreachable!()
    };
    assert_eq!(name, "alice");
    let Outbound::System { text, .. } = next_frame_of_kind(&mut b, "system").await else {
        unreachable!()
    };
    assert_eq!(text, format!("{a_name} is now alice."));

    // and: a later chat is attributed to the new name
    send_json(&mut a, r#"{"type":"chat","text":"renamed"}"#).await;
    let Outbound::Chat { from, .. } = next_frame_of_kind(&mut b, "chat").await else {
        unreachable!()
    };
    assert_eq!(from, "alice");
}

#[tokio::test]
async fn test_invalid_name_gets_error_frame() {
    // given:
    let addr = start_server(RateLimitConfig::disabled()).await;
    let mut a = connect(addr).await;
    let _ = guest_name(&mut a).await;

    // when:
    send_json(&mut a, r#"{"type":"setName","name":"!!"}"#).await;

    // then:
    let Outbound::Error { message } = next_frame_of_kind(&mut a, "error").await else {
        unreachable!()
    };
    assert_eq!(message, "Name may only contain letters, digits, spaces, - and _.");
}

#[tokio::test]
async fn test_list_users_tracks_joins_and_leaves() {
    // given: three connections
    let addr = start_server(RateLimitConfig::disabled()).await;
    let mut a = connect(addr).await;
    let _ = guest_name(&mut a).await;
    let mut b = connect(addr).await;
    let _ = guest_name(&mut b).await;
    let mut c = connect(addr).await;
    let c_name = guest_name(&mut c).await;

    // when: one leaves
    c.close(None).await.unwrap();
    let Outbound::System { text, .. } = next_frame_of_kind(&mut a, "system").await else {
        unreachable!()
    };
    assert_eq!(text, format!("{c_name} left the chat."));

    send_json(&mut a, r#"{"type":"listUsers"}"#).await;

    // then: exactly the two remaining entries, in join order
    let Outbound::ListUsers { users } = next_frame_of_kind(&mut a, "listUsers").await else {
        unreachable!()
    };
    assert_eq!(users.len(), 2);
    assert!(users.iter().all(|u| u.name != c_name));
}

#[tokio::test]
async fn test_ping_echoes_token() {
    // given:
    let addr = start_server(RateLimitConfig::disabled()).await;
    let mut a = connect(addr).await;
    let _ = guest_name(&mut a).await;

    // when:
    let sent_at = now_ms();
    send_json(&mut a, r#"{"type":"ping","token":"abc"}"#).await;

    // then:
    let Outbound::Pong { token, at } = next_frame_of_kind(&mut a, "pong").await else {
        unreachable!()
    };
    assert_eq!(token, Some("abc".to_string()));
    assert!(at >= sent_at);
}

#[tokio::test]
async fn test_status_is_sent_to_requester_only() {
    // given:
    let addr = start_server(RateLimitConfig::disabled()).await;
    let mut a = connect(addr).await;
    let _ = guest_name(&mut a).await;
    let mut b = connect(addr).await;
    let _ = guest_name(&mut b).await;

    // when:
    send_json(&mut a, r#"{"type":"status"}"#).await;

    // then:
    let Outbound::Status {
        user_count,
        connections_total,
        ai_enabled,
        ..
    } = next_frame_of_kind(&mut a, "status").await
    else {
        unreachable!()
    };
    assert_eq!(user_count, 2);
    assert_eq!(connections_total, 2);
    assert!(!ai_enabled);

    // and: the other connection can still chat without having seen a status
    send_json(&mut b, r#"{"type":"chat","text":"still here"}"#).await;
    let frame = next_frame_of_kind(&mut b, "chat").await;
    assert!(matches!(frame, Outbound::Chat { .. }));
}

#[tokio::test]
async fn test_chat_rate_limit_rejects_the_third_message() {
    // given: 2 messages per minute
    let addr = start_server(RateLimitConfig::per_minute(2)).await;
    let mut a = connect(addr).await;
    let _ = guest_name(&mut a).await;

    // when:
    for text in [r#"{"type":"chat","text":"1"}"#, r#"{"type":"chat","text":"2"}"#, r#"{"type":"chat","text":"3"}"#] {
        send_json(&mut a, text).await;
    }

    // then: two broadcasts, then one error with a wait hint
    assert!(matches!(next_frame_of_kind(&mut a, "chat").await, Outbound::Chat { .. }));
    assert!(matches!(next_frame_of_kind(&mut a, "chat").await, Outbound::Chat { .. }));
    let Outbound::Error { message } = next_frame_of_kind(&mut a, "error").await else {
        unreachable!()
    };
    assert!(message.starts_with("Rate limit exceeded."));
}

#[tokio::test]
async fn test_abrupt_disconnect_does_not_break_delivery_to_others() {
    // given:
    let addr = start_server(RateLimitConfig::disabled()).await;
    let mut a = connect(addr).await;
    let _ = guest_name(&mut a).await;
    let mut b = connect(addr).await;
    let _ = guest_name(&mut b).await;
    let mut c = connect(addr).await;
    let _ = guest_name(&mut c).await;

    // when: one peer vanishes without a close handshake, then a chat goes out
    drop(c);
    send_json(&mut a, r#"{"type":"chat","text":"carry on"}"#).await;

    // then: the remaining connections both receive the message
    for ws in [&mut a, &mut b] {
        let Outbound::Chat { text, .. } = next_frame_of_kind(ws, "chat").await else {
            unreachable!()
        };
        assert_eq!(text, "carry on");
    }
}

#[tokio::test]
async fn test_malformed_frame_keeps_the_session_alive() {
    // given:
    let addr = start_server(RateLimitConfig::disabled()).await;
    let mut a = connect(addr).await;
    let _ = guest_name(&mut a).await;

    // when:
    send_json(&mut a, "this is not json").await;
    let Outbound::Error { message } = next_frame_of_kind(&mut a, "error").await else {
        unreachable!()
    };

    // then: the error names the protocol problem and the session still works
    assert_eq!(message, "message must be valid JSON with a known \"type\" field");
    send_json(&mut a, r#"{"type":"ping"}"#).await;
    assert!(matches!(
        next_frame_of_kind(&mut a, "pong").await,
        Outbound::Pong { .. }
    ));
}
