//! HTTP surface: the WebSocket upgrade endpoint and a health check.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json,
    extract::{ConnectInfo, State, WebSocketUpgrade},
    http::HeaderMap,
    response::IntoResponse,
};

use crate::session;
use crate::state::AppState;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> impl IntoResponse {
    let ip = extract_client_ip(&headers, addr, should_trust_proxy_headers(addr));
    ws.on_upgrade(move |socket| session::handle_socket(state, socket, ip))
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

fn trust_proxy_headers_configured() -> bool {
    std::env::var("TRUST_PROXY_HEADERS")
        .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
        .unwrap_or(false)
}

fn should_trust_proxy_headers(addr: SocketAddr) -> bool {
    // A reverse proxy on the same host appears as loopback; trust its
    // forwarded headers. Non-loopback peers must opt in via
    // TRUST_PROXY_HEADERS=true.
    addr.ip().is_loopback() || trust_proxy_headers_configured()
}

fn extract_client_ip(headers: &HeaderMap, addr: SocketAddr, trust_proxy: bool) -> String {
    if !trust_proxy {
        return addr.ip().to_string();
    }

    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(|s| s.trim().to_string())
        })
        .unwrap_or_else(|| addr.ip().to_string())
}
