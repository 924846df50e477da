//! Discord gateway connection task.
//!
//! Runs alongside the request-serving loop: connects, identifies, heartbeats
//! on the interval from HELLO, flips the session's readiness flag on READY,
//! and keeps the entity caches in sync from dispatch events. Reconnects with
//! a fixed delay whenever the connection drops.

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;

use super::Inner;
use crate::platform::PlatformError;

pub const DEFAULT_GATEWAY_URL: &str = "wss://gateway.discord.gg/?v=10&encoding=json";

const RECONNECT_DELAY: Duration = Duration::from_secs(5);
/// Fallback heartbeat period when HELLO carries no interval.
const DEFAULT_HEARTBEAT_MS: u64 = 41_250;

const OP_DISPATCH: u8 = 0;
const OP_HEARTBEAT: u8 = 1;
const OP_IDENTIFY: u8 = 2;
const OP_RECONNECT: u8 = 7;
const OP_INVALID_SESSION: u8 = 9;
const OP_HELLO: u8 = 10;

/// GUILDS | GUILD_MEMBERS | GUILD_VOICE_STATES | GUILD_MESSAGES | MESSAGE_CONTENT.
/// Member and message-content intents are privileged and must be enabled on
/// the bot's application page.
const INTENTS: u64 = (1 << 0) | (1 << 1) | (1 << 7) | (1 << 9) | (1 << 15);

#[derive(Debug, Deserialize)]
pub(crate) struct GatewayPayload {
    pub op: u8,
    #[serde(default)]
    pub d: Value,
    #[serde(default)]
    pub s: Option<u64>,
    #[serde(default)]
    pub t: Option<String>,
}

pub(crate) fn parse_payload(text: &str) -> Option<GatewayPayload> {
    match serde_json::from_str(text) {
        Ok(payload) => Some(payload),
        Err(e) => {
            log::debug!("discarding unparseable gateway frame: {e}");
            None
        }
    }
}

fn identify_payload(token: &str) -> Value {
    json!({
        "op": OP_IDENTIFY,
        "d": {
            "token": token,
            "intents": INTENTS,
            "properties": {
                "os": std::env::consts::OS,
                "browser": "discord-mcp",
                "device": "discord-mcp",
            },
        },
    })
}

fn heartbeat_payload(seq: Option<u64>) -> Value {
    json!({"op": OP_HEARTBEAT, "d": seq})
}

/// Connection lifecycle loop; never returns.
pub(crate) async fn run(inner: Arc<Inner>, gateway_url: String) {
    loop {
        match connect_once(&inner, &gateway_url).await {
            Ok(()) => log::warn!("gateway connection closed, reconnecting in {RECONNECT_DELAY:?}"),
            Err(e) => log::warn!("gateway connection error: {e}, reconnecting in {RECONNECT_DELAY:?}"),
        }
        inner.set_ready(false);
        tokio::time::sleep(RECONNECT_DELAY).await;
    }
}

/// One connection from handshake to disconnect. `Ok(())` means the server
/// closed or asked for a fresh session; `Err` is a transport failure.
async fn connect_once(inner: &Inner, gateway_url: &str) -> Result<(), PlatformError> {
    let (stream, _) = connect_async(gateway_url)
        .await
        .map_err(|e| PlatformError::Gateway(e.to_string()))?;
    let (mut sink, mut stream) = stream.split();

    // The first frame must be HELLO with the heartbeat interval.
    let hello = loop {
        let Some(text) = next_text(&mut stream).await? else {
            return Ok(());
        };
        match parse_payload(&text) {
            Some(payload) if payload.op == OP_HELLO => break payload,
            _ => continue,
        }
    };
    let heartbeat_ms = hello
        .d
        .get("heartbeat_interval")
        .and_then(Value::as_u64)
        .unwrap_or(DEFAULT_HEARTBEAT_MS);

    send_json(&mut sink, identify_payload(&inner.token)).await?;
    log::debug!("gateway identified, heartbeat every {heartbeat_ms}ms");

    let period = Duration::from_millis(heartbeat_ms);
    let mut heartbeat = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    let mut seq: Option<u64> = None;

    loop {
        tokio::select! {
            _ = heartbeat.tick() => {
                send_json(&mut sink, heartbeat_payload(seq)).await?;
            }
            frame = stream.next() => {
                let Some(frame) = frame else { return Ok(()) };
                let msg = frame.map_err(|e| PlatformError::Gateway(e.to_string()))?;
                match msg {
                    WsMessage::Text(text) => {
                        let Some(payload) = parse_payload(text.as_str()) else { continue };
                        if let Some(s) = payload.s {
                            seq = Some(s);
                        }
                        match payload.op {
                            OP_DISPATCH => {
                                let event = payload.t.as_deref().unwrap_or("");
                                inner.apply_event(event, payload.d).await;
                            }
                            OP_HEARTBEAT => send_json(&mut sink, heartbeat_payload(seq)).await?,
                            OP_RECONNECT | OP_INVALID_SESSION => {
                                log::info!("gateway requested a new session");
                                return Ok(());
                            }
                            _ => {}
                        }
                    }
                    WsMessage::Ping(data) => {
                        sink.send(WsMessage::Pong(data))
                            .await
                            .map_err(|e| PlatformError::Gateway(e.to_string()))?;
                    }
                    WsMessage::Close(_) => return Ok(()),
                    _ => {}
                }
            }
        }
    }
}

async fn send_json<S>(sink: &mut S, payload: Value) -> Result<(), PlatformError>
where
    S: SinkExt<WsMessage> + Unpin,
    S::Error: std::fmt::Display,
{
    sink.send(WsMessage::text(payload.to_string()))
        .await
        .map_err(|e| PlatformError::Gateway(e.to_string()))
}

async fn next_text<S>(stream: &mut S) -> Result<Option<String>, PlatformError>
where
    S: StreamExt<Item = Result<WsMessage, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    while let Some(frame) = stream.next().await {
        let msg = frame.map_err(|e| PlatformError::Gateway(e.to_string()))?;
        match msg {
            WsMessage::Text(text) => return Ok(Some(text.to_string())),
            WsMessage::Close(_) => return Ok(None),
            _ => {}
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hello_frame() {
        let payload =
            parse_payload(r#"{"op":10,"d":{"heartbeat_interval":41250},"s":null,"t":null}"#)
                .unwrap();
        assert_eq!(payload.op, OP_HELLO);
        assert_eq!(
            payload.d.get("heartbeat_interval").and_then(Value::as_u64),
            Some(41250)
        );
    }

    #[test]
    fn parses_dispatch_frame_with_sequence() {
        let payload =
            parse_payload(r#"{"op":0,"t":"GUILD_CREATE","s":3,"d":{"id":"100","name":"g"}}"#)
                .unwrap();
        assert_eq!(payload.op, OP_DISPATCH);
        assert_eq!(payload.s, Some(3));
        assert_eq!(payload.t.as_deref(), Some("GUILD_CREATE"));
    }

    #[test]
    fn rejects_non_json_frames() {
        assert!(parse_payload("not json").is_none());
    }

    #[test]
    fn identify_carries_token_and_intents() {
        let payload = identify_payload("secret-token");
        assert_eq!(payload["op"], OP_IDENTIFY);
        assert_eq!(payload["d"]["token"], "secret-token");
        assert_eq!(payload["d"]["intents"], INTENTS);
    }

    #[test]
    fn heartbeat_encodes_sequence() {
        assert_eq!(heartbeat_payload(None)["d"], Value::Null);
        assert_eq!(heartbeat_payload(Some(7))["d"], 7);
    }
}
