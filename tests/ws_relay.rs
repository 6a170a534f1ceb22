//! WebSocket relay tests
//!
//! Serves the full app on an ephemeral port and drives `/ws` with a real
//! WebSocket client.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use wellwatch::api::{create_app, AppState};
use wellwatch::config::AppConfig;
use wellwatch::relay::{LiveFeed, RelayHub, RelayStats, ServerMessage};
use wellwatch::storage::InMemoryStore;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn spawn_server(config: AppConfig) -> (SocketAddr, RelayHub) {
    let state = AppState::new(Arc::new(InMemoryStore::new()), config);
    let relay = state.relay.clone();
    let app = create_app(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, relay)
}

async fn connect(addr: SocketAddr) -> Client {
    let (client, _response) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    client
}

async fn send_json(client: &mut Client, value: serde_json::Value) {
    client.send(Message::Text(value.to_string())).await.unwrap();
}

/// Next relay event, skipping control frames.
async fn next_event(client: &mut Client) -> ServerMessage {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .expect("relay event within 5s")
            .expect("socket open")
            .unwrap();
        if let Message::Text(text) = frame {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

async fn wait_for_stats(relay: &RelayHub, expected: RelayStats) {
    for _ in 0..200 {
        if relay.stats() == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("relay stats stuck at {:?}", relay.stats());
}

#[tokio::test]
async fn test_malformed_frames_do_not_drop_connection() {
    let (addr, relay) = spawn_server(AppConfig::default()).await;
    let mut client = connect(addr).await;
    assert!(matches!(next_event(&mut client).await, ServerMessage::Message(_)));

    client.send(Message::Text("not json".to_string())).await.unwrap();
    send_json(&mut client, json!({ "type": "drill-faster", "data": "W1" })).await;
    client.send(Message::Binary(vec![0xff, 0xfe])).await.unwrap();
    send_json(&mut client, json!({ "type": "join-well", "data": "W1" })).await;

    match next_event(&mut client).await {
        ServerMessage::JoinedWell(joined) => assert_eq!(joined.well_id, "W1"),
        other => panic!("expected joined-well, got {other:?}"),
    }
    assert!(matches!(
        next_event(&mut client).await,
        ServerMessage::LatestData(ref latest) if latest.well_id == "W1"
    ));
    assert_eq!(relay.stats().channels, 1);
}

#[tokio::test]
async fn test_close_cleans_up_relay_state() {
    let mut config = AppConfig::default();
    config.relay.simulation_interval_ms = 50;
    let (addr, relay) = spawn_server(config).await;

    let mut client = connect(addr).await;
    next_event(&mut client).await;
    send_json(&mut client, json!({ "type": "join-well", "data": { "wellId": "W1" } })).await;
    send_json(&mut client, json!({ "type": "start-simulation", "data": "W1" })).await;
    wait_for_stats(
        &relay,
        RelayStats {
            connections: 1,
            channels: 1,
            simulations: 1,
        },
    )
    .await;

    client.close(None).await.unwrap();
    wait_for_stats(
        &relay,
        RelayStats {
            connections: 0,
            channels: 0,
            simulations: 0,
        },
    )
    .await;
}

#[tokio::test]
async fn test_publish_reaches_other_subscriber() {
    let (addr, _relay) = spawn_server(AppConfig::default()).await;
    let mut sender = connect(addr).await;
    let mut viewer = connect(addr).await;
    next_event(&mut sender).await;
    next_event(&mut viewer).await;

    send_json(&mut viewer, json!({ "type": "join-well", "data": "W7" })).await;
    next_event(&mut viewer).await;
    next_event(&mut viewer).await;

    send_json(
        &mut sender,
        json!({
            "type": "drilling-parameter-update",
            "data": { "wellId": "W7", "name": "ROP", "value": 31.5, "unit": "m/h" }
        }),
    )
    .await;

    match next_event(&mut viewer).await {
        ServerMessage::DrillingParameterUpdate(update) => {
            assert_eq!(update.well_id, "W7");
            assert_eq!(update.value, 31.5);
        }
        other => panic!("expected drilling-parameter-update, got {other:?}"),
    }
}

#[tokio::test]
async fn test_live_feed_keeps_configured_history() {
    let mut config = AppConfig::default();
    config.relay.simulation_interval_ms = 20;
    config.relay.parameter_history = 3;
    let mut feed = LiveFeed::from_config(&config.relay);
    let (addr, _relay) = spawn_server(config).await;

    let mut client = connect(addr).await;
    send_json(&mut client, json!({ "type": "join-well", "data": "W1" })).await;
    send_json(&mut client, json!({ "type": "start-simulation", "data": "W1" })).await;

    let mut updates = 0;
    while updates < 5 {
        let event = next_event(&mut client).await;
        if matches!(event, ServerMessage::DrillingParameterUpdate(_)) {
            updates += 1;
        }
        feed.apply(event);
    }

    assert_eq!(feed.joined_well(), Some("W1"));
    assert!(feed.latest().is_some());
    assert_eq!(feed.parameter_count(), 3);
    assert!(feed.parameter_updates().all(|u| u.well_id == "W1"));
}
