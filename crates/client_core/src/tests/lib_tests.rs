use super::*;
use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocketUpgrade},
        Path, State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use shared::domain::OrderStatus;
use tokio::{net::TcpListener, sync::oneshot};
use uuid::Uuid;

#[derive(Clone)]
struct OrdersServerState {
    orders: Arc<Mutex<Vec<OrderRecord>>>,
    list_hits: Arc<AtomicUsize>,
    created_tx: Arc<Mutex<Option<oneshot::Sender<serde_json::Value>>>>,
    updated_tx: Arc<Mutex<Option<oneshot::Sender<(String, serde_json::Value)>>>>,
    deleted_tx: Arc<Mutex<Option<oneshot::Sender<String>>>>,
    hub_frames: Arc<Mutex<Vec<WsMessage>>>,
}

fn sample_order(id: &str, status: OrderStatus) -> OrderRecord {
    OrderRecord {
        id: OrderId::from(id),
        customer: "Maria Souza".to_string(),
        product: "Teclado mecânico".to_string(),
        created_at: "2024-03-09T14:30:00Z".parse().expect("timestamp"),
        status,
        total: 199.9,
    }
}

async fn handle_list_orders(State(state): State<OrdersServerState>) -> Json<Vec<OrderRecord>> {
    state.list_hits.fetch_add(1, Ordering::SeqCst);
    Json(state.orders.lock().await.clone())
}

async fn handle_fetch_order(
    State(state): State<OrdersServerState>,
    Path(order_id): Path<String>,
) -> Result<Json<OrderRecord>, StatusCode> {
    state
        .orders
        .lock()
        .await
        .iter()
        .find(|order| order.id.as_str() == order_id)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn handle_create_order(
    State(state): State<OrdersServerState>,
    Json(payload): Json<serde_json::Value>,
) -> Json<OrderRecord> {
    let status_code = payload["status"].as_u64().unwrap_or(0) as u8;
    let record = OrderRecord {
        id: OrderId(Uuid::new_v4().to_string()),
        customer: payload["cliente"].as_str().unwrap_or_default().to_string(),
        product: payload["produto"].as_str().unwrap_or_default().to_string(),
        created_at: "2024-05-01T12:00:00Z".parse().expect("timestamp"),
        status: OrderStatus::try_from(status_code).unwrap_or(OrderStatus::Pending),
        total: payload["valor"].as_f64().unwrap_or_default(),
    };
    state.orders.lock().await.push(record.clone());
    if let Some(tx) = state.created_tx.lock().await.take() {
        let _ = tx.send(payload);
    }
    Json(record)
}

async fn handle_update_order(
    State(state): State<OrdersServerState>,
    Path(order_id): Path<String>,
    Json(payload): Json<serde_json::Value>,
) -> StatusCode {
    if let Some(tx) = state.updated_tx.lock().await.take() {
        let _ = tx.send((order_id, payload));
    }
    StatusCode::NO_CONTENT
}

async fn handle_delete_order(
    State(state): State<OrdersServerState>,
    Path(order_id): Path<String>,
) -> StatusCode {
    if let Some(tx) = state.deleted_tx.lock().await.take() {
        let _ = tx.send(order_id);
    }
    StatusCode::NO_CONTENT
}

async fn handle_hub_socket(
    State(state): State<OrdersServerState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |mut socket| async move {
        let frames = state.hub_frames.lock().await.clone();
        for frame in frames {
            if socket.send(frame).await.is_err() {
                return;
            }
        }
        // Keep the hub open so tests observe steady-state behavior.
        tokio::time::sleep(Duration::from_secs(30)).await;
    })
}

async fn spawn_orders_server(
    seed: Vec<OrderRecord>,
    hub_frames: Vec<WsMessage>,
) -> Result<(String, OrdersServerState)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = OrdersServerState {
        orders: Arc::new(Mutex::new(seed)),
        list_hits: Arc::new(AtomicUsize::new(0)),
        created_tx: Arc::new(Mutex::new(None)),
        updated_tx: Arc::new(Mutex::new(None)),
        deleted_tx: Arc::new(Mutex::new(None)),
        hub_frames: Arc::new(Mutex::new(hub_frames)),
    };
    let app = Router::new()
        .route("/orders", get(handle_list_orders))
        .route("/orders", post(handle_create_order))
        .route("/orders/:id", get(handle_fetch_order))
        .route("/orders/:id", put(handle_update_order))
        .route("/orders/:id", delete(handle_delete_order))
        .route("/hub/orders", get(handle_hub_socket))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}"), state))
}

async fn seed_connected_client(server_url: &str) -> Arc<OrdersClient> {
    let client = OrdersClient::new();
    {
        let mut inner = client.inner.lock().await;
        inner.server_url = Some(server_url.to_string());
    }
    client
}

#[test]
fn hub_url_swaps_scheme_and_appends_path() {
    assert_eq!(
        hub_url_for("http://127.0.0.1:8080").expect("http"),
        "ws://127.0.0.1:8080/hub/orders"
    );
    assert_eq!(
        hub_url_for("https://orders.example.com/").expect("https"),
        "wss://orders.example.com/hub/orders"
    );
}

#[test]
fn hub_url_rejects_non_http_scheme() {
    let err = hub_url_for("ftp://orders.example.com").expect_err("ftp is unsupported");
    assert!(err.to_string().contains("http:// or https://"));
}

#[tokio::test]
async fn connect_rejects_invalid_server_urls() {
    let client = OrdersClient::new();

    let err = client.connect("not a url").await.expect_err("garbage url");
    assert!(err.to_string().contains("invalid server URL"));

    let err = client
        .connect("ftp://orders.example.com")
        .await
        .expect_err("unsupported scheme");
    assert!(err.to_string().contains("http:// or https://"));

    let err = client.list_orders().await.expect_err("no session stored");
    assert!(err.to_string().contains("not connected"));
}

#[tokio::test]
async fn connect_establishes_hub_and_emits_connected() {
    let (server_url, _state) = spawn_orders_server(Vec::new(), Vec::new())
        .await
        .expect("spawn server");
    let client = OrdersClient::new();
    let mut rx = client.subscribe_events();

    client.connect(&server_url).await.expect("connect");

    let status = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if let ClientEvent::HubStatusChanged(status) = rx.recv().await.expect("event") {
                break status;
            }
        }
    })
    .await
    .expect("hub status timeout");
    assert_eq!(status, HubConnection::Connected);
}

#[tokio::test]
async fn list_orders_returns_and_emits_collection() {
    let seed = vec![
        sample_order("o-1", OrderStatus::Pending),
        sample_order("o-2", OrderStatus::Processing),
    ];
    let (server_url, _state) = spawn_orders_server(seed, Vec::new())
        .await
        .expect("spawn server");
    let client = seed_connected_client(&server_url).await;
    let mut rx = client.subscribe_events();

    let orders = client.list_orders().await.expect("list");
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0].id.as_str(), "o-1");
    assert_eq!(orders[1].status, OrderStatus::Processing);

    match rx.recv().await.expect("event") {
        ClientEvent::OrdersLoaded(emitted) => assert_eq!(emitted.len(), 2),
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn fetch_order_returns_single_record_and_emits() {
    let seed = vec![sample_order("o-7", OrderStatus::Finished)];
    let (server_url, _state) = spawn_orders_server(seed, Vec::new())
        .await
        .expect("spawn server");
    let client = seed_connected_client(&server_url).await;
    let mut rx = client.subscribe_events();

    let order = client
        .fetch_order(&OrderId::from("o-7"))
        .await
        .expect("fetch");
    assert_eq!(order.id.as_str(), "o-7");
    assert_eq!(order.status, OrderStatus::Finished);

    match rx.recv().await.expect("event") {
        ClientEvent::OrderLoaded(emitted) => assert_eq!(emitted.id.as_str(), "o-7"),
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn fetch_missing_order_surfaces_status_error() {
    let (server_url, _state) = spawn_orders_server(Vec::new(), Vec::new())
        .await
        .expect("spawn server");
    let client = seed_connected_client(&server_url).await;

    let err = client
        .fetch_order(&OrderId::from("ghost"))
        .await
        .expect_err("missing order");
    assert!(err.to_string().contains("404"), "unexpected error: {err:#}");
}

#[tokio::test]
async fn create_order_posts_wire_payload_without_id() {
    let (server_url, state) = spawn_orders_server(Vec::new(), Vec::new())
        .await
        .expect("spawn server");
    let (tx, rx) = oneshot::channel();
    *state.created_tx.lock().await = Some(tx);
    let client = seed_connected_client(&server_url).await;

    let created = client
        .create_order(CreateOrderRequest {
            customer: "Ana Prado".to_string(),
            product: "Webcam".to_string(),
            created_at: "2024-06-01T08:00:00Z".parse().expect("timestamp"),
            status: OrderStatus::Processing,
            total: 420.5,
        })
        .await
        .expect("create");

    let payload = rx.await.expect("captured payload");
    assert!(payload.get("id").is_none());
    assert_eq!(payload["cliente"], "Ana Prado");
    assert_eq!(payload["produto"], "Webcam");
    assert_eq!(payload["status"], 1);
    assert_eq!(payload["valor"], 420.5);

    assert!(!created.id.as_str().is_empty());
    assert_eq!(created.customer, "Ana Prado");
}

#[tokio::test]
async fn update_order_puts_full_record_by_id() {
    let (server_url, state) = spawn_orders_server(Vec::new(), Vec::new())
        .await
        .expect("spawn server");
    let (tx, rx) = oneshot::channel();
    *state.updated_tx.lock().await = Some(tx);
    let client = seed_connected_client(&server_url).await;

    let mut order = sample_order("o-9", OrderStatus::Pending);
    order.status = OrderStatus::Finished;
    client.update_order(order).await.expect("update");

    let (path_id, payload) = rx.await.expect("captured payload");
    assert_eq!(path_id, "o-9");
    assert_eq!(payload["id"], "o-9");
    assert_eq!(payload["status"], 2);
    assert_eq!(payload["cliente"], "Maria Souza");
}

#[tokio::test]
async fn delete_order_targets_identifier() {
    let (server_url, state) = spawn_orders_server(Vec::new(), Vec::new())
        .await
        .expect("spawn server");
    let (tx, rx) = oneshot::channel();
    *state.deleted_tx.lock().await = Some(tx);
    let client = seed_connected_client(&server_url).await;

    client
        .delete_order(&OrderId::from("o-3"))
        .await
        .expect("delete");

    let deleted_id = rx.await.expect("captured id");
    assert_eq!(deleted_id, "o-3");
}

#[tokio::test]
async fn hub_event_triggers_exactly_one_reload() {
    let seed = vec![sample_order("o-1", OrderStatus::Pending)];
    let frames = vec![WsMessage::Text(r#"{"type":"order_updated"}"#.to_string())];
    let (server_url, state) = spawn_orders_server(seed, frames)
        .await
        .expect("spawn server");

    let client = OrdersClient::new();
    let mut rx = client.subscribe_events();
    client.connect(&server_url).await.expect("connect");

    let orders = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if let ClientEvent::OrdersLoaded(orders) = rx.recv().await.expect("event") {
                break orders;
            }
        }
    })
    .await
    .expect("reload timeout");
    assert_eq!(orders.len(), 1);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(state.list_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn ignores_non_text_hub_frames() {
    let frames = vec![
        WsMessage::Binary(vec![1, 2, 3]),
        WsMessage::Text(r#"{"type":"order_updated"}"#.to_string()),
    ];
    let (server_url, state) = spawn_orders_server(Vec::new(), frames)
        .await
        .expect("spawn server");

    let client = OrdersClient::new();
    let mut rx = client.subscribe_events();
    client.connect(&server_url).await.expect("connect");

    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if let ClientEvent::OrdersLoaded(_) = rx.recv().await.expect("event") {
                break;
            }
        }
    })
    .await
    .expect("reload timeout");

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(state.list_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn malformed_hub_frame_reports_error_without_reload() {
    let frames = vec![WsMessage::Text(r#"{"type":"order_exploded"}"#.to_string())];
    let (server_url, state) = spawn_orders_server(Vec::new(), frames)
        .await
        .expect("spawn server");

    let client = OrdersClient::new();
    let mut rx = client.subscribe_events();
    client.connect(&server_url).await.expect("connect");

    let message = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if let ClientEvent::Error(message) = rx.recv().await.expect("event") {
                break message;
            }
        }
    })
    .await
    .expect("error event timeout");
    assert!(message.contains("invalid hub event"));

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(state.list_hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn hub_close_frame_surfaces_offline_status() {
    let frames = vec![WsMessage::Close(None)];
    let (server_url, _state) = spawn_orders_server(Vec::new(), frames)
        .await
        .expect("spawn server");

    let client = OrdersClient::new();
    let mut rx = client.subscribe_events();
    client.connect(&server_url).await.expect("connect");

    let mut saw_connected = false;
    let mut saw_disconnected = false;
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if let ClientEvent::HubStatusChanged(status) = rx.recv().await.expect("event") {
                match status {
                    HubConnection::Connected => saw_connected = true,
                    HubConnection::Disconnected => saw_disconnected = true,
                }
                if saw_connected && saw_disconnected {
                    break;
                }
            }
        }
    })
    .await
    .expect("status events timeout");
    assert!(saw_connected && saw_disconnected);
}

#[tokio::test]
async fn disconnect_clears_session_and_emits_offline() {
    let (server_url, _state) = spawn_orders_server(Vec::new(), Vec::new())
        .await
        .expect("spawn server");
    let client = OrdersClient::new();
    client.connect(&server_url).await.expect("connect");

    let mut rx = client.subscribe_events();
    client.disconnect().await.expect("disconnect");

    let status = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if let ClientEvent::HubStatusChanged(status) = rx.recv().await.expect("event") {
                break status;
            }
        }
    })
    .await
    .expect("status timeout");
    assert_eq!(status, HubConnection::Disconnected);

    let err = client.list_orders().await.expect_err("session cleared");
    assert!(err.to_string().contains("not connected"));
}
