use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use shared::{
    domain::OrderId,
    protocol::{CreateOrderRequest, HubEvent, OrderRecord},
};
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};
use url::Url;

const HUB_PATH: &str = "/hub/orders";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HubConnection {
    Connected,
    Disconnected,
}

#[derive(Debug, Clone)]
pub enum ClientEvent {
    OrdersLoaded(Vec<OrderRecord>),
    OrderLoaded(OrderRecord),
    HubStatusChanged(HubConnection),
    Error(String),
}

/// Client-side surface of the orders service: the five REST verbs plus the
/// hub subscription lifecycle.
#[async_trait]
pub trait OrdersApi: Send + Sync {
    async fn connect(&self, server_url: &str) -> Result<()>;
    async fn disconnect(&self) -> Result<()>;
    async fn list_orders(&self) -> Result<Vec<OrderRecord>>;
    async fn fetch_order(&self, order_id: &OrderId) -> Result<OrderRecord>;
    async fn create_order(&self, request: CreateOrderRequest) -> Result<OrderRecord>;
    async fn update_order(&self, order: OrderRecord) -> Result<()>;
    async fn delete_order(&self, order_id: &OrderId) -> Result<()>;
    fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent>;
}

pub struct OrdersClient {
    http: Client,
    inner: Mutex<OrdersClientState>,
    hub_subscription: Mutex<Option<HubSubscription>>,
    events: broadcast::Sender<ClientEvent>,
}

struct OrdersClientState {
    server_url: Option<String>,
}

struct HubSubscription {
    reader_task: JoinHandle<()>,
}

/// Maps the REST base URL onto the hub websocket endpoint.
pub fn hub_url_for(server_url: &str) -> Result<String> {
    let ws_base = if server_url.starts_with("https://") {
        server_url.replacen("https://", "wss://", 1)
    } else if server_url.starts_with("http://") {
        server_url.replacen("http://", "ws://", 1)
    } else {
        return Err(anyhow!("server URL must start with http:// or https://"));
    };
    Ok(format!("{}{HUB_PATH}", ws_base.trim_end_matches('/')))
}

impl OrdersClient {
    pub fn new() -> Arc<Self> {
        let (events, _) = broadcast::channel(1024);
        Arc::new(Self {
            http: Client::new(),
            inner: Mutex::new(OrdersClientState { server_url: None }),
            hub_subscription: Mutex::new(None),
            events,
        })
    }

    async fn session(&self) -> Result<String> {
        let guard = self.inner.lock().await;
        guard
            .server_url
            .clone()
            .ok_or_else(|| anyhow!("not connected: missing server URL"))
    }

    async fn list_orders_impl(&self) -> Result<Vec<OrderRecord>> {
        let server_url = self.session().await?;
        let orders: Vec<OrderRecord> = self
            .http
            .get(format!("{server_url}/orders"))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .context("invalid order list payload")?;

        debug!(count = orders.len(), "loaded order list");
        let _ = self.events.send(ClientEvent::OrdersLoaded(orders.clone()));
        Ok(orders)
    }

    async fn spawn_hub_reader(self: &Arc<Self>, server_url: &str) -> Result<()> {
        let hub_url = hub_url_for(server_url)?;
        let (ws_stream, _) = connect_async(hub_url.as_str())
            .await
            .with_context(|| format!("failed to connect order hub: {hub_url}"))?;
        let (_, mut hub_reader) = ws_stream.split();

        let client = Arc::clone(self);
        let reader_task = tokio::spawn(async move {
            while let Some(msg) = hub_reader.next().await {
                match msg {
                    Ok(Message::Text(text)) => match serde_json::from_str::<HubEvent>(&text) {
                        Ok(HubEvent::OrderUpdated) => {
                            debug!("hub: order updated, reloading list");
                            if let Err(err) = client.list_orders_impl().await {
                                let _ = client.events.send(ClientEvent::Error(format!(
                                    "order reload after hub event failed: {err:#}"
                                )));
                            }
                        }
                        Err(err) => {
                            warn!(error = %err, "hub: ignoring malformed event frame");
                            let _ = client
                                .events
                                .send(ClientEvent::Error(format!("invalid hub event: {err}")));
                        }
                    },
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(err) => {
                        let _ = client
                            .events
                            .send(ClientEvent::Error(format!("hub receive failed: {err}")));
                        break;
                    }
                }
            }
            info!("hub: subscription ended");
            let _ = client
                .events
                .send(ClientEvent::HubStatusChanged(HubConnection::Disconnected));
        });

        let mut guard = self.hub_subscription.lock().await;
        if let Some(previous) = guard.replace(HubSubscription { reader_task }) {
            previous.reader_task.abort();
        }

        Ok(())
    }
}

#[async_trait]
impl OrdersApi for Arc<OrdersClient> {
    async fn connect(&self, server_url: &str) -> Result<()> {
        let parsed = Url::parse(server_url).context("invalid server URL")?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(anyhow!("server URL must start with http:// or https://"));
        }
        let server_url = server_url.trim_end_matches('/').to_string();

        {
            let mut guard = self.inner.lock().await;
            guard.server_url = Some(server_url.clone());
        }

        if let Err(err) = self.spawn_hub_reader(&server_url).await {
            let mut guard = self.inner.lock().await;
            guard.server_url = None;
            return Err(err);
        }

        info!(server_url = %server_url, "connected to orders service");
        let _ = self
            .events
            .send(ClientEvent::HubStatusChanged(HubConnection::Connected));
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        let subscription = {
            let mut guard = self.hub_subscription.lock().await;
            guard.take()
        };
        if let Some(subscription) = subscription {
            subscription.reader_task.abort();
        }

        {
            let mut guard = self.inner.lock().await;
            guard.server_url = None;
        }

        info!("disconnected from orders service");
        let _ = self
            .events
            .send(ClientEvent::HubStatusChanged(HubConnection::Disconnected));
        Ok(())
    }

    async fn list_orders(&self) -> Result<Vec<OrderRecord>> {
        self.list_orders_impl().await
    }

    async fn fetch_order(&self, order_id: &OrderId) -> Result<OrderRecord> {
        let server_url = self.session().await?;
        let order: OrderRecord = self
            .http
            .get(format!("{server_url}/orders/{}", order_id.0))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .with_context(|| format!("invalid order payload for {}", order_id.0))?;

        let _ = self.events.send(ClientEvent::OrderLoaded(order.clone()));
        Ok(order)
    }

    async fn create_order(&self, request: CreateOrderRequest) -> Result<OrderRecord> {
        let server_url = self.session().await?;
        let created: OrderRecord = self
            .http
            .post(format!("{server_url}/orders"))
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .context("invalid created order payload")?;

        info!(order_id = %created.id, "created order");
        Ok(created)
    }

    async fn update_order(&self, order: OrderRecord) -> Result<()> {
        let server_url = self.session().await?;
        self.http
            .put(format!("{server_url}/orders/{}", order.id.0))
            .json(&order)
            .send()
            .await?
            .error_for_status()?;

        info!(order_id = %order.id, "updated order");
        Ok(())
    }

    async fn delete_order(&self, order_id: &OrderId) -> Result<()> {
        let server_url = self.session().await?;
        self.http
            .delete(format!("{server_url}/orders/{}", order_id.0))
            .send()
            .await?
            .error_for_status()?;

        info!(order_id = %order_id, "deleted order");
        Ok(())
    }

    fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
