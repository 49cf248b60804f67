//! Backend worker: a dedicated thread hosting a tokio runtime that drives
//! the orders client. Commands arrive over a bounded channel and run one at
//! a time, in order; client broadcast events are pumped back as `UiEvent`s.

use std::thread;

use client_core::{ClientEvent, OrdersApi, OrdersClient};
use crossbeam_channel::{Receiver, Sender};

use crate::events::{BackendCommand, UiError, UiErrorContext, UiEvent};

pub fn spawn_backend_thread(cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>) {
    thread::spawn(move || {
        let _ = ui_tx.try_send(UiEvent::Info("Backend worker starting...".to_string()));
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let client = OrdersClient::new();
            let _ = ui_tx.try_send(UiEvent::Info("Backend worker ready".to_string()));

            let mut events = client.subscribe_events();
            let pump_tx = ui_tx.clone();
            let event_pump = tokio::spawn(async move {
                while let Ok(event) = events.recv().await {
                    let forwarded = match event {
                        ClientEvent::OrdersLoaded(orders) => UiEvent::OrdersLoaded(orders),
                        ClientEvent::OrderLoaded(order) => UiEvent::OrderLoaded(order),
                        ClientEvent::HubStatusChanged(status) => UiEvent::HubStatusChanged(status),
                        ClientEvent::Error(message) => UiEvent::Error(UiError::from_message(
                            UiErrorContext::General,
                            message,
                        )),
                    };
                    if pump_tx.try_send(forwarded).is_err() {
                        break;
                    }
                }
            });

            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    BackendCommand::Connect { server_url } => {
                        match client.connect(&server_url).await {
                            Ok(()) => {
                                let _ = ui_tx.try_send(UiEvent::ConnectOk);
                                reload_orders(&client, &ui_tx).await;
                            }
                            Err(err) => {
                                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                                    UiErrorContext::Connect,
                                    format!("{err:#}"),
                                )));
                            }
                        }
                    }
                    BackendCommand::Disconnect => {
                        if let Err(err) = client.disconnect().await {
                            let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                                UiErrorContext::General,
                                format!("disconnect failed: {err:#}"),
                            )));
                        }
                    }
                    BackendCommand::LoadOrders => {
                        reload_orders(&client, &ui_tx).await;
                    }
                    BackendCommand::LoadOrder { order_id } => {
                        // The record itself arrives through the event pump.
                        if let Err(err) = client.fetch_order(&order_id).await {
                            let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                                UiErrorContext::LoadOrder,
                                format!("order fetch failed: {err:#}"),
                            )));
                        }
                    }
                    BackendCommand::CreateOrder { request } => {
                        match client.create_order(request).await {
                            Ok(created) => {
                                let _ = ui_tx.try_send(UiEvent::OrderSaved {
                                    order_id: created.id,
                                });
                                reload_orders(&client, &ui_tx).await;
                            }
                            Err(err) => {
                                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                                    UiErrorContext::SaveOrder,
                                    format!("order create failed: {err:#}"),
                                )));
                            }
                        }
                    }
                    BackendCommand::UpdateOrder { order } => {
                        let order_id = order.id.clone();
                        match client.update_order(order).await {
                            Ok(()) => {
                                let _ = ui_tx.try_send(UiEvent::OrderSaved { order_id });
                                reload_orders(&client, &ui_tx).await;
                            }
                            Err(err) => {
                                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                                    UiErrorContext::SaveOrder,
                                    format!("order update failed: {err:#}"),
                                )));
                            }
                        }
                    }
                    BackendCommand::DeleteOrder { order_id } => {
                        match client.delete_order(&order_id).await {
                            Ok(()) => {
                                let _ = ui_tx.try_send(UiEvent::OrderDeleted { order_id });
                                reload_orders(&client, &ui_tx).await;
                            }
                            Err(err) => {
                                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                                    UiErrorContext::DeleteOrder,
                                    format!("order delete failed: {err:#}"),
                                )));
                            }
                        }
                    }
                }
            }

            event_pump.abort();
            tracing::info!("backend worker stopped: command channel closed");
        });
    });
}

/// Re-fetches the list; the rows reach the UI through the event pump.
async fn reload_orders(client: &std::sync::Arc<OrdersClient>, ui_tx: &Sender<UiEvent>) {
    if let Err(err) = client.list_orders().await {
        let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
            UiErrorContext::LoadOrders,
            format!("order list failed: {err:#}"),
        )));
    }
}
