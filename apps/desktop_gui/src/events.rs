//! Commands queued from the UI to the backend worker, the events coming
//! back, and error classification for the status line / banner.

use crossbeam_channel::{Sender, TrySendError};
use shared::{
    domain::OrderId,
    protocol::{CreateOrderRequest, OrderRecord},
};

use client_core::HubConnection;

pub enum BackendCommand {
    Connect { server_url: String },
    Disconnect,
    LoadOrders,
    LoadOrder { order_id: OrderId },
    CreateOrder { request: CreateOrderRequest },
    UpdateOrder { order: OrderRecord },
    DeleteOrder { order_id: OrderId },
}

pub enum UiEvent {
    ConnectOk,
    Info(String),
    OrdersLoaded(Vec<OrderRecord>),
    OrderLoaded(OrderRecord),
    OrderSaved { order_id: OrderId },
    OrderDeleted { order_id: OrderId },
    HubStatusChanged(HubConnection),
    Error(UiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Transport,
    NotFound,
    Validation,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    Connect,
    LoadOrders,
    LoadOrder,
    SaveOrder,
    DeleteOrder,
    General,
}

pub fn classify_connect_failure(message: &str) -> String {
    let lower = message.to_ascii_lowercase();
    if lower.contains("backend worker startup failure") {
        "Backend worker startup failure; verify local app environment and retry.".to_string()
    } else if lower.contains("failed to connect")
        || lower.contains("connection refused")
        || lower.contains("dns")
        || lower.contains("timed out")
    {
        "Server unreachable; check URL/network and retry.".to_string()
    } else {
        format!("Connect error: {message}")
    }
}

pub fn err_label(category: UiErrorCategory) -> &'static str {
    match category {
        UiErrorCategory::Transport => "Transport",
        UiErrorCategory::NotFound => "Not found",
        UiErrorCategory::Validation => "Validation",
        UiErrorCategory::Unknown => "Unexpected",
    }
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let message_lower = message.to_ascii_lowercase();
        let category = if message_lower.contains("404") || message_lower.contains("not found") {
            UiErrorCategory::NotFound
        } else if message_lower.contains("invalid")
            || message_lower.contains("missing")
            || message_lower.contains("malformed")
        {
            UiErrorCategory::Validation
        } else if message_lower.contains("timeout")
            || message_lower.contains("timed out")
            || message_lower.contains("connection")
            || message_lower.contains("network")
            || message_lower.contains("transport")
            || message_lower.contains("unavailable")
            || message_lower.contains("disconnect")
            || message_lower.contains("dns")
        {
            UiErrorCategory::Transport
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

pub fn dispatch_backend_command(
    cmd_tx: &Sender<BackendCommand>,
    cmd: BackendCommand,
    status: &mut String,
) {
    let cmd_name = match &cmd {
        BackendCommand::Connect { .. } => "connect",
        BackendCommand::Disconnect => "disconnect",
        BackendCommand::LoadOrders => "load_orders",
        BackendCommand::LoadOrder { .. } => "load_order",
        BackendCommand::CreateOrder { .. } => "create_order",
        BackendCommand::UpdateOrder { .. } => "update_order",
        BackendCommand::DeleteOrder { .. } => "delete_order",
    };

    match cmd_tx.try_send(cmd) {
        Ok(()) => tracing::debug!(command = cmd_name, "queued ui->backend command"),
        Err(TrySendError::Full(_)) => {
            *status = "UI command queue is full; please retry".to_string();
        }
        Err(TrySendError::Disconnected(_)) => {
            *status = "Backend command processor disconnected (possible startup/runtime failure); restart the app"
                .to_string();
        }
    }
}
