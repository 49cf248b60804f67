use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{OrderId, OrderStatus};

/// Wire shape of an order as the collaborator service stores it. Field
/// names on the wire are the service's Portuguese keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: OrderId,
    #[serde(rename = "cliente")]
    pub customer: String,
    #[serde(rename = "produto")]
    pub product: String,
    #[serde(rename = "data")]
    pub created_at: DateTime<Utc>,
    pub status: OrderStatus,
    #[serde(rename = "valor")]
    pub total: f64,
}

/// Body of `POST /orders`. The service assigns the identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(rename = "cliente")]
    pub customer: String,
    #[serde(rename = "produto")]
    pub product: String,
    #[serde(rename = "data")]
    pub created_at: DateTime<Utc>,
    pub status: OrderStatus,
    #[serde(rename = "valor")]
    pub total: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HubEvent {
    OrderUpdated,
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
