//! Modal state machine for the order table: view <-> create <-> edit <->
//! confirm-delete, with in-flight gates so a double click issues exactly one
//! request.

use chrono::{DateTime, NaiveDateTime, Utc};
use shared::{
    domain::{OrderId, OrderStatus},
    protocol::{CreateOrderRequest, OrderRecord},
};
use thiserror::Error;

const DATETIME_LOCAL_FORMAT: &str = "%Y-%m-%dT%H:%M";
const DATETIME_LOCAL_FORMAT_SECONDS: &str = "%Y-%m-%dT%H:%M:%S";

/// Parses a `datetime-local` style value (`AAAA-MM-DDTHH:MM`, optional
/// seconds). The service stores naive timestamps as UTC, so no zone math.
pub fn parse_datetime_local(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, DATETIME_LOCAL_FORMAT_SECONDS)
        .or_else(|_| NaiveDateTime::parse_from_str(value, DATETIME_LOCAL_FORMAT))
        .ok()
        .map(|naive| naive.and_utc())
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("Informe o nome do cliente")]
    MissingCustomer,
    #[error("Informe o produto")]
    MissingProduct,
    #[error("Data inválida (use AAAA-MM-DDTHH:MM)")]
    InvalidDate,
    #[error("Selecione um status")]
    MissingStatus,
    #[error("Valor inválido")]
    InvalidTotal,
}

/// String-typed copy of an order while the form edits it. Fields hold raw
/// input; nothing is parsed until submit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderDraft {
    pub customer: String,
    pub product: String,
    pub date: String,
    pub status: Option<OrderStatus>,
    pub total: String,
}

impl OrderDraft {
    pub fn from_order(order: &OrderRecord) -> Self {
        Self {
            customer: order.customer.clone(),
            product: order.product.clone(),
            date: order.created_at.format(DATETIME_LOCAL_FORMAT).to_string(),
            status: Some(order.status),
            total: format!("{:.2}", order.total),
        }
    }

    pub fn validate(&self) -> Result<ValidatedDraft, DraftError> {
        if self.customer.trim().is_empty() {
            return Err(DraftError::MissingCustomer);
        }
        if self.product.trim().is_empty() {
            return Err(DraftError::MissingProduct);
        }
        let created_at = parse_datetime_local(&self.date).ok_or(DraftError::InvalidDate)?;
        let status = self.status.ok_or(DraftError::MissingStatus)?;
        let total = self
            .total
            .trim()
            .replace(',', ".")
            .parse::<f64>()
            .map_err(|_| DraftError::InvalidTotal)?;

        Ok(ValidatedDraft {
            customer: self.customer.trim().to_string(),
            product: self.product.trim().to_string(),
            created_at,
            status,
            total,
        })
    }
}

/// A draft that passed validation, with every field in wire form.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedDraft {
    pub customer: String,
    pub product: String,
    pub created_at: DateTime<Utc>,
    pub status: OrderStatus,
    pub total: f64,
}

impl ValidatedDraft {
    fn into_create_request(self) -> CreateOrderRequest {
        CreateOrderRequest {
            customer: self.customer,
            product: self.product,
            created_at: self.created_at,
            status: self.status,
            total: self.total,
        }
    }

    fn into_record(self, id: OrderId) -> OrderRecord {
        OrderRecord {
            id,
            customer: self.customer,
            product: self.product,
            created_at: self.created_at,
            status: self.status,
            total: self.total,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormMode {
    Create,
    Edit { order_id: OrderId },
}

/// Request produced by a successful form submit.
#[derive(Debug, Clone)]
pub enum SubmitRequest {
    Create(CreateOrderRequest),
    Update(OrderRecord),
}

#[derive(Debug, Clone, PartialEq)]
pub enum OrderModal {
    Closed,
    /// Detail fetch in flight after a row click.
    Loading { order_id: OrderId },
    Detail {
        order: OrderRecord,
    },
    Form {
        mode: FormMode,
        draft: OrderDraft,
        submitting: bool,
        error: Option<String>,
    },
    ConfirmDelete {
        order: OrderRecord,
        deleting: bool,
    },
}

impl OrderModal {
    pub fn is_open(&self) -> bool {
        !matches!(self, OrderModal::Closed)
    }

    /// Row click: queue a detail fetch and show the loading state.
    pub fn open_loading(&mut self, order_id: OrderId) {
        *self = OrderModal::Loading { order_id };
    }

    /// "Novo Pedido": open the form with an empty draft.
    pub fn open_create(&mut self) {
        *self = OrderModal::Form {
            mode: FormMode::Create,
            draft: OrderDraft::default(),
            submitting: false,
            error: None,
        };
    }

    /// A detail response arrived. Applies in the loading and detail states
    /// (last write wins between overlapping fetches); ignored elsewhere so a
    /// stale response cannot clobber an open form.
    pub fn order_loaded(&mut self, order: OrderRecord) {
        if matches!(self, OrderModal::Loading { .. } | OrderModal::Detail { .. }) {
            *self = OrderModal::Detail { order };
        }
    }

    /// "Editar" on the detail view: pre-fill the draft from the shown order.
    pub fn begin_edit(&mut self) {
        if let OrderModal::Detail { order } = self {
            *self = OrderModal::Form {
                mode: FormMode::Edit {
                    order_id: order.id.clone(),
                },
                draft: OrderDraft::from_order(order),
                submitting: false,
                error: None,
            };
        }
    }

    /// "Excluir" on the detail view.
    pub fn request_delete(&mut self) {
        if let OrderModal::Detail { order } = self {
            *self = OrderModal::ConfirmDelete {
                order: order.clone(),
                deleting: false,
            };
        }
    }

    /// "Cancelar" on the confirmation dialog: back to the same order's detail.
    pub fn cancel_delete(&mut self) {
        if let OrderModal::ConfirmDelete { order, .. } = self {
            *self = OrderModal::Detail {
                order: order.clone(),
            };
        }
    }

    /// Validates the draft and produces the create/update request. Returns
    /// `None` while a submit is already in flight or when validation fails;
    /// the failure message stays on the form.
    pub fn submit(&mut self) -> Option<SubmitRequest> {
        let OrderModal::Form {
            mode,
            draft,
            submitting,
            error,
        } = self
        else {
            return None;
        };
        if *submitting {
            return None;
        }

        match draft.validate() {
            Ok(validated) => {
                *submitting = true;
                *error = None;
                Some(match mode {
                    FormMode::Create => SubmitRequest::Create(validated.into_create_request()),
                    FormMode::Edit { order_id } => {
                        SubmitRequest::Update(validated.into_record(order_id.clone()))
                    }
                })
            }
            Err(err) => {
                *error = Some(err.to_string());
                None
            }
        }
    }

    /// Confirms the pending delete. Returns the target identifier exactly
    /// once; further calls are gated until the operation settles.
    pub fn confirm_delete(&mut self) -> Option<OrderId> {
        let OrderModal::ConfirmDelete { order, deleting } = self else {
            return None;
        };
        if *deleting {
            return None;
        }
        *deleting = true;
        Some(order.id.clone())
    }

    /// Saved/deleted acknowledgement: the modal closes and the caller reloads.
    pub fn operation_succeeded(&mut self) {
        *self = OrderModal::Closed;
    }

    /// A submit or delete failed: clear the in-flight gate and keep the modal
    /// open so the user can retry or cancel.
    pub fn operation_failed(&mut self, message: &str) {
        match self {
            OrderModal::Form {
                submitting, error, ..
            } => {
                *submitting = false;
                *error = Some(message.to_string());
            }
            OrderModal::ConfirmDelete { deleting, .. } => {
                *deleting = false;
            }
            _ => {}
        }
    }

    pub fn close(&mut self) {
        *self = OrderModal::Closed;
    }
}
