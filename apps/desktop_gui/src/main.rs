//! Pedidos Desk: desktop client for the external orders service. A connect
//! screen, the orders table with its detail/edit/delete modals, and a footer
//! showing the realtime hub state. All network work happens on the backend
//! worker thread; this file only renders state and queues commands.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use clap::Parser;
use crossbeam_channel::{bounded, Receiver, Sender};
use eframe::egui;
use serde::{Deserialize, Serialize};
use shared::{
    domain::{OrderId, OrderStatus},
    protocol::OrderRecord,
};

mod backend;
mod events;
mod modal;

use backend::spawn_backend_thread;
use client_core::HubConnection;
use events::{
    classify_connect_failure, dispatch_backend_command, err_label, BackendCommand, UiErrorContext,
    UiEvent,
};
use modal::{FormMode, OrderModal, SubmitRequest};

const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8080";
const SERVER_URL_ENV_VAR: &str = "ORDERS_SERVER_URL";
const SETTINGS_STORAGE_KEY: &str = "pedidos_desk.settings";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AppViewState {
    Connect,
    Workspace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ThemePreset {
    Dark,
    Light,
}

impl ThemePreset {
    fn label(self) -> &'static str {
        match self {
            ThemePreset::Dark => "Escuro",
            ThemePreset::Light => "Claro",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ThemeSettings {
    preset: ThemePreset,
    accent_color: egui::Color32,
    striped_rows: bool,
}

impl ThemeSettings {
    fn defaults() -> Self {
        Self {
            preset: ThemePreset::Dark,
            accent_color: egui::Color32::from_rgb(88, 101, 242),
            striped_rows: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct UiReadabilitySettings {
    text_scale: f32,
}

impl UiReadabilitySettings {
    fn defaults() -> Self {
        Self { text_scale: 1.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
enum PersistedThemePreset {
    Dark,
    Light,
}

impl From<ThemePreset> for PersistedThemePreset {
    fn from(value: ThemePreset) -> Self {
        match value {
            ThemePreset::Dark => Self::Dark,
            ThemePreset::Light => Self::Light,
        }
    }
}

impl From<PersistedThemePreset> for ThemePreset {
    fn from(value: PersistedThemePreset) -> Self {
        match value {
            PersistedThemePreset::Dark => Self::Dark,
            PersistedThemePreset::Light => Self::Light,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct PersistedSettings {
    server_url: String,
    theme_preset: PersistedThemePreset,
    accent_color: [u8; 4],
    striped_rows: bool,
    text_scale: f32,
}

impl Default for PersistedSettings {
    fn default() -> Self {
        let theme = ThemeSettings::defaults();
        let readability = UiReadabilitySettings::defaults();
        Self {
            server_url: String::new(),
            theme_preset: theme.preset.into(),
            accent_color: [
                theme.accent_color.r(),
                theme.accent_color.g(),
                theme.accent_color.b(),
                theme.accent_color.a(),
            ],
            striped_rows: theme.striped_rows,
            text_scale: readability.text_scale,
        }
    }
}

impl PersistedSettings {
    fn into_runtime(self) -> (ThemeSettings, UiReadabilitySettings) {
        (
            ThemeSettings {
                preset: self.theme_preset.into(),
                accent_color: egui::Color32::from_rgba_unmultiplied(
                    self.accent_color[0],
                    self.accent_color[1],
                    self.accent_color[2],
                    self.accent_color[3],
                ),
                striped_rows: self.striped_rows,
            },
            UiReadabilitySettings {
                text_scale: self.text_scale.clamp(0.8, 1.4),
            },
        )
    }

    fn from_runtime(
        server_url: &str,
        theme: ThemeSettings,
        readability: UiReadabilitySettings,
    ) -> Self {
        Self {
            server_url: server_url.to_string(),
            theme_preset: theme.preset.into(),
            accent_color: [
                theme.accent_color.r(),
                theme.accent_color.g(),
                theme.accent_color.b(),
                theme.accent_color.a(),
            ],
            striped_rows: theme.striped_rows,
            text_scale: readability.text_scale,
        }
    }
}

/// CLI flag wins over the environment variable, which wins over the value
/// persisted from the previous session; blank values fall through.
fn resolve_startup_server_url(
    flag: Option<&str>,
    env_value: Option<&str>,
    persisted: Option<&str>,
) -> String {
    for candidate in [flag, env_value, persisted] {
        if let Some(value) = candidate {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return trimmed.to_string();
            }
        }
    }
    DEFAULT_SERVER_URL.to_string()
}

fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%d/%m/%Y %H:%M").to_string()
}

fn format_money(total: f64) -> String {
    format!("R$ {total:.2}")
}

fn status_color(status: OrderStatus) -> egui::Color32 {
    match status {
        OrderStatus::Pending => egui::Color32::from_rgb(224, 164, 46),
        OrderStatus::Processing => egui::Color32::from_rgb(88, 140, 233),
        OrderStatus::Finished => egui::Color32::from_rgb(67, 181, 129),
    }
}

fn banner_frame(fill: egui::Color32, stroke: egui::Stroke) -> egui::Frame {
    egui::Frame::NONE
        .fill(fill)
        .stroke(stroke)
        .corner_radius(8.0)
        .inner_margin(egui::Margin::symmetric(10, 8))
}

fn connect_card_frame(fill: egui::Color32, stroke: egui::Stroke) -> egui::Frame {
    egui::Frame::NONE
        .fill(fill)
        .stroke(stroke)
        .corner_radius(14.0)
        .inner_margin(egui::Margin::symmetric(20, 18))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusBannerSeverity {
    Error,
}

#[derive(Debug, Clone)]
struct StatusBanner {
    severity: StatusBannerSeverity,
    message: String,
}

/// What the modal rendering decided this frame; applied after the borrow of
/// the modal state ends.
enum ModalAction {
    Close,
    Edit,
    RequestDelete,
    CancelDelete,
    Submit,
    ConfirmDelete,
}

struct PedidosApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,

    view_state: AppViewState,
    server_url_input: String,
    connecting: bool,

    orders: Vec<OrderRecord>,
    loading_orders: bool,
    modal: OrderModal,
    hub_status: HubConnection,

    status: String,
    status_banner: Option<StatusBanner>,

    settings_open: bool,
    theme: ThemeSettings,
    readability: UiReadabilitySettings,
    applied_theme: Option<ThemeSettings>,
    applied_readability: Option<UiReadabilitySettings>,
}

impl PedidosApp {
    fn new(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        persisted: Option<PersistedSettings>,
        startup_server_url: String,
    ) -> Self {
        let (theme, readability) = persisted
            .unwrap_or_default()
            .into_runtime();

        Self {
            cmd_tx,
            ui_rx,
            view_state: AppViewState::Connect,
            server_url_input: startup_server_url,
            connecting: false,
            orders: Vec::new(),
            loading_orders: false,
            modal: OrderModal::Closed,
            hub_status: HubConnection::Disconnected,
            status: "Backend worker starting...".to_string(),
            status_banner: None,
            settings_open: false,
            theme,
            readability,
            applied_theme: None,
            applied_readability: None,
        }
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::ConnectOk => {
                    self.connecting = false;
                    self.view_state = AppViewState::Workspace;
                    self.status = "Connected - loading orders".to_string();
                    self.status_banner = None;
                    self.orders.clear();
                    self.modal.close();
                    self.loading_orders = true;
                }
                UiEvent::Info(message) => {
                    self.status = message;
                }
                UiEvent::OrdersLoaded(orders) => {
                    self.loading_orders = false;
                    self.status = format!("{} order(s) loaded", orders.len());
                    self.orders = orders;
                }
                UiEvent::OrderLoaded(order) => {
                    self.modal.order_loaded(order);
                }
                UiEvent::OrderSaved { order_id } => {
                    self.modal.operation_succeeded();
                    self.status = format!("order {order_id} saved");
                }
                UiEvent::OrderDeleted { order_id } => {
                    self.modal.operation_succeeded();
                    self.status = format!("order {order_id} deleted");
                }
                UiEvent::HubStatusChanged(status) => {
                    self.hub_status = status;
                }
                UiEvent::Error(err) => match err.context() {
                    UiErrorContext::Connect => {
                        self.connecting = false;
                        self.status = classify_connect_failure(err.message());
                        self.status_banner = Some(StatusBanner {
                            severity: StatusBannerSeverity::Error,
                            message: self.status.clone(),
                        });
                    }
                    UiErrorContext::BackendStartup => {
                        self.connecting = false;
                        self.status = err.message().to_string();
                        self.status_banner = Some(StatusBanner {
                            severity: StatusBannerSeverity::Error,
                            message: self.status.clone(),
                        });
                    }
                    UiErrorContext::SaveOrder | UiErrorContext::DeleteOrder => {
                        self.modal.operation_failed(err.message());
                        self.status =
                            format!("{} error: {}", err_label(err.category()), err.message());
                    }
                    UiErrorContext::LoadOrder => {
                        // The loading modal has nothing to show; drop it.
                        if matches!(self.modal, OrderModal::Loading { .. }) {
                            self.modal.close();
                        }
                        self.status =
                            format!("{} error: {}", err_label(err.category()), err.message());
                    }
                    UiErrorContext::LoadOrders | UiErrorContext::General => {
                        self.loading_orders = false;
                        self.status =
                            format!("{} error: {}", err_label(err.category()), err.message());
                    }
                },
            }
        }
    }

    fn try_connect(&mut self) {
        let server_url = self.server_url_input.trim().to_string();
        if server_url.is_empty() {
            self.status = "Server URL is required".to_string();
            self.status_banner = Some(StatusBanner {
                severity: StatusBannerSeverity::Error,
                message: "Informe o endereço do servidor.".to_string(),
            });
            return;
        }
        self.connecting = true;
        self.status = format!("Connecting to {server_url}...");
        dispatch_backend_command(
            &self.cmd_tx,
            BackendCommand::Connect { server_url },
            &mut self.status,
        );
    }

    fn disconnect(&mut self) {
        dispatch_backend_command(&self.cmd_tx, BackendCommand::Disconnect, &mut self.status);
        self.view_state = AppViewState::Connect;
        self.connecting = false;
        self.orders.clear();
        self.modal.close();
        self.status = "Disconnected".to_string();
        self.status_banner = None;
    }

    fn refresh_orders(&mut self) {
        self.loading_orders = true;
        dispatch_backend_command(&self.cmd_tx, BackendCommand::LoadOrders, &mut self.status);
    }

    fn open_order_detail(&mut self, order_id: OrderId) {
        self.modal.open_loading(order_id.clone());
        dispatch_backend_command(
            &self.cmd_tx,
            BackendCommand::LoadOrder { order_id },
            &mut self.status,
        );
    }

    fn submit_form(&mut self) {
        match self.modal.submit() {
            Some(SubmitRequest::Create(request)) => dispatch_backend_command(
                &self.cmd_tx,
                BackendCommand::CreateOrder { request },
                &mut self.status,
            ),
            Some(SubmitRequest::Update(order)) => dispatch_backend_command(
                &self.cmd_tx,
                BackendCommand::UpdateOrder { order },
                &mut self.status,
            ),
            None => {}
        }
    }

    fn confirm_pending_delete(&mut self) {
        if let Some(order_id) = self.modal.confirm_delete() {
            dispatch_backend_command(
                &self.cmd_tx,
                BackendCommand::DeleteOrder { order_id },
                &mut self.status,
            );
        }
    }

    fn apply_theme_if_needed(&mut self, ctx: &egui::Context) {
        if self.applied_theme == Some(self.theme)
            && self.applied_readability == Some(self.readability)
        {
            return;
        }

        let mut style = (*ctx.style()).clone();
        style.visuals = visuals_for_theme(self.theme);
        style.text_styles = scaled_text_styles(self.readability.text_scale);
        style.spacing.item_spacing = egui::vec2(8.0, 6.0);
        style.spacing.button_padding = egui::vec2(10.0, 6.0);
        ctx.set_style(style);
        self.applied_theme = Some(self.theme);
        self.applied_readability = Some(self.readability);
    }

    fn show_status_banner(&mut self, ui: &mut egui::Ui) {
        if let Some(banner) = self.status_banner.clone() {
            let (fill, stroke) = match banner.severity {
                StatusBannerSeverity::Error => (
                    egui::Color32::from_rgb(111, 53, 53),
                    egui::Stroke::new(1.0, egui::Color32::from_rgb(175, 96, 96)),
                ),
            };

            banner_frame(fill, stroke)
                .show(ui, |ui| {
                    ui.horizontal_wrapped(|ui| {
                        ui.label(egui::RichText::new(&banner.message).color(egui::Color32::WHITE));
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui.button("Fechar").clicked() {
                                self.status_banner = None;
                            }
                        });
                    });
                });
        }
    }

    fn show_connect_screen(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let avail = ui.available_size();
            let card_width = avail.x.clamp(420.0, 540.0);
            ui.add_space((avail.y * 0.14).clamp(20.0, 110.0));

            ui.vertical_centered(|ui| {
                ui.set_width(card_width);

                let card_fill = ui.visuals().faint_bg_color;
                let card_stroke =
                    egui::Stroke::new(1.0, ui.visuals().widgets.noninteractive.bg_stroke.color);
                connect_card_frame(card_fill, card_stroke).show(ui, |ui| {
                    ui.horizontal(|ui| {
                        ui.label(egui::RichText::new("📦").size(24.0));
                        ui.vertical(|ui| {
                            ui.heading("Pedidos");
                            ui.weak("Conecte-se ao servidor de pedidos.");
                        });
                    });

                    ui.add_space(8.0);
                    self.show_status_banner(ui);

                    ui.label(egui::RichText::new("Servidor").strong());
                    let response = ui.add(
                        egui::TextEdit::singleline(&mut self.server_url_input)
                            .hint_text(DEFAULT_SERVER_URL)
                            .desired_width(f32::INFINITY),
                    );

                    ui.add_space(10.0);

                    let enter_pressed = ctx.input(|i| i.key_pressed(egui::Key::Enter));
                    let connect_button = egui::Button::new(
                        egui::RichText::new("Conectar").strong().size(16.0),
                    )
                    .fill(self.theme.accent_color)
                    .min_size(egui::vec2(ui.available_width(), 40.0));
                    let clicked = ui.add_enabled(!self.connecting, connect_button).clicked();
                    if clicked || (response.has_focus() && enter_pressed && !self.connecting) {
                        self.try_connect();
                    }

                    ui.add_space(8.0);
                    ui.separator();
                    ui.horizontal_wrapped(|ui| {
                        ui.small("Status:");
                        ui.small(egui::RichText::new(&self.status).weak());
                    });
                });
            });
        });
    }

    fn show_workspace(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                ui.heading("Pedidos");
                ui.separator();
                if ui.button("Novo Pedido").clicked() {
                    self.modal.open_create();
                }
                if ui.button("Atualizar").clicked() {
                    self.refresh_orders();
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Desconectar").clicked() {
                        self.disconnect();
                    }
                    if ui.button("Configurações").clicked() {
                        self.settings_open = !self.settings_open;
                    }
                });
            });
            ui.add_space(4.0);
        });

        egui::TopBottomPanel::bottom("footer").show(ctx, |ui| {
            ui.add_space(2.0);
            ui.horizontal(|ui| {
                let (dot_color, hub_label) = match self.hub_status {
                    HubConnection::Connected => {
                        (egui::Color32::from_rgb(67, 181, 129), "Tempo real ativo")
                    }
                    HubConnection::Disconnected => {
                        (egui::Color32::from_rgb(175, 96, 96), "Tempo real offline")
                    }
                };
                ui.label(egui::RichText::new("●").color(dot_color));
                ui.small(hub_label);
                ui.separator();
                ui.small(egui::RichText::new(&self.status).weak());
            });
            ui.add_space(2.0);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.show_status_banner(ui);
            self.show_orders_table(ui);
        });

        self.show_order_modal(ctx);
        self.show_settings_window(ctx);
    }

    fn show_orders_table(&mut self, ui: &mut egui::Ui) {
        if self.loading_orders && self.orders.is_empty() {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Carregando pedidos...");
            });
            return;
        }

        let mut clicked_order: Option<OrderId> = None;

        egui::ScrollArea::vertical().show(ui, |ui| {
            egui::Grid::new("orders_table")
                .num_columns(5)
                .striped(self.theme.striped_rows)
                .min_col_width(110.0)
                .show(ui, |ui| {
                    for header in ["Cliente", "Produto", "Valor (R$)", "Status", "Data Criação"] {
                        ui.label(egui::RichText::new(header).strong());
                    }
                    ui.end_row();

                    if self.orders.is_empty() {
                        ui.weak("Nenhum pedido encontrado");
                        ui.end_row();
                    }

                    // Rows render in the order the service returned them.
                    for order in &self.orders {
                        let cells = [
                            order.customer.clone(),
                            order.product.clone(),
                            format_money(order.total),
                            String::new(),
                            format_timestamp(&order.created_at),
                        ];
                        for (index, cell) in cells.iter().enumerate() {
                            let text = if index == 3 {
                                egui::RichText::new(order.status.label())
                                    .color(status_color(order.status))
                            } else {
                                egui::RichText::new(cell)
                            };
                            if ui.selectable_label(false, text).clicked() {
                                clicked_order = Some(order.id.clone());
                            }
                        }
                        ui.end_row();
                    }
                });
        });

        if let Some(order_id) = clicked_order {
            self.open_order_detail(order_id);
        }
    }

    fn show_order_modal(&mut self, ctx: &egui::Context) {
        let mut action: Option<ModalAction> = None;
        let mut window_open = true;

        match &mut self.modal {
            OrderModal::Closed => return,
            OrderModal::Loading { order_id } => {
                egui::Window::new("Detalhes do Pedido")
                    .open(&mut window_open)
                    .collapsible(false)
                    .resizable(false)
                    .show(ctx, |ui| {
                        ui.horizontal(|ui| {
                            ui.spinner();
                            ui.label(format!("Carregando pedido {order_id}..."));
                        });
                    });
            }
            OrderModal::Detail { order } => {
                egui::Window::new("Detalhes do Pedido")
                    .open(&mut window_open)
                    .collapsible(false)
                    .resizable(false)
                    .show(ctx, |ui| {
                        egui::Grid::new("order_detail").num_columns(2).show(ui, |ui| {
                            ui.label(egui::RichText::new("Cliente").strong());
                            ui.label(&order.customer);
                            ui.end_row();
                            ui.label(egui::RichText::new("Produto").strong());
                            ui.label(&order.product);
                            ui.end_row();
                            ui.label(egui::RichText::new("Valor").strong());
                            ui.label(format_money(order.total));
                            ui.end_row();
                            ui.label(egui::RichText::new("Status").strong());
                            ui.label(
                                egui::RichText::new(order.status.label())
                                    .color(status_color(order.status)),
                            );
                            ui.end_row();
                            ui.label(egui::RichText::new("Data Criação").strong());
                            ui.label(format_timestamp(&order.created_at));
                            ui.end_row();
                        });

                        ui.add_space(8.0);
                        ui.horizontal(|ui| {
                            if ui.button("Editar").clicked() {
                                action = Some(ModalAction::Edit);
                            }
                            if ui.button("Excluir").clicked() {
                                action = Some(ModalAction::RequestDelete);
                            }
                            if ui.button("Fechar").clicked() {
                                action = Some(ModalAction::Close);
                            }
                        });
                    });
            }
            OrderModal::Form {
                mode,
                draft,
                submitting,
                error,
            } => {
                let (title, submit_label) = match mode {
                    FormMode::Create => ("Novo Pedido", "Adicionar"),
                    FormMode::Edit { .. } => ("Editar Pedido", "Salvar"),
                };
                let in_flight = *submitting;

                egui::Window::new(title)
                    .open(&mut window_open)
                    .collapsible(false)
                    .resizable(false)
                    .show(ctx, |ui| {
                        ui.label("Cliente");
                        ui.add(
                            egui::TextEdit::singleline(&mut draft.customer)
                                .hint_text("Nome do cliente")
                                .desired_width(260.0),
                        );
                        ui.label("Produto");
                        ui.add(
                            egui::TextEdit::singleline(&mut draft.product)
                                .hint_text("Produto")
                                .desired_width(260.0),
                        );
                        ui.label("Data Criação");
                        ui.add(
                            egui::TextEdit::singleline(&mut draft.date)
                                .hint_text("AAAA-MM-DDTHH:MM")
                                .desired_width(260.0),
                        );
                        ui.label("Status");
                        egui::ComboBox::from_id_salt("order_form_status")
                            .selected_text(
                                draft
                                    .status
                                    .map(OrderStatus::label)
                                    .unwrap_or("Selecione..."),
                            )
                            .show_ui(ui, |ui| {
                                for status in OrderStatus::ALL {
                                    ui.selectable_value(
                                        &mut draft.status,
                                        Some(status),
                                        status.label(),
                                    );
                                }
                            });
                        ui.label("Valor (R$)");
                        ui.add(
                            egui::TextEdit::singleline(&mut draft.total)
                                .hint_text("0.00")
                                .desired_width(120.0),
                        );

                        if let Some(message) = error {
                            ui.add_space(4.0);
                            ui.colored_label(egui::Color32::from_rgb(221, 112, 112), &*message);
                        }

                        ui.add_space(8.0);
                        ui.horizontal(|ui| {
                            let submit = egui::Button::new(submit_label);
                            if ui.add_enabled(!in_flight, submit).clicked() {
                                action = Some(ModalAction::Submit);
                            }
                            if ui.button("Cancelar").clicked() {
                                action = Some(ModalAction::Close);
                            }
                            if in_flight {
                                ui.spinner();
                            }
                        });
                    });
            }
            OrderModal::ConfirmDelete { order, deleting } => {
                let in_flight = *deleting;
                egui::Window::new("Excluir Pedido")
                    .open(&mut window_open)
                    .collapsible(false)
                    .resizable(false)
                    .show(ctx, |ui| {
                        ui.label(format!(
                            "Tem certeza que deseja excluir o pedido de {}?",
                            order.customer
                        ));
                        ui.add_space(8.0);
                        ui.horizontal(|ui| {
                            let confirm = egui::Button::new(
                                egui::RichText::new("Excluir").color(egui::Color32::WHITE),
                            )
                            .fill(egui::Color32::from_rgb(170, 60, 60));
                            if ui.add_enabled(!in_flight, confirm).clicked() {
                                action = Some(ModalAction::ConfirmDelete);
                            }
                            if ui.button("Cancelar").clicked() {
                                action = Some(ModalAction::CancelDelete);
                            }
                            if in_flight {
                                ui.spinner();
                            }
                        });
                    });
            }
        }

        if !window_open {
            action = Some(ModalAction::Close);
        }

        match action {
            Some(ModalAction::Close) => self.modal.close(),
            Some(ModalAction::Edit) => self.modal.begin_edit(),
            Some(ModalAction::RequestDelete) => self.modal.request_delete(),
            Some(ModalAction::CancelDelete) => self.modal.cancel_delete(),
            Some(ModalAction::Submit) => self.submit_form(),
            Some(ModalAction::ConfirmDelete) => self.confirm_pending_delete(),
            None => {}
        }
    }

    fn show_settings_window(&mut self, ctx: &egui::Context) {
        if !self.settings_open {
            return;
        }

        egui::Window::new("Configurações")
            .open(&mut self.settings_open)
            .resizable(false)
            .show(ctx, |ui| {
                ui.label("Tema");
                egui::ComboBox::from_id_salt("theme_preset")
                    .selected_text(self.theme.preset.label())
                    .show_ui(ui, |ui| {
                        ui.selectable_value(
                            &mut self.theme.preset,
                            ThemePreset::Dark,
                            ThemePreset::Dark.label(),
                        );
                        ui.selectable_value(
                            &mut self.theme.preset,
                            ThemePreset::Light,
                            ThemePreset::Light.label(),
                        );
                    });

                ui.separator();
                ui.label("Cor de destaque");
                ui.color_edit_button_srgba(&mut self.theme.accent_color);
                ui.checkbox(&mut self.theme.striped_rows, "Linhas alternadas na tabela");
                ui.add(
                    egui::Slider::new(&mut self.readability.text_scale, 0.8..=1.4)
                        .text("Escala do texto")
                        .step_by(0.05),
                );

                if ui.button("Restaurar padrões").clicked() {
                    self.theme = ThemeSettings::defaults();
                    self.readability = UiReadabilitySettings::defaults();
                }
            });
    }
}

impl eframe::App for PedidosApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();
        self.apply_theme_if_needed(ctx);

        match self.view_state {
            AppViewState::Connect => self.show_connect_screen(ctx),
            AppViewState::Workspace => self.show_workspace(ctx),
        }

        // Hub events arrive off-frame; keep polling at a relaxed cadence.
        ctx.request_repaint_after(std::time::Duration::from_millis(100));
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        let settings =
            PersistedSettings::from_runtime(&self.server_url_input, self.theme, self.readability);
        if let Ok(serialized) = serde_json::to_string(&settings) {
            storage.set_string(SETTINGS_STORAGE_KEY, serialized);
        }
    }
}

fn visuals_for_theme(theme: ThemeSettings) -> egui::Visuals {
    let mut visuals = match theme.preset {
        ThemePreset::Dark => {
            let mut v = egui::Visuals::dark();
            v.window_fill = egui::Color32::from_rgb(32, 33, 36);
            v.panel_fill = egui::Color32::from_rgb(27, 28, 31);
            v.faint_bg_color = egui::Color32::from_rgb(40, 42, 46);
            v
        }
        ThemePreset::Light => egui::Visuals::light(),
    };

    visuals.hyperlink_color = theme.accent_color;
    visuals.selection.bg_fill = theme.accent_color;
    visuals.widgets.active.bg_fill = theme.accent_color;
    visuals.widgets.hovered.bg_fill = theme.accent_color.gamma_multiply(0.85);
    visuals
}

fn scaled_text_styles(text_scale: f32) -> BTreeMap<egui::TextStyle, egui::FontId> {
    let mut styles = egui::Style::default().text_styles;
    for font in styles.values_mut() {
        font.size *= text_scale;
    }
    styles
}

#[derive(Parser, Debug)]
struct Args {
    /// Orders service base URL; overrides ORDERS_SERVER_URL and the value
    /// persisted from the previous session.
    #[arg(long)]
    server_url: Option<String>,
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);
    spawn_backend_thread(cmd_rx, ui_tx);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Pedidos")
            .with_inner_size([1100.0, 720.0])
            .with_min_inner_size([880.0, 560.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Pedidos Desk",
        options,
        Box::new(move |cc| {
            let persisted = cc.storage.and_then(|storage| {
                storage
                    .get_string(SETTINGS_STORAGE_KEY)
                    .and_then(|text| serde_json::from_str::<PersistedSettings>(&text).ok())
            });
            let startup_url = resolve_startup_server_url(
                args.server_url.as_deref(),
                std::env::var(SERVER_URL_ENV_VAR).ok().as_deref(),
                persisted.as_ref().map(|settings| settings.server_url.as_str()),
            );
            Ok(Box::new(PedidosApp::new(cmd_tx, ui_rx, persisted, startup_url)))
        }),
    )
}
