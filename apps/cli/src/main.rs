//! Terminal companion for the orders service, handy for smoke-testing a
//! deployment without the desktop app.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use clap::{Parser, Subcommand};
use client_core::{ClientEvent, HubConnection, OrdersApi, OrdersClient};
use shared::{
    domain::{OrderId, OrderStatus},
    protocol::{CreateOrderRequest, OrderRecord},
};

#[derive(Parser, Debug)]
struct Cli {
    /// Orders service base URL.
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    server_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every order.
    List,
    /// Show one order by identifier.
    Show { id: String },
    /// Create an order; the service assigns the identifier.
    Create {
        #[arg(long)]
        cliente: String,
        #[arg(long)]
        produto: String,
        /// Creation timestamp, RFC 3339 or `AAAA-MM-DDTHH:MM`.
        #[arg(long)]
        data: String,
        /// Wire code: 0 = Pendente, 1 = Processando, 2 = Finalizado.
        #[arg(long)]
        status: u8,
        #[arg(long)]
        valor: f64,
    },
    /// Delete an order by identifier.
    Delete { id: String },
    /// Subscribe to the hub and print each reload as it happens.
    Watch,
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M"))
        .map(|naive| naive.and_utc())
        .map_err(|_| anyhow!("unrecognized timestamp '{value}'; use RFC 3339 or AAAA-MM-DDTHH:MM"))
}

fn print_order(order: &OrderRecord) {
    println!(
        "{}  {:<24} {:<24} {:>12}  {:<12} {}",
        order.id,
        order.customer,
        order.product,
        format!("R$ {:.2}", order.total),
        order.status.label(),
        order.created_at.format("%d/%m/%Y %H:%M"),
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();
    let cli = Cli::parse();

    let client = OrdersClient::new();
    client
        .connect(&cli.server_url)
        .await
        .with_context(|| format!("failed to connect to {}", cli.server_url))?;

    match cli.command {
        Command::List => {
            let orders = client.list_orders().await?;
            if orders.is_empty() {
                println!("nenhum pedido encontrado");
            }
            for order in &orders {
                print_order(order);
            }
        }
        Command::Show { id } => {
            let order = client.fetch_order(&OrderId::from(id.as_str())).await?;
            print_order(&order);
        }
        Command::Create {
            cliente,
            produto,
            data,
            status,
            valor,
        } => {
            let status = OrderStatus::try_from(status)?;
            let created = client
                .create_order(CreateOrderRequest {
                    customer: cliente,
                    product: produto,
                    created_at: parse_timestamp(&data)?,
                    status,
                    total: valor,
                })
                .await?;
            println!("created order id={}", created.id);
        }
        Command::Delete { id } => {
            client.delete_order(&OrderId::from(id.as_str())).await?;
            println!("deleted order id={id}");
        }
        Command::Watch => {
            let mut events = client.subscribe_events();
            println!("watching {} (Ctrl-C to stop)", cli.server_url);
            while let Ok(event) = events.recv().await {
                match event {
                    ClientEvent::OrdersLoaded(orders) => {
                        println!("hub reload: {} order(s)", orders.len());
                    }
                    ClientEvent::HubStatusChanged(HubConnection::Disconnected) => {
                        println!("hub disconnected");
                        break;
                    }
                    ClientEvent::Error(message) => eprintln!("error: {message}"),
                    _ => {}
                }
            }
            return Ok(());
        }
    }

    client.disconnect().await?;
    Ok(())
}
