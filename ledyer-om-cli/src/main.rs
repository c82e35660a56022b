//! ledyer-om - map orders to Ledyer order lines and submit them
//!
//! Usage:
//!   ledyer-om map --order order.json [--payload capture]
//!   ledyer-om edit --settings ledyer.toml --order order.json --order-id or_2Nq
//!   ledyer-om capture --settings ledyer.toml --order order.json --order-id or_2Nq

mod observability;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use ledyer_om::{
    client::LedyerClient,
    mapper::OrderLineMapper,
    operations::{capture_order, edit_order},
    order::InMemoryOrder,
    settings::{Gateway, Settings},
};
use serde_json::Value;

use crate::observability::{LogFormat, init_observability};

#[derive(Debug, Parser)]
#[command(name = "ledyer-om")]
#[command(about = "Map orders to Ledyer order lines and submit them", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the payload for an order without contacting Ledyer
    Map {
        /// Order JSON file
        #[arg(long)]
        order: PathBuf,
        /// Payload to build
        #[arg(long, value_enum, default_value_t = PayloadKind::Edit)]
        payload: PayloadKind,
    },
    /// Replace the order lines of a Ledyer order
    Edit(SubmitArgs),
    /// Capture a Ledyer order
    Capture(SubmitArgs),
}

#[derive(Debug, Args)]
struct SubmitArgs {
    /// Settings TOML file
    #[arg(long, env = "LEDYER_SETTINGS")]
    settings: PathBuf,
    /// Order JSON file
    #[arg(long)]
    order: PathBuf,
    /// Ledyer order id
    #[arg(long)]
    order_id: String,
    /// Gateway whose settings to use; checkout first, then payments when omitted
    #[arg(long, value_enum)]
    gateway: Option<GatewayArg>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PayloadKind {
    Edit,
    Capture,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum GatewayArg {
    Checkout,
    Payments,
}

impl From<GatewayArg> for Gateway {
    fn from(value: GatewayArg) -> Self {
        match value {
            GatewayArg::Checkout => Self::Checkout,
            GatewayArg::Payments => Self::Payments,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_observability(LogFormat::from_env());

    let output = match cli.command {
        Commands::Map { order, payload } => {
            let mut order = load_order(&order)?;
            build_payload(&mut order, payload)?
        }
        Commands::Edit(args) => submit(args, PayloadKind::Edit).await?,
        Commands::Capture(args) => submit(args, PayloadKind::Capture).await?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn load_order(path: &std::path::Path) -> anyhow::Result<InMemoryOrder> {
    InMemoryOrder::from_file(path).with_context(|| format!("loading order {}", path.display()))
}

fn build_payload(order: &mut InMemoryOrder, kind: PayloadKind) -> anyhow::Result<Value> {
    let mapped = OrderLineMapper::new().map_order(order)?;
    let payload = match kind {
        PayloadKind::Edit => serde_json::to_value(mapped.into_edit_payload())?,
        PayloadKind::Capture => serde_json::to_value(mapped.into_capture_payload())?,
    };
    Ok(payload)
}

async fn submit(args: SubmitArgs, kind: PayloadKind) -> anyhow::Result<Value> {
    let settings = Settings::from_file(&args.settings)
        .with_context(|| format!("loading settings {}", args.settings.display()))?;
    let config = settings.client_config(args.gateway.map(Gateway::from))?;
    tracing::info!(
        api_base = %config.api_base,
        test_mode = config.test_mode,
        order_id = %args.order_id,
        "submitting order"
    );

    let client = LedyerClient::new(config)?;
    let mapper = OrderLineMapper::new();
    let mut order = load_order(&args.order)?;

    let response = match kind {
        PayloadKind::Edit => {
            edit_order(&client, &mapper, &settings.endpoints, &args.order_id, &mut order).await
        }
        PayloadKind::Capture => {
            capture_order(&client, &mapper, &settings.endpoints, &args.order_id, &mut order).await
        }
    };

    response.with_context(|| format!("submitting order {}", args.order_id))
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    const ORDER: &str = r#"{
        "currency": "EUR",
        "items": [
            {"type": "merchandise", "name": "Mug", "quantity": 1,
             "subtotal": "8.00", "subtotal_tax": "2.00", "total": "8.00", "total_tax": "2.00"}
        ]
    }"#;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_capture() {
        let cli = Cli::try_parse_from([
            "ledyer-om",
            "capture",
            "--settings",
            "ledyer.toml",
            "--order",
            "order.json",
            "--order-id",
            "or_1",
            "--gateway",
            "payments",
        ])
        .unwrap();

        match cli.command {
            Commands::Capture(args) => {
                assert_eq!(args.order_id, "or_1");
                assert_eq!(args.gateway, Some(GatewayArg::Payments));
            }
            _ => panic!("expected capture"),
        }
    }

    #[test]
    fn test_parse_map_defaults_to_edit() {
        let cli = Cli::try_parse_from(["ledyer-om", "map", "--order", "order.json"]).unwrap();
        assert!(matches!(cli.command, Commands::Map { payload: PayloadKind::Edit, .. }));
    }

    #[test]
    fn test_build_payloads() {
        let mut order = InMemoryOrder::from_json(ORDER).unwrap();
        let edit = build_payload(&mut order, PayloadKind::Edit).unwrap();
        assert_eq!(edit["totalOrderAmount"], 1000);
        assert_eq!(edit["orderLines"][0]["unitPrice"], 1000);

        let capture = build_payload(&mut order, PayloadKind::Capture).unwrap();
        assert_eq!(capture["totalCaptureAmount"], 1000);
    }
}
