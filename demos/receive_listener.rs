// ABOUTME: Example application binding as a transceiver and printing inbound messages and receipts
// ABOUTME: Prints the dispatcher counters every few seconds

use argh::FromArgs;
use smpp_gateway::datatypes::BindType;
use smpp_gateway::{
    DeliveryReceipt, Dispatcher, EndpointConfig, InboundMessage, OutboundGateway,
    ProcessingContext,
};
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

/// Bind to an SMSC and print everything it delivers
#[derive(FromArgs)]
struct CliArgs {
    /// the system id
    #[argh(option)]
    system_id: String,

    /// the password
    #[argh(option)]
    password: String,

    /// the SMSC URL (default: smpp://localhost:2775)
    #[argh(option, short = 'u')]
    url: Option<String>,

    /// number of pooled sessions (default: 1)
    #[argh(option, default = "1")]
    connections: usize,

    /// concurrent inbound workers per session (default: 2)
    #[argh(option, default = "2")]
    threads: usize,

    /// seconds between counter reports (default: 10)
    #[argh(option, default = "10")]
    report: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli_args: CliArgs = argh::from_env();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let dispatcher = Arc::new(
        Dispatcher::builder()
            .message(|message: InboundMessage, context: &ProcessingContext| {
                info!(
                    correlation_id = %context.correlation_id(),
                    from = message.source(),
                    to = message.destination(),
                    id = message.id(),
                    "message: {}",
                    message.text()
                );
                Ok(())
            })
            .receipt(|receipt: DeliveryReceipt, _context: &ProcessingContext| {
                info!(
                    message_id = receipt.message_id(),
                    state = %receipt.state(),
                    submitted = %receipt.submitted(),
                    done = %receipt.done(),
                    error = receipt.error().unwrap_or("-"),
                    "receipt"
                );
                Ok(())
            })
            .build(),
    );

    let url = cli_args
        .url
        .unwrap_or_else(|| "smpp://localhost:2775".to_owned());
    let config = EndpointConfig::new(url, cli_args.system_id, cli_args.password)
        .with_connections(cli_args.connections)
        .with_threads(cli_args.threads);

    let gateway = OutboundGateway::builder(config)
        .bind_type(BindType::Transceiver)
        .listener(dispatcher.clone())
        .build();
    gateway.start().await?;

    let mut ticker = tokio::time::interval(Duration::from_secs(cli_args.report.max(1)));
    loop {
        ticker.tick().await;
        let counters = dispatcher.counters();
        println!(
            "messages: {} ({} failed), receipts: {} ({} failed)",
            counters.total_messages,
            counters.failed_messages,
            counters.total_receipts,
            counters.failed_receipts
        );
    }
}
