// ABOUTME: Example application sending one message through a pooled outbound gateway
// ABOUTME: Long texts are segmented by the gateway, the returned id correlates delivery receipts

use argh::FromArgs;
use smpp_gateway::{EndpointConfig, OutboundGateway, OutboundMessage};
use std::error::Error;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Send a single SMS through an SMSC
#[derive(FromArgs)]
struct CliArgs {
    /// whether or not to enable debug logging
    #[argh(switch, short = 'd')]
    debugging: bool,

    /// the system id
    #[argh(option)]
    system_id: Option<String>,

    /// the password
    #[argh(option)]
    password: Option<String>,

    /// the SMSC URL (default: smpp://localhost:2775)
    #[argh(option, short = 'u')]
    url: Option<String>,

    /// the message to send
    #[argh(option, short = 'm')]
    message: String,

    /// the recipient telephone number
    #[argh(option, short = 't')]
    to: String,

    /// the telephone number that the message will be from
    #[argh(option, short = 'f')]
    from: String,

    /// request a delivery receipt
    #[argh(switch, short = 'r')]
    receipt: bool,

    /// invert more_messages_to_send for SMSCs that read it the other way
    #[argh(switch)]
    flip_mmts: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli_args: CliArgs = argh::from_env();

    let level = if cli_args.debugging {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let url = cli_args
        .url
        .unwrap_or_else(|| "smpp://localhost:2775".to_owned());
    let config = EndpointConfig::new(
        url,
        cli_args.system_id.unwrap_or_default(),
        cli_args.password.unwrap_or_default(),
    );

    let gateway = OutboundGateway::builder(config)
        .flip_mmts(cli_args.flip_mmts)
        .build();

    let message = OutboundMessage::new(cli_args.from, cli_args.to, cli_args.message);
    let result = gateway.send(&message, cli_args.receipt).await;
    gateway.shutdown().await;

    match result? {
        Some(id) => println!("Message sent with ID: {id}"),
        None => println!("Message sent, the SMSC returned no ID"),
    }
    Ok(())
}
