pub mod codec;
pub mod config;
pub mod connection;
pub mod datatypes;
pub mod error;
pub mod gateway;
pub mod listener;
pub(crate) mod macros;
pub mod message;
pub mod receipt;
pub mod session;
pub mod transport;


// Re-export codec types for direct access
pub use codec::{CodecError, Decodable, Encodable, Frame, PduHeader};

// Re-export the gateway API for easy access
pub use config::EndpointConfig;
pub use error::{ErrorKind, GatewayError};
pub use gateway::{GatewayBuilder, OutboundGateway};
pub use listener::{CounterSnapshot, Dispatcher, ProcessingContext};
pub use message::{InboundMessage, OutboundMessage};
pub use receipt::{DeliveryReceipt, DeliveryState};

/// Error returned by inbound handlers and carried as the source of a
/// [`GatewayError`].
///
/// Handlers are application code, so any error type can be boxed into it.
pub type Error = Box<dyn std::error::Error + Send + Sync>;

/// A specialized `Result` type for gateway operations.
///
/// # Examples
///
/// ## Sending a message
///
/// Texts longer than 160 characters are split into segments transparently:
///
/// ```rust,no_run
/// use smpp_gateway::{EndpointConfig, OutboundGateway, OutboundMessage};
///
/// #[tokio::main]
/// async fn main() -> smpp_gateway::Result<()> {
///     let config = EndpointConfig::new("smpp://localhost:2775", "system_id", "password")
///         .with_connections(2);
///     let gateway = OutboundGateway::builder(config).build();
///     gateway.start().await?;
///
///     let message = OutboundMessage::new("40404", "27820000001", "Hello, World!");
///     let message_id = gateway.send(&message, true).await?;
///     println!("Message sent with ID: {message_id:?}");
///
///     gateway.shutdown().await;
///     Ok(())
/// }
/// ```
///
/// ## Receiving messages and delivery receipts
///
/// ```rust,no_run
/// use smpp_gateway::datatypes::BindType;
/// use smpp_gateway::{DeliveryReceipt, Dispatcher, EndpointConfig, OutboundGateway, ProcessingContext};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> smpp_gateway::Result<()> {
///     let dispatcher = Arc::new(
///         Dispatcher::builder()
///             .receipt(|receipt: DeliveryReceipt, context: &ProcessingContext| {
///                 println!("{} is {} ({})", receipt.message_id(), receipt.state(), context.correlation_id());
///                 Ok(())
///             })
///             .build(),
///     );
///
///     let config = EndpointConfig::new("smpp://localhost:2775", "system_id", "password")
///         .with_threads(4);
///     let gateway = OutboundGateway::builder(config)
///         .bind_type(BindType::Transceiver)
///         .listener(dispatcher.clone())
///         .build();
///     gateway.start().await?;
///
///     tokio::time::sleep(std::time::Duration::from_secs(300)).await;
///     println!("{:?}", dispatcher.counters());
///     gateway.shutdown().await;
///     Ok(())
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;
