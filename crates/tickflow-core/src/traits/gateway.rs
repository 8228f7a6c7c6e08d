//! Order gateway trait definition.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::GatewayError;
use crate::types::{Direction, ExitReason};

/// Entry order handed to the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryOrder {
    /// Position this order belongs to
    pub position_id: Uuid,
    /// Instrument identifier
    pub instrument_id: String,
    /// Long or short
    pub direction: Direction,
    /// Number of shares
    pub quantity: Decimal,
    /// Intended entry price
    pub reference_price: Decimal,
    /// Protective stop attached to the order
    pub stop: Decimal,
    /// Profit target attached to the order
    pub target: Decimal,
}

/// Exit order handed to the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitOrder {
    /// Position being closed
    pub position_id: Uuid,
    /// Instrument identifier
    pub instrument_id: String,
    /// Direction of the position being closed
    pub direction: Direction,
    /// Number of shares
    pub quantity: Decimal,
    /// Why the exit was requested
    pub reason: ExitReason,
}

/// Gateway acknowledgment for a submitted order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OrderAck {
    /// Order executed at `fill_price`
    Accepted { fill_price: Decimal },
    /// Order refused by the venue
    Rejected { reason: String },
}

impl OrderAck {
    /// The fill price, if the order was accepted.
    pub fn fill_price(&self) -> Option<Decimal> {
        match self {
            OrderAck::Accepted { fill_price } => Some(*fill_price),
            OrderAck::Rejected { .. } => None,
        }
    }
}

/// Broker-facing order execution seam.
///
/// The core treats acknowledgments as asynchronous: the orchestrator's
/// `confirm_entry`/`confirm_exit` are driven by the values returned here,
/// and a slow gateway is bounded by the engine's ack timeout.
#[async_trait]
pub trait OrderGateway: Send + Sync {
    /// Submit an entry order.
    async fn submit_entry(&self, order: &EntryOrder) -> Result<OrderAck, GatewayError>;

    /// Submit an exit order.
    async fn submit_exit(&self, order: &ExitOrder) -> Result<OrderAck, GatewayError>;

    /// Gateway name for logging.
    fn name(&self) -> &str;
}
