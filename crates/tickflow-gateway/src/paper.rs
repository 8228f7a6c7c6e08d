//! Simulated order gateway for paper trading and tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use tickflow_core::error::GatewayError;
use tickflow_core::traits::{EntryOrder, ExitOrder, OrderAck, OrderGateway};
use tickflow_core::types::Direction;

/// Record of one simulated execution, kept for inspection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperFill {
    pub position_id: Uuid,
    pub instrument_id: String,
    pub quantity: Decimal,
    pub price: Decimal,
    pub is_entry: bool,
    pub timestamp: DateTime<Utc>,
}

/// Simulated gateway: every order is acknowledged after a configurable
/// latency and filled with configurable slippage.
///
/// Entries fill against the order's reference price; exits fill against the
/// last price pushed via `update_price`, so the simulation needs the same
/// price feed the engine consumes.
pub struct PaperGateway {
    slippage_pct: Decimal,
    latency: Duration,
    prices: Mutex<HashMap<String, Decimal>>,
    fills: Mutex<Vec<PaperFill>>,
}

impl PaperGateway {
    /// Create a gateway with default slippage (0.05%) and no latency.
    pub fn new() -> Self {
        Self {
            slippage_pct: dec!(0.05),
            latency: Duration::ZERO,
            prices: Mutex::new(HashMap::new()),
            fills: Mutex::new(Vec::new()),
        }
    }

    /// Set slippage percentage.
    pub fn with_slippage(mut self, slippage_pct: Decimal) -> Self {
        self.slippage_pct = slippage_pct;
        self
    }

    /// Set simulated acknowledgment latency.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Push the latest market price for an instrument.
    pub fn update_price(&self, instrument_id: &str, price: Decimal) {
        self.prices
            .lock()
            .unwrap()
            .insert(instrument_id.to_string(), price);
    }

    /// All simulated fills so far.
    pub fn fills(&self) -> Vec<PaperFill> {
        self.fills.lock().unwrap().clone()
    }

    /// Buying pays the spread, selling gives it up.
    fn slip(&self, price: Decimal, buying: bool) -> Decimal {
        let factor = self.slippage_pct / dec!(100);
        if buying {
            price * (dec!(1) + factor)
        } else {
            price * (dec!(1) - factor)
        }
    }

    fn record(&self, fill: PaperFill) {
        self.fills.lock().unwrap().push(fill);
    }
}

impl Default for PaperGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderGateway for PaperGateway {
    async fn submit_entry(&self, order: &EntryOrder) -> Result<OrderAck, GatewayError> {
        if self.latency > Duration::ZERO {
            tokio::time::sleep(self.latency).await;
        }

        let buying = order.direction == Direction::Long;
        let fill_price = self.slip(order.reference_price, buying);

        self.record(PaperFill {
            position_id: order.position_id,
            instrument_id: order.instrument_id.clone(),
            quantity: order.quantity,
            price: fill_price,
            is_entry: true,
            timestamp: Utc::now(),
        });
        debug!(
            instrument = %order.instrument_id,
            position = %order.position_id,
            fill = %fill_price,
            "paper entry filled"
        );
        Ok(OrderAck::Accepted { fill_price })
    }

    async fn submit_exit(&self, order: &ExitOrder) -> Result<OrderAck, GatewayError> {
        if self.latency > Duration::ZERO {
            tokio::time::sleep(self.latency).await;
        }

        let market = self
            .prices
            .lock()
            .unwrap()
            .get(&order.instrument_id)
            .copied();
        let Some(market) = market else {
            return Ok(OrderAck::Rejected {
                reason: format!("no market price for {}", order.instrument_id),
            });
        };

        // Closing a long sells; closing a short buys.
        let buying = order.direction == Direction::Short;
        let fill_price = self.slip(market, buying);

        self.record(PaperFill {
            position_id: order.position_id,
            instrument_id: order.instrument_id.clone(),
            quantity: order.quantity,
            price: fill_price,
            is_entry: false,
            timestamp: Utc::now(),
        });
        debug!(
            instrument = %order.instrument_id,
            position = %order.position_id,
            fill = %fill_price,
            reason = %order.reason,
            "paper exit filled"
        );
        Ok(OrderAck::Accepted { fill_price })
    }

    fn name(&self) -> &str {
        "Paper Gateway"
    }
}
