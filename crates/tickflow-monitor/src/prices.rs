//! Last-known-price board shared between the engine and the exit monitor.

use std::collections::HashMap;
use std::sync::RwLock;

use rust_decimal::Decimal;

/// Latest traded price per instrument.
///
/// Written by the tick path, read by the exit monitor's sweep. Kept apart
/// from the orchestrator so price updates never contend with its
/// transaction lock.
#[derive(Debug, Default)]
pub struct PriceBoard {
    inner: RwLock<HashMap<String, Decimal>>,
}

impl PriceBoard {
    /// Create an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the latest price for an instrument.
    pub fn update(&self, instrument_id: &str, price: Decimal) {
        let mut inner = self.inner.write().unwrap();
        match inner.get_mut(instrument_id) {
            Some(existing) => *existing = price,
            None => {
                inner.insert(instrument_id.to_string(), price);
            }
        }
    }

    /// Latest known price, if any tick has been seen.
    pub fn get(&self, instrument_id: &str) -> Option<Decimal> {
        self.inner.read().unwrap().get(instrument_id).copied()
    }

    /// Number of instruments tracked.
    pub fn len(&self) -> usize {
        self.inner.read().unwrap().len()
    }

    /// Check whether no prices have been recorded.
    pub fn is_empty(&self) -> bool {
        self.inner.read().unwrap().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_update_and_get() {
        let board = PriceBoard::new();
        assert!(board.get("A").is_none());

        board.update("A", dec!(100));
        board.update("A", dec!(101.5));
        board.update("B", dec!(50));

        assert_eq!(board.get("A"), Some(dec!(101.5)));
        assert_eq!(board.get("B"), Some(dec!(50)));
        assert_eq!(board.len(), 2);
    }
}
