//! Aggregation timeframes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Timeframe of an aggregated bar.
///
/// Ordered low to high: every daily close can promote into a weekly bar,
/// every weekly close into a monthly bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    /// Daily bars
    #[serde(rename = "1d")]
    #[default]
    Daily,
    /// Weekly bars
    #[serde(rename = "1w")]
    Weekly,
    /// Monthly bars
    #[serde(rename = "1M")]
    Monthly,
}

impl Timeframe {
    /// The next timeframe up, if any. Closed bars promote in this direction.
    pub fn coarser(&self) -> Option<Timeframe> {
        match self {
            Timeframe::Daily => Some(Timeframe::Weekly),
            Timeframe::Weekly => Some(Timeframe::Monthly),
            Timeframe::Monthly => None,
        }
    }

    /// All timeframes, finest first.
    pub fn all() -> &'static [Timeframe] {
        &[Timeframe::Daily, Timeframe::Weekly, Timeframe::Monthly]
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Timeframe::Daily => "1d",
            Timeframe::Weekly => "1w",
            Timeframe::Monthly => "1M",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "1M" {
            return Ok(Timeframe::Monthly);
        }
        match s.to_lowercase().as_str() {
            "1d" | "day" | "daily" => Ok(Timeframe::Daily),
            "1w" | "week" | "weekly" => Ok(Timeframe::Weekly),
            "month" | "monthly" => Ok(Timeframe::Monthly),
            _ => Err(format!("Invalid timeframe: {}", s)),
        }
    }
}
