//! CSV tick replay source.

use std::path::Path;

use tokio::sync::mpsc;
use tracing::debug;

use tickflow_core::error::DataError;
use tickflow_core::types::Tick;

/// Replays a recorded tick session from a CSV file.
///
/// Expected header: `instrument_id,price,volume,timestamp,sequence_no`.
/// Rows are delivered in file order; the aggregation layer's sequence guard
/// handles any duplicates the recording contains.
pub struct CsvTickSource {
    ticks: Vec<Tick>,
}

impl CsvTickSource {
    /// Load all ticks from a CSV file.
    pub fn load(path: &Path) -> Result<Self, DataError> {
        let mut reader = csv::Reader::from_path(path).map_err(|e| match e.kind() {
            csv::ErrorKind::Io(_) => DataError::Parse(format!("cannot open {}: {}", path.display(), e)),
            _ => DataError::Parse(e.to_string()),
        })?;

        let mut ticks = Vec::new();
        for record in reader.deserialize::<Tick>() {
            let tick = record.map_err(|e| DataError::Parse(e.to_string()))?;
            ticks.push(tick);
        }

        if ticks.is_empty() {
            return Err(DataError::Empty(path.display().to_string()));
        }

        debug!(count = ticks.len(), file = %path.display(), "loaded replay ticks");
        Ok(Self { ticks })
    }

    /// Build a source from in-memory ticks.
    pub fn from_ticks(ticks: Vec<Tick>) -> Self {
        Self { ticks }
    }

    /// Number of ticks loaded.
    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    /// Check whether the source holds no ticks.
    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    /// The loaded ticks.
    pub fn ticks(&self) -> &[Tick] {
        &self.ticks
    }

    /// Stream the ticks through a bounded channel.
    ///
    /// Spawns a feeder task; the receiver sees ticks in file order and the
    /// channel closes when the recording is exhausted.
    pub fn into_channel(self, buffer: usize) -> mpsc::Receiver<Tick> {
        let (tx, rx) = mpsc::channel(buffer);
        tokio::spawn(async move {
            for tick in self.ticks {
                if tx.send(tick).await.is_err() {
                    break;
                }
            }
        });
        rx
    }
}
