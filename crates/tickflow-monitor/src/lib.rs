//! Live-position monitoring and logging setup.

mod exit_monitor;
mod logging;
mod prices;

pub use exit_monitor::{ExitMonitor, ExitPrecedence};
pub use logging::{setup_logging, setup_logging_with_file};
pub use prices::PriceBoard;
