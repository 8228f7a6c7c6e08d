//! Trait seams between the core and its collaborators.

mod calendar;
mod gateway;
mod validator;

pub use calendar::{PeriodBounds, SessionCalendar};
pub use gateway::{EntryOrder, ExitOrder, OrderAck, OrderGateway};
pub use validator::SetupValidator;
