//! Command implementations.

pub mod replay;
pub mod validate;
pub mod validators;
