//! Inbound ports (driving side): operator input and the worker host.

pub mod host;
pub mod operator;
