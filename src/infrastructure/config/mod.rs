//! Configuration modules.

pub mod fleet;
pub mod gateway;
pub mod logging;
pub mod settings;
pub mod worker;
