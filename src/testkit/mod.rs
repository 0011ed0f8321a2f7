//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`spawner`] - In-memory [`Spawner`](crate::port::Spawner): `FakeSpawner`
//!   and `FakeProcess`, with per-cluster worker behaviors and exit control.
//! - [`host`] - `StaticHost`, a scriptable [`ShardHost`](crate::port::ShardHost).
//! - [`console`] - `ScriptedLines`, canned operator input.
//! - [`config`] - Canonical fleet configurations.

pub mod config;
pub mod console;
pub mod host;
pub mod spawner;

pub use console::ScriptedLines;
pub use host::StaticHost;
pub use spawner::{Behavior, FakeSpawner, SpawnRecord};
