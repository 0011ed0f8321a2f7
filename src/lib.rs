//! Shardline - sharded bot cluster orchestrator.
//!
//! Splits a chat platform's gateway shards into clusters, runs each cluster
//! as its own worker process, restarts workers that crash and relays
//! operator commands to every running worker.
//!
//! # Architecture
//!
//! - **`domain`** - Shard plans, cluster names, pipe commands, exit kinds
//! - **`port`** - Seams to processes, discovery, the worker host and the
//!   operator console
//! - **`infrastructure`** - Config, control pipe, processes, orchestration
//!   and the worker entrypoint
//! - **`adapter`** - Command-line interface
//!
//! # Example
//!
//! ```no_run
//! use shardline::domain::{NamePool, ShardPlan};
//!
//! let plan = ShardPlan::build(10, 4, NamePool::default()).unwrap();
//! assert_eq!(plan.clusters.len(), 3);
//! ```

pub mod adapter;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
