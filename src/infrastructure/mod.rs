//! Infrastructure layer.
//!
//! Technical concerns behind the ports: configuration, the control pipe,
//! OS processes, gateway discovery, fleet orchestration and the worker
//! entrypoint.
//!
//! # Submodules
//!
//! - [`config`] - Configuration loading and validation
//! - [`console`] - Operator input on stdin
//! - [`gateway`] - Shard-count discovery
//! - [`orchestration`] - Launcher, liveness loop and command relay
//! - [`pipe`] - Control pipe framing and endpoints
//! - [`process`] - Worker child processes
//! - [`worker`] - Worker command loop and built-in host

pub mod config;
pub mod console;
pub mod gateway;
pub mod orchestration;
pub mod pipe;
pub mod process;
pub mod worker;
