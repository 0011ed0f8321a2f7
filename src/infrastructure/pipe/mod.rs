//! Duplex control pipe between the orchestrator and one worker.
//!
//! The worker's stdin carries requests and its stdout carries replies, one
//! [`frame`] per line. The orchestrator talks through a [`ControlChannel`];
//! the worker answers through a [`WorkerEndpoint`].

pub mod channel;
pub mod endpoint;
pub mod frame;

pub use channel::ControlChannel;
pub use endpoint::WorkerEndpoint;
