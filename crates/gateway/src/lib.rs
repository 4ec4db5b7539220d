//! The bot's event loop.
//!
//! [`EventLoop`] owns the transport and the plugin host. Each tick polls for
//! events, dispatches them, drains the reply queue with pacing, and sends a
//! heartbeat when due. Transport faults are retried with backoff until one
//! operation fails more than [`LoopConfig::max_consecutive_faults`] times in a
//! row.

pub mod error;
pub mod event_loop;
pub mod faults;

pub use {
    error::{Error, Result},
    event_loop::{EventLoop, LoopConfig, LoopState, TickReport},
    faults::{FaultTracker, TransportFaults, TransportOp},
};
