//! # IO Module
//!
//! Everything that leaves the process: the event store interface and its
//! HTTP implementation.

pub mod event_store;
pub mod http_event_store;

pub use event_store::*;
pub use http_event_store::*;
