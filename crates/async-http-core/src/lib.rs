//! Core infrastructure shared by the async-http-processor crates.
//!
//! This crate has no knowledge of HTTP, jobs, or the registry; it only
//! provides the event system every other crate builds on.

pub mod events;

pub use events::{EventListener, EventListeners, FnListener, ProcessorEvent};
