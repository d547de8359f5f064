//! Core infrastructure for the resilience pipeline.
//!
//! This crate provides shared functionality used across every strategy crate
//! in the workspace:
//! - the fault taxonomy (`PipelineFault`, `OperationFault`, `ConnectionFault`)
//! - the per-invocation `ResilienceContext`
//! - an event system for observability, shared by every strategy's event type

pub mod context;
pub mod events;
pub mod fault;

pub use context::{HttpMethod, ResilienceContext};
pub use events::{BoxedEventListener, EventListener, EventListeners, FnListener, ResilienceEvent};
pub use fault::{ConnectionFault, OperationFault, PipelineFault};
