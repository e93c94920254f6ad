//! Observability: trace events and the sink boundary.
//!
//! Parsing and composition never call `tracing` directly. Every event flows
//! through [`TraceEvent`] and the current [`TraceSink`].

mod sink;


pub use sink::{SinkGuard, TraceEvent, TraceSink, TracingSink, with_sink};

pub(crate) use sink::record;
