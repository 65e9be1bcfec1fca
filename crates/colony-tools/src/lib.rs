//! Tooling primitives for the colony act engine.
//!
//! Deterministic trace events are recorded into the agent's blackboard so a replay produces the
//! same log; every event is also forwarded to `tracing` at trace level.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod trace;

pub use trace::{
    emit, install_log, take_log, TraceEvent, TraceLog, TraceSink, TRACE_LOG, TRACE_SINK,
};
