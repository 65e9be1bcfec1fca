#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use colony_core::{BbKey, Blackboard};

/// One scheduling event: a task assigned or finished, a reservation taken or released, a path
/// that failed.
///
/// Plain data so a run can be recorded and replayed. `agent` is the agent's stable id and
/// `task` the raw task id when the event concerns one.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TraceEvent {
    pub tick: u64,
    pub tag: Cow<'static, str>,
    pub agent: Option<u64>,
    pub task: Option<u64>,
    pub detail: Option<Cow<'static, str>>,
}

impl TraceEvent {
    pub fn new(tick: u64, tag: impl Into<Cow<'static, str>>) -> Self {
        Self {
            tick,
            tag: tag.into(),
            agent: None,
            task: None,
            detail: None,
        }
    }

    pub fn for_agent(mut self, agent: u64) -> Self {
        self.agent = Some(agent);
        self
    }

    pub fn for_task(mut self, task: u64) -> Self {
        self.task = Some(task);
        self
    }

    /// Free-form context such as the reserved resource or a failure reason.
    pub fn with_detail(mut self, detail: impl Into<Cow<'static, str>>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Receives events as they happen. Closures taking a [`TraceEvent`] are sinks.
pub trait TraceSink {
    fn emit(&mut self, event: TraceEvent);
}

impl<F> TraceSink for F
where
    F: FnMut(TraceEvent),
{
    fn emit(&mut self, event: TraceEvent) {
        self(event)
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TraceLog {
    pub events: Vec<TraceEvent>,
}

impl TraceLog {
    pub fn push(&mut self, event: TraceEvent) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Tags in recording order.
    pub fn tags(&self) -> Vec<&str> {
        self.events.iter().map(|e| e.tag.as_ref()).collect()
    }

    pub fn count(&self, tag: &str) -> usize {
        self.events.iter().filter(|e| e.tag == tag).count()
    }

    pub fn for_task(&self, task: u64) -> impl Iterator<Item = &TraceEvent> + '_ {
        self.events.iter().filter(move |e| e.task == Some(task))
    }
}

/// Blackboard key for collecting events in memory.
pub const TRACE_LOG: BbKey<TraceLog> = BbKey::new("colony.trace.log");
/// Blackboard key for streaming events into a caller-provided sink.
pub const TRACE_SINK: BbKey<Box<dyn TraceSink>> = BbKey::new("colony.trace.sink");

/// Record `event` into whichever of [`TRACE_LOG`] and [`TRACE_SINK`] the blackboard holds.
pub fn emit(blackboard: &mut Blackboard, event: TraceEvent) {
    tracing::trace!(
        tick = event.tick,
        tag = %event.tag,
        agent = ?event.agent,
        task = ?event.task,
        detail = ?event.detail,
        "trace event"
    );
    if let Some(log) = blackboard.get_mut(TRACE_LOG) {
        log.push(event.clone());
    }
    if let Some(sink) = blackboard.get_mut(TRACE_SINK) {
        sink.emit(event);
    }
}

/// Start recording into `blackboard` if it is not recording already.
pub fn install_log(blackboard: &mut Blackboard) {
    blackboard.get_or_insert_with(TRACE_LOG, TraceLog::default);
}

/// Take the recorded events, leaving an empty log in place.
pub fn take_log(blackboard: &mut Blackboard) -> TraceLog {
    blackboard
        .get_mut(TRACE_LOG)
        .map(std::mem::take)
        .unwrap_or_default()
}
