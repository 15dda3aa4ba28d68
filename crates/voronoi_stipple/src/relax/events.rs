//! Event types and sinks for observing relaxation runs.
//!
//! This module defines [`RelaxEvent`] and a set of sinks and adapters to emit,
//! collect, or forward events while executing a run via
//! [`crate::relax::StippleEngine::run_with_events`]. [`ProgressSink`] adapts the
//! `on_iterate(remaining)` progress callback used by [`crate::relax::StippleEngine::run`].
use crate::relax::config::RelaxConfig;
use crate::relax::engine::IterationReport;

/// Describes events emitted by a relaxation run.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub enum RelaxEvent {
    /// Emitted when a run starts.
    RunStarted {
        /// The run configuration used.
        config: RelaxConfig,
        /// Field size `(width, height)` in pixels.
        field_size: (u32, u32),
        /// Supersampled grid size `(width, height)` in cells.
        grid_size: (usize, usize),
    },

    /// Emitted once the initial sites exist.
    SitesInitialized {
        /// Number of sites.
        count: usize,
    },

    /// Emitted after every completed iteration, once the new sites were applied.
    IterationFinished {
        report: IterationReport,
    },

    /// Emitted when the run ends, either by exhausting the budget or by cancellation.
    RunFinished {
        /// Iterations completed.
        iterations: u32,
        /// Whether the run stopped early on a cancellation request.
        cancelled: bool,
    },

    /// Non-fatal warning generated during the run.
    Warning {
        /// Context string (e.g. `"iteration:3"`).
        context: String,
        /// Human-readable message.
        message: String,
    },
}

/// Discriminant of [`RelaxEvent`], used for filtering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RelaxEventKind {
    RunStarted,
    SitesInitialized,
    IterationFinished,
    RunFinished,
    Warning,
}

impl RelaxEvent {
    pub fn kind(&self) -> RelaxEventKind {
        match self {
            RelaxEvent::RunStarted { .. } => RelaxEventKind::RunStarted,
            RelaxEvent::SitesInitialized { .. } => RelaxEventKind::SitesInitialized,
            RelaxEvent::IterationFinished { .. } => RelaxEventKind::IterationFinished,
            RelaxEvent::RunFinished { .. } => RelaxEventKind::RunFinished,
            RelaxEvent::Warning { .. } => RelaxEventKind::Warning,
        }
    }
}

/// A generic event sink that accepts [`RelaxEvent`]s.
pub trait EventSink {
    fn send(&mut self, event: RelaxEvent);

    /// Lets emitters skip building events nobody listens to.
    fn wants(&self, _kind: RelaxEventKind) -> bool {
        true
    }
}

/// A no-op event sink.
impl EventSink for () {
    #[inline]
    fn send(&mut self, _event: RelaxEvent) {}

    #[inline]
    fn wants(&self, _kind: RelaxEventKind) -> bool {
        false
    }
}

/// An event sink that forwards to a user-provided closure.
pub struct FnSink<F>
where
    F: FnMut(RelaxEvent),
{
    f: F,
}

impl<F> FnSink<F>
where
    F: FnMut(RelaxEvent),
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> EventSink for FnSink<F>
where
    F: FnMut(RelaxEvent),
{
    #[inline]
    fn send(&mut self, event: RelaxEvent) {
        (self.f)(event);
    }
}

/// Calls `on_iterate(remaining)` after each iteration and once more with `0` when the
/// run completes its budget.
pub struct ProgressSink<F>
where
    F: FnMut(u32),
{
    on_iterate: F,
}

impl<F> ProgressSink<F>
where
    F: FnMut(u32),
{
    pub fn new(on_iterate: F) -> Self {
        Self { on_iterate }
    }
}

impl<F> EventSink for ProgressSink<F>
where
    F: FnMut(u32),
{
    fn send(&mut self, event: RelaxEvent) {
        match event {
            RelaxEvent::IterationFinished { report } => (self.on_iterate)(report.remaining),
            RelaxEvent::RunFinished {
                cancelled: false, ..
            } => (self.on_iterate)(0),
            _ => {}
        }
    }

    fn wants(&self, kind: RelaxEventKind) -> bool {
        matches!(
            kind,
            RelaxEventKind::IterationFinished | RelaxEventKind::RunFinished
        )
    }
}

/// An event sink that collects all events in a `Vec`.
#[derive(Default)]
pub struct VecSink {
    events: Vec<RelaxEvent>,
}

impl VecSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            events: Vec::with_capacity(cap),
        }
    }

    pub fn into_inner(self) -> Vec<RelaxEvent> {
        self.events
    }

    pub fn as_slice(&self) -> &[RelaxEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl EventSink for VecSink {
    #[inline]
    fn send(&mut self, event: RelaxEvent) {
        self.events.push(event);
    }
}

/// Fan-out sink that forwards each event to all contained sinks.
pub struct MultiSink<'a> {
    sinks: Vec<&'a mut dyn EventSink>,
}

impl<'a> MultiSink<'a> {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn push(&mut self, sink: &'a mut dyn EventSink) {
        self.sinks.push(sink);
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }
}

impl Default for MultiSink<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for MultiSink<'_> {
    fn send(&mut self, event: RelaxEvent) {
        let kind = event.kind();
        let mut targets: Vec<_> = self.sinks.iter_mut().filter(|s| s.wants(kind)).collect();
        let Some(last) = targets.pop() else {
            return;
        };
        for sink in targets {
            sink.send(event.clone());
        }
        last.send(event);
    }

    fn wants(&self, kind: RelaxEventKind) -> bool {
        self.sinks.iter().any(|s| s.wants(kind))
    }
}
