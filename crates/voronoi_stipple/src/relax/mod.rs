//! Relaxation driver, configuration and run events.
//!
//! [`StippleEngine`] owns the sites and an [`EngineState`] with every per-run buffer, and
//! steps through `Initializing -> Iterating { remaining } -> Done` one Lloyd iteration at
//! a time. [`relax`] wraps the whole run in one call.
pub mod config;
pub mod engine;
pub mod events;
pub mod state;

pub use config::{RelaxConfig, DAMPED_ALPHA, FULL_STEP_ALPHA};
pub use engine::{
    relax, CancellationToken, IterationReport, RelaxPhase, RelaxResult, StippleEngine,
};
pub use events::{
    EventSink, FnSink, MultiSink, ProgressSink, RelaxEvent, RelaxEventKind, VecSink,
};
pub use state::EngineState;
