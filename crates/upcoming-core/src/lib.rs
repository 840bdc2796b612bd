//! Core types: events, start times, terminal box rendering, tracing

pub mod event;
pub mod render;
pub mod tracing;

pub use event::{Event, EventStart, StartTime};
pub use render::{render_events, RenderError, Terminal};
pub use tracing::{init_tracing, TracingConfig, TracingError, TracingOutputFormat};
