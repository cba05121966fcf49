//! Event-driven dashboard core.
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ Timers/stdin │────►│   Channel    │────►│   Reducer    │
//! │ fetch tasks  │     │  (ordered)   │     │              │
//! └──────────────┘     └──────────────┘     └──────────────┘
//!        ▲                                         │
//!        │                                         ▼
//!        │             ┌──────────────┐     ┌──────────────┐
//!        └─────────────│   Commands   │◄────│    State     │
//!                      │ (fetch/draw) │     │ (charts etc) │
//!                      └──────────────┘     └──────────────┘
//! ```
//!
//! Everything that touches chart slots or panels runs on the loop thread;
//! fetches complete elsewhere and come back as events.

pub mod events;
pub mod reducer;
pub mod state;

pub use events::{Command, Event, FetchEvent, TickSeq, TimerEvent, UiEvent};
pub use reducer::{boot, reduce, ReducerConfig, ReducerOutput};
pub use state::{DashboardState, DashboardView, Phase, TickStats};
