//! Terminal dashboard for a network anomaly-detection backend.
//!
//! Polls a detector snapshot endpoint, keeps a rolling score history and
//! redraws four charts plus the intel, feature and summary panels.

pub mod alert;
pub mod chart;
pub mod client;
pub mod config;
pub mod engine;
pub mod history;
pub mod live;
pub mod logging;
pub mod screen;
pub mod snapshot;
pub mod view;
