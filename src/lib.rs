//! Atlas Status Dashboard Library
//!
//! Polls a Statuspage-style summary endpoint and turns each response into a
//! paginated, searchable view of service health with a short per-service
//! stability history.

pub mod client;
pub mod config;
pub mod dashboard;
pub mod errors;
pub mod history;
pub mod pipeline;
pub mod poller;
pub mod render;
pub mod status;
pub mod tui;

pub use client::{StatusClient, StatusSource};
pub use config::{Cli, Config};
pub use dashboard::{DashboardState, DashboardView};
pub use errors::{DashboardError, Result};
pub use poller::{PollEvent, Poller};
pub use status::{ComponentStatus, Incident, Service, Snapshot};
