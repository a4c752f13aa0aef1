//! # rabbit-top
//!
//! A terminal dashboard for RabbitMQ clusters.
//!
//! rabbit-top polls the broker's management HTTP API on a fixed interval
//! and renders node resource usage, message rates, object counts and a
//! scrollable queue table as a full-screen, color-coded display.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          App (render loop)                   │
//! │  Fetching ─▶ LayingOut ─▶ Refreshing ─▶ AwaitingInput ─┐     │
//! │     ▲                                                  │     │
//! │     └──────────── timeout ◀────────────────────────────┘     │
//! │                                                              │
//! │  source::SnapshotSource ──▶ data::Snapshot ──▶ ui::layout    │
//! │                                                  │           │
//! │                                ui::Screen ◀──────┘           │
//! │                        (root canvas + queue canvas)          │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`app`]**: Render loop state machine, viewport and filter session state
//! - **[`source`]**: The [`SnapshotSource`] trait and the management API client
//! - **[`data`]**: Snapshot model, severity classification and formatting
//! - **[`ui`]**: Screen, canvases, viewport, color registry and layout
//! - **[`events`]**: Key decoding and bindings
//! - **[`settings`]** / **[`logging`]**: Layered configuration and file logging
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # All vhosts on a local broker
//! rabbit-top localhost
//!
//! # One vhost, custom credentials, 5 second refresh
//! rabbit-top broker.internal --vhost orders -u admin --password secret -r 5
//! ```
//!
//! ### As a library
//!
//! ```no_run
//! use std::time::Duration;
//! use rabbit_top::{App, ManagementClient, Screen, Thresholds};
//!
//! # fn main() -> anyhow::Result<()> {
//! let source = ManagementClient::builder().host("localhost").build()?;
//! let mut screen = Screen::acquire(Duration::from_secs(3))?;
//! let mut app = App::new(Box::new(source), Thresholds::default());
//! app.run(&mut screen)?;
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod data;
pub mod events;
pub mod logging;
pub mod settings;
pub mod source;
pub mod ui;

// Re-export main types for convenience
pub use app::{App, Phase};
pub use data::{NodeStats, QueueStats, SeverityBand, Snapshot, ThresholdPair, Thresholds};
pub use settings::Settings;
pub use source::{FetchError, ManagementClient, SnapshotSource};
pub use ui::Screen;
