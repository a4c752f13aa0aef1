//! Terminal rendering: the screen, its canvases and the dashboard layout.
//!
//! ## Submodules
//!
//! - [`screen`]: Owner of the physical terminal, key input and frame refresh
//! - [`canvas`]: Styled cell buffers that may be larger than the terminal
//! - [`viewport`]: Scroll offset and selection over the queue canvas
//! - [`layout`]: Writes a snapshot onto the screen and the queue canvas
//! - [`theme`]: Light/dark theme support and the color registry
//! - [`terminal_guard`]: Raw mode acquisition and restoration
//!
//! ## Frame Composition
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │ Header, node blocks, summary lines   │  root canvas
//! │ Queue table band + column header     │
//! ├──────────────────────────────────────┤
//! │                                      │
//! │ Queue rows                           │  "queues" canvas, scrolled
//! │                                      │  by the viewport
//! ├──────────────────────────────────────┤
//! │ Footer key hints                     │  root canvas
//! └──────────────────────────────────────┘
//! ```

pub mod canvas;
pub mod layout;
pub mod screen;
pub mod terminal_guard;
pub mod theme;
pub mod viewport;

pub use canvas::{Canvas, CanvasError, View};
pub use screen::Screen;
pub use terminal_guard::{restore_terminal, TerminalGuard};
pub use theme::{ColorLabel, ColorRegistry, Theme};
pub use viewport::Viewport;
