//! Render loop state machine and session state.

use anyhow::Result;
use ratatui::backend::Backend;
use ratatui::layout::Rect;
use tracing::{debug, info, warn};

use crate::data::{Snapshot, Thresholds};
use crate::events::{action_for, Action, Key, KeyPoll};
use crate::source::SnapshotSource;
use crate::ui::layout::{self, FooterStatus, QUEUE_CANVAS};
use crate::ui::{Screen, Viewport};

/// Where the render loop is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Obtain a new snapshot from the source.
    Fetching,
    /// Write the current snapshot onto the screen and queue canvas.
    LayingOut,
    /// Flush every canvas to the terminal.
    Refreshing,
    /// Wait for a key or the refresh timeout.
    AwaitingInput,
    /// Terminal state.
    Quitting,
}

/// Main application state.
///
/// The snapshot is replaced wholesale on every fetch and kept only so
/// scrolling, filtering and resizes can re-lay out without going back to
/// the network. Viewport and filter state persist across fetches.
pub struct App {
    phase: Phase,
    source: Box<dyn SnapshotSource>,
    thresholds: Thresholds,
    prefetched: Option<Snapshot>,

    pub snapshot: Option<Snapshot>,
    pub load_error: Option<String>,
    pub viewport: Viewport,
    pub active_only: bool,
}

impl App {
    /// Create a new App with the given snapshot source and thresholds.
    pub fn new(source: Box<dyn SnapshotSource>, thresholds: Thresholds) -> Self {
        Self {
            phase: Phase::Fetching,
            source,
            thresholds,
            prefetched: None,
            snapshot: None,
            load_error: None,
            viewport: Viewport::new(),
            active_only: false,
        }
    }

    /// Use `snapshot` for the first cycle instead of fetching.
    pub fn with_initial_snapshot(mut self, snapshot: Snapshot) -> Self {
        self.prefetched = Some(snapshot);
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Number of queue rows shown with the current filter.
    pub fn visible_queue_count(&self) -> usize {
        self.snapshot
            .as_ref()
            .map_or(0, |s| s.visible_queues(self.active_only).len())
    }

    /// Run until the user quits, then release the screen.
    pub fn run<B: Backend>(&mut self, screen: &mut Screen<B>) -> Result<()> {
        info!(source = self.source.description(), "render loop started");
        while self.phase != Phase::Quitting {
            self.step(screen)?;
        }
        screen.release()?;
        Ok(())
    }

    /// Execute the current phase and move to the next one.
    pub fn step<B: Backend>(&mut self, screen: &mut Screen<B>) -> Result<Phase> {
        let next = match self.phase {
            Phase::Fetching => {
                self.fetch();
                Phase::LayingOut
            }
            Phase::LayingOut => {
                self.lay_out(screen)?;
                Phase::Refreshing
            }
            Phase::Refreshing => {
                screen.refresh_all()?;
                Phase::AwaitingInput
            }
            Phase::AwaitingInput => match screen.poll_key()? {
                KeyPoll::Timeout => Phase::Fetching,
                KeyPoll::Key(key) => self.handle_key(key),
            },
            Phase::Quitting => Phase::Quitting,
        };
        self.phase = next;
        Ok(next)
    }

    fn fetch(&mut self) {
        let result = match self.prefetched.take() {
            Some(snapshot) => Ok(snapshot),
            None => self.source.fetch(),
        };
        match result {
            Ok(snapshot) => {
                debug!(
                    nodes = snapshot.nodes.len(),
                    queues = snapshot.queues.len(),
                    "snapshot received"
                );
                self.snapshot = Some(snapshot);
                self.load_error = None;
            }
            Err(e) => {
                warn!(source = self.source.description(), error = %e, "fetch failed");
                self.snapshot = None;
                self.load_error = Some(e.to_string());
            }
        }
    }

    fn handle_key(&mut self, key: Key) -> Phase {
        match action_for(key) {
            Action::ScrollUp => {
                self.viewport.scroll_up();
                Phase::LayingOut
            }
            Action::ScrollDown => {
                self.viewport.scroll_down();
                Phase::LayingOut
            }
            Action::ToggleActiveOnly => {
                self.active_only = !self.active_only;
                let rows = self.visible_queue_count();
                let visible = self.viewport.visible_rows();
                self.viewport.recompute_bounds(rows, visible);
                debug!(active_only = self.active_only, rows, "filter toggled");
                Phase::LayingOut
            }
            Action::Relayout => Phase::LayingOut,
            Action::Quit => {
                info!("quit requested");
                Phase::Quitting
            }
            Action::Ignore => Phase::AwaitingInput,
        }
    }

    fn lay_out<B: Backend>(&mut self, screen: &mut Screen<B>) -> Result<()> {
        let (rows, cols) = screen.begin_frame()?;
        let colors = *screen.colors();

        if layout::is_too_small(rows, cols) {
            layout::draw_too_small(screen.root_mut(), &colors, rows, cols);
            hide_queue_canvas(screen);
            return Ok(());
        }
        let footer_row = rows - 1;

        let Some(snapshot) = self.snapshot.as_ref() else {
            let error = self.load_error.as_deref().unwrap_or("no data");
            let retry = screen.refresh_interval();
            layout::draw_error_banner(
                screen.root_mut(),
                &colors,
                self.source.description(),
                error,
                retry,
            );
            hide_queue_canvas(screen);
            let status = FooterStatus {
                active_only: self.active_only,
                top_offset: 0,
                visible_rows: 0,
                total_rows: 0,
            };
            layout::draw_footer(screen.root_mut(), &colors, footer_row, &status);
            return Ok(());
        };

        let next = layout::draw_metrics(screen.root_mut(), &colors, snapshot, &self.thresholds);
        let queue_top = layout::draw_queue_header(screen.root_mut(), &colors, next);
        let visible_rows = footer_row.saturating_sub(queue_top);

        let queues = snapshot.visible_queues(self.active_only);
        self.viewport.recompute_bounds(queues.len(), usize::from(visible_rows));
        self.viewport.select_default();

        if visible_rows == 0 {
            hide_queue_canvas(screen);
        } else {
            let content_rows = u16::try_from(queues.len().max(1)).unwrap_or(u16::MAX);
            let canvas = screen.ensure_canvas(QUEUE_CANVAS, content_rows, cols);
            layout::draw_queue_rows(canvas, &colors, &queues, &self.viewport);
            canvas.set_view(
                self.viewport.source_rect(cols),
                Rect::new(0, queue_top, cols, visible_rows),
            );
        }

        let status = FooterStatus {
            active_only: self.active_only,
            top_offset: self.viewport.top_offset(),
            visible_rows: self.viewport.visible_rows(),
            total_rows: queues.len(),
        };
        layout::draw_footer(screen.root_mut(), &colors, footer_row, &status);
        Ok(())
    }
}

fn hide_queue_canvas<B: Backend>(screen: &mut Screen<B>) {
    if let Some(canvas) = screen.canvas_mut(QUEUE_CANVAS) {
        canvas.hide();
    }
}
