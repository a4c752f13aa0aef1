//! The physical screen and the canvases composed onto it.

use std::io::{self, Stdout};
use std::time::Duration;

use anyhow::{Context, Result};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::Rect;
use ratatui::Terminal;

use super::canvas::Canvas;
use super::terminal_guard::TerminalGuard;
use super::theme::{ColorRegistry, Theme};
use crate::events::{InputSource, KeyPoll, TerminalInput};

/// Owner of the terminal for the lifetime of the dashboard.
///
/// The screen has its own root canvas covering the whole frame, plus any
/// number of named canvases. [`Screen::refresh_all`] draws the root canvas
/// and then every named canvas that has a view, in registration order.
pub struct Screen<B: Backend> {
    terminal: Terminal<B>,
    input: Box<dyn InputSource>,
    colors: ColorRegistry,
    refresh_interval: Duration,
    root: Canvas,
    canvases: Vec<(String, Canvas)>,
    guard: Option<TerminalGuard>,
}

impl Screen<CrosstermBackend<Stdout>> {
    /// Take over the controlling terminal: raw mode, alternate screen,
    /// hidden cursor and the auto-detected color theme.
    ///
    /// Key polls wait at most `refresh_interval`.
    pub fn acquire(refresh_interval: Duration) -> Result<Self> {
        // Detect before raw mode; the luma query reads the terminal itself.
        let theme = Theme::auto_detect();
        let guard = TerminalGuard::acquire().context("failed to enter raw mode")?;
        let backend = CrosstermBackend::new(io::stdout());
        let mut screen = Self::with_backend(
            backend,
            Box::new(TerminalInput::new()),
            ColorRegistry::new(&theme),
            refresh_interval,
        )?;
        screen.guard = Some(guard);
        Ok(screen)
    }
}

impl<B: Backend> Screen<B> {
    /// Build a screen over any ratatui backend, without touching the
    /// controlling terminal.
    pub fn with_backend(
        backend: B,
        input: Box<dyn InputSource>,
        colors: ColorRegistry,
        refresh_interval: Duration,
    ) -> Result<Self> {
        let terminal = Terminal::new(backend).context("failed to initialize terminal")?;
        Ok(Self {
            terminal,
            input,
            colors,
            refresh_interval,
            root: Canvas::new(0, 0),
            canvases: Vec::new(),
            guard: None,
        })
    }

    /// Give the terminal back. Safe to call more than once.
    pub fn release(&mut self) -> io::Result<()> {
        match self.guard.take() {
            Some(mut guard) => guard.release(),
            None => Ok(()),
        }
    }

    pub fn colors(&self) -> &ColorRegistry {
        &self.colors
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    /// Wait up to the refresh interval for a key.
    pub fn poll_key(&mut self) -> Result<KeyPoll> {
        self.input.poll_key(self.refresh_interval)
    }

    /// Current terminal size as `(rows, cols)`. Queried on every call so a
    /// resize is picked up on the next frame.
    pub fn frame_size(&self) -> Result<(u16, u16)> {
        let size = self.terminal.size().context("failed to query terminal size")?;
        Ok((size.height, size.width))
    }

    /// Start a new frame: size the root canvas to the terminal and clear it.
    /// Returns the frame size as `(rows, cols)`.
    pub fn begin_frame(&mut self) -> Result<(u16, u16)> {
        let (rows, cols) = self.frame_size()?;
        if self.root.height() != rows || self.root.width() != cols {
            self.root.resize(rows, cols);
        } else {
            self.root.clear();
        }
        Ok((rows, cols))
    }

    /// The root canvas covering the whole frame.
    pub fn root_mut(&mut self) -> &mut Canvas {
        &mut self.root
    }

    /// Create (or replace) a free-standing canvas. It stays hidden until a
    /// view is set on it.
    pub fn create_canvas(&mut self, name: &str, height: u16, width: u16) -> &mut Canvas {
        self.insert(name, Canvas::new(height, width))
    }

    /// Create (or replace) a canvas pinned at `(top, left)` on the screen.
    pub fn register_region(
        &mut self,
        name: &str,
        height: u16,
        width: u16,
        top: u16,
        left: u16,
    ) -> &mut Canvas {
        self.insert(name, Canvas::pinned(height, width, top, left))
    }

    /// The named canvas, recreated blank when it is missing, shorter than
    /// `height` or not exactly `width` wide.
    pub fn ensure_canvas(&mut self, name: &str, height: u16, width: u16) -> &mut Canvas {
        match self.canvases.iter().position(|(n, _)| n == name) {
            Some(i)
                if self.canvases[i].1.height() >= height
                    && self.canvases[i].1.width() == width =>
            {
                &mut self.canvases[i].1
            }
            _ => self.create_canvas(name, height, width),
        }
    }

    pub fn canvas(&self, name: &str) -> Option<&Canvas> {
        self.canvases.iter().find(|(n, _)| n == name).map(|(_, c)| c)
    }

    pub fn canvas_mut(&mut self, name: &str) -> Option<&mut Canvas> {
        self.canvases.iter_mut().find(|(n, _)| n == name).map(|(_, c)| c)
    }

    fn insert(&mut self, name: &str, canvas: Canvas) -> &mut Canvas {
        let index = match self.canvases.iter().position(|(n, _)| n == name) {
            Some(index) => {
                self.canvases[index].1 = canvas;
                index
            }
            None => {
                self.canvases.push((name.to_string(), canvas));
                self.canvases.len() - 1
            }
        };
        &mut self.canvases[index].1
    }

    /// Compose the root canvas and every visible canvas onto the terminal
    /// in one flush.
    pub fn refresh_all(&mut self) -> Result<()> {
        let Self {
            terminal,
            root,
            canvases,
            ..
        } = self;

        terminal
            .draw(|frame| {
                let area = frame.area();
                let buf = frame.buffer_mut();
                root.refresh(Rect::new(0, 0, area.width, area.height), area, buf);
                for (_, canvas) in canvases.iter() {
                    if let Some(view) = canvas.view() {
                        canvas.refresh(view.source, view.dest, buf);
                    }
                }
            })
            .context("failed to draw frame")?;
        Ok(())
    }

    /// The underlying ratatui backend.
    pub fn backend(&self) -> &B {
        self.terminal.backend()
    }
}

impl<B: Backend> std::fmt::Debug for Screen<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Screen")
            .field("refresh_interval", &self.refresh_interval)
            .field("canvases", &self.canvases.iter().map(|(n, _)| n).collect::<Vec<_>>())
            .field("acquired", &self.guard.is_some())
            .finish()
    }
}
