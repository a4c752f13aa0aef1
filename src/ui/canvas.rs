//! Off-screen character canvases.
//!
//! A [`Canvas`] is a styled cell buffer whose content may be larger than
//! the terminal. Layout code writes into it with [`Canvas::write_at`]; the
//! [`Screen`](super::Screen) copies a source rectangle of it onto the frame
//! at a destination rectangle during refresh.

use std::ops::Range;

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::Span;
use thiserror::Error;

/// A strict write did not fit the canvas.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CanvasError {
    #[error("write of width {width} at ({row}, {col}) exceeds canvas {height}x{canvas_width}")]
    OutOfBounds {
        row: u16,
        col: u16,
        width: usize,
        height: u16,
        canvas_width: u16,
    },
}

/// Where a canvas appears on the physical screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct View {
    /// Rectangle of canvas content to show. `source.y` is the scroll offset.
    pub source: Rect,
    /// Rectangle on the terminal frame to copy it to.
    pub dest: Rect,
}

/// A rectangular buffer of styled text cells.
#[derive(Debug, Clone)]
pub struct Canvas {
    buffer: Buffer,
    view: Option<View>,
    /// Rows written since the last clear.
    written: Option<Range<u16>>,
}

impl Canvas {
    /// Create a blank canvas of `height` rows by `width` columns.
    pub fn new(height: u16, width: u16) -> Self {
        Self {
            buffer: Buffer::empty(Rect::new(0, 0, width, height)),
            view: None,
            written: None,
        }
    }

    /// Create a canvas pinned at a fixed screen location.
    pub fn pinned(height: u16, width: u16, top: u16, left: u16) -> Self {
        let mut canvas = Self::new(height, width);
        canvas.view = Some(View {
            source: canvas.area(),
            dest: Rect::new(left, top, width, height),
        });
        canvas
    }

    pub fn height(&self) -> u16 {
        self.buffer.area.height
    }

    pub fn width(&self) -> u16 {
        self.buffer.area.width
    }

    /// The full content rectangle, anchored at (0, 0).
    pub fn area(&self) -> Rect {
        self.buffer.area
    }

    /// Reset every cell to blank.
    pub fn clear(&mut self) {
        self.buffer.reset();
        self.written = None;
    }

    /// Blank only the rows written since the last clear.
    pub fn clear_written(&mut self) {
        let Some(rows) = self.written.take() else {
            return;
        };
        for y in rows {
            for x in 0..self.width() {
                if let Some(cell) = self.buffer.cell_mut((x, y)) {
                    cell.reset();
                }
            }
        }
    }

    /// Change the content size. Content is cleared.
    pub fn resize(&mut self, height: u16, width: u16) {
        self.buffer.resize(Rect::new(0, 0, width, height));
        self.clear();
    }

    fn mark_written(&mut self, row: u16) {
        self.written = Some(match self.written.take() {
            Some(rows) => rows.start.min(row)..rows.end.max(row + 1),
            None => row..row + 1,
        });
    }

    /// Write a styled run starting at `(row, col)`.
    ///
    /// Text past the right edge is clipped; rows or columns outside the
    /// canvas are ignored. Returns the number of columns written.
    pub fn write_at(&mut self, row: u16, col: u16, text: &str, style: Style) -> u16 {
        if row >= self.height() || col >= self.width() {
            return 0;
        }
        let max_width = usize::from(self.width() - col);
        self.mark_written(row);
        let (end_x, _) = self.buffer.set_stringn(col, row, text, max_width, style);
        end_x.saturating_sub(col)
    }

    /// Write a styled run, failing instead of clipping.
    pub fn try_write_at(
        &mut self,
        row: u16,
        col: u16,
        text: &str,
        style: Style,
    ) -> Result<u16, CanvasError> {
        let width = Span::raw(text).width();
        if row >= self.height() || usize::from(col) + width > usize::from(self.width()) {
            return Err(CanvasError::OutOfBounds {
                row,
                col,
                width,
                height: self.height(),
                canvas_width: self.width(),
            });
        }
        Ok(self.write_at(row, col, text, style))
    }

    /// Apply `style` to every cell of `row`, keeping its text.
    pub fn style_row(&mut self, row: u16, style: Style) {
        if row >= self.height() {
            return;
        }
        let line = Rect::new(0, row, self.width(), 1);
        self.mark_written(row);
        self.buffer.set_style(line, style);
    }

    /// Text content of `row` with trailing blanks removed.
    pub fn line(&self, row: u16) -> String {
        let mut line = String::new();
        for x in 0..self.width() {
            if let Some(cell) = self.buffer.cell((x, row)) {
                line.push_str(cell.symbol());
            }
        }
        line.trim_end().to_string()
    }

    /// Style of the cell at `(row, col)`, if inside the canvas.
    pub fn style_at(&self, row: u16, col: u16) -> Option<Style> {
        self.buffer.cell((col, row)).map(|c| c.style())
    }

    /// The rectangles used for the next refresh, if set.
    pub fn view(&self) -> Option<View> {
        self.view
    }

    /// Set the rectangles used for the next refresh.
    pub fn set_view(&mut self, source: Rect, dest: Rect) {
        self.view = Some(View { source, dest });
    }

    /// Hide the canvas from refreshes until a view is set again.
    pub fn hide(&mut self) {
        self.view = None;
    }

    /// Copy `source` of this canvas onto `target` at `dest`.
    ///
    /// The copied extent is the overlap of both rectangles' sizes, clipped
    /// to the canvas content and to `target`'s area.
    pub fn refresh(&self, source: Rect, dest: Rect, target: &mut Buffer) {
        let dest = dest.intersection(target.area);
        let rows = source.height.min(dest.height);
        let cols = source.width.min(dest.width);

        for dy in 0..rows {
            let Some(src_y) = source.y.checked_add(dy) else { break };
            if src_y >= self.height() {
                break;
            }
            for dx in 0..cols {
                let Some(src_x) = source.x.checked_add(dx) else { break };
                let Some(cell) = self.buffer.cell((src_x, src_y)) else { break };
                if let Some(slot) = target.cell_mut((dest.x + dx, dest.y + dy)) {
                    *slot = cell.clone();
                }
            }
        }
    }
}
