//! Dashboard layout: writes a snapshot onto canvases.
//!
//! The fixed metrics area (header, node blocks, summary lines, queue table
//! headings and footer) goes onto the screen's root canvas. Queue rows go
//! onto a separate canvas as tall as the filtered queue list, which the
//! [`Viewport`] scrolls.

use std::time::Duration;

use ratatui::style::Style;

use crate::data::format::{format_rate, format_uptime, human_size};
use crate::data::{
    CountRate, NodeStats, QueueStats, SeverityBand, Snapshot, ThresholdPair, Thresholds,
};

use super::canvas::Canvas;
use super::theme::{ColorLabel, ColorRegistry};
use super::viewport::Viewport;

/// Name of the queue table canvas in the screen registry.
pub const QUEUE_CANVAS: &str = "queues";

/// Smallest frame the layout is drawn into.
pub const MIN_ROWS: u16 = 8;
pub const MIN_COLS: u16 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy)]
struct Column {
    title: &'static str,
    width: usize,
    align: Align,
}

const fn left(title: &'static str, width: usize) -> Column {
    Column {
        title,
        width,
        align: Align::Left,
    }
}

const fn right(title: &'static str, width: usize) -> Column {
    Column {
        title,
        width,
        align: Align::Right,
    }
}

const QUEUE_COLUMNS: [Column; 12] = [
    left("NAME", 24),
    left("VHOST", 8),
    left("EXCL", 5),
    left("PARAMS", 12),
    left("POLICY", 10),
    left("STATE", 8),
    right("READY", 8),
    right("UNACK", 8),
    right("TOTAL", 8),
    right("READY/s", 9),
    right("UNACK/s", 9),
    right("TOTAL/s", 9),
];

/// Column groups for the banded title row: (title, first column).
const QUEUE_GROUPS: [(&str, usize); 3] = [("overview", 0), ("messages", 6), ("rates", 9)];

/// Writes successive styled runs along one row.
struct Cursor<'a> {
    canvas: &'a mut Canvas,
    colors: &'a ColorRegistry,
    row: u16,
    col: u16,
}

impl<'a> Cursor<'a> {
    fn new(canvas: &'a mut Canvas, colors: &'a ColorRegistry, row: u16) -> Self {
        Self {
            canvas,
            colors,
            row,
            col: 0,
        }
    }

    fn put(&mut self, text: &str, label: ColorLabel) -> &mut Self {
        let style = self.colors.resolve(label);
        self.col += self.canvas.write_at(self.row, self.col, text, style);
        self
    }
}

/// One labeled, colorized value in a node block.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricField {
    pub label: &'static str,
    pub value: String,
    pub band: SeverityBand,
}

/// The four resource fields shown for a node: disk, memory, process and
/// socket usage.
///
/// Disk is rated on `disk_free_limit / disk_free`, so it reaches 100% when
/// free space drops to the alarm limit. A zero denominator rates as OK.
pub fn node_fields(node: &NodeStats, thresholds: &Thresholds) -> [MetricField; 4] {
    let ratio = |used: u64, limit: u64| (used as f64, limit as f64);

    let (limit, free) = ratio(node.disk_free_limit, node.disk_free);
    let (mem_used, mem_limit) = ratio(node.memory.used, node.memory.limit);
    let (proc_used, proc_limit) = ratio(node.processes.used, node.processes.limit);
    let (sock_used, sock_limit) = ratio(node.sockets.used, node.sockets.limit);

    [
        MetricField {
            label: "Disk free",
            value: format!(
                "{} (limit {})",
                human_size(node.disk_free),
                human_size(node.disk_free_limit)
            ),
            band: thresholds.disk.classify_ratio_or_ok(limit, free),
        },
        MetricField {
            label: "Mem",
            value: format!(
                "{}/{}",
                human_size(node.memory.used),
                human_size(node.memory.limit)
            ),
            band: thresholds.memory.classify_ratio_or_ok(mem_used, mem_limit),
        },
        MetricField {
            label: "Process",
            value: format!(
                "{}/{}",
                human_size(node.processes.used),
                human_size(node.processes.limit)
            ),
            band: thresholds.process.classify_ratio_or_ok(proc_used, proc_limit),
        },
        MetricField {
            label: "Socket",
            value: format!("{}/{}", node.sockets.used, node.sockets.limit),
            band: thresholds.socket.classify_ratio_or_ok(sock_used, sock_limit),
        },
    ]
}

/// Header line: versions, cluster and fetch timestamp.
pub fn header_line(snapshot: &Snapshot) -> String {
    format!(
        "rabbitmq-{} - erlang-{} - {} - {}",
        snapshot.rabbitmq_version,
        snapshot.erlang_version,
        snapshot.cluster_name.as_deref().unwrap_or("-"),
        snapshot.fetched_at.to_rfc2822()
    )
}

/// Write the header, node blocks and summary lines starting at row 0.
/// Returns the first free row.
pub fn draw_metrics(
    canvas: &mut Canvas,
    colors: &ColorRegistry,
    snapshot: &Snapshot,
    thresholds: &Thresholds,
) -> u16 {
    canvas.write_at(0, 0, &header_line(snapshot), colors.resolve(ColorLabel::Title));
    let mut row = 1;

    for node in &snapshot.nodes {
        draw_node(canvas, colors, row, node, thresholds);
        row += 2;
    }

    draw_message_line(canvas, colors, row, snapshot, thresholds);
    row += 1;

    let mut cursor = Cursor::new(canvas, colors, row);
    cursor.put("Stats", ColorLabel::Title);
    for (name, rate) in snapshot.delivery.entries() {
        cursor
            .put(&format!("  {name}: "), ColorLabel::Default)
            .put(&format!("{} msg/s", format_rate(rate)), ColorLabel::Default);
    }
    row += 1;

    let mut cursor = Cursor::new(canvas, colors, row);
    cursor.put("Objects", ColorLabel::Title);
    for (name, count) in snapshot.objects.entries() {
        cursor.put(&format!("  {name}: {count}"), ColorLabel::Default);
    }
    row + 1
}

fn draw_node(
    canvas: &mut Canvas,
    colors: &ColorRegistry,
    row: u16,
    node: &NodeStats,
    thresholds: &Thresholds,
) {
    let mut cursor = Cursor::new(canvas, colors, row);
    cursor.put(
        &format!(
            "{} - type: {} - pid: {} - uptime: {}",
            node.name,
            node.node_type,
            node.pid,
            format_uptime(node.uptime)
        ),
        ColorLabel::Title,
    );
    if !node.running {
        cursor.put(" (not running)", ColorLabel::Critical);
    }

    let mut cursor = Cursor::new(canvas, colors, row + 1);
    cursor.put(" ", ColorLabel::Default);
    for field in node_fields(node, thresholds) {
        cursor
            .put(&format!(" {}: ", field.label), ColorLabel::Default)
            .put(&field.value, field.band.into());
    }
    if node.mem_alarm {
        cursor.put("  [memory alarm]", ColorLabel::Critical);
    }
    if node.disk_free_alarm {
        cursor.put("  [disk alarm]", ColorLabel::Critical);
    }
}

fn draw_message_line(
    canvas: &mut Canvas,
    colors: &ColorRegistry,
    row: u16,
    snapshot: &Snapshot,
    thresholds: &Thresholds,
) {
    let messages = &snapshot.messages;
    let band = |pair: &ThresholdPair, value: CountRate| pair.classify(value.count as f64);
    let bands = [
        band(&thresholds.messages_total, messages.total),
        band(&thresholds.messages_ready, messages.ready),
        band(&thresholds.messages_unacked, messages.unacknowledged),
    ];

    let mut cursor = Cursor::new(canvas, colors, row);
    cursor.put("Message rates", ColorLabel::Title);
    for ((name, value), band) in messages.entries().into_iter().zip(bands) {
        cursor
            .put(&format!("  {name}: "), ColorLabel::Default)
            .put(
                &format!("{} - {} msg/s", value.count, format_rate(value.rate)),
                band.into(),
            );
    }
}

fn fit(text: &str, column: &Column) -> String {
    // One column of padding between cells.
    let max = column.width.saturating_sub(1);
    let text: String = text.chars().take(max).collect();
    match column.align {
        Align::Left => format!("{:<width$} ", text, width = max),
        Align::Right => format!("{:>width$} ", text, width = max),
    }
}

fn columns_start(index: usize) -> u16 {
    let offset: usize = QUEUE_COLUMNS[..index].iter().map(|c| c.width).sum();
    u16::try_from(offset).unwrap_or(u16::MAX)
}

/// Format one queue table row.
pub fn queue_row(queue: &QueueStats) -> String {
    let cells = [
        queue.name.clone(),
        queue.vhost.clone(),
        if queue.exclusive { "yes" } else { "no" }.to_string(),
        queue.params.join(","),
        queue.policy.clone(),
        queue.state.clone(),
        queue.ready.count.to_string(),
        queue.unacked.count.to_string(),
        queue.total.count.to_string(),
        format_rate(queue.ready.rate),
        format_rate(queue.unacked.rate),
        format_rate(queue.total.rate),
    ];
    cells
        .iter()
        .zip(QUEUE_COLUMNS.iter())
        .map(|(cell, column)| fit(cell, column))
        .collect()
}

/// Write the banded group row and the column header row at `row`.
/// Returns the first row after them.
pub fn draw_queue_header(canvas: &mut Canvas, colors: &ColorRegistry, row: u16) -> u16 {
    let reverse = colors.resolve(ColorLabel::Reverse);
    canvas.style_row(row, reverse);
    for (title, first) in QUEUE_GROUPS {
        canvas.write_at(row, columns_start(first), title, reverse);
    }

    let header: String = QUEUE_COLUMNS.iter().map(|c| fit(c.title, c)).collect();
    canvas.write_at(row + 1, 0, &header, colors.resolve(ColorLabel::Title));
    row + 2
}

/// Write the visible queue rows onto the queue canvas.
///
/// Rows land at their absolute index so the viewport's source rectangle
/// selects them. The selected row is drawn in the highlight color. Only
/// rows drawn by the previous call are blanked first.
pub fn draw_queue_rows(
    canvas: &mut Canvas,
    colors: &ColorRegistry,
    queues: &[&QueueStats],
    viewport: &Viewport,
) {
    canvas.clear_written();
    let row_style = colors.resolve(ColorLabel::Row);
    let selected = viewport.selected_row().map(|s| viewport.top_offset() + s);

    for index in viewport.visible_range() {
        let Some(queue) = queues.get(index) else { break };
        let Ok(row) = u16::try_from(index) else { break };
        canvas.write_at(row, 0, &queue_row(queue), row_style);
        if selected == Some(index) {
            canvas.style_row(row, colors.resolve(ColorLabel::Highlight));
        }
    }
}

/// State shown in the footer hint line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FooterStatus {
    pub active_only: bool,
    pub top_offset: usize,
    pub visible_rows: usize,
    pub total_rows: usize,
}

impl FooterStatus {
    /// Scroll position as `[first-last/total]`, 1-based.
    pub fn position(&self) -> String {
        if self.total_rows == 0 || self.visible_rows == 0 {
            return format!("[0/{}]", self.total_rows);
        }
        let last = (self.top_offset + self.visible_rows).min(self.total_rows);
        format!("[{}-{}/{}]", self.top_offset + 1, last, self.total_rows)
    }
}

/// Write the key hint line.
pub fn draw_footer(canvas: &mut Canvas, colors: &ColorRegistry, row: u16, status: &FooterStatus) {
    let filter = if status.active_only { "on" } else { "off" };
    let hint = format!(
        "q:quit  \u{2191}\u{2193}:scroll  a:active only [{}]  {}",
        filter,
        status.position()
    );
    // The footer owns its whole row, even when metrics ran into it.
    canvas.style_row(row, Style::reset());
    let width = usize::from(canvas.width());
    canvas.write_at(row, 0, &format!("{hint:<width$}"), colors.resolve(ColorLabel::Hint));
}

/// Draw the fetch failure banner in place of the metrics area.
pub fn draw_error_banner(
    canvas: &mut Canvas,
    colors: &ColorRegistry,
    source: &str,
    error: &str,
    retry: Duration,
) {
    canvas.write_at(
        0,
        0,
        &format!("rabbit-top - {source}"),
        colors.resolve(ColorLabel::Title),
    );
    let banner = colors.resolve(ColorLabel::Banner);
    canvas.style_row(2, banner);
    canvas.write_at(2, 1, &format!("Fetch failed: {error}"), banner);
    canvas.write_at(
        3,
        1,
        &format!("Retrying every {}s. Press q to quit.", retry.as_secs()),
        colors.resolve(ColorLabel::Hint),
    );
}

pub fn is_too_small(rows: u16, cols: u16) -> bool {
    rows < MIN_ROWS || cols < MIN_COLS
}

pub fn draw_too_small(canvas: &mut Canvas, colors: &ColorRegistry, rows: u16, cols: u16) {
    let style = colors.resolve(ColorLabel::Warning);
    canvas.write_at(0, 0, &format!("Terminal too small: {cols}x{rows}"), style);
    canvas.write_at(
        1,
        0,
        &format!("Need at least {MIN_COLS}x{MIN_ROWS}"),
        colors.resolve(ColorLabel::Default),
    );
}
