//! Plain-text Gantt chart.
//!
//! Bars are placed from the layout's offset/width fractions only, scaled to
//! a fixed character grid.

use sitegrid_core::storage::{PriorityColors, RenderConfig};
use sitegrid_core::{DayColumn, Priority, TimelineLayout};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const GREY: &str = "\x1b[90m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";

const BAR: char = '█';
const WEEKEND: char = '·';
const EMPTY: char = ' ';

#[derive(Debug, Clone)]
pub struct ChartStyle {
    pub chart_width: usize,
    pub label_width: usize,
    pub color: bool,
    pub show_weekends: bool,
    pub low: String,
    pub medium: String,
    pub high: String,
}

impl ChartStyle {
    pub fn from_config(render: &RenderConfig, colors: &PriorityColors) -> Self {
        Self {
            chart_width: render.chart_width.max(1) as usize,
            label_width: render.label_width.max(8) as usize,
            color: render.color,
            show_weekends: render.show_weekends,
            low: ansi_for(colors.for_priority(Priority::Low), GREEN),
            medium: ansi_for(colors.for_priority(Priority::Medium), YELLOW),
            high: ansi_for(colors.for_priority(Priority::High), RED),
        }
    }

    fn priority_color(&self, priority: Priority) -> &str {
        match priority {
            Priority::Low => &self.low,
            Priority::Medium => &self.medium,
            Priority::High => &self.high,
        }
    }

    fn paint(&self, text: &str, color: &str) -> String {
        if self.color {
            format!("{color}{text}{RESET}")
        } else {
            text.to_string()
        }
    }
}

/// 24-bit foreground escape for `#rrggbb`, or `fallback` if the hex is malformed.
fn ansi_for(hex: &str, fallback: &str) -> String {
    let digits = hex.trim().trim_start_matches('#');
    if digits.len() != 6 {
        return fallback.to_string();
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    match (channel(0), channel(2), channel(4)) {
        (Some(r), Some(g), Some(b)) => format!("\x1b[38;2;{r};{g};{b}m"),
        _ => fallback.to_string(),
    }
}

/// Truncate to `width` display columns (with an ellipsis) and pad.
fn fit(text: &str, width: usize) -> String {
    if UnicodeWidthStr::width(text) <= width {
        let pad = width - UnicodeWidthStr::width(text);
        return format!("{text}{}", " ".repeat(pad));
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    used += 1;
    out.push_str(&" ".repeat(width.saturating_sub(used)));
    out
}

struct Grid {
    cell_width: usize,
    width: usize,
}

impl Grid {
    fn new(columns: usize, chart_width: usize) -> Self {
        let cell_width = if columns == 0 {
            1
        } else {
            (chart_width / columns).max(1)
        };
        Self {
            cell_width,
            width: cell_width * columns,
        }
    }

    fn span(&self, offset: f64, end: f64) -> (usize, usize) {
        let scale = |f: f64| ((f * self.width as f64).round().max(0.0) as usize).min(self.width);
        (scale(offset), scale(end))
    }
}

fn header(columns: &[DayColumn], grid: &Grid, style: &ChartStyle) -> (String, String) {
    let mut days = vec![' '; grid.width];
    let step = 3usize.div_ceil(grid.cell_width).max(1);
    for (i, column) in columns.iter().enumerate().step_by(step) {
        let label = column.date.format("%d").to_string();
        let at = i * grid.cell_width;
        for (j, ch) in label.chars().enumerate() {
            if let Some(slot) = days.get_mut(at + j) {
                *slot = ch;
            }
        }
    }

    let mut ruler = String::new();
    for column in columns {
        let (ch, color) = if column.is_today {
            ('▼', RED)
        } else if column.is_weekend && style.show_weekends {
            (WEEKEND, GREY)
        } else {
            ('─', GREY)
        };
        let cell: String = std::iter::repeat(ch).take(grid.cell_width).collect();
        ruler.push_str(&style.paint(&cell, color));
    }

    (days.into_iter().collect(), ruler)
}

fn background(columns: &[DayColumn], grid: &Grid, style: &ChartStyle) -> Vec<char> {
    let mut cells = Vec::with_capacity(grid.width);
    for column in columns {
        let ch = if column.is_weekend && style.show_weekends {
            WEEKEND
        } else {
            EMPTY
        };
        cells.extend(std::iter::repeat(ch).take(grid.cell_width));
    }
    cells
}

/// Render the whole layout as terminal text.
pub fn render_timeline(layout: &TimelineLayout, style: &ChartStyle) -> String {
    let grid = Grid::new(layout.columns.len(), style.chart_width);
    let mut out = String::new();

    out.push_str(&format!(
        "{} → {} ({} days)\n",
        layout.window_start, layout.window_end, layout.duration_days
    ));

    let (days, ruler) = header(&layout.columns, &grid, style);
    out.push_str(&format!("{} {days}\n", fit("", style.label_width)));
    out.push_str(&format!("{} {ruler}\n", fit("", style.label_width)));

    if layout.is_empty() {
        out.push_str("(no scheduled events in this window)\n");
    }

    let blank = background(&layout.columns, &grid, style);
    for group in &layout.groups {
        out.push_str(&style.paint(&fit(&group.name, style.label_width), BOLD));
        out.push('\n');

        for bar in &group.bars {
            let label = fit(&format!("  {}", bar.event.title), style.label_width);
            let (start, end) = bar_span(&grid, bar.geometry.offset_fraction, bar.geometry.end_fraction());

            let before: String = blank[..start].iter().collect();
            let body: String = std::iter::repeat(BAR).take(end - start).collect();
            let after: String = blank[end..].iter().collect();

            out.push_str(&format!(
                "{label} {before}{}{after}\n",
                style.paint(&body, style.priority_color(bar.event.priority))
            ));
        }
    }

    out.push_str(&format!(
        "{} event(s) in {} project(s)",
        layout.bar_count(),
        layout.groups.len()
    ));
    if layout.ungrouped > 0 {
        out.push_str(&format!("; {} without a project not shown", layout.ungrouped));
    }
    out.push('\n');
    out
}

/// Character span of a bar; a visible bar always gets at least one cell.
fn bar_span(grid: &Grid, offset: f64, end: f64) -> (usize, usize) {
    let (start, mut stop) = grid.span(offset, end);
    if stop <= start && end > offset && start < grid.width {
        stop = start + 1;
    }
    (start, stop.max(start))
}
