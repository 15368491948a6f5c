use chrono::{Days, NaiveDate, Timelike};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::calendar::{Event, Schedule};
use crate::theme;

/// First grid row. Earlier events are folded into it.
const HOUR_START: u32 = 6;
/// One past the last grid row.
const HOUR_END: u32 = 24;

pub struct WeekView;

impl WeekView {
    pub fn render(
        frame: &mut Frame,
        area: Rect,
        selected_date: NaiveDate,
        today: NaiveDate,
        week_start: NaiveDate,
        events: &[Event],
    ) {
        let block = Block::default()
            .title(format!(
                " Week of {} ",
                week_start.format("%b %d, %Y")
            ))
            .title_style(theme::current().header)
            .borders(Borders::ALL)
            .border_style(theme::current().border);

        let inner = block.inner(area);
        frame.render_widget(block, area);

        if inner.width < 10 || inner.height < 3 {
            return;
        }

        let inner_w = inner.width as usize;
        let inner_h = inner.height as usize;

        // Time label column width
        let time_col_w: u16 = if inner_w >= 70 { 6 } else { 4 };
        let day_cols_w = inner.width.saturating_sub(time_col_w);
        let col_w = (day_cols_w / 7).max(1);

        // Layout: time label | 7 day columns
        let mut col_constraints = vec![Constraint::Length(time_col_w)];
        for _ in 0..7 {
            col_constraints.push(Constraint::Length(col_w));
        }
        col_constraints.push(Constraint::Min(0)); // absorb remainder

        let cols = Layout::horizontal(col_constraints).split(inner);

        // Reserve 1 row for day headers
        let content_rows = inner_h.saturating_sub(1);
        let total_hours = (HOUR_END - HOUR_START) as usize;
        let rows_per_hour = (content_rows / total_hours).max(1);
        let visible_hours = (content_rows / rows_per_hour).min(total_hours);

        let mut row_constraints = vec![Constraint::Length(1)]; // day header
        for _ in 0..visible_hours {
            row_constraints.push(Constraint::Length(rows_per_hour as u16));
        }
        row_constraints.push(Constraint::Min(0));

        let rows = Layout::vertical(row_constraints).split(inner);

        // Render day headers
        for day_offset in 0..7u32 {
            let Some(date) = week_start.checked_add_days(Days::new(day_offset.into())) else {
                break;
            };
            let col_idx = (day_offset + 1) as usize;
            if col_idx >= cols.len() {
                break;
            }

            let day_label = if col_w >= 10 {
                format!("{}", date.format("%a %d"))
            } else if col_w >= 5 {
                format!("{}", date.format("%a"))
            } else {
                format!("{}", date.format("%d"))
            };

            let style = if date == today && date == selected_date {
                theme::current().today.add_modifier(Modifier::BOLD)
            } else if date == selected_date {
                theme::current().selected
            } else if date == today {
                theme::current().today
            } else {
                theme::current().header
            };

            let label = Paragraph::new(Line::from(Span::styled(
                format!("{:^width$}", day_label, width = col_w as usize),
                style,
            )));
            frame.render_widget(label, cols[col_idx].intersection(rows[0]));
        }

        // Render time labels and grid
        for hour_idx in 0..visible_hours {
            let hour = HOUR_START + hour_idx as u32;
            let row_idx = hour_idx + 1;
            if row_idx >= rows.len() {
                break;
            }

            let time_label = if time_col_w >= 6 {
                format!("{:>2}:00 ", hour)
            } else {
                format!("{:>2} ", hour)
            };
            let time_para = Paragraph::new(Line::from(Span::styled(
                time_label,
                theme::current().dim,
            )));
            frame.render_widget(time_para, cols[0].intersection(rows[row_idx]));

            for day_offset in 0..7u32 {
                let Some(date) = week_start.checked_add_days(Days::new(day_offset.into())) else {
                    break;
                };
                let col_idx = (day_offset + 1) as usize;
                if col_idx >= cols.len() {
                    break;
                }

                let cell_area = cols[col_idx].intersection(rows[row_idx]);
                if cell_area.width == 0 || cell_area.height == 0 {
                    continue;
                }

                let in_cell: Vec<&Event> = events
                    .iter()
                    .filter(|ev| ev.details.date == date && occupies_hour(&ev.details.schedule, hour))
                    .collect();
                let Some(ev) = in_cell.first() else {
                    continue;
                };

                let display = cell_label(&ev.details.name, in_cell.len() - 1, cell_area.width as usize);

                let style = Style::default()
                    .fg(ratatui::style::Color::Black)
                    .bg(theme::current().event_color(ev.details.color));

                frame.render_widget(Paragraph::new(Line::from(Span::styled(display, style))), cell_area);
            }
        }
    }
}

/// Whether an event fills the grid row for `hour`. All-day events sit in
/// the first row; timed events cover every hour they touch, and an end on
/// the hour does not spill into the next row. Hours before the grid are
/// drawn in its first row.
fn occupies_hour(schedule: &Schedule, hour: u32) -> bool {
    match schedule {
        Schedule::AllDay => hour == HOUR_START,
        Schedule::Timed { start, end } => {
            let last_hour = if end.minute() > 0 || end.second() > 0 || end.hour() == start.hour() {
                end.hour()
            } else {
                end.hour().saturating_sub(1)
            };
            let first = start.hour().max(HOUR_START);
            let last = last_hour.max(first);
            hour >= first && hour <= last
        }
    }
}

/// Event name padded to `width`, with a `+N` tail when `hidden` more events
/// share the cell.
fn cell_label(name: &str, hidden: usize, width: usize) -> String {
    let tail = if hidden > 0 { format!(" +{hidden}") } else { String::new() };
    let tail_len = tail.chars().count();
    let label = if tail_len < width {
        let name: String = name.chars().take(width - tail_len).collect();
        format!("{name}{tail}")
    } else {
        name.chars().take(width).collect()
    };
    format!("{:<width$}", label, width = width)
}
