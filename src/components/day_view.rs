use chrono::NaiveDate;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::calendar::Event;
use crate::theme;

pub struct DayView;

impl DayView {
    /// `events` must already be in display order: all-day first, then by
    /// start time.
    pub fn render(
        frame: &mut Frame,
        area: Rect,
        date: NaiveDate,
        events: &[Event],
        selected: usize,
    ) {
        let w = area.width as usize;

        let title = if w >= 30 {
            format!(" {} ", date.format("%A, %B %d, %Y"))
        } else if w >= 18 {
            format!(" {} ", date.format("%b %d, %Y"))
        } else {
            format!(" {} ", date.format("%m/%d"))
        };

        let count_str = match events.len() {
            0 => String::new(),
            1 => " 1 event ".to_string(),
            n => format!(" {n} events "),
        };

        let block = Block::default()
            .title(title)
            .title_style(theme::current().header)
            .title_bottom(Line::from(Span::styled(count_str, theme::current().dim)))
            .borders(Borders::ALL)
            .border_style(theme::current().border);

        if events.is_empty() {
            let inner = block.inner(area);
            frame.render_widget(block, area);
            let msg = Paragraph::new("No events. Press n to add one.").style(theme::current().dim);
            frame.render_widget(msg, inner);
            return;
        }

        let inner_w = area.width.saturating_sub(2) as usize;
        let section_style = Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED);

        let mut items: Vec<ListItem> = Vec::new();
        let mut selected_row = None;
        let mut in_all_day = false;

        for (idx, ev) in events.iter().enumerate() {
            let all_day = ev.details.schedule.is_all_day();
            if all_day && idx == 0 {
                items.push(ListItem::new(Line::from(Span::styled("All Day", section_style))));
                in_all_day = true;
            } else if !all_day && in_all_day {
                items.push(ListItem::new(Line::from("")));
                in_all_day = false;
            }

            if idx == selected {
                selected_row = Some(items.len());
            }
            items.push(format_event(ev, inner_w));
        }

        let list = List::new(items)
            .block(block)
            .highlight_style(theme::current().highlight);
        let mut state = ListState::default().with_selected(selected_row);
        frame.render_stateful_widget(list, area, &mut state);
    }
}

fn format_event(ev: &Event, max_width: usize) -> ListItem<'static> {
    let color = theme::current().event_color(ev.details.color);
    let color_indicator = Span::styled("  ", Style::default().bg(color));

    let time_str = if ev.details.schedule.is_all_day() {
        " ".to_string()
    } else {
        format!(" {} ", ev.duration_display())
    };
    let used = 2 + time_str.len();
    let time_span = Span::styled(time_str, Style::default().add_modifier(Modifier::DIM));

    let name: String = ev
        .details
        .name
        .chars()
        .take(max_width.saturating_sub(used))
        .collect();
    let name_span = Span::styled(name, Style::default());

    ListItem::new(Line::from(vec![color_indicator, time_span, name_span]))
}

/// Render an event detail popup overlay.
pub fn render_detail_popup(frame: &mut Frame, area: Rect, ev: &Event) {
    let popup_area = super::popup_area(area, 60, 12, 30, 8);

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(format!(" {} ", ev.details.name))
        .title_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let color = theme::current().event_color(ev.details.color);
    let mut lines: Vec<Line> = vec![
        Line::from(vec![
            Span::styled("  ", Style::default().bg(color)),
            Span::styled(format!(" {}", ev.details.color.label()), Style::default()),
        ]),
        Line::from(""),
    ];

    if ev.details.schedule.is_all_day() {
        lines.push(Line::from(Span::styled("All day", theme::current().dim)));
    } else {
        lines.push(Line::from(vec![
            Span::styled("Time: ", theme::current().dim),
            Span::styled(ev.duration_display(), Style::default()),
        ]));
    }

    lines.push(Line::from(vec![
        Span::styled("Date: ", theme::current().dim),
        Span::styled(
            ev.details.date.format("%A, %B %d, %Y").to_string(),
            Style::default(),
        ),
    ]));

    // Footer hint
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "e:Edit  d:Delete  Esc:Close",
        theme::current().dim,
    )));

    let para = Paragraph::new(lines).wrap(Wrap { trim: false });
    frame.render_widget(para, inner);
}
