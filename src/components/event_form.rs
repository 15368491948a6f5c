use chrono::{NaiveDate, NaiveTime};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};
use thiserror::Error;

use crate::calendar::event::{format_time, parse_time};
use crate::calendar::{Event, EventColor, EventDetails, Schedule};
use crate::theme;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FormField {
    Name,
    Date,
    StartTime,
    EndTime,
    AllDay,
    Color,
}

impl FormField {
    pub fn next(&self) -> Self {
        match self {
            FormField::Name => FormField::Date,
            FormField::Date => FormField::StartTime,
            FormField::StartTime => FormField::EndTime,
            FormField::EndTime => FormField::AllDay,
            FormField::AllDay => FormField::Color,
            FormField::Color => FormField::Name,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            FormField::Name => FormField::Color,
            FormField::Date => FormField::Name,
            FormField::StartTime => FormField::Date,
            FormField::EndTime => FormField::StartTime,
            FormField::AllDay => FormField::EndTime,
            FormField::Color => FormField::AllDay,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("Name is required")]
    MissingName,
    #[error("Date must be YYYY-MM-DD")]
    InvalidDate,
    #[error("Start time must be HH:MM")]
    InvalidStartTime,
    #[error("End time must be HH:MM")]
    InvalidEndTime,
}

/// Whether submitting creates a new event or replaces an existing one.
#[derive(Debug, Clone, PartialEq)]
pub enum FormMode {
    Create,
    Edit(String),
}

#[derive(Debug, Clone)]
pub struct EventFormState {
    pub mode: FormMode,
    pub name: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub is_all_day: bool,
    pub color: EventColor,
    pub active_field: FormField,
}

impl EventFormState {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            mode: FormMode::Create,
            name: String::new(),
            date: date.format("%Y-%m-%d").to_string(),
            start_time: "09:00".to_string(),
            end_time: "10:00".to_string(),
            is_all_day: false,
            color: EventColor::Blue,
            active_field: FormField::Name,
        }
    }

    /// Prefill from an existing event for editing.
    pub fn edit(event: &Event) -> Self {
        let details = &event.details;
        let mut form = Self::new(details.date);
        form.mode = FormMode::Edit(event.id.clone());
        form.name = details.name.clone();
        form.color = details.color;
        match details.schedule {
            Schedule::AllDay => form.is_all_day = true,
            Schedule::Timed { start, end } => {
                form.start_time = format_time(start);
                form.end_time = format_time(end);
            }
        }
        form
    }

    pub fn parsed_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d").ok()
    }

    pub fn parsed_start_time(&self) -> Option<NaiveTime> {
        parse_time(self.start_time.trim())
    }

    pub fn parsed_end_time(&self) -> Option<NaiveTime> {
        parse_time(self.end_time.trim())
    }

    pub fn input_char(&mut self, c: char) {
        match self.active_field {
            FormField::Name => self.name.push(c),
            FormField::Date => self.date.push(c),
            FormField::StartTime => self.start_time.push(c),
            FormField::EndTime => self.end_time.push(c),
            FormField::AllDay | FormField::Color => {}
        }
    }

    pub fn backspace(&mut self) {
        match self.active_field {
            FormField::Name => { self.name.pop(); }
            FormField::Date => { self.date.pop(); }
            FormField::StartTime => { self.start_time.pop(); }
            FormField::EndTime => { self.end_time.pop(); }
            FormField::AllDay | FormField::Color => {}
        }
    }

    pub fn toggle_all_day(&mut self) {
        self.is_all_day = !self.is_all_day;
    }

    pub fn next_color(&mut self) {
        self.color = self.color.next();
    }

    /// Build the event details. Time fields are ignored for all-day events.
    pub fn to_details(&self) -> Result<EventDetails, FormError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(FormError::MissingName);
        }
        let date = self.parsed_date().ok_or(FormError::InvalidDate)?;

        let schedule = if self.is_all_day {
            Schedule::AllDay
        } else {
            Schedule::Timed {
                start: self.parsed_start_time().ok_or(FormError::InvalidStartTime)?,
                end: self.parsed_end_time().ok_or(FormError::InvalidEndTime)?,
            }
        };

        Ok(EventDetails {
            name: name.to_string(),
            color: self.color,
            date,
            schedule,
        })
    }
}

pub struct EventForm;

impl EventForm {
    pub fn render(frame: &mut Frame, area: Rect, state: &EventFormState) {
        // Center the form popup
        let form_area = super::popup_area(area, 50, 14, 30, 10);

        // Clear background
        frame.render_widget(Clear, form_area);

        let title = match state.mode {
            FormMode::Create => " New Event ",
            FormMode::Edit(_) => " Edit Event ",
        };

        let block = Block::default()
            .title(title)
            .title_style(Style::default().fg(ratatui::style::Color::Green).add_modifier(Modifier::BOLD))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(ratatui::style::Color::Green));

        let inner = block.inner(form_area);
        frame.render_widget(block, form_area);

        let rows = Layout::vertical([
            Constraint::Length(1), // name
            Constraint::Length(1), // date
            Constraint::Length(1), // start time
            Constraint::Length(1), // end time
            Constraint::Length(1), // all day
            Constraint::Length(1), // color
            Constraint::Length(1), // spacer
            Constraint::Length(1), // help
            Constraint::Min(0),
        ])
        .split(inner);

        render_field(frame, rows[0], "Name:", &state.name, state.active_field == FormField::Name);
        render_field(frame, rows[1], "Date:", &state.date, state.active_field == FormField::Date);

        if state.is_all_day {
            render_field(frame, rows[2], "Start:", "--:--", false);
            render_field(frame, rows[3], "End:", "--:--", false);
        } else {
            render_field(frame, rows[2], "Start:", &state.start_time, state.active_field == FormField::StartTime);
            render_field(frame, rows[3], "End:", &state.end_time, state.active_field == FormField::EndTime);
        }

        let all_day_val = if state.is_all_day { "[x] All Day" } else { "[ ] All Day" };
        render_field(frame, rows[4], "", all_day_val, state.active_field == FormField::AllDay);

        let swatch = Span::styled("  ", Style::default().bg(theme::current().event_color(state.color)));
        let color_active = state.active_field == FormField::Color;
        let color_style = if color_active {
            Style::default().fg(ratatui::style::Color::Cyan)
        } else {
            Style::default()
        };
        let color_line = Line::from(vec![
            Span::styled(format!("{:<7}", "Color:"), theme::current().dim),
            swatch,
            Span::styled(
                format!(" {}{}", state.color.label(), if color_active { "_" } else { "" }),
                color_style,
            ),
        ]);
        frame.render_widget(Paragraph::new(color_line), rows[5]);

        let help = Line::from(vec![
            Span::styled("Tab", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(":Next ", theme::current().dim),
            Span::styled("Space", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(":Toggle ", theme::current().dim),
            Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(":Save ", theme::current().dim),
            Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(":Cancel", theme::current().dim),
        ]);
        frame.render_widget(Paragraph::new(help), rows[7]);
    }
}

fn render_field(frame: &mut Frame, area: Rect, label: &str, value: &str, active: bool) {
    let label_w = if label.is_empty() { 0 } else { 7 };
    let cursor = if active { "_" } else { "" };

    let style = if active {
        Style::default().fg(ratatui::style::Color::Cyan)
    } else {
        Style::default()
    };

    let mut spans = Vec::new();
    if !label.is_empty() {
        spans.push(Span::styled(
            format!("{:<width$}", label, width = label_w),
            theme::current().dim,
        ));
    }
    spans.push(Span::styled(format!("{}{}", value, cursor), style));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
    }

    #[test]
    fn new_form_builds_timed_details() {
        let mut form = EventFormState::new(day());
        form.name = "Standup".to_string();
        form.start_time = "09:00".to_string();
        form.end_time = "09:15".to_string();

        let details = form.to_details().unwrap();
        assert_eq!(details.name, "Standup");
        assert_eq!(details.date, day());
        assert_eq!(details.color, EventColor::Blue);
        assert_eq!(
            details.schedule,
            Schedule::Timed {
                start: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                end: NaiveTime::from_hms_opt(9, 15, 0).unwrap(),
            }
        );
    }

    #[test]
    fn all_day_ignores_broken_times() {
        let mut form = EventFormState::new(day());
        form.name = "Holiday".to_string();
        form.start_time = "nope".to_string();
        form.toggle_all_day();

        assert_eq!(form.to_details().unwrap().schedule, Schedule::AllDay);
    }

    #[test]
    fn reports_first_invalid_field() {
        let mut form = EventFormState::new(day());
        assert_eq!(form.to_details(), Err(FormError::MissingName));

        form.name = "x".to_string();
        form.date = "2024-13-01".to_string();
        assert_eq!(form.to_details(), Err(FormError::InvalidDate));

        form.date = "2024-01-10".to_string();
        form.end_time = "25:00".to_string();
        assert_eq!(form.to_details(), Err(FormError::InvalidEndTime));
    }

    #[test]
    fn edit_prefills_from_event() {
        let event = Event::new(
            "id-1",
            EventDetails::timed(
                "Review",
                EventColor::Red,
                day(),
                NaiveTime::from_hms_opt(14, 30, 0).unwrap(),
                NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
            ),
        );

        let form = EventFormState::edit(&event);
        assert_eq!(form.mode, FormMode::Edit("id-1".to_string()));
        assert_eq!(form.start_time, "14:30");
        assert_eq!(form.end_time, "15:00");
        assert_eq!(form.to_details().unwrap(), event.details);
    }

    #[test]
    fn edit_keeps_seconds_untouched() {
        let start = NaiveTime::from_hms_opt(9, 0, 30).unwrap();
        let end = NaiveTime::from_hms_opt(9, 15, 45).unwrap();
        let event = Event::new(
            "id-2",
            EventDetails::timed("Sync", EventColor::Green, day(), start, end),
        );

        let form = EventFormState::edit(&event);
        assert_eq!(form.start_time, "09:00:30");
        assert_eq!(form.end_time, "09:15:45");
        assert_eq!(form.to_details().unwrap().schedule, Schedule::Timed { start, end });
    }

    #[test]
    fn typing_goes_to_active_field() {
        let mut form = EventFormState::new(day());
        form.input_char('A');
        form.active_field = form.active_field.next().next();
        form.backspace();
        form.input_char('5');

        assert_eq!(form.name, "A");
        assert_eq!(form.start_time, "09:05");
        assert_eq!(FormField::Name.prev(), FormField::Color);
    }
}
