use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::app::{App, InputMode, ViewMode};
use crate::components::event_form::FormMode;
use crate::theme;

pub struct StatusBar;

impl StatusBar {
    pub fn render(frame: &mut Frame, area: Rect, app: &App) {
        let w = area.width as usize;
        let style = theme::current().status;

        let mode_str = match app.view_mode {
            ViewMode::Month => "[1]Month",
            ViewMode::Week => "[2]Week",
            ViewMode::Day => "[3]Day",
        };

        let focus_indicator = match (&app.input_mode, &app.form_state) {
            (InputMode::Form, Some(form)) if form.mode == FormMode::Create => " [New Event]",
            (InputMode::Form, _) => " [Edit Event]",
            (InputMode::Normal, _) => "",
        };

        // Status message wins over key hints
        let right_text = if let Some(ref msg) = app.status_message {
            format!(" {} ", msg)
        } else {
            match app.view_mode {
                ViewMode::Day | ViewMode::Month if w >= 80 => {
                    " hjkl:Nav [/]:Mon t:Today Enter:Detail n:New e:Edit d:Del ?:Help q:Quit".to_string()
                }
                ViewMode::Day | ViewMode::Month if w >= 50 => {
                    " jk:Select n:New e:Edit d:Del q:Quit".to_string()
                }
                ViewMode::Week if w >= 70 => {
                    " hl:Day jk:Week [/]:Mon t:Today n:New ?:Help q:Quit".to_string()
                }
                ViewMode::Week if w >= 50 => " arrows:Nav n:New q:Quit".to_string(),
                _ => " ?:Help q:Quit".to_string(),
            }
        };

        let left = format!(" {}{} ", mode_str, focus_indicator);
        let padding = " ".repeat(w.saturating_sub(left.len() + right_text.len()));

        let line = Line::from(vec![
            Span::styled(left, style),
            Span::styled(padding, style),
            Span::styled(right_text, style),
        ]);

        frame.render_widget(Paragraph::new(line).style(style), area);
    }
}
