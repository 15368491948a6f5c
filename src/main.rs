use std::time::Duration;

use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyModifiers};
use log::info;
use ratatui::layout::{Constraint, Layout, Rect};

use event_calendar::app::{App, InputMode, ViewMode};
use event_calendar::calendar::{EventStore, FileStore, StorageAdapter};
use event_calendar::components::{self, day_view, DayView, EventForm, MonthView, StatusBar, WeekView};
use event_calendar::config::Config;
use event_calendar::{event, logging, theme, tui};

fn main() -> Result<()> {
    color_eyre::install()?;

    let config = Config::load()?;
    if let Some(path) = config.log_file() {
        logging::init(&path)?;
    }
    theme::init(config.theme.to_theme());

    let data_dir = config.data_dir()?;
    let backend = FileStore::open(&data_dir)
        .wrap_err_with(|| format!("Could not open storage at {}", data_dir.display()))?
        .with_quota(config.quota_bytes);
    info!("Using storage directory {}", backend.dir().display());
    let adapter = StorageAdapter::new(backend).with_key(config.storage_key.clone());
    let key = adapter.key().to_string();
    let store = EventStore::open_with(adapter, config.on_corrupt)
        .wrap_err_with(|| format!("Could not load stored events under '{key}'"))?;
    info!("Opened calendar with {} events", store.list().len());

    let mut app = App::new(store);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &mut app);
    tui::restore()?;
    result
}

fn run(terminal: &mut tui::Tui, app: &mut App) -> Result<()> {
    while app.running {
        terminal.draw(|frame| {
            let area = frame.area();

            // Main layout: content + status bar
            let layout = Layout::vertical([
                Constraint::Min(1),
                Constraint::Length(1),
            ])
            .split(area);

            let content_area = layout[0];

            match app.view_mode {
                ViewMode::Month => render_month_layout(frame, content_area, app),
                ViewMode::Week => {
                    WeekView::render(
                        frame,
                        content_area,
                        app.selected_date,
                        app.today,
                        app.week_start(),
                        &app.week_events,
                    );
                }
                ViewMode::Day => {
                    DayView::render(
                        frame,
                        content_area,
                        app.selected_date,
                        &app.day_events,
                        app.selected_event,
                    );
                }
            }

            if let Some(ref form) = app.form_state {
                EventForm::render(frame, area, form);
            }

            if app.show_detail {
                if let Some(ev) = app.selected() {
                    day_view::render_detail_popup(frame, area, ev);
                }
            }

            if app.show_help {
                render_help(frame, area);
            }

            StatusBar::render(frame, layout[1], app);
        })?;

        if let Some(key) = event::next_key_press(Duration::from_millis(250))? {
            // Clear status message on any key
            app.status_message = None;

            // Help overlay takes priority
            if app.show_help {
                if key.code == KeyCode::Esc || key.code == KeyCode::Char('?') {
                    app.show_help = false;
                }
                continue;
            }

            match app.input_mode {
                InputMode::Form => handle_form_input(app, key.code),
                InputMode::Normal if app.show_detail => handle_detail_input(app, key.code),
                InputMode::Normal => handle_normal_input(app, key.code, key.modifiers),
            }
        }
    }

    Ok(())
}

fn handle_normal_input(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    match (code, modifiers) {
        (KeyCode::Char('q'), _) | (KeyCode::Char('c'), KeyModifiers::CONTROL) => {
            app.running = false;
        }
        (KeyCode::Char('1'), _) => app.view_mode = ViewMode::Month,
        (KeyCode::Char('2'), _) => app.view_mode = ViewMode::Week,
        (KeyCode::Char('3'), _) => app.view_mode = ViewMode::Day,
        (KeyCode::Char('t'), _) => app.go_to_today(),
        (KeyCode::Char('n'), _) => app.open_event_form(),
        (KeyCode::Char('e'), _) => app.open_edit_form(),
        (KeyCode::Char('d'), _) | (KeyCode::Delete, _) => app.delete_selected_event(),
        (KeyCode::Enter, _) => app.show_detail(),
        (KeyCode::Left, _) | (KeyCode::Char('h'), _) => app.prev_day(),
        (KeyCode::Right, _) | (KeyCode::Char('l'), _) => app.next_day(),
        (KeyCode::Up, _) | (KeyCode::Char('k'), _) => {
            if app.view_mode == ViewMode::Week {
                app.prev_week();
            } else {
                app.select_prev_event();
            }
        }
        (KeyCode::Down, _) | (KeyCode::Char('j'), _) => {
            if app.view_mode == ViewMode::Week {
                app.next_week();
            } else {
                app.select_next_event();
            }
        }
        (KeyCode::Char('['), _) => app.prev_month(),
        (KeyCode::Char(']'), _) => app.next_month(),
        (KeyCode::Char('?'), _) => app.show_help = true,
        _ => {}
    }
}

fn handle_detail_input(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Esc | KeyCode::Enter => app.close_detail(),
        KeyCode::Char('e') => app.open_edit_form(),
        KeyCode::Char('d') => app.delete_selected_event(),
        _ => {}
    }
}

fn handle_form_input(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Esc => app.close_event_form(),
        KeyCode::Enter => app.submit_event_form(),
        KeyCode::Tab => app.form_tab(),
        KeyCode::BackTab => app.form_backtab(),
        KeyCode::Backspace => app.form_backspace(),
        KeyCode::Char(' ') => app.form_space(),
        KeyCode::Char(c) => app.form_input_char(c),
        _ => {}
    }
}

fn render_month_layout(frame: &mut ratatui::Frame, area: Rect, app: &App) {
    let total_width = area.width;
    if total_width < 60 {
        MonthView::render(frame, area, app.selected_date, app.today, &app.day_colors);
        return;
    }

    let month_w = if total_width >= 100 { 44 } else { 37 };
    let content = Layout::horizontal([
        Constraint::Length(month_w),
        Constraint::Min(20),
    ])
    .split(area);

    MonthView::render(frame, content[0], app.selected_date, app.today, &app.day_colors);
    DayView::render(
        frame,
        content[1],
        app.selected_date,
        &app.day_events,
        app.selected_event,
    );
}

fn render_help(frame: &mut ratatui::Frame, area: Rect) {
    use ratatui::style::{Color, Modifier, Style};
    use ratatui::text::{Line, Span};
    use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

    let popup_area = components::popup_area(area, 52, 22, 30, 12);

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(" Keybindings ")
        .title_style(Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let key_style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let dim = theme::current().dim;
    let section_style = Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED);

    let entry = |keys: &'static str, desc: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {keys:<10}"), key_style),
            Span::raw(desc),
        ])
    };

    let lines = vec![
        Line::from(Span::styled("Navigation", section_style)),
        entry("h/l", "Previous/next day"),
        entry("j/k", "Select event (week view: week)"),
        entry("[/]", "Previous/next month"),
        entry("t", "Jump to today"),
        Line::from(""),
        Line::from(Span::styled("Views", section_style)),
        entry("1/2/3", "Month / Week / Day view"),
        Line::from(""),
        Line::from(Span::styled("Events", section_style)),
        entry("Enter", "Show event details"),
        entry("n", "Create new event"),
        entry("e", "Edit selected event"),
        entry("d", "Delete selected event"),
        Line::from(""),
        entry("Esc", "Close popup or form"),
        Line::from(vec![
            Span::styled("  q", key_style),
            Span::styled(" / ", dim),
            Span::styled("Ctrl-c  ", key_style),
            Span::raw("Quit"),
        ]),
    ];

    let para = Paragraph::new(lines).wrap(Wrap { trim: false });
    frame.render_widget(para, inner);
}
