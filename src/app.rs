use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use chrono::{Datelike, Days, Local, NaiveDate};
use log::warn;

use crate::calendar::{Event, EventColor, EventStore, StorageResult};
use crate::components::event_form::{EventFormState, FormMode};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewMode {
    Month,
    Week,
    Day,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputMode {
    Normal,
    Form,
}

pub struct App {
    pub running: bool,
    pub view_mode: ViewMode,
    pub input_mode: InputMode,
    pub selected_date: NaiveDate,
    pub today: NaiveDate,
    /// Events of the selected day, all-day first then by start time.
    pub day_events: Vec<Event>,
    pub week_events: Vec<Event>,
    /// Color of the first event on each day of the selected month.
    pub day_colors: HashMap<u32, EventColor>,
    pub selected_event: usize,
    pub form_state: Option<EventFormState>,
    pub show_detail: bool,
    pub show_help: bool,
    pub status_message: Option<String>,
    store: EventStore,
    changed: Rc<Cell<bool>>,
}

impl App {
    pub fn new(store: EventStore) -> Self {
        Self::with_today(store, Local::now().date_naive())
    }

    pub fn with_today(mut store: EventStore, today: NaiveDate) -> Self {
        let changed = Rc::new(Cell::new(false));
        let flag = changed.clone();
        store.subscribe(move |_| flag.set(true));

        let mut app = Self {
            running: true,
            view_mode: ViewMode::Month,
            input_mode: InputMode::Normal,
            selected_date: today,
            today,
            day_events: Vec::new(),
            week_events: Vec::new(),
            day_colors: HashMap::new(),
            selected_event: 0,
            form_state: None,
            show_detail: false,
            show_help: false,
            status_message: None,
            store,
            changed,
        };
        app.refresh_events();
        app
    }

    pub fn store(&self) -> &EventStore {
        &self.store
    }

    pub fn refresh_events(&mut self) {
        let year = self.selected_date.year();
        let month = self.selected_date.month();
        let week_start = self.week_start();
        let week_end = week_start
            .checked_add_days(Days::new(6))
            .unwrap_or(NaiveDate::MAX);

        self.day_events.clear();
        self.week_events.clear();
        self.day_colors.clear();

        for ev in self.store.list() {
            let date = ev.details.date;
            if date == self.selected_date {
                self.day_events.push(ev.clone());
            }
            if date >= week_start && date <= week_end {
                self.week_events.push(ev.clone());
            }
            if date.year() == year && date.month() == month {
                self.day_colors.entry(date.day()).or_insert(ev.details.color);
            }
        }

        // Stable sort keeps insertion order among equals
        self.day_events
            .sort_by_key(|e| (!e.details.schedule.is_all_day(), e.details.schedule.start()));
        self.selected_event = self
            .selected_event
            .min(self.day_events.len().saturating_sub(1));
    }

    /// Pick up store changes reported through the subscription.
    fn sync(&mut self) {
        if self.changed.replace(false) {
            self.refresh_events();
        }
    }

    /// Report the outcome of a store mutation in the status bar.
    fn report(&mut self, result: StorageResult<()>, done: &str) {
        self.status_message = Some(match result {
            Ok(()) => done.to_string(),
            Err(e) => format!("Not saved: {e}"),
        });
        self.sync();
    }

    pub fn selected(&self) -> Option<&Event> {
        self.day_events.get(self.selected_event)
    }

    /// Sunday of the selected week, clamped to the earliest representable date.
    pub fn week_start(&self) -> NaiveDate {
        let offset = self.selected_date.weekday().num_days_from_sunday();
        self.selected_date
            .checked_sub_days(Days::new(offset.into()))
            .unwrap_or(NaiveDate::MIN)
    }

    // ── Navigation ──

    pub fn next_day(&mut self) {
        self.selected_date = self
            .selected_date
            .succ_opt()
            .unwrap_or(self.selected_date);
        self.on_date_changed();
    }

    pub fn prev_day(&mut self) {
        self.selected_date = self
            .selected_date
            .pred_opt()
            .unwrap_or(self.selected_date);
        self.on_date_changed();
    }

    pub fn next_week(&mut self) {
        self.selected_date = self
            .selected_date
            .checked_add_days(Days::new(7))
            .unwrap_or(NaiveDate::MAX);
        self.on_date_changed();
    }

    pub fn prev_week(&mut self) {
        self.selected_date = self
            .selected_date
            .checked_sub_days(Days::new(7))
            .unwrap_or(NaiveDate::MIN);
        self.on_date_changed();
    }

    pub fn next_month(&mut self) {
        let month = self.selected_date.month();
        let year = self.selected_date.year();
        let (new_year, new_month) = if month == 12 {
            (year + 1, 1)
        } else {
            (year, month + 1)
        };
        self.jump_to_month(new_year, new_month);
    }

    pub fn prev_month(&mut self) {
        let month = self.selected_date.month();
        let year = self.selected_date.year();
        let (new_year, new_month) = if month == 1 {
            (year - 1, 12)
        } else {
            (year, month - 1)
        };
        self.jump_to_month(new_year, new_month);
    }

    fn jump_to_month(&mut self, year: i32, month: u32) {
        let day = self.selected_date.day().min(days_in_month(year, month));
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            self.selected_date = date;
            self.on_date_changed();
        }
    }

    pub fn go_to_today(&mut self) {
        self.today = Local::now().date_naive();
        self.selected_date = self.today;
        self.on_date_changed();
    }

    fn on_date_changed(&mut self) {
        self.selected_event = 0;
        self.refresh_events();
    }

    pub fn select_next_event(&mut self) {
        if self.selected_event + 1 < self.day_events.len() {
            self.selected_event += 1;
        }
    }

    pub fn select_prev_event(&mut self) {
        self.selected_event = self.selected_event.saturating_sub(1);
    }

    // ── Detail popup ──

    pub fn show_detail(&mut self) {
        if self.selected().is_some() {
            self.show_detail = true;
        } else {
            self.status_message = Some("No event selected".to_string());
        }
    }

    pub fn close_detail(&mut self) {
        self.show_detail = false;
    }

    // ── Event form ──

    pub fn open_event_form(&mut self) {
        self.form_state = Some(EventFormState::new(self.selected_date));
        self.input_mode = InputMode::Form;
    }

    pub fn open_edit_form(&mut self) {
        let Some(event) = self.selected() else {
            self.status_message = Some("No event selected".to_string());
            return;
        };
        self.form_state = Some(EventFormState::edit(event));
        self.input_mode = InputMode::Form;
        self.show_detail = false;
    }

    pub fn close_event_form(&mut self) {
        self.form_state = None;
        self.input_mode = InputMode::Normal;
    }

    pub fn submit_event_form(&mut self) {
        let Some(form) = self.form_state.as_ref() else {
            return;
        };
        let details = match form.to_details() {
            Ok(details) => details,
            Err(e) => {
                self.status_message = Some(e.to_string());
                return;
            }
        };
        let mode = form.mode.clone();
        let date = details.date;
        self.close_event_form();

        let result = match mode {
            FormMode::Create => self.store.add(details).map(|_| ()),
            FormMode::Edit(id) => self.store.update(&id, details),
        };
        if let Err(ref e) = result {
            warn!("Event change kept in memory only: {e}");
        }
        self.report(result, "Event saved");

        // Follow the event to its (possibly new) date
        if date != self.selected_date {
            self.selected_date = date;
            self.on_date_changed();
        }
    }

    pub fn form_tab(&mut self) {
        if let Some(f) = self.form_state.as_mut() {
            f.active_field = f.active_field.next();
        }
    }

    pub fn form_backtab(&mut self) {
        if let Some(f) = self.form_state.as_mut() {
            f.active_field = f.active_field.prev();
        }
    }

    pub fn form_backspace(&mut self) {
        if let Some(f) = self.form_state.as_mut() {
            f.backspace();
        }
    }

    pub fn form_input_char(&mut self, c: char) {
        if let Some(f) = self.form_state.as_mut() {
            f.input_char(c);
        }
    }

    /// Space toggles all-day, cycles the color, or types a space.
    pub fn form_space(&mut self) {
        use crate::components::event_form::FormField;

        if let Some(f) = self.form_state.as_mut() {
            match f.active_field {
                FormField::AllDay => f.toggle_all_day(),
                FormField::Color => f.next_color(),
                _ => f.input_char(' '),
            }
        }
    }

    // ── Delete ──

    pub fn delete_selected_event(&mut self) {
        let Some(id) = self.selected().map(|e| e.id.clone()) else {
            self.status_message = Some("No event selected".to_string());
            return;
        };
        self.show_detail = false;
        let result = self.store.delete(&id);
        self.report(result, "Event deleted");
    }
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let first = NaiveDate::from_ymd_opt(year, month, 1);
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    match (first, next) {
        (Some(first), Some(next)) => next.signed_duration_since(first).num_days() as u32,
        _ => 30,
    }
}
