use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventColor {
    Red,
    Green,
    Blue,
}

impl EventColor {
    pub fn next(self) -> Self {
        match self {
            EventColor::Red => EventColor::Green,
            EventColor::Green => EventColor::Blue,
            EventColor::Blue => EventColor::Red,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EventColor::Red => "red",
            EventColor::Green => "green",
            EventColor::Blue => "blue",
        }
    }
}

/// When an event happens within its day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    AllDay,
    Timed { start: NaiveTime, end: NaiveTime },
}

impl Schedule {
    pub fn is_all_day(&self) -> bool {
        matches!(self, Schedule::AllDay)
    }

    pub fn start(&self) -> Option<NaiveTime> {
        match self {
            Schedule::AllDay => None,
            Schedule::Timed { start, .. } => Some(*start),
        }
    }
}

/// Everything about an event except its identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDetails {
    pub name: String,
    pub color: EventColor,
    pub date: NaiveDate,
    pub schedule: Schedule,
}

impl EventDetails {
    pub fn all_day(name: impl Into<String>, color: EventColor, date: NaiveDate) -> Self {
        Self {
            name: name.into(),
            color,
            date,
            schedule: Schedule::AllDay,
        }
    }

    pub fn timed(
        name: impl Into<String>,
        color: EventColor,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Self {
        Self {
            name: name.into(),
            color,
            date,
            schedule: Schedule::Timed { start, end },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "EventRecord", into = "EventRecord")]
pub struct Event {
    pub id: String,
    pub details: EventDetails,
}

impl Event {
    pub fn new(id: impl Into<String>, details: EventDetails) -> Self {
        Self {
            id: id.into(),
            details,
        }
    }

    pub fn duration_display(&self) -> String {
        match self.details.schedule {
            Schedule::AllDay => "All day".to_string(),
            Schedule::Timed { start, end } => {
                format!("{} - {}", start.format("%H:%M"), end.format("%H:%M"))
            }
        }
    }
}

// ── Persisted record shape ──

/// Flat on-disk form of an [`Event`]. Dates and times are kept as text so
/// that both our own output and browser-style timestamps can be read back.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventRecord {
    id: String,
    name: String,
    color: EventColor,
    date: String,
    all_day: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    end_time: Option<String>,
}

impl From<Event> for EventRecord {
    fn from(event: Event) -> Self {
        let Event { id, details } = event;
        let (all_day, start_time, end_time) = match details.schedule {
            Schedule::AllDay => (true, None, None),
            Schedule::Timed { start, end } => {
                (false, Some(format_time(start)), Some(format_time(end)))
            }
        };

        EventRecord {
            id,
            name: details.name,
            color: details.color,
            date: details.date.format("%Y-%m-%d").to_string(),
            all_day,
            start_time,
            end_time,
        }
    }
}

impl TryFrom<EventRecord> for Event {
    type Error = String;

    fn try_from(record: EventRecord) -> Result<Self, Self::Error> {
        let date = parse_date(&record.date)
            .ok_or_else(|| format!("invalid date '{}' for event {}", record.date, record.id))?;

        let schedule = match (record.all_day, record.start_time, record.end_time) {
            (true, None, None) => Schedule::AllDay,
            (true, _, _) => {
                return Err(format!("all-day event {} must not carry times", record.id));
            }
            (false, Some(start), Some(end)) => {
                let start = parse_time(&start)
                    .ok_or_else(|| format!("invalid start time '{start}' for event {}", record.id))?;
                let end = parse_time(&end)
                    .ok_or_else(|| format!("invalid end time '{end}' for event {}", record.id))?;
                Schedule::Timed { start, end }
            }
            (false, _, _) => {
                return Err(format!(
                    "timed event {} needs both startTime and endTime",
                    record.id
                ));
            }
        };

        Ok(Event {
            id: record.id,
            details: EventDetails {
                name: record.name,
                color: record.color,
                date,
                schedule,
            },
        })
    }
}

/// Seconds are written only when present so the round trip stays exact.
pub fn format_time(time: NaiveTime) -> String {
    if time.second() == 0 && time.nanosecond() == 0 {
        time.format("%H:%M").to_string()
    } else {
        time.format("%H:%M:%S%.f").to_string()
    }
}

/// Reads `HH:MM` with optional seconds and fraction.
pub fn parse_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S%.f"))
        .ok()
}

/// Accepts a plain `YYYY-MM-DD` or a full RFC 3339 timestamp, which is how
/// a browser serializes a `Date`. Timestamps name the local calendar day
/// they fall on, since the browser wrote local midnight in UTC.
fn parse_date(s: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }
    DateTime::<FixedOffset>::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Local).date_naive())
}
