//! Calendar event model.
//!
//! An [`Event`] carries only what the terminal box shows: the title and the
//! start as the API sent it. The start text is kept verbatim and parsed at
//! render time into a [`StartTime`], so a malformed value surfaces as an
//! error from the renderer rather than being dropped while fetching.

use chrono::{DateTime, FixedOffset, NaiveDate, Timelike};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while interpreting an event start.
#[derive(Debug, Error)]
pub enum StartTimeError {
    /// The `dateTime` field is not an RFC 3339 timestamp.
    #[error("malformed start time {text:?}: {source}")]
    DateTime {
        text: String,
        #[source]
        source: chrono::ParseError,
    },

    /// The all-day `date` field is not a `YYYY-MM-DD` date.
    #[error("malformed start date {text:?}: {source}")]
    Date {
        text: String,
        #[source]
        source: chrono::ParseError,
    },

    /// Neither `dateTime` nor `date` was present.
    #[error("event has no start time")]
    Missing,
}

/// The start of an event, as sent by the calendar API.
///
/// Timed events carry `dateTime`; all-day events carry `date` only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventStart {
    /// RFC 3339 timestamp with offset, e.g. `2024-03-15T09:05:00-04:00`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    /// All-day date, e.g. `2024-03-15`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl EventStart {
    /// A timed start.
    pub fn at(date_time: impl Into<String>) -> Self {
        Self {
            date_time: Some(date_time.into()),
            date: None,
        }
    }

    /// An all-day start.
    pub fn all_day(date: impl Into<String>) -> Self {
        Self {
            date_time: None,
            date: Some(date.into()),
        }
    }

    /// Parses the start into a [`StartTime`].
    ///
    /// `dateTime` wins when both fields are set. The timestamp keeps the
    /// offset it was written with, so the rendered clock time is the one the
    /// calendar shows for that event.
    pub fn parse(&self) -> Result<StartTime, StartTimeError> {
        if let Some(ref text) = self.date_time {
            return DateTime::parse_from_rfc3339(text)
                .map(StartTime::At)
                .map_err(|source| StartTimeError::DateTime {
                    text: text.clone(),
                    source,
                });
        }

        if let Some(ref text) = self.date {
            return NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .map(StartTime::AllDay)
                .map_err(|source| StartTimeError::Date {
                    text: text.clone(),
                    source,
                });
        }

        Err(StartTimeError::Missing)
    }
}

/// A parsed event start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartTime {
    /// A specific instant, in the offset it was written with.
    At(DateTime<FixedOffset>),
    /// An all-day event on the given date.
    AllDay(NaiveDate),
}

impl StartTime {
    /// Full English weekday name, e.g. `Friday`.
    pub fn weekday_name(&self) -> String {
        match self {
            Self::At(dt) => dt.format("%A").to_string(),
            Self::AllDay(date) => date.format("%A").to_string(),
        }
    }

    /// Zero-padded 24-hour `HH:MM`, or `None` for all-day events.
    pub fn clock(&self) -> Option<String> {
        match self {
            Self::At(dt) => Some(format!("{:02}:{:02}", dt.hour(), dt.minute())),
            Self::AllDay(_) => None,
        }
    }
}

/// A single upcoming event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// The event title. Empty when the calendar has none.
    pub title: String,
    /// When the event starts.
    pub start: EventStart,
}

impl Event {
    /// Creates a new event.
    pub fn new(title: impl Into<String>, start: EventStart) -> Self {
        Self {
            title: title.into(),
            start,
        }
    }

    /// Parses the event start.
    pub fn start_time(&self) -> Result<StartTime, StartTimeError> {
        self.start.parse()
    }
}
