// 📅 Event Scheduling - date + time → one local instant
//
// Forms send the calendar date and the clock time as two separate strings.
// They are combined field by field (never by gluing strings together and
// re-parsing) into a wall-clock instant. No timezone offset is carried: the
// instant means "local time where the club is".

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::error::ScheduleError;

static DATE_FORMAT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());
static TIME_FORMAT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{2}:\d{2}$").unwrap());
static WIRE_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4}-\d{2}-\d{2})T(\d{2}:\d{2}):(\d{2})$").unwrap());

/// Wire layout of an instant: ISO-8601 local, no zone suffix
pub const WIRE_LAYOUT: &str = "%Y-%m-%dT%H:%M:%S";

fn parse_segment(field: &'static str, segment: &str) -> Result<u32, ScheduleError> {
    segment
        .parse::<u32>()
        .map_err(|_| ScheduleError::UnparsableNumber {
            field,
            segment: segment.to_string(),
        })
}

// ============================================================================
// CALENDAR DATE
// ============================================================================

/// A `YYYY-MM-DD` date, always a real day of the proleptic Gregorian calendar
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarDate(NaiveDate);

impl CalendarDate {
    pub fn parse(input: &str) -> Result<Self, ScheduleError> {
        if !DATE_FORMAT.is_match(input) {
            return Err(ScheduleError::malformed("date", input, "expected YYYY-MM-DD"));
        }

        let mut parts = input.split('-');
        let (Some(year), Some(month), Some(day)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(ScheduleError::malformed("date", input, "expected YYYY-MM-DD"));
        };

        let year = parse_segment("date", year)?;
        let month = parse_segment("date", month)?;
        let day = parse_segment("date", day)?;

        if !(1..=12).contains(&month) {
            return Err(ScheduleError::malformed(
                "date",
                input,
                "month must be between 01 and 12",
            ));
        }

        // Four digits at most, so the year always fits
        NaiveDate::from_ymd_opt(year as i32, month, day)
            .map(CalendarDate)
            .ok_or_else(|| {
                ScheduleError::malformed(
                    "date",
                    input,
                    format!("{:04}-{:02} has no day {}", year, month, day),
                )
            })
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

// ============================================================================
// CLOCK TIME
// ============================================================================

/// A 24-hour `HH:MM` time; seconds are always zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime(NaiveTime);

impl ClockTime {
    pub fn parse(input: &str) -> Result<Self, ScheduleError> {
        if !TIME_FORMAT.is_match(input) {
            return Err(ScheduleError::malformed("time", input, "expected HH:MM (24-hour)"));
        }

        let Some((hour, minute)) = input.split_once(':') else {
            return Err(ScheduleError::malformed("time", input, "expected HH:MM (24-hour)"));
        };

        let hour = parse_segment("time", hour)?;
        let minute = parse_segment("time", minute)?;

        if hour > 23 {
            return Err(ScheduleError::malformed(
                "time",
                input,
                "hour must be between 00 and 23",
            ));
        }
        if minute > 59 {
            return Err(ScheduleError::malformed(
                "time",
                input,
                "minute must be between 00 and 59",
            ));
        }

        NaiveTime::from_hms_opt(hour, minute, 0)
            .map(ClockTime)
            .ok_or_else(|| ScheduleError::malformed("time", input, "expected HH:MM (24-hour)"))
    }

    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    pub fn minute(&self) -> u32 {
        self.0.minute()
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

// ============================================================================
// EVENT INSTANT
// ============================================================================

/// The point in time an event (or a news item) is scheduled for.
///
/// Local wall time with zero seconds. Serialized on the wire as
/// `YYYY-MM-DDTHH:MM:00` under the field name `datetime`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventInstant(NaiveDateTime);

impl EventInstant {
    pub fn new(date: CalendarDate, time: ClockTime) -> Self {
        EventInstant(NaiveDateTime::new(date.0, time.0))
    }

    /// Build from an arbitrary timestamp, dropping seconds and below
    pub fn from_naive(datetime: NaiveDateTime) -> Self {
        let time = NaiveTime::from_hms_opt(datetime.hour(), datetime.minute(), 0)
            .unwrap_or(datetime.time());
        EventInstant(NaiveDateTime::new(datetime.date(), time))
    }

    /// Parse the wire form `YYYY-MM-DDTHH:MM:00`
    pub fn from_wire(input: &str) -> Result<Self, ScheduleError> {
        let captures = WIRE_FORMAT.captures(input).ok_or_else(|| {
            ScheduleError::malformed("datetime", input, "expected YYYY-MM-DDTHH:MM:00")
        })?;

        let date = CalendarDate::parse(&captures[1])?;
        let time = ClockTime::parse(&captures[2])?;

        if &captures[3] != "00" {
            return Err(ScheduleError::malformed(
                "datetime",
                input,
                "seconds must be 00",
            ));
        }

        Ok(EventInstant::new(date, time))
    }

    pub fn to_wire(&self) -> String {
        self.0.format(WIRE_LAYOUT).to_string()
    }

    pub fn date(&self) -> CalendarDate {
        CalendarDate(self.0.date())
    }

    pub fn time(&self) -> ClockTime {
        ClockTime(self.0.time())
    }

    /// Date form field, as the user originally typed it
    pub fn date_string(&self) -> String {
        self.date().to_string()
    }

    /// Time form field, as the user originally typed it
    pub fn time_string(&self) -> String {
        self.time().to_string()
    }

    pub fn as_naive(&self) -> NaiveDateTime {
        self.0
    }
}

/// DateTime Combiner: merge a `YYYY-MM-DD` date and an `HH:MM` time
pub fn combine(date: &str, time: &str) -> Result<EventInstant, ScheduleError> {
    let date = CalendarDate::parse(date)?;
    let time = ClockTime::parse(time)?;
    Ok(EventInstant::new(date, time))
}

impl fmt::Display for EventInstant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(WIRE_LAYOUT))
    }
}

impl Serialize for EventInstant {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_wire())
    }
}

impl<'de> Deserialize<'de> for EventInstant {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        EventInstant::from_wire(&raw).map_err(de::Error::custom)
    }
}

// ============================================================================
// TESTS
// ============================================================================
