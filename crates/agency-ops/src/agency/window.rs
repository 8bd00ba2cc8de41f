//! Reporting windows and the timestamp predicates derived from them.
//!
//! Dates are whole calendar days in a caller-supplied time zone (the service uses
//! the host's local zone). A window bounded on both sides selects
//! `[start 00:00:00.000, end 23:59:59.999]`; an end-only window selects everything
//! that existed by the end of that day; a start-only or open window selects
//! everything.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateWindow {
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimePredicate {
    Any,
    Between {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },
    AsOf(DateTime<Utc>),
}

impl TimePredicate {
    pub fn matches(&self, timestamp: DateTime<Utc>) -> bool {
        match self {
            Self::Any => true,
            Self::Between { from, to } => *from <= timestamp && timestamp <= *to,
            Self::AsOf(limit) => timestamp <= *limit,
        }
    }
}

impl DateWindow {
    pub fn new(start_date: Option<NaiveDate>, end_date: Option<NaiveDate>) -> Self {
        Self {
            start_date,
            end_date,
        }
    }

    pub fn unbounded() -> Self {
        Self::default()
    }

    /// General-purpose filter: range, as-of, or everything.
    pub fn predicate_in<Tz: TimeZone>(&self, tz: &Tz) -> TimePredicate {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => TimePredicate::Between {
                from: start_of_day(start, tz),
                to: end_of_day(end, tz),
            },
            (None, Some(end)) => TimePredicate::AsOf(end_of_day(end, tz)),
            _ => TimePredicate::Any,
        }
    }

    /// Closed-deal filter: applied only when both bounds are present.
    pub fn range_predicate_in<Tz: TimeZone>(&self, tz: &Tz) -> TimePredicate {
        match (self.start_date, self.end_date) {
            (Some(_), Some(_)) => self.predicate_in(tz),
            _ => TimePredicate::Any,
        }
    }

    /// "What existed by the end date", ignoring the start bound.
    pub fn existence_predicate_in<Tz: TimeZone>(&self, tz: &Tz) -> TimePredicate {
        match self.end_date {
            Some(end) => TimePredicate::AsOf(end_of_day(end, tz)),
            None => TimePredicate::Any,
        }
    }

    /// Last instant covered by the window, if it has an end.
    pub fn end_bound_in<Tz: TimeZone>(&self, tz: &Tz) -> Option<DateTime<Utc>> {
        self.end_date.map(|end| end_of_day(end, tz))
    }
}

pub fn start_of_day<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    resolve(tz, date.and_time(NaiveTime::MIN), false)
}

pub fn end_of_day<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    let last_instant =
        date.and_time(NaiveTime::MIN) + Duration::days(1) - Duration::milliseconds(1);
    resolve(tz, last_instant, true)
}

fn resolve<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime, latest: bool) -> DateTime<Utc> {
    let local = tz.from_local_datetime(&naive);
    let picked = if latest {
        local.latest()
    } else {
        local.earliest()
    };
    match picked {
        Some(moment) => moment.with_timezone(&Utc),
        // Skipped by a DST transition; fall back to reading the wall time as UTC.
        None => Utc.from_utc_datetime(&naive),
    }
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

/// Accepts a missing value, an empty string, or `YYYY-MM-DD`.
pub fn deserialize_optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    opt.filter(|value| !value.trim().is_empty())
        .map(|value| parse_date(&value).map_err(serde::de::Error::custom))
        .transpose()
}
