use chrono::{Datelike, Duration, Months, NaiveDate};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Shared handle to the calendar that performs all date arithmetic for a grid.
pub type SharedCalendar = Arc<dyn CalendarAuthority>;

/// Calendar-unit arithmetic consumed by the layout planner and resolver.
///
/// The grid never computes month lengths or weekdays itself; everything goes
/// through an authority so that a host can plug in its own calendar rules.
/// Methods returning `Option` yield `None` when the result is not
/// representable.
pub trait CalendarAuthority: fmt::Debug + Send + Sync {
    /// Stable name used to decide whether two configs share a calendar.
    fn identifier(&self) -> &str;

    fn start_of_month(&self, date: NaiveDate) -> Option<NaiveDate>;
    fn end_of_month(&self, date: NaiveDate) -> Option<NaiveDate>;
    fn add_days(&self, date: NaiveDate, days: i64) -> Option<NaiveDate>;
    fn add_months(&self, date: NaiveDate, months: i32) -> Option<NaiveDate>;

    /// 0-indexed weekday, Sunday = 0.
    fn weekday_index(&self, date: NaiveDate) -> u32;
    fn day_of_month(&self, date: NaiveDate) -> u32;
    /// 1-indexed month of the year.
    fn month_number(&self, date: NaiveDate) -> u32;

    fn compare(&self, a: NaiveDate, b: NaiveDate) -> Ordering {
        a.cmp(&b)
    }

    fn days_in_month(&self, date: NaiveDate) -> Option<u32> {
        self.end_of_month(date).map(|last| self.day_of_month(last))
    }
}

// ─── Gregorian ────────────────────────────────────────────────────────────────

/// Proleptic Gregorian calendar backed by chrono.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GregorianCalendar;

pub const GREGORIAN: &str = "gregorian";

impl CalendarAuthority for GregorianCalendar {
    fn identifier(&self) -> &str { GREGORIAN }

    fn start_of_month(&self, date: NaiveDate) -> Option<NaiveDate> {
        date.with_day(1)
    }

    fn end_of_month(&self, date: NaiveDate) -> Option<NaiveDate> {
        let days = days_in_month(date.year(), date.month())?;
        date.with_day(days)
    }

    fn add_days(&self, date: NaiveDate, days: i64) -> Option<NaiveDate> {
        date.checked_add_signed(Duration::try_days(days)?)
    }

    fn add_months(&self, date: NaiveDate, months: i32) -> Option<NaiveDate> {
        let span = Months::new(months.unsigned_abs());
        if months >= 0 { date.checked_add_months(span) } else { date.checked_sub_months(span) }
    }

    fn weekday_index(&self, date: NaiveDate) -> u32 { date.weekday().num_days_from_sunday() }
    fn day_of_month(&self, date: NaiveDate)   -> u32 { date.day() }
    fn month_number(&self, date: NaiveDate)   -> u32 { date.month() }
}

/// Looks up a calendar authority by its configured name.
pub fn authority_named(name: &str) -> Option<SharedCalendar> {
    match name.trim().to_ascii_lowercase().as_str() {
        GREGORIAN | "iso8601" => Some(Arc::new(GregorianCalendar)),
        _                     => None,
    }
}

pub fn gregorian() -> SharedCalendar {
    Arc::new(GregorianCalendar)
}

pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    Some((next? - first).num_days() as u32)
}
