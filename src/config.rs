use chrono::NaiveDate;
use serde::Deserialize;
use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::calendar::{self, SharedCalendar};

pub const MIN_ROWS_PER_SECTION: u8 = 1;
pub const MAX_ROWS_PER_SECTION: u8 = 6;

// ─── Errors ───────────────────────────────────────────────────────────────────

/// Fatal configuration problems. Construction halts on any of these; no
/// default range is ever substituted.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("start date {start} is after end date {end}")]
    StartAfterEnd { start: NaiveDate, end: NaiveDate },

    #[error("rows per section must be between 1 and 6, got {0}")]
    InvalidRowsPerSection(u8),

    #[error("no calendar authority named `{0}`")]
    UnknownCalendar(String),

    #[error("calendar authority cannot compute month bounds for {0}")]
    DateOutOfRange(NaiveDate),

    #[error("failed to read grid settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse grid settings: {0}")]
    Parse(#[from] toml::de::Error),
}

// ─── Policies ─────────────────────────────────────────────────────────────────

/// Day that occupies column 0 of every week row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    #[default]
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Sunday, DayOfWeek::Monday, DayOfWeek::Tuesday, DayOfWeek::Wednesday,
        DayOfWeek::Thursday, DayOfWeek::Friday, DayOfWeek::Saturday,
    ];

    /// Added to a Sunday-based weekday index, mod 7, to rotate this day into column 0.
    pub fn rotation_base(self) -> u32 {
        match self {
            DayOfWeek::Monday    => 6,
            DayOfWeek::Tuesday   => 5,
            DayOfWeek::Wednesday => 4,
            DayOfWeek::Thursday  => 10,
            DayOfWeek::Friday    => 9,
            DayOfWeek::Saturday  => 8,
            DayOfWeek::Sunday    => 7,
        }
    }

    /// Inverse of a Sunday-based weekday index.
    pub fn from_weekday_index(index: u32) -> Self {
        Self::ALL[(index % 7) as usize]
    }

    pub fn short_name(self) -> &'static str {
        match self {
            DayOfWeek::Sunday    => "Su",
            DayOfWeek::Monday    => "Mo",
            DayOfWeek::Tuesday   => "Tu",
            DayOfWeek::Wednesday => "We",
            DayOfWeek::Thursday  => "Th",
            DayOfWeek::Friday    => "Fr",
            DayOfWeek::Saturday  => "Sa",
        }
    }
}

/// How many cells after the last day of a month are filled with dates of
/// the following month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrailingFillerPolicy {
    /// No trailing fillers; the last week row of a month may be short.
    Off,
    /// Complete the last week row.
    #[default]
    TillEndOfRow,
    /// Complete the row, then keep adding rows up to `rows_per_section`.
    TillEndOfGrid,
}

// ─── BoundaryConfig ───────────────────────────────────────────────────────────

/// Validated configuration for one layout generation.
#[derive(Clone)]
pub struct BoundaryConfig {
    start_date:             NaiveDate,
    end_date:               NaiveDate,
    calendar:               SharedCalendar,
    rows_per_section:       u8,
    generate_leading:       bool,
    trailing_policy:        TrailingFillerPolicy,
    first_day_of_week:      DayOfWeek,
}

impl BoundaryConfig {
    /// Builds a config with default policies: six rows, leading fillers on,
    /// trailing fillers to the end of the row, Sunday first.
    pub fn new(
        start_date: NaiveDate,
        end_date: NaiveDate,
        calendar: SharedCalendar,
    ) -> Result<Self, ConfigError> {
        if calendar.compare(start_date, end_date) == Ordering::Greater {
            return Err(ConfigError::StartAfterEnd { start: start_date, end: end_date });
        }
        Ok(Self {
            start_date, end_date, calendar,
            rows_per_section:  MAX_ROWS_PER_SECTION,
            generate_leading:  true,
            trailing_policy:   TrailingFillerPolicy::default(),
            first_day_of_week: DayOfWeek::default(),
        })
    }

    pub fn with_rows_per_section(mut self, rows: u8) -> Result<Self, ConfigError> {
        if !(MIN_ROWS_PER_SECTION..=MAX_ROWS_PER_SECTION).contains(&rows) {
            return Err(ConfigError::InvalidRowsPerSection(rows));
        }
        self.rows_per_section = rows;
        Ok(self)
    }

    pub fn with_leading_filler_dates(mut self, generate: bool) -> Self {
        self.generate_leading = generate;
        self
    }

    pub fn with_trailing_filler_policy(mut self, policy: TrailingFillerPolicy) -> Self {
        self.trailing_policy = policy;
        self
    }

    pub fn with_first_day_of_week(mut self, day: DayOfWeek) -> Self {
        self.first_day_of_week = day;
        self
    }

    pub fn start_date(&self)                    -> NaiveDate { self.start_date }
    pub fn end_date(&self)                      -> NaiveDate { self.end_date }
    pub fn calendar(&self)                      -> &SharedCalendar { &self.calendar }
    pub fn rows_per_section(&self)              -> u8 { self.rows_per_section }
    pub fn generate_leading_filler_dates(&self) -> bool { self.generate_leading }
    pub fn trailing_filler_policy(&self)        -> TrailingFillerPolicy { self.trailing_policy }
    pub fn first_day_of_week(&self)            -> DayOfWeek { self.first_day_of_week }

    /// First day of the month containing `start_date`.
    pub fn start_of_month(&self) -> Result<NaiveDate, ConfigError> {
        self.calendar.start_of_month(self.start_date)
            .ok_or(ConfigError::DateOutOfRange(self.start_date))
    }

    /// Last day of the month containing `end_date`.
    pub fn end_of_month(&self) -> Result<NaiveDate, ConfigError> {
        self.calendar.end_of_month(self.end_date)
            .ok_or(ConfigError::DateOutOfRange(self.end_date))
    }

    /// True when switching from `other` to `self` requires a new layout.
    ///
    /// Only month granularity matters for the boundary: moving the start date
    /// within the same month produces an identical grid.
    pub fn layout_differs(&self, other: &BoundaryConfig) -> bool {
        let months_differ = match (self.start_of_month(), other.start_of_month(),
                                   self.end_of_month(), other.end_of_month()) {
            (Ok(a), Ok(b), Ok(c), Ok(d)) => a != b || c != d,
            _                            => true,
        };
        months_differ
            || self.calendar.identifier() != other.calendar.identifier()
            || self.rows_per_section  != other.rows_per_section
            || self.generate_leading  != other.generate_leading
            || self.trailing_policy   != other.trailing_policy
            || self.first_day_of_week != other.first_day_of_week
    }
}

impl fmt::Debug for BoundaryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundaryConfig")
            .field("start_date", &self.start_date)
            .field("end_date", &self.end_date)
            .field("calendar", &self.calendar.identifier())
            .field("rows_per_section", &self.rows_per_section)
            .field("generate_leading", &self.generate_leading)
            .field("trailing_policy", &self.trailing_policy)
            .field("first_day_of_week", &self.first_day_of_week)
            .finish()
    }
}

// ─── On-disk settings ─────────────────────────────────────────────────────────

fn default_calendar() -> String { calendar::GREGORIAN.to_owned() }
fn default_rows()     -> u8     { MAX_ROWS_PER_SECTION }
fn default_true()     -> bool   { true }

/// TOML form of a [`BoundaryConfig`].
#[derive(Debug, Clone, Deserialize)]
pub struct GridSettings {
    pub start_date: NaiveDate,
    pub end_date:   NaiveDate,
    #[serde(default = "default_calendar")]
    pub calendar: String,
    #[serde(default = "default_rows")]
    pub rows_per_section: u8,
    #[serde(default = "default_true")]
    pub generate_leading_filler_dates: bool,
    #[serde(default)]
    pub trailing_filler_policy: TrailingFillerPolicy,
    #[serde(default)]
    pub first_day_of_week: DayOfWeek,
}

impl GridSettings {
    /// Reads `grid.toml` from the user's config directory. A missing file is
    /// an error: there is no sensible default date range.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_path(config_dir().join("grid.toml"))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn into_boundary_config(self) -> Result<BoundaryConfig, ConfigError> {
        let calendar = calendar::authority_named(&self.calendar)
            .ok_or_else(|| ConfigError::UnknownCalendar(self.calendar.clone()))?;
        Ok(BoundaryConfig::new(self.start_date, self.end_date, calendar)?
            .with_rows_per_section(self.rows_per_section)?
            .with_leading_filler_dates(self.generate_leading_filler_dates)
            .with_trailing_filler_policy(self.trailing_filler_policy)
            .with_first_day_of_week(self.first_day_of_week))
    }
}

pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("datagrid")
}
