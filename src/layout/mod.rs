use chrono::NaiveDate;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::config::{BoundaryConfig, ConfigError, DayOfWeek, TrailingFillerPolicy};

/// Cells in one section: a section is exactly one calendar week.
pub const DAYS_IN_WEEK: usize = 7;

// ─── Generation ───────────────────────────────────────────────────────────────

/// Version tag of one consistent layout computation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub fn value(self) -> u64 { self.0 }
    pub fn next(self)  -> Self { Self(self.0.wrapping_add(1)) }
}

// ─── MonthDescriptor ──────────────────────────────────────────────────────────

/// Layout of one calendar month inside the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthDescriptor {
    /// Day 1 of the month.
    pub first_day: NaiveDate,
    /// Days from the first day of the range's first month to `first_day`.
    pub start_index: i64,
    /// Leading filler cells before day 1.
    pub pre_dates_count: usize,
    pub number_of_days_in_month: usize,
    /// Item count of each week row, in order.
    pub sections: Vec<usize>,
    /// Global section index → index into `sections`.
    pub section_index_map: BTreeMap<usize, usize>,
    /// Global index of this month's first section.
    pub first_section: usize,
}

impl MonthDescriptor {
    pub fn total_items(&self) -> usize {
        self.sections.iter().sum()
    }

    /// Cells of this month's own sections that precede the local section `local`.
    pub fn items_before(&self, local: usize) -> usize {
        self.sections[..local.min(self.sections.len())].iter().sum()
    }

    pub fn trailing_filler_count(&self) -> usize {
        self.total_items().saturating_sub(self.pre_dates_count + self.number_of_days_in_month)
    }
}

// ─── MonthLayout ──────────────────────────────────────────────────────────────

/// Output of [`plan`]: the months of a range and the section ownership map.
#[derive(Debug, Clone)]
pub struct MonthLayout {
    config:           BoundaryConfig,
    start_of_month:   NaiveDate,
    end_of_month:     NaiveDate,
    months:           Vec<MonthDescriptor>,
    section_to_month: Vec<usize>,
    generation:       Generation,
}

impl MonthLayout {
    pub fn config(&self)         -> &BoundaryConfig { &self.config }
    pub fn months(&self)         -> &[MonthDescriptor] { &self.months }
    pub fn generation(&self)     -> Generation { self.generation }
    pub fn start_of_month(&self) -> NaiveDate { self.start_of_month }
    pub fn end_of_month(&self)   -> NaiveDate { self.end_of_month }

    pub fn number_of_months(&self)   -> usize { self.months.len() }
    pub fn number_of_sections(&self) -> usize { self.section_to_month.len() }

    pub fn month_index_for_section(&self, section: usize) -> Option<usize> {
        self.section_to_month.get(section).copied()
    }

    pub fn month_for_section(&self, section: usize) -> Option<&MonthDescriptor> {
        self.month_index_for_section(section).map(|index| &self.months[index])
    }

    /// Number of week rows the month at `month_index` occupies; 0 if unknown.
    pub fn sections_for_month(&self, month_index: usize) -> usize {
        self.months.get(month_index).map_or(0, |month| month.sections.len())
    }

    /// Cells in a section; 0 for a section the grid does not emit.
    pub fn items_in_section(&self, section: usize) -> usize {
        let Some(month) = self.month_for_section(section) else { return 0 };
        match month.section_index_map.get(&section) {
            Some(&local) => month.sections[local],
            None => {
                debug_assert!(false, "section {section} is mapped to a month that does not list it");
                tracing::warn!("section {section} missing from its month's index map");
                0
            }
        }
    }

    /// Every month has the same number of rows.
    pub fn rows_are_static(&self) -> bool {
        self.config.generate_leading_filler_dates()
            && self.config.trailing_filler_policy() == TrailingFillerPolicy::TillEndOfGrid
    }

    /// Index of the month containing `date`, if it lies inside the range.
    pub fn month_index_for_date(&self, date: NaiveDate) -> Option<usize> {
        let calendar = self.config.calendar();
        if calendar.compare(date, self.start_of_month) == Ordering::Less
            || calendar.compare(date, self.end_of_month) == Ordering::Greater
        {
            return None;
        }
        let after = self.months
            .partition_point(|m| calendar.compare(m.first_day, date) != Ordering::Greater);
        after.checked_sub(1)
    }
}

// ─── Planner ──────────────────────────────────────────────────────────────────

/// Leading filler count for a month whose first day has Sunday-based weekday
/// `weekday`, with `first_day` in column 0.
pub fn leading_filler_count(weekday: u32, first_day: DayOfWeek) -> usize {
    ((weekday + first_day.rotation_base()) % DAYS_IN_WEEK as u32) as usize
}

/// Total cells a month occupies once trailing fillers are applied.
pub fn cell_count(filled: usize, policy: TrailingFillerPolicy, rows_per_section: u8) -> usize {
    let to_end_of_row = filled.div_ceil(DAYS_IN_WEEK) * DAYS_IN_WEEK;
    match policy {
        TrailingFillerPolicy::Off          => filled,
        TrailingFillerPolicy::TillEndOfRow => to_end_of_row,
        TrailingFillerPolicy::TillEndOfGrid => {
            to_end_of_row.max(rows_per_section as usize * DAYS_IN_WEEK)
        }
    }
}

fn split_into_weeks(total: usize) -> Vec<usize> {
    let mut sections = vec![DAYS_IN_WEEK; total / DAYS_IN_WEEK];
    if total % DAYS_IN_WEEK != 0 {
        sections.push(total % DAYS_IN_WEEK);
    }
    sections
}

/// Partitions the configured range into week sections grouped by month.
///
/// Global section indices run sequentially across months in date order.
pub fn plan(config: &BoundaryConfig, generation: Generation) -> Result<MonthLayout, ConfigError> {
    let calendar       = config.calendar();
    let start_of_month = config.start_of_month()?;
    let end_of_month   = config.end_of_month()?;

    let mut months           = Vec::new();
    let mut section_to_month = Vec::new();
    let mut first_day        = start_of_month;
    let mut start_index: i64 = 0;

    while calendar.compare(first_day, end_of_month) != Ordering::Greater {
        let last_day = calendar.end_of_month(first_day)
            .ok_or(ConfigError::DateOutOfRange(first_day))?;
        let days = calendar.day_of_month(last_day) as usize;

        let pre_dates_count = if months.is_empty() && !config.generate_leading_filler_dates() {
            0
        } else {
            leading_filler_count(calendar.weekday_index(first_day), config.first_day_of_week())
        };

        let total = cell_count(
            pre_dates_count + days,
            config.trailing_filler_policy(),
            config.rows_per_section(),
        );
        let sections = split_into_weeks(total);

        let month_index   = months.len();
        let first_section = section_to_month.len();
        let mut section_index_map = BTreeMap::new();
        for local in 0..sections.len() {
            section_index_map.insert(first_section + local, local);
            section_to_month.push(month_index);
        }

        months.push(MonthDescriptor {
            first_day, start_index, pre_dates_count,
            number_of_days_in_month: days,
            sections, section_index_map, first_section,
        });

        start_index += days as i64;
        // The day after the last day of the final month may not be
        // representable; only then does the loop end early.
        match calendar.add_days(last_day, 1) {
            Some(next) => first_day = next,
            None       => break,
        }
    }

    tracing::debug!(
        "planned {} months / {} sections (generation {})",
        months.len(), section_to_month.len(), generation.value()
    );

    Ok(MonthLayout {
        config: config.clone(),
        start_of_month, end_of_month,
        months, section_to_month, generation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::gregorian;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn q1_2024() -> BoundaryConfig {
        BoundaryConfig::new(d(2024, 1, 1), d(2024, 3, 31), gregorian()).unwrap()
    }

    #[test]
    fn first_quarter_till_end_of_row() {
        let layout = plan(&q1_2024(), Generation::default()).unwrap();
        let months = layout.months();
        assert_eq!(months.len(), 3);

        // Jan 2024 starts on Monday, Feb on Thursday, Mar on Friday.
        assert_eq!(months[0].pre_dates_count, 1);
        assert_eq!(months[1].pre_dates_count, 4);
        assert_eq!(months[2].pre_dates_count, 5);

        assert_eq!(months[0].sections, vec![7; 5]);
        assert_eq!(months[1].sections, vec![7; 5]);
        assert_eq!(months[2].sections, vec![7; 6]);
        assert_eq!(layout.number_of_sections(), 16);

        assert_eq!(months[1].first_section, 5);
        assert_eq!(months[1].start_index, 31);
        assert_eq!(months[2].start_index, 60);
        assert_eq!(months[2].section_index_map.get(&12), Some(&2));
        assert_eq!(layout.month_index_for_section(15), Some(2));
        assert_eq!(layout.month_index_for_section(16), None);

        assert_eq!(layout.sections_for_month(0), 5);
        assert_eq!(layout.sections_for_month(2), 6);
        assert_eq!(layout.sections_for_month(99), 0);
    }

    #[test]
    fn monday_first_shifts_leading_fillers() {
        let config = q1_2024().with_first_day_of_week(DayOfWeek::Monday);
        let layout = plan(&config, Generation::default()).unwrap();
        let pre: Vec<_> = layout.months().iter().map(|m| m.pre_dates_count).collect();
        assert_eq!(pre, vec![0, 3, 4]);
    }

    #[test]
    fn off_policy_leaves_short_last_row() {
        let config = q1_2024().with_trailing_filler_policy(TrailingFillerPolicy::Off);
        let layout = plan(&config, Generation::default()).unwrap();
        let jan = &layout.months()[0];
        assert_eq!(jan.sections, vec![7, 7, 7, 7, 4]);
        assert_eq!(jan.trailing_filler_count(), 0);
        assert_eq!(layout.items_in_section(4), 4);
    }

    #[test]
    fn till_end_of_grid_pads_to_row_count() {
        let config = q1_2024()
            .with_trailing_filler_policy(TrailingFillerPolicy::TillEndOfGrid);
        let layout = plan(&config, Generation::default()).unwrap();
        assert!(layout.rows_are_static());
        for month in layout.months() {
            assert_eq!(month.sections.len(), 6);
            assert_eq!(month.total_items() % DAYS_IN_WEEK, 0);
        }

        // Fewer configured rows than a month needs never truncates it.
        let config = config.with_rows_per_section(4).unwrap();
        let layout = plan(&config, Generation::default()).unwrap();
        assert_eq!(layout.months()[2].sections.len(), 6);
        assert_eq!(layout.months()[0].sections.len(), 5);
    }

    #[test]
    fn disabled_leading_fillers_only_affect_first_month() {
        let config = q1_2024().with_leading_filler_dates(false);
        let layout = plan(&config, Generation::default()).unwrap();
        let pre: Vec<_> = layout.months().iter().map(|m| m.pre_dates_count).collect();
        assert_eq!(pre, vec![0, 4, 5]);
        assert!(!layout.rows_are_static());
    }

    #[test]
    fn sections_always_cover_month() {
        for policy in [TrailingFillerPolicy::Off, TrailingFillerPolicy::TillEndOfRow,
                       TrailingFillerPolicy::TillEndOfGrid] {
            for day in DayOfWeek::ALL {
                let config = BoundaryConfig::new(d(2023, 1, 15), d(2025, 12, 2), gregorian())
                    .unwrap()
                    .with_trailing_filler_policy(policy)
                    .with_first_day_of_week(day);
                let layout = plan(&config, Generation::default()).unwrap();
                assert_eq!(layout.number_of_months(), 36);
                for month in layout.months() {
                    assert!(month.total_items() >= month.pre_dates_count + month.number_of_days_in_month);
                    assert!((1..=6).contains(&month.sections.len()));
                    if policy != TrailingFillerPolicy::Off {
                        assert_eq!(month.total_items() % DAYS_IN_WEEK, 0);
                    }
                }
            }
        }
    }

    #[test]
    fn month_lookup_by_date() {
        let layout = plan(&q1_2024(), Generation::default()).unwrap();
        assert_eq!(layout.month_index_for_date(d(2024, 1, 1)), Some(0));
        assert_eq!(layout.month_index_for_date(d(2024, 2, 29)), Some(1));
        assert_eq!(layout.month_index_for_date(d(2024, 3, 31)), Some(2));
        assert_eq!(layout.month_index_for_date(d(2023, 12, 31)), None);
        assert_eq!(layout.month_index_for_date(d(2024, 4, 1)), None);
    }
}
