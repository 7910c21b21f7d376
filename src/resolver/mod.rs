use chrono::NaiveDate;
use std::cmp::Ordering;

use crate::layout::{Generation, MonthLayout, DAYS_IN_WEEK};

/// Most days of the following month a month's grid can show: six full rows
/// over a 28-day month with no leading fillers.
const MAX_TRAILING_FILLERS: u32 = 14;

/// Most days of the previous month a first row can show.
const MAX_LEADING_FILLERS: u32 = DAYS_IN_WEEK as u32 - 1;

// ─── Coordinates & ownership ──────────────────────────────────────────────────

/// Flat grid coordinate. `section` is global across all months; `item` is the
/// column inside the week row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GridPosition {
    pub section: usize,
    pub item:    usize,
}

impl GridPosition {
    pub fn new(section: usize, item: usize) -> Self {
        Self { section, item }
    }

    pub fn left(self) -> Option<Self> {
        self.item.checked_sub(1).map(|item| Self::new(self.section, item))
    }

    pub fn right(self) -> Option<Self> {
        (self.item + 1 < DAYS_IN_WEEK).then(|| Self::new(self.section, self.item + 1))
    }
}

/// Which month a rendered date belongs to, relative to the section's month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateOwner {
    ThisMonth,
    PreviousMonthWithinBoundary,
    PreviousMonthOutsideBoundary,
    FollowingMonthWithinBoundary,
    FollowingMonthOutsideBoundary,
}

impl DateOwner {
    pub fn is_filler(self) -> bool {
        self != DateOwner::ThisMonth
    }

    pub fn is_within_boundary(self) -> bool {
        !matches!(self, DateOwner::PreviousMonthOutsideBoundary
                      | DateOwner::FollowingMonthOutsideBoundary)
    }
}

/// First and last in-month dates rendered in a section, plus the owning
/// month's number (1-12).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionDates {
    pub start: NaiveDate,
    pub end:   NaiveDate,
    pub month: u32,
}

// ─── Resolver ─────────────────────────────────────────────────────────────────

/// Maps grid positions to dates and back against one planned layout.
#[derive(Debug, Clone, Copy)]
pub struct DateResolver<'a> {
    layout: &'a MonthLayout,
}

impl<'a> DateResolver<'a> {
    pub fn new(layout: &'a MonthLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self)     -> &'a MonthLayout { self.layout }
    pub fn generation(&self) -> Generation { self.layout.generation() }

    /// Date rendered at `position` and which month owns it. `None` for a
    /// position the grid does not emit.
    pub fn date_at(&self, position: GridPosition) -> Option<(NaiveDate, DateOwner)> {
        let month = self.layout.month_for_section(position.section)?;
        if position.item >= self.layout.items_in_section(position.section) {
            return None;
        }
        let local = *month.section_index_map.get(&position.section)?;

        let pre  = month.pre_dates_count as i64;
        let days = month.number_of_days_in_month as i64;
        let (offset, correction) = match local {
            0 => (pre, 0),
            _ => (0, month.items_before(local) as i64 - pre),
        };

        let item     = position.item as i64;
        let calendar = self.layout.config().calendar();
        let origin   = self.layout.start_of_month();

        if item >= offset && item + correction < days + offset {
            let day_index = month.start_index + item - offset + correction;
            let date = calendar.add_days(origin, day_index)?;
            Some((date, DateOwner::ThisMonth))
        } else if item < offset {
            let day_index = item - offset + month.start_index;
            let date = calendar.add_days(origin, day_index)?;
            let owner = if calendar.compare(date, origin) == Ordering::Less {
                DateOwner::PreviousMonthOutsideBoundary
            } else {
                DateOwner::PreviousMonthWithinBoundary
            };
            Some((date, owner))
        } else {
            let day_index = month.start_index - offset + item + correction;
            let date = calendar.add_days(origin, day_index)?;
            let owner = if calendar.compare(date, self.layout.end_of_month()) == Ordering::Greater {
                DateOwner::FollowingMonthOutsideBoundary
            } else {
                DateOwner::FollowingMonthWithinBoundary
            };
            Some((date, owner))
        }
    }

    /// In-month position of each date, in input order. Dates outside the
    /// planned months are skipped.
    pub fn positions_of(&self, dates: &[NaiveDate]) -> Vec<GridPosition> {
        dates.iter().filter_map(|&date| self.position_of(date)).collect()
    }

    pub fn position_of(&self, date: NaiveDate) -> Option<GridPosition> {
        let month = &self.layout.months()[self.layout.month_index_for_date(date)?];
        let day   = self.layout.config().calendar().day_of_month(date) as usize;
        let cell  = day + month.pre_dates_count - 1;
        Some(GridPosition::new(
            month.first_section + cell / DAYS_IN_WEEK,
            cell % DAYS_IN_WEEK,
        ))
    }

    /// Second position rendering `date`, if the grid shows it twice.
    ///
    /// `position` and `owner` describe the cell the caller already knows about.
    pub fn counterpart_of(
        &self,
        date: NaiveDate,
        position: GridPosition,
        owner: DateOwner,
    ) -> Option<GridPosition> {
        if owner.is_filler() {
            return self.position_of(date).filter(|&p| p != position);
        }
        if !self.within_months(date) {
            return None;
        }

        let calendar = self.layout.config().calendar();
        let day      = calendar.day_of_month(date);
        let last_day = calendar.days_in_month(date)?;
        if day <= MAX_TRAILING_FILLERS {
            self.counterpart_in_previous_month(date, day)
        } else if day + MAX_LEADING_FILLERS > last_day {
            self.counterpart_in_following_month(date, day, last_day)
        } else {
            None
        }
    }

    /// Trailing filler copy of an early-month date in the previous month's last rows.
    fn counterpart_in_previous_month(&self, date: NaiveDate, day: u32) -> Option<GridPosition> {
        let calendar   = self.layout.config().calendar();
        let prev_month = calendar.add_months(date, -1)?;
        if !self.within_months(prev_month) {
            return None;
        }
        let last_day = calendar.end_of_month(prev_month)?;
        let last     = self.position_of(last_day)?;

        let item_index = last.item + day as usize;
        let candidate  = GridPosition::new(
            last.section + item_index / DAYS_IN_WEEK,
            item_index % DAYS_IN_WEEK,
        );
        match self.date_at(candidate) {
            Some((found, owner)) if found == date && owner.is_filler() => Some(candidate),
            _ => None,
        }
    }

    /// Leading filler copy of a late-month date in the following month's first row.
    fn counterpart_in_following_month(
        &self,
        date: NaiveDate,
        day: u32,
        last_day: u32,
    ) -> Option<GridPosition> {
        let calendar        = self.layout.config().calendar();
        let following_month = calendar.add_months(date, 1)?;
        if !self.within_months(following_month) {
            return None;
        }
        let first_day = calendar.start_of_month(following_month)?;
        let first     = self.position_of(first_day)?;

        let y = first.item as i64 - (last_day as i64 - day as i64) - 1;
        (y >= 0).then(|| GridPosition::new(first.section, y as usize))
    }

    fn within_months(&self, date: NaiveDate) -> bool {
        self.layout.month_index_for_date(date).is_some()
    }

    /// In-month date span of a section and its month number.
    pub fn date_range_for_section(&self, section: usize) -> Option<SectionDates> {
        let month = self.layout.month_for_section(section)?;
        let mut in_month = (0..self.layout.items_in_section(section))
            .filter_map(|item| self.date_at(GridPosition::new(section, item)))
            .filter(|&(_, owner)| owner == DateOwner::ThisMonth)
            .map(|(date, _)| date);
        let start = in_month.next()?;
        let end   = in_month.last().unwrap_or(start);
        Some(SectionDates {
            start, end,
            month: self.layout.config().calendar().month_number(month.first_day),
        })
    }

    /// Day 1 of the month owning `section`.
    pub fn month_start_for_section(&self, section: usize) -> Option<NaiveDate> {
        self.layout.month_for_section(section).map(|month| month.first_day)
    }
}
