use chrono::NaiveDate;
use std::collections::BTreeSet;

use crate::layout::{Generation, MonthLayout};
use crate::resolver::{DateOwner, DateResolver, GridPosition};

/// A selected cell and the date it was selected as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SelectionEntry {
    pub date:     NaiveDate,
    pub position: GridPosition,
}

/// Where a selected cell sits inside a horizontal run of selected cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectionRangePosition {
    Left,
    Middle,
    Right,
    Full,
    None,
}

// ─── Tracker ──────────────────────────────────────────────────────────────────

/// Selected cells, in insertion order, tagged with the layout generation
/// their positions were computed against.
#[derive(Debug, Clone, Default)]
pub struct SelectionTracker {
    entries:    Vec<SelectionEntry>,
    generation: Generation,
}

impl SelectionTracker {
    pub fn new(generation: Generation) -> Self {
        Self { entries: Vec::new(), generation }
    }

    pub fn generation(&self) -> Generation { self.generation }
    pub fn entries(&self)    -> &[SelectionEntry] { &self.entries }
    pub fn is_empty(&self)   -> bool { self.entries.is_empty() }

    /// False once `layout` has been regenerated since the last reconcile.
    pub fn is_current_for(&self, layout: &MonthLayout) -> bool {
        self.generation == layout.generation()
    }

    /// Records `date` at `position`. Returns false if the position was
    /// already selected.
    pub fn select(&mut self, position: GridPosition, date: NaiveDate) -> bool {
        if self.is_selected(position) {
            return false;
        }
        self.entries.push(SelectionEntry { date, position });
        true
    }

    pub fn deselect(&mut self, position: GridPosition) -> Option<SelectionEntry> {
        let index = self.entries.iter().position(|e| e.position == position)?;
        Some(self.entries.remove(index))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_selected(&self, position: GridPosition) -> bool {
        self.entries.iter().any(|e| e.position == position)
    }

    /// Distinct selected dates, ascending. A date selected both in its own
    /// month and as a filler appears once.
    pub fn selected_dates(&self) -> Vec<NaiveDate> {
        self.entries.iter()
            .map(|e| e.date)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Range marker for a cell. Neighbours are only looked for in the same
    /// section.
    pub fn range_position(&self, position: GridPosition) -> SelectionRangePosition {
        if !self.is_selected(position) {
            return SelectionRangePosition::None;
        }
        if self.selected_dates().len() == 1 {
            return SelectionRangePosition::Full;
        }
        let left  = position.left().is_some_and(|p| self.is_selected(p));
        let right = position.right().is_some_and(|p| self.is_selected(p));
        match (left, right) {
            (false, false) => SelectionRangePosition::Full,
            (true,  true)  => SelectionRangePosition::Middle,
            (true,  false) => SelectionRangePosition::Right,
            (false, true)  => SelectionRangePosition::Left,
        }
    }

    /// Rebuilds every entry against a freshly planned layout.
    ///
    /// Each selected date is placed at its in-month cell and, when the grid
    /// shows it twice, at its filler copy too. Dates the new layout cannot
    /// place are dropped.
    pub fn reconcile_after_replan(&mut self, resolver: &DateResolver<'_>) {
        let previous = self.selected_dates();
        let mut entries = Vec::with_capacity(self.entries.len());
        let mut dropped = 0usize;

        for date in previous {
            let Some(position) = resolver.position_of(date) else {
                dropped += 1;
                continue;
            };
            let counterpart = resolver.counterpart_of(date, position, DateOwner::ThisMonth);
            for candidate in std::iter::once(position).chain(counterpart) {
                let resolves = resolver.date_at(candidate).is_some_and(|(found, _)| found == date);
                if resolves && !entries.iter().any(|e: &SelectionEntry| e.position == candidate) {
                    entries.push(SelectionEntry { date, position: candidate });
                }
            }
        }

        tracing::debug!(
            "reconciled selection to generation {}: {} cells kept, {} dates dropped",
            resolver.generation().value(), entries.len(), dropped
        );
        self.entries    = entries;
        self.generation = resolver.generation();
    }
}
