use chrono::NaiveDate;

use crate::config::{BoundaryConfig, ConfigError, DayOfWeek};
use crate::layout::{plan, Generation, MonthLayout};
use crate::resolver::{DateOwner, DateResolver, GridPosition, SectionDates};
use crate::selection::{SelectionRangePosition, SelectionTracker};

// ─── Renderer seam ────────────────────────────────────────────────────────────

/// Receives refresh requests from the grid. Implemented by whatever draws it.
pub trait RefreshListener {
    /// The whole layout was replaced; every cell must be redrawn.
    fn layout_regenerated(&mut self, layout: &MonthLayout);

    /// These cells changed selection state or range marker.
    fn cells_changed(&mut self, positions: &[GridPosition]);
}

// ─── Cell state ───────────────────────────────────────────────────────────────

/// Snapshot of everything needed to draw one cell, computed when requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellState {
    pub position:       GridPosition,
    pub date:           NaiveDate,
    pub owner:          DateOwner,
    /// Day of the month as text.
    pub text:           String,
    /// Weekday of `date`.
    pub day:            DayOfWeek,
    /// Week row within the owning month.
    pub row:            usize,
    pub column:         usize,
    pub is_selected:    bool,
    pub range_position: SelectionRangePosition,
    pub section_dates:  Option<SectionDates>,
}

// ─── Coordinator ──────────────────────────────────────────────────────────────

/// Owns the current layout and selection and keeps them in step across
/// reconfiguration.
///
/// Not thread-safe by itself: a multi-threaded host must serialise all
/// mutation behind a single writer.
pub struct GridCoordinator {
    config:                BoundaryConfig,
    layout:                MonthLayout,
    selection:             SelectionTracker,
    layout_needs_updating: bool,
    listener:              Option<Box<dyn RefreshListener>>,
}

impl GridCoordinator {
    pub fn new(config: BoundaryConfig) -> Result<Self, ConfigError> {
        let layout    = plan(&config, Generation::default())?;
        let selection = SelectionTracker::new(layout.generation());
        tracing::info!(
            "grid ready: {} months, {} sections",
            layout.number_of_months(), layout.number_of_sections()
        );
        Ok(Self { config, layout, selection, layout_needs_updating: false, listener: None })
    }

    pub fn set_listener(&mut self, listener: Box<dyn RefreshListener>) {
        self.listener = Some(listener);
    }

    pub fn config(&self)    -> &BoundaryConfig { &self.config }
    pub fn layout(&self)    -> &MonthLayout { &self.layout }
    pub fn selection(&self) -> &SelectionTracker { &self.selection }
    pub fn resolver(&self)  -> DateResolver<'_> { DateResolver::new(&self.layout) }

    pub fn layout_needs_updating(&self) -> bool { self.layout_needs_updating }

    // ── Reconfiguration ───────────────────────────────────────────────────────

    /// Caches `config` and marks the layout dirty if it changes anything the
    /// grid depends on. Returns whether it did.
    pub fn reconfigure(&mut self, config: BoundaryConfig) -> bool {
        let differs = config.layout_differs(&self.config);
        if differs {
            tracing::info!("layout invalidated by new configuration: {config:?}");
            self.layout_needs_updating = true;
        }
        self.config = config;
        differs
    }

    pub fn set_first_day_of_week(&mut self, day: DayOfWeek) -> bool {
        let config = self.config.clone().with_first_day_of_week(day);
        self.reconfigure(config)
    }

    /// Re-plans a dirty layout and reconciles the selection against it.
    ///
    /// Both are replaced together or not at all: on error the previous
    /// layout and selection stay in place and the layout stays dirty.
    /// Returns true if a new layout was produced.
    pub fn regenerate(&mut self) -> Result<bool, ConfigError> {
        if !self.layout_needs_updating {
            return Ok(false);
        }
        let layout = plan(&self.config, self.layout.generation().next())?;
        let mut selection = self.selection.clone();
        selection.reconcile_after_replan(&DateResolver::new(&layout));

        self.layout    = layout;
        self.selection = selection;
        self.layout_needs_updating = false;

        if let Some(listener) = self.listener.as_mut() {
            listener.layout_regenerated(&self.layout);
        }
        Ok(true)
    }

    // ── Resolution ────────────────────────────────────────────────────────────

    pub fn date_at(&self, position: GridPosition) -> Option<(NaiveDate, DateOwner)> {
        self.resolver().date_at(position)
    }

    pub fn positions_of(&self, dates: &[NaiveDate]) -> Vec<GridPosition> {
        self.resolver().positions_of(dates)
    }

    pub fn counterpart_of(
        &self,
        date: NaiveDate,
        position: GridPosition,
        owner: DateOwner,
    ) -> Option<GridPosition> {
        self.resolver().counterpart_of(date, position, owner)
    }

    pub fn date_range_for_section(&self, section: usize) -> Option<SectionDates> {
        self.resolver().date_range_for_section(section)
    }

    pub fn number_of_sections(&self) -> usize {
        self.layout.number_of_sections()
    }

    pub fn items_in_section(&self, section: usize) -> usize {
        self.layout.items_in_section(section)
    }

    // ── Selection ─────────────────────────────────────────────────────────────

    pub fn select(&mut self, position: GridPosition, date: NaiveDate) -> bool {
        self.selection.select(position, date)
    }

    pub fn deselect(&mut self, position: GridPosition) -> bool {
        self.selection.deselect(position).is_some()
    }

    pub fn range_position(&self, position: GridPosition) -> SelectionRangePosition {
        self.selection.range_position(position)
    }

    pub fn selected_dates(&self) -> Vec<NaiveDate> {
        self.selection.selected_dates()
    }

    /// Selects the cell at `position` and its counterpart, if any.
    ///
    /// Returns every cell whose drawing may have changed, including the
    /// same-row neighbours whose range marker depends on it.
    pub fn select_date_at(&mut self, position: GridPosition) -> Vec<GridPosition> {
        let Some((date, owner)) = self.date_at(position) else { return Vec::new() };
        let counterpart = self.counterpart_of(date, position, owner);

        let mut touched = Vec::new();
        for cell in std::iter::once(position).chain(counterpart) {
            if self.selection.select(cell, date) {
                touched.push(cell);
            }
        }
        self.notify_cells(touched)
    }

    /// Deselects the cell at `position` and its counterpart, if any.
    pub fn deselect_date_at(&mut self, position: GridPosition) -> Vec<GridPosition> {
        let counterpart = self.date_at(position)
            .and_then(|(date, owner)| self.counterpart_of(date, position, owner));

        let mut touched = Vec::new();
        for cell in std::iter::once(position).chain(counterpart) {
            if self.selection.deselect(cell).is_some() {
                touched.push(cell);
            }
        }
        self.notify_cells(touched)
    }

    fn notify_cells(&mut self, touched: Vec<GridPosition>) -> Vec<GridPosition> {
        if touched.is_empty() {
            return touched;
        }
        let mut cells = touched.clone();
        for cell in &touched {
            for neighbour in [cell.left(), cell.right()].into_iter().flatten() {
                if self.selection.is_selected(neighbour) && !cells.contains(&neighbour) {
                    cells.push(neighbour);
                }
            }
        }
        if let Some(listener) = self.listener.as_mut() {
            listener.cells_changed(&cells);
        }
        cells
    }

    // ── Cell state ────────────────────────────────────────────────────────────

    pub fn cell_state(&self, position: GridPosition) -> Option<CellState> {
        let resolver      = self.resolver();
        let (date, owner) = resolver.date_at(position)?;
        let month         = self.layout.month_for_section(position.section)?;
        let calendar      = self.layout.config().calendar();

        Some(CellState {
            position, date, owner,
            text:           calendar.day_of_month(date).to_string(),
            day:            DayOfWeek::from_weekday_index(calendar.weekday_index(date)),
            row:            position.section - month.first_section,
            column:         position.item,
            is_selected:    self.selection.is_selected(position),
            range_position: self.selection.range_position(position),
            section_dates:  resolver.date_range_for_section(position.section),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::gregorian;
    use crate::config::TrailingFillerPolicy;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn p(section: usize, item: usize) -> GridPosition {
        GridPosition::new(section, item)
    }

    fn q1() -> BoundaryConfig {
        BoundaryConfig::new(d(2024, 1, 1), d(2024, 3, 31), gregorian()).unwrap()
    }

    #[derive(Default)]
    struct Recorder {
        regenerated: usize,
        changed:     Vec<GridPosition>,
    }

    struct Shared(Rc<RefCell<Recorder>>);

    impl RefreshListener for Shared {
        fn layout_regenerated(&mut self, _layout: &MonthLayout) {
            self.0.borrow_mut().regenerated += 1;
        }
        fn cells_changed(&mut self, positions: &[GridPosition]) {
            self.0.borrow_mut().changed.extend_from_slice(positions);
        }
    }

    #[test]
    fn selecting_a_filler_selects_its_primary() {
        let mut grid = GridCoordinator::new(q1()).unwrap();
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        grid.set_listener(Box::new(Shared(recorder.clone())));

        // (4, 5) is Feb 2 rendered at the end of January.
        let touched = grid.select_date_at(p(4, 5));
        assert_eq!(touched, vec![p(4, 5), p(5, 5)]);
        assert_eq!(grid.selected_dates(), vec![d(2024, 2, 2)]);
        assert_eq!(recorder.borrow().changed, vec![p(4, 5), p(5, 5)]);

        let touched = grid.deselect_date_at(p(5, 5));
        assert_eq!(touched, vec![p(5, 5), p(4, 5)]);
        assert!(grid.selected_dates().is_empty());
    }

    #[test]
    fn neighbours_are_reported_for_range_redraw() {
        let mut grid = GridCoordinator::new(q1()).unwrap();
        grid.select_date_at(p(1, 2));
        let touched = grid.select_date_at(p(1, 3));
        assert_eq!(touched, vec![p(1, 3), p(1, 2)]);
        assert_eq!(grid.range_position(p(1, 2)), SelectionRangePosition::Left);
        assert_eq!(grid.range_position(p(1, 3)), SelectionRangePosition::Right);
    }

    #[test]
    fn unchanged_layout_is_not_regenerated() {
        let mut grid = GridCoordinator::new(q1()).unwrap();
        let later = BoundaryConfig::new(d(2024, 1, 15), d(2024, 3, 1), gregorian()).unwrap();
        assert!(!grid.reconfigure(later));
        assert!(!grid.regenerate().unwrap());
        assert_eq!(grid.layout().generation(), Generation::default());
    }

    #[test]
    fn first_day_change_moves_selection() {
        let mut grid = GridCoordinator::new(q1()).unwrap();
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        grid.set_listener(Box::new(Shared(recorder.clone())));

        grid.select_date_at(p(0, 1));
        assert!(grid.set_first_day_of_week(DayOfWeek::Monday));
        assert!(grid.layout_needs_updating());
        // Until regenerated, the old layout still answers.
        assert_eq!(grid.date_at(p(0, 1)), Some((d(2024, 1, 1), DateOwner::ThisMonth)));

        assert!(grid.regenerate().unwrap());
        assert_eq!(recorder.borrow().regenerated, 1);
        assert!(grid.selection().is_current_for(grid.layout()));
        assert_eq!(grid.layout().generation().value(), 1);
        assert_eq!(grid.selection().entries()[0].position, p(0, 0));
        assert_eq!(grid.selected_dates(), vec![d(2024, 1, 1)]);
    }

    #[test]
    fn shrinking_grid_drops_padding_selection() {
        let config = BoundaryConfig::new(d(2024, 1, 1), d(2024, 2, 29), gregorian())
            .unwrap()
            .with_trailing_filler_policy(TrailingFillerPolicy::TillEndOfGrid);
        let mut grid = GridCoordinator::new(config.clone()).unwrap();

        // Feb 2024 padded to six rows ends on Sat Mar 9.
        assert_eq!(grid.date_at(p(11, 6)),
                   Some((d(2024, 3, 9), DateOwner::FollowingMonthOutsideBoundary)));
        grid.select_date_at(p(11, 6));
        grid.select_date_at(p(6, 4));
        assert_eq!(grid.selected_dates(), vec![d(2024, 2, 1), d(2024, 3, 9)]);

        assert!(grid.reconfigure(config.with_rows_per_section(5).unwrap()));
        assert!(grid.regenerate().unwrap());
        assert_eq!(grid.date_at(p(11, 6)), None);
        assert_eq!(grid.selected_dates(), vec![d(2024, 2, 1)]);
    }

    #[test]
    fn trailing_policy_change_re_resolves_selection() {
        let mut grid = GridCoordinator::new(q1()).unwrap();
        grid.select_date_at(p(4, 5));
        assert_eq!(grid.selection().entries().len(), 2);

        // Without trailing fillers January's last row stops at Jan 31.
        let off = q1().with_trailing_filler_policy(TrailingFillerPolicy::Off);
        assert!(grid.reconfigure(off));
        assert!(grid.regenerate().unwrap());
        assert_eq!(grid.items_in_section(4), 4);
        assert_eq!(grid.date_at(p(4, 5)), None);

        let entries = grid.selection().entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].position, p(5, 5));
        assert_eq!(grid.selected_dates(), vec![d(2024, 2, 2)]);
        assert!(grid.selection().is_current_for(grid.layout()));
    }

    #[test]
    fn cell_state_reads_the_planned_calendar() {
        use crate::calendar::fixtures::Relabelled;

        let mut grid = GridCoordinator::new(q1()).unwrap();
        let pending = BoundaryConfig::new(d(2024, 1, 1), d(2024, 3, 31),
                                          Relabelled::shared("shifted", 100)).unwrap();
        assert!(grid.reconfigure(pending));

        // Not regenerated: the cell still comes from the Gregorian layout.
        let state = grid.cell_state(p(1, 1)).unwrap();
        assert_eq!(state.date, d(2024, 1, 8));
        assert_eq!(state.text, "8");
    }

    #[test]
    fn cell_state_is_a_snapshot() {
        let mut grid = GridCoordinator::new(q1()).unwrap();
        grid.select_date_at(p(1, 1));
        let state = grid.cell_state(p(1, 1)).unwrap();
        assert_eq!(state.date, d(2024, 1, 8));
        assert_eq!(state.text, "8");
        assert_eq!(state.day, DayOfWeek::Monday);
        assert_eq!((state.row, state.column), (1, 1));
        assert!(state.is_selected);
        assert_eq!(state.range_position, SelectionRangePosition::Full);

        grid.deselect_date_at(p(1, 1));
        assert!(state.is_selected);
        assert!(!grid.cell_state(p(1, 1)).unwrap().is_selected);

        let march = grid.cell_state(p(12, 0)).unwrap();
        assert_eq!(march.row, 2);
        assert_eq!(march.section_dates.map(|s| s.month), Some(3));
        assert!(grid.cell_state(p(40, 0)).is_none());
    }
}
