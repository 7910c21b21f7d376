//! Layout and indexing engine for a virtualised month grid.
//!
//! A date range is planned into week rows grouped by month ([`layout`]),
//! cells are mapped to dates and back ([`resolver`]), and selection state is
//! kept consistent across re-planning ([`selection`], [`grid`]).

pub mod calendar;
pub mod config;
pub mod grid;
pub mod layout;
pub mod resolver;
pub mod selection;

pub use calendar::{CalendarAuthority, GregorianCalendar, SharedCalendar};
pub use config::{BoundaryConfig, ConfigError, DayOfWeek, GridSettings, TrailingFillerPolicy};
pub use grid::{CellState, GridCoordinator, RefreshListener};
pub use layout::{plan, Generation, MonthDescriptor, MonthLayout, DAYS_IN_WEEK};
pub use resolver::{DateOwner, DateResolver, GridPosition, SectionDates};
pub use selection::{SelectionEntry, SelectionRangePosition, SelectionTracker};
