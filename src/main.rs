use anyhow::{Context, Result};
use datagrid::{DateOwner, DayOfWeek, GridCoordinator, GridPosition, GridSettings};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> Result<()> {
    // Logging to stderr so it doesn't interfere with the printed grid
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    // ── datagrid [PATH] ───────────────────────────────────────────────────────
    let settings = match std::env::args().nth(1) {
        Some(path) => GridSettings::from_path(&path)
            .with_context(|| format!("reading grid settings from {path}"))?,
        None => GridSettings::load().with_context(|| {
            format!(
                "reading {}\n\
                 Pass a settings file or create one with start_date and end_date.",
                datagrid::config::config_dir().join("grid.toml").display()
            )
        })?,
    };

    let config = settings.into_boundary_config()?;
    let grid   = GridCoordinator::new(config)?;
    print!("{}", render(&grid));
    Ok(())
}

// ─── Text dump ────────────────────────────────────────────────────────────────

fn render(grid: &GridCoordinator) -> String {
    let first  = grid.layout().config().first_day_of_week() as usize;
    let header = (0..7)
        .map(|i| format!("{:>4}", DayOfWeek::ALL[(first + i) % 7].short_name()))
        .collect::<String>();

    let mut out = String::new();
    for month in grid.layout().months() {
        out.push_str(&format!("\n{}\n{header}\n", month.first_day.format("%B %Y")));
        for local in 0..month.sections.len() {
            let section = month.first_section + local;
            for item in 0..grid.items_in_section(section) {
                out.push_str(&cell(grid, GridPosition::new(section, item)));
            }
            out.push('\n');
        }
    }
    out
}

fn cell(grid: &GridCoordinator, position: GridPosition) -> String {
    match grid.cell_state(position) {
        Some(state) => match state.owner {
            DateOwner::ThisMonth => format!("{:>4}", state.text),
            owner if owner.is_within_boundary() => format!("{:>4}", format!("({})", state.text)),
            _ => format!("{:>4}", "·"),
        },
        None => "    ".to_owned(),
    }
}
