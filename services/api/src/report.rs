use crate::cli::{GapsArgs, OccupancyArgs, RosterArgs, RosterExportArgs, TimelineArgs};
use crate::infra::load_roster;
use chrono::{Local, NaiveDate};
use cohort_planner::config::{AppConfig, PlannerConfig};
use cohort_planner::error::AppError;
use cohort_planner::import::write_roster;
use cohort_planner::planner::views::{GapReportView, OccupancyView, TimelineView};
use cohort_planner::planner::{CohortPlanner, Person};
use std::fmt::Write as _;
use std::fs::File;
use std::io::Write as _;

struct PlanningInputs {
    planner: PlannerConfig,
    people: Vec<Person>,
    today: NaiveDate,
}

/// Environment configuration with the command-line roster options applied.
fn planning_inputs(args: RosterArgs) -> Result<PlanningInputs, AppError> {
    let mut planner = AppConfig::load()?.planner;
    if let Some(schema) = args.cohorts {
        planner.schema = schema;
    }

    let import = load_roster(&args.roster)?;
    Ok(PlanningInputs {
        planner,
        people: import.people,
        today: args.today.unwrap_or_else(|| Local::now().date_naive()),
    })
}

pub(crate) fn run_timeline(args: TimelineArgs) -> Result<(), AppError> {
    let TimelineArgs {
        roster,
        sort_by,
        filter_year,
    } = args;
    let inputs = planning_inputs(roster)?;
    let sort_by = sort_by.unwrap_or(inputs.planner.sort_by);
    let filter_year = filter_year.unwrap_or(inputs.planner.filter_year);

    let planner = CohortPlanner::new(inputs.planner);
    let views: Vec<TimelineView> = planner
        .arranged(&inputs.people, inputs.today, sort_by, filter_year)
        .iter()
        .map(|entry| TimelineView::build(entry, planner.schema()))
        .collect();

    println!("Roster timelines (evaluated {})", inputs.today);
    println!("Cohorts: {}", planner.schema());
    println!(
        "Showing {} of {} people | sorted by {} | year filter {}",
        views.len(),
        inputs.people.len(),
        sort_by.label(),
        filter_year
    );
    print!("{}", render_timelines(&views));
    Ok(())
}

pub(crate) fn run_occupancy(args: OccupancyArgs) -> Result<(), AppError> {
    let OccupancyArgs {
        roster,
        start_year,
        end_year,
        capacity,
    } = args;
    let mut inputs = planning_inputs(roster)?;
    if let Some(start_year) = start_year {
        inputs.planner.start_year = start_year;
    }
    if let Some(end_year) = end_year {
        inputs.planner.end_year = end_year;
    }
    if let Some(capacity) = capacity {
        inputs.planner.capacity = capacity;
    }
    inputs.planner.validate()?;

    let planner = CohortPlanner::new(inputs.planner);
    let occupancy = planner.occupancy(&inputs.people, inputs.today);
    let view = OccupancyView::build(&occupancy, planner.schema(), planner.config().capacity);

    println!(
        "Yearly occupancy {}-{} ({} people, capacity {})",
        planner.config().start_year,
        planner.config().end_year,
        inputs.people.len(),
        view.capacity
    );
    print!("{}", render_occupancy(&view));
    Ok(())
}

pub(crate) fn run_gaps(args: GapsArgs) -> Result<(), AppError> {
    let GapsArgs {
        roster,
        target_year,
        capacity,
        window,
        needed,
    } = args;
    let mut inputs = planning_inputs(roster)?;
    if let Some(capacity) = capacity {
        inputs.planner.capacity = capacity;
    }
    if let Some(window) = window {
        inputs.planner.gap_window = window;
    }
    inputs.planner.validate()?;

    let planner = CohortPlanner::new(inputs.planner);
    let report = planner.gap_report(&inputs.people, inputs.today, target_year, needed);
    print!("{}", render_gaps(&GapReportView::build(&report)));
    Ok(())
}

pub(crate) fn run_roster_export(args: RosterExportArgs) -> Result<(), AppError> {
    let import = load_roster(&args.roster)?;

    match args.output {
        Some(path) => {
            let file = File::create(&path)?;
            write_roster(&import.people, file)?.flush()?;
            eprintln!(
                "Exported {} people to {}",
                import.people.len(),
                path.display()
            );
        }
        None => {
            write_roster(&import.people, std::io::stdout().lock())?.flush()?;
        }
    }

    Ok(())
}

pub(crate) fn render_timelines(views: &[TimelineView]) -> String {
    let mut out = String::new();
    if views.is_empty() {
        let _ = writeln!(out, "No people match the current filter.");
        return out;
    }

    for view in views {
        let status = match &view.current_cohort {
            Some(cohort) => cohort.clone(),
            None if view.current_age_years < 0 => "not yet born".to_string(),
            None => "outside the program".to_string(),
        };
        let _ = writeln!(
            out,
            "- {} (born {}, age {}, {})",
            view.name, view.birth_date, view.current_age_years, status
        );

        let steps: Vec<String> = view
            .transitions
            .iter()
            .map(|transition| format!("{} {}", transition.cohort_name, transition.date))
            .collect();
        let _ = writeln!(out, "    {} | exit {}", steps.join(" | "), view.exit_date);
    }

    out
}

pub(crate) fn render_occupancy(view: &OccupancyView) -> String {
    let mut out = String::new();
    let names: Vec<&str> = view
        .years
        .first()
        .map(|year| year.cohorts.iter().map(|cohort| cohort.name.as_str()).collect())
        .unwrap_or_default();
    let widths: Vec<usize> = names.iter().map(|name| name.len().max(4)).collect();

    let _ = write!(out, "{:<6}{:>6}", "Year", "Total");
    for (name, width) in names.iter().zip(&widths) {
        let _ = write!(out, "  {:>width$}", name, width = *width);
    }
    let _ = writeln!(out);

    for year in &view.years {
        let _ = write!(out, "{:<6}{:>6}", year.year, year.total);
        for (cohort, width) in year.cohorts.iter().zip(&widths) {
            let _ = write!(out, "  {:>width$}", cohort.count, width = *width);
        }
        if year.over_capacity {
            let _ = write!(out, "  over capacity");
        }
        let _ = writeln!(out);
    }

    if let Some(peak_year) = view.peak_year {
        let _ = writeln!(out, "\nPeak: {} in {}", view.peak_total, peak_year);
    }
    if view.over_capacity_years.is_empty() {
        let _ = writeln!(out, "Over capacity: none");
    } else {
        let years: Vec<String> = view
            .over_capacity_years
            .iter()
            .map(ToString::to_string)
            .collect();
        let _ = writeln!(out, "Over capacity: {}", years.join(", "));
    }

    out
}

pub(crate) fn render_gaps(view: &GapReportView) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Intake gaps around {} (capacity {}, +/-{} years, {} needed)",
        view.target_year, view.capacity, view.window_years, view.needed
    );
    let _ = writeln!(
        out,
        "Target year {}: {} enrolled, {} slots available, entry birth year {}",
        view.target_year, view.target_total, view.target_available, view.target_birth_year
    );

    if view.suggestions.is_empty() {
        let _ = writeln!(out, "No years below capacity in the search window.");
        return out;
    }

    let _ = writeln!(out, "\nSuggested intake");
    for gap in &view.suggestions {
        let marker = if gap.is_target { " (target)" } else { "" };
        let _ = writeln!(
            out,
            "- {}{}: {} slots | born {} to {} | {}",
            gap.year,
            marker,
            gap.available_slots,
            gap.birth_range_start,
            gap.birth_range_end,
            gap.fit_label
        );
    }

    out
}
