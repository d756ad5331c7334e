use crate::infra::{parse_date, parse_schema, parse_sort_key, parse_year_filter};
use crate::report::{run_gaps, run_occupancy, run_roster_export, run_timeline};
use crate::server;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use cohort_planner::error::AppError;
use cohort_planner::planner::{CohortSchema, SortKey, YearFilter};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Cohort Planner",
    about = "Plan age-cohort intake, occupancy and recruitment gaps from a roster",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// List each person's entry, cohort transitions and exit
    Timeline(TimelineArgs),
    /// Tabulate yearly occupancy per cohort over a year range
    Occupancy(OccupancyArgs),
    /// Suggest intake birth years for years below capacity
    Gaps(GapsArgs),
    /// Roster file utilities
    Roster {
        #[command(subcommand)]
        command: RosterCommand,
    },
}

#[derive(Subcommand, Debug)]
enum RosterCommand {
    /// Re-write a roster as clean CSV with a header row
    Export(RosterExportArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

/// Inputs shared by every planning command.
#[derive(Args, Debug)]
pub(crate) struct RosterArgs {
    /// Roster CSV with `Name,YYYY-MM-DD` rows
    #[arg(long)]
    pub(crate) roster: PathBuf,
    /// Evaluation date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Cohort schema override, e.g. "Beavers:6-8,Cubs:8-10.5,Scouts:10.5-14"
    #[arg(long, value_parser = parse_schema)]
    pub(crate) cohorts: Option<CohortSchema>,
}

#[derive(Args, Debug)]
pub(crate) struct TimelineArgs {
    #[command(flatten)]
    pub(crate) roster: RosterArgs,
    /// Sort order: entry_date, name or birth_date
    #[arg(long, value_parser = parse_sort_key)]
    pub(crate) sort_by: Option<SortKey>,
    /// Only people active during this year ("all" disables the filter)
    #[arg(long, value_parser = parse_year_filter)]
    pub(crate) filter_year: Option<YearFilter>,
}

#[derive(Args, Debug)]
pub(crate) struct OccupancyArgs {
    #[command(flatten)]
    pub(crate) roster: RosterArgs,
    /// First year of the table
    #[arg(long)]
    pub(crate) start_year: Option<i32>,
    /// Last year of the table (inclusive)
    #[arg(long)]
    pub(crate) end_year: Option<i32>,
    /// Capacity ceiling used to flag over-capacity years
    #[arg(long)]
    pub(crate) capacity: Option<u32>,
}

#[derive(Args, Debug)]
pub(crate) struct GapsArgs {
    #[command(flatten)]
    pub(crate) roster: RosterArgs,
    /// Year to plan intake around
    #[arg(long)]
    pub(crate) target_year: i32,
    /// Capacity ceiling per year
    #[arg(long)]
    pub(crate) capacity: Option<u32>,
    /// Years searched either side of the target year
    #[arg(long)]
    pub(crate) window: Option<u32>,
    /// Places the intake should fill
    #[arg(long, default_value_t = 1)]
    pub(crate) needed: u32,
}

#[derive(Args, Debug)]
pub(crate) struct RosterExportArgs {
    /// Roster CSV to read
    #[arg(long)]
    pub(crate) roster: PathBuf,
    /// Destination file (defaults to stdout)
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Timeline(args) => run_timeline(args),
        Command::Occupancy(args) => run_occupancy(args),
        Command::Gaps(args) => run_gaps(args),
        Command::Roster {
            command: RosterCommand::Export(args),
        } => run_roster_export(args),
    }
}
