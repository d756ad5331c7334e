use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::gaps::{GapQuery, GapReport, MAX_GAP_WINDOW};
use super::occupancy::{compute_occupancy, year_span, MAX_YEAR_SPAN};
use super::roster::{arrange, build_entries, Person, SortKey, YearFilter};
use super::schema::CohortSchema;
use super::views::{GapReportView, OccupancyView, TimelineView};
use crate::config::PlannerConfig;
use crate::error::AppError;
use crate::import::{parse_birth_date, roster_to_csv, RosterImporter, RosterRowError};

/// Router builder exposing the planning operations as JSON endpoints. The
/// configuration supplies defaults that each request may override.
pub fn planner_router(defaults: Arc<PlannerConfig>) -> Router {
    Router::new()
        .route("/api/v1/planner/timelines", post(timelines_handler))
        .route("/api/v1/planner/occupancy", post(occupancy_handler))
        .route("/api/v1/planner/gaps", post(gaps_handler))
        .route("/api/v1/roster/import", post(import_handler))
        .route("/api/v1/roster/export", post(export_handler))
        .with_state(defaults)
}

/// A roster supplied either as JSON people, CSV text, or both (CSV rows are
/// appended after the JSON entries).
#[derive(Debug, Default, Deserialize)]
pub struct RosterPayload {
    #[serde(default)]
    pub people: Vec<Person>,
    #[serde(default)]
    pub roster_csv: Option<String>,
}

struct ResolvedRoster {
    people: Vec<Person>,
    rejected_rows: Vec<RosterRowError>,
}

impl RosterPayload {
    fn resolve(self) -> Result<ResolvedRoster, AppError> {
        if let Some(index) = self.people.iter().position(|p| p.name.trim().is_empty()) {
            return Err(AppError::InvalidRequest(format!(
                "people[{index}] has an empty name"
            )));
        }

        let mut people = self.people;
        let mut rejected_rows = Vec::new();

        if let Some(csv) = self.roster_csv {
            let import = RosterImporter::from_text(&csv)?.require_people()?;
            people.extend(import.people);
            rejected_rows = import.errors;
        }

        Ok(ResolvedRoster {
            people,
            rejected_rows,
        })
    }
}

/// Request-level overrides of the configured planner settings.
#[derive(Debug, Default, Deserialize)]
pub struct PlannerOverrides {
    #[serde(default)]
    pub today: Option<String>,
    #[serde(default)]
    pub cohorts: Option<CohortSchema>,
}

impl PlannerOverrides {
    fn today(&self) -> Result<NaiveDate, AppError> {
        match self.today.as_deref() {
            Some(raw) => {
                parse_birth_date(raw).map_err(|err| AppError::InvalidRequest(err.to_string()))
            }
            None => Ok(Local::now().date_naive()),
        }
    }

    fn schema(&self, defaults: &PlannerConfig) -> CohortSchema {
        self.cohorts
            .clone()
            .unwrap_or_else(|| defaults.schema.clone())
    }
}

#[derive(Debug, Deserialize)]
pub struct TimelinesRequest {
    #[serde(flatten)]
    pub roster: RosterPayload,
    #[serde(flatten)]
    pub overrides: PlannerOverrides,
    #[serde(default)]
    pub sort_by: Option<SortKey>,
    #[serde(default)]
    pub filter_year: Option<YearFilter>,
}

#[derive(Debug, Serialize)]
pub struct TimelinesResponse {
    pub today: NaiveDate,
    pub sort_by: SortKey,
    pub filter_year: YearFilter,
    pub count: usize,
    pub timelines: Vec<TimelineView>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rejected_rows: Vec<RosterRowError>,
}

pub(crate) async fn timelines_handler(
    State(defaults): State<Arc<PlannerConfig>>,
    Json(request): Json<TimelinesRequest>,
) -> Result<Json<TimelinesResponse>, AppError> {
    let today = request.overrides.today()?;
    let schema = request.overrides.schema(&defaults);
    let sort_by = request.sort_by.unwrap_or(defaults.sort_by);
    let filter_year = request.filter_year.unwrap_or(defaults.filter_year);
    let roster = request.roster.resolve()?;

    let entries = arrange(
        build_entries(&roster.people, &schema, today),
        sort_by,
        filter_year,
    );
    debug!(people = roster.people.len(), shown = entries.len(), "timelines computed");

    let timelines: Vec<TimelineView> = entries
        .iter()
        .map(|entry| TimelineView::build(entry, &schema))
        .collect();

    Ok(Json(TimelinesResponse {
        today,
        sort_by,
        filter_year,
        count: timelines.len(),
        timelines,
        rejected_rows: roster.rejected_rows,
    }))
}

#[derive(Debug, Deserialize)]
pub struct OccupancyRequest {
    #[serde(flatten)]
    pub roster: RosterPayload,
    #[serde(flatten)]
    pub overrides: PlannerOverrides,
    #[serde(default)]
    pub start_year: Option<i32>,
    #[serde(default)]
    pub end_year: Option<i32>,
    #[serde(default)]
    pub capacity: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct OccupancyResponse {
    pub start_year: i32,
    pub end_year: i32,
    #[serde(flatten)]
    pub occupancy: OccupancyView,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rejected_rows: Vec<RosterRowError>,
}

pub(crate) async fn occupancy_handler(
    State(defaults): State<Arc<PlannerConfig>>,
    Json(request): Json<OccupancyRequest>,
) -> Result<Json<OccupancyResponse>, AppError> {
    let today = request.overrides.today()?;
    let schema = request.overrides.schema(&defaults);
    let start_year = request.start_year.unwrap_or(defaults.start_year);
    let end_year = request.end_year.unwrap_or(defaults.end_year);
    let capacity = request.capacity.unwrap_or(defaults.capacity);

    if start_year > end_year {
        return Err(AppError::InvalidRequest(format!(
            "start_year {start_year} is after end_year {end_year}"
        )));
    }
    if year_span(start_year, end_year) > u64::from(MAX_YEAR_SPAN) {
        return Err(AppError::InvalidRequest(format!(
            "start_year {start_year} to end_year {end_year} spans more than {MAX_YEAR_SPAN} years"
        )));
    }

    let roster = request.roster.resolve()?;
    let occupancy = compute_occupancy(&roster.people, &schema, start_year, end_year, today);

    Ok(Json(OccupancyResponse {
        start_year,
        end_year,
        occupancy: OccupancyView::build(&occupancy, &schema, capacity),
        rejected_rows: roster.rejected_rows,
    }))
}

#[derive(Debug, Deserialize)]
pub struct GapsRequest {
    #[serde(flatten)]
    pub roster: RosterPayload,
    #[serde(flatten)]
    pub overrides: PlannerOverrides,
    pub target_year: i32,
    #[serde(default)]
    pub capacity: Option<u32>,
    #[serde(default)]
    pub window_years: Option<u32>,
    #[serde(default)]
    pub needed: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct GapsResponse {
    #[serde(flatten)]
    pub report: GapReportView,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rejected_rows: Vec<RosterRowError>,
}

pub(crate) async fn gaps_handler(
    State(defaults): State<Arc<PlannerConfig>>,
    Json(request): Json<GapsRequest>,
) -> Result<Json<GapsResponse>, AppError> {
    let today = request.overrides.today()?;
    let schema = request.overrides.schema(&defaults);
    let query = GapQuery::new(
        request.target_year,
        request.capacity.unwrap_or(defaults.capacity),
    )
    .with_window(request.window_years.unwrap_or(defaults.gap_window));
    if query.window_years > MAX_GAP_WINDOW {
        return Err(AppError::InvalidRequest(format!(
            "window_years {} exceeds {MAX_GAP_WINDOW}",
            query.window_years
        )));
    }

    let window = i32::try_from(query.window_years).unwrap_or(i32::MAX);
    let start_year = query.target_year.saturating_sub(window);
    let end_year = query.target_year.saturating_add(window);

    let roster = request.roster.resolve()?;
    let occupancy = compute_occupancy(&roster.people, &schema, start_year, end_year, today);
    let report = GapReport::build(&occupancy, &schema, query, request.needed.unwrap_or(1));

    Ok(Json(GapsResponse {
        report: GapReportView::build(&report),
        rejected_rows: roster.rejected_rows,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub roster_csv: String,
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub accepted: usize,
    pub people: Vec<Person>,
    pub rejected_rows: Vec<RosterRowError>,
}

pub(crate) async fn import_handler(
    Json(request): Json<ImportRequest>,
) -> Result<Json<ImportResponse>, AppError> {
    let import = RosterImporter::from_text(&request.roster_csv)?.require_people()?;

    Ok(Json(ImportResponse {
        accepted: import.people.len(),
        people: import.people,
        rejected_rows: import.errors,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    pub people: Vec<Person>,
}

pub(crate) async fn export_handler(
    Json(request): Json<ExportRequest>,
) -> Result<Response, AppError> {
    let csv = roster_to_csv(&request.people)?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
        csv,
    )
        .into_response())
}
