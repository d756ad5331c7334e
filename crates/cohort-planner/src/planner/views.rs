use super::gaps::{GapFit, GapReport, GapSuggestion};
use super::occupancy::YearlyOccupancy;
use super::roster::RosterEntry;
use super::schema::{CohortId, CohortSchema};
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct TransitionView {
    pub cohort: CohortId,
    pub cohort_name: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimelineView {
    pub name: String,
    pub birth_date: NaiveDate,
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub entry_year: i32,
    pub exit_year: i32,
    pub current_age_years: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_cohort: Option<String>,
    pub transitions: Vec<TransitionView>,
}

impl TimelineView {
    pub fn build(entry: &RosterEntry, schema: &CohortSchema) -> Self {
        let timeline = &entry.timeline;
        let cohort_name = |id: CohortId| {
            schema
                .cohort(id)
                .map(|cohort| cohort.name.clone())
                .unwrap_or_default()
        };

        Self {
            name: entry.person.name.clone(),
            birth_date: entry.person.birth_date,
            entry_date: timeline.entry_date,
            exit_date: timeline.exit_date,
            entry_year: timeline.entry_year(),
            exit_year: timeline.exit_year(),
            current_age_years: timeline.current_age_years,
            current_cohort: timeline.current_cohort.map(cohort_name),
            transitions: timeline
                .transitions
                .iter()
                .map(|transition| TransitionView {
                    cohort: transition.cohort,
                    cohort_name: cohort_name(transition.cohort),
                    date: transition.date,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CohortCountView {
    pub cohort: CohortId,
    pub name: String,
    pub count: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct OccupancyYearView {
    pub year: i32,
    pub total: u32,
    pub over_capacity: bool,
    pub cohorts: Vec<CohortCountView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OccupancyView {
    pub capacity: u32,
    pub years: Vec<OccupancyYearView>,
    pub over_capacity_years: Vec<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peak_year: Option<i32>,
    pub peak_total: u32,
}

impl OccupancyView {
    pub fn build(occupancy: &YearlyOccupancy, schema: &CohortSchema, capacity: u32) -> Self {
        let years = occupancy
            .iter()
            .map(|(year, entry)| OccupancyYearView {
                year,
                total: entry.total,
                over_capacity: entry.total > capacity,
                cohorts: schema
                    .ids()
                    .zip(schema.cohorts())
                    .map(|(id, cohort)| CohortCountView {
                        cohort: id,
                        name: cohort.name.clone(),
                        count: entry.cohort(id),
                    })
                    .collect(),
            })
            .collect();
        let peak = occupancy.peak();

        Self {
            capacity,
            years,
            over_capacity_years: occupancy.over_capacity_years(capacity),
            peak_year: peak.map(|(year, _)| year),
            peak_total: peak.map_or(0, |(_, total)| total),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GapSuggestionView {
    pub year: i32,
    pub birth_year: i32,
    pub available_slots: i64,
    pub birth_range_start: NaiveDate,
    pub birth_range_end: NaiveDate,
    pub fit: GapFit,
    pub fit_label: &'static str,
    pub is_target: bool,
}

impl GapSuggestionView {
    fn build(suggestion: &GapSuggestion, needed: u32, target_year: i32) -> Self {
        let fit = suggestion.fit(needed);
        Self {
            year: suggestion.year,
            birth_year: suggestion.birth_year,
            available_slots: suggestion.available_slots,
            birth_range_start: suggestion.birth_range_start,
            birth_range_end: suggestion.birth_range_end,
            fit,
            fit_label: fit.label(),
            is_target: suggestion.year == target_year,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GapReportView {
    pub target_year: i32,
    pub capacity: u32,
    pub window_years: u32,
    pub target_total: u32,
    pub target_available: i64,
    pub target_birth_year: i32,
    pub needed: u32,
    pub suggestions: Vec<GapSuggestionView>,
}

impl GapReportView {
    pub fn build(report: &GapReport) -> Self {
        Self {
            target_year: report.query.target_year,
            capacity: report.query.capacity,
            window_years: report.query.window_years,
            target_total: report.target_total,
            target_available: report.target_available(),
            target_birth_year: report.target_birth_year,
            needed: report.needed,
            suggestions: report
                .suggestions
                .iter()
                .map(|suggestion| {
                    GapSuggestionView::build(suggestion, report.needed, report.query.target_year)
                })
                .collect(),
        }
    }
}
