use super::calendar::{age_on, date_at_age};
use super::schema::{CohortId, CohortSchema};
use chrono::{Datelike, NaiveDate};

/// The date a person starts a given cohort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CohortTransition {
    pub cohort: CohortId,
    pub date: NaiveDate,
}

/// Derived view of one birth date against a cohort schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonTimeline {
    pub birth_date: NaiveDate,
    pub entry_date: NaiveDate,
    /// Date the last cohort's maximum age is reached; closes the transitions.
    pub exit_date: NaiveDate,
    pub transitions: Vec<CohortTransition>,
    /// Completed years as of the evaluation date; negative if not yet born.
    pub current_age_years: i32,
    pub current_cohort: Option<CohortId>,
}

impl PersonTimeline {
    pub fn entry_year(&self) -> i32 {
        self.entry_date.year()
    }

    pub fn exit_year(&self) -> i32 {
        self.exit_date.year()
    }

    pub fn transition(&self, cohort: CohortId) -> Option<NaiveDate> {
        self.transitions
            .iter()
            .find(|transition| transition.cohort == cohort)
            .map(|transition| transition.date)
    }

    /// Inclusive overlap between `[entry_date, exit_date]` and `[start, end]`.
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.entry_date <= end && self.exit_date >= start
    }

    /// Whether the calendar year falls inside the entry/exit years.
    pub fn spans_year(&self, year: i32) -> bool {
        self.entry_year() <= year && year <= self.exit_year()
    }
}

pub fn compute_timeline(
    birth_date: NaiveDate,
    schema: &CohortSchema,
    now: NaiveDate,
) -> PersonTimeline {
    let transitions: Vec<CohortTransition> = schema
        .ids()
        .zip(schema.cohorts())
        .map(|(cohort, definition)| CohortTransition {
            cohort,
            date: date_at_age(birth_date, definition.min_age),
        })
        .collect();

    let entry_date = date_at_age(birth_date, schema.min_age());
    let exit_date = date_at_age(birth_date, schema.max_age());
    let current_age_years = age_on(birth_date, now);

    PersonTimeline {
        birth_date,
        entry_date,
        exit_date,
        transitions,
        current_age_years,
        current_cohort: schema.cohort_for_age(current_age_years),
    }
}
