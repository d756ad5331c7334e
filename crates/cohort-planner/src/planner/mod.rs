//! Age-cohort planning: per-person timelines, yearly occupancy and intake gap
//! search over a fixed cohort schema.
//!
//! Everything here is a pure function of its inputs. The evaluation date is
//! always passed in, never read from the system clock.

pub mod calendar;
pub mod gaps;
pub mod occupancy;
pub mod roster;
pub mod router;
pub mod schema;
pub mod timeline;
pub mod views;

pub use gaps::{find_gaps, GapFit, GapQuery, GapReport, GapSuggestion, MAX_GAP_WINDOW};
pub use occupancy::{
    compute_occupancy, year_span, YearOccupancy, YearlyOccupancy, MAX_YEAR_SPAN,
};
pub use roster::{arrange, build_entries, Person, RosterEntry, SortKey, YearFilter};
pub use router::planner_router;
pub use schema::{AgeBoundary, Cohort, CohortId, CohortSchema, SchemaError};
pub use timeline::{compute_timeline, CohortTransition, PersonTimeline};

use crate::config::PlannerConfig;
use chrono::NaiveDate;

/// Runs the planning operations with one fixed configuration.
#[derive(Debug, Clone)]
pub struct CohortPlanner {
    config: PlannerConfig,
}

impl CohortPlanner {
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn schema(&self) -> &CohortSchema {
        &self.config.schema
    }

    /// Timelines in the configured presentation order.
    pub fn timelines(&self, people: &[Person], now: NaiveDate) -> Vec<RosterEntry> {
        self.arranged(people, now, self.config.sort_by, self.config.filter_year)
    }

    pub fn arranged(
        &self,
        people: &[Person],
        now: NaiveDate,
        sort_by: SortKey,
        filter: YearFilter,
    ) -> Vec<RosterEntry> {
        arrange(build_entries(people, self.schema(), now), sort_by, filter)
    }

    /// Occupancy over the configured year window.
    pub fn occupancy(&self, people: &[Person], now: NaiveDate) -> YearlyOccupancy {
        compute_occupancy(
            people,
            self.schema(),
            self.config.start_year,
            self.config.end_year,
            now,
        )
    }

    /// Gap search around `target_year` using the configured capacity and
    /// window. Occupancy is computed over the search window only.
    pub fn gap_report(
        &self,
        people: &[Person],
        now: NaiveDate,
        target_year: i32,
        needed: u32,
    ) -> GapReport {
        let query = GapQuery::new(target_year, self.config.capacity)
            .with_window(self.config.gap_window);
        let window = i32::try_from(query.window_years).unwrap_or(i32::MAX);
        let start_year = target_year.saturating_sub(window);
        let end_year = target_year.saturating_add(window);

        let occupancy = compute_occupancy(people, self.schema(), start_year, end_year, now);
        GapReport::build(&occupancy, self.schema(), query, needed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    #[test]
    fn planner_applies_configured_presentation() {
        let config = PlannerConfig {
            sort_by: SortKey::Name,
            filter_year: YearFilter::Year(2020),
            ..PlannerConfig::default()
        };
        let planner = CohortPlanner::new(config);
        let people = vec![
            Person::new("Zoey Evans", date(2015, 2, 18)),
            Person::new("Grace Hill", date(2021, 6, 19)),
            Person::new("Abigail Robinson", date(2014, 6, 30)),
        ];

        let names: Vec<String> = planner
            .timelines(&people, date(2024, 6, 14))
            .into_iter()
            .map(|entry| entry.person.name)
            .collect();
        assert_eq!(names, vec!["Abigail Robinson", "Zoey Evans"]);
    }

    #[test]
    fn gap_report_counts_the_search_window_outside_configured_years() {
        let config = PlannerConfig {
            start_year: 2024,
            end_year: 2024,
            capacity: 2,
            ..PlannerConfig::default()
        };
        let planner = CohortPlanner::new(config);
        let people = vec![
            Person::new("A", date(2012, 1, 1)),
            Person::new("B", date(2012, 1, 1)),
        ];

        let report = planner.gap_report(&people, date(2024, 6, 14), 2024, 1);
        let years: Vec<i32> = report.suggestions.iter().map(|gap| gap.year).collect();
        // Both are counted until their Jan 1 age reaches 18 in 2030.
        assert!(years.is_empty());

        let report = planner.gap_report(&people, date(2024, 6, 14), 2029, 1);
        let years: Vec<i32> = report.suggestions.iter().map(|gap| gap.year).collect();
        assert_eq!(years, vec![2030, 2031]);
        assert!(report.suggestions.iter().all(|gap| gap.birth_year == gap.year - 4));
    }
}
