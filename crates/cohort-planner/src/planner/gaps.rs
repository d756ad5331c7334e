use super::calendar::{first_day_of_year, last_day_of_year};
use super::occupancy::YearlyOccupancy;
use super::schema::CohortSchema;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DEFAULT_GAP_WINDOW: u32 = 2;
/// Largest search radius accepted from configuration or requests.
pub const MAX_GAP_WINDOW: u32 = 200;

/// Parameters for an intake gap search around a target year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GapQuery {
    pub target_year: i32,
    pub capacity: u32,
    #[serde(default = "default_window")]
    pub window_years: u32,
}

fn default_window() -> u32 {
    DEFAULT_GAP_WINDOW
}

impl GapQuery {
    pub fn new(target_year: i32, capacity: u32) -> Self {
        Self {
            target_year,
            capacity,
            window_years: DEFAULT_GAP_WINDOW,
        }
    }

    pub fn with_window(mut self, window_years: u32) -> Self {
        self.window_years = window_years;
        self
    }

    fn window(&self) -> (i32, i32) {
        let window = i32::try_from(self.window_years).unwrap_or(i32::MAX);
        (
            self.target_year.saturating_sub(window),
            self.target_year.saturating_add(window),
        )
    }
}

/// A year with room left, and the birth year that would enter the program then.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GapSuggestion {
    pub year: i32,
    pub birth_year: i32,
    pub available_slots: i64,
    pub birth_range_start: NaiveDate,
    pub birth_range_end: NaiveDate,
}

impl GapSuggestion {
    pub fn fit(&self, needed: u32) -> GapFit {
        if self.available_slots <= 0 {
            GapFit::Full
        } else if self.available_slots >= i64::from(needed) {
            GapFit::Accommodates
        } else {
            GapFit::Partial
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapFit {
    Accommodates,
    Partial,
    Full,
}

impl GapFit {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Accommodates => "Can accommodate",
            Self::Partial => "Partial",
            Self::Full => "No slots available",
        }
    }
}

/// Birth year whose members reach the schema's entry age during `year`.
pub fn entry_birth_year(schema: &CohortSchema, year: i32) -> i32 {
    let entry_age = i32::try_from(schema.min_age().whole_years()).unwrap_or(i32::MAX);
    year.saturating_sub(entry_age)
}

/// Scans `target_year ± window_years` and returns the years below capacity in
/// ascending order. An empty result means every year is at or over capacity.
pub fn find_gaps(
    occupancy: &YearlyOccupancy,
    schema: &CohortSchema,
    query: &GapQuery,
) -> Vec<GapSuggestion> {
    let (first, last) = query.window();

    (first..=last)
        .filter_map(|year| {
            let available_slots = i64::from(query.capacity) - i64::from(occupancy.total(year));
            if available_slots <= 0 {
                return None;
            }

            let birth_year = entry_birth_year(schema, year);
            Some(GapSuggestion {
                year,
                birth_year,
                available_slots,
                birth_range_start: first_day_of_year(birth_year),
                birth_range_end: last_day_of_year(birth_year),
            })
        })
        .collect()
}

/// Gap search results together with the target year's context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GapReport {
    pub query: GapQuery,
    pub target_total: u32,
    pub target_birth_year: i32,
    pub needed: u32,
    pub suggestions: Vec<GapSuggestion>,
}

impl GapReport {
    pub fn build(
        occupancy: &YearlyOccupancy,
        schema: &CohortSchema,
        query: GapQuery,
        needed: u32,
    ) -> Self {
        Self {
            target_total: occupancy.total(query.target_year),
            target_birth_year: entry_birth_year(schema, query.target_year),
            needed,
            suggestions: find_gaps(occupancy, schema, &query),
            query,
        }
    }

    pub fn has_gaps(&self) -> bool {
        !self.suggestions.is_empty()
    }

    pub fn target_available(&self) -> i64 {
        i64::from(self.query.capacity) - i64::from(self.target_total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::occupancy::compute_occupancy;
    use crate::planner::roster::Person;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    fn occupancy_for(people: &[Person], schema: &CohortSchema) -> YearlyOccupancy {
        compute_occupancy(people, schema, 2015, 2040, date(2024, 6, 14))
    }

    #[test]
    fn slots_are_capacity_minus_total() {
        let schema = CohortSchema::uk_sections_from_beavers();
        let people: Vec<Person> = (0..3)
            .map(|n| Person::new(format!("Beaver {n}"), date(2018, 1, 1)))
            .collect();
        let occupancy = occupancy_for(&people, &schema);

        let gaps = find_gaps(&occupancy, &schema, &GapQuery::new(2024, 5));
        let years: Vec<i32> = gaps.iter().map(|gap| gap.year).collect();
        assert_eq!(years, vec![2022, 2023, 2024, 2025, 2026]);

        for gap in &gaps {
            let expected = 5 - i64::from(occupancy.total(gap.year));
            assert_eq!(gap.available_slots, expected);
            assert_eq!(gap.birth_year, gap.year - 6);
            assert_eq!(gap.birth_range_start, date(gap.birth_year, 1, 1));
            assert_eq!(gap.birth_range_end, date(gap.birth_year, 12, 31));
        }
        assert_eq!(gaps[2].available_slots, 2);
    }

    #[test]
    fn full_window_yields_no_suggestions() {
        let schema = CohortSchema::uk_sections_from_beavers();
        let people: Vec<Person> = (0..4)
            .map(|n| Person::new(format!("Cub {n}"), date(2015, 1, 1)))
            .collect();
        let occupancy = occupancy_for(&people, &schema);

        assert!(find_gaps(&occupancy, &schema, &GapQuery::new(2025, 4)).is_empty());
        assert!(find_gaps(&occupancy, &schema, &GapQuery::new(2025, 0)).is_empty());
    }

    #[test]
    fn entry_age_comes_from_the_schema_minimum() {
        let schema = CohortSchema::uk_sections();
        let occupancy = occupancy_for(&[], &schema);
        let gaps = find_gaps(&occupancy, &schema, &GapQuery::new(2030, 1).with_window(0));
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].birth_year, 2026);
    }

    #[test]
    fn years_outside_the_table_count_as_empty() {
        let schema = CohortSchema::uk_sections();
        let occupancy = occupancy_for(&[], &schema);
        let gaps = find_gaps(&occupancy, &schema, &GapQuery::new(2100, 3));
        assert_eq!(gaps.len(), 5);
        assert!(gaps.iter().all(|gap| gap.available_slots == 3));
    }

    #[test]
    fn extreme_windows_do_not_overflow() {
        let schema = CohortSchema::uk_sections();
        let occupancy = occupancy_for(&[], &schema);
        let query = GapQuery::new(i32::MAX, 2).with_window(3);
        let gaps = find_gaps(&occupancy, &schema, &query);
        assert_eq!(gaps.len(), 4);
        assert_eq!(gaps.last().map(|gap| gap.year), Some(i32::MAX));
        assert_eq!(gaps[0].birth_range_start, NaiveDate::MAX);
    }

    #[test]
    fn fit_reflects_people_needed() {
        let suggestion = GapSuggestion {
            year: 2024,
            birth_year: 2018,
            available_slots: 3,
            birth_range_start: date(2018, 1, 1),
            birth_range_end: date(2018, 12, 31),
        };
        assert_eq!(suggestion.fit(2), GapFit::Accommodates);
        assert_eq!(suggestion.fit(3), GapFit::Accommodates);
        assert_eq!(suggestion.fit(4), GapFit::Partial);
        assert_eq!(
            GapSuggestion {
                available_slots: 0,
                ..suggestion
            }
            .fit(1),
            GapFit::Full
        );
    }

    #[test]
    fn report_carries_target_context() {
        let schema = CohortSchema::uk_sections_from_beavers();
        let people = vec![Person::new("Beaver", date(2018, 1, 1))];
        let occupancy = occupancy_for(&people, &schema);
        let report = GapReport::build(&occupancy, &schema, GapQuery::new(2024, 10), 2);

        assert_eq!(report.target_total, 1);
        assert_eq!(report.target_available(), 9);
        assert_eq!(report.target_birth_year, 2018);
        assert!(report.has_gaps());
    }
}
