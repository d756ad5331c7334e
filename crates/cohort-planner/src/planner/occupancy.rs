use super::calendar::{age_on, first_day_of_year, last_day_of_year};
use super::roster::Person;
use super::schema::{CohortId, CohortSchema};
use super::timeline::compute_timeline;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Widest inclusive year range callers may request in one computation.
pub const MAX_YEAR_SPAN: u32 = 500;

/// Number of years in `[start_year, end_year]`, zero when inverted.
pub fn year_span(start_year: i32, end_year: i32) -> u64 {
    u64::try_from(i64::from(end_year) - i64::from(start_year) + 1).unwrap_or(0)
}

/// Head counts for a single calendar year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearOccupancy {
    pub total: u32,
    /// Indexed by `CohortId`.
    pub per_cohort: Vec<u32>,
}

impl YearOccupancy {
    fn empty(cohorts: usize) -> Self {
        Self {
            total: 0,
            per_cohort: vec![0; cohorts],
        }
    }

    pub fn cohort(&self, id: CohortId) -> u32 {
        self.per_cohort.get(id.0).copied().unwrap_or(0)
    }

    pub fn cohort_sum(&self) -> u32 {
        self.per_cohort.iter().sum()
    }
}

/// Per-year occupancy over an inclusive year range. Every year in the range
/// has an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearlyOccupancy {
    years: BTreeMap<i32, YearOccupancy>,
}

impl YearlyOccupancy {
    pub fn get(&self, year: i32) -> Option<&YearOccupancy> {
        self.years.get(&year)
    }

    /// Total for a year; years outside the computed range count as empty.
    pub fn total(&self, year: i32) -> u32 {
        self.years.get(&year).map_or(0, |entry| entry.total)
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, &YearOccupancy)> + '_ {
        self.years.iter().map(|(year, entry)| (*year, entry))
    }

    pub fn len(&self) -> usize {
        self.years.len()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    pub fn first_year(&self) -> Option<i32> {
        self.years.keys().next().copied()
    }

    pub fn last_year(&self) -> Option<i32> {
        self.years.keys().next_back().copied()
    }

    /// Years whose total exceeds `capacity`, ascending.
    pub fn over_capacity_years(&self, capacity: u32) -> Vec<i32> {
        self.years
            .iter()
            .filter(|(_, entry)| entry.total > capacity)
            .map(|(year, _)| *year)
            .collect()
    }

    /// Busiest year; the earliest one wins a tie.
    pub fn peak(&self) -> Option<(i32, u32)> {
        self.years
            .iter()
            .fold(None, |best: Option<(i32, u32)>, (year, entry)| match best {
                Some((_, total)) if total >= entry.total => best,
                _ => Some((*year, entry.total)),
            })
    }
}

/// Counts, for each year in `[start_year, end_year]`, the people whose
/// entry/exit window overlaps the year and whose age on January 1 falls inside
/// a cohort. People overlapping the year with a Jan 1 age outside the schema
/// are left out of every count, including `total`.
///
/// `now` only feeds each timeline's `current_age_years`, which counting
/// ignores, so it does not influence the counts.
pub fn compute_occupancy(
    people: &[Person],
    schema: &CohortSchema,
    start_year: i32,
    end_year: i32,
    now: NaiveDate,
) -> YearlyOccupancy {
    let mut years: BTreeMap<i32, YearOccupancy> = BTreeMap::new();
    if start_year > end_year {
        return YearlyOccupancy { years };
    }

    for year in start_year..=end_year {
        years.insert(year, YearOccupancy::empty(schema.len()));
    }

    let range_start = first_day_of_year(start_year);
    let range_end = last_day_of_year(end_year);
    let timelines: Vec<_> = people
        .iter()
        .map(|person| compute_timeline(person.birth_date, schema, now))
        .filter(|timeline| timeline.overlaps(range_start, range_end))
        .collect();

    for (year, entry) in years.iter_mut() {
        let year_start = first_day_of_year(*year);
        let year_end = last_day_of_year(*year);

        for timeline in &timelines {
            if !timeline.overlaps(year_start, year_end) {
                continue;
            }

            let age = age_on(timeline.birth_date, year_start);
            if let Some(cohort) = schema.cohort_for_age(age) {
                entry.total += 1;
                entry.per_cohort[cohort.0] += 1;
            }
        }
    }

    YearlyOccupancy { years }
}
