use serde::{Deserialize, Serialize};
use std::fmt;

const MONTHS_PER_YEAR: u32 = 12;

/// An age expressed in whole months since birth.
///
/// Schema ages are configured in (possibly fractional) years; storing them as
/// months keeps `10.5` exact and makes every comparison integral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AgeBoundary {
    months: u32,
}

impl AgeBoundary {
    pub const fn from_months(months: u32) -> Self {
        Self { months }
    }

    pub const fn from_years(years: u32) -> Self {
        Self {
            months: years * MONTHS_PER_YEAR,
        }
    }

    /// Parses a decimal year count such as `8`, `10.5` or `10.25`.
    pub fn parse_years(raw: &str) -> Result<Self, SchemaError> {
        let trimmed = raw.trim();
        let invalid = || SchemaError::InvalidAge(trimmed.to_string());

        let (whole, fraction) = match trimmed.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (trimmed, ""),
        };
        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        if !fraction.bytes().all(|b| b.is_ascii_digit()) || fraction.len() > 6 {
            return Err(invalid());
        }

        let whole: u32 = whole.parse().map_err(|_| invalid())?;
        let mut months = whole.checked_mul(MONTHS_PER_YEAR).ok_or_else(invalid)?;

        if !fraction.is_empty() {
            let denominator = 10u64.pow(fraction.len() as u32);
            let numerator: u64 = fraction.parse().map_err(|_| invalid())?;
            let scaled = numerator * u64::from(MONTHS_PER_YEAR);
            if scaled % denominator != 0 {
                return Err(SchemaError::FractionalMonth(trimmed.to_string()));
            }
            months = months
                .checked_add((scaled / denominator) as u32)
                .ok_or_else(invalid)?;
        }

        Ok(Self { months })
    }

    /// Converts a floating point year count, accepting only whole months.
    pub fn from_years_f64(years: f64) -> Result<Self, SchemaError> {
        if !years.is_finite() || years < 0.0 {
            return Err(SchemaError::InvalidAge(years.to_string()));
        }
        let months = years * f64::from(MONTHS_PER_YEAR);
        let rounded = months.round();
        if (months - rounded).abs() > 1e-6 || rounded > f64::from(u32::MAX) {
            return Err(SchemaError::FractionalMonth(years.to_string()));
        }
        Ok(Self {
            months: rounded as u32,
        })
    }

    pub const fn months(self) -> u32 {
        self.months
    }

    pub const fn whole_years(self) -> u32 {
        self.months / MONTHS_PER_YEAR
    }

    pub const fn remainder_months(self) -> u32 {
        self.months % MONTHS_PER_YEAR
    }

    pub fn years(self) -> f64 {
        f64::from(self.months) / f64::from(MONTHS_PER_YEAR)
    }

    /// Whether an integer age in years is at or past this boundary.
    pub fn reached_by(self, age_years: i32) -> bool {
        i64::from(age_years) * i64::from(MONTHS_PER_YEAR) >= i64::from(self.months)
    }
}

impl fmt::Display for AgeBoundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.remainder_months() == 0 {
            write!(f, "{}", self.whole_years())
        } else {
            write!(f, "{}", self.years())
        }
    }
}

impl Serialize for AgeBoundary {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.years())
    }
}

impl<'de> Deserialize<'de> for AgeBoundary {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let years = f64::deserialize(deserializer)?;
        Self::from_years_f64(years).map_err(serde::de::Error::custom)
    }
}

/// Ordinal identity of a cohort within its schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CohortId(pub usize);

/// A named half-open age band `[min_age, max_age)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cohort {
    pub name: String,
    #[serde(rename = "min_age_years")]
    pub min_age: AgeBoundary,
    #[serde(rename = "max_age_years")]
    pub max_age: AgeBoundary,
}

impl Cohort {
    pub fn new(name: impl Into<String>, min_age: AgeBoundary, max_age: AgeBoundary) -> Self {
        Self {
            name: name.into(),
            min_age,
            max_age,
        }
    }

    pub fn contains_age(&self, age_years: i32) -> bool {
        self.min_age.reached_by(age_years) && !self.max_age.reached_by(age_years)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("cohort schema must contain at least one cohort")]
    Empty,
    #[error("cohort #{index} has an empty name")]
    UnnamedCohort { index: usize },
    #[error("cohort name '{0}' appears more than once")]
    DuplicateName(String),
    #[error("cohort '{name}' must have a minimum age below its maximum age")]
    EmptyRange { name: String },
    #[error("cohort '{next}' starts at {found} but '{previous}' ends at {expected}")]
    NotContiguous {
        previous: String,
        next: String,
        expected: AgeBoundary,
        found: AgeBoundary,
    },
    #[error("'{0}' is not a valid age in years")]
    InvalidAge(String),
    #[error("age '{0}' is not a whole number of months")]
    FractionalMonth(String),
    #[error("cohort definition '{0}' must look like Name:min-max")]
    Malformed(String),
}

/// Ordered, contiguous sequence of cohorts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CohortSchema {
    cohorts: Vec<Cohort>,
}

impl CohortSchema {
    pub fn new(cohorts: Vec<Cohort>) -> Result<Self, SchemaError> {
        if cohorts.is_empty() {
            return Err(SchemaError::Empty);
        }

        for (index, cohort) in cohorts.iter().enumerate() {
            if cohort.name.trim().is_empty() {
                return Err(SchemaError::UnnamedCohort { index });
            }
            if cohort.min_age >= cohort.max_age {
                return Err(SchemaError::EmptyRange {
                    name: cohort.name.clone(),
                });
            }
            if cohorts[..index].iter().any(|other| other.name == cohort.name) {
                return Err(SchemaError::DuplicateName(cohort.name.clone()));
            }
        }

        for pair in cohorts.windows(2) {
            if pair[0].max_age != pair[1].min_age {
                return Err(SchemaError::NotContiguous {
                    previous: pair[0].name.clone(),
                    next: pair[1].name.clone(),
                    expected: pair[0].max_age,
                    found: pair[1].min_age,
                });
            }
        }

        Ok(Self { cohorts })
    }

    /// UK Scouting sections from Squirrels (4) through Explorers (18).
    pub fn uk_sections() -> Self {
        Self {
            cohorts: vec![
                Cohort::new("Squirrels", AgeBoundary::from_years(4), AgeBoundary::from_years(6)),
                Cohort::new("Beavers", AgeBoundary::from_years(6), AgeBoundary::from_years(8)),
                Cohort::new("Cubs", AgeBoundary::from_years(8), AgeBoundary::from_months(126)),
                Cohort::new("Scouts", AgeBoundary::from_months(126), AgeBoundary::from_years(14)),
                Cohort::new("Explorers", AgeBoundary::from_years(14), AgeBoundary::from_years(18)),
            ],
        }
    }

    /// The same program without the Squirrels section, entering at 6.
    pub fn uk_sections_from_beavers() -> Self {
        let mut schema = Self::uk_sections();
        schema.cohorts.remove(0);
        schema
    }

    /// Parses `Name:min-max` entries separated by commas, e.g.
    /// `Beavers:6-8,Cubs:8-10.5`.
    pub fn parse(raw: &str) -> Result<Self, SchemaError> {
        let mut cohorts = Vec::new();

        for entry in raw.split(',').map(str::trim).filter(|entry| !entry.is_empty()) {
            let malformed = || SchemaError::Malformed(entry.to_string());
            let (name, range) = entry.rsplit_once(':').ok_or_else(malformed)?;
            let (min, max) = range.split_once('-').ok_or_else(malformed)?;
            cohorts.push(Cohort::new(
                name.trim(),
                AgeBoundary::parse_years(min)?,
                AgeBoundary::parse_years(max)?,
            ));
        }

        Self::new(cohorts)
    }

    pub fn cohorts(&self) -> &[Cohort] {
        &self.cohorts
    }

    pub fn len(&self) -> usize {
        self.cohorts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cohorts.is_empty()
    }

    pub fn cohort(&self, id: CohortId) -> Option<&Cohort> {
        self.cohorts.get(id.0)
    }

    pub fn ids(&self) -> impl Iterator<Item = CohortId> + '_ {
        (0..self.cohorts.len()).map(CohortId)
    }

    pub fn min_age(&self) -> AgeBoundary {
        self.cohorts[0].min_age
    }

    pub fn max_age(&self) -> AgeBoundary {
        self.cohorts[self.cohorts.len() - 1].max_age
    }

    /// Cohort whose half-open band contains an integer age, if any.
    pub fn cohort_for_age(&self, age_years: i32) -> Option<CohortId> {
        self.cohorts
            .iter()
            .position(|cohort| cohort.contains_age(age_years))
            .map(CohortId)
    }
}

impl<'de> Deserialize<'de> for CohortSchema {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let cohorts = Vec::<Cohort>::deserialize(deserializer)?;
        Self::new(cohorts).map_err(serde::de::Error::custom)
    }
}

impl Default for CohortSchema {
    fn default() -> Self {
        Self::uk_sections()
    }
}

impl fmt::Display for CohortSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for cohort in &self.cohorts {
            if !first {
                f.write_str(",")?;
            }
            first = false;
            write!(f, "{}:{}-{}", cohort.name, cohort.min_age, cohort.max_age)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_years_accepts_whole_and_half_years() {
        assert_eq!(AgeBoundary::parse_years("8").unwrap().months(), 96);
        assert_eq!(AgeBoundary::parse_years("10.5").unwrap().months(), 126);
        assert_eq!(AgeBoundary::parse_years(" 10.25 ").unwrap().months(), 123);
    }

    #[test]
    fn parse_years_rejects_partial_months_and_garbage() {
        assert_eq!(
            AgeBoundary::parse_years("10.1"),
            Err(SchemaError::FractionalMonth("10.1".to_string()))
        );
        assert!(matches!(
            AgeBoundary::parse_years("-4"),
            Err(SchemaError::InvalidAge(_))
        ));
        assert!(matches!(
            AgeBoundary::parse_years("ten"),
            Err(SchemaError::InvalidAge(_))
        ));
    }

    #[test]
    fn uk_sections_preset_is_contiguous() {
        let schema = CohortSchema::uk_sections();
        let rebuilt = CohortSchema::new(schema.cohorts().to_vec()).expect("preset validates");
        assert_eq!(rebuilt, schema);
        assert_eq!(schema.min_age(), AgeBoundary::from_years(4));
        assert_eq!(schema.max_age(), AgeBoundary::from_years(18));
        assert_eq!(CohortSchema::uk_sections_from_beavers().min_age().whole_years(), 6);
    }

    #[test]
    fn rejects_gaps_between_cohorts() {
        let error = CohortSchema::parse("Beavers:6-8,Cubs:9-10.5").expect_err("gap rejected");
        assert!(matches!(error, SchemaError::NotContiguous { .. }));
    }

    #[test]
    fn rejects_duplicate_and_inverted_cohorts() {
        assert_eq!(
            CohortSchema::parse("Cubs:8-10,Cubs:10-12"),
            Err(SchemaError::DuplicateName("Cubs".to_string()))
        );
        assert!(matches!(
            CohortSchema::parse("Cubs:10-8"),
            Err(SchemaError::EmptyRange { .. })
        ));
        assert_eq!(CohortSchema::parse(" , "), Err(SchemaError::Empty));
    }

    #[test]
    fn display_round_trips_through_parse() {
        let schema = CohortSchema::uk_sections();
        let text = schema.to_string();
        assert_eq!(text, "Squirrels:4-6,Beavers:6-8,Cubs:8-10.5,Scouts:10.5-14,Explorers:14-18");
        assert_eq!(CohortSchema::parse(&text).expect("parses"), schema);
    }

    #[test]
    fn half_open_bands_assign_boundary_ages_upwards() {
        let schema = CohortSchema::uk_sections();
        assert_eq!(schema.cohort_for_age(3), None);
        assert_eq!(schema.cohort_for_age(4), Some(CohortId(0)));
        assert_eq!(schema.cohort_for_age(8), Some(CohortId(2)));
        assert_eq!(schema.cohort_for_age(10), Some(CohortId(2)));
        assert_eq!(schema.cohort_for_age(11), Some(CohortId(3)));
        assert_eq!(schema.cohort_for_age(17), Some(CohortId(4)));
        assert_eq!(schema.cohort_for_age(18), None);
        assert_eq!(schema.cohort_for_age(-1), None);
    }

    #[test]
    fn deserializes_from_year_floats() {
        let schema: CohortSchema = serde_json::from_str(
            r#"[{"name":"Cubs","min_age_years":8,"max_age_years":10.5},
                {"name":"Scouts","min_age_years":10.5,"max_age_years":14}]"#,
        )
        .expect("valid schema");
        assert_eq!(schema.len(), 2);
        assert_eq!(schema.max_age(), AgeBoundary::from_years(14));

        let invalid: Result<CohortSchema, _> = serde_json::from_str(
            r#"[{"name":"Cubs","min_age_years":8,"max_age_years":10.5},
                {"name":"Scouts","min_age_years":11,"max_age_years":14}]"#,
        );
        assert!(invalid.is_err());
    }
}
