use super::schema::CohortSchema;
use super::timeline::{compute_timeline, PersonTimeline};
use crate::import::parse_birth_date;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A roster member. Owned by whoever loaded the roster; the planner only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub name: String,
    #[serde(deserialize_with = "deserialize_birth_date")]
    pub birth_date: NaiveDate,
}

impl Person {
    pub fn new(name: impl Into<String>, birth_date: NaiveDate) -> Self {
        Self {
            name: name.into(),
            birth_date,
        }
    }
}

fn deserialize_birth_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_birth_date(&raw).map_err(serde::de::Error::custom)
}

/// A person paired with their computed timeline.
#[derive(Debug, Clone)]
pub struct RosterEntry {
    pub person: Person,
    pub timeline: PersonTimeline,
}

pub fn build_entries(people: &[Person], schema: &CohortSchema, now: NaiveDate) -> Vec<RosterEntry> {
    people
        .iter()
        .map(|person| RosterEntry {
            person: person.clone(),
            timeline: compute_timeline(person.birth_date, schema, now),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    EntryDate,
    Name,
    BirthDate,
}

impl SortKey {
    pub const fn label(self) -> &'static str {
        match self {
            Self::EntryDate => "Entry date",
            Self::Name => "Name",
            Self::BirthDate => "Birth date",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sort key '{0}' (expected entry_date, name or birth_date)")]
pub struct UnknownSortKey(pub String);

impl FromStr for SortKey {
    type Err = UnknownSortKey;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "entry_date" | "start_date" | "startdate" | "entry" => Ok(Self::EntryDate),
            "name" => Ok(Self::Name),
            "birth_date" | "dob" | "date_of_birth" => Ok(Self::BirthDate),
            _ => Err(UnknownSortKey(value.to_string())),
        }
    }
}

/// Restricts a roster to people whose program years include a given year.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum YearFilter {
    #[default]
    All,
    Year(i32),
}

impl YearFilter {
    pub fn keeps(self, timeline: &PersonTimeline) -> bool {
        match self {
            Self::All => true,
            Self::Year(year) => timeline.spans_year(year),
        }
    }
}

impl fmt::Display for YearFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Year(year) => write!(f, "{year}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("year filter '{0}' must be 'all' or a calendar year")]
pub struct InvalidYearFilter(pub String);

impl FromStr for YearFilter {
    type Err = InvalidYearFilter;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("all") || trimmed.is_empty() {
            return Ok(Self::All);
        }
        trimmed
            .parse::<i32>()
            .map(Self::Year)
            .map_err(|_| InvalidYearFilter(value.to_string()))
    }
}

impl Serialize for YearFilter {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::All => serializer.serialize_str("all"),
            Self::Year(year) => serializer.serialize_i32(*year),
        }
    }
}

impl<'de> Deserialize<'de> for YearFilter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Year(i32),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Year(year) => Ok(Self::Year(year)),
            Raw::Text(text) => text.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Case-insensitive ordering with the exact text as a tiebreaker.
fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Stable sort; equal keys keep their input order.
pub fn sort_entries(entries: &mut [RosterEntry], key: SortKey) {
    match key {
        SortKey::EntryDate => entries.sort_by_key(|entry| entry.timeline.entry_date),
        SortKey::Name => entries.sort_by(|a, b| compare_names(&a.person.name, &b.person.name)),
        SortKey::BirthDate => entries.sort_by_key(|entry| entry.person.birth_date),
    }
}

pub fn filter_entries(entries: Vec<RosterEntry>, filter: YearFilter) -> Vec<RosterEntry> {
    match filter {
        YearFilter::All => entries,
        YearFilter::Year(_) => entries
            .into_iter()
            .filter(|entry| filter.keeps(&entry.timeline))
            .collect(),
    }
}

/// Filter, then sort: the order a roster is presented in.
pub fn arrange(entries: Vec<RosterEntry>, key: SortKey, filter: YearFilter) -> Vec<RosterEntry> {
    let mut entries = filter_entries(entries, filter);
    sort_entries(&mut entries, key);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    fn entries(people: &[(&str, NaiveDate)]) -> Vec<RosterEntry> {
        let people: Vec<Person> = people
            .iter()
            .map(|(name, birth)| Person::new(*name, *birth))
            .collect();
        build_entries(&people, &CohortSchema::uk_sections(), date(2024, 6, 14))
    }

    fn names(entries: &[RosterEntry]) -> Vec<&str> {
        entries.iter().map(|entry| entry.person.name.as_str()).collect()
    }

    #[test]
    fn name_sort_ignores_case_and_is_stable() {
        let mut roster = entries(&[
            ("charlie", date(2015, 1, 1)),
            ("Alice", date(2016, 1, 1)),
            ("bob", date(2014, 1, 1)),
            ("Alice", date(2013, 1, 1)),
        ]);
        sort_entries(&mut roster, SortKey::Name);
        assert_eq!(names(&roster), vec!["Alice", "Alice", "bob", "charlie"]);
        assert_eq!(roster[0].person.birth_date, date(2016, 1, 1));
        assert_eq!(roster[1].person.birth_date, date(2013, 1, 1));

        let snapshot = names(&roster).join(",");
        sort_entries(&mut roster, SortKey::Name);
        assert_eq!(names(&roster).join(","), snapshot);
    }

    #[test]
    fn entry_date_sort_keeps_ties_in_input_order() {
        let mut roster = entries(&[
            ("Second", date(2016, 5, 1)),
            ("Twin A", date(2015, 5, 1)),
            ("Twin B", date(2015, 5, 1)),
        ]);
        sort_entries(&mut roster, SortKey::EntryDate);
        assert_eq!(names(&roster), vec!["Twin A", "Twin B", "Second"]);

        sort_entries(&mut roster, SortKey::BirthDate);
        assert_eq!(names(&roster), vec!["Twin A", "Twin B", "Second"]);
    }

    #[test]
    fn year_filter_uses_entry_and_exit_years_inclusively() {
        let roster = entries(&[
            ("Enters 2019", date(2015, 6, 14)),
            ("Leaves 2024", date(2006, 3, 1)),
            ("Enters 2030", date(2026, 2, 2)),
        ]);

        let kept = filter_entries(roster.clone(), YearFilter::Year(2024));
        assert_eq!(names(&kept), vec!["Enters 2019", "Leaves 2024"]);

        let kept = filter_entries(roster.clone(), YearFilter::Year(2030));
        assert_eq!(names(&kept), vec!["Enters 2019", "Enters 2030"]);

        assert_eq!(filter_entries(roster, YearFilter::All).len(), 3);
    }

    #[test]
    fn arrange_filters_before_sorting() {
        let roster = entries(&[
            ("Zed", date(2015, 6, 14)),
            ("Amy", date(2026, 2, 2)),
            ("Max", date(2014, 6, 14)),
        ]);
        let arranged = arrange(roster, SortKey::Name, YearFilter::Year(2024));
        assert_eq!(names(&arranged), vec!["Max", "Zed"]);
    }

    #[test]
    fn sort_keys_and_filters_parse_from_text() {
        assert_eq!("startDate".parse::<SortKey>(), Ok(SortKey::EntryDate));
        assert_eq!("dob".parse::<SortKey>(), Ok(SortKey::BirthDate));
        assert_eq!("Name".parse::<SortKey>(), Ok(SortKey::Name));
        assert!("age".parse::<SortKey>().is_err());

        assert_eq!("all".parse::<YearFilter>(), Ok(YearFilter::All));
        assert_eq!(" 2031 ".parse::<YearFilter>(), Ok(YearFilter::Year(2031)));
        assert!("next year".parse::<YearFilter>().is_err());

        let filter: YearFilter = serde_json::from_str("2027").expect("numeric filter");
        assert_eq!(filter, YearFilter::Year(2027));
        let filter: YearFilter = serde_json::from_str("\"all\"").expect("text filter");
        assert_eq!(filter, YearFilter::All);
    }

    #[test]
    fn person_deserialization_requires_strict_dates() {
        let person: Person =
            serde_json::from_str(r#"{"name":"Amelia","birth_date":"2015-06-14"}"#).expect("valid");
        assert_eq!(person.birth_date, date(2015, 6, 14));

        let invalid: Result<Person, _> =
            serde_json::from_str(r#"{"name":"Amelia","birth_date":"2015-6-14"}"#);
        assert!(invalid.is_err());
    }
}
