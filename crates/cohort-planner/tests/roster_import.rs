use chrono::NaiveDate;
use cohort_planner::import::{roster_to_csv, RosterImportError, RosterImporter, RowErrorKind};
use cohort_planner::planner::{compute_occupancy, CohortId, CohortSchema};
use std::path::PathBuf;

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/sample_roster.csv")
}

#[test]
fn sample_roster_loads_valid_rows_and_reports_the_rest() {
    let import = RosterImporter::from_path(fixture_path()).expect("fixture imports");

    assert_eq!(import.people.len(), 15);
    assert_eq!(import.people[0].name, "Emma Thompson");
    let last = import.people.last().expect("roster not empty");
    assert_eq!(last.name, "Carter, Lily");
    assert_eq!(
        last.birth_date,
        NaiveDate::from_ymd_opt(2017, 7, 26).expect("valid date")
    );

    let rejected: Vec<(u64, RowErrorKind, &str)> = import
        .errors
        .iter()
        .map(|error| (error.line, error.kind, error.raw.as_str()))
        .collect();
    assert_eq!(
        rejected,
        vec![
            (17, RowErrorKind::InvalidDate, "2016-02-30"),
            (18, RowErrorKind::DateFormat, "08/10/2019"),
        ]
    );
}

#[test]
fn sample_roster_occupancy_for_2024() {
    let import = RosterImporter::from_text(include_str!("fixtures/sample_roster.csv"))
        .expect("fixture imports");
    let schema = CohortSchema::uk_sections();
    let today = NaiveDate::from_ymd_opt(2024, 6, 14).expect("valid date");

    let occupancy = compute_occupancy(&import.people, &schema, 2024, 2024, today);
    let year = occupancy.get(2024).expect("year present");

    let counts: Vec<u32> = schema.ids().map(|id| year.cohort(id)).collect();
    assert_eq!(counts, vec![2, 3, 3, 3, 2]);
    assert_eq!(year.total, 13);
    assert_eq!(year.cohort(CohortId(2)), 3);
}

#[test]
fn exported_roster_reimports_cleanly() {
    let import = RosterImporter::from_path(fixture_path()).expect("fixture imports");
    let csv = roster_to_csv(&import.people).expect("export succeeds");

    assert!(csv.starts_with("Name,DateOfBirth\n"));
    assert!(csv.contains("\"Carter, Lily\",2017-07-26\n"));

    let reimported = RosterImporter::from_text(&csv).expect("export re-imports");
    assert!(reimported.is_clean());
    assert_eq!(reimported.people, import.people);
}

#[test]
fn roster_without_usable_rows_is_an_error() {
    let csv = "Name,DateOfBirth\n\nNo Date\n,2015-01-01\n";
    let import = RosterImporter::from_text(csv).expect("csv framing is valid");
    assert!(import.people.is_empty());
    assert_eq!(import.errors.len(), 2);

    match import.require_people() {
        Err(RosterImportError::NoValidEntries { rejected }) => assert_eq!(rejected, 2),
        other => panic!("expected an empty roster error, got {other:?}"),
    }
}
