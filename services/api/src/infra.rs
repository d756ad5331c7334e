use chrono::NaiveDate;
use cohort_planner::error::AppError;
use cohort_planner::import::{parse_birth_date, RosterImport, RosterImporter};
use cohort_planner::planner::roster::{InvalidYearFilter, UnknownSortKey};
use cohort_planner::planner::{CohortSchema, SortKey, YearFilter};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    parse_birth_date(raw).map_err(|err| err.to_string())
}

pub(crate) fn parse_sort_key(raw: &str) -> Result<SortKey, String> {
    raw.parse().map_err(|err: UnknownSortKey| err.to_string())
}

pub(crate) fn parse_year_filter(raw: &str) -> Result<YearFilter, String> {
    raw.parse().map_err(|err: InvalidYearFilter| err.to_string())
}

pub(crate) fn parse_schema(raw: &str) -> Result<CohortSchema, String> {
    CohortSchema::parse(raw).map_err(|err| err.to_string())
}

/// Loads a roster file, printing rejected rows to stderr. Fails when no row
/// is usable.
pub(crate) fn load_roster(path: &Path) -> Result<RosterImport, AppError> {
    let import = RosterImporter::from_path(path)?.require_people()?;

    if !import.is_clean() {
        eprintln!(
            "Skipped {} invalid roster row(s) in {}:",
            import.errors.len(),
            path.display()
        );
        for error in import.errors.iter().take(5) {
            eprintln!("  - {error}");
        }
        if import.errors.len() > 5 {
            eprintln!("  ... and {} more", import.errors.len() - 5);
        }
    }

    Ok(import)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_parsers_surface_readable_errors() {
        assert_eq!(parse_sort_key("birth-date"), Ok(SortKey::BirthDate));
        assert!(parse_sort_key("age").unwrap_err().contains("unknown sort key"));

        assert_eq!(parse_year_filter("all"), Ok(YearFilter::All));
        assert_eq!(parse_year_filter("2027"), Ok(YearFilter::Year(2027)));
        assert!(parse_year_filter("soon").is_err());

        assert!(parse_date("2015-06-14").is_ok());
        assert!(parse_date("14/06/2015").is_err());

        let schema = parse_schema("Juniors:5-9,Seniors:9-12").expect("schema parses");
        assert_eq!(schema.len(), 2);
        assert!(parse_schema("Juniors:5-9,Seniors:10-12").is_err());
    }
}
