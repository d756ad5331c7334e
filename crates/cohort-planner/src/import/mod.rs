//! Roster CSV ingestion and export.
//!
//! Rows are `Name,YYYY-MM-DD`; an optional `Name,DateOfBirth` header and blank
//! lines are skipped. Rows that fail validation are returned alongside the
//! accepted people with their line number and offending text, so a caller can
//! load what is valid and still show what was rejected.

mod export;
mod normalizer;
mod parser;

use crate::planner::roster::Person;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

pub use export::{roster_to_csv, write_roster, EXPORT_HEADER};
pub use parser::{parse_birth_date, BirthDateError, RosterRowError, RowErrorKind};

use parser::ParsedRow;

#[derive(Debug, thiserror::Error)]
pub enum RosterImportError {
    #[error("failed to read roster: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid roster CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("no valid roster entries found ({rejected} rows rejected)")]
    NoValidEntries { rejected: usize },
}

/// Outcome of reading a roster: accepted people in input order plus the rows
/// that were rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterImport {
    pub people: Vec<Person>,
    pub errors: Vec<RosterRowError>,
}

impl RosterImport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Fails when nothing usable was read.
    pub fn require_people(self) -> Result<Self, RosterImportError> {
        if self.people.is_empty() {
            return Err(RosterImportError::NoValidEntries {
                rejected: self.errors.len(),
            });
        }
        Ok(self)
    }
}

pub struct RosterImporter;

impl RosterImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<RosterImport, RosterImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<RosterImport, RosterImportError> {
        let mut import = RosterImport::default();

        for row in parser::parse_rows(reader)? {
            match row {
                ParsedRow::Person(person) => import.people.push(person),
                ParsedRow::Rejected(error) => {
                    debug!(line = error.line, raw = %error.raw, kind = %error.kind, "roster row rejected");
                    import.errors.push(error);
                }
            }
        }

        info!(
            accepted = import.people.len(),
            rejected = import.errors.len(),
            "roster imported"
        );
        Ok(import)
    }

    pub fn from_text(text: &str) -> Result<RosterImport, RosterImportError> {
        Self::from_reader(text.as_bytes())
    }
}
