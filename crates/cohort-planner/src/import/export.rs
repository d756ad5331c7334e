use super::RosterImportError;
use crate::planner::roster::Person;
use std::io::Write;

pub const EXPORT_HEADER: [&str; 2] = ["Name", "DateOfBirth"];

/// Writes a roster as CSV with a `Name,DateOfBirth` header row.
pub fn write_roster<W: Write>(people: &[Person], writer: W) -> Result<W, RosterImportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(EXPORT_HEADER)?;

    for person in people {
        let birth_date = person.birth_date.format("%Y-%m-%d").to_string();
        csv_writer.write_record([person.name.as_str(), birth_date.as_str()])?;
    }

    csv_writer
        .into_inner()
        .map_err(|err| RosterImportError::Io(err.into_error()))
}

pub fn roster_to_csv(people: &[Person]) -> Result<String, RosterImportError> {
    let bytes = write_roster(people, Vec::new())?;
    String::from_utf8(bytes).map_err(|err| {
        RosterImportError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, err))
    })
}
