use super::normalizer::{header_key, normalize_name};
use crate::planner::roster::Person;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use std::io::Read;

const HEADER_DATE_KEYS: [&str; 4] = ["dateofbirth", "birthdate", "dob", "birthday"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowErrorKind {
    MissingColumns,
    EmptyName,
    DateFormat,
    InvalidDate,
}

impl fmt::Display for RowErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowErrorKind::MissingColumns => {
                f.write_str("invalid format, expected \"Name,YYYY-MM-DD\"")
            }
            RowErrorKind::EmptyName => f.write_str("missing name"),
            RowErrorKind::DateFormat => f.write_str("invalid date format, use YYYY-MM-DD"),
            RowErrorKind::InvalidDate => f.write_str("invalid date"),
        }
    }
}

/// A rejected roster line. `raw` holds the offending value (the whole line when
/// columns are missing).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("line {line}: {kind} ({raw:?})")]
pub struct RosterRowError {
    pub line: u64,
    pub raw: String,
    pub kind: RowErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BirthDateError {
    #[error("'{0}' is not in YYYY-MM-DD form")]
    Format(String),
    #[error("'{0}' is not a calendar date")]
    Calendar(String),
}

/// Strict `YYYY-MM-DD`: four-digit year, two-digit month and day, then a
/// calendar check.
pub fn parse_birth_date(raw: &str) -> Result<NaiveDate, BirthDateError> {
    let value = raw.trim();
    let bytes = value.as_bytes();
    let shape_ok = bytes.len() == 10
        && bytes.iter().enumerate().all(|(index, byte)| match index {
            4 | 7 => *byte == b'-',
            _ => byte.is_ascii_digit(),
        });
    if !shape_ok {
        return Err(BirthDateError::Format(value.to_string()));
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| BirthDateError::Calendar(value.to_string()))
}

pub(crate) enum ParsedRow {
    Person(Person),
    Rejected(RosterRowError),
}

pub(crate) fn parse_rows<R: Read>(mut reader: R) -> Result<Vec<ParsedRow>, csv::Error> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;

    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut lines = LineCounter::new(&text);
    let mut rows = Vec::new();
    let mut seen_content = false;

    for result in csv_reader.records() {
        let record = result?;
        let line = record
            .position()
            .map_or(0, |position| lines.line_at(position.byte()));

        if record.iter().all(|field| normalize_name(field).is_empty()) {
            continue;
        }

        let first_content_row = !seen_content;
        seen_content = true;

        if record.len() < 2 {
            rows.push(ParsedRow::Rejected(RosterRowError {
                line,
                raw: record.iter().collect::<Vec<_>>().join(","),
                kind: RowErrorKind::MissingColumns,
            }));
            continue;
        }

        let name = normalize_name(&record[0]);
        let raw_date = normalize_name(&record[1]);

        if first_content_row && is_header(&name, &raw_date) {
            continue;
        }

        if name.is_empty() {
            rows.push(ParsedRow::Rejected(RosterRowError {
                line,
                raw: record.iter().collect::<Vec<_>>().join(","),
                kind: RowErrorKind::EmptyName,
            }));
            continue;
        }

        match parse_birth_date(&raw_date) {
            Ok(birth_date) => rows.push(ParsedRow::Person(Person::new(name, birth_date))),
            Err(error) => {
                let kind = match error {
                    BirthDateError::Format(_) => RowErrorKind::DateFormat,
                    BirthDateError::Calendar(_) => RowErrorKind::InvalidDate,
                };
                rows.push(ParsedRow::Rejected(RosterRowError {
                    line,
                    raw: raw_date,
                    kind,
                }));
            }
        }
    }

    Ok(rows)
}

/// Maps record byte offsets to 1-based physical lines. The reader reports a
/// record where it resumed scanning, which sits before any blank lines it
/// skipped, so leading line breaks are stepped over first.
struct LineCounter<'a> {
    text: &'a [u8],
    offset: usize,
    line: u64,
}

impl<'a> LineCounter<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text: text.as_bytes(),
            offset: 0,
            line: 1,
        }
    }

    fn line_at(&mut self, byte: u64) -> u64 {
        let mut start = usize::try_from(byte)
            .unwrap_or(usize::MAX)
            .min(self.text.len());
        while matches!(self.text.get(start), Some(b'\n' | b'\r')) {
            start += 1;
        }

        if start > self.offset {
            let newlines = self.text[self.offset..start]
                .iter()
                .filter(|byte| **byte == b'\n')
                .count();
            self.line += newlines as u64;
            self.offset = start;
        }
        self.line
    }
}

fn is_header(name: &str, date: &str) -> bool {
    header_key(name) == "name" && HEADER_DATE_KEYS.contains(&header_key(date).as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn birth_dates_must_match_the_strict_shape() {
        assert_eq!(
            parse_birth_date("2015-06-14"),
            Ok(NaiveDate::from_ymd_opt(2015, 6, 14).unwrap())
        );
        assert!(matches!(parse_birth_date("2015-6-14"), Err(BirthDateError::Format(_))));
        assert!(matches!(parse_birth_date("14/06/2015"), Err(BirthDateError::Format(_))));
        assert!(matches!(parse_birth_date("+2015-06-1"), Err(BirthDateError::Format(_))));
        assert!(matches!(parse_birth_date("2015-02-30"), Err(BirthDateError::Calendar(_))));
        assert!(matches!(parse_birth_date("2015-13-01"), Err(BirthDateError::Calendar(_))));
    }

    #[test]
    fn header_detection_accepts_common_spellings() {
        assert!(is_header("Name", "DateOfBirth"));
        assert!(is_header("name", "date_of_birth"));
        assert!(is_header("NAME", "DOB"));
        assert!(!is_header("Name", "2015-06-14"));
    }

    #[test]
    fn line_numbers_count_skipped_blank_lines() {
        let rows = parse_rows("A,2015-06-14\n\nBad,2015-4-3\r\n\r\n\r\nSolo\n".as_bytes())
            .expect("rows parse");
        let lines: Vec<u64> = rows
            .iter()
            .filter_map(|row| match row {
                ParsedRow::Rejected(error) => Some(error.line),
                ParsedRow::Person(_) => None,
            })
            .collect();
        assert_eq!(lines, vec![3, 6]);
    }

    #[test]
    fn row_error_display_carries_line_and_raw_value() {
        let error = RosterRowError {
            line: 4,
            raw: "2015-6-14".to_string(),
            kind: RowErrorKind::DateFormat,
        };
        assert_eq!(
            error.to_string(),
            "line 4: invalid date format, use YYYY-MM-DD (\"2015-6-14\")"
        );
    }
}
