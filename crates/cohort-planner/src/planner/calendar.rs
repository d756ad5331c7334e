use super::schema::AgeBoundary;
use chrono::{Datelike, Months, NaiveDate};

/// Date on which someone born on `birth_date` reaches `age`.
///
/// Whole years are added first, then the remaining months. A day-of-month
/// missing from the target month (Feb 29, or the 31st) clamps to that month's
/// last day at each step.
pub fn date_at_age(birth_date: NaiveDate, age: AgeBoundary) -> NaiveDate {
    birth_date
        .checked_add_months(Months::new(age.whole_years() * 12))
        .and_then(|date| date.checked_add_months(Months::new(age.remainder_months())))
        .unwrap_or(NaiveDate::MAX)
}

/// Completed years between `birth_date` and `on`.
///
/// Negative when `on` precedes the birth date.
pub fn age_on(birth_date: NaiveDate, on: NaiveDate) -> i32 {
    let mut age = on.year() - birth_date.year();
    if (on.month(), on.day()) < (birth_date.month(), birth_date.day()) {
        age -= 1;
    }
    age
}

pub fn first_day_of_year(year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or(if year < 0 {
        NaiveDate::MIN
    } else {
        NaiveDate::MAX
    })
}

pub fn last_day_of_year(year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, 12, 31).unwrap_or(if year < 0 {
        NaiveDate::MIN
    } else {
        NaiveDate::MAX
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    #[test]
    fn whole_and_half_year_ages_keep_day_of_month() {
        let birth = date(2015, 6, 14);
        assert_eq!(date_at_age(birth, AgeBoundary::from_years(4)), date(2019, 6, 14));
        assert_eq!(date_at_age(birth, AgeBoundary::from_months(126)), date(2025, 12, 14));
    }

    #[test]
    fn missing_days_clamp_to_month_end() {
        assert_eq!(
            date_at_age(date(2015, 1, 31), AgeBoundary::from_months(126)),
            date(2025, 7, 31)
        );
        assert_eq!(
            date_at_age(date(2015, 3, 31), AgeBoundary::from_months(126)),
            date(2025, 9, 30)
        );
        assert_eq!(
            date_at_age(date(2016, 2, 29), AgeBoundary::from_years(6)),
            date(2022, 2, 28)
        );
        // the year step clamps before the month step is applied
        assert_eq!(
            date_at_age(date(2016, 2, 29), AgeBoundary::from_months(126)),
            date(2026, 8, 28)
        );
    }

    #[test]
    fn age_counts_only_completed_years() {
        let birth = date(2015, 6, 14);
        assert_eq!(age_on(birth, date(2024, 6, 13)), 8);
        assert_eq!(age_on(birth, date(2024, 6, 14)), 9);
        assert_eq!(age_on(birth, date(2024, 1, 1)), 8);
        assert_eq!(age_on(birth, date(2015, 1, 1)), -1);
        assert_eq!(age_on(birth, date(2010, 1, 1)), -6);
    }
}
