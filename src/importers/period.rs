use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

const MONTH_NAMES: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

static YEAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+").expect("valid year regex"));

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PeriodError {
    #[error("No month name found in {0:?}")]
    MissingMonth(String),

    #[error("No year digits found in {0:?}")]
    MissingYear(String),

    #[error("Year {digits:?} in {name:?} is out of range")]
    InvalidYear { name: String, digits: String },
}

/// Reporting period of one monthly workbook
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    /// 1 = January
    pub month: u32,
    pub year: i32,
}

/// Extract the month and year encoded in a workbook file name
///
/// The month is the first full English month name, in calendar order, that
/// `name` contains (case-insensitive); the year is the first run of ASCII digits.
/// Example: `"Ridership_September2017.xlsx"` -> `Period { month: 9, year: 2017 }`
pub fn extract_period(name: &str) -> Result<Period, PeriodError> {
    let lowered = name.to_lowercase();
    let month = MONTH_NAMES
        .iter()
        .position(|m| lowered.contains(m))
        .map(|idx| idx as u32 + 1)
        .ok_or_else(|| PeriodError::MissingMonth(name.to_string()))?;

    let digits = YEAR_PATTERN
        .find(name)
        .ok_or_else(|| PeriodError::MissingYear(name.to_string()))?
        .as_str();
    let year = digits.parse::<i32>().map_err(|_| PeriodError::InvalidYear {
        name: name.to_string(),
        digits: digits.to_string(),
    })?;

    Ok(Period { month, year })
}
