//! Argument parsing for the commands that take free text.

use chrono_tz::Tz;
use engine::{EngineError, Money, ReportPeriod};

#[derive(Debug, PartialEq, thiserror::Error)]
pub(crate) enum ArgsError {
    #[error("missing arguments")]
    Missing,
    #[error("not a number: {0}")]
    NotANumber(String),
    #[error("too many arguments")]
    TooMany,
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// `/setbalance <amount>`
pub(crate) fn parse_balance_args(args: &str) -> Result<Money, ArgsError> {
    let amount = args.split_whitespace().next().ok_or(ArgsError::Missing)?;
    Ok(amount.parse()?)
}

/// Splits `/add <amount> <category> <description...>` into its three raw
/// parts. The description keeps its inner spacing.
pub(crate) fn split_add_args(args: &str) -> Result<(&str, &str, &str), ArgsError> {
    let args = args.trim();
    let (amount, rest) = args.split_once(char::is_whitespace).ok_or(ArgsError::Missing)?;
    let (category, description) = rest
        .trim_start()
        .split_once(char::is_whitespace)
        .ok_or(ArgsError::Missing)?;
    let description = description.trim();
    if description.is_empty() {
        return Err(ArgsError::Missing);
    }
    Ok((amount, category, description))
}

/// `/monthly [month] [year]`, missing values default to the current month
/// in `timezone`.
pub(crate) fn parse_period_args(args: &str, timezone: Tz) -> Result<ReportPeriod, ArgsError> {
    let current = ReportPeriod::current(timezone);
    let mut parts = args.split_whitespace();

    let month = match parts.next() {
        Some(raw) => number(raw)?,
        None => return Ok(current),
    };
    let year = match parts.next() {
        Some(raw) => number(raw)?,
        None => current.year(),
    };
    if parts.next().is_some() {
        return Err(ArgsError::TooMany);
    }

    Ok(ReportPeriod::new(month, year)?)
}

fn number<T: std::str::FromStr>(raw: &str) -> Result<T, ArgsError> {
    raw.parse()
        .map_err(|_| ArgsError::NotANumber(raw.to_string()))
}
