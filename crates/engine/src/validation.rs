//! Transaction Validator.
//!
//! Two entry points: [`validate_entry`] for a single `/add` request and
//! [`validate_batch`] for an import file, which collects every violation of
//! every row instead of stopping at the first one.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::{Category, EngineError, Money, ResultEngine};

/// Columns an import file must carry, in export order.
pub const REQUIRED_COLUMNS: [&str; 6] = [
    "date",
    "amount",
    "category",
    "description",
    "running_balance",
    "created_at",
];

const DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// A validated `/add` request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    pub amount: Money,
    pub category: Category,
    pub description: String,
}

/// Validates the three `/add` arguments. The description is kept as free
/// text; only surrounding whitespace is removed.
pub fn validate_entry(amount: &str, category: &str, description: &str) -> ResultEngine<Entry> {
    let amount = amount.parse::<Money>()?;
    let category = category.parse::<Category>()?;
    Ok(Entry {
        amount,
        category,
        description: description.trim().to_string(),
    })
}

/// One raw data row of an import file, `line` being its 1-based line number.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawRow {
    pub line: u64,
    pub fields: Vec<String>,
}

/// A fully parsed import row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportRow {
    pub line: u64,
    pub date: DateTime<Utc>,
    pub amount: Money,
    pub category: Category,
    pub description: String,
    pub running_balance: Money,
    pub created_at: DateTime<Utc>,
}

/// Parses a timestamp as RFC 3339 or one of the common naive layouts. Naive
/// values are read in `timezone`.
pub fn parse_timestamp(raw: &str, timezone: Tz) -> ResultEngine<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }

    let naive = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| EngineError::InvalidTimestamp(format!("'{raw}'")))?;

    timezone
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| EngineError::InvalidTimestamp(format!("'{raw}' does not exist in {timezone}")))
}

/// Validates a whole import batch.
///
/// `headers` are matched after trimming and lowercasing; extra columns are
/// ignored. Every problem is reported: first the missing columns, then one
/// message per invalid cell, as `Row <line>: <reason>`.
pub fn validate_batch(
    headers: &[String],
    rows: &[RawRow],
    timezone: Tz,
) -> Result<Vec<ImportRow>, Vec<String>> {
    let mut errors = Vec::new();

    let index: Vec<Option<usize>> = REQUIRED_COLUMNS
        .iter()
        .map(|column| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(column))
        })
        .collect();

    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .zip(&index)
        .filter(|(_, idx)| idx.is_none())
        .map(|(column, _)| *column)
        .collect();
    if !missing.is_empty() {
        errors.push(format!("Missing required columns: {}", missing.join(", ")));
    }

    if rows.is_empty() {
        errors.push("File contains no transactions".to_string());
    }

    let mut parsed = Vec::with_capacity(rows.len());
    for row in rows {
        let mut row_errors = Vec::new();
        let date = cell(row, index[0], 0, &mut row_errors);
        let amount = cell(row, index[1], 1, &mut row_errors);
        let category = cell(row, index[2], 2, &mut row_errors);
        let description = cell(row, index[3], 3, &mut row_errors)
            .unwrap_or("")
            .to_string();
        let running_balance = cell(row, index[4], 4, &mut row_errors);
        let created_at = cell(row, index[5], 5, &mut row_errors);

        let date = date.and_then(|raw| {
            parse_timestamp(raw, timezone)
                .map_err(|_| row_errors.push(format!("Row {}: invalid date '{raw}'", row.line)))
                .ok()
        });
        let created_at = created_at.and_then(|raw| {
            parse_timestamp(raw, timezone)
                .map_err(|_| {
                    row_errors.push(format!("Row {}: invalid created_at '{raw}'", row.line))
                })
                .ok()
        });
        let amount = amount.and_then(|raw| {
            raw.parse::<Money>()
                .map_err(|_| row_errors.push(format!("Row {}: invalid amount '{raw}'", row.line)))
                .ok()
        });
        let running_balance = running_balance.and_then(|raw| {
            raw.parse::<Money>()
                .map_err(|_| {
                    row_errors.push(format!("Row {}: invalid running_balance '{raw}'", row.line))
                })
                .ok()
        });
        let category = category.and_then(|raw| {
            raw.parse::<Category>()
                .map_err(|_| row_errors.push(format!("Row {}: invalid category '{raw}'", row.line)))
                .ok()
        });

        if let (Some(date), Some(amount), Some(category), Some(running_balance), Some(created_at)) =
            (date, amount, category, running_balance, created_at)
        {
            parsed.push(ImportRow {
                line: row.line,
                date,
                amount,
                category,
                description,
                running_balance,
                created_at,
            });
        }
        errors.extend(row_errors);
    }

    if errors.is_empty() {
        Ok(parsed)
    } else {
        Err(errors)
    }
}

/// Looks up a required cell; blank values other than the description are
/// reported as missing.
fn cell<'a>(
    row: &'a RawRow,
    idx: Option<usize>,
    column: usize,
    errors: &mut Vec<String>,
) -> Option<&'a str> {
    let idx = idx?;
    let value = row.fields.get(idx).map(|s| s.trim()).unwrap_or("");
    if value.is_empty() && REQUIRED_COLUMNS[column] != "description" {
        errors.push(format!("Row {}: missing {}", row.line, REQUIRED_COLUMNS[column]));
        return None;
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn row(line: u64, fields: &[&str]) -> RawRow {
        RawRow {
            line,
            fields: fields.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn entry_normalizes_category_and_trims_description() {
        let entry = validate_entry("-50", " food ", " Lunch at hawker centre ").unwrap();
        assert_eq!(entry.amount, Money::new(-5000));
        assert_eq!(entry.category, Category::Food);
        assert_eq!(entry.description, "Lunch at hawker centre");
    }

    #[test]
    fn entry_rejects_bad_amount_before_category() {
        let err = validate_entry("fifty", "Nope", "x").unwrap_err();
        assert!(matches!(err, EngineError::InvalidAmount(_)));
        let err = validate_entry("50", "Nope", "x").unwrap_err();
        assert_eq!(err, EngineError::InvalidCategory("Nope".to_string()));
    }

    #[test]
    fn timestamps_accept_common_layouts() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 5, 13, 30, 0).unwrap();
        for raw in [
            "2024-03-05T13:30:00Z",
            "2024-03-05T13:30:00+00:00",
            "2024-03-05 13:30:00",
            "2024-03-05T13:30:00.000",
            "2024-03-05 13:30",
        ] {
            assert_eq!(parse_timestamp(raw, Tz::UTC).unwrap(), expected, "{raw}");
        }
        assert_eq!(
            parse_timestamp("2024-03-05", Tz::UTC).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap()
        );
        assert!(parse_timestamp("05/03/2024 13h", Tz::UTC).is_err());
    }

    #[test]
    fn naive_timestamps_use_the_ledger_timezone() {
        let parsed = parse_timestamp("2024-03-01 00:30:00", Tz::Asia__Singapore).unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 2, 29, 16, 30, 0).unwrap());
    }

    #[test]
    fn batch_reports_missing_columns() {
        let errors = validate_batch(
            &headers(&["date", "amount", "category", "description", "created_at"]),
            &[row(2, &["2024-03-01", "-5", "Food", "x", "2024-03-01"])],
            Tz::UTC,
        )
        .unwrap_err();
        assert_eq!(errors, vec!["Missing required columns: running_balance".to_string()]);
    }

    #[test]
    fn batch_collects_every_row_error() {
        let errors = validate_batch(
            &headers(&REQUIRED_COLUMNS),
            &[
                row(2, &["2024-03-01", "-5", "Food", "ok", "95", "2024-03-01"]),
                row(3, &["yesterday", "-5", "Food", "", "90", "2024-03-01"]),
                row(4, &["2024-03-02", "five", "Groceries", "", "85", "2024-03-01"]),
                row(5, &["2024-03-03", "-5", "Food", "", "abc", ""]),
            ],
            Tz::UTC,
        )
        .unwrap_err();
        assert_eq!(
            errors,
            vec![
                "Row 3: invalid date 'yesterday'".to_string(),
                "Row 4: invalid amount 'five'".to_string(),
                "Row 4: invalid category 'Groceries'".to_string(),
                "Row 5: missing created_at".to_string(),
                "Row 5: invalid running_balance 'abc'".to_string(),
            ]
        );
    }

    #[test]
    fn batch_accepts_reordered_and_extra_columns() {
        let rows = validate_batch(
            &headers(&[
                " Created_At",
                "description",
                "notes",
                "running_balance",
                "category",
                "amount",
                "DATE",
            ]),
            &[row(2, &["2024-03-01", "Salary", "-", "3950", "income", "3000", "2024-03-01"])],
            Tz::UTC,
        )
        .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].category, Category::Income);
        assert_eq!(rows[0].amount, Money::new(300_000));
        assert_eq!(rows[0].running_balance, Money::new(395_000));
        assert_eq!(rows[0].description, "Salary");
    }

    #[test]
    fn batch_without_rows_is_rejected() {
        let errors = validate_batch(&headers(&REQUIRED_COLUMNS), &[], Tz::UTC).unwrap_err();
        assert_eq!(errors, vec!["File contains no transactions".to_string()]);
    }
}
