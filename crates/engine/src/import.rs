//! Import Pipeline.
//!
//! `file -> rows -> batch validation -> sort by date -> replay into the store`.
//! CSV and xlsx files are both turned into the same raw rows before
//! validation.
//! Validation is all-or-nothing: a single violation aborts the import before
//! anything is written. The replay itself is not transactional, each row is
//! an independent insert and the first store failure stops the batch.

use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};
use chrono_tz::Tz;
use serde::Deserialize;

use crate::{
    EngineError, FileFormat, LedgerStore, Money, NewTransaction, ResultEngine,
    validation::{ImportRow, RawRow, validate_batch},
};

/// What to store as `running_balance` for imported rows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunningBalancePolicy {
    /// Keep the file's values verbatim (externally prepared ledgers).
    #[default]
    TrustFile,
    /// Chain the values from the current balance, ignoring the file's column.
    Recompute,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportFailure {
    pub line: u64,
    pub reason: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImportOutcome {
    /// Rows that passed validation.
    pub total: usize,
    pub imported: usize,
    /// Set when the store rejected a row; rows before it stay imported.
    pub failure: Option<ImportFailure>,
    /// Stored transactions whose running balance breaks the ledger invariant
    /// after the import.
    pub discrepancies: usize,
}

impl ImportOutcome {
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }
}

/// Reads and validates an import file.
///
/// Fails with [`EngineError::ValidationFailed`] carrying every problem found.
pub fn read(format: FileFormat, data: &[u8], timezone: Tz) -> ResultEngine<Vec<ImportRow>> {
    match format {
        FileFormat::Csv => read_csv(data, timezone),
        FileFormat::Xlsx => read_xlsx(data, timezone),
    }
}

pub fn read_csv(data: &[u8], timezone: Tz) -> ResultEngine<Vec<ImportRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(data);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|err| {
            EngineError::ValidationFailed(vec![format!("Unable to read header row: {err}")])
        })?
        .iter()
        .map(str::to_string)
        .collect();

    let mut unreadable = Vec::new();
    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        // Header is line 1.
        let fallback_line = idx as u64 + 2;
        match record {
            Ok(record) => rows.push(RawRow {
                line: record.position().map_or(fallback_line, |p| p.line()),
                fields: record.iter().map(str::to_string).collect(),
            }),
            Err(err) => unreadable.push(format!(
                "Row {}: unreadable record ({err})",
                err.position().map_or(fallback_line, |p| p.line())
            )),
        }
    }

    finish(&headers, &rows, unreadable, timezone)
}

/// Reads the first worksheet of an xlsx workbook. The first non-empty row is
/// the header; line numbers are worksheet row numbers.
pub fn read_xlsx(data: &[u8], timezone: Tz) -> ResultEngine<Vec<ImportRow>> {
    let unreadable = |reason: String| {
        EngineError::ValidationFailed(vec![format!("Unable to read workbook: {reason}")])
    };

    let mut workbook = Xlsx::new(Cursor::new(data)).map_err(|err| unreadable(err.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| unreadable("it has no worksheets".to_string()))?
        .map_err(|err| unreadable(err.to_string()))?;

    let first_line = range.start().map_or(1, |(row, _)| u64::from(row) + 1);
    let mut lines = range.rows();
    let headers: Vec<String> = lines
        .next()
        .map(|cells| cells.iter().map(cell_text).collect())
        .unwrap_or_default();

    let rows: Vec<RawRow> = lines
        .enumerate()
        .filter(|(_, cells)| cells.iter().any(|c| *c != Data::Empty))
        .map(|(idx, cells)| RawRow {
            line: first_line + idx as u64 + 1,
            fields: cells.iter().map(cell_text).collect(),
        })
        .collect();

    finish(&headers, &rows, Vec::new(), timezone)
}

fn finish(
    headers: &[String],
    rows: &[RawRow],
    mut unreadable: Vec<String>,
    timezone: Tz,
) -> ResultEngine<Vec<ImportRow>> {
    match validate_batch(headers, rows, timezone) {
        Ok(parsed) if unreadable.is_empty() => Ok(parsed),
        Ok(_) => Err(EngineError::ValidationFailed(unreadable)),
        Err(mut errors) => {
            errors.append(&mut unreadable);
            Err(EngineError::ValidationFailed(errors))
        }
    }
}

/// Renders a cell the way the CSV reader would have seen it. Date cells
/// become naive `YYYY-MM-DD HH:MM:SS` timestamps; float noise from
/// spreadsheet arithmetic is snapped to cents.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(text) => text.trim().to_string(),
        Data::DateTime(value) => value.as_datetime().map_or_else(
            || value.to_string(),
            |dt| dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        ),
        Data::Float(value) => {
            let text = value.to_string();
            let snapped = (value * 100.0).round() / 100.0;
            let noisy = text.split_once('.').is_some_and(|(_, frac)| frac.len() > 2);
            if noisy && (value - snapped).abs() < 1e-6 {
                format!("{snapped:.2}")
            } else {
                text
            }
        }
        other => other.to_string(),
    }
}

/// Sorts validated rows chronologically and inserts them one by one.
///
/// With [`RunningBalancePolicy::Recompute`] the running balances are chained
/// from `opening` (the current balance), which must be known; every value is
/// computed before the first insert so an overflow cannot leave a partial
/// import behind.
pub async fn replay<S: LedgerStore>(
    store: &S,
    mut rows: Vec<ImportRow>,
    policy: RunningBalancePolicy,
    opening: Option<Money>,
) -> ResultEngine<ImportOutcome> {
    // Stable: rows sharing a date keep their file order.
    rows.sort_by_key(|row| row.date);

    let mut running = match policy {
        RunningBalancePolicy::TrustFile => None,
        RunningBalancePolicy::Recompute => Some(opening.ok_or(EngineError::NotConfigured)?),
    };

    let mut plan = Vec::with_capacity(rows.len());
    for row in rows {
        let running_balance = match running.as_mut() {
            Some(balance) => {
                *balance = balance.checked_add(row.amount).ok_or_else(|| {
                    EngineError::InvalidAmount(format!("Row {}: balance out of range", row.line))
                })?;
                *balance
            }
            None => row.running_balance,
        };
        plan.push((
            row.line,
            NewTransaction {
                date: row.date,
                amount: row.amount,
                category: row.category,
                description: row.description,
                running_balance,
                created_at: row.created_at,
            },
        ));
    }

    let mut outcome = ImportOutcome {
        total: plan.len(),
        ..ImportOutcome::default()
    };
    for (line, tx) in plan {
        match store.insert_transaction(tx).await {
            Ok(_) => outcome.imported += 1,
            Err(err) => {
                tracing::error!(line, imported = outcome.imported, "import stopped: {err}");
                outcome.failure = Some(ImportFailure {
                    line,
                    reason: err.to_string(),
                });
                break;
            }
        }
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rust_xlsxwriter::{Format, Workbook};

    use super::*;
    use crate::{Category, MemoryStore};

    const FILE: &str = "\
date,amount,category,description,running_balance,created_at
2024-03-10 09:00:00,-20.00,Transport,Grab to work,3930.00,2024-03-10 09:00:00
2024-03-01 12:00:00,-50.00,Food,Lunch,950.00,2024-03-01 12:00:00
2024-03-05 08:00:00,3000,Income,Salary,3950.00,2024-03-05 08:00:00
";

    const REQUIRED_HEADER: [&str; 6] = crate::REQUIRED_COLUMNS;

    #[test]
    fn read_csv_keeps_line_numbers() {
        let rows = read_csv(FILE.as_bytes(), Tz::UTC).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].line, 2);
        assert_eq!(rows[2].line, 4);
        assert_eq!(rows[1].category, Category::Food);
    }

    #[test]
    fn read_csv_reports_missing_column() {
        let data = "date,amount,category,description,created_at\n2024-03-01,-50,Food,Lunch,2024-03-01\n";
        let err = read_csv(data.as_bytes(), Tz::UTC).unwrap_err();
        assert_eq!(
            err,
            EngineError::ValidationFailed(vec![
                "Missing required columns: running_balance".to_string()
            ])
        );
    }

    #[test]
    fn read_csv_reports_every_invalid_row() {
        let data = "\
date,amount,category,description,running_balance,created_at
2024-03-01,-50,Food,Lunch,950,2024-03-01
2024-03-02,abc,Food,Lunch,900,2024-03-02
2024-03-03,-50,Pets,Vet,850,2024-03-03
not-a-date,-50,Food,Lunch,800,2024-03-04
";
        let EngineError::ValidationFailed(errors) = read_csv(data.as_bytes(), Tz::UTC).unwrap_err()
        else {
            panic!("expected validation failure");
        };
        assert_eq!(errors.len(), 3);
        assert!(errors[0].starts_with("Row 3:"));
        assert!(errors[1].starts_with("Row 4:"));
        assert!(errors[2].starts_with("Row 5:"));
    }

    /// Writes `rows` into the first worksheet, numbers as numbers.
    fn workbook(rows: &[&[&str]]) -> Vec<u8> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                let (r, c) = (r as u32, c as u16);
                match value.parse::<f64>() {
                    Ok(number) => sheet.write_number(r, c, number).unwrap(),
                    Err(_) => sheet.write_string(r, c, *value).unwrap(),
                };
            }
        }
        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn read_xlsx_matches_the_csv_reader() {
        let data = workbook(&[
            &REQUIRED_HEADER,
            &["2024-03-10 09:00:00", "-20", "Transport", "Grab to work", "3930", "2024-03-10 09:00:00"],
            &["2024-03-01 12:00:00", "-50", "food", "Lunch", "950", "2024-03-01 12:00:00"],
        ]);
        let rows = read(FileFormat::Xlsx, &data, Tz::UTC).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].line, 2);
        assert_eq!(rows[1].line, 3);
        assert_eq!(rows[1].category, Category::Food);
        assert_eq!(rows[1].amount, Money::new(-5000));
        assert_eq!(rows[0].running_balance, Money::new(393_000));
    }

    #[test]
    fn read_xlsx_accepts_date_cells_and_float_noise() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        let date_format = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");
        let date = chrono::NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap();
        for (c, name) in REQUIRED_HEADER.iter().enumerate() {
            sheet.write_string(0, c as u16, *name).unwrap();
        }
        sheet.write_datetime_with_format(1, 0, &date, &date_format).unwrap();
        sheet.write_number(1, 1, -12.34).unwrap();
        sheet.write_string(1, 2, "Food").unwrap();
        sheet.write_string(1, 3, "Lunch").unwrap();
        sheet.write_number(1, 4, 0.1 + 0.2).unwrap();
        sheet.write_datetime_with_format(1, 5, &date, &date_format).unwrap();
        let data = workbook.save_to_buffer().unwrap();

        let rows = read_xlsx(&data, Tz::Asia__Singapore).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0].date,
            chrono::Utc.with_ymd_and_hms(2024, 3, 1, 4, 30, 0).unwrap()
        );
        assert_eq!(rows[0].amount, Money::new(-1234));
        assert_eq!(rows[0].running_balance, Money::new(30));
    }

    #[test]
    fn read_xlsx_reports_missing_column() {
        let data = workbook(&[
            &["date", "amount", "category", "description", "created_at"],
            &["2024-03-01", "-50", "Food", "Lunch", "2024-03-01"],
        ]);
        let err = read(FileFormat::Xlsx, &data, Tz::UTC).unwrap_err();
        assert_eq!(
            err,
            EngineError::ValidationFailed(vec![
                "Missing required columns: running_balance".to_string()
            ])
        );
    }

    #[test]
    fn read_xlsx_reports_every_invalid_row() {
        let data = workbook(&[
            &REQUIRED_HEADER,
            &["2024-03-01", "-50", "Food", "Lunch", "950", "2024-03-01"],
            &["2024-03-02", "abc", "Food", "Lunch", "900", "2024-03-02"],
            &["2024-03-03", "-50", "Pets", "Vet", "850", "2024-03-03"],
            &["not-a-date", "-50", "Food", "Lunch", "800", "2024-03-04"],
        ]);
        let EngineError::ValidationFailed(errors) = read(FileFormat::Xlsx, &data, Tz::UTC).unwrap_err()
        else {
            panic!("expected validation failure");
        };
        assert_eq!(errors.len(), 3);
        assert!(errors[0].starts_with("Row 3:"));
        assert!(errors[1].starts_with("Row 4:"));
        assert!(errors[2].starts_with("Row 5:"));
    }

    #[test]
    fn read_xlsx_rejects_other_bytes() {
        let err = read(FileFormat::Xlsx, FILE.as_bytes(), Tz::UTC).unwrap_err();
        let EngineError::ValidationFailed(errors) = err else {
            panic!("expected validation failure");
        };
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Unable to read workbook"));
    }

    #[tokio::test]
    async fn replay_trusts_file_in_date_order() {
        let store = MemoryStore::with_starting_balance(Money::new(100_000));
        let rows = read_csv(FILE.as_bytes(), Tz::UTC).unwrap();

        let outcome = replay(&store, rows, RunningBalancePolicy::TrustFile, None)
            .await
            .unwrap();
        assert_eq!(outcome.total, 3);
        assert_eq!(outcome.imported, 3);
        assert!(outcome.is_complete());

        let stored = store.transactions().await.unwrap();
        let descriptions: Vec<_> = stored.iter().map(|t| t.description.as_str()).collect();
        assert_eq!(descriptions, ["Lunch", "Salary", "Grab to work"]);
        // Inserted in chronological order, so ids follow the dates.
        assert_eq!(stored.iter().map(|t| t.id).collect::<Vec<_>>(), [1, 2, 3]);
        assert_eq!(stored[2].running_balance, Money::new(393_000));
    }

    #[tokio::test]
    async fn replay_recompute_chains_from_opening_balance() {
        let store = MemoryStore::with_starting_balance(Money::new(100_000));
        let data = FILE.replace("3930.00", "1.00");
        let rows = read_csv(data.as_bytes(), Tz::UTC).unwrap();

        replay(&store, rows, RunningBalancePolicy::Recompute, Some(Money::new(100_000)))
            .await
            .unwrap();

        let balances: Vec<_> = store
            .transactions()
            .await
            .unwrap()
            .iter()
            .map(|t| t.running_balance)
            .collect();
        assert_eq!(
            balances,
            [Money::new(95_000), Money::new(395_000), Money::new(393_000)]
        );
    }

    #[tokio::test]
    async fn replay_recompute_needs_a_starting_balance() {
        let store = MemoryStore::new();
        let rows = read_csv(FILE.as_bytes(), Tz::UTC).unwrap();
        let err = replay(&store, rows, RunningBalancePolicy::Recompute, None)
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::NotConfigured);
        assert!(store.transactions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn replay_stops_at_first_store_failure() {
        let store = MemoryStore::with_starting_balance(Money::new(100_000)).fail_inserts_after(2);
        let rows = read_csv(FILE.as_bytes(), Tz::UTC).unwrap();

        let outcome = replay(&store, rows, RunningBalancePolicy::TrustFile, None)
            .await
            .unwrap();
        assert_eq!(outcome.imported, 2);
        let failure = outcome.failure.unwrap();
        // The third row by date is the file's first data line.
        assert_eq!(failure.line, 2);
        assert_eq!(store.transactions().await.unwrap().len(), 2);
    }
}
