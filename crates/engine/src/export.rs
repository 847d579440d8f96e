//! Full transaction dump, in the same column layout the importer reads.

use chrono_tz::Tz;
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use serde::Serialize;

use crate::{EngineError, FileFormat, ResultEngine, Transaction, validation::REQUIRED_COLUMNS};

#[derive(Serialize)]
struct ExportRow<'a> {
    date: String,
    amount: String,
    category: &'a str,
    description: &'a str,
    running_balance: String,
    created_at: String,
}

/// Serializes `transactions` in `format`. Spreadsheet timestamps are written
/// in `timezone`, which is how the importer reads naive cells back.
pub fn export(
    format: FileFormat,
    transactions: &[Transaction],
    timezone: Tz,
) -> ResultEngine<Vec<u8>> {
    match format {
        FileFormat::Csv => to_csv(transactions),
        FileFormat::Xlsx => to_xlsx(transactions, timezone)
            .map_err(|err| EngineError::Export(err.to_string())),
    }
}

/// Serializes `transactions` as CSV with a header row.
pub fn to_csv(transactions: &[Transaction]) -> ResultEngine<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(vec![]);
    for tx in transactions {
        writer
            .serialize(ExportRow {
                date: tx.date.to_rfc3339(),
                amount: tx.amount.to_string(),
                category: tx.category.as_str(),
                description: &tx.description,
                running_balance: tx.running_balance.to_string(),
                created_at: tx.created_at.to_rfc3339(),
            })
            .map_err(|err| EngineError::Export(err.to_string()))?;
    }

    writer
        .into_inner()
        .map_err(|err| EngineError::Export(err.to_string()))
}

/// One worksheet with a bold header, real date cells and two-decimal amounts.
pub fn to_xlsx(transactions: &[Transaction], timezone: Tz) -> Result<Vec<u8>, XlsxError> {
    let header = Format::new().set_bold();
    let datetime = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");
    let money = Format::new().set_num_format("0.00");

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Transactions")?;
    for (col, name) in (0u16..).zip(REQUIRED_COLUMNS) {
        sheet.write_string_with_format(0, col, name, &header)?;
    }
    sheet.set_column_width(0, 20)?;
    sheet.set_column_width(3, 40)?;
    sheet.set_column_width(5, 20)?;

    for (row, tx) in (1u32..).zip(transactions) {
        let date = tx.date.with_timezone(&timezone).naive_local();
        let created_at = tx.created_at.with_timezone(&timezone).naive_local();
        sheet.write_datetime_with_format(row, 0, &date, &datetime)?;
        sheet.write_number_with_format(row, 1, dollars(tx.amount.cents()), &money)?;
        sheet.write_string(row, 2, tx.category.as_str())?;
        sheet.write_string(row, 3, tx.description.as_str())?;
        sheet.write_number_with_format(row, 4, dollars(tx.running_balance.cents()), &money)?;
        sheet.write_datetime_with_format(row, 5, &created_at, &datetime)?;
    }

    workbook.save_to_buffer()
}

fn dollars(cents: i64) -> f64 {
    cents as f64 / 100.0
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::{
        Category, Money,
        import::{read_csv, read_xlsx},
    };

    fn sample(date: chrono::DateTime<Utc>) -> Vec<Transaction> {
        vec![Transaction {
            id: 7,
            date,
            amount: Money::new(-5000),
            category: Category::Food,
            description: "Lunch, with \"friends\"".to_string(),
            running_balance: Money::new(95_000),
            created_at: date,
        }]
    }

    #[test]
    fn export_is_a_valid_import_file() {
        let date = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let data = to_csv(&sample(date)).unwrap();
        let text = String::from_utf8(data.clone()).unwrap();
        assert!(text.starts_with("date,amount,category,description,running_balance,created_at\n"));
        assert!(text.contains("2024-03-01T12:00:00+00:00,-50.00,Food,"));

        let back = read_csv(&data, Tz::UTC).unwrap();
        assert_eq!(back.len(), 1);
        assert_eq!(back[0].date, date);
        assert_eq!(back[0].amount, Money::new(-5000));
        assert_eq!(back[0].description, "Lunch, with \"friends\"");
        assert_eq!(back[0].running_balance, Money::new(95_000));
    }

    #[test]
    fn xlsx_export_reads_back_in_the_ledger_timezone() {
        let date = Utc.with_ymd_and_hms(2024, 3, 31, 20, 15, 0).unwrap();
        let data = export(FileFormat::Xlsx, &sample(date), Tz::Asia__Singapore).unwrap();
        assert!(data.starts_with(b"PK"));

        let back = read_xlsx(&data, Tz::Asia__Singapore).unwrap();
        assert_eq!(back.len(), 1);
        assert_eq!(back[0].line, 2);
        assert_eq!(back[0].date, date);
        assert_eq!(back[0].created_at, date);
        assert_eq!(back[0].amount, Money::new(-5000));
        assert_eq!(back[0].category, Category::Food);
        assert_eq!(back[0].description, "Lunch, with \"friends\"");
        assert_eq!(back[0].running_balance, Money::new(95_000));
    }
}
