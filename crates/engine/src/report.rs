//! Report Generator: monthly expense breakdown per category.

use std::collections::HashMap;

use chrono::{Datelike, Month, Utc};
use chrono_tz::Tz;

use crate::{Category, EngineError, Money, ResultEngine, Transaction};

/// A calendar month, read in the ledger timezone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReportPeriod {
    month: u32,
    year: i32,
}

impl ReportPeriod {
    pub fn new(month: u32, year: i32) -> ResultEngine<Self> {
        if !(1..=12).contains(&month) {
            return Err(EngineError::InvalidPeriod(format!("month {month} is not in 1..=12")));
        }
        if !(1970..=9999).contains(&year) {
            return Err(EngineError::InvalidPeriod(format!("year {year} is out of range")));
        }
        Ok(Self { month, year })
    }

    /// The month containing "now" in `timezone`.
    pub fn current(timezone: Tz) -> Self {
        let now = Utc::now().with_timezone(&timezone);
        Self {
            month: now.month(),
            year: now.year(),
        }
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// English month name, e.g. `March`.
    pub fn month_name(&self) -> &'static str {
        u8::try_from(self.month)
            .ok()
            .and_then(|m| Month::try_from(m).ok())
            .map_or("Unknown", |m| m.name())
    }

    pub fn contains(&self, tx: &Transaction, timezone: Tz) -> bool {
        let local = tx.date.with_timezone(&timezone);
        local.month() == self.month && local.year() == self.year
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CategoryBreakdown {
    pub category: Category,
    /// Sum of the absolute expense amounts.
    pub total: Money,
    /// Share of the month's expenses, `0.0..=100.0`.
    pub percentage: f64,
    /// Line items, chronological.
    pub transactions: Vec<Transaction>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MonthlyReport {
    pub period: ReportPeriod,
    /// Alphabetical by category name.
    pub categories: Vec<CategoryBreakdown>,
    pub total: Money,
}

impl MonthlyReport {
    /// Builds the breakdown of the expenses (`amount < 0`) dated inside
    /// `period`. Returns `None` when there are none.
    pub fn build(transactions: &[Transaction], period: ReportPeriod, timezone: Tz) -> Option<Self> {
        let mut groups: HashMap<Category, Vec<Transaction>> = HashMap::new();
        for tx in transactions
            .iter()
            .filter(|tx| tx.is_expense() && period.contains(tx, timezone))
        {
            groups.entry(tx.category).or_default().push(tx.clone());
        }

        if groups.is_empty() {
            return None;
        }

        let mut categories: Vec<CategoryBreakdown> = groups
            .into_iter()
            .map(|(category, mut transactions)| {
                transactions.sort_by_key(|tx| (tx.date, tx.id));
                let total = transactions.iter().map(|tx| tx.amount.abs()).sum();
                CategoryBreakdown {
                    category,
                    total,
                    percentage: 0.0,
                    transactions,
                }
            })
            .collect();
        categories.sort_by_key(|c| c.category.as_str());

        let total: Money = categories.iter().map(|c| c.total).sum();
        for breakdown in &mut categories {
            breakdown.percentage = breakdown.total.cents() as f64 * 100.0 / total.cents() as f64;
        }

        Some(Self {
            period,
            categories,
            total,
        })
    }
}
