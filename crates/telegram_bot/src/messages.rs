//! User facing texts.
//!
//! Functions returning MarkdownV2 are suffixed with `_md` and escape every
//! dynamic value; the rest are sent as plain text.

use chrono_tz::Tz;
use engine::{
    Category, CategoryBreakdown, FileFormat, ImportOutcome, Money, MonthlyReport, ReportPeriod,
    Transaction,
};
use teloxide::utils::markdown::escape;

/// Telegram rejects longer messages.
const MAX_MESSAGE_CHARS: usize = 4096;
/// Import errors listed before the rest is summarized.
const MAX_LISTED_ERRORS: usize = 30;

pub(crate) const UNAUTHORIZED: &str = "🚫 Sorry, this is a private bot.";
pub(crate) const ALREADY_SET: &str = "❌ Initial balance has already been set!";
pub(crate) const NOT_CONFIGURED: &str =
    "❌ Please set your initial balance first using /setbalance <amount>";
pub(crate) const SETBALANCE_USAGE: &str =
    "❌ Usage: /setbalance <amount>\nExample: /setbalance 7264.96";
pub(crate) const INVALID_PERIOD: &str =
    "❌ Invalid month/year format. Use: /monthly [month] [year]";
pub(crate) const NO_TRANSACTIONS: &str = "❌ No transactions to report.";
pub(crate) const REPORT_CAPTION: &str = "✨ Here's your transaction report!";
pub(crate) const PROCESSING: &str = "📊 Processing your file...";
pub(crate) const WRONG_FILE_TYPE: &str = "❌ Please send a CSV (.csv) or Excel (.xlsx) file";
pub(crate) const DOWNLOAD_FAILED: &str = "❌ Could not download the file. Please try again.";
pub(crate) const STORE_FAILURE: &str =
    "❌ Something went wrong while saving your data. Please try again later.";

const ADD_EXAMPLES: &str = "Examples:
• /add -50 Food Lunch at hawker centre
• /add -20 Transport Grab to work
• /add 3000 Income March salary";

pub(crate) fn welcome_no_balance() -> String {
    "🎉 Welcome to the Budget Tracker Bot!
Please set your initial balance using:
/setbalance <amount>
Example: /setbalance 1000.00"
        .to_string()
}

pub(crate) fn welcome_md(balance: Money) -> String {
    format!(
        "🎉 Welcome to the Budget Tracker Bot\\!
💰 Your current balance is: {}

Use:
➕ /add \\- Add expenses or income
💳 /balance \\- Check your balance
📊 /report \\- View your transactions
❓ /help \\- More commands",
        spoiler(balance)
    )
}

pub(crate) fn balance_set(amount: Money, current: Money) -> String {
    let mut text = format!("✅ Initial balance set to: {}", dollars(amount));
    if current != amount {
        text.push_str(&format!(
            "\n💰 Including earlier imports your balance is {}",
            dollars(current)
        ));
    }
    text.push_str(
        "

You can now use:
➕ /add - Record transactions
💳 /balance - Check balance
❓ /help - More commands",
    );
    text
}

pub(crate) fn add_usage() -> String {
    format!("❌ Usage: /add <amount> <category> <description>\n\n{ADD_EXAMPLES}")
}

pub(crate) fn invalid_amount(reason: &str) -> String {
    format!("❌ Invalid amount: {reason}\n\n{ADD_EXAMPLES}")
}

pub(crate) fn invalid_category() -> String {
    let categories = Category::ALL
        .iter()
        .map(|c| format!("• {c}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!("❌ Invalid category. Please use one of:\n{categories}\n\n{ADD_EXAMPLES}")
}

pub(crate) fn transaction_added_md(tx: &Transaction) -> String {
    let sign = if tx.amount.is_positive() { "➕" } else { "➖" };
    format!(
        "✅ Transaction added\\!
{sign} Amount: {}
🏷️ Category: {}
📝 Description: {}
💰 New Balance: {}",
        escape(&dollars(tx.amount.abs())),
        escape(tx.category.as_str()),
        escape(&tx.description),
        spoiler(tx.running_balance)
    )
}

pub(crate) fn balance_md(balance: Money) -> String {
    format!("💰 Current balance: {}", spoiler(balance))
}

pub(crate) fn no_expenses(period: ReportPeriod) -> String {
    format!(
        "❌ No expenses found for {} {}",
        period.month_name(),
        period.year()
    )
}

/// Renders the monthly breakdown in one message.
///
/// Category totals and the grand total are always kept. When the line items
/// do not fit into a Telegram message, every category lists at most the same
/// number of items followed by a `… and N more` line. Only whole lines are
/// dropped, so no escape sequence or spoiler is ever cut.
pub(crate) fn monthly_report_md(report: &MonthlyReport, timezone: Tz) -> String {
    let header = format!(
        "📈 Expense Report: {} {}\n\n💹 Category Breakdown:",
        report.period.month_name(),
        report.period.year()
    );
    let footer = format!("\n\n💰 Total Expenses: {}", spoiler(report.total));
    let sections: Vec<(String, Vec<String>)> = report
        .categories
        .iter()
        .map(|breakdown| category_section(breakdown, timezone))
        .collect();

    let rendered_len = |limit: usize| {
        let body: usize = sections
            .iter()
            .map(|(title, items)| {
                let listed: usize = items.iter().take(limit).map(|i| i.chars().count()).sum();
                let hidden = items.len().saturating_sub(limit);
                let more = if hidden > 0 {
                    more_items(hidden).chars().count()
                } else {
                    0
                };
                title.chars().count() + listed + more
            })
            .sum();
        header.chars().count() + body + footer.chars().count()
    };

    let mut limit = sections
        .iter()
        .map(|(_, items)| items.len())
        .max()
        .unwrap_or(0);
    while limit > 0 && rendered_len(limit) > MAX_MESSAGE_CHARS {
        limit -= 1;
    }

    let mut text = header;
    for (title, items) in &sections {
        text.push_str(title);
        for item in items.iter().take(limit) {
            text.push_str(item);
        }
        if items.len() > limit {
            text.push_str(&more_items(items.len() - limit));
        }
    }
    text.push_str(&footer);
    text
}

fn category_section(breakdown: &CategoryBreakdown, timezone: Tz) -> (String, Vec<String>) {
    let title = format!(
        "\n\n🏷️ {}: {} \\({}%\\)",
        escape(breakdown.category.as_str()),
        escape(&dollars(breakdown.total)),
        escape(&format!("{:.1}", breakdown.percentage))
    );
    let items = breakdown
        .transactions
        .iter()
        .map(|tx| {
            let day = tx.date.with_timezone(&timezone).format("%d/%m").to_string();
            format!(
                "\n   • {}: {} \\- {}",
                escape(&day),
                escape(&dollars(tx.amount.abs())),
                escape(&tx.description)
            )
        })
        .collect();
    (title, items)
}

fn more_items(hidden: usize) -> String {
    format!("\n   … and {hidden} more")
}

pub(crate) fn report_file_name(format: FileFormat) -> String {
    format!("budget_tracker.{}", format.extension())
}

pub(crate) fn help(report_format: FileFormat) -> String {
    let columns = engine::REQUIRED_COLUMNS
        .iter()
        .map(|c| format!("• {c}"))
        .collect::<Vec<_>>()
        .join("\n");
    let categories = Category::ALL
        .iter()
        .map(|c| c.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "📱 Available commands:

🎉 /start - Start the bot
💰 /setbalance <amount> - Set your initial balance
➕ /add <amount> <category> <description> - Add a transaction
💳 /balance - Check your current balance
📊 /report - Export your transactions as .{report}
📈 /monthly [month] [year] - View monthly expenses
📥 /import - Import transactions from a CSV or xlsx file
❓ /help - Show this help message

🏷️ Categories: {categories}

💡 Examples:
• /setbalance 1000
• /add -50 Food Lunch
• /add 500 Income Salary
• /monthly 3 2024

📝 Import Guide:
1. Use /report to get a file with the correct format
2. Use this as a template for your import file
3. Send the file to this chat

Required columns:
{columns}",
        report = report_format.extension()
    )
}

pub(crate) fn import_instructions(max_bytes: u32, report_format: FileFormat) -> String {
    format!(
        "📤 Please send a CSV (.csv) or Excel (.xlsx) file with your transactions.
The file should have these columns:
- date (YYYY-MM-DD HH:MM:SS format)
- amount (positive for income, negative for expenses)
- category (must match valid categories)
- description
- running_balance (current balance after transaction)
- created_at (YYYY-MM-DD HH:MM:SS format)

Files up to {} are accepted.
💡 Tip: /report sends a .{} file in the correct format",
        human_size(max_bytes),
        report_format.extension()
    )
}

pub(crate) fn file_too_large(max_bytes: u32) -> String {
    format!(
        "❌ The file is too large. The limit is {}.",
        human_size(max_bytes)
    )
}

pub(crate) fn import_done(outcome: &ImportOutcome) -> String {
    let mut text = match &outcome.failure {
        None => format!("✅ Successfully imported {} transactions", outcome.imported),
        Some(failure) => format!(
            "⚠️ Import stopped at row {}: {}\nImported {} of {} transactions. The ledger now holds the rows before it.",
            failure.line, failure.reason, outcome.imported, outcome.total
        ),
    };
    if outcome.discrepancies > 0 {
        text.push_str(&format!(
            "\n⚠️ {} stored running balances do not match the ledger total.",
            outcome.discrepancies
        ));
    }
    text
}

pub(crate) fn import_failed(errors: &[String]) -> String {
    let mut text = "❌ Import failed:".to_string();
    for error in errors.iter().take(MAX_LISTED_ERRORS) {
        text.push('\n');
        text.push_str(error);
    }
    if errors.len() > MAX_LISTED_ERRORS {
        text.push_str(&format!(
            "\n… and {} more",
            errors.len() - MAX_LISTED_ERRORS
        ));
    }
    truncate(text)
}

fn dollars(amount: Money) -> String {
    if amount.is_negative() {
        format!("-${}", amount.abs())
    } else {
        format!("${amount}")
    }
}

fn spoiler(amount: Money) -> String {
    format!("||{}||", escape(&dollars(amount)))
}

fn human_size(bytes: u32) -> String {
    if bytes >= 1024 * 1024 {
        format!("{:.1} MiB", f64::from(bytes) / (1024.0 * 1024.0))
    } else {
        format!("{} KiB", bytes.div_ceil(1024))
    }
}

fn truncate(text: String) -> String {
    if text.chars().count() <= MAX_MESSAGE_CHARS {
        return text;
    }
    let mut cut: String = text.chars().take(MAX_MESSAGE_CHARS - 1).collect();
    cut.push('…');
    cut
}
