//! Command structs

use teloxide::utils::command::{BotCommands, ParseError};

/// Hands the whole argument string to the handler, which validates it and
/// answers with a usage hint instead of a silent parse failure.
pub fn raw_args(input: String) -> Result<(String,), ParseError> {
    Ok((input,))
}

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Budget tracker commands:")]
pub enum Command {
    #[command(description = "Start the bot.")]
    Start,
    #[command(description = "Show the help message.")]
    Help,
    #[command(description = "Set your initial balance.", parse_with = raw_args)]
    SetBalance { args: String },
    #[command(description = "Add a transaction.", parse_with = raw_args)]
    Add { args: String },
    #[command(description = "Check your current balance.")]
    Balance,
    #[command(description = "Export every transaction as a spreadsheet.")]
    Report,
    #[command(description = "Expense breakdown for a month.", parse_with = raw_args)]
    Monthly { args: String },
    #[command(description = "Import transactions from a CSV or xlsx file.")]
    Import,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_keep_their_raw_arguments() {
        assert_eq!(
            Command::parse("/add -50 Food Lunch at hawker centre", "budget_bot").unwrap(),
            Command::Add {
                args: "-50 Food Lunch at hawker centre".to_string()
            }
        );
        assert_eq!(
            Command::parse("/setbalance", "budget_bot").unwrap(),
            Command::SetBalance {
                args: String::new()
            }
        );
        assert_eq!(
            Command::parse("/monthly 3 2024", "budget_bot").unwrap(),
            Command::Monthly {
                args: "3 2024".to_string()
            }
        );
        assert_eq!(Command::parse("/balance", "budget_bot").unwrap(), Command::Balance);
    }
}
