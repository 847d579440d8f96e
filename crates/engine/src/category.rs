//! Fixed set of transaction categories.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Food,
    Transport,
    Shopping,
    Entertainment,
    Bills,
    Health,
    Income,
    Others,
}

impl Category {
    /// Every category, in the order they are presented to the user.
    pub const ALL: [Category; 8] = [
        Category::Food,
        Category::Transport,
        Category::Shopping,
        Category::Entertainment,
        Category::Bills,
        Category::Health,
        Category::Income,
        Category::Others,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Food => "Food",
            Self::Transport => "Transport",
            Self::Shopping => "Shopping",
            Self::Entertainment => "Entertainment",
            Self::Bills => "Bills",
            Self::Health => "Health",
            Self::Income => "Income",
            Self::Others => "Others",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trims the token and title-cases it (`" fOOD "` becomes `"Food"`).
fn normalize(value: &str) -> String {
    let mut chars = value.trim().chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

impl FromStr for Category {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == normalized)
            .ok_or_else(|| EngineError::InvalidCategory(s.trim().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_trims_and_title_cases() {
        assert_eq!("food".parse::<Category>().unwrap(), Category::Food);
        assert_eq!("  TRANSPORT ".parse::<Category>().unwrap(), Category::Transport);
        assert_eq!("eNtErTaInMeNt".parse::<Category>().unwrap(), Category::Entertainment);
    }

    #[test]
    fn parse_rejects_unknown_categories() {
        let err = "Groceries".parse::<Category>().unwrap_err();
        assert_eq!(err, EngineError::InvalidCategory("Groceries".to_string()));
        assert!("".parse::<Category>().is_err());
        assert!("Other".parse::<Category>().is_err());
    }

    #[test]
    fn display_round_trips() {
        for category in Category::ALL {
            assert_eq!(category.to_string().parse::<Category>().unwrap(), category);
        }
    }
}
