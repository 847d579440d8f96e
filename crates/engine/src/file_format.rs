//! Spreadsheet formats accepted for imports and produced by exports.

use serde::Deserialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileFormat {
    Csv,
    /// Office Open XML workbook; only the first worksheet is read.
    #[default]
    Xlsx,
}

impl FileFormat {
    /// Picks the format from a file name's extension, ignoring case.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let (_, extension) = name.rsplit_once('.')?;
        if extension.eq_ignore_ascii_case("csv") {
            Some(Self::Csv)
        } else if extension.eq_ignore_ascii_case("xlsx") {
            Some(Self::Xlsx)
        } else {
            None
        }
    }

    pub const fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_follows_the_extension() {
        assert_eq!(FileFormat::from_file_name("march.csv"), Some(FileFormat::Csv));
        assert_eq!(FileFormat::from_file_name("Budget.XLSX"), Some(FileFormat::Xlsx));
        assert_eq!(FileFormat::from_file_name("report.xls"), None);
        assert_eq!(FileFormat::from_file_name("xlsx"), None);
    }
}
