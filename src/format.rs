//! The closed set of file formats offered by the converter.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A file format tag: one of DWG, PDF, PNG, XLS.
///
/// The same enumeration is used for both the source and the target side.
/// Displayed uppercase; sent to the service lowercase via [`as_tag`].
///
/// [`as_tag`]: FormatChoice::as_tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FormatChoice {
    Dwg,
    Pdf,
    Png,
    Xls,
}

impl FormatChoice {
    /// Every selectable format, in menu order.
    pub const ALL: [FormatChoice; 4] = [
        FormatChoice::Dwg,
        FormatChoice::Pdf,
        FormatChoice::Png,
        FormatChoice::Xls,
    ];

    /// Default "convert from" selection.
    pub const DEFAULT_SOURCE: FormatChoice = FormatChoice::Dwg;

    /// Default "convert to" selection.
    pub const DEFAULT_TARGET: FormatChoice = FormatChoice::Pdf;

    /// Lowercase tag as used in the service's URL path.
    pub fn as_tag(self) -> &'static str {
        match self {
            FormatChoice::Dwg => "dwg",
            FormatChoice::Pdf => "pdf",
            FormatChoice::Png => "png",
            FormatChoice::Xls => "xls",
        }
    }

    /// Uppercase label as shown to the user.
    pub fn label(self) -> &'static str {
        match self {
            FormatChoice::Dwg => "DWG",
            FormatChoice::Pdf => "PDF",
            FormatChoice::Png => "PNG",
            FormatChoice::Xls => "XLS",
        }
    }
}

impl fmt::Display for FormatChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Returned when a string names no known format.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown format '{0}' (expected one of DWG, PDF, PNG, XLS)")]
pub struct UnknownFormat(pub String);

impl FromStr for FormatChoice {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches('.');
        FormatChoice::ALL
            .into_iter()
            .find(|f| f.as_tag().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownFormat(s.to_string()))
    }
}
